use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Index of a reference held in a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RefSlot(u32);

impl RefSlot {
    pub fn get(self) -> u32 {
        self.0
    }
}

/// A store of values addressed by slot, where every slot is one owned
/// reference that must be released exactly once.
pub trait RefRegistry: Clone {
    type Value;

    /// Takes a second reference to whatever `slot` refers to.
    fn duplicate(&self, slot: RefSlot) -> Option<RefSlot>;
    fn release(&self, slot: RefSlot);
    fn resolve(&self, slot: RefSlot) -> Option<Self::Value>;
}

#[derive(Debug)]
struct TableSlots<T> {
    slots: HashMap<u32, Rc<T>>,
    next: u32,
}

/// Single-threaded registry of shared values.
#[derive(Debug)]
pub struct RefTable<T> {
    inner: Rc<RefCell<TableSlots<T>>>,
}

impl<T> Clone for RefTable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Default for RefTable<T> {
    fn default() -> Self {
        Self {
            inner: Rc::new(RefCell::new(TableSlots {
                slots: HashMap::new(),
                next: 1,
            })),
        }
    }
}

impl<T> RefTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_ref(&self, value: T) -> ScopedRef<Self> {
        let slot = self.insert(Rc::new(value));
        ScopedRef {
            registry: self.clone(),
            slot: Some(slot),
        }
    }

    /// Number of slots not yet released.
    pub fn live_count(&self) -> usize {
        self.inner.borrow().slots.len()
    }

    fn insert(&self, value: Rc<T>) -> RefSlot {
        let mut table = self.inner.borrow_mut();
        let slot = table.next;
        table.next = table.next.wrapping_add(1).max(1);
        table.slots.insert(slot, value);
        RefSlot(slot)
    }
}

impl<T> RefRegistry for RefTable<T> {
    type Value = Rc<T>;

    fn duplicate(&self, slot: RefSlot) -> Option<RefSlot> {
        let value = self.inner.borrow().slots.get(&slot.0).cloned()?;
        Some(self.insert(value))
    }

    fn release(&self, slot: RefSlot) {
        self.inner.borrow_mut().slots.remove(&slot.0);
    }

    fn resolve(&self, slot: RefSlot) -> Option<Rc<T>> {
        self.inner.borrow().slots.get(&slot.0).cloned()
    }
}

/// Owning handle to one registry slot. Cloning takes a new slot for the same
/// value, dropping releases the slot.
#[derive(Debug)]
pub struct ScopedRef<R: RefRegistry> {
    registry: R,
    slot: Option<RefSlot>,
}

impl<R: RefRegistry> ScopedRef<R> {
    /// An empty handle bound to `registry`.
    pub fn empty(registry: &R) -> Self {
        Self {
            registry: registry.clone(),
            slot: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }

    pub fn slot(&self) -> Option<RefSlot> {
        self.slot
    }

    pub fn get(&self) -> Option<R::Value> {
        self.slot.and_then(|slot| self.registry.resolve(slot))
    }

    /// Releases the slot now and leaves the handle empty.
    pub fn clear(&mut self) {
        if let Some(slot) = self.slot.take() {
            self.registry.release(slot);
        }
    }
}

impl<T> ScopedRef<RefTable<T>> {
    /// Whether both handles resolve to the same value.
    pub fn same_target(&self, other: &Self) -> bool {
        match (self.get(), other.get()) {
            (Some(left), Some(right)) => Rc::ptr_eq(&left, &right),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<R: RefRegistry> Clone for ScopedRef<R> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            slot: self
                .slot
                .and_then(|slot| self.registry.duplicate(slot)),
        }
    }
}

impl<R: RefRegistry> Drop for ScopedRef<R> {
    fn drop(&mut self) {
        self.clear();
    }
}
