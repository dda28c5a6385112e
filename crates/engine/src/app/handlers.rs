use crate::input::InputEvent;

use super::collaborators::Surface;
use super::commands::ControlEvent;

/// Something that takes part in the per-tick update/draw/input cycle, such as
/// a menu.
pub trait Handler {
    fn on_started(&mut self) {}
    fn on_finished(&mut self) {}
    fn on_update(&mut self) {}
    fn on_draw(&mut self, _surface: &mut Surface) {}
    fn on_input(&mut self, _event: &InputEvent) -> bool {
        false
    }
    fn on_command(&mut self, _event: &ControlEvent) -> bool {
        false
    }
}

impl<H: Handler + ?Sized> Handler for Box<H> {
    fn on_started(&mut self) {
        (**self).on_started();
    }

    fn on_finished(&mut self) {
        (**self).on_finished();
    }

    fn on_update(&mut self) {
        (**self).on_update();
    }

    fn on_draw(&mut self, surface: &mut Surface) {
        (**self).on_draw(surface);
    }

    fn on_input(&mut self, event: &InputEvent) -> bool {
        (**self).on_input(event)
    }

    fn on_command(&mut self, event: &ControlEvent) -> bool {
        (**self).on_command(event)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

impl HandlerId {
    pub fn get(self) -> u64 {
        self.0
    }

    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for HandlerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a handler is attached to. Children stop with their parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerContext {
    Root,
    Child(HandlerId),
}

struct Entry<H> {
    id: HandlerId,
    context: HandlerContext,
    handler: H,
    stopped: bool,
}

/// Ordered handlers. Later entries draw on top and see input first.
pub struct HandlerStack<H: Handler> {
    entries: Vec<Entry<H>>,
    next_id: u64,
}

impl<H: Handler> Default for HandlerStack<H> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }
}

impl<H: Handler> HandlerStack<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.iter().filter(|entry| !entry.stopped).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Id the next `start` will hand out.
    pub fn next_id(&self) -> HandlerId {
        HandlerId(self.next_id)
    }

    pub fn start(&mut self, context: HandlerContext, handler: H, on_top: bool) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        let entry = Entry {
            id,
            context,
            handler,
            stopped: false,
        };
        if on_top {
            self.entries.push(entry);
        } else {
            self.entries.insert(0, entry);
        }
        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.id == id) {
            entry.handler.on_started();
        }
        id
    }

    pub fn is_started(&self, id: HandlerId) -> bool {
        self.position(id).is_some()
    }

    pub fn get(&self, id: HandlerId) -> Option<&H> {
        self.position(id).map(|index| &self.entries[index].handler)
    }

    pub fn get_mut(&mut self, id: HandlerId) -> Option<&mut H> {
        let index = self.position(id)?;
        Some(&mut self.entries[index].handler)
    }

    /// Ids of live handlers in draw order.
    pub fn ids(&self) -> Vec<HandlerId> {
        self.entries
            .iter()
            .filter(|entry| !entry.stopped)
            .map(|entry| entry.id)
            .collect()
    }

    /// Stops a handler and everything started in its context.
    pub fn stop(&mut self, id: HandlerId) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        self.stop_all(HandlerContext::Child(id));
        let entry = &mut self.entries[index];
        entry.stopped = true;
        entry.handler.on_finished();
        true
    }

    pub fn stop_all(&mut self, context: HandlerContext) {
        let ids: Vec<HandlerId> = self
            .entries
            .iter()
            .filter(|entry| !entry.stopped && entry.context == context)
            .map(|entry| entry.id)
            .collect();
        for id in ids {
            self.stop(id);
        }
    }

    pub fn bring_to_front(&mut self, id: HandlerId) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        let entry = self.entries.remove(index);
        self.entries.push(entry);
        true
    }

    pub fn bring_to_back(&mut self, id: HandlerId) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        let entry = self.entries.remove(index);
        self.entries.insert(0, entry);
        true
    }

    pub fn update(&mut self) {
        for entry in self.entries.iter_mut().filter(|entry| !entry.stopped) {
            entry.handler.on_update();
        }
        self.entries.retain(|entry| !entry.stopped);
    }

    /// Draws the handlers of `context` in order, each followed by its children.
    pub fn draw(&mut self, context: HandlerContext, surface: &mut Surface) {
        for id in self.live_ids_in(context) {
            if let Some(index) = self.position(id) {
                self.entries[index].handler.on_draw(surface);
            }
            self.draw(HandlerContext::Child(id), surface);
        }
    }

    /// Offers an event to the handlers of `context`, topmost first, children
    /// before their parent. Stops at the first one that handles it.
    pub fn notify_input(&mut self, context: HandlerContext, event: &InputEvent) -> bool {
        for id in self.live_ids_in(context).into_iter().rev() {
            if self.notify_input(HandlerContext::Child(id), event) {
                return true;
            }
            let Some(index) = self.position(id) else {
                continue;
            };
            if self.entries[index].handler.on_input(event) {
                return true;
            }
        }
        false
    }

    pub fn notify_command(&mut self, context: HandlerContext, event: &ControlEvent) -> bool {
        for id in self.live_ids_in(context).into_iter().rev() {
            if self.notify_command(HandlerContext::Child(id), event) {
                return true;
            }
            let Some(index) = self.position(id) else {
                continue;
            };
            if self.entries[index].handler.on_command(event) {
                return true;
            }
        }
        false
    }

    fn live_ids_in(&self, context: HandlerContext) -> Vec<HandlerId> {
        self.entries
            .iter()
            .filter(|entry| !entry.stopped && entry.context == context)
            .map(|entry| entry.id)
            .collect()
    }

    fn position(&self, id: HandlerId) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.id == id && !entry.stopped)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::app::collaborators::Size;

    #[derive(Clone)]
    struct Probe {
        name: &'static str,
        log: Rc<RefCell<Vec<String>>>,
        consumes_input: bool,
    }

    impl Probe {
        fn new(name: &'static str, log: &Rc<RefCell<Vec<String>>>) -> Self {
            Self {
                name,
                log: Rc::clone(log),
                consumes_input: false,
            }
        }

        fn consuming(mut self) -> Self {
            self.consumes_input = true;
            self
        }

        fn record(&self, what: &str) {
            self.log.borrow_mut().push(format!("{}:{what}", self.name));
        }
    }

    impl Handler for Probe {
        fn on_started(&mut self) {
            self.record("started");
        }

        fn on_finished(&mut self) {
            self.record("finished");
        }

        fn on_update(&mut self) {
            self.record("update");
        }

        fn on_draw(&mut self, _surface: &mut Surface) {
            self.record("draw");
        }

        fn on_input(&mut self, _event: &InputEvent) -> bool {
            self.record("input");
            self.consumes_input
        }
    }

    fn take(log: &Rc<RefCell<Vec<String>>>) -> Vec<String> {
        std::mem::take(&mut *log.borrow_mut())
    }

    #[test]
    fn draw_runs_in_order_with_children_after_parent() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut stack = HandlerStack::new();
        let a = stack.start(HandlerContext::Root, Probe::new("a", &log), true);
        stack.start(HandlerContext::Root, Probe::new("b", &log), true);
        stack.start(HandlerContext::Child(a), Probe::new("a1", &log), true);
        stack.start(HandlerContext::Root, Probe::new("z", &log), false);
        take(&log);

        let mut surface = Surface::new(Size::new(1, 1));
        stack.draw(HandlerContext::Root, &mut surface);

        assert_eq!(take(&log), vec!["z:draw", "a:draw", "a1:draw", "b:draw"]);
    }

    #[test]
    fn input_goes_topmost_first_and_children_first() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut stack = HandlerStack::new();
        stack.start(HandlerContext::Root, Probe::new("a", &log), true);
        let b = stack.start(HandlerContext::Root, Probe::new("b", &log), true);
        stack.start(HandlerContext::Child(b), Probe::new("b1", &log), true);
        take(&log);

        let handled = stack.notify_input(HandlerContext::Root, &InputEvent::Other);

        assert!(!handled);
        assert_eq!(take(&log), vec!["b1:input", "b:input", "a:input"]);
    }

    #[test]
    fn handled_input_stops_propagation() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut stack = HandlerStack::new();
        stack.start(HandlerContext::Root, Probe::new("a", &log), true);
        stack.start(HandlerContext::Root, Probe::new("b", &log).consuming(), true);
        take(&log);

        assert!(stack.notify_input(HandlerContext::Root, &InputEvent::Other));
        assert_eq!(take(&log), vec!["b:input"]);
    }

    #[test]
    fn stopping_a_parent_stops_its_children() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut stack = HandlerStack::new();
        let parent = stack.start(HandlerContext::Root, Probe::new("p", &log), true);
        let child = stack.start(HandlerContext::Child(parent), Probe::new("c", &log), true);
        take(&log);

        assert!(stack.stop(parent));

        assert!(!stack.is_started(parent));
        assert!(!stack.is_started(child));
        assert_eq!(take(&log), vec!["c:finished", "p:finished"]);
        assert!(!stack.stop(parent));

        stack.update();
        assert!(stack.is_empty());
        assert!(take(&log).is_empty());
    }

    #[test]
    fn bring_to_front_and_back_reorder() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut stack = HandlerStack::new();
        let a = stack.start(HandlerContext::Root, Probe::new("a", &log), true);
        let b = stack.start(HandlerContext::Root, Probe::new("b", &log), true);
        let c = stack.start(HandlerContext::Root, Probe::new("c", &log), true);

        stack.bring_to_front(a);
        assert_eq!(stack.ids(), vec![b, c, a]);

        stack.bring_to_back(c);
        assert_eq!(stack.ids(), vec![c, b, a]);
    }

    #[test]
    fn ids_stay_stable_across_reordering() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut stack = HandlerStack::new();
        let a = stack.start(HandlerContext::Root, Probe::new("a", &log), true);
        stack.start(HandlerContext::Root, Probe::new("b", &log), false);

        stack.bring_to_back(a);
        assert_eq!(stack.get(a).map(|probe| probe.name), Some("a"));
    }
}
