use std::collections::{BTreeSet, HashMap, VecDeque};

use super::raw::{JoypadDescriptor, RawEvent};

/// Native event queue the normalizer pulls from.
pub trait EventSource {
    fn poll_event(&mut self) -> Option<RawEvent>;

    /// Puts an event back at the end of the queue.
    fn push_event(&mut self, event: RawEvent);

    /// Keep receiving mouse motion while the pointer is outside the window.
    fn set_mouse_capture(&mut self, capture: bool);

    fn any_mouse_button_down(&self) -> bool;

    fn open_joypad(&mut self, index: usize) -> Option<JoypadDescriptor>;

    /// Device indices of joypads already plugged in at startup.
    fn connected_joypad_indices(&self) -> Vec<usize>;
}

/// In-memory event source. Used for tests and headless runs.
#[derive(Debug, Default)]
pub struct QueueEventSource {
    queue: VecDeque<RawEvent>,
    mouse_buttons_down: BTreeSet<u8>,
    mouse_captured: bool,
    devices: HashMap<usize, JoypadDescriptor>,
    opened: Vec<usize>,
}

impl QueueEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: impl IntoIterator<Item = RawEvent>) -> Self {
        Self {
            queue: events.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Makes a device available at `index` without announcing it.
    pub fn attach_joypad(&mut self, index: usize, descriptor: JoypadDescriptor) {
        self.devices.insert(index, descriptor);
    }

    pub fn detach_joypad(&mut self, index: usize) -> Option<JoypadDescriptor> {
        self.devices.remove(&index)
    }

    pub fn is_mouse_captured(&self) -> bool {
        self.mouse_captured
    }

    /// Device indices passed to `open_joypad`, in call order.
    pub fn opened_indices(&self) -> &[usize] {
        &self.opened
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl EventSource for QueueEventSource {
    fn poll_event(&mut self) -> Option<RawEvent> {
        let event = self.queue.pop_front()?;
        match &event {
            RawEvent::MouseButtonDown { button, .. } => {
                self.mouse_buttons_down.insert(*button);
            }
            RawEvent::MouseButtonUp { button, .. } => {
                self.mouse_buttons_down.remove(button);
            }
            _ => {}
        }
        Some(event)
    }

    fn push_event(&mut self, event: RawEvent) {
        self.queue.push_back(event);
    }

    fn set_mouse_capture(&mut self, capture: bool) {
        self.mouse_captured = capture;
    }

    fn any_mouse_button_down(&self) -> bool {
        !self.mouse_buttons_down.is_empty()
    }

    fn open_joypad(&mut self, index: usize) -> Option<JoypadDescriptor> {
        self.opened.push(index);
        self.devices.get(&index).cloned()
    }

    fn connected_joypad_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self.devices.keys().copied().collect();
        indices.sort_unstable();
        indices
    }
}
