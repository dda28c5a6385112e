use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::keys::{JoypadAxis, JoypadButton, JOYPAD_AXIS_COUNT};
use super::raw::JoypadId;

pub const DEFAULT_JOYPAD_DEADZONE: i32 = 500;

/// Maps a raw stick value to `[-1.0, 1.0]`.
///
/// The positive and negative halves use different divisors because the
/// signed 16-bit range is asymmetric.
pub fn compute_axis_value(value: i16, deadzone: i32) -> f64 {
    let raw = i32::from(value);
    if raw.abs() < deadzone {
        0.0
    } else if raw > 0 {
        f64::from(raw) / 32767.0
    } else {
        f64::from(raw) / 32768.0
    }
}

/// Descriptive snapshot of a joypad carried by device events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoypadInfo {
    pub id: JoypadId,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Joypad {
    info: JoypadInfo,
    buttons_down: BTreeSet<JoypadButton>,
    axes: [f64; JOYPAD_AXIS_COUNT],
}

impl Joypad {
    pub fn new(id: JoypadId, name: impl Into<String>) -> Self {
        Self {
            info: JoypadInfo {
                id,
                name: name.into(),
            },
            buttons_down: BTreeSet::new(),
            axes: [0.0; JOYPAD_AXIS_COUNT],
        }
    }

    pub fn id(&self) -> JoypadId {
        self.info.id
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn info(&self) -> &JoypadInfo {
        &self.info
    }

    pub fn is_button_pressed(&self, button: JoypadButton) -> bool {
        self.buttons_down.contains(&button)
    }

    pub fn axis_state(&self, axis: JoypadAxis) -> f64 {
        axis.index().map_or(0.0, |index| self.axes[index])
    }

    pub(crate) fn set_button(&mut self, button: JoypadButton, pressed: bool) {
        if button == JoypadButton::Invalid {
            return;
        }
        if pressed {
            self.buttons_down.insert(button);
        } else {
            self.buttons_down.remove(&button);
        }
    }

    pub(crate) fn set_axis(&mut self, axis: JoypadAxis, state: f64) {
        if let Some(index) = axis.index() {
            self.axes[index] = state;
        }
    }

    /// Releases every button and recenters every axis.
    pub fn reset(&mut self) {
        self.buttons_down.clear();
        self.axes = [0.0; JOYPAD_AXIS_COUNT];
    }

    /// Eight-way direction of the d-pad, or -1 when centered or contradictory.
    pub fn hat_direction(&self) -> i32 {
        let mut state = 0usize;
        if self.is_button_pressed(JoypadButton::DpadUp) {
            state |= 1;
        }
        if self.is_button_pressed(JoypadButton::DpadDown) {
            state |= 2;
        }
        if self.is_button_pressed(JoypadButton::DpadLeft) {
            state |= 4;
        }
        if self.is_button_pressed(JoypadButton::DpadRight) {
            state |= 8;
        }
        const DIRECTIONS: [i32; 16] = [-1, 2, 6, -1, 4, 3, 5, 4, 0, 1, 7, 0, -1, 2, 6, -1];
        DIRECTIONS[state]
    }
}

/// Connected joypads keyed by identity, plus the host device index of each.
#[derive(Debug, Default)]
pub struct JoypadRegistry {
    joypads: BTreeMap<JoypadId, Joypad>,
    index_to_id: HashMap<usize, JoypadId>,
}

impl JoypadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.joypads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joypads.is_empty()
    }

    pub fn knows_index(&self, index: usize) -> bool {
        self.index_to_id.contains_key(&index)
    }

    pub fn id_for_index(&self, index: usize) -> Option<JoypadId> {
        self.index_to_id.get(&index).copied()
    }

    pub(crate) fn register(&mut self, index: usize, joypad: Joypad) {
        self.index_to_id.insert(index, joypad.id());
        self.joypads.insert(joypad.id(), joypad);
    }

    /// Removes a joypad. The whole index map is dropped, not only the entry
    /// for this device, so every index has to be resolved again.
    pub(crate) fn remove(&mut self, id: JoypadId) -> Option<Joypad> {
        let mut joypad = self.joypads.remove(&id)?;
        joypad.reset();
        self.index_to_id.clear();
        Some(joypad)
    }

    pub fn get(&self, id: JoypadId) -> Option<&Joypad> {
        self.joypads.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: JoypadId) -> Option<&mut Joypad> {
        self.joypads.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Joypad> {
        self.joypads.values()
    }

    /// First connected joypad other than `excluded`, in identity order.
    pub fn other_joypad(&self, excluded: JoypadId) -> Option<JoypadId> {
        self.joypads.keys().copied().find(|id| *id != excluded)
    }

    pub(crate) fn clear(&mut self) {
        self.joypads.clear();
        self.index_to_id.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_value_respects_deadzone_and_asymmetric_range() {
        assert_eq!(compute_axis_value(0, DEFAULT_JOYPAD_DEADZONE), 0.0);
        assert_eq!(compute_axis_value(499, DEFAULT_JOYPAD_DEADZONE), 0.0);
        assert_eq!(compute_axis_value(-499, DEFAULT_JOYPAD_DEADZONE), 0.0);
        assert!(compute_axis_value(500, DEFAULT_JOYPAD_DEADZONE) > 0.0);
        assert_eq!(compute_axis_value(32767, DEFAULT_JOYPAD_DEADZONE), 1.0);
        assert_eq!(compute_axis_value(-32768, DEFAULT_JOYPAD_DEADZONE), -1.0);
    }

    #[test]
    fn custom_deadzone_is_honored() {
        assert_eq!(compute_axis_value(4000, 8000), 0.0);
        assert!(compute_axis_value(8000, 8000) > 0.24);
    }

    #[test]
    fn hat_direction_follows_dpad_combinations() {
        let mut joypad = Joypad::new(JoypadId(3), "pad");
        assert_eq!(joypad.hat_direction(), -1);

        joypad.set_button(JoypadButton::DpadUp, true);
        assert_eq!(joypad.hat_direction(), 2);

        joypad.set_button(JoypadButton::DpadRight, true);
        assert_eq!(joypad.hat_direction(), 1);

        joypad.set_button(JoypadButton::DpadDown, true);
        assert_eq!(joypad.hat_direction(), 0);

        joypad.reset();
        joypad.set_button(JoypadButton::DpadLeft, true);
        joypad.set_button(JoypadButton::DpadDown, true);
        assert_eq!(joypad.hat_direction(), 5);
    }

    #[test]
    fn removing_a_joypad_forgets_every_index() {
        let mut registry = JoypadRegistry::new();
        registry.register(0, Joypad::new(JoypadId(10), "first"));
        registry.register(1, Joypad::new(JoypadId(11), "second"));

        let removed = registry.remove(JoypadId(10)).expect("joypad registered");

        assert_eq!(removed.id(), JoypadId(10));
        assert_eq!(registry.len(), 1);
        assert!(!registry.knows_index(0));
        assert!(!registry.knows_index(1));
        assert!(registry.get(JoypadId(11)).is_some());
    }

    #[test]
    fn removed_joypad_state_is_reset() {
        let mut registry = JoypadRegistry::new();
        let mut joypad = Joypad::new(JoypadId(1), "pad");
        joypad.set_button(JoypadButton::A, true);
        joypad.set_axis(JoypadAxis::LeftX, 0.75);
        registry.register(0, joypad);

        let removed = registry.remove(JoypadId(1)).expect("joypad registered");

        assert!(!removed.is_button_pressed(JoypadButton::A));
        assert_eq!(removed.axis_state(JoypadAxis::LeftX), 0.0);
    }

    #[test]
    fn other_joypad_skips_excluded_identity() {
        let mut registry = JoypadRegistry::new();
        registry.register(0, Joypad::new(JoypadId(4), "a"));
        registry.register(1, Joypad::new(JoypadId(2), "b"));

        assert_eq!(registry.other_joypad(JoypadId(2)), Some(JoypadId(4)));
        assert_eq!(registry.other_joypad(JoypadId(4)), Some(JoypadId(2)));

        registry.clear();
        assert_eq!(registry.other_joypad(JoypadId(4)), None);
    }
}
