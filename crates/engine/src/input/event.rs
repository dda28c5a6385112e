use super::joypad::JoypadInfo;
use super::keys::{JoypadAxis, JoypadButton, KeyModifiers, KeyboardKey, MouseButton};
use super::raw::{FingerPhase, JoypadId};

#[derive(Debug, Clone, PartialEq)]
pub struct KeyboardEvent {
    pub key: KeyboardKey,
    pub code: i32,
    pub pressed: bool,
    pub repeat: bool,
    pub modifiers: KeyModifiers,
    /// Whether repeated events count as presses, fixed when the event was
    /// normalized.
    pub repeat_enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseButtonEvent {
    pub button: MouseButton,
    pub pressed: bool,
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FingerEvent {
    pub phase: FingerPhase,
    pub finger_id: i64,
    pub x: f32,
    pub y: f32,
    pub dx: f32,
    pub dy: f32,
    pub pressure: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceChange {
    Added,
    Removed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    Closing,
    Resized { width: u32, height: u32 },
    FocusLost,
    FocusGained,
}

/// One normalized input event. Exactly one kind is active.
///
/// Accessors for a kind the event is not return a "none" value, except the
/// position and pressure accessors, whose callers must check the kind first.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Keyboard(KeyboardEvent),
    Text(String),
    MouseButton(MouseButtonEvent),
    MouseMotion {
        x: i32,
        y: i32,
    },
    MouseWheel {
        dx: f32,
        dy: f32,
    },
    JoypadButton {
        joypad: JoypadId,
        button: JoypadButton,
        pressed: bool,
    },
    JoypadAxis {
        joypad: JoypadId,
        axis: JoypadAxis,
        state: f64,
    },
    /// Kept for quests written against plain joysticks.
    JoypadHat {
        joypad: JoypadId,
        direction: i32,
    },
    JoypadDevice {
        change: DeviceChange,
        info: JoypadInfo,
    },
    Finger(FingerEvent),
    Window(WindowEvent),
    Other,
}

impl InputEvent {
    // keyboard

    pub fn is_keyboard_event(&self) -> bool {
        matches!(self, InputEvent::Keyboard(_))
    }

    fn keyboard(&self) -> Option<&KeyboardEvent> {
        match self {
            InputEvent::Keyboard(event) => Some(event),
            _ => None,
        }
    }

    pub fn is_keyboard_key_pressed(&self) -> bool {
        self.keyboard()
            .is_some_and(|event| event.pressed && (!event.repeat || event.repeat_enabled))
    }

    pub fn is_keyboard_key_released(&self) -> bool {
        self.keyboard()
            .is_some_and(|event| !event.pressed && (!event.repeat || event.repeat_enabled))
    }

    pub fn is_keyboard_key_pressed_with(&self, key: KeyboardKey) -> bool {
        self.is_keyboard_key_pressed() && self.keyboard_key() == key
    }

    pub fn is_keyboard_key_released_with(&self, key: KeyboardKey) -> bool {
        self.is_keyboard_key_released() && self.keyboard_key() == key
    }

    pub fn is_repeat(&self) -> bool {
        self.keyboard().is_some_and(|event| event.repeat)
    }

    pub fn keyboard_key(&self) -> KeyboardKey {
        self.keyboard().map_or(KeyboardKey::None, |event| event.key)
    }

    pub fn modifiers(&self) -> KeyModifiers {
        self.keyboard()
            .map_or_else(KeyModifiers::default, |event| event.modifiers)
    }

    pub fn is_keyboard_direction_key_pressed(&self) -> bool {
        self.is_keyboard_key_pressed() && self.keyboard_key().direction8().is_some()
    }

    pub fn is_keyboard_direction_key_released(&self) -> bool {
        self.is_keyboard_key_released() && self.keyboard_key().direction8().is_some()
    }

    pub fn is_character_pressed(&self) -> bool {
        matches!(self, InputEvent::Text(_))
    }

    pub fn text(&self) -> &str {
        match self {
            InputEvent::Text(text) => text,
            _ => "",
        }
    }

    // mouse

    pub fn is_mouse_event(&self) -> bool {
        matches!(
            self,
            InputEvent::MouseButton(_) | InputEvent::MouseMotion { .. } | InputEvent::MouseWheel { .. }
        )
    }

    pub fn is_mouse_button_pressed(&self) -> bool {
        matches!(self, InputEvent::MouseButton(event) if event.pressed)
    }

    pub fn is_mouse_button_released(&self) -> bool {
        matches!(self, InputEvent::MouseButton(event) if !event.pressed)
    }

    pub fn mouse_button(&self) -> MouseButton {
        match self {
            InputEvent::MouseButton(event) => event.button,
            _ => MouseButton::None,
        }
    }

    /// Pointer position in window pixels. Only valid on mouse button and
    /// motion events.
    pub fn mouse_position(&self) -> (i32, i32) {
        match self {
            InputEvent::MouseButton(event) => (event.x, event.y),
            InputEvent::MouseMotion { x, y } => (*x, *y),
            _ => {
                debug_assert!(false, "mouse_position queried on {self:?}");
                (0, 0)
            }
        }
    }

    // joypad

    pub fn is_joypad_event(&self) -> bool {
        matches!(
            self,
            InputEvent::JoypadButton { .. }
                | InputEvent::JoypadAxis { .. }
                | InputEvent::JoypadHat { .. }
                | InputEvent::JoypadDevice { .. }
        )
    }

    pub fn joypad_id(&self) -> Option<JoypadId> {
        match self {
            InputEvent::JoypadButton { joypad, .. }
            | InputEvent::JoypadAxis { joypad, .. }
            | InputEvent::JoypadHat { joypad, .. } => Some(*joypad),
            InputEvent::JoypadDevice { info, .. } => Some(info.id),
            _ => None,
        }
    }

    pub fn is_joypad_button_pressed(&self) -> bool {
        matches!(self, InputEvent::JoypadButton { pressed: true, .. })
    }

    pub fn is_joypad_button_released(&self) -> bool {
        matches!(self, InputEvent::JoypadButton { pressed: false, .. })
    }

    pub fn joypad_button(&self) -> JoypadButton {
        match self {
            InputEvent::JoypadButton { button, .. } => *button,
            _ => JoypadButton::Invalid,
        }
    }

    pub fn is_joypad_axis_moved(&self) -> bool {
        matches!(self, InputEvent::JoypadAxis { .. })
    }

    pub fn joypad_axis(&self) -> JoypadAxis {
        match self {
            InputEvent::JoypadAxis { axis, .. } => *axis,
            _ => JoypadAxis::Invalid,
        }
    }

    pub fn joypad_axis_state(&self) -> f64 {
        match self {
            InputEvent::JoypadAxis { state, .. } => *state,
            _ => 0.0,
        }
    }

    pub fn is_joypad_axis_centered(&self) -> bool {
        self.is_joypad_axis_moved() && self.joypad_axis_state() == 0.0
    }

    pub fn is_joypad_hat_moved(&self) -> bool {
        matches!(self, InputEvent::JoypadHat { .. })
    }

    pub fn joypad_hat_direction(&self) -> i32 {
        match self {
            InputEvent::JoypadHat { direction, .. } => *direction,
            _ => -1,
        }
    }

    pub fn is_joypad_added(&self) -> bool {
        matches!(
            self,
            InputEvent::JoypadDevice {
                change: DeviceChange::Added,
                ..
            }
        )
    }

    pub fn is_joypad_removed(&self) -> bool {
        matches!(
            self,
            InputEvent::JoypadDevice {
                change: DeviceChange::Removed,
                ..
            }
        )
    }

    pub fn joypad_info(&self) -> Option<&JoypadInfo> {
        match self {
            InputEvent::JoypadDevice { info, .. } => Some(info),
            _ => None,
        }
    }

    // finger

    pub fn is_finger_event(&self) -> bool {
        matches!(self, InputEvent::Finger(_))
    }

    pub fn is_finger_pressed(&self) -> bool {
        matches!(self, InputEvent::Finger(event) if event.phase == FingerPhase::Down)
    }

    pub fn is_finger_released(&self) -> bool {
        matches!(self, InputEvent::Finger(event) if event.phase == FingerPhase::Up)
    }

    pub fn is_finger_moved(&self) -> bool {
        matches!(self, InputEvent::Finger(event) if event.phase == FingerPhase::Motion)
    }

    fn finger(&self) -> FingerEvent {
        match self {
            InputEvent::Finger(event) => *event,
            _ => {
                debug_assert!(false, "finger data queried on {self:?}");
                FingerEvent {
                    phase: FingerPhase::Motion,
                    finger_id: 0,
                    x: 0.0,
                    y: 0.0,
                    dx: 0.0,
                    dy: 0.0,
                    pressure: 0.0,
                }
            }
        }
    }

    pub fn finger_id(&self) -> i64 {
        self.finger().finger_id
    }

    /// Normalized to `[0, 1]` on both axes.
    pub fn finger_position(&self) -> (f32, f32) {
        let finger = self.finger();
        (finger.x, finger.y)
    }

    pub fn finger_distance(&self) -> (f32, f32) {
        let finger = self.finger();
        (finger.dx, finger.dy)
    }

    pub fn finger_pressure(&self) -> f32 {
        self.finger().pressure
    }

    // window

    pub fn is_window_closing(&self) -> bool {
        matches!(self, InputEvent::Window(WindowEvent::Closing))
    }

    pub fn is_window_resizing(&self) -> bool {
        matches!(self, InputEvent::Window(WindowEvent::Resized { .. }))
    }

    pub fn window_size(&self) -> Option<(u32, u32)> {
        match self {
            InputEvent::Window(WindowEvent::Resized { width, height }) => Some((*width, *height)),
            _ => None,
        }
    }

    pub fn is_window_focus_lost(&self) -> bool {
        matches!(self, InputEvent::Window(WindowEvent::FocusLost))
    }

    pub fn is_window_focus_gained(&self) -> bool {
        matches!(self, InputEvent::Window(WindowEvent::FocusGained))
    }

    /// Direction in eighths of a turn (0 = right, 2 = up), or -1.
    ///
    /// A direction key press wins over a stick movement, which wins over a
    /// hat movement.
    pub fn direction(&self) -> i32 {
        if self.is_keyboard_direction_key_pressed() {
            return self.keyboard_key().direction8().unwrap_or(-1);
        }

        if self.is_joypad_axis_moved() && !self.is_joypad_axis_centered() {
            let state = self.joypad_axis_state();
            return if self.joypad_axis().is_horizontal() {
                if state > 0.0 {
                    0
                } else {
                    4
                }
            } else if state > 0.0 {
                6
            } else {
                2
            };
        }

        if self.is_joypad_hat_moved() {
            return self.joypad_hat_direction();
        }

        -1
    }

    pub fn is_direction_pressed(&self) -> bool {
        self.direction() != -1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_event(key: KeyboardKey, pressed: bool, repeat: bool) -> InputEvent {
        InputEvent::Keyboard(KeyboardEvent {
            key,
            code: key.code(),
            pressed,
            repeat,
            modifiers: KeyModifiers::default(),
            repeat_enabled: false,
        })
    }

    fn axis_event(axis: JoypadAxis, state: f64) -> InputEvent {
        InputEvent::JoypadAxis {
            joypad: JoypadId(0),
            axis,
            state,
        }
    }

    #[test]
    fn other_kind_accessors_return_sentinels() {
        let event = InputEvent::Window(WindowEvent::FocusLost);

        assert_eq!(event.keyboard_key(), KeyboardKey::None);
        assert_eq!(event.mouse_button(), MouseButton::None);
        assert_eq!(event.joypad_button(), JoypadButton::Invalid);
        assert_eq!(event.joypad_axis(), JoypadAxis::Invalid);
        assert_eq!(event.joypad_hat_direction(), -1);
        assert_eq!(event.joypad_axis_state(), 0.0);
        assert_eq!(event.joypad_id(), None);
        assert_eq!(event.direction(), -1);
    }

    #[test]
    fn direction_keys_map_to_eighths() {
        assert_eq!(key_event(KeyboardKey::Right, true, false).direction(), 0);
        assert_eq!(key_event(KeyboardKey::Up, true, false).direction(), 2);
        assert_eq!(key_event(KeyboardKey::Left, true, false).direction(), 4);
        assert_eq!(key_event(KeyboardKey::Down, true, false).direction(), 6);
        assert_eq!(key_event(KeyboardKey::Down, false, false).direction(), -1);
        assert_eq!(key_event(KeyboardKey::A, true, false).direction(), -1);
    }

    #[test]
    fn repeated_key_is_not_a_press_unless_enabled() {
        let repeated = key_event(KeyboardKey::Space, true, true);
        assert!(!repeated.is_keyboard_key_pressed());
        assert!(repeated.is_repeat());

        let InputEvent::Keyboard(mut inner) = repeated else {
            panic!("keyboard event expected");
        };
        inner.repeat_enabled = true;
        assert!(InputEvent::Keyboard(inner).is_keyboard_key_pressed());
    }

    #[test]
    fn axis_direction_depends_on_axis_orientation() {
        assert_eq!(axis_event(JoypadAxis::LeftX, 0.8).direction(), 0);
        assert_eq!(axis_event(JoypadAxis::RightX, -0.8).direction(), 4);
        assert_eq!(axis_event(JoypadAxis::LeftY, 0.8).direction(), 6);
        assert_eq!(axis_event(JoypadAxis::RightY, -0.2).direction(), 2);
        assert_eq!(axis_event(JoypadAxis::LeftX, 0.0).direction(), -1);
    }

    #[test]
    fn hat_direction_passes_through() {
        let event = InputEvent::JoypadHat {
            joypad: JoypadId(1),
            direction: 7,
        };
        assert_eq!(event.direction(), 7);
        assert!(event.is_joypad_event());
    }

    #[test]
    fn finger_accessors_read_touch_data() {
        let event = InputEvent::Finger(FingerEvent {
            phase: FingerPhase::Down,
            finger_id: 9,
            x: 0.25,
            y: 0.5,
            dx: 0.0,
            dy: 0.0,
            pressure: 0.7,
        });

        assert!(event.is_finger_pressed());
        assert_eq!(event.finger_id(), 9);
        assert_eq!(event.finger_position(), (0.25, 0.5));
        assert!((event.finger_pressure() - 0.7).abs() < f32::EPSILON);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "mouse_position queried")]
    fn mouse_position_on_keyboard_event_panics_in_debug() {
        key_event(KeyboardKey::A, true, false).mouse_position();
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "finger data queried")]
    fn finger_pressure_on_mouse_event_panics_in_debug() {
        InputEvent::MouseMotion { x: 1, y: 2 }.finger_pressure();
    }
}
