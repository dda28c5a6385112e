use std::collections::VecDeque;

use gilrs::{Axis, Button, EventType, Gilrs};
use tracing::{debug, warn};

use crate::input::{JoypadAxis, JoypadButton, JoypadDescriptor, JoypadId, RawEvent};

/// Joypads through gilrs. Missing gamepad support is not fatal: the backend
/// then reports no devices.
pub struct GamepadBackend {
    gilrs: Option<Gilrs>,
}

impl GamepadBackend {
    pub fn new() -> Self {
        let gilrs = match Gilrs::new() {
            Ok(gilrs) => Some(gilrs),
            Err(gilrs::Error::NotImplemented(dummy)) => {
                warn!("gamepads not supported on this platform; joypads disabled");
                Some(dummy)
            }
            Err(error) => {
                warn!(error = %error, "gamepad_backend_unavailable");
                None
            }
        };
        Self { gilrs }
    }

    pub fn connected_indices(&self) -> Vec<usize> {
        let Some(gilrs) = self.gilrs.as_ref() else {
            return Vec::new();
        };
        gilrs
            .gamepads()
            .filter(|(_, gamepad)| gamepad.is_connected())
            .map(|(id, _)| usize::from(id))
            .collect()
    }

    pub fn open(&self, index: usize) -> Option<JoypadDescriptor> {
        let gilrs = self.gilrs.as_ref()?;
        let (id, gamepad) = gilrs
            .gamepads()
            .find(|(id, gamepad)| usize::from(*id) == index && gamepad.is_connected())?;
        Some(JoypadDescriptor {
            instance_id: joypad_id(id),
            name: gamepad.name().to_string(),
        })
    }

    /// Moves every pending gamepad event into `queue` as raw events.
    pub fn drain_into(&mut self, queue: &mut VecDeque<RawEvent>) {
        let Some(gilrs) = self.gilrs.as_mut() else {
            return;
        };
        while let Some(event) = gilrs.next_event() {
            if let Some(raw) = translate_event(event.id, event.event) {
                queue.push_back(raw);
            }
        }
    }
}

impl Default for GamepadBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn joypad_id(id: gilrs::GamepadId) -> JoypadId {
    JoypadId(usize::from(id) as u64)
}

fn translate_event(id: gilrs::GamepadId, event: EventType) -> Option<RawEvent> {
    let joypad = joypad_id(id);
    match event {
        EventType::ButtonPressed(button, _) => Some(RawEvent::JoypadButtonDown {
            joypad,
            button: button_code(button)?,
        }),
        EventType::ButtonReleased(button, _) => Some(RawEvent::JoypadButtonUp {
            joypad,
            button: button_code(button)?,
        }),
        EventType::ButtonChanged(button, value, _) => {
            let axis = trigger_axis(button)?;
            Some(RawEvent::JoypadAxisMotion {
                joypad,
                axis: axis_code(axis)?,
                value: to_raw_axis(value),
            })
        }
        EventType::AxisChanged(axis, value, _) => {
            let (mapped, inverted) = map_axis(axis)?;
            let value = if inverted { -value } else { value };
            Some(RawEvent::JoypadAxisMotion {
                joypad,
                axis: axis_code(mapped)?,
                value: to_raw_axis(value),
            })
        }
        EventType::Connected => Some(RawEvent::JoypadDeviceAdded {
            index: usize::from(id),
        }),
        EventType::Disconnected => Some(RawEvent::JoypadDeviceRemoved { joypad }),
        other => {
            debug!(event = ?other, "gamepad_event_ignored");
            None
        }
    }
}

fn button_code(button: Button) -> Option<u8> {
    map_button(button).code()
}

pub(crate) fn map_button(button: Button) -> JoypadButton {
    match button {
        Button::South => JoypadButton::A,
        Button::East => JoypadButton::B,
        Button::West => JoypadButton::X,
        Button::North => JoypadButton::Y,
        Button::Select => JoypadButton::Back,
        Button::Mode => JoypadButton::Guide,
        Button::Start => JoypadButton::Start,
        Button::LeftThumb => JoypadButton::LeftStick,
        Button::RightThumb => JoypadButton::RightStick,
        Button::LeftTrigger => JoypadButton::LeftShoulder,
        Button::RightTrigger => JoypadButton::RightShoulder,
        Button::DPadUp => JoypadButton::DpadUp,
        Button::DPadDown => JoypadButton::DpadDown,
        Button::DPadLeft => JoypadButton::DpadLeft,
        Button::DPadRight => JoypadButton::DpadRight,
        _ => JoypadButton::Invalid,
    }
}

fn trigger_axis(button: Button) -> Option<JoypadAxis> {
    match button {
        Button::LeftTrigger2 => Some(JoypadAxis::TriggerLeft),
        Button::RightTrigger2 => Some(JoypadAxis::TriggerRight),
        _ => None,
    }
}

/// Maps a gilrs axis, with whether it must be flipped so that down is
/// positive.
pub(crate) fn map_axis(axis: Axis) -> Option<(JoypadAxis, bool)> {
    match axis {
        Axis::LeftStickX => Some((JoypadAxis::LeftX, false)),
        Axis::LeftStickY => Some((JoypadAxis::LeftY, true)),
        Axis::RightStickX => Some((JoypadAxis::RightX, false)),
        Axis::RightStickY => Some((JoypadAxis::RightY, true)),
        Axis::LeftZ => Some((JoypadAxis::TriggerLeft, false)),
        Axis::RightZ => Some((JoypadAxis::TriggerRight, false)),
        _ => None,
    }
}

fn axis_code(axis: JoypadAxis) -> Option<u8> {
    axis.index().and_then(|index| u8::try_from(index).ok())
}

pub(crate) fn to_raw_axis(value: f32) -> i16 {
    (value.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_buttons_follow_controller_layout() {
        assert_eq!(map_button(Button::South), JoypadButton::A);
        assert_eq!(map_button(Button::North), JoypadButton::Y);
        assert_eq!(button_code(Button::DPadRight), Some(14));
        assert_eq!(button_code(Button::C), None);
    }

    #[test]
    fn vertical_sticks_are_flipped() {
        assert_eq!(map_axis(Axis::LeftStickY), Some((JoypadAxis::LeftY, true)));
        assert_eq!(map_axis(Axis::RightStickX), Some((JoypadAxis::RightX, false)));
        assert_eq!(map_axis(Axis::DPadX), None);
    }

    #[test]
    fn axis_values_scale_and_clamp() {
        assert_eq!(to_raw_axis(0.0), 0);
        assert_eq!(to_raw_axis(1.0), i16::MAX);
        assert_eq!(to_raw_axis(-2.0), -i16::MAX);
        assert_eq!(to_raw_axis(0.5), 16383);
    }
}
