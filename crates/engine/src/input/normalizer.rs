use std::collections::{BTreeSet, HashSet};

use tracing::{debug, info};

use super::event::{DeviceChange, FingerEvent, InputEvent, KeyboardEvent, MouseButtonEvent, WindowEvent};
use super::joypad::{compute_axis_value, Joypad, JoypadRegistry, DEFAULT_JOYPAD_DEADZONE};
use super::keys::{JoypadAxis, JoypadButton, KeyModifiers, KeyboardKey, MouseButton};
use super::raw::{JoypadId, RawEvent};
use super::source::EventSource;

#[derive(Debug, Clone)]
pub struct InputConfig {
    pub joypad_deadzone: i32,
    /// Buttons that close the window when held together. Empty disables it.
    pub quit_combo: BTreeSet<JoypadButton>,
    pub key_repeat: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            joypad_deadzone: DEFAULT_JOYPAD_DEADZONE,
            quit_combo: BTreeSet::new(),
            key_repeat: false,
        }
    }
}

/// Turns raw platform events into [`InputEvent`]s and owns the pressed-key,
/// pressed-button and joypad state they imply.
#[derive(Debug)]
pub struct InputNormalizer {
    config: InputConfig,
    initialized: bool,
    keys_pressed: HashSet<i32>,
    joypad_buttons_down: BTreeSet<JoypadButton>,
    joypads: JoypadRegistry,
}

impl InputNormalizer {
    pub fn new(config: InputConfig) -> Self {
        Self {
            config,
            initialized: false,
            keys_pressed: HashSet::new(),
            joypad_buttons_down: BTreeSet::new(),
            joypads: JoypadRegistry::new(),
        }
    }

    /// Resets all state and queues an add notification for every joypad the
    /// host already knows about.
    pub fn initialize(&mut self, source: &mut dyn EventSource) {
        self.clear_state();
        let indices = source.connected_joypad_indices();
        for index in &indices {
            source.push_event(RawEvent::JoypadDeviceAdded { index: *index });
        }
        self.initialized = true;
        info!(
            joypad_deadzone = self.config.joypad_deadzone,
            quit_combo = %format_combo(&self.config.quit_combo),
            connected_joypads = indices.len(),
            "input_initialized"
        );
    }

    pub fn shutdown(&mut self) {
        self.clear_state();
        self.initialized = false;
        debug!("input_shutdown");
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn clear_state(&mut self) {
        self.keys_pressed.clear();
        self.joypad_buttons_down.clear();
        self.joypads.clear();
    }

    pub fn set_key_repeat(&mut self, repeat: bool) {
        self.config.key_repeat = repeat;
    }

    pub fn is_key_repeat(&self) -> bool {
        self.config.key_repeat
    }

    pub fn config(&self) -> &InputConfig {
        &self.config
    }

    pub fn joypads(&self) -> &JoypadRegistry {
        &self.joypads
    }

    pub fn is_key_down(&self, key: KeyboardKey) -> bool {
        self.keys_pressed.contains(&key.code())
    }

    pub fn pressed_key_count(&self) -> usize {
        self.keys_pressed.len()
    }

    pub fn is_joypad_button_down(&self, joypad: JoypadId, button: JoypadButton) -> bool {
        self.joypads
            .get(joypad)
            .is_some_and(|pad| pad.is_button_pressed(button))
    }

    pub fn joypad_axis_state(&self, joypad: JoypadId, axis: JoypadAxis) -> f64 {
        self.joypads
            .get(joypad)
            .map_or(0.0, |pad| pad.axis_state(axis))
    }

    pub fn joypad_hat_direction(&self, joypad: JoypadId) -> i32 {
        self.joypads.get(joypad).map_or(-1, Joypad::hat_direction)
    }

    /// Queues a key press as if the platform had reported it.
    pub fn simulate_key_pressed(&self, source: &mut dyn EventSource, key: KeyboardKey) {
        source.push_event(RawEvent::KeyDown {
            code: key.code(),
            modifiers: KeyModifiers::default(),
            repeat: false,
        });
    }

    pub fn simulate_key_released(&self, source: &mut dyn EventSource, key: KeyboardKey) {
        source.push_event(RawEvent::KeyUp {
            code: key.code(),
            modifiers: KeyModifiers::default(),
            repeat: false,
        });
    }

    pub fn simulate_window_closing(&self, source: &mut dyn EventSource) {
        source.push_event(RawEvent::WindowClose);
    }

    /// Classifies the next raw event. Returns `None` only when the source is
    /// empty; uninteresting events come back as [`InputEvent::Other`].
    pub fn poll(&mut self, source: &mut dyn EventSource) -> Option<InputEvent> {
        let raw = source.poll_event()?;
        Some(self.classify(raw, source))
    }

    fn classify(&mut self, raw: RawEvent, source: &mut dyn EventSource) -> InputEvent {
        match raw {
            RawEvent::Quit | RawEvent::WindowClose => InputEvent::Window(WindowEvent::Closing),
            RawEvent::WindowResized { width, height } => {
                InputEvent::Window(WindowEvent::Resized { width, height })
            }
            RawEvent::WindowFocusLost => InputEvent::Window(WindowEvent::FocusLost),
            RawEvent::WindowFocusGained => InputEvent::Window(WindowEvent::FocusGained),
            RawEvent::KeyDown {
                code,
                modifiers,
                repeat,
            } => {
                // A down for a key already held is a leaked repeat.
                let repeat = !self.keys_pressed.insert(code) || repeat;
                self.keyboard_event(code, true, repeat, modifiers)
            }
            RawEvent::KeyUp {
                code,
                modifiers,
                repeat,
            } => {
                let repeat = !self.keys_pressed.remove(&code) || repeat;
                self.keyboard_event(code, false, repeat, modifiers)
            }
            RawEvent::TextInput { text } => InputEvent::Text(text),
            RawEvent::MouseButtonDown { button, x, y } => {
                source.set_mouse_capture(true);
                InputEvent::MouseButton(MouseButtonEvent {
                    button: MouseButton::from_code(button),
                    pressed: true,
                    x,
                    y,
                })
            }
            RawEvent::MouseButtonUp { button, x, y } => {
                if !source.any_mouse_button_down() {
                    source.set_mouse_capture(false);
                }
                InputEvent::MouseButton(MouseButtonEvent {
                    button: MouseButton::from_code(button),
                    pressed: false,
                    x,
                    y,
                })
            }
            RawEvent::MouseMotion { x, y } => InputEvent::MouseMotion { x, y },
            RawEvent::MouseWheel { dx, dy } => InputEvent::MouseWheel { dx, dy },
            RawEvent::JoypadButtonDown { joypad, button } => {
                let button = JoypadButton::from_code(button);
                // Unknown buttons share `Invalid` and would mask each other.
                if button != JoypadButton::Invalid {
                    self.joypad_buttons_down.insert(button);
                }
                if let Some(pad) = self.joypads.get_mut(joypad) {
                    pad.set_button(button, true);
                }
                if !self.config.quit_combo.is_empty()
                    && self.joypad_buttons_down == self.config.quit_combo
                {
                    info!(joypad = %joypad, "quit_combo_pressed");
                    source.push_event(RawEvent::Quit);
                }
                InputEvent::JoypadButton {
                    joypad,
                    button,
                    pressed: true,
                }
            }
            RawEvent::JoypadButtonUp { joypad, button } => {
                let button = JoypadButton::from_code(button);
                self.joypad_buttons_down.remove(&button);
                if let Some(pad) = self.joypads.get_mut(joypad) {
                    pad.set_button(button, false);
                }
                InputEvent::JoypadButton {
                    joypad,
                    button,
                    pressed: false,
                }
            }
            RawEvent::JoypadAxisMotion {
                joypad,
                axis,
                value,
            } => {
                let axis = JoypadAxis::from_code(axis);
                let state = compute_axis_value(value, self.config.joypad_deadzone);
                if let Some(pad) = self.joypads.get_mut(joypad) {
                    pad.set_axis(axis, state);
                }
                InputEvent::JoypadAxis {
                    joypad,
                    axis,
                    state,
                }
            }
            RawEvent::JoypadHatMotion { joypad, direction } => {
                InputEvent::JoypadHat { joypad, direction }
            }
            RawEvent::JoypadDeviceAdded { index } => self.add_joypad(index, source),
            RawEvent::JoypadDeviceRemoved { joypad } => self.remove_joypad(joypad),
            RawEvent::Finger {
                phase,
                finger_id,
                x,
                y,
                dx,
                dy,
                pressure,
            } => InputEvent::Finger(FingerEvent {
                phase,
                finger_id,
                x,
                y,
                dx,
                dy,
                pressure,
            }),
            RawEvent::Unknown => InputEvent::Other,
        }
    }

    fn keyboard_event(
        &self,
        code: i32,
        pressed: bool,
        repeat: bool,
        modifiers: KeyModifiers,
    ) -> InputEvent {
        InputEvent::Keyboard(KeyboardEvent {
            key: KeyboardKey::from_code(code),
            code,
            pressed,
            repeat,
            modifiers,
            repeat_enabled: self.config.key_repeat,
        })
    }

    fn add_joypad(&mut self, index: usize, source: &mut dyn EventSource) -> InputEvent {
        if self.joypads.knows_index(index) {
            debug!(index, "joypad_add_ignored_duplicate");
            return InputEvent::Other;
        }

        let Some(descriptor) = source.open_joypad(index) else {
            debug!(index, "joypad_open_failed");
            return InputEvent::Other;
        };

        let joypad = Joypad::new(descriptor.instance_id, descriptor.name);
        let info = joypad.info().clone();
        self.joypads.register(index, joypad);
        info!(index, joypad = %info.id, name = %info.name, "joypad_connected");
        InputEvent::JoypadDevice {
            change: DeviceChange::Added,
            info,
        }
    }

    fn remove_joypad(&mut self, id: JoypadId) -> InputEvent {
        let Some(joypad) = self.joypads.remove(id) else {
            debug!(joypad = %id, "joypad_remove_ignored_unknown");
            return InputEvent::Other;
        };

        info!(joypad = %id, name = %joypad.name(), "joypad_disconnected");
        InputEvent::JoypadDevice {
            change: DeviceChange::Removed,
            info: joypad.info().clone(),
        }
    }
}

fn format_combo(combo: &BTreeSet<JoypadButton>) -> String {
    if combo.is_empty() {
        return "off".to_string();
    }
    combo
        .iter()
        .map(|button| button.name())
        .collect::<Vec<_>>()
        .join("+")
}
