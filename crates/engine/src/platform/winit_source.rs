use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::time::Duration;

use tracing::{debug, info};
use winit::event::{
    ElementState, Event, KeyEvent, MouseButton, MouseScrollDelta, Touch, TouchPhase, WindowEvent,
};
use winit::event_loop::EventLoop;
use winit::keyboard::{KeyCode, ModifiersState, PhysicalKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};

use crate::app::Size;
use crate::input::{
    unmapped_key_code, EventSource, FingerPhase, JoypadDescriptor, KeyModifiers, KeyboardKey,
    RawEvent,
};

use super::gamepads::GamepadBackend;

/// Event source backed by a winit event loop that is pumped, never run, so
/// the engine keeps ownership of the frame cadence.
pub struct WinitEventSource {
    event_loop: EventLoop<()>,
    translator: WindowEventTranslator,
    gamepads: GamepadBackend,
    queue: VecDeque<RawEvent>,
    mouse_captured: bool,
}

impl WinitEventSource {
    pub fn new(event_loop: EventLoop<()>, window_size: Size, quest_size: Size) -> Self {
        Self {
            event_loop,
            translator: WindowEventTranslator::new(window_size, quest_size),
            gamepads: GamepadBackend::new(),
            queue: VecDeque::new(),
            mouse_captured: false,
        }
    }

    fn pump(&mut self) {
        let translator = &mut self.translator;
        let queue = &mut self.queue;
        let status = self
            .event_loop
            .pump_events(Some(Duration::ZERO), |event, _| match event {
                Event::WindowEvent { event, .. } => translator.translate(event, queue),
                Event::LoopExiting => queue.push_back(RawEvent::Quit),
                _ => {}
            });
        if let PumpStatus::Exit(code) = status {
            info!(code, "event_loop_exited");
            self.queue.push_back(RawEvent::Quit);
        }
        self.gamepads.drain_into(&mut self.queue);
    }
}

impl EventSource for WinitEventSource {
    fn poll_event(&mut self) -> Option<RawEvent> {
        if self.queue.is_empty() {
            self.pump();
        }
        self.queue.pop_front()
    }

    fn push_event(&mut self, event: RawEvent) {
        self.queue.push_back(event);
    }

    // winit keeps delivering motion while a button is held, so capture is
    // only recorded.
    fn set_mouse_capture(&mut self, capture: bool) {
        if self.mouse_captured != capture {
            debug!(capture, "mouse_capture_changed");
        }
        self.mouse_captured = capture;
    }

    fn any_mouse_button_down(&self) -> bool {
        self.translator.any_mouse_button_down()
    }

    fn open_joypad(&mut self, index: usize) -> Option<JoypadDescriptor> {
        self.gamepads.open(index)
    }

    fn connected_joypad_indices(&self) -> Vec<usize> {
        self.gamepads.connected_indices()
    }
}

/// Turns winit window events into raw engine events. Pointer positions are
/// rescaled from window pixels to quest coordinates.
#[derive(Debug)]
struct WindowEventTranslator {
    window_size: Size,
    quest_size: Size,
    modifiers: KeyModifiers,
    cursor: (i32, i32),
    buttons_down: BTreeSet<u8>,
    fingers: HashMap<u64, (f32, f32)>,
}

impl WindowEventTranslator {
    fn new(window_size: Size, quest_size: Size) -> Self {
        Self {
            window_size,
            quest_size,
            modifiers: KeyModifiers::default(),
            cursor: (0, 0),
            buttons_down: BTreeSet::new(),
            fingers: HashMap::new(),
        }
    }

    fn any_mouse_button_down(&self) -> bool {
        !self.buttons_down.is_empty()
    }

    fn translate(&mut self, event: WindowEvent, queue: &mut VecDeque<RawEvent>) {
        match event {
            WindowEvent::CloseRequested => queue.push_back(RawEvent::WindowClose),
            WindowEvent::Resized(size) => {
                queue.push_back(self.resized(size.width, size.height));
            }
            WindowEvent::Focused(true) => queue.push_back(RawEvent::WindowFocusGained),
            WindowEvent::Focused(false) => queue.push_back(RawEvent::WindowFocusLost),
            WindowEvent::ModifiersChanged(modifiers) => self.set_modifiers(modifiers.state()),
            WindowEvent::KeyboardInput { event, .. } => self.keyboard(event, queue),
            WindowEvent::CursorMoved { position, .. } => {
                queue.push_back(self.cursor_moved(position.x, position.y));
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if let Some(raw) = self.mouse_button(button, state == ElementState::Pressed) {
                    queue.push_back(raw);
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let (dx, dy) = match delta {
                    MouseScrollDelta::LineDelta(dx, dy) => (dx, dy),
                    MouseScrollDelta::PixelDelta(position) => {
                        (position.x as f32, position.y as f32)
                    }
                };
                queue.push_back(RawEvent::MouseWheel { dx, dy });
            }
            WindowEvent::Touch(touch) => queue.push_back(self.touch(touch)),
            _ => {}
        }
    }

    fn resized(&mut self, width: u32, height: u32) -> RawEvent {
        self.window_size = Size::new(width, height);
        RawEvent::WindowResized { width, height }
    }

    fn set_modifiers(&mut self, state: ModifiersState) {
        self.modifiers.shift = state.shift_key();
        self.modifiers.control = state.control_key();
        self.modifiers.alt = state.alt_key();
    }

    fn keyboard(&mut self, event: KeyEvent, queue: &mut VecDeque<RawEvent>) {
        let (key, code) = physical_key_code(event.physical_key);
        let pressed = event.state == ElementState::Pressed;
        if pressed && !event.repeat {
            match key {
                KeyboardKey::CapsLock => self.modifiers.caps_lock = !self.modifiers.caps_lock,
                KeyboardKey::NumLock => self.modifiers.num_lock = !self.modifiers.num_lock,
                _ => {}
            }
        }

        if pressed {
            queue.push_back(RawEvent::KeyDown {
                code,
                modifiers: self.modifiers,
                repeat: event.repeat,
            });
            if let Some(text) = event.text.filter(|text| is_printable(text)) {
                queue.push_back(RawEvent::TextInput {
                    text: text.to_string(),
                });
            }
        } else {
            queue.push_back(RawEvent::KeyUp {
                code,
                modifiers: self.modifiers,
                repeat: event.repeat,
            });
        }
    }

    fn to_quest(&self, x: f64, y: f64) -> (i32, i32) {
        let scale = |value: f64, window: u32, quest: u32| {
            if window == 0 {
                return value as i32;
            }
            (value * f64::from(quest) / f64::from(window)).floor() as i32
        };
        (
            scale(x, self.window_size.width, self.quest_size.width),
            scale(y, self.window_size.height, self.quest_size.height),
        )
    }

    fn cursor_moved(&mut self, x: f64, y: f64) -> RawEvent {
        self.cursor = self.to_quest(x, y);
        RawEvent::MouseMotion {
            x: self.cursor.0,
            y: self.cursor.1,
        }
    }

    fn mouse_button(&mut self, button: MouseButton, pressed: bool) -> Option<RawEvent> {
        let code = mouse_button_code(button)?;
        let (x, y) = self.cursor;
        if pressed {
            self.buttons_down.insert(code);
            Some(RawEvent::MouseButtonDown { button: code, x, y })
        } else {
            self.buttons_down.remove(&code);
            Some(RawEvent::MouseButtonUp { button: code, x, y })
        }
    }

    fn touch(&mut self, touch: Touch) -> RawEvent {
        let x = normalized(touch.location.x, self.window_size.width);
        let y = normalized(touch.location.y, self.window_size.height);
        let (last_x, last_y) = self.fingers.get(&touch.id).copied().unwrap_or((x, y));
        let phase = match touch.phase {
            TouchPhase::Started => FingerPhase::Down,
            TouchPhase::Moved => FingerPhase::Motion,
            TouchPhase::Ended | TouchPhase::Cancelled => FingerPhase::Up,
        };
        if phase == FingerPhase::Up {
            self.fingers.remove(&touch.id);
        } else {
            self.fingers.insert(touch.id, (x, y));
        }
        RawEvent::Finger {
            phase,
            finger_id: touch.id as i64,
            x,
            y,
            dx: x - last_x,
            dy: y - last_y,
            pressure: touch.force.map_or(1.0, |force| force.normalized() as f32),
        }
    }
}

fn normalized(value: f64, extent: u32) -> f32 {
    if extent == 0 {
        return 0.0;
    }
    (value / f64::from(extent)).clamp(0.0, 1.0) as f32
}

fn is_printable(text: &str) -> bool {
    !text.is_empty() && !text.chars().any(char::is_control)
}

fn mouse_button_code(button: MouseButton) -> Option<u8> {
    match button {
        MouseButton::Left => Some(1),
        MouseButton::Middle => Some(2),
        MouseButton::Right => Some(3),
        MouseButton::Back => Some(4),
        MouseButton::Forward => Some(5),
        MouseButton::Other(_) => None,
    }
}

/// Keyboard key and raw code for a physical key. Keys without a
/// `KeyboardKey` get a code of their own in the unmapped range.
fn physical_key_code(physical: PhysicalKey) -> (KeyboardKey, i32) {
    let key = match physical {
        PhysicalKey::Code(code) => keyboard_key(code),
        PhysicalKey::Unidentified(_) => KeyboardKey::None,
    };
    match key {
        KeyboardKey::None => {
            let mut hasher = DefaultHasher::new();
            physical.hash(&mut hasher);
            (key, unmapped_key_code(hasher.finish()))
        }
        key => (key, key.code()),
    }
}

fn keyboard_key(code: KeyCode) -> KeyboardKey {
    match code {
        KeyCode::KeyA => KeyboardKey::A,
        KeyCode::KeyB => KeyboardKey::B,
        KeyCode::KeyC => KeyboardKey::C,
        KeyCode::KeyD => KeyboardKey::D,
        KeyCode::KeyE => KeyboardKey::E,
        KeyCode::KeyF => KeyboardKey::F,
        KeyCode::KeyG => KeyboardKey::G,
        KeyCode::KeyH => KeyboardKey::H,
        KeyCode::KeyI => KeyboardKey::I,
        KeyCode::KeyJ => KeyboardKey::J,
        KeyCode::KeyK => KeyboardKey::K,
        KeyCode::KeyL => KeyboardKey::L,
        KeyCode::KeyM => KeyboardKey::M,
        KeyCode::KeyN => KeyboardKey::N,
        KeyCode::KeyO => KeyboardKey::O,
        KeyCode::KeyP => KeyboardKey::P,
        KeyCode::KeyQ => KeyboardKey::Q,
        KeyCode::KeyR => KeyboardKey::R,
        KeyCode::KeyS => KeyboardKey::S,
        KeyCode::KeyT => KeyboardKey::T,
        KeyCode::KeyU => KeyboardKey::U,
        KeyCode::KeyV => KeyboardKey::V,
        KeyCode::KeyW => KeyboardKey::W,
        KeyCode::KeyX => KeyboardKey::X,
        KeyCode::KeyY => KeyboardKey::Y,
        KeyCode::KeyZ => KeyboardKey::Z,
        KeyCode::Digit0 => KeyboardKey::Number0,
        KeyCode::Digit1 => KeyboardKey::Number1,
        KeyCode::Digit2 => KeyboardKey::Number2,
        KeyCode::Digit3 => KeyboardKey::Number3,
        KeyCode::Digit4 => KeyboardKey::Number4,
        KeyCode::Digit5 => KeyboardKey::Number5,
        KeyCode::Digit6 => KeyboardKey::Number6,
        KeyCode::Digit7 => KeyboardKey::Number7,
        KeyCode::Digit8 => KeyboardKey::Number8,
        KeyCode::Digit9 => KeyboardKey::Number9,
        KeyCode::F1 => KeyboardKey::F1,
        KeyCode::F2 => KeyboardKey::F2,
        KeyCode::F3 => KeyboardKey::F3,
        KeyCode::F4 => KeyboardKey::F4,
        KeyCode::F5 => KeyboardKey::F5,
        KeyCode::F6 => KeyboardKey::F6,
        KeyCode::F7 => KeyboardKey::F7,
        KeyCode::F8 => KeyboardKey::F8,
        KeyCode::F9 => KeyboardKey::F9,
        KeyCode::F10 => KeyboardKey::F10,
        KeyCode::F11 => KeyboardKey::F11,
        KeyCode::F12 => KeyboardKey::F12,
        KeyCode::F13 => KeyboardKey::F13,
        KeyCode::F14 => KeyboardKey::F14,
        KeyCode::F15 => KeyboardKey::F15,
        KeyCode::ArrowUp => KeyboardKey::Up,
        KeyCode::ArrowDown => KeyboardKey::Down,
        KeyCode::ArrowLeft => KeyboardKey::Left,
        KeyCode::ArrowRight => KeyboardKey::Right,
        KeyCode::Numpad0 => KeyboardKey::Kp0,
        KeyCode::Numpad1 => KeyboardKey::Kp1,
        KeyCode::Numpad2 => KeyboardKey::Kp2,
        KeyCode::Numpad3 => KeyboardKey::Kp3,
        KeyCode::Numpad4 => KeyboardKey::Kp4,
        KeyCode::Numpad5 => KeyboardKey::Kp5,
        KeyCode::Numpad6 => KeyboardKey::Kp6,
        KeyCode::Numpad7 => KeyboardKey::Kp7,
        KeyCode::Numpad8 => KeyboardKey::Kp8,
        KeyCode::Numpad9 => KeyboardKey::Kp9,
        KeyCode::NumpadAdd => KeyboardKey::KpPlus,
        KeyCode::NumpadSubtract => KeyboardKey::KpMinus,
        KeyCode::NumpadMultiply => KeyboardKey::KpMultiply,
        KeyCode::NumpadDivide => KeyboardKey::KpDivide,
        KeyCode::NumpadDecimal => KeyboardKey::KpPeriod,
        KeyCode::NumpadEnter => KeyboardKey::KpEnter,
        KeyCode::NumpadEqual => KeyboardKey::KpEquals,
        KeyCode::ShiftLeft => KeyboardKey::LeftShift,
        KeyCode::ShiftRight => KeyboardKey::RightShift,
        KeyCode::ControlLeft => KeyboardKey::LeftControl,
        KeyCode::ControlRight => KeyboardKey::RightControl,
        KeyCode::AltLeft => KeyboardKey::LeftAlt,
        KeyCode::AltRight => KeyboardKey::RightAlt,
        KeyCode::SuperLeft => KeyboardKey::LeftMeta,
        KeyCode::SuperRight => KeyboardKey::RightMeta,
        KeyCode::Space => KeyboardKey::Space,
        KeyCode::Enter => KeyboardKey::Return,
        KeyCode::Escape => KeyboardKey::Escape,
        KeyCode::Tab => KeyboardKey::Tab,
        KeyCode::Backspace => KeyboardKey::Backspace,
        KeyCode::Delete => KeyboardKey::Delete,
        KeyCode::Insert => KeyboardKey::Insert,
        KeyCode::Home => KeyboardKey::Home,
        KeyCode::End => KeyboardKey::End,
        KeyCode::PageUp => KeyboardKey::PageUp,
        KeyCode::PageDown => KeyboardKey::PageDown,
        KeyCode::CapsLock => KeyboardKey::CapsLock,
        KeyCode::NumLock => KeyboardKey::NumLock,
        KeyCode::ScrollLock => KeyboardKey::ScrollLock,
        KeyCode::Pause => KeyboardKey::Pause,
        KeyCode::Minus => KeyboardKey::Minus,
        KeyCode::Equal => KeyboardKey::Equals,
        KeyCode::BracketLeft => KeyboardKey::LeftBracket,
        KeyCode::BracketRight => KeyboardKey::RightBracket,
        KeyCode::Backslash => KeyboardKey::Backslash,
        KeyCode::Semicolon => KeyboardKey::Semicolon,
        KeyCode::Quote => KeyboardKey::Quote,
        KeyCode::Backquote => KeyboardKey::Backquote,
        KeyCode::Comma => KeyboardKey::Comma,
        KeyCode::Period => KeyboardKey::Period,
        KeyCode::Slash => KeyboardKey::Slash,
        _ => KeyboardKey::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::UNMAPPED_KEY_FLAG;
    use winit::keyboard::NativeKeyCode;

    fn translator() -> WindowEventTranslator {
        WindowEventTranslator::new(Size::new(640, 480), Size::new(320, 240))
    }

    #[test]
    fn physical_keys_map_to_keyboard_codes() {
        assert_eq!(keyboard_key(KeyCode::KeyQ), KeyboardKey::Q);
        assert_eq!(keyboard_key(KeyCode::ArrowLeft), KeyboardKey::Left);
        assert_eq!(keyboard_key(KeyCode::ShiftRight), KeyboardKey::RightShift);
        assert_eq!(keyboard_key(KeyCode::NumpadEnter), KeyboardKey::KpEnter);
        assert_eq!(keyboard_key(KeyCode::Fn), KeyboardKey::None);
    }

    #[test]
    fn unmapped_physical_keys_keep_distinct_codes() {
        let (key, first) = physical_key_code(PhysicalKey::Unidentified(NativeKeyCode::Xkb(200)));
        let (_, second) = physical_key_code(PhysicalKey::Unidentified(NativeKeyCode::Xkb(201)));
        let (_, function) = physical_key_code(PhysicalKey::Code(KeyCode::Fn));
        let (_, again) = physical_key_code(PhysicalKey::Unidentified(NativeKeyCode::Xkb(200)));

        assert_eq!(key, KeyboardKey::None);
        assert_ne!(first, second);
        assert_ne!(first, function);
        assert_eq!(first, again);
        for code in [first, second, function] {
            assert_ne!(code & UNMAPPED_KEY_FLAG, 0);
            assert_eq!(KeyboardKey::from_code(code), KeyboardKey::None);
        }
        assert_eq!(
            physical_key_code(PhysicalKey::Code(KeyCode::KeyQ)),
            (KeyboardKey::Q, KeyboardKey::Q.code())
        );
    }

    #[test]
    fn cursor_positions_scale_to_quest_coordinates() {
        let mut translator = translator();
        assert_eq!(
            translator.cursor_moved(100.0, 51.0),
            RawEvent::MouseMotion { x: 50, y: 25 }
        );

        translator.resized(320, 240);
        assert_eq!(
            translator.cursor_moved(100.0, 51.0),
            RawEvent::MouseMotion { x: 100, y: 51 }
        );
    }

    #[test]
    fn mouse_buttons_report_cursor_and_held_state() {
        let mut translator = translator();
        translator.cursor_moved(20.0, 40.0);

        let down = translator.mouse_button(MouseButton::Right, true);
        assert_eq!(
            down,
            Some(RawEvent::MouseButtonDown {
                button: 3,
                x: 10,
                y: 20
            })
        );
        assert!(translator.any_mouse_button_down());

        translator.mouse_button(MouseButton::Right, false);
        assert!(!translator.any_mouse_button_down());
        assert_eq!(translator.mouse_button(MouseButton::Other(9), true), None);
    }

    #[test]
    fn window_events_without_devices_translate_directly() {
        let mut translator = translator();
        let mut queue = VecDeque::new();
        translator.translate(WindowEvent::CloseRequested, &mut queue);
        translator.translate(WindowEvent::Focused(false), &mut queue);
        translator.translate(
            WindowEvent::Resized(winit::dpi::PhysicalSize::new(800, 600)),
            &mut queue,
        );

        assert_eq!(
            queue.into_iter().collect::<Vec<_>>(),
            vec![
                RawEvent::WindowClose,
                RawEvent::WindowFocusLost,
                RawEvent::WindowResized {
                    width: 800,
                    height: 600
                },
            ]
        );
        assert_eq!(translator.window_size, Size::new(800, 600));
    }

    #[test]
    fn control_characters_are_not_text_input() {
        assert!(is_printable("a"));
        assert!(!is_printable("\r"));
        assert!(!is_printable(""));
    }
}
