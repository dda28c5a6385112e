use super::keys::KeyModifiers;

/// Stable identity of a joypad, as assigned by the host when the device opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JoypadId(pub u64);

impl std::fmt::Display for JoypadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the host reports when a joypad at some device index is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoypadDescriptor {
    pub instance_id: JoypadId,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FingerPhase {
    Down,
    Up,
    Motion,
}

/// Platform event before normalization.
///
/// Key codes use the keyboard-code space of [`super::KeyboardKey`]; joypad
/// buttons and axes use controller-layout indices.
#[derive(Debug, Clone, PartialEq)]
pub enum RawEvent {
    Quit,
    WindowClose,
    WindowResized {
        width: u32,
        height: u32,
    },
    WindowFocusLost,
    WindowFocusGained,
    KeyDown {
        code: i32,
        modifiers: KeyModifiers,
        repeat: bool,
    },
    KeyUp {
        code: i32,
        modifiers: KeyModifiers,
        repeat: bool,
    },
    TextInput {
        text: String,
    },
    MouseButtonDown {
        button: u8,
        x: i32,
        y: i32,
    },
    MouseButtonUp {
        button: u8,
        x: i32,
        y: i32,
    },
    MouseMotion {
        x: i32,
        y: i32,
    },
    MouseWheel {
        dx: f32,
        dy: f32,
    },
    JoypadButtonDown {
        joypad: JoypadId,
        button: u8,
    },
    JoypadButtonUp {
        joypad: JoypadId,
        button: u8,
    },
    JoypadAxisMotion {
        joypad: JoypadId,
        axis: u8,
        value: i16,
    },
    JoypadHatMotion {
        joypad: JoypadId,
        direction: i32,
    },
    JoypadDeviceAdded {
        index: usize,
    },
    JoypadDeviceRemoved {
        joypad: JoypadId,
    },
    Finger {
        phase: FingerPhase,
        finger_id: i64,
        x: f32,
        y: f32,
        dx: f32,
        dy: f32,
        pressure: f32,
    },
    /// Anything the host reports that the engine has no meaning for.
    Unknown,
}
