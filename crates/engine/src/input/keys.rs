/// Bit set on key codes that are derived from a scancode rather than a
/// printable character.
pub const SCANCODE_MASK: i32 = 1 << 30;

/// Bit set on codes of physical keys that have no `KeyboardKey`. The low
/// bits identify the key so distinct unmapped keys stay distinct.
pub const UNMAPPED_KEY_FLAG: i32 = 1 << 29;

pub fn unmapped_key_code(key_hash: u64) -> i32 {
    UNMAPPED_KEY_FLAG | (key_hash as i32 & (UNMAPPED_KEY_FLAG - 1))
}

const fn scancode(code: i32) -> i32 {
    code | SCANCODE_MASK
}

macro_rules! keyboard_keys {
    ($($variant:ident = $code:expr => $name:literal,)*) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum KeyboardKey {
            None,
            $($variant,)*
        }

        impl KeyboardKey {
            const ALL: &'static [KeyboardKey] = &[$(KeyboardKey::$variant,)*];

            pub fn code(self) -> i32 {
                match self {
                    KeyboardKey::None => 0,
                    $(KeyboardKey::$variant => $code,)*
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    KeyboardKey::None => "",
                    $(KeyboardKey::$variant => $name,)*
                }
            }
        }
    };
}

keyboard_keys! {
    Backspace = 8 => "backspace",
    Tab = 9 => "tab",
    Return = 13 => "return",
    Escape = 27 => "escape",
    Space = 32 => "space",
    ExclamationMark = 33 => "!",
    DoubleQuote = 34 => "\"",
    Hash = 35 => "#",
    Dollar = 36 => "$",
    Ampersand = 38 => "&",
    Quote = 39 => "'",
    LeftParenthesis = 40 => "(",
    RightParenthesis = 41 => ")",
    Asterisk = 42 => "*",
    Plus = 43 => "+",
    Comma = 44 => ",",
    Minus = 45 => "-",
    Period = 46 => ".",
    Slash = 47 => "/",
    Number0 = 48 => "0",
    Number1 = 49 => "1",
    Number2 = 50 => "2",
    Number3 = 51 => "3",
    Number4 = 52 => "4",
    Number5 = 53 => "5",
    Number6 = 54 => "6",
    Number7 = 55 => "7",
    Number8 = 56 => "8",
    Number9 = 57 => "9",
    Colon = 58 => ":",
    Semicolon = 59 => ";",
    Less = 60 => "<",
    Equals = 61 => "=",
    Greater = 62 => ">",
    QuestionMark = 63 => "?",
    At = 64 => "@",
    LeftBracket = 91 => "[",
    Backslash = 92 => "\\",
    RightBracket = 93 => "]",
    Caret = 94 => "^",
    Underscore = 95 => "_",
    Backquote = 96 => "`",
    A = 97 => "a",
    B = 98 => "b",
    C = 99 => "c",
    D = 100 => "d",
    E = 101 => "e",
    F = 102 => "f",
    G = 103 => "g",
    H = 104 => "h",
    I = 105 => "i",
    J = 106 => "j",
    K = 107 => "k",
    L = 108 => "l",
    M = 109 => "m",
    N = 110 => "n",
    O = 111 => "o",
    P = 112 => "p",
    Q = 113 => "q",
    R = 114 => "r",
    S = 115 => "s",
    T = 116 => "t",
    U = 117 => "u",
    V = 118 => "v",
    W = 119 => "w",
    X = 120 => "x",
    Y = 121 => "y",
    Z = 122 => "z",
    Delete = 127 => "delete",
    CapsLock = scancode(57) => "caps lock",
    F1 = scancode(58) => "f1",
    F2 = scancode(59) => "f2",
    F3 = scancode(60) => "f3",
    F4 = scancode(61) => "f4",
    F5 = scancode(62) => "f5",
    F6 = scancode(63) => "f6",
    F7 = scancode(64) => "f7",
    F8 = scancode(65) => "f8",
    F9 = scancode(66) => "f9",
    F10 = scancode(67) => "f10",
    F11 = scancode(68) => "f11",
    F12 = scancode(69) => "f12",
    ScrollLock = scancode(71) => "scroll lock",
    Pause = scancode(72) => "pause",
    Insert = scancode(73) => "insert",
    Home = scancode(74) => "home",
    PageUp = scancode(75) => "page up",
    End = scancode(77) => "end",
    PageDown = scancode(78) => "page down",
    Right = scancode(79) => "right",
    Left = scancode(80) => "left",
    Down = scancode(81) => "down",
    Up = scancode(82) => "up",
    NumLock = scancode(83) => "num lock",
    KpDivide = scancode(84) => "kp /",
    KpMultiply = scancode(85) => "kp *",
    KpMinus = scancode(86) => "kp -",
    KpPlus = scancode(87) => "kp +",
    KpEnter = scancode(88) => "kp return",
    Kp1 = scancode(89) => "kp 1",
    Kp2 = scancode(90) => "kp 2",
    Kp3 = scancode(91) => "kp 3",
    Kp4 = scancode(92) => "kp 4",
    Kp5 = scancode(93) => "kp 5",
    Kp6 = scancode(94) => "kp 6",
    Kp7 = scancode(95) => "kp 7",
    Kp8 = scancode(96) => "kp 8",
    Kp9 = scancode(97) => "kp 9",
    Kp0 = scancode(98) => "kp 0",
    KpPeriod = scancode(99) => "kp .",
    KpEquals = scancode(103) => "kp =",
    F13 = scancode(104) => "f13",
    F14 = scancode(105) => "f14",
    F15 = scancode(106) => "f15",
    Clear = scancode(156) => "clear",
    LeftControl = scancode(224) => "left control",
    LeftShift = scancode(225) => "left shift",
    LeftAlt = scancode(226) => "left alt",
    LeftMeta = scancode(227) => "left meta",
    RightControl = scancode(228) => "right control",
    RightShift = scancode(229) => "right shift",
    RightAlt = scancode(230) => "right alt",
    RightMeta = scancode(231) => "right meta",
}

impl KeyboardKey {
    /// Unknown codes map to `KeyboardKey::None`.
    pub fn from_code(code: i32) -> Self {
        Self::ALL
            .iter()
            .copied()
            .find(|key| key.code() == code)
            .unwrap_or(KeyboardKey::None)
    }

    pub fn from_name(name: &str) -> Self {
        Self::ALL
            .iter()
            .copied()
            .find(|key| key.name() == name)
            .unwrap_or(KeyboardKey::None)
    }

    /// Direction encoded as an eighth of a turn counter-clockwise from east.
    pub fn direction8(self) -> Option<i32> {
        match self {
            KeyboardKey::Right => Some(0),
            KeyboardKey::Up => Some(2),
            KeyboardKey::Left => Some(4),
            KeyboardKey::Down => Some(6),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyModifiers {
    pub shift: bool,
    pub control: bool,
    pub alt: bool,
    pub caps_lock: bool,
    pub num_lock: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    None,
    Left,
    Middle,
    Right,
    X1,
    X2,
}

impl MouseButton {
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => MouseButton::Left,
            2 => MouseButton::Middle,
            3 => MouseButton::Right,
            4 => MouseButton::X1,
            5 => MouseButton::X2,
            _ => MouseButton::None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            MouseButton::None => 0,
            MouseButton::Left => 1,
            MouseButton::Middle => 2,
            MouseButton::Right => 3,
            MouseButton::X1 => 4,
            MouseButton::X2 => 5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MouseButton::None => "",
            MouseButton::Left => "left",
            MouseButton::Middle => "middle",
            MouseButton::Right => "right",
            MouseButton::X1 => "x1",
            MouseButton::X2 => "x2",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum JoypadButton {
    Invalid,
    A,
    B,
    X,
    Y,
    Back,
    Guide,
    Start,
    LeftStick,
    RightStick,
    LeftShoulder,
    RightShoulder,
    DpadUp,
    DpadDown,
    DpadLeft,
    DpadRight,
}

impl JoypadButton {
    const ALL: [JoypadButton; 15] = [
        JoypadButton::A,
        JoypadButton::B,
        JoypadButton::X,
        JoypadButton::Y,
        JoypadButton::Back,
        JoypadButton::Guide,
        JoypadButton::Start,
        JoypadButton::LeftStick,
        JoypadButton::RightStick,
        JoypadButton::LeftShoulder,
        JoypadButton::RightShoulder,
        JoypadButton::DpadUp,
        JoypadButton::DpadDown,
        JoypadButton::DpadLeft,
        JoypadButton::DpadRight,
    ];

    pub fn from_code(code: u8) -> Self {
        Self::ALL
            .get(usize::from(code))
            .copied()
            .unwrap_or(JoypadButton::Invalid)
    }

    pub fn code(self) -> Option<u8> {
        let index = Self::ALL.iter().position(|button| *button == self)?;
        u8::try_from(index).ok()
    }

    pub fn name(self) -> &'static str {
        match self {
            JoypadButton::Invalid => "",
            JoypadButton::A => "a",
            JoypadButton::B => "b",
            JoypadButton::X => "x",
            JoypadButton::Y => "y",
            JoypadButton::Back => "back",
            JoypadButton::Guide => "guide",
            JoypadButton::Start => "start",
            JoypadButton::LeftStick => "left_stick",
            JoypadButton::RightStick => "right_stick",
            JoypadButton::LeftShoulder => "left_shoulder",
            JoypadButton::RightShoulder => "right_shoulder",
            JoypadButton::DpadUp => "dpad_up",
            JoypadButton::DpadDown => "dpad_down",
            JoypadButton::DpadLeft => "dpad_left",
            JoypadButton::DpadRight => "dpad_right",
        }
    }

    pub fn from_name(name: &str) -> Self {
        Self::ALL
            .iter()
            .copied()
            .find(|button| button.name() == name)
            .unwrap_or(JoypadButton::Invalid)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum JoypadAxis {
    Invalid,
    LeftX,
    LeftY,
    RightX,
    RightY,
    TriggerLeft,
    TriggerRight,
}

pub const JOYPAD_AXIS_COUNT: usize = 6;

impl JoypadAxis {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => JoypadAxis::LeftX,
            1 => JoypadAxis::LeftY,
            2 => JoypadAxis::RightX,
            3 => JoypadAxis::RightY,
            4 => JoypadAxis::TriggerLeft,
            5 => JoypadAxis::TriggerRight,
            _ => JoypadAxis::Invalid,
        }
    }

    pub fn index(self) -> Option<usize> {
        match self {
            JoypadAxis::Invalid => None,
            JoypadAxis::LeftX => Some(0),
            JoypadAxis::LeftY => Some(1),
            JoypadAxis::RightX => Some(2),
            JoypadAxis::RightY => Some(3),
            JoypadAxis::TriggerLeft => Some(4),
            JoypadAxis::TriggerRight => Some(5),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            JoypadAxis::Invalid => "",
            JoypadAxis::LeftX => "left_x",
            JoypadAxis::LeftY => "left_y",
            JoypadAxis::RightX => "right_x",
            JoypadAxis::RightY => "right_y",
            JoypadAxis::TriggerLeft => "trigger_left",
            JoypadAxis::TriggerRight => "trigger_right",
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, JoypadAxis::LeftX | JoypadAxis::RightX)
    }
}
