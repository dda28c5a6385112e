mod event;
mod joypad;
mod keys;
mod normalizer;
mod raw;
mod source;

pub use event::{
    DeviceChange, FingerEvent, InputEvent, KeyboardEvent, MouseButtonEvent, WindowEvent,
};
pub use joypad::{compute_axis_value, Joypad, JoypadInfo, JoypadRegistry, DEFAULT_JOYPAD_DEADZONE};
pub use keys::{
    unmapped_key_code, JoypadAxis, JoypadButton, KeyModifiers, KeyboardKey, MouseButton,
    JOYPAD_AXIS_COUNT, SCANCODE_MASK, UNMAPPED_KEY_FLAG,
};
pub use normalizer::{InputConfig, InputNormalizer};
pub use raw::{FingerPhase, JoypadDescriptor, JoypadId, RawEvent};
pub use source::{EventSource, QueueEventSource};
