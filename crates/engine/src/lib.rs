pub mod app;
pub mod clock;
pub mod input;
pub mod platform;
pub mod quest;

pub use app::{
    run_quest, run_quest_with_metrics, ActiveGame, AppError, Audio, BuiltinScriptHost,
    CommandBindings, ControlEvent, GameCommand, GameFactory, LaunchOptions, LoopConfig,
    LoopControl, LoopMetricsSnapshot, LoopParts, MainLoop, MetricsHandle, RenderError, Renderer,
    ScriptError, ScriptHost, SilentAudio, Size, Surface, TimestepMode,
};
pub use clock::{Clock, ManualClock, SimulatedClock, SystemClock, FIXED_TIMESTEP_NS};
pub use input::{InputConfig, InputEvent, JoypadButton, KeyboardKey};
pub use quest::{QuestError, QuestProperties, StartupError, ENGINE_FORMAT_VERSION};
