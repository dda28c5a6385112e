mod collaborators;
mod commands;
mod control;
mod dispatch;
mod handlers;
mod loop_runner;
mod main_loop;
mod metrics;
mod script;
mod timing;
mod tools;

pub use collaborators::{
    ActiveGame, Audio, RenderError, Renderer, ScriptError, ScriptHost, SilentAudio, Size, Surface,
};
pub use commands::{CommandBindings, ControlEvent, GameCommand};
pub use control::{GameTransition, LoopControl};
pub use dispatch::{dispatch, DispatchContext, DispatchStage, Propagation, DISPATCH_CHAIN};
pub use handlers::{Handler, HandlerContext, HandlerId, HandlerStack};
pub use loop_runner::{
    resolve_debug_lag_ms, run_quest, run_quest_with_metrics, AppError, LaunchOptions, LoopConfig,
    TimestepMode, DEBUG_LAG_ENV_VAR,
};
pub use main_loop::{LoopParts, MainLoop};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle};
pub use script::{
    BuiltinScriptHost, GameFactory, RefRegistry, RefSlot, RefTable, ScopedRef, TextMenu,
};
pub use timing::{
    DynamicTimestep, FixedTimestep, FrameStart, MAX_STEPS_PER_FRAME, STALL_THRESHOLD_NS,
};
pub use tools::{CommandQueue, CommandSender, ConsoleReader, ConsoleShutdown};
