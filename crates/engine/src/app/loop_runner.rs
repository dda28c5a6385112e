use std::env;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event_loop::EventLoop;
use winit::window::{BadIcon, WindowBuilder};

use crate::clock::SystemClock;
use crate::input::InputConfig;
use crate::platform::{load_window_icon, PixelsRenderer, WinitEventSource};
use crate::quest::{resolve_quest_dir, QuestError, QuestProperties, StartupError};

use super::collaborators::{Renderer, ScriptHost, SilentAudio, Size};
use super::main_loop::{LoopParts, MainLoop};
use super::metrics::MetricsHandle;
use super::tools::ConsoleReader;

pub const DEBUG_LAG_ENV_VAR: &str = "QUEST_RUNNER_DEBUG_LAG_MS";

/// Initial window scale relative to the quest size.
const WINDOW_ZOOM: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestepMode {
    /// Fixed 10 ms steps with catch-up.
    Fixed,
    /// One smoothed step per displayed frame.
    Dynamic,
}

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub timestep_mode: TimestepMode,
    /// Extra sleep per fixed frame, for reproducing slow machines.
    pub debug_lag_ms: u64,
    pub turbo: bool,
    pub suspend_unfocused: bool,
    pub input: InputConfig,
    pub metrics_log_interval: Duration,
    pub console_shutdown_grace: Duration,
    /// Passed to the scripting layer on every (re)initialization.
    pub script_args: Vec<String>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            timestep_mode: TimestepMode::Fixed,
            debug_lag_ms: 0,
            turbo: false,
            suspend_unfocused: true,
            input: InputConfig::default(),
            metrics_log_interval: Duration::from_secs(1),
            console_shutdown_grace: Duration::from_millis(100),
            script_args: Vec::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Quest(#[from] QuestError),
    #[error("failed to build the window icon: {0}")]
    BuiltinIcon(#[source] BadIcon),
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("failed to start console thread: {0}")]
    ConsoleThread(#[source] io::Error),
}

/// How the process wants a quest launched.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub quest_path: Option<PathBuf>,
    pub fullscreen: bool,
    pub cursor_visible: bool,
    pub console_enabled: bool,
    pub loop_config: LoopConfig,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            quest_path: None,
            fullscreen: false,
            cursor_visible: true,
            console_enabled: true,
            loop_config: LoopConfig::default(),
        }
    }
}

pub fn run_quest(options: LaunchOptions, script: Box<dyn ScriptHost>) -> Result<(), AppError> {
    run_quest_with_metrics(options, script, MetricsHandle::default())
}

/// Loads and checks the quest, opens the window and runs the main loop until
/// it exits.
pub fn run_quest_with_metrics(
    options: LaunchOptions,
    script: Box<dyn ScriptHost>,
    metrics_handle: MetricsHandle,
) -> Result<(), AppError> {
    let quest_dir = resolve_quest_dir(options.quest_path.as_deref())?;
    let properties = QuestProperties::load(&quest_dir)?;
    let format_version = properties.check_compatibility()?;
    let quest_size = properties.quest_size();
    info!(
        quest_dir = %quest_dir.display(),
        format_version = %format_version,
        title = properties.title.as_str(),
        quest_width = quest_size.width,
        quest_height = quest_size.height,
        "quest_loaded"
    );

    let mut config = options.loop_config;
    if properties.dynamic_timestep {
        config.timestep_mode = TimestepMode::Dynamic;
    }
    config.debug_lag_ms = resolve_debug_lag_ms(config.debug_lag_ms);

    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let icon = load_window_icon(&quest_dir).map_err(AppError::BuiltinIcon)?;
    let mut builder = WindowBuilder::new()
        .with_visible(false)
        .with_window_icon(Some(icon))
        .with_inner_size(LogicalSize::new(
            f64::from(quest_size.width.saturating_mul(WINDOW_ZOOM)),
            f64::from(quest_size.height.saturating_mul(WINDOW_ZOOM)),
        ));
    if let Some(title) = properties.window_title() {
        builder = builder.with_title(title);
    }
    let window = Arc::new(builder.build(&event_loop).map_err(AppError::CreateWindow)?);
    let inner = window.inner_size();

    let mut renderer =
        PixelsRenderer::new(Arc::clone(&window), quest_size).map_err(AppError::CreateRenderer)?;
    renderer.set_fullscreen(options.fullscreen);
    renderer.set_cursor_visible(options.cursor_visible);
    let source = WinitEventSource::new(event_loop, Size::new(inner.width, inner.height), quest_size);

    info!(
        mode = ?config.timestep_mode,
        debug_lag_ms = config.debug_lag_ms,
        turbo = config.turbo,
        suspend_unfocused = config.suspend_unfocused,
        joypad_deadzone = config.input.joypad_deadzone,
        console_enabled = options.console_enabled,
        "loop_config"
    );

    let parts = LoopParts {
        clock: SystemClock::default(),
        source: Box::new(source),
        renderer: Box::new(renderer),
        audio: Box::new(SilentAudio),
        script,
    };
    let mut main_loop = MainLoop::new(config, parts).with_metrics(metrics_handle);

    if options.console_enabled {
        let stdin = BufReader::new(io::stdin());
        let console = ConsoleReader::spawn(stdin, main_loop.command_sender())
            .map_err(AppError::ConsoleThread)?;
        main_loop.attach_console(console);
    }

    main_loop.run();
    Ok(())
}

/// Debug lag from the environment, falling back to `config_lag_ms`.
pub fn resolve_debug_lag_ms(config_lag_ms: u64) -> u64 {
    parse_debug_lag(env::var(DEBUG_LAG_ENV_VAR), config_lag_ms)
}

fn parse_debug_lag(value: Result<String, env::VarError>, config_lag_ms: u64) -> u64 {
    match value {
        Ok(value) => match value.trim().parse::<u64>() {
            Ok(ms) => ms,
            Err(_) => {
                warn!(
                    env_var = DEBUG_LAG_ENV_VAR,
                    value = value.as_str(),
                    "invalid debug lag env var value; falling back to config"
                );
                config_lag_ms
            }
        },
        Err(env::VarError::NotPresent) => config_lag_ms,
        Err(err) => {
            warn!(
                env_var = DEBUG_LAG_ENV_VAR,
                error = %err,
                "unable to read debug lag env var; falling back to config"
            );
            config_lag_ms
        }
    }
}
