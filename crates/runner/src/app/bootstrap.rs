use std::collections::BTreeSet;
use std::path::PathBuf;

use clap::{ArgAction, Parser};
use engine::input::DEFAULT_JOYPAD_DEADZONE;
use engine::{
    ActiveGame, BuiltinScriptHost, InputConfig, JoypadButton, LaunchOptions, LoopConfig,
    ScriptHost,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::sandbox::SandboxGame;

/// Runs a quest with the builtin command console as its scripting layer.
#[derive(Debug, Parser)]
#[command(name = "quest_runner", version)]
pub(crate) struct Args {
    /// Quest directory holding quest.json (defaults to $QUEST_RUNNER_QUEST_PATH, ./data, then .)
    quest_path: Option<PathBuf>,

    /// Extra sleep in milliseconds added to every frame
    #[arg(long, value_name = "MS", default_value_t = 0)]
    lag: u64,

    /// Run the simulation as fast as possible
    #[arg(long, value_name = "yes|no", default_value = "no", value_parser = parse_yes_no, action = ArgAction::Set)]
    turbo: bool,

    /// Suspend the simulation while the window is unfocused
    #[arg(long, value_name = "yes|no", default_value = "yes", value_parser = parse_yes_no, action = ArgAction::Set)]
    suspend_unfocused: bool,

    /// Read commands from standard input
    #[arg(long, value_name = "yes|no", default_value = "yes", value_parser = parse_yes_no, action = ArgAction::Set)]
    lua_console: bool,

    /// Joypad buttons that quit when held together, e.g. back+start
    #[arg(long, value_name = "b1+b2+...", value_parser = parse_quit_combo)]
    quit_combo: Option<BTreeSet<JoypadButton>>,

    /// Axis magnitude below which a stick reads as centered
    #[arg(long, value_name = "N", default_value_t = DEFAULT_JOYPAD_DEADZONE, value_parser = clap::value_parser!(i32).range(0..=32767))]
    joypad_deadzone: i32,

    #[arg(long, value_name = "yes|no", default_value = "no", value_parser = parse_yes_no, action = ArgAction::Set)]
    fullscreen: bool,

    #[arg(long, value_name = "yes|no", default_value = "yes", value_parser = parse_yes_no, action = ArgAction::Set)]
    cursor_visible: bool,

    /// Commands run by the console host at startup and after every reset
    #[arg(last = true)]
    script_args: Vec<String>,
}

pub(crate) struct AppWiring {
    pub(crate) options: LaunchOptions,
    pub(crate) script: Box<dyn ScriptHost>,
}

pub(crate) fn build_app() -> Result<AppWiring, clap::Error> {
    let args = Args::try_parse()?;
    init_tracing();
    info!("=== Quest Runner Startup ===");
    Ok(wire(args))
}

fn wire(args: Args) -> AppWiring {
    let loop_config = LoopConfig {
        debug_lag_ms: args.lag,
        turbo: args.turbo,
        suspend_unfocused: args.suspend_unfocused,
        input: InputConfig {
            joypad_deadzone: args.joypad_deadzone,
            quit_combo: args.quit_combo.unwrap_or_default(),
            ..InputConfig::default()
        },
        script_args: args.script_args,
        ..LoopConfig::default()
    };
    let options = LaunchOptions {
        quest_path: args.quest_path,
        fullscreen: args.fullscreen,
        cursor_visible: args.cursor_visible,
        console_enabled: args.lua_console,
        loop_config,
    };
    let script = BuiltinScriptHost::new().with_game_factory(Box::new(
        || -> Box<dyn ActiveGame> { Box::new(SandboxGame::new()) },
    ));

    AppWiring {
        options,
        script: Box::new(script),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn parse_yes_no(raw: &str) -> Result<bool, String> {
    match raw {
        "yes" => Ok(true),
        "no" => Ok(false),
        other => Err(format!("expected 'yes' or 'no', got '{other}'")),
    }
}

fn parse_quit_combo(raw: &str) -> Result<BTreeSet<JoypadButton>, String> {
    raw.split('+')
        .map(str::trim)
        .map(|name| match JoypadButton::from_name(name) {
            JoypadButton::Invalid => Err(format!("unknown joypad button '{name}'")),
            button => Ok(button),
        })
        .collect()
}
