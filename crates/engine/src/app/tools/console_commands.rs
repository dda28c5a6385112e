use std::collections::HashMap;

use thiserror::Error;
use tracing::warn;

use crate::app::ScriptError;
use crate::input::KeyboardKey;

/// A console line after parsing, ready to run against the script host.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ScriptCommand {
    Help,
    Print { text: String },
    Exit,
    Suspend,
    Resume,
    Turbo { enabled: bool },
    Reset,
    GameStart,
    GameStop,
    MenuStart {
        name: String,
        modal: bool,
        parent: Option<u64>,
    },
    MenuStop { id: u64 },
    MenuFront { id: u64 },
    MenuBack { id: u64 },
    MenuList,
    Bind { key: KeyboardKey, command: String },
    Unbind { key: KeyboardKey },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CommandParseError {
    reason: String,
    usage: String,
}

impl CommandParseError {
    fn new(reason: impl Into<String>, usage: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            usage: usage.into(),
        }
    }
}

impl From<CommandParseError> for ScriptError {
    fn from(error: CommandParseError) -> Self {
        ScriptError::InvalidArguments {
            reason: error.reason,
            usage: error.usage,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum RegistryError {
    #[error("command name cannot be empty")]
    EmptyName,
    #[error("duplicate command registration: {0}")]
    Duplicate(String),
}

type ParseFn = dyn Fn(&[String]) -> Result<ScriptCommand, CommandParseError> + Send + Sync;

pub(crate) struct CommandSpec {
    name: String,
    help: String,
    arg_schema: String,
    parse: Box<ParseFn>,
}

impl CommandSpec {
    pub(crate) fn parse(&self, args: &[String]) -> Result<ScriptCommand, CommandParseError> {
        (self.parse)(args)
    }
}

type BuiltinParse = fn(&[String]) -> Result<ScriptCommand, CommandParseError>;

const BUILTIN_COMMANDS: &[(&str, &str, &str, BuiltinParse)] = &[
    ("help", "List commands", "", parse_help_command),
    ("print", "Log text", "<text...>", parse_print_command),
    ("exit", "Quit the engine", "", parse_exit_command),
    ("suspend", "Pause the simulation", "", parse_suspend_command),
    ("resume", "Resume the simulation", "", parse_resume_command),
    ("turbo", "Step as fast as possible", "<on|off>", parse_turbo_command),
    ("reset", "Stop the game and restart scripts", "", parse_reset_command),
    ("game", "Start or stop the game", "<start|stop>", parse_game_command),
    (
        "menu",
        "Manage menus",
        "<start <name> [modal] [parent_id]|stop <id>|front <id>|back <id>|list>",
        parse_menu_command,
    ),
    ("bind", "Run a command when a key is pressed", "<key> <command...>", parse_bind_command),
    ("unbind", "Remove a key binding", "<key>", parse_unbind_command),
];

pub(crate) struct ConsoleCommandRegistry {
    specs: Vec<CommandSpec>,
    lookup_by_lower_name: HashMap<String, usize>,
}

impl ConsoleCommandRegistry {
    pub(crate) fn new() -> Self {
        Self {
            specs: Vec::new(),
            lookup_by_lower_name: HashMap::new(),
        }
    }

    pub(crate) fn with_builtins() -> Self {
        let mut registry = Self::new();
        for (name, help, arg_schema, parse) in BUILTIN_COMMANDS {
            if let Err(error) = registry.register(*name, *help, *arg_schema, *parse) {
                warn!(error = %error, "builtin_command_registration_failed");
            }
        }
        registry
    }

    pub(crate) fn register<F>(
        &mut self,
        name: impl Into<String>,
        help: impl Into<String>,
        arg_schema: impl Into<String>,
        parse: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn(&[String]) -> Result<ScriptCommand, CommandParseError> + Send + Sync + 'static,
    {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }
        let lower = name.to_ascii_lowercase();
        if self.lookup_by_lower_name.contains_key(&lower) {
            return Err(RegistryError::Duplicate(name));
        }

        self.specs.push(CommandSpec {
            name,
            help: help.into(),
            arg_schema: arg_schema.into(),
            parse: Box::new(parse),
        });
        self.lookup_by_lower_name
            .insert(lower, self.specs.len() - 1);
        Ok(())
    }

    pub(crate) fn lookup(&self, input_name: &str) -> Option<&CommandSpec> {
        let lower = input_name.to_ascii_lowercase();
        let index = self.lookup_by_lower_name.get(&lower)?;
        self.specs.get(*index)
    }

    /// Help lines in registration order.
    pub(crate) fn help_lines(&self) -> Vec<String> {
        self.specs
            .iter()
            .map(|spec| {
                if spec.arg_schema.is_empty() {
                    format!("{} - {}", spec.name, spec.help)
                } else {
                    format!("{} {} - {}", spec.name, spec.arg_schema, spec.help)
                }
            })
            .collect()
    }

    /// Parses one line. Blank lines yield `Ok(None)`.
    pub(crate) fn parse_line(&self, line: &str) -> Result<Option<ScriptCommand>, ScriptError> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        let tokens = tokenize_line(trimmed).map_err(ScriptError::Tokenize)?;
        let Some((command_name, args)) = tokens.split_first() else {
            return Ok(None);
        };

        let spec = self
            .lookup(command_name)
            .ok_or_else(|| ScriptError::UnknownCommand(command_name.clone()))?;
        Ok(Some(spec.parse(args)?))
    }
}

pub(crate) fn tokenize_line(line: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut pending_token = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                pending_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if pending_token {
                    tokens.push(std::mem::take(&mut current));
                    pending_token = false;
                }
            }
            _ => {
                current.push(ch);
                pending_token = true;
            }
        }
    }

    if in_quotes {
        return Err("unterminated quoted string".to_string());
    }
    if pending_token {
        tokens.push(current);
    }

    Ok(tokens)
}

fn parse_help_command(args: &[String]) -> Result<ScriptCommand, CommandParseError> {
    require_no_args(args, "help")?;
    Ok(ScriptCommand::Help)
}

fn parse_print_command(args: &[String]) -> Result<ScriptCommand, CommandParseError> {
    if args.is_empty() {
        return Err(CommandParseError::new("missing text", "print <text...>"));
    }
    Ok(ScriptCommand::Print {
        text: args.join(" "),
    })
}

fn parse_exit_command(args: &[String]) -> Result<ScriptCommand, CommandParseError> {
    require_no_args(args, "exit")?;
    Ok(ScriptCommand::Exit)
}

fn parse_suspend_command(args: &[String]) -> Result<ScriptCommand, CommandParseError> {
    require_no_args(args, "suspend")?;
    Ok(ScriptCommand::Suspend)
}

fn parse_resume_command(args: &[String]) -> Result<ScriptCommand, CommandParseError> {
    require_no_args(args, "resume")?;
    Ok(ScriptCommand::Resume)
}

fn parse_turbo_command(args: &[String]) -> Result<ScriptCommand, CommandParseError> {
    const USAGE: &str = "turbo <on|off>";
    let [value] = args else {
        return Err(CommandParseError::new("expected exactly one argument <on|off>", USAGE));
    };
    let enabled = match value.to_ascii_lowercase().as_str() {
        "on" | "yes" | "true" => true,
        "off" | "no" | "false" => false,
        _ => {
            return Err(CommandParseError::new(
                format!("invalid turbo value '{value}' (expected on|off)"),
                USAGE,
            ));
        }
    };
    Ok(ScriptCommand::Turbo { enabled })
}

fn parse_reset_command(args: &[String]) -> Result<ScriptCommand, CommandParseError> {
    require_no_args(args, "reset")?;
    Ok(ScriptCommand::Reset)
}

fn parse_game_command(args: &[String]) -> Result<ScriptCommand, CommandParseError> {
    const USAGE: &str = "game <start|stop>";
    match args {
        [action] if action.eq_ignore_ascii_case("start") => Ok(ScriptCommand::GameStart),
        [action] if action.eq_ignore_ascii_case("stop") => Ok(ScriptCommand::GameStop),
        [action] => Err(CommandParseError::new(
            format!("unknown game action '{action}' (expected start|stop)"),
            USAGE,
        )),
        _ => Err(CommandParseError::new(
            "expected exactly one argument <start|stop>",
            USAGE,
        )),
    }
}

fn parse_menu_command(args: &[String]) -> Result<ScriptCommand, CommandParseError> {
    let Some((action, rest)) = args.split_first() else {
        return Err(CommandParseError::new(
            "missing menu action",
            "menu <start|stop|front|back|list>",
        ));
    };

    match action.to_ascii_lowercase().as_str() {
        "start" => parse_menu_start(rest),
        "stop" => Ok(ScriptCommand::MenuStop {
            id: parse_menu_id(rest, "menu stop <id>")?,
        }),
        "front" => Ok(ScriptCommand::MenuFront {
            id: parse_menu_id(rest, "menu front <id>")?,
        }),
        "back" => Ok(ScriptCommand::MenuBack {
            id: parse_menu_id(rest, "menu back <id>")?,
        }),
        "list" => {
            require_no_args(rest, "menu list")?;
            Ok(ScriptCommand::MenuList)
        }
        _ => Err(CommandParseError::new(
            format!("unknown menu action '{action}'"),
            "menu <start|stop|front|back|list>",
        )),
    }
}

fn parse_menu_start(args: &[String]) -> Result<ScriptCommand, CommandParseError> {
    const USAGE: &str = "menu start <name> [modal] [parent_id]";
    let Some((name, options)) = args.split_first() else {
        return Err(CommandParseError::new("missing menu name", USAGE));
    };

    let mut modal = false;
    let mut parent = None;
    for option in options {
        if option.eq_ignore_ascii_case("modal") {
            modal = true;
        } else if let Ok(id) = option.parse::<u64>() {
            parent = Some(id);
        } else {
            return Err(CommandParseError::new(
                format!("unexpected menu option '{option}'"),
                USAGE,
            ));
        }
    }

    Ok(ScriptCommand::MenuStart {
        name: name.clone(),
        modal,
        parent,
    })
}

fn parse_menu_id(args: &[String], usage: &str) -> Result<u64, CommandParseError> {
    let [raw] = args else {
        return Err(CommandParseError::new("expected exactly one argument <id>", usage));
    };
    raw.parse::<u64>().map_err(|_| {
        CommandParseError::new(format!("invalid menu id '{raw}' (expected u64)"), usage)
    })
}

fn parse_bind_command(args: &[String]) -> Result<ScriptCommand, CommandParseError> {
    const USAGE: &str = "bind <key> <command...>";
    if args.len() < 2 {
        return Err(CommandParseError::new("expected <key> <command...>", USAGE));
    }
    Ok(ScriptCommand::Bind {
        key: parse_key(&args[0], USAGE)?,
        command: args[1..].join(" "),
    })
}

fn parse_unbind_command(args: &[String]) -> Result<ScriptCommand, CommandParseError> {
    const USAGE: &str = "unbind <key>";
    let [key] = args else {
        return Err(CommandParseError::new("expected exactly one argument <key>", USAGE));
    };
    Ok(ScriptCommand::Unbind {
        key: parse_key(key, USAGE)?,
    })
}

fn parse_key(name: &str, usage: &str) -> Result<KeyboardKey, CommandParseError> {
    match KeyboardKey::from_name(name) {
        KeyboardKey::None => Err(CommandParseError::new(format!("unknown key '{name}'"), usage)),
        key => Ok(key),
    }
}

fn require_no_args(args: &[String], usage: &str) -> Result<(), CommandParseError> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(CommandParseError::new("unexpected extra arguments", usage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<Option<ScriptCommand>, ScriptError> {
        ConsoleCommandRegistry::with_builtins().parse_line(line)
    }

    #[test]
    fn help_lists_commands_in_registration_order() {
        let lines = ConsoleCommandRegistry::with_builtins().help_lines();

        assert_eq!(lines[0], "help - List commands");
        assert_eq!(lines[1], "print <text...> - Log text");
        assert_eq!(lines[2], "exit - Quit the engine");
        assert_eq!(lines.len(), BUILTIN_COMMANDS.len());
    }

    #[test]
    fn unknown_command_reports_clear_error() {
        let error = parse("nope").expect_err("unknown command");
        assert_eq!(error.to_string(), "unknown command 'nope'. try: help");
    }

    #[test]
    fn bad_args_report_usage_hint() {
        let error = parse("menu stop foo").expect_err("bad id");
        assert_eq!(
            error.to_string(),
            "invalid menu id 'foo' (expected u64). usage: menu stop <id>"
        );
    }

    #[test]
    fn lookup_ignores_case() {
        assert_eq!(parse("EXIT").expect("parse"), Some(ScriptCommand::Exit));
    }

    #[test]
    fn blank_lines_parse_to_nothing() {
        assert_eq!(parse("   ").expect("parse"), None);
        assert_eq!(parse("\t\n").expect("parse"), None);
    }

    #[test]
    fn menu_start_accepts_modal_and_parent() {
        assert_eq!(
            parse("menu start \"pause screen\" modal 3").expect("parse"),
            Some(ScriptCommand::MenuStart {
                name: "pause screen".to_string(),
                modal: true,
                parent: Some(3),
            })
        );
        assert!(parse("menu start title sideways").is_err());
    }

    #[test]
    fn bind_keeps_the_rest_of_the_line() {
        assert_eq!(
            parse("bind \"right shift\" turbo on").expect("parse"),
            Some(ScriptCommand::Bind {
                key: KeyboardKey::RightShift,
                command: "turbo on".to_string(),
            })
        );
        assert!(parse("bind nokey exit").is_err());
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = ConsoleCommandRegistry::with_builtins();
        let result = registry.register("Help", "again", "", parse_help_command);
        assert_eq!(result, Err(RegistryError::Duplicate("Help".to_string())));
        assert_eq!(
            registry.register(" ", "blank", "", parse_help_command),
            Err(RegistryError::EmptyName)
        );
    }

    #[test]
    fn tokenizer_handles_quotes_and_errors() {
        assert_eq!(
            tokenize_line("print \"two words\" 1 2").expect("tokens"),
            vec!["print", "two words", "1", "2"]
        );
        assert_eq!(tokenize_line("print \"\"").expect("tokens"), vec!["print", ""]);
        assert!(tokenize_line("print \"oops").is_err());
    }
}
