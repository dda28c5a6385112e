mod command_queue;
mod console;
pub(crate) mod console_commands;

pub use command_queue::{CommandQueue, CommandSender};
pub use console::{ConsoleReader, ConsoleShutdown};
pub(crate) use console_commands::{ConsoleCommandRegistry, ScriptCommand};
