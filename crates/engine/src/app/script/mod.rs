mod builtin;
mod scoped_ref;

pub use builtin::{BuiltinScriptHost, GameFactory, TextMenu};
pub use scoped_ref::{RefRegistry, RefSlot, RefTable, ScopedRef};
