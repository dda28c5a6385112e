use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{info, warn};

use crate::app::ScriptError;

static COMMAND_QUEUE_POISON_WARNED: AtomicBool = AtomicBool::new(false);

fn warn_command_queue_poison_once(operation: &'static str) {
    if COMMAND_QUEUE_POISON_WARNED
        .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
        .is_ok()
    {
        warn!(operation, "command queue lock poisoned; recovered inner value");
    }
}

#[derive(Debug)]
struct PendingCommands {
    commands: Vec<String>,
    pushed: u64,
    enabled: bool,
}

fn lock_pending<'a>(
    pending: &'a Mutex<PendingCommands>,
    operation: &'static str,
) -> MutexGuard<'a, PendingCommands> {
    match pending.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn_command_queue_poison_once(operation);
            poisoned.into_inner()
        }
    }
}

/// Producer side of the command queue. Cheap to clone and safe to move to
/// other threads.
#[derive(Debug, Clone)]
pub struct CommandSender {
    pending: Arc<Mutex<PendingCommands>>,
}

impl CommandSender {
    /// Queues a command and returns its id, or `None` once the queue is
    /// disabled.
    pub fn push(&self, command: impl Into<String>) -> Option<u64> {
        let mut pending = lock_pending(&self.pending, "push");
        if !pending.enabled {
            return None;
        }
        let id = pending.pushed;
        pending.commands.push(command.into());
        pending.pushed += 1;
        Some(id)
    }
}

/// Consumer side, owned by the simulation thread.
#[derive(Debug)]
pub struct CommandQueue {
    pending: Arc<Mutex<PendingCommands>>,
    done: u64,
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandQueue {
    pub fn new() -> Self {
        Self {
            pending: Arc::new(Mutex::new(PendingCommands {
                commands: Vec::new(),
                pushed: 0,
                enabled: true,
            })),
            done: 0,
        }
    }

    pub fn sender(&self) -> CommandSender {
        CommandSender {
            pending: Arc::clone(&self.pending),
        }
    }

    /// Rejects every later push. Already queued commands stay queued.
    pub fn disable(&self) {
        lock_pending(&self.pending, "disable").enabled = false;
    }

    pub fn pushed_count(&self) -> u64 {
        lock_pending(&self.pending, "pushed_count").pushed
    }

    pub fn done_count(&self) -> u64 {
        self.done
    }

    /// Takes the whole pending batch. The lock is held only for the swap.
    fn take_pending(&self) -> Vec<String> {
        std::mem::take(&mut lock_pending(&self.pending, "drain").commands)
    }

    /// Runs every command queued since the last call, in submission order.
    /// Failures are logged and do not stop the batch.
    pub fn execute_pending<F>(&mut self, mut execute: F) -> usize
    where
        F: FnMut(&str) -> Result<(), ScriptError>,
    {
        let batch = self.take_pending();
        let count = batch.len();
        for command in batch {
            let command_id = self.done;
            info!(command_id, command = %command, "console_command_begin");
            match execute(&command) {
                Ok(()) => info!(command_id, "console_command_succeeded"),
                Err(error) => warn!(command_id, error = %error, "console_command_failed"),
            }
            info!(command_id, "console_command_end");
            self.done += 1;
        }
        count
    }
}
