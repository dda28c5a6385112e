use std::io::{self, BufRead};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::command_queue::CommandSender;

const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleShutdown {
    Joined,
    /// The reader was still blocked on input after the grace period and has
    /// been left to end with the process.
    Detached,
}

/// Background thread feeding console lines into the command queue.
#[derive(Debug)]
pub struct ConsoleReader {
    handle: Option<JoinHandle<()>>,
    stop: Arc<AtomicBool>,
}

impl ConsoleReader {
    pub fn spawn<R>(reader: R, sender: CommandSender) -> io::Result<Self>
    where
        R: BufRead + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("console".to_string())
            .spawn(move || read_lines(reader, &sender, &thread_stop))?;
        info!("console_reader_started");
        Ok(Self {
            handle: Some(handle),
            stop,
        })
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Asks the reader to stop and waits up to `grace` for it. A read that is
    /// still blocked after that is not waited for.
    pub fn shutdown(mut self, grace: Duration) -> ConsoleShutdown {
        self.stop.store(true, Ordering::Relaxed);
        let Some(handle) = self.handle.take() else {
            return ConsoleShutdown::Joined;
        };

        let deadline = Instant::now() + grace;
        while !handle.is_finished() && Instant::now() < deadline {
            thread::sleep(SHUTDOWN_POLL_INTERVAL);
        }

        if handle.is_finished() {
            if handle.join().is_err() {
                warn!("console_reader_panicked");
            }
            info!("console_reader_stopped");
            ConsoleShutdown::Joined
        } else {
            warn!(
                grace_ms = grace.as_millis() as u64,
                "console reader still blocked on input; detaching"
            );
            ConsoleShutdown::Detached
        }
    }
}

fn read_lines<R: BufRead>(mut reader: R, sender: &CommandSender, stop: &AtomicBool) {
    let mut line = String::new();
    while !stop.load(Ordering::Relaxed) {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => {
                debug!("console_input_closed");
                break;
            }
            Ok(_) => {
                let command = line.trim();
                if command.is_empty() {
                    continue;
                }
                match sender.push(command) {
                    Some(command_id) => debug!(command_id, "console_command_queued"),
                    None => {
                        debug!("console_queue_disabled");
                        break;
                    }
                }
            }
            Err(error) => {
                warn!(error = %error, "console_read_failed");
                break;
            }
        }
    }
}
