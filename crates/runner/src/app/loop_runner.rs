use std::process::ExitCode;

use engine::run_quest;
use tracing::{error, info};

use super::bootstrap::AppWiring;

pub(crate) fn run(app: AppWiring) -> ExitCode {
    if let Err(err) = run_quest(app.options, app.script) {
        error!(error = %err, "startup_failed");
        return ExitCode::FAILURE;
    }

    info!("=== Quest Runner Exit ===");
    ExitCode::SUCCESS
}
