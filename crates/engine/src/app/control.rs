use tracing::info;

use super::collaborators::ActiveGame;

/// Game change requested during a tick, applied at the end of the next step.
pub enum GameTransition {
    Start(Box<dyn ActiveGame>),
    Stop,
    /// Stop the game and restart the scripting layer.
    Reset,
}

impl std::fmt::Debug for GameTransition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameTransition::Start(_) => f.write_str("Start(..)"),
            GameTransition::Stop => f.write_str("Stop"),
            GameTransition::Reset => f.write_str("Reset"),
        }
    }
}

/// Loop-wide flags that collaborators may flip while handling a tick.
#[derive(Debug, Default)]
pub struct LoopControl {
    exiting: bool,
    suspended: bool,
    turbo: bool,
    pending_transition: Option<GameTransition>,
}

impl LoopControl {
    pub fn new(turbo: bool) -> Self {
        Self {
            turbo,
            ..Self::default()
        }
    }

    /// Terminal: once set the loop finishes the current tick and stops.
    pub fn request_exit(&mut self) {
        if !self.exiting {
            info!("exit_requested");
        }
        self.exiting = true;
    }

    pub fn is_exiting(&self) -> bool {
        self.exiting
    }

    pub fn set_suspended(&mut self, suspended: bool) {
        if suspended != self.suspended {
            self.suspended = suspended;
            if suspended {
                info!("simulation_suspended");
            } else {
                info!("simulation_resumed");
            }
        }
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub fn set_turbo(&mut self, turbo: bool) {
        self.turbo = turbo;
    }

    pub fn is_turbo(&self) -> bool {
        self.turbo
    }

    pub fn start_game(&mut self, game: Box<dyn ActiveGame>) {
        self.pending_transition = Some(GameTransition::Start(game));
    }

    pub fn stop_game(&mut self) {
        self.pending_transition = Some(GameTransition::Stop);
    }

    pub fn request_reset(&mut self) {
        self.pending_transition = Some(GameTransition::Reset);
    }

    pub fn has_pending_transition(&self) -> bool {
        self.pending_transition.is_some()
    }

    pub(crate) fn take_transition(&mut self) -> Option<GameTransition> {
        self.pending_transition.take()
    }
}
