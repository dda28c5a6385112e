use std::collections::BTreeSet;

use engine::input::JoypadId;
use engine::{ActiveGame, ControlEvent, GameCommand, InputEvent, Size, Surface};
use tracing::{debug, info};

/// Hero walking speed in pixels per second.
const HERO_SPEED_PX_PER_S: f64 = 88.0;
const HERO_SIZE_PX: u32 = 8;
const GROUND_COLOR: [u8; 4] = [40, 92, 56, 255];
const HERO_COLOR: [u8; 4] = [232, 208, 96, 255];
const PAUSED_COLOR: [u8; 4] = [16, 16, 24, 255];

/// Minimal game started from the console: a square hero walking on a field
/// with the direction commands. `pause` freezes it.
#[derive(Debug, Default)]
pub(crate) struct SandboxGame {
    started: bool,
    paused: bool,
    /// Hero center, or `None` until the first draw places it.
    position: Option<(f64, f64)>,
    held: BTreeSet<GameCommand>,
    primary_joypad: Option<JoypadId>,
}

impl SandboxGame {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn velocity(&self) -> (f64, f64) {
        let axis = |positive: GameCommand, negative: GameCommand| {
            f64::from(
                i8::from(self.held.contains(&positive)) - i8::from(self.held.contains(&negative)),
            )
        };
        (
            axis(GameCommand::Right, GameCommand::Left),
            axis(GameCommand::Down, GameCommand::Up),
        )
    }
}

impl ActiveGame for SandboxGame {
    fn start(&mut self) {
        self.started = true;
        info!("sandbox_started");
    }

    fn stop(&mut self) {
        self.started = false;
        self.held.clear();
        info!("sandbox_stopped");
    }

    fn update(&mut self, timestep_ns: u64) {
        if !self.started || self.paused {
            return;
        }
        let (dx, dy) = self.velocity();
        let Some((x, y)) = self.position.as_mut() else {
            return;
        };
        let seconds = timestep_ns as f64 / 1_000_000_000.0;
        *x += dx * HERO_SPEED_PX_PER_S * seconds;
        *y += dy * HERO_SPEED_PX_PER_S * seconds;
    }

    fn notify_input(&mut self, _event: &InputEvent) -> bool {
        false
    }

    fn notify_command(&mut self, event: &ControlEvent) -> bool {
        let command = event.command();
        if event.is_pressed() {
            if command == GameCommand::Pause {
                self.paused = !self.paused;
                info!(paused = self.paused, "sandbox_pause_toggled");
            }
            self.held.insert(command);
        } else {
            self.held.remove(&command);
        }
        true
    }

    fn draw(&mut self, surface: &mut Surface) {
        let size = surface.size();
        let (x, y) = *self
            .position
            .get_or_insert((f64::from(size.width) / 2.0, f64::from(size.height) / 2.0));
        let half = f64::from(HERO_SIZE_PX) / 2.0;
        let x = x.clamp(half, f64::from(size.width) - half);
        let y = y.clamp(half, f64::from(size.height) - half);
        self.position = Some((x, y));

        let background = if self.paused { PAUSED_COLOR } else { GROUND_COLOR };
        surface.fill_rect(0, 0, size.width, size.height, background);
        surface.fill_rect(
            (x - half) as i32,
            (y - half) as i32,
            HERO_SIZE_PX,
            HERO_SIZE_PX,
            HERO_COLOR,
        );
    }

    fn notify_window_size_changed(&mut self, size: Size) {
        debug!(width = size.width, height = size.height, "sandbox_window_resized");
    }

    fn primary_joypad(&self) -> Option<JoypadId> {
        self.primary_joypad
    }

    fn set_primary_joypad(&mut self, joypad: Option<JoypadId>) {
        self.primary_joypad = joypad;
    }
}
