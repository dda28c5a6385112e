use tracing::{debug, info, warn};

use crate::clock::{Clock, SimulatedClock, FIXED_TIMESTEP_NS};
use crate::input::{EventSource, InputEvent, InputNormalizer};

use super::collaborators::{ActiveGame, Audio, Renderer, ScriptHost, Surface};
use super::commands::CommandBindings;
use super::control::{GameTransition, LoopControl};
use super::dispatch::{dispatch, DispatchContext};
use super::loop_runner::{LoopConfig, TimestepMode};
use super::metrics::{MetricsAccumulator, MetricsHandle};
use super::timing::{DynamicTimestep, FixedTimestep};
use super::tools::{CommandQueue, CommandSender, ConsoleReader, ConsoleShutdown};

/// The collaborators a loop drives. The loop owns them until it shuts down.
pub struct LoopParts<C: Clock> {
    pub clock: C,
    pub source: Box<dyn EventSource>,
    pub renderer: Box<dyn Renderer>,
    pub audio: Box<dyn Audio>,
    pub script: Box<dyn ScriptHost>,
}

pub struct MainLoop<C: Clock> {
    config: LoopConfig,
    clock: C,
    source: Box<dyn EventSource>,
    renderer: Box<dyn Renderer>,
    audio: Box<dyn Audio>,
    script: Box<dyn ScriptHost>,
    game: Option<Box<dyn ActiveGame>>,
    normalizer: InputNormalizer,
    bindings: CommandBindings,
    control: LoopControl,
    simulated: SimulatedClock,
    root_surface: Surface,
    commands: CommandQueue,
    console: Option<ConsoleReader>,
    metrics: MetricsAccumulator,
    metrics_handle: MetricsHandle,
}

impl<C: Clock> MainLoop<C> {
    /// Brings up input, then the scripting layer, then shows the window.
    pub fn new(config: LoopConfig, parts: LoopParts<C>) -> Self {
        let LoopParts {
            clock,
            mut source,
            mut renderer,
            audio,
            mut script,
        } = parts;

        let mut normalizer = InputNormalizer::new(config.input.clone());
        normalizer.initialize(source.as_mut());

        let mut control = LoopControl::new(config.turbo);
        let root_surface = Surface::new(renderer.quest_size());
        script.initialize(&config.script_args, &mut control);
        renderer.show_window();

        let metrics_interval_ns =
            u64::try_from(config.metrics_log_interval.as_nanos()).unwrap_or(u64::MAX);
        let metrics = MetricsAccumulator::new(metrics_interval_ns, clock.now_ns());

        Self {
            config,
            clock,
            source,
            renderer,
            audio,
            script,
            game: None,
            normalizer,
            bindings: CommandBindings::default(),
            control,
            simulated: SimulatedClock::default(),
            root_surface,
            commands: CommandQueue::new(),
            console: None,
            metrics,
            metrics_handle: MetricsHandle::default(),
        }
    }

    pub fn with_metrics(mut self, handle: MetricsHandle) -> Self {
        self.metrics_handle = handle;
        self
    }

    /// Producer handle for commands coming from other threads.
    pub fn command_sender(&self) -> CommandSender {
        self.commands.sender()
    }

    pub fn attach_console(&mut self, console: ConsoleReader) {
        self.console = Some(console);
    }

    /// Replaces the active game at the end of the next step.
    pub fn set_game(&mut self, game: Option<Box<dyn ActiveGame>>) {
        match game {
            Some(game) => self.control.start_game(game),
            None => self.control.stop_game(),
        }
    }

    pub fn control(&self) -> &LoopControl {
        &self.control
    }

    pub fn control_mut(&mut self) -> &mut LoopControl {
        &mut self.control
    }

    pub fn simulated_time(&self) -> SimulatedClock {
        self.simulated
    }

    pub fn has_game(&self) -> bool {
        self.game.is_some()
    }

    pub fn bindings_mut(&mut self) -> &mut CommandBindings {
        &mut self.bindings
    }

    /// Runs until something requests exit, then shuts everything down.
    pub fn run(&mut self) {
        info!(
            mode = ?self.config.timestep_mode,
            turbo = self.control.is_turbo(),
            debug_lag_ms = self.config.debug_lag_ms,
            "simulation_started"
        );
        match self.config.timestep_mode {
            TimestepMode::Fixed => self.fixed_run(),
            TimestepMode::Dynamic => self.dynamic_run(),
        }
        self.shutdown();
    }

    fn fixed_run(&mut self) {
        let mut timing = FixedTimestep::new(FIXED_TIMESTEP_NS, self.clock.now_ns());
        while !self.control.is_exiting() {
            self.fixed_frame(&mut timing);
        }
    }

    fn fixed_frame(&mut self, timing: &mut FixedTimestep) {
        let frame = timing.begin_frame(self.clock.now_ns());
        if frame.dropped_ns > 0 {
            debug!(dropped_ns = frame.dropped_ns, "simulation_stall_dropped");
        }
        self.metrics
            .record_frame(frame.frame_duration_ns, frame.dropped_ns);

        self.check_input();

        let mut steps = 0;
        if self.control.is_turbo() && !self.control.is_exiting() {
            self.step(timing.timestep_ns());
            timing.consume_step();
            steps += 1;
        }
        while timing.should_step(steps) && !self.control.is_exiting() && !self.control.is_suspended()
        {
            self.step(timing.timestep_ns());
            timing.consume_step();
            steps += 1;
        }

        if steps > 0 && !self.control.is_exiting() && !self.control.is_suspended() {
            self.draw();
        }

        let debug_lag_ns = self.config.debug_lag_ms.saturating_mul(1_000_000);
        if debug_lag_ns > 0 && !self.control.is_turbo() && !self.control.is_suspended() {
            self.clock.sleep_ns(debug_lag_ns);
        }

        if !self.control.is_turbo() {
            let remaining = timing.remaining_sleep_ns(self.clock.now_ns());
            if remaining > 0 {
                self.clock.sleep_ns(remaining);
            }
        }

        self.publish_metrics();
    }

    fn dynamic_run(&mut self) {
        let period_ns = self.renderer.display_period_ns();
        let mut timing = DynamicTimestep::new(period_ns, self.clock.now_ns());
        while !self.control.is_exiting() {
            self.dynamic_frame(&mut timing);
        }
    }

    fn dynamic_frame(&mut self, timing: &mut DynamicTimestep) {
        self.check_input();

        if !self.control.is_exiting() && !self.control.is_suspended() {
            let smoothed_ns = timing.advance(self.clock.now_ns());
            self.metrics.record_frame(smoothed_ns, 0);
            self.step(smoothed_ns);
            self.draw();
        } else {
            self.clock.sleep_ns(FIXED_TIMESTEP_NS);
        }

        self.publish_metrics();
    }

    /// Advances the simulation by one tick of `timestep_ns`.
    pub fn step(&mut self, timestep_ns: u64) {
        if let Some(game) = self.game.as_mut() {
            game.update(timestep_ns);
        }
        self.script.update(&mut self.control);
        self.simulated.update(timestep_ns);
        self.metrics.record_tick();

        if let Some(transition) = self.control.take_transition() {
            self.apply_transition(transition);
        }
    }

    fn apply_transition(&mut self, transition: GameTransition) {
        match transition {
            GameTransition::Start(mut game) => {
                self.stop_game();
                game.start();
                info!("game_started");
                self.game = Some(game);
            }
            GameTransition::Stop => self.stop_game(),
            GameTransition::Reset => {
                self.stop_game();
                self.script.exit();
                self.script
                    .initialize(&self.config.script_args, &mut self.control);
                self.audio.stop_playing();
                info!("scripts_reset");
            }
        }
    }

    fn stop_game(&mut self) {
        if let Some(mut game) = self.game.take() {
            game.stop();
            self.bindings.release_all();
            info!("game_stopped");
        }
    }

    fn draw(&mut self) {
        self.root_surface.clear();
        self.renderer.clear_screen_surface();
        if let Some(game) = self.game.as_mut() {
            game.draw(&mut self.root_surface);
        }
        self.script.draw(&mut self.root_surface);
        if let Err(error) = self.renderer.render(&self.root_surface) {
            warn!(error = %error, "renderer_draw_failed");
            self.control.request_exit();
        }
    }

    /// Runs queued console commands, then drains pending input events.
    fn check_input(&mut self) {
        let script = self.script.as_mut();
        let control = &mut self.control;
        self.commands
            .execute_pending(|command| script.execute(command, control));

        while let Some(event) = self.normalizer.poll(self.source.as_mut()) {
            self.notify_input(&event);
        }
    }

    /// Sends one event down the dispatch chain.
    pub fn notify_input(&mut self, event: &InputEvent) {
        let mut ctx = DispatchContext {
            control: &mut self.control,
            script: self.script.as_mut(),
            game: &mut self.game,
            renderer: self.renderer.as_mut(),
            audio: self.audio.as_mut(),
            joypads: self.normalizer.joypads(),
            bindings: &mut self.bindings,
            root_surface: &mut self.root_surface,
            suspend_unfocused: self.config.suspend_unfocused,
        };
        dispatch(event, &mut ctx);
    }

    fn publish_metrics(&mut self) {
        let snapshot = self.metrics.maybe_snapshot(
            self.clock.now_ns(),
            self.simulated.ticks_ms(),
            self.commands.done_count(),
        );
        if let Some(snapshot) = snapshot {
            self.metrics_handle.publish(snapshot);
            info!(
                fps = snapshot.fps,
                tps = snapshot.tps,
                frame_time_ms = snapshot.frame_time_ms,
                peak_steps_per_frame = snapshot.peak_steps_per_frame,
                time_dropped_ms = snapshot.time_dropped_ms,
                simulated_time_ms = snapshot.simulated_time_ms,
                commands_done = snapshot.commands_done,
                "loop_metrics"
            );
        }
    }

    fn shutdown(&mut self) {
        if let Some(console) = self.console.take() {
            if console.shutdown(self.config.console_shutdown_grace) == ConsoleShutdown::Detached {
                debug!("console_reader_left_running");
            }
        }
        self.commands.disable();

        self.stop_game();
        self.script.exit();
        self.audio.stop_playing();
        self.normalizer.shutdown();
        self.renderer.hide_window();
        info!(
            simulated_time_ms = self.simulated.ticks_ms(),
            commands_done = self.commands.done_count(),
            "shutdown"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::app::collaborators::ScriptError;
    use crate::app::commands::ControlEvent;
    use crate::app::dispatch::tests::{
        record, Log, RecordingAudio, RecordingGame, RecordingRenderer,
    };
    use crate::clock::ManualClock;
    use crate::input::{KeyModifiers, QueueEventSource, RawEvent};

    type UpdateHook = Box<dyn FnMut(u32, &mut LoopControl)>;

    /// Script host that requests exit after a number of updates and lets a
    /// test hook into each update.
    struct ScriptedHost {
        log: Log,
        updates: u32,
        exit_after: u32,
        on_update: UpdateHook,
        on_initialize: Option<Box<dyn FnMut(&mut LoopControl)>>,
    }

    impl ScriptedHost {
        fn new(log: &Log, exit_after: u32) -> Self {
            Self {
                log: Rc::clone(log),
                updates: 0,
                exit_after,
                on_update: Box::new(|_, _| {}),
                on_initialize: None,
            }
        }
    }

    impl ScriptHost for ScriptedHost {
        fn initialize(&mut self, _args: &[String], control: &mut LoopControl) {
            record(&self.log, "script:initialize");
            if let Some(hook) = self.on_initialize.as_mut() {
                hook(control);
            }
        }

        fn exit(&mut self) {
            record(&self.log, "script:exit");
        }

        fn update(&mut self, control: &mut LoopControl) {
            self.updates += 1;
            (self.on_update)(self.updates, control);
            if self.updates >= self.exit_after {
                control.request_exit();
            }
        }

        fn draw(&mut self, _surface: &mut Surface) {}

        fn notify_input(&mut self, _event: &InputEvent, _control: &mut LoopControl) -> bool {
            record(&self.log, "script:input");
            false
        }

        fn notify_command(&mut self, _event: &ControlEvent, _control: &mut LoopControl) -> bool {
            false
        }

        fn execute(&mut self, command: &str, control: &mut LoopControl) -> Result<(), ScriptError> {
            record(&self.log, format!("script:execute:{command}"));
            match command {
                "exit" => {
                    control.request_exit();
                    Ok(())
                }
                _ => Err(ScriptError::UnknownCommand(command.to_string())),
            }
        }
    }

    struct Harness {
        log: Log,
        clock: Rc<ManualClock>,
        config: LoopConfig,
        source: QueueEventSource,
        renderer: RecordingRenderer,
    }

    impl Harness {
        fn new() -> Self {
            let log: Log = Rc::default();
            Self {
                clock: Rc::new(ManualClock::new(1_000_000_000)),
                config: LoopConfig::default(),
                source: QueueEventSource::new(),
                renderer: RecordingRenderer::new(&log),
                log,
            }
        }

        fn build(self, script: ScriptedHost) -> (MainLoop<Rc<ManualClock>>, Log, Rc<ManualClock>) {
            let parts = LoopParts {
                clock: Rc::clone(&self.clock),
                source: Box::new(self.source),
                renderer: Box::new(self.renderer),
                audio: Box::new(RecordingAudio {
                    log: Rc::clone(&self.log),
                }),
                script: Box::new(script),
            };
            (MainLoop::new(self.config, parts), self.log, self.clock)
        }
    }

    fn count(log: &Log, entry: &str) -> usize {
        log.borrow().iter().filter(|line| line.as_str() == entry).count()
    }

    #[test]
    fn fixed_loop_steps_once_per_timestep() {
        let harness = Harness::new();
        let script = ScriptedHost::new(&harness.log, 3);
        let (mut main_loop, log, clock) = harness.build(script);

        main_loop.run();

        assert_eq!(main_loop.simulated_time().ticks_ns(), 3 * FIXED_TIMESTEP_NS);
        assert_eq!(count(&log, "renderer:render"), 3);
        // The first frame has no lag yet and only sleeps.
        assert_eq!(clock.slept_ns(), 4 * FIXED_TIMESTEP_NS);
    }

    #[test]
    fn turbo_steps_every_frame_without_sleeping() {
        let mut harness = Harness::new();
        harness.config.turbo = true;
        let script = ScriptedHost::new(&harness.log, 4);
        let (mut main_loop, log, clock) = harness.build(script);

        main_loop.run();

        assert_eq!(main_loop.simulated_time().ticks_ns(), 4 * FIXED_TIMESTEP_NS);
        assert_eq!(count(&log, "renderer:render"), 4);
        assert_eq!(clock.slept_ns(), 0);
    }

    #[test]
    fn turbo_steps_while_suspended_but_never_draws() {
        let mut harness = Harness::new();
        harness.config.turbo = true;
        let mut script = ScriptedHost::new(&harness.log, 2);
        script.on_initialize = Some(Box::new(|control| control.set_suspended(true)));
        let (mut main_loop, log, _clock) = harness.build(script);

        main_loop.run();

        assert_eq!(main_loop.simulated_time().ticks_ns(), 2 * FIXED_TIMESTEP_NS);
        assert_eq!(count(&log, "renderer:render"), 0);
    }

    #[test]
    fn turbo_stops_stepping_once_the_window_closes() {
        let mut harness = Harness::new();
        harness.config.turbo = true;
        harness.source = QueueEventSource::with_events([RawEvent::WindowClose]);
        let script = ScriptedHost::new(&harness.log, u32::MAX);
        let (mut main_loop, log, _clock) = harness.build(script);

        main_loop.run();

        assert_eq!(main_loop.simulated_time().ticks_ns(), 0);
        assert_eq!(count(&log, "renderer:render"), 0);
    }

    #[test]
    fn long_stall_is_dropped_instead_of_caught_up() {
        let harness = Harness::new();
        let stall_clock = Rc::clone(&harness.clock);
        let mut script = ScriptedHost::new(&harness.log, 3);
        script.on_update = Box::new(move |update, _| {
            if update == 1 {
                stall_clock.advance_ns(500_000_000);
            }
        });
        let (mut main_loop, log, _clock) = harness.build(script);

        main_loop.run();

        // Catching up would have run the remaining steps in one frame.
        assert_eq!(count(&log, "renderer:render"), 3);
    }

    #[test]
    fn dynamic_loop_steps_with_the_display_period() {
        let mut harness = Harness::new();
        harness.config.timestep_mode = TimestepMode::Dynamic;
        let script = ScriptedHost::new(&harness.log, 2);
        let (mut main_loop, log, _clock) = harness.build(script);

        main_loop.run();

        assert_eq!(count(&log, "renderer:render"), 2);
        // Second frame: buffer holds -period, spill is 1% of it.
        let period = 16_666_667_u64;
        let spill = (-(period as f64) * 0.01) as i64;
        let expected = period + (period as i64 + spill) as u64;
        assert_eq!(main_loop.simulated_time().ticks_ns(), expected);
    }

    #[test]
    fn console_commands_run_before_input_events() {
        let mut harness = Harness::new();
        harness.source = QueueEventSource::with_events([RawEvent::KeyDown {
            code: 32,
            modifiers: KeyModifiers::default(),
            repeat: false,
        }]);
        let script = ScriptedHost::new(&harness.log, u32::MAX);
        let (mut main_loop, log, _clock) = harness.build(script);
        main_loop.command_sender().push("exit");

        main_loop.run();

        let entries = log.borrow().clone();
        let execute = entries.iter().position(|line| line == "script:execute:exit");
        let input = entries.iter().position(|line| line == "script:input");
        assert!(execute < input, "{entries:?}");
        assert_eq!(main_loop.simulated_time().ticks_ns(), 0);
        assert_eq!(main_loop.command_sender().push("late"), None);
    }

    #[test]
    fn started_game_runs_from_the_next_step() {
        let harness = Harness::new();
        let game_log = Rc::clone(&harness.log);
        let mut script = ScriptedHost::new(&harness.log, 3);
        script.on_update = Box::new(move |update, control| {
            if update == 1 {
                control.start_game(Box::new(RecordingGame::new(&game_log)));
            }
        });
        let (mut main_loop, log, _clock) = harness.build(script);

        main_loop.run();

        let step = FIXED_TIMESTEP_NS.to_string();
        assert_eq!(count(&log, "game:start"), 1);
        assert_eq!(count(&log, &format!("game:update:{step}")), 2);
        assert_eq!(count(&log, "game:draw"), 3);
    }

    #[test]
    fn reset_restarts_the_scripting_layer() {
        let harness = Harness::new();
        let mut script = ScriptedHost::new(&harness.log, 2);
        script.on_update = Box::new(|update, control| {
            if update == 1 {
                control.request_reset();
            }
        });
        let (mut main_loop, log, _clock) = harness.build(script);

        main_loop.run();

        assert_eq!(count(&log, "script:initialize"), 2);
        assert_eq!(count(&log, "script:exit"), 2);
        assert_eq!(count(&log, "audio:stop_playing"), 2);
    }

    #[test]
    fn shutdown_runs_in_order() {
        let harness = Harness::new();
        let script = ScriptedHost::new(&harness.log, 1);
        let (mut main_loop, log, _clock) = harness.build(script);
        main_loop.set_game(Some(Box::new(RecordingGame::new(&log))));

        main_loop.run();

        let entries = log.borrow().clone();
        let tail: Vec<&str> = entries.iter().rev().take(4).rev().map(String::as_str).collect();
        assert_eq!(
            tail,
            vec!["game:stop", "script:exit", "audio:stop_playing", "renderer:hide"]
        );
        assert!(!main_loop.has_game());
    }

    #[test]
    fn render_failure_requests_exit() {
        let mut harness = Harness::new();
        harness.renderer.fail_render = true;
        let script = ScriptedHost::new(&harness.log, u32::MAX);
        let (mut main_loop, log, _clock) = harness.build(script);

        main_loop.run();

        assert_eq!(count(&log, "renderer:render"), 1);
        assert!(main_loop.control().is_exiting());
    }

    #[test]
    fn window_close_event_ends_the_loop() {
        let mut harness = Harness::new();
        harness.source = QueueEventSource::with_events([RawEvent::WindowClose]);
        let script = ScriptedHost::new(&harness.log, u32::MAX);
        let (mut main_loop, log, _clock) = harness.build(script);

        main_loop.run();

        assert!(main_loop.control().is_exiting());
        assert_eq!(count(&log, "renderer:show"), 1);
        assert_eq!(count(&log, "renderer:hide"), 1);
    }
}
