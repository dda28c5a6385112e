use std::collections::HashMap;

use tracing::{info, warn};

use crate::app::collaborators::{ActiveGame, ScriptError, ScriptHost, Surface};
use crate::app::commands::ControlEvent;
use crate::app::control::LoopControl;
use crate::app::handlers::{Handler, HandlerContext, HandlerId, HandlerStack};
use crate::app::tools::{ConsoleCommandRegistry, ScriptCommand};
use crate::input::{InputEvent, JoypadInfo, KeyboardKey};

use super::scoped_ref::{RefTable, ScopedRef};

const MENU_ROW_HEIGHT: u32 = 12;
const MENU_ROWS: u64 = 8;
const MENU_PALETTE: [[u8; 4]; 4] = [
    [0x2e, 0x4a, 0x7a, 0xff],
    [0x7a, 0x2e, 0x4a, 0xff],
    [0x2e, 0x7a, 0x4a, 0xff],
    [0x7a, 0x6a, 0x2e, 0xff],
];

pub type GameFactory = Box<dyn Fn() -> Box<dyn ActiveGame>>;

/// A named band drawn over the game. Modal menus swallow input and commands
/// so nothing below them sees it.
#[derive(Debug, Clone)]
pub struct TextMenu {
    name: String,
    modal: bool,
    row: u32,
    color: [u8; 4],
}

impl TextMenu {
    fn new(name: String, modal: bool, id: HandlerId) -> Self {
        let row = (id.get() % MENU_ROWS) as u32;
        Self {
            name,
            modal,
            row,
            color: MENU_PALETTE[(id.get() % MENU_PALETTE.len() as u64) as usize],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_modal(&self) -> bool {
        self.modal
    }
}

impl Handler for TextMenu {
    fn on_started(&mut self) {
        info!(menu = %self.name, modal = self.modal, "menu_started");
    }

    fn on_finished(&mut self) {
        info!(menu = %self.name, "menu_finished");
    }

    fn on_draw(&mut self, surface: &mut Surface) {
        let width = surface.size().width;
        let y = (self.row * MENU_ROW_HEIGHT) as i32;
        surface.fill_rect(0, y, width, MENU_ROW_HEIGHT, self.color);
    }

    fn on_input(&mut self, _event: &InputEvent) -> bool {
        self.modal
    }

    fn on_command(&mut self, _event: &ControlEvent) -> bool {
        self.modal
    }
}

/// Scripting layer driven by console commands instead of a script runtime.
///
/// Startup arguments are run as commands when the host initializes, so
/// `quest_runner data -- "game start"` boots straight into the game.
pub struct BuiltinScriptHost {
    registry: ConsoleCommandRegistry,
    menus: HandlerStack<TextMenu>,
    bound_commands: RefTable<String>,
    key_bindings: HashMap<KeyboardKey, ScopedRef<RefTable<String>>>,
    game_factory: Option<GameFactory>,
    initialized: bool,
}

impl Default for BuiltinScriptHost {
    fn default() -> Self {
        Self::new()
    }
}

impl BuiltinScriptHost {
    pub fn new() -> Self {
        Self {
            registry: ConsoleCommandRegistry::with_builtins(),
            menus: HandlerStack::new(),
            bound_commands: RefTable::new(),
            key_bindings: HashMap::new(),
            game_factory: None,
            initialized: false,
        }
    }

    /// Sets what `game start` creates.
    pub fn with_game_factory(mut self, factory: GameFactory) -> Self {
        self.game_factory = Some(factory);
        self
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn menu_count(&self) -> usize {
        self.menus.len()
    }

    pub fn menu(&self, id: u64) -> Option<&TextMenu> {
        self.menus.get(HandlerId::from_raw(id))
    }

    pub fn bound_command(&self, key: KeyboardKey) -> Option<String> {
        self.key_bindings
            .get(&key)
            .and_then(|handle| handle.get())
            .map(|command| command.to_string())
    }

    fn run(&mut self, command: ScriptCommand, control: &mut LoopControl) -> Result<(), ScriptError> {
        match command {
            ScriptCommand::Help => {
                for line in self.registry.help_lines() {
                    info!(line = %line, "console_help");
                }
            }
            ScriptCommand::Print { text } => info!(text = %text, "console_print"),
            ScriptCommand::Exit => control.request_exit(),
            ScriptCommand::Suspend => control.set_suspended(true),
            ScriptCommand::Resume => control.set_suspended(false),
            ScriptCommand::Turbo { enabled } => {
                control.set_turbo(enabled);
                info!(enabled, "turbo_changed");
            }
            ScriptCommand::Reset => control.request_reset(),
            ScriptCommand::GameStart => {
                let factory = self.game_factory.as_ref().ok_or(ScriptError::NoGameFactory)?;
                control.start_game(factory());
            }
            ScriptCommand::GameStop => control.stop_game(),
            ScriptCommand::MenuStart {
                name,
                modal,
                parent,
            } => {
                let context = match parent {
                    Some(parent) => {
                        let parent_id = HandlerId::from_raw(parent);
                        if !self.menus.is_started(parent_id) {
                            return Err(ScriptError::UnknownMenu(parent));
                        }
                        HandlerContext::Child(parent_id)
                    }
                    None => HandlerContext::Root,
                };
                let id = self.menus.next_id();
                let started = self
                    .menus
                    .start(context, TextMenu::new(name, modal, id), true);
                info!(menu_id = started.get(), "menu_id_assigned");
            }
            ScriptCommand::MenuStop { id } => {
                if !self.menus.stop(HandlerId::from_raw(id)) {
                    return Err(ScriptError::UnknownMenu(id));
                }
            }
            ScriptCommand::MenuFront { id } => {
                if !self.menus.bring_to_front(HandlerId::from_raw(id)) {
                    return Err(ScriptError::UnknownMenu(id));
                }
            }
            ScriptCommand::MenuBack { id } => {
                if !self.menus.bring_to_back(HandlerId::from_raw(id)) {
                    return Err(ScriptError::UnknownMenu(id));
                }
            }
            ScriptCommand::MenuList => {
                for id in self.menus.ids() {
                    if let Some(menu) = self.menus.get(id) {
                        info!(menu_id = id.get(), menu = %menu.name, modal = menu.modal, "menu_listed");
                    }
                }
            }
            ScriptCommand::Bind { key, command } => {
                info!(key = key.name(), command = %command, "key_bound");
                let handle = self.bound_commands.create_ref(command);
                self.key_bindings.insert(key, handle);
            }
            ScriptCommand::Unbind { key } => {
                if self.key_bindings.remove(&key).is_none() {
                    warn!(key = key.name(), "unbind_of_unbound_key");
                }
            }
        }
        Ok(())
    }
}

impl ScriptHost for BuiltinScriptHost {
    fn initialize(&mut self, args: &[String], control: &mut LoopControl) {
        self.initialized = true;
        info!(args = args.len(), "script_host_initialized");
        for arg in args {
            if let Err(error) = self.execute(arg, control) {
                warn!(command = %arg, error = %error, "startup_command_failed");
            }
        }
    }

    fn exit(&mut self) {
        self.menus.stop_all(HandlerContext::Root);
        self.menus.update();
        self.key_bindings.clear();
        self.initialized = false;
        info!("script_host_exited");
    }

    fn update(&mut self, _control: &mut LoopControl) {
        self.menus.update();
    }

    fn draw(&mut self, surface: &mut Surface) {
        self.menus.draw(HandlerContext::Root, surface);
    }

    fn notify_input(&mut self, event: &InputEvent, control: &mut LoopControl) -> bool {
        if event.is_keyboard_key_pressed() {
            if let Some(command) = self.bound_command(event.keyboard_key()) {
                if let Err(error) = self.execute(&command, control) {
                    warn!(command = %command, error = %error, "bound_command_failed");
                }
                return true;
            }
        }
        self.menus.notify_input(HandlerContext::Root, event)
    }

    fn notify_command(&mut self, event: &ControlEvent, _control: &mut LoopControl) -> bool {
        self.menus.notify_command(HandlerContext::Root, event)
    }

    fn on_joypad_connected(&mut self, joypad: &JoypadInfo) -> bool {
        info!(joypad = %joypad.id, name = %joypad.name, "script_joypad_connected");
        true
    }

    fn execute(&mut self, command: &str, control: &mut LoopControl) -> Result<(), ScriptError> {
        match self.registry.parse_line(command)? {
            Some(parsed) => self.run(parsed, control),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::collaborators::Size;
    use crate::app::commands::GameCommand;
    use crate::app::control::GameTransition;
    use crate::input::{JoypadId, KeyModifiers, KeyboardEvent};

    struct NullGame;

    impl ActiveGame for NullGame {
        fn start(&mut self) {}
        fn stop(&mut self) {}
        fn update(&mut self, _timestep_ns: u64) {}
        fn notify_input(&mut self, _event: &InputEvent) -> bool {
            false
        }
        fn notify_command(&mut self, _event: &ControlEvent) -> bool {
            false
        }
        fn draw(&mut self, _surface: &mut Surface) {}
        fn notify_window_size_changed(&mut self, _size: Size) {}
        fn primary_joypad(&self) -> Option<JoypadId> {
            None
        }
        fn set_primary_joypad(&mut self, _joypad: Option<JoypadId>) {}
    }

    fn key_down(key: KeyboardKey) -> InputEvent {
        InputEvent::Keyboard(KeyboardEvent {
            key,
            code: key.code(),
            pressed: true,
            repeat: false,
            modifiers: KeyModifiers::default(),
            repeat_enabled: false,
        })
    }

    fn started_host(control: &mut LoopControl) -> BuiltinScriptHost {
        let mut host = BuiltinScriptHost::new();
        host.initialize(&[], control);
        host
    }

    #[test]
    fn control_commands_flip_loop_flags() {
        let mut control = LoopControl::new(false);
        let mut host = started_host(&mut control);

        host.execute("suspend", &mut control).expect("suspend");
        host.execute("turbo on", &mut control).expect("turbo");
        assert!(control.is_suspended());
        assert!(control.is_turbo());

        host.execute("resume", &mut control).expect("resume");
        host.execute("exit", &mut control).expect("exit");
        assert!(!control.is_suspended());
        assert!(control.is_exiting());
    }

    #[test]
    fn game_start_needs_a_factory() {
        let mut control = LoopControl::new(false);
        let mut host = started_host(&mut control);
        assert!(matches!(
            host.execute("game start", &mut control),
            Err(ScriptError::NoGameFactory)
        ));

        let mut host = BuiltinScriptHost::new().with_game_factory(Box::new(|| Box::new(NullGame)));
        host.execute("game start", &mut control).expect("game start");
        assert!(matches!(
            control.take_transition(),
            Some(GameTransition::Start(_))
        ));
    }

    #[test]
    fn modal_menu_swallows_input() {
        let mut control = LoopControl::new(false);
        let mut host = started_host(&mut control);

        host.execute("menu start hud", &mut control).expect("hud");
        assert!(!host.notify_input(&key_down(KeyboardKey::A), &mut control));

        host.execute("menu start pause modal", &mut control).expect("pause");
        assert_eq!(host.menu_count(), 2);
        assert!(host.notify_input(&key_down(KeyboardKey::A), &mut control));
        assert!(host.notify_command(&ControlEvent::Pressed(GameCommand::Action), &mut control));

        host.execute("menu stop 2", &mut control).expect("stop pause");
        host.update(&mut control);
        assert_eq!(host.menu_count(), 1);
        assert_eq!(host.menu(1).map(TextMenu::name), Some("hud"));
    }

    #[test]
    fn unknown_menu_ids_are_errors() {
        let mut control = LoopControl::new(false);
        let mut host = started_host(&mut control);

        assert!(matches!(
            host.execute("menu stop 9", &mut control),
            Err(ScriptError::UnknownMenu(9))
        ));
        assert!(matches!(
            host.execute("menu start child 4", &mut control),
            Err(ScriptError::UnknownMenu(4))
        ));
    }

    #[test]
    fn child_menus_stop_with_their_parent() {
        let mut control = LoopControl::new(false);
        let mut host = started_host(&mut control);
        host.execute("menu start dialog", &mut control).expect("dialog");
        host.execute("menu start choice 1", &mut control).expect("choice");
        assert_eq!(host.menu_count(), 2);

        host.execute("menu stop 1", &mut control).expect("stop");
        assert_eq!(host.menu_count(), 0);
    }

    #[test]
    fn menus_draw_onto_the_surface() {
        let mut control = LoopControl::new(false);
        let mut host = started_host(&mut control);
        host.execute("menu start hud", &mut control).expect("hud");

        let mut surface = Surface::new(Size::new(16, 32));
        host.draw(&mut surface);

        let row_y = MENU_ROW_HEIGHT;
        assert_eq!(surface.pixel(0, row_y), Some(MENU_PALETTE[1]));
        assert_eq!(surface.pixel(0, 0), Some([0, 0, 0, 0]));
    }

    #[test]
    fn bound_key_runs_its_command_and_is_handled() {
        let mut control = LoopControl::new(false);
        let mut host = started_host(&mut control);
        host.execute("bind escape exit", &mut control).expect("bind");

        assert!(host.notify_input(&key_down(KeyboardKey::Escape), &mut control));
        assert!(control.is_exiting());

        host.execute("unbind escape", &mut control).expect("unbind");
        assert_eq!(host.bound_command(KeyboardKey::Escape), None);
    }

    #[test]
    fn rebinding_releases_the_previous_command() {
        let mut control = LoopControl::new(false);
        let mut host = started_host(&mut control);
        host.execute("bind f1 suspend", &mut control).expect("bind");
        host.execute("bind f1 resume", &mut control).expect("rebind");

        assert_eq!(host.bound_commands.live_count(), 1);
        assert_eq!(host.bound_command(KeyboardKey::F1).as_deref(), Some("resume"));

        host.exit();
        assert_eq!(host.bound_commands.live_count(), 0);
        assert!(!host.is_initialized());
    }

    #[test]
    fn startup_arguments_run_as_commands() {
        let mut control = LoopControl::new(false);
        let mut host = BuiltinScriptHost::new();
        host.initialize(
            &["turbo on".to_string(), "nonsense".to_string()],
            &mut control,
        );

        assert!(host.is_initialized());
        assert!(control.is_turbo());
    }
}
