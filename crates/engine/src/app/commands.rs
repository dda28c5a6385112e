use std::collections::{BTreeSet, HashMap};

use crate::input::{InputEvent, JoypadAxis, JoypadButton, JoypadId, KeyboardKey};

/// Stick deflection needed before an axis counts as a direction command.
const AXIS_COMMAND_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GameCommand {
    Action,
    Attack,
    Item1,
    Item2,
    Pause,
    Right,
    Up,
    Left,
    Down,
}

impl GameCommand {
    pub const ALL: [GameCommand; 9] = [
        GameCommand::Action,
        GameCommand::Attack,
        GameCommand::Item1,
        GameCommand::Item2,
        GameCommand::Pause,
        GameCommand::Right,
        GameCommand::Up,
        GameCommand::Left,
        GameCommand::Down,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GameCommand::Action => "action",
            GameCommand::Attack => "attack",
            GameCommand::Item1 => "item_1",
            GameCommand::Item2 => "item_2",
            GameCommand::Pause => "pause",
            GameCommand::Right => "right",
            GameCommand::Up => "up",
            GameCommand::Left => "left",
            GameCommand::Down => "down",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|command| command.name() == name)
    }

    /// Direction in eighths of a turn for the four direction commands.
    pub fn direction8(self) -> Option<i32> {
        match self {
            GameCommand::Right => Some(0),
            GameCommand::Up => Some(2),
            GameCommand::Left => Some(4),
            GameCommand::Down => Some(6),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    Pressed(GameCommand),
    Released(GameCommand),
}

impl ControlEvent {
    pub fn command(self) -> GameCommand {
        match self {
            ControlEvent::Pressed(command) | ControlEvent::Released(command) => command,
        }
    }

    pub fn is_pressed(self) -> bool {
        matches!(self, ControlEvent::Pressed(_))
    }
}

/// Last-resort mapping from raw input to game commands, used when nothing
/// earlier in the dispatch chain consumed an event.
#[derive(Debug, Clone)]
pub struct CommandBindings {
    keyboard: HashMap<KeyboardKey, GameCommand>,
    joypad_buttons: HashMap<JoypadButton, GameCommand>,
    pressed: BTreeSet<GameCommand>,
}

impl Default for CommandBindings {
    fn default() -> Self {
        let keyboard = HashMap::from([
            (KeyboardKey::Space, GameCommand::Action),
            (KeyboardKey::C, GameCommand::Attack),
            (KeyboardKey::X, GameCommand::Item1),
            (KeyboardKey::V, GameCommand::Item2),
            (KeyboardKey::D, GameCommand::Pause),
            (KeyboardKey::Right, GameCommand::Right),
            (KeyboardKey::Up, GameCommand::Up),
            (KeyboardKey::Left, GameCommand::Left),
            (KeyboardKey::Down, GameCommand::Down),
        ]);
        let joypad_buttons = HashMap::from([
            (JoypadButton::A, GameCommand::Action),
            (JoypadButton::X, GameCommand::Attack),
            (JoypadButton::Y, GameCommand::Item1),
            (JoypadButton::B, GameCommand::Item2),
            (JoypadButton::Start, GameCommand::Pause),
            (JoypadButton::DpadRight, GameCommand::Right),
            (JoypadButton::DpadUp, GameCommand::Up),
            (JoypadButton::DpadLeft, GameCommand::Left),
            (JoypadButton::DpadDown, GameCommand::Down),
        ]);
        Self {
            keyboard,
            joypad_buttons,
            pressed: BTreeSet::new(),
        }
    }
}

impl CommandBindings {
    pub fn empty() -> Self {
        Self {
            keyboard: HashMap::new(),
            joypad_buttons: HashMap::new(),
            pressed: BTreeSet::new(),
        }
    }

    /// Binds `key` to `command`, replacing whatever key held it before.
    pub fn set_keyboard_binding(&mut self, command: GameCommand, key: KeyboardKey) {
        self.keyboard.retain(|_, bound| *bound != command);
        if key != KeyboardKey::None {
            self.keyboard.insert(key, command);
        }
    }

    pub fn keyboard_binding(&self, command: GameCommand) -> KeyboardKey {
        self.keyboard
            .iter()
            .find(|(_, bound)| **bound == command)
            .map_or(KeyboardKey::None, |(key, _)| *key)
    }

    pub fn set_joypad_binding(&mut self, command: GameCommand, button: JoypadButton) {
        self.joypad_buttons.retain(|_, bound| *bound != command);
        if button != JoypadButton::Invalid {
            self.joypad_buttons.insert(button, command);
        }
    }

    pub fn joypad_binding(&self, command: GameCommand) -> JoypadButton {
        self.joypad_buttons
            .iter()
            .find(|(_, bound)| **bound == command)
            .map_or(JoypadButton::Invalid, |(button, _)| *button)
    }

    pub fn is_command_pressed(&self, command: GameCommand) -> bool {
        self.pressed.contains(&command)
    }

    /// Eight-way direction of the held direction commands, or -1.
    pub fn wanted_direction8(&self) -> i32 {
        let right = self.is_command_pressed(GameCommand::Right);
        let up = self.is_command_pressed(GameCommand::Up);
        let left = self.is_command_pressed(GameCommand::Left);
        let down = self.is_command_pressed(GameCommand::Down);
        match (right, up, left, down) {
            (true, false, false, false) => 0,
            (true, true, false, false) => 1,
            (false, true, false, false) => 2,
            (false, true, true, false) => 3,
            (false, false, true, false) => 4,
            (false, false, true, true) => 5,
            (false, false, false, true) => 6,
            (true, false, false, true) => 7,
            _ => -1,
        }
    }

    /// Releases every held command, e.g. when the game stops.
    pub fn release_all(&mut self) -> Vec<ControlEvent> {
        std::mem::take(&mut self.pressed)
            .into_iter()
            .map(ControlEvent::Released)
            .collect()
    }

    /// Translates an input event into command transitions. Joypad events
    /// from anything other than `primary` are ignored when a primary is set.
    pub fn translate(&mut self, event: &InputEvent, primary: Option<JoypadId>) -> Vec<ControlEvent> {
        if let (Some(primary), Some(source)) = (primary, event.joypad_id()) {
            if primary != source {
                return Vec::new();
            }
        }

        if event.is_keyboard_key_pressed() {
            return self.press_bound(self.keyboard.get(&event.keyboard_key()).copied());
        }
        if event.is_keyboard_key_released() {
            return self.release_bound(self.keyboard.get(&event.keyboard_key()).copied());
        }
        if event.is_joypad_button_pressed() {
            return self.press_bound(self.joypad_buttons.get(&event.joypad_button()).copied());
        }
        if event.is_joypad_button_released() {
            return self.release_bound(self.joypad_buttons.get(&event.joypad_button()).copied());
        }
        if event.is_joypad_axis_moved() {
            return self.translate_axis(event.joypad_axis(), event.joypad_axis_state());
        }
        Vec::new()
    }

    fn press_bound(&mut self, command: Option<GameCommand>) -> Vec<ControlEvent> {
        match command {
            Some(command) if self.pressed.insert(command) => vec![ControlEvent::Pressed(command)],
            _ => Vec::new(),
        }
    }

    fn release_bound(&mut self, command: Option<GameCommand>) -> Vec<ControlEvent> {
        match command {
            Some(command) if self.pressed.remove(&command) => vec![ControlEvent::Released(command)],
            _ => Vec::new(),
        }
    }

    fn translate_axis(&mut self, axis: JoypadAxis, state: f64) -> Vec<ControlEvent> {
        let (positive, negative) = match axis {
            JoypadAxis::LeftX | JoypadAxis::RightX => (GameCommand::Right, GameCommand::Left),
            JoypadAxis::LeftY | JoypadAxis::RightY => (GameCommand::Down, GameCommand::Up),
            _ => return Vec::new(),
        };

        let wanted = if state >= AXIS_COMMAND_THRESHOLD {
            Some(positive)
        } else if state <= -AXIS_COMMAND_THRESHOLD {
            Some(negative)
        } else {
            None
        };

        let mut events = Vec::new();
        for command in [positive, negative] {
            if Some(command) != wanted && self.pressed.remove(&command) {
                events.push(ControlEvent::Released(command));
            }
        }
        if let Some(command) = wanted {
            events.extend(self.press_bound(Some(command)));
        }
        events
    }
}
