use tracing::{debug, info, warn};

use crate::input::{InputEvent, JoypadRegistry};

use super::collaborators::{ActiveGame, Audio, Renderer, ScriptHost, Size, Surface};
use super::commands::CommandBindings;
use super::control::LoopControl;

/// Everything a dispatch stage may touch while handling one event.
pub struct DispatchContext<'a> {
    pub control: &'a mut LoopControl,
    pub script: &'a mut dyn ScriptHost,
    pub game: &'a mut Option<Box<dyn ActiveGame>>,
    pub renderer: &'a mut dyn Renderer,
    pub audio: &'a mut dyn Audio,
    pub joypads: &'a JoypadRegistry,
    pub bindings: &'a mut CommandBindings,
    pub root_surface: &'a mut Surface,
    pub suspend_unfocused: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    Continue,
    Handled,
}

pub struct DispatchStage {
    pub name: &'static str,
    pub applies: fn(&InputEvent, &DispatchContext<'_>) -> bool,
    pub run: fn(&InputEvent, &mut DispatchContext<'_>) -> Propagation,
}

/// Stages in the order an event visits them.
pub const DISPATCH_CHAIN: &[DispatchStage] = &[
    DispatchStage {
        name: "window_close",
        applies: |event, _| event.is_window_closing(),
        run: on_window_close,
    },
    DispatchStage {
        name: "window_resize",
        applies: |event, _| event.is_window_resizing(),
        run: on_window_resize,
    },
    DispatchStage {
        name: "focus",
        applies: |event, ctx| {
            ctx.suspend_unfocused
                && (event.is_window_focus_lost() || event.is_window_focus_gained())
        },
        run: on_focus_change,
    },
    DispatchStage {
        name: "joypad_fallback",
        applies: |event, ctx| event.is_joypad_removed() && ctx.game.is_some(),
        run: on_primary_joypad_removed,
    },
    DispatchStage {
        name: "joypad_script",
        applies: |event, _| {
            event.is_joypad_added()
                || event.is_joypad_removed()
                || event.is_joypad_button_pressed()
                || event.is_joypad_button_released()
                || event.is_joypad_axis_moved()
        },
        run: on_joypad_script,
    },
    DispatchStage {
        name: "script_input",
        applies: |_, _| true,
        run: |event, ctx| handled_if(ctx.script.notify_input(event, ctx.control)),
    },
    DispatchStage {
        name: "game_input",
        applies: |_, ctx| ctx.game.is_some(),
        run: |event, ctx| {
            let handled = ctx
                .game
                .as_mut()
                .is_some_and(|game| game.notify_input(event));
            handled_if(handled)
        },
    },
    DispatchStage {
        name: "command_bindings",
        applies: |_, ctx| ctx.game.is_some(),
        run: on_command_bindings,
    },
];

/// Runs `event` through the chain. Returns the stage that handled it, if any.
pub fn dispatch(event: &InputEvent, ctx: &mut DispatchContext<'_>) -> Option<&'static str> {
    for stage in DISPATCH_CHAIN {
        if !(stage.applies)(event, ctx) {
            continue;
        }
        if (stage.run)(event, ctx) == Propagation::Handled {
            debug!(stage = stage.name, "input_handled");
            return Some(stage.name);
        }
    }
    None
}

fn handled_if(handled: bool) -> Propagation {
    if handled {
        Propagation::Handled
    } else {
        Propagation::Continue
    }
}

fn on_window_close(_event: &InputEvent, ctx: &mut DispatchContext<'_>) -> Propagation {
    info!("window_close_requested");
    ctx.control.request_exit();
    Propagation::Continue
}

fn on_window_resize(event: &InputEvent, ctx: &mut DispatchContext<'_>) -> Propagation {
    let Some((width, height)) = event.window_size() else {
        return Propagation::Continue;
    };
    if let Err(error) = ctx.renderer.on_window_resized(Size::new(width, height)) {
        warn!(error = %error, width, height, "window_resize_failed");
    }

    let quest_size = ctx.renderer.quest_size();
    if ctx.root_surface.size() != quest_size {
        *ctx.root_surface = Surface::new(quest_size);
    }
    if let Some(game) = ctx.game.as_mut() {
        game.notify_window_size_changed(quest_size);
    }
    Propagation::Continue
}

fn on_focus_change(event: &InputEvent, ctx: &mut DispatchContext<'_>) -> Propagation {
    if event.is_window_focus_lost() {
        if !ctx.control.is_suspended() {
            ctx.control.set_suspended(true);
            ctx.audio.pause_all();
            ctx.audio.pause_playing();
        }
    } else if ctx.control.is_suspended() {
        ctx.control.set_suspended(false);
        ctx.audio.resume_all();
        ctx.audio.resume_playing();
    }
    Propagation::Continue
}

fn on_primary_joypad_removed(event: &InputEvent, ctx: &mut DispatchContext<'_>) -> Propagation {
    let (Some(removed), Some(game)) = (event.joypad_id(), ctx.game.as_mut()) else {
        return Propagation::Continue;
    };
    if game.primary_joypad() == Some(removed) {
        let fallback = ctx.joypads.other_joypad(removed);
        info!(
            removed = %removed,
            fallback = ?fallback,
            "primary_joypad_replaced"
        );
        game.set_primary_joypad(fallback);
    }
    Propagation::Continue
}

fn on_joypad_script(event: &InputEvent, ctx: &mut DispatchContext<'_>) -> Propagation {
    if event.is_joypad_added() {
        let Some(info) = event.joypad_info() else {
            return Propagation::Continue;
        };
        let wants_binding = ctx.script.on_joypad_connected(info);
        if let Some(game) = ctx.game.as_mut() {
            if wants_binding && game.primary_joypad().is_none() {
                info!(joypad = %info.id, "primary_joypad_bound");
                game.set_primary_joypad(Some(info.id));
            }
        }
        return Propagation::Continue;
    }

    if event.is_joypad_removed() {
        let handled = event
            .joypad_info()
            .is_some_and(|info| ctx.script.on_joypad_removed(info));
        return handled_if(handled);
    }

    if event.is_joypad_axis_moved() {
        return handled_if(ctx.script.on_joypad_axis_moved(event));
    }
    handled_if(ctx.script.on_joypad_button(event))
}

fn on_command_bindings(event: &InputEvent, ctx: &mut DispatchContext<'_>) -> Propagation {
    let Some(game) = ctx.game.as_mut() else {
        return Propagation::Continue;
    };
    let events = ctx.bindings.translate(event, game.primary_joypad());
    let mut handled = false;
    for command_event in &events {
        if ctx.script.notify_command(command_event, ctx.control) {
            handled = true;
            continue;
        }
        handled |= game.notify_command(command_event);
    }
    handled_if(handled)
}
