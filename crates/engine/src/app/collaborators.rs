use thiserror::Error;
use tracing::debug;

use crate::input::{InputEvent, JoypadId, JoypadInfo};

use super::commands::ControlEvent;
use super::control::LoopControl;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// RGBA pixel buffer the game and scripts draw into each frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    size: Size,
    pixels: Vec<u8>,
}

impl Surface {
    pub fn new(size: Size) -> Self {
        let len = size.width as usize * size.height as usize * 4;
        Self {
            size,
            pixels: vec![0; len],
        }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    /// Fills a rectangle, clipped to the surface bounds.
    pub fn fill_rect(&mut self, x: i32, y: i32, width: u32, height: u32, color: [u8; 4]) {
        let surface_w = clamp_to_i32(self.size.width);
        let surface_h = clamp_to_i32(self.size.height);
        let x0 = x.clamp(0, surface_w);
        let y0 = y.clamp(0, surface_h);
        let x1 = x.saturating_add(clamp_to_i32(width)).clamp(0, surface_w);
        let y1 = y.saturating_add(clamp_to_i32(height)).clamp(0, surface_h);

        for row in y0..y1 {
            let start = (row as usize * self.size.width as usize + x0 as usize) * 4;
            let end = (row as usize * self.size.width as usize + x1 as usize) * 4;
            for pixel in self.pixels[start..end].chunks_exact_mut(4) {
                pixel.copy_from_slice(&color);
            }
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        let offset = (y as usize * self.size.width as usize + x as usize) * 4;
        let mut color = [0; 4];
        color.copy_from_slice(&self.pixels[offset..offset + 4]);
        Some(color)
    }
}

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("unknown command '{0}'. try: help")]
    UnknownCommand(String),
    #[error("{reason}. usage: {usage}")]
    InvalidArguments { reason: String, usage: String },
    #[error("{0}. usage: help")]
    Tokenize(String),
    #[error("no started menu with id {0}")]
    UnknownMenu(u64),
    #[error("no game factory is configured")]
    NoGameFactory,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Pixels(#[from] pixels::Error),
    #[error(transparent)]
    Texture(#[from] pixels::TextureError),
    #[error("render target unavailable: {0}")]
    Unavailable(&'static str),
}

/// The scripting layer as seen by the main loop.
pub trait ScriptHost {
    fn initialize(&mut self, args: &[String], control: &mut LoopControl);
    fn exit(&mut self);
    fn update(&mut self, control: &mut LoopControl);
    fn draw(&mut self, surface: &mut Surface);
    fn notify_input(&mut self, event: &InputEvent, control: &mut LoopControl) -> bool;
    fn notify_command(&mut self, event: &ControlEvent, control: &mut LoopControl) -> bool;

    /// Returning true lets a game without a primary joypad adopt this one.
    fn on_joypad_connected(&mut self, _joypad: &JoypadInfo) -> bool {
        true
    }

    fn on_joypad_removed(&mut self, _joypad: &JoypadInfo) -> bool {
        false
    }

    fn on_joypad_button(&mut self, _event: &InputEvent) -> bool {
        false
    }

    fn on_joypad_axis_moved(&mut self, _event: &InputEvent) -> bool {
        false
    }

    /// Runs one console command on the simulation thread.
    fn execute(&mut self, command: &str, control: &mut LoopControl) -> Result<(), ScriptError>;
}

pub trait ActiveGame {
    fn start(&mut self);
    fn stop(&mut self);
    fn update(&mut self, timestep_ns: u64);
    fn notify_input(&mut self, event: &InputEvent) -> bool;
    fn notify_command(&mut self, event: &ControlEvent) -> bool;
    fn draw(&mut self, surface: &mut Surface);
    fn notify_window_size_changed(&mut self, size: Size);
    fn primary_joypad(&self) -> Option<JoypadId>;
    fn set_primary_joypad(&mut self, joypad: Option<JoypadId>);
}

pub trait Renderer {
    fn render(&mut self, surface: &Surface) -> Result<(), RenderError>;
    fn clear_screen_surface(&mut self);
    fn display_period_ns(&self) -> u64;
    fn show_window(&mut self);
    fn hide_window(&mut self);
    fn set_fullscreen(&mut self, fullscreen: bool);
    fn set_cursor_visible(&mut self, visible: bool);
    fn set_window_title(&mut self, title: &str);
    fn on_window_resized(&mut self, size: Size) -> Result<(), RenderError>;
    /// Logical size of the surface the game draws into.
    fn quest_size(&self) -> Size;
}

/// Sound effects (`*_all`) and music (`*_playing`) controls.
pub trait Audio {
    fn pause_all(&mut self);
    fn resume_all(&mut self);
    fn pause_playing(&mut self);
    fn resume_playing(&mut self);
    fn stop_playing(&mut self);
}

#[derive(Debug, Default)]
pub struct SilentAudio;

impl Audio for SilentAudio {
    fn pause_all(&mut self) {
        debug!("audio_pause_all");
    }

    fn resume_all(&mut self) {
        debug!("audio_resume_all");
    }

    fn pause_playing(&mut self) {
        debug!("audio_pause_music");
    }

    fn resume_playing(&mut self) {
        debug!("audio_resume_music");
    }

    fn stop_playing(&mut self) {
        debug!("audio_stop_music");
    }
}

fn clamp_to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
