use std::sync::Arc;

use pixels::{Pixels, SurfaceTexture};
use tracing::{debug, info};
use winit::window::{Fullscreen, Window};

use crate::app::{RenderError, Renderer, Size, Surface};

const FALLBACK_DISPLAY_PERIOD_NS: u64 = 16_666_667;

/// Presents the quest surface in a window. The pixel buffer always has the
/// quest size; pixels scales it to the window and letterboxes the rest.
pub struct PixelsRenderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    quest_size: Size,
}

impl PixelsRenderer {
    pub fn new(window: Arc<Window>, quest_size: Size) -> Result<Self, pixels::Error> {
        let size = window.inner_size();
        let surface = SurfaceTexture::new(size.width, size.height, Arc::clone(&window));
        let pixels = Pixels::new(quest_size.width, quest_size.height, surface)?;
        Ok(Self {
            window,
            pixels,
            quest_size,
        })
    }
}

impl Renderer for PixelsRenderer {
    fn render(&mut self, surface: &Surface) -> Result<(), RenderError> {
        copy_surface(surface, self.quest_size, self.pixels.frame_mut());
        self.pixels.render()?;
        Ok(())
    }

    fn clear_screen_surface(&mut self) {
        self.pixels.frame_mut().fill(0);
    }

    fn display_period_ns(&self) -> u64 {
        self.window
            .current_monitor()
            .and_then(|monitor| monitor.refresh_rate_millihertz())
            .map_or(FALLBACK_DISPLAY_PERIOD_NS, display_period_from_millihertz)
    }

    fn show_window(&mut self) {
        self.window.set_visible(true);
    }

    fn hide_window(&mut self) {
        self.window.set_visible(false);
    }

    fn set_fullscreen(&mut self, fullscreen: bool) {
        info!(fullscreen, "window_fullscreen");
        self.window
            .set_fullscreen(fullscreen.then_some(Fullscreen::Borderless(None)));
    }

    fn set_cursor_visible(&mut self, visible: bool) {
        self.window.set_cursor_visible(visible);
    }

    fn set_window_title(&mut self, title: &str) {
        self.window.set_title(title);
    }

    fn on_window_resized(&mut self, size: Size) -> Result<(), RenderError> {
        if size.width == 0 || size.height == 0 {
            debug!("window_minimized");
            return Ok(());
        }
        self.pixels.resize_surface(size.width, size.height)?;
        Ok(())
    }

    fn quest_size(&self) -> Size {
        self.quest_size
    }
}

fn display_period_from_millihertz(millihertz: u32) -> u64 {
    if millihertz == 0 {
        return FALLBACK_DISPLAY_PERIOD_NS;
    }
    1_000_000_000_000 / u64::from(millihertz)
}

/// Copies the overlapping rows of `surface` into a frame of `frame_size`.
fn copy_surface(surface: &Surface, frame_size: Size, frame: &mut [u8]) {
    let source_size = surface.size();
    let row_bytes = source_size.width.min(frame_size.width) as usize * 4;
    let rows = source_size.height.min(frame_size.height) as usize;
    let source_stride = source_size.width as usize * 4;
    let frame_stride = frame_size.width as usize * 4;
    let pixels = surface.pixels();

    for row in 0..rows {
        let source = &pixels[row * source_stride..row * source_stride + row_bytes];
        let target_start = row * frame_stride;
        if let Some(target) = frame.get_mut(target_start..target_start + row_bytes) {
            target.copy_from_slice(source);
        }
    }
}
