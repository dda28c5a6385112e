mod gamepads;
mod icon;
mod pixels_renderer;
mod winit_source;

pub use gamepads::GamepadBackend;
pub use icon::load_window_icon;
pub use pixels_renderer::PixelsRenderer;
pub use winit_source::WinitEventSource;
