//! Frame acquisition.

use tracing::debug;
use xcap::image::EncodableLayout;

use vision::Frame;

/// Anything that can hand the tick loop a frame. A `None` skips the tick.
pub trait FrameSource {
    fn capture(&mut self) -> Option<Frame>;
}

/// Captures the client window by its application name.
///
/// If multiple windows share the app name, the first match is used.
pub struct WindowSource {
    app_name: String,
}

impl WindowSource {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }

    /// Follow config hot-reloads.
    pub fn set_app_name(&mut self, app_name: &str) {
        if self.app_name != app_name {
            debug!(from = %self.app_name, to = %app_name, "switching capture window");
            self.app_name = app_name.to_string();
        }
    }
}

fn find_window(app_name: &str) -> Option<xcap::Window> {
    let windows = xcap::Window::all().ok()?;
    windows
        .into_iter()
        .find(|w| w.app_name().ok().as_deref() == Some(app_name))
}

impl FrameSource for WindowSource {
    fn capture(&mut self) -> Option<Frame> {
        let window = find_window(&self.app_name)?;
        let image = window.capture_image().ok()?;
        Some(Frame::from_rgba(image.width() as usize, image.as_bytes()))
    }
}
