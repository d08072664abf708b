use std::sync::Arc;

use instant::Instant;
use winit::window::Window;

use crate::settings::Settings;

/// State shared with every flow: the window (if any), the settings and the
/// timestamp of the frame being processed.
///
/// Headless hosts and tests build one with [`Context::new`] and move the
/// clock forward with [`Context::set_now`].
#[derive(Debug)]
pub struct Context {
    pub(crate) window: Option<Arc<Window>>,
    pub settings: Settings,
    now: Instant,
}

impl Context {
    pub fn new(settings: Settings, now: Instant) -> Self {
        Self {
            window: None,
            settings,
            now,
        }
    }

    pub(crate) fn with_window(window: Arc<Window>, settings: Settings) -> Self {
        Self {
            window: Some(window),
            settings,
            now: Instant::now(),
        }
    }

    pub fn window(&self) -> Option<&Window> {
        self.window.as_deref()
    }

    /// Time at which the current frame, tick or event is processed.
    pub fn now(&self) -> Instant {
        self.now
    }

    pub fn set_now(&mut self, now: Instant) {
        self.now = now;
    }
}
