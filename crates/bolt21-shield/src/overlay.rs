//! Security overlay
//!
//! The overlay is an opaque full-window surface with a static advisory
//! message. It never renders wallet data. It is created on entering
//! [`OverlayState::Shown`] and destroyed on leaving it.

use crate::platform::{OverlayHandle, WindowHost};
use crate::state::{OverlayState, ShieldEvent, ShieldMachine};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default advisory text
pub const DEFAULT_OVERLAY_MESSAGE: &str =
    "Screen recording detected.\nContent hidden for security.";

/// Horizontal inset of the message label, in points
pub const DEFAULT_TEXT_MARGIN: f32 = 20.0;

/// RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
    /// Alpha
    pub a: u8,
}

impl Color {
    /// Opaque black
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    /// Opaque white
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };

    /// Whether the color fully occludes what is beneath it
    pub fn is_opaque(&self) -> bool {
        self.a == u8::MAX
    }
}

/// What the native layer draws for the overlay
#[derive(Debug, Clone, PartialEq)]
pub struct OverlaySpec {
    /// Centered, multi-line advisory text
    pub message: String,
    /// Full-window background
    pub background: Color,
    /// Message color
    pub text_color: Color,
    /// Minimum distance between the message and the window edges
    pub text_margin: f32,
}

impl OverlaySpec {
    /// Overlay with a custom message
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }
}

impl Default for OverlaySpec {
    fn default() -> Self {
        Self {
            message: DEFAULT_OVERLAY_MESSAGE.to_string(),
            background: Color::BLACK,
            text_color: Color::WHITE,
            text_margin: DEFAULT_TEXT_MARGIN,
        }
    }
}

/// Drives the overlay surface from [`ShieldMachine`] transitions
pub struct OverlayController {
    window: Arc<dyn WindowHost>,
    spec: OverlaySpec,
    machine: ShieldMachine,
    handle: Option<OverlayHandle>,
}

impl OverlayController {
    /// Create a controller in the `Hidden` state
    pub fn new(window: Arc<dyn WindowHost>, spec: OverlaySpec) -> Self {
        Self {
            window,
            spec,
            machine: ShieldMachine::default(),
            handle: None,
        }
    }

    /// Current overlay state
    pub fn state(&self) -> OverlayState {
        self.machine.overlay
    }

    /// Whether the app is in the foreground
    pub fn app_active(&self) -> bool {
        self.machine.app_active
    }

    /// Overlay spec in use
    pub fn spec(&self) -> &OverlaySpec {
        &self.spec
    }

    /// Apply an event and attach/detach the surface on a real transition.
    ///
    /// Window failures are logged and swallowed. The recorded state always
    /// reflects what is actually attached: a failed attach stays `Hidden`,
    /// a failed detach stays `Shown` and is retried on the next reveal.
    pub fn apply(&mut self, event: ShieldEvent, live_captured: bool) -> OverlayState {
        let target = self.machine.next(event, live_captured);
        self.machine.app_active = target.app_active;

        match (self.machine.overlay, target.overlay) {
            (OverlayState::Hidden, OverlayState::Shown) => self.show(event),
            (OverlayState::Shown, OverlayState::Hidden) => self.hide(event),
            _ => {}
        }

        self.machine.overlay
    }

    fn show(&mut self, event: ShieldEvent) {
        match self.window.attach_overlay(&self.spec) {
            Ok(handle) => {
                self.handle = Some(handle);
                self.machine.overlay = OverlayState::Shown;
                info!(
                    event = "security_overlay_shown",
                    trigger = event.name(),
                    "Security overlay shown"
                );
            }
            Err(e) => {
                warn!(
                    event = "security_overlay_attach_failed",
                    trigger = event.name(),
                    error = %e,
                    "Failed to show security overlay"
                );
            }
        }
    }

    fn hide(&mut self, event: ShieldEvent) {
        let Some(handle) = self.handle else {
            self.machine.overlay = OverlayState::Hidden;
            return;
        };

        match self.window.detach_overlay(handle) {
            Ok(()) => {
                self.handle = None;
                self.machine.overlay = OverlayState::Hidden;
                debug!(
                    event = "security_overlay_hidden",
                    trigger = event.name(),
                    "Security overlay removed"
                );
            }
            Err(e) => {
                warn!(
                    event = "security_overlay_detach_failed",
                    trigger = event.name(),
                    error = %e,
                    "Failed to remove security overlay"
                );
            }
        }
    }
}
