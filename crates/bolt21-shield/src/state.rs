//! Overlay state machine
//!
//! Pure transition logic with no platform dependency. Every event that can
//! reveal content is re-checked against the live capture status read at
//! transition time; the notification payload is never trusted on its own.

/// Overlay visibility
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OverlayState {
    /// No overlay attached
    #[default]
    Hidden,
    /// Exactly one overlay attached and topmost
    Shown,
}

/// Platform and lifecycle signals consumed by the shield
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShieldEvent {
    /// Screen recording / mirroring started or stopped
    CaptureStatusChanged {
        /// Capture status carried by the notification
        is_captured: bool,
    },
    /// A screenshot was taken (already complete when observed)
    ScreenshotTaken,
    /// App is moving to the background or app switcher
    AppWillResignActive,
    /// App returned to the foreground
    AppDidBecomeActive,
}

impl ShieldEvent {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::CaptureStatusChanged { .. } => "capture_status_changed",
            Self::ScreenshotTaken => "screenshot_taken",
            Self::AppWillResignActive => "app_will_resign_active",
            Self::AppDidBecomeActive => "app_did_become_active",
        }
    }
}

/// Overlay state plus the foreground flag it depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShieldMachine {
    /// Current overlay state
    pub overlay: OverlayState,
    /// Whether the app is in the foreground
    pub app_active: bool,
}

impl Default for ShieldMachine {
    fn default() -> Self {
        Self {
            overlay: OverlayState::Hidden,
            app_active: true,
        }
    }
}

impl ShieldMachine {
    /// Compute the next state.
    ///
    /// `live_captured` is the capture status queried from the platform when
    /// the event is handled.
    pub fn next(self, event: ShieldEvent, live_captured: bool) -> Self {
        match event {
            ShieldEvent::CaptureStatusChanged { .. } => Self {
                // A stop arriving while backgrounded must not uncover the
                // frame the OS snapshots for the app switcher.
                overlay: reveal_unless(live_captured || !self.app_active),
                ..self
            },
            ShieldEvent::ScreenshotTaken => self,
            ShieldEvent::AppWillResignActive => Self {
                overlay: OverlayState::Shown,
                app_active: false,
            },
            ShieldEvent::AppDidBecomeActive => Self {
                overlay: reveal_unless(live_captured),
                app_active: true,
            },
        }
    }
}

fn reveal_unless(keep_covered: bool) -> OverlayState {
    if keep_covered {
        OverlayState::Shown
    } else {
        OverlayState::Hidden
    }
}
