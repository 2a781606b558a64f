//! Capture monitor
//!
//! Wires platform capture notifications and app lifecycle signals into the
//! [`OverlayController`]. Two layers of defense:
//! 1. Proactive capture blocking, when the platform has it
//! 2. The reactive overlay state machine, always

use crate::config::ShieldConfig;
use crate::diagnostics::{ScreenshotEvent, SecurityDiagnostics, TracingDiagnostics};
use crate::overlay::OverlayController;
use crate::platform::{CapturePlatform, EventSender, Platform, WindowHost};
use crate::state::{OverlayState, ShieldEvent};
use std::sync::mpsc;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Protection actually in effect after install
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtectionLevel {
    /// Capture blocked and overlay machine running
    BlockedAndReactive,
    /// Capture blocked, observers refused
    BlockedOnly,
    /// Overlay machine only (no blocking capability)
    ReactiveOnly,
    /// Platform refused everything
    Unprotected,
}

impl ProtectionLevel {
    fn from_capabilities(blocking: bool, observers: bool) -> Self {
        match (blocking, observers) {
            (true, true) => Self::BlockedAndReactive,
            (true, false) => Self::BlockedOnly,
            (false, true) => Self::ReactiveOnly,
            (false, false) => Self::Unprotected,
        }
    }

    /// Whether any protection is active
    pub fn is_protected(&self) -> bool {
        !matches!(self, Self::Unprotected)
    }
}

/// Snapshot of the shield for diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShieldStatus {
    /// Platform reported by the bridge
    pub platform: Platform,
    /// Protection level, `None` before install
    pub level: Option<ProtectionLevel>,
    /// Current overlay state
    pub overlay: OverlayState,
    /// Proactive capture blocking active
    pub capture_blocked: bool,
    /// Capture/screenshot observers registered
    pub observers_registered: bool,
    /// Capture status at the last handled event
    pub captured: bool,
    /// App in the foreground
    pub app_active: bool,
    /// Screenshots observed since launch
    pub screenshots_observed: u64,
}

/// Screen capture monitor
pub struct CaptureMonitor {
    platform: Arc<dyn CapturePlatform>,
    controller: OverlayController,
    diagnostics: Arc<dyn SecurityDiagnostics>,
    config: ShieldConfig,
    tx: mpsc::Sender<ShieldEvent>,
    rx: mpsc::Receiver<ShieldEvent>,
    level: Option<ProtectionLevel>,
    capture_blocked: bool,
    observers_registered: bool,
    last_captured: bool,
    screenshots_observed: u64,
}

impl CaptureMonitor {
    /// Create a monitor reporting screenshots through `tracing`
    pub fn new(
        platform: Arc<dyn CapturePlatform>,
        window: Arc<dyn WindowHost>,
        config: ShieldConfig,
    ) -> Self {
        Self::with_diagnostics(platform, window, config, Arc::new(TracingDiagnostics))
    }

    /// Create a monitor with a custom diagnostics sink
    pub fn with_diagnostics(
        platform: Arc<dyn CapturePlatform>,
        window: Arc<dyn WindowHost>,
        config: ShieldConfig,
        diagnostics: Arc<dyn SecurityDiagnostics>,
    ) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            platform,
            controller: OverlayController::new(window, config.overlay_spec()),
            diagnostics,
            config,
            tx,
            rx,
            level: None,
            capture_blocked: false,
            observers_registered: false,
            last_captured: false,
            screenshots_observed: 0,
        }
    }

    /// Enable capture blocking (if supported) and register observers.
    ///
    /// Never fails: refused capabilities lower the returned level. Calling
    /// again returns the level from the first install.
    pub fn install(&mut self) -> ProtectionLevel {
        if let Some(level) = self.level {
            debug!("Capture monitor already installed ({:?})", level);
            return level;
        }

        self.capture_blocked = self.enable_capture_block();

        self.observers_registered = match self
            .platform
            .register_observers(EventSender::new(self.tx.clone()))
        {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    event = "capture_observers_denied",
                    error = %e,
                    "Capture observers refused by platform"
                );
                false
            }
        };

        let level =
            ProtectionLevel::from_capabilities(self.capture_blocked, self.observers_registered);
        self.level = Some(level);

        let platform = self.platform.platform();
        match level {
            ProtectionLevel::Unprotected => warn!(
                event = "content_protection_level",
                platform = ?platform,
                level = ?level,
                "Running WITHOUT screen capture protection"
            ),
            _ => info!(
                event = "content_protection_level",
                platform = ?platform,
                level = ?level,
                "Screen capture protection installed"
            ),
        }

        // Recording may already be running at launch
        if self.observers_registered && self.platform.is_captured() {
            self.handle(ShieldEvent::CaptureStatusChanged { is_captured: true });
        }

        level
    }

    fn enable_capture_block(&self) -> bool {
        if !self.config.block_capture {
            debug!("Proactive capture blocking disabled by config");
            return false;
        }
        if !self.platform.supports_capture_block() {
            debug!(
                "{:?} has no capture blocking; relying on overlay",
                self.platform.platform()
            );
            return false;
        }

        match self.platform.set_capture_blocked(true) {
            Ok(()) => {
                info!(event = "capture_block_enabled", "Window capture blocked");
                true
            }
            Err(e) => {
                warn!(
                    event = "capture_block_denied",
                    error = %e,
                    "Capture blocking refused; falling back to overlay"
                );
                false
            }
        }
    }

    /// Sender for platform observers
    pub fn sender(&self) -> EventSender {
        EventSender::new(self.tx.clone())
    }

    /// Apply all queued events. Returns how many were handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.rx.try_recv() {
            self.handle(event);
            handled += 1;
        }
        handled
    }

    /// Apply one event now, re-querying the live capture status.
    pub fn handle(&mut self, event: ShieldEvent) -> OverlayState {
        if event == ShieldEvent::ScreenshotTaken {
            self.screenshots_observed += 1;
            self.diagnostics.screenshot_detected(&ScreenshotEvent::now());
            return self.controller.state();
        }

        let live = self.platform.is_captured();
        if let ShieldEvent::CaptureStatusChanged { is_captured } = event {
            if is_captured != live {
                debug!(
                    "Capture notification says {} but platform reports {}; using live status",
                    is_captured, live
                );
            }
        }
        self.last_captured = live;

        self.controller.apply(event, live)
    }

    /// Host is moving to the background
    pub fn will_resign_active(&mut self) -> OverlayState {
        self.handle(ShieldEvent::AppWillResignActive)
    }

    /// Host returned to the foreground
    pub fn did_become_active(&mut self) -> OverlayState {
        self.handle(ShieldEvent::AppDidBecomeActive)
    }

    /// Current overlay state
    pub fn overlay_state(&self) -> OverlayState {
        self.controller.state()
    }

    /// Diagnostics snapshot
    pub fn status(&self) -> ShieldStatus {
        ShieldStatus {
            platform: self.platform.platform(),
            level: self.level,
            overlay: self.controller.state(),
            capture_blocked: self.capture_blocked,
            observers_registered: self.observers_registered,
            captured: self.last_captured,
            app_active: self.controller.app_active(),
            screenshots_observed: self.screenshots_observed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::RecordingDiagnostics;
    use crate::platform::{MockCapturePlatform, MockWindowHost};

    struct Harness {
        platform: Arc<MockCapturePlatform>,
        window: Arc<MockWindowHost>,
        diagnostics: Arc<RecordingDiagnostics>,
        monitor: CaptureMonitor,
    }

    fn harness(platform: MockCapturePlatform, config: ShieldConfig) -> Harness {
        let platform = Arc::new(platform);
        let window = Arc::new(MockWindowHost::new());
        let diagnostics = Arc::new(RecordingDiagnostics::new());
        let monitor = CaptureMonitor::with_diagnostics(
            platform.clone(),
            window.clone(),
            config,
            diagnostics.clone(),
        );
        Harness {
            platform,
            window,
            diagnostics,
            monitor,
        }
    }

    #[test]
    fn test_install_on_reactive_platform() {
        let mut h = harness(MockCapturePlatform::new(), ShieldConfig::default());
        assert_eq!(h.monitor.install(), ProtectionLevel::ReactiveOnly);
        assert!(h.platform.has_observers());
        assert!(!h.platform.is_blocked());
    }

    #[test]
    fn test_install_on_blocking_platform() {
        let mut h = harness(
            MockCapturePlatform::with_capture_block(),
            ShieldConfig::default(),
        );
        assert_eq!(h.monitor.install(), ProtectionLevel::BlockedAndReactive);
        assert!(h.platform.is_blocked());
    }

    #[test]
    fn test_install_follows_platform_capability() {
        let mut macos = harness(
            MockCapturePlatform::for_platform(Platform::MacOs),
            ShieldConfig::default(),
        );
        assert_eq!(macos.monitor.install(), ProtectionLevel::BlockedAndReactive);
        assert_eq!(macos.monitor.status().platform, Platform::MacOs);

        let mut linux = harness(
            MockCapturePlatform::for_platform(Platform::Linux),
            ShieldConfig::default(),
        );
        assert_eq!(linux.monitor.install(), ProtectionLevel::ReactiveOnly);
        assert_eq!(linux.monitor.status().platform, Platform::Linux);
    }

    #[test]
    fn test_blocking_disabled_by_config() {
        let config = ShieldConfig {
            block_capture: false,
            ..ShieldConfig::default()
        };
        let mut h = harness(MockCapturePlatform::with_capture_block(), config);
        assert_eq!(h.monitor.install(), ProtectionLevel::ReactiveOnly);
        assert!(!h.platform.is_blocked());
    }

    #[test]
    fn test_denied_capabilities_degrade() {
        let platform = MockCapturePlatform::with_capture_block();
        platform.deny_capture_block();
        platform.deny_observers();
        let mut h = harness(platform, ShieldConfig::default());

        let level = h.monitor.install();
        assert_eq!(level, ProtectionLevel::Unprotected);
        assert!(!level.is_protected());
        assert_eq!(h.monitor.status().level, Some(ProtectionLevel::Unprotected));
    }

    #[test]
    fn test_install_is_idempotent() {
        let mut h = harness(MockCapturePlatform::new(), ShieldConfig::default());
        let first = h.monitor.install();
        h.platform.deny_observers();
        assert_eq!(h.monitor.install(), first);
    }

    #[test]
    fn test_recording_in_progress_at_install() {
        let platform = MockCapturePlatform::new();
        platform.set_captured(true);
        let mut h = harness(platform, ShieldConfig::default());
        h.monitor.install();
        assert_eq!(h.monitor.overlay_state(), OverlayState::Shown);
        assert_eq!(h.window.attached_count(), 1);
    }

    #[test]
    fn test_pump_applies_queued_events() {
        let mut h = harness(MockCapturePlatform::new(), ShieldConfig::default());
        h.monitor.install();

        h.platform.set_captured_and_notify(true);
        assert_eq!(h.monitor.overlay_state(), OverlayState::Hidden);
        assert_eq!(h.monitor.pump(), 1);
        assert_eq!(h.monitor.overlay_state(), OverlayState::Shown);
        assert_eq!(h.monitor.pump(), 0);
    }

    #[test]
    fn test_screenshot_logged_without_ui_change() {
        let mut h = harness(MockCapturePlatform::new(), ShieldConfig::default());
        h.monitor.install();

        h.platform.take_screenshot();
        h.monitor.pump();

        assert_eq!(h.diagnostics.count(), 1);
        assert_eq!(h.monitor.overlay_state(), OverlayState::Hidden);
        assert_eq!(h.window.attach_calls(), 0);
        assert_eq!(h.monitor.status().screenshots_observed, 1);
    }

    #[test]
    fn test_sender_from_other_thread() {
        let mut h = harness(MockCapturePlatform::new(), ShieldConfig::default());
        h.monitor.install();

        let sender = h.monitor.sender();
        std::thread::spawn(move || {
            sender.send(ShieldEvent::AppWillResignActive);
        })
        .join()
        .unwrap();

        assert_eq!(h.monitor.pump(), 1);
        assert_eq!(h.monitor.overlay_state(), OverlayState::Shown);
        assert!(!h.monitor.status().app_active);
    }
}
