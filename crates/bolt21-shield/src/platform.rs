//! Platform capture integration
//!
//! Native code implements [`CapturePlatform`] and [`WindowHost`] over FFI:
//! - Android: `FLAG_SECURE` on the activity window (proactive block)
//! - iOS: `UIScreen.capturedDidChangeNotification`,
//!   `UIApplication.userDidTakeScreenshotNotification`, overlay `UIView`
//! - macOS: `NSWindow.sharingType = .none` (proactive block)
//! - Windows: `SetWindowDisplayAffinity(WDA_EXCLUDEFROMCAPTURE)` on 10 2004+
//! - Linux: no standard API, overlay only
//!
//! The mock implementations drive tests and hosts without a native bridge.

use crate::overlay::OverlaySpec;
use crate::state::ShieldEvent;
use crate::{Error, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc;

/// Supported platforms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Android
    Android,
    /// iOS
    Ios,
    /// macOS
    MacOs,
    /// Windows
    Windows,
    /// Linux
    Linux,
    /// Unknown platform
    Unknown,
}

impl Platform {
    /// Detect current platform
    pub fn current() -> Self {
        #[cfg(target_os = "android")]
        return Platform::Android;

        #[cfg(target_os = "ios")]
        return Platform::Ios;

        #[cfg(target_os = "macos")]
        return Platform::MacOs;

        #[cfg(target_os = "windows")]
        return Platform::Windows;

        #[cfg(target_os = "linux")]
        return Platform::Linux;

        #[cfg(not(any(
            target_os = "android",
            target_os = "ios",
            target_os = "macos",
            target_os = "windows",
            target_os = "linux"
        )))]
        return Platform::Unknown;
    }

    /// Whether the OS can refuse all capture of a window up front
    pub fn has_native_capture_block(&self) -> bool {
        matches!(self, Self::Android | Self::MacOs | Self::Windows)
    }
}

/// Handle to an attached overlay surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlayHandle(pub u64);

/// Sending half of the shield event queue.
///
/// Platform observers may fire on any thread; events are only applied
/// when the owning monitor is pumped on the main context.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::Sender<ShieldEvent>,
}

impl EventSender {
    pub(crate) fn new(tx: mpsc::Sender<ShieldEvent>) -> Self {
        Self { tx }
    }

    /// Queue an event. Returns false once the monitor is gone.
    pub fn send(&self, event: ShieldEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Platform capture capabilities
pub trait CapturePlatform: Send + Sync {
    /// Live capture status (recording, mirroring, AirPlay)
    fn is_captured(&self) -> bool;

    /// Platform the bridge runs on; the build target unless overridden
    fn platform(&self) -> Platform {
        Platform::current()
    }

    /// Whether proactive capture blocking is available
    fn supports_capture_block(&self) -> bool {
        self.platform().has_native_capture_block()
    }

    /// Enable or disable proactive capture blocking on the window
    fn set_capture_blocked(&self, blocked: bool) -> Result<()>;

    /// Subscribe to capture and screenshot notifications.
    ///
    /// The platform keeps `sender` and posts
    /// [`ShieldEvent::CaptureStatusChanged`] and
    /// [`ShieldEvent::ScreenshotTaken`] through it.
    fn register_observers(&self, sender: EventSender) -> Result<()>;
}

/// Window that hosts the overlay surface
pub trait WindowHost: Send + Sync {
    /// Attach an opaque full-window overlay above all content
    fn attach_overlay(&self, spec: &OverlaySpec) -> Result<OverlayHandle>;

    /// Remove and destroy an overlay
    fn detach_overlay(&self, handle: OverlayHandle) -> Result<()>;
}

/// Mock capture platform
pub struct MockCapturePlatform {
    platform: Platform,
    captured: AtomicBool,
    deny_block: AtomicBool,
    deny_observers: AtomicBool,
    blocked: AtomicBool,
    sender: Mutex<Option<EventSender>>,
}

impl MockCapturePlatform {
    /// Platform without capture blocking (iOS-like)
    pub fn new() -> Self {
        Self::for_platform(Platform::Ios)
    }

    /// Platform with capture blocking (Android-like)
    pub fn with_capture_block() -> Self {
        Self::for_platform(Platform::Android)
    }

    /// Mirror the capabilities of the build target
    pub fn current() -> Self {
        Self::for_platform(Platform::current())
    }

    /// Mirror the capabilities of `platform`
    pub fn for_platform(platform: Platform) -> Self {
        Self {
            platform,
            captured: AtomicBool::new(false),
            deny_block: AtomicBool::new(false),
            deny_observers: AtomicBool::new(false),
            blocked: AtomicBool::new(false),
            sender: Mutex::new(None),
        }
    }

    /// Refuse capture blocking requests
    pub fn deny_capture_block(&self) {
        self.deny_block.store(true, Ordering::SeqCst);
    }

    /// Refuse observer registration
    pub fn deny_observers(&self) {
        self.deny_observers.store(true, Ordering::SeqCst);
    }

    /// Whether capture blocking is currently on
    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    /// Whether observers were registered
    pub fn has_observers(&self) -> bool {
        self.sender.lock().is_some()
    }

    /// Change the live status without notifying (simulates a lost event)
    pub fn set_captured(&self, captured: bool) {
        self.captured.store(captured, Ordering::SeqCst);
    }

    /// Change the live status and notify observers
    pub fn set_captured_and_notify(&self, captured: bool) -> bool {
        self.set_captured(captured);
        self.post(ShieldEvent::CaptureStatusChanged {
            is_captured: captured,
        })
    }

    /// Notify observers of a screenshot
    pub fn take_screenshot(&self) -> bool {
        self.post(ShieldEvent::ScreenshotTaken)
    }

    /// Deliver an arbitrary notification, e.g. a stale one
    pub fn post(&self, event: ShieldEvent) -> bool {
        match self.sender.lock().as_ref() {
            Some(sender) => sender.send(event),
            None => false,
        }
    }
}

impl Default for MockCapturePlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl CapturePlatform for MockCapturePlatform {
    fn is_captured(&self) -> bool {
        self.captured.load(Ordering::SeqCst)
    }

    fn platform(&self) -> Platform {
        self.platform
    }

    fn set_capture_blocked(&self, blocked: bool) -> Result<()> {
        if !self.supports_capture_block() || self.deny_block.load(Ordering::SeqCst) {
            return Err(Error::CapabilityDenied("capture blocking".to_string()));
        }
        self.blocked.store(blocked, Ordering::SeqCst);
        Ok(())
    }

    fn register_observers(&self, sender: EventSender) -> Result<()> {
        if self.deny_observers.load(Ordering::SeqCst) {
            return Err(Error::CapabilityDenied("capture observers".to_string()));
        }
        *self.sender.lock() = Some(sender);
        Ok(())
    }
}

/// Mock window host
pub struct MockWindowHost {
    window_available: AtomicBool,
    fail_detach: AtomicBool,
    next_handle: AtomicU64,
    attached: Mutex<Vec<(OverlayHandle, OverlaySpec)>>,
    attach_calls: AtomicU64,
    detach_calls: AtomicU64,
}

impl MockWindowHost {
    /// Create a host with an active window
    pub fn new() -> Self {
        Self {
            window_available: AtomicBool::new(true),
            fail_detach: AtomicBool::new(false),
            next_handle: AtomicU64::new(1),
            attached: Mutex::new(Vec::new()),
            attach_calls: AtomicU64::new(0),
            detach_calls: AtomicU64::new(0),
        }
    }

    /// Simulate having (or not having) an active window
    pub fn set_window_available(&self, available: bool) {
        self.window_available.store(available, Ordering::SeqCst);
    }

    /// Make detach requests fail
    pub fn set_fail_detach(&self, fail: bool) {
        self.fail_detach.store(fail, Ordering::SeqCst);
    }

    /// Overlays currently attached
    pub fn attached_count(&self) -> usize {
        self.attached.lock().len()
    }

    /// Spec of the topmost attached overlay
    pub fn top_overlay(&self) -> Option<OverlaySpec> {
        self.attached.lock().last().map(|(_, spec)| spec.clone())
    }

    /// Successful and failed attach attempts
    pub fn attach_calls(&self) -> u64 {
        self.attach_calls.load(Ordering::SeqCst)
    }

    /// Successful and failed detach attempts
    pub fn detach_calls(&self) -> u64 {
        self.detach_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockWindowHost {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowHost for MockWindowHost {
    fn attach_overlay(&self, spec: &OverlaySpec) -> Result<OverlayHandle> {
        self.attach_calls.fetch_add(1, Ordering::SeqCst);
        if !self.window_available.load(Ordering::SeqCst) {
            return Err(Error::NoActiveWindow);
        }
        let handle = OverlayHandle(self.next_handle.fetch_add(1, Ordering::SeqCst));
        self.attached.lock().push((handle, spec.clone()));
        Ok(handle)
    }

    fn detach_overlay(&self, handle: OverlayHandle) -> Result<()> {
        self.detach_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_detach.load(Ordering::SeqCst) {
            return Err(Error::Overlay("detach refused".to_string()));
        }
        let mut attached = self.attached.lock();
        let before = attached.len();
        attached.retain(|(h, _)| *h != handle);
        if attached.len() == before {
            return Err(Error::Overlay(format!("unknown overlay {:?}", handle)));
        }
        Ok(())
    }
}
