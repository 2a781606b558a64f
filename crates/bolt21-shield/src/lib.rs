//! Screen capture protection for the Bolt21 wallet
//!
//! Keeps seed phrases and balances out of screenshots, screen recordings
//! and app-switcher snapshots.
//!
//! ## Layers
//!
//! - **Capture blocking**: `FLAG_SECURE` on Android, `sharingType = .none`
//!   on macOS, display affinity on Windows. Enabled at window creation when
//!   available.
//! - **Security overlay**: an opaque surface placed over the window while
//!   the screen is being captured or the app is in the app switcher. Runs
//!   on every platform.
//! - **Screenshot diagnostics**: screenshots cannot be undone, so they are
//!   only reported on a process-private log target.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod monitor;
pub mod overlay;
pub mod platform;
pub mod state;

pub use config::ShieldConfig;
pub use diagnostics::{
    RecordingDiagnostics, ScreenshotEvent, SecurityDiagnostics, TracingDiagnostics, SECURITY_TARGET,
};
pub use error::{Error, Result};
pub use monitor::{CaptureMonitor, ProtectionLevel, ShieldStatus};
pub use overlay::{Color, OverlayController, OverlaySpec, DEFAULT_OVERLAY_MESSAGE};
pub use platform::{
    CapturePlatform, EventSender, MockCapturePlatform, MockWindowHost, OverlayHandle, Platform,
    WindowHost,
};
pub use state::{OverlayState, ShieldEvent, ShieldMachine};
