//! Native shell for the Bolt21 wallet
//!
//! Entry points the platform app delegate calls: startup, foreground and
//! background transitions, and capture notifications. Wallet logic lives
//! elsewhere; this crate only sets up content protection and transport
//! trust.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod app;
pub mod config;
pub mod logging;

pub use app::{AppShell, LaunchReport, PinningOutcome};
pub use config::ShellConfig;
