//! Host application lifecycle
//!
//! The native app delegate / activity forwards its lifecycle callbacks
//! here. Startup installs the pin policy first, then the capture monitor,
//! so no request can leave the app before pinning is active.

use crate::config::ShellConfig;
use crate::logging;
use bolt21_net::{default_policy, PinPolicy, PinningBootstrap};
use bolt21_shield::{
    CaptureMonitor, CapturePlatform, OverlayState, ProtectionLevel, ShieldEvent, ShieldStatus,
    WindowHost,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Result of pin policy installation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinningOutcome {
    /// Configured policy installed
    Installed {
        /// Pinned domain count
        domains: usize,
    },
    /// Configuration was invalid; built-in pins installed instead
    InstalledBuiltin {
        /// Pinned domain count
        domains: usize,
    },
    /// A policy was already registered for this process
    AlreadyInstalled,
    /// No policy could be installed
    Failed(String),
}

impl PinningOutcome {
    /// Whether a pin policy is active
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

/// What startup managed to enable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchReport {
    /// Certificate pinning result
    pub pinning: PinningOutcome,
    /// Screen capture protection level
    pub protection: ProtectionLevel,
}

/// Native shell of the wallet app
pub struct AppShell {
    config: ShellConfig,
    bootstrap: &'static PinningBootstrap,
    monitor: CaptureMonitor,
    launch: Option<LaunchReport>,
}

impl AppShell {
    /// Shell using the process-wide pinning bootstrap
    pub fn new(
        config: ShellConfig,
        platform: Arc<dyn CapturePlatform>,
        window: Arc<dyn WindowHost>,
    ) -> Self {
        Self::with_bootstrap(config, platform, window, PinningBootstrap::global())
    }

    /// Shell using a specific pinning bootstrap
    pub fn with_bootstrap(
        config: ShellConfig,
        platform: Arc<dyn CapturePlatform>,
        window: Arc<dyn WindowHost>,
        bootstrap: &'static PinningBootstrap,
    ) -> Self {
        let monitor = CaptureMonitor::new(platform, window, config.shield.clone());
        Self {
            config,
            bootstrap,
            monitor,
            launch: None,
        }
    }

    /// `applicationDidFinishLaunching` / `onCreate`.
    ///
    /// Runs once; later calls return the first report. Never fails: every
    /// problem lowers the reported protection instead.
    pub fn did_finish_launching(&mut self) -> LaunchReport {
        if let Some(report) = &self.launch {
            debug!("Launch already handled");
            return report.clone();
        }

        if let Err(e) = logging::init(&self.config.log_filter) {
            // A subscriber installed by the host is fine
            debug!("{}", e);
        }

        let pinning = self.install_pinning();
        let protection = self.monitor.install();

        let report = LaunchReport {
            pinning,
            protection,
        };
        info!(
            event = "app_launched",
            pinning = ?report.pinning,
            protection = ?report.protection,
            "Content protection and transport trust ready"
        );

        self.launch = Some(report.clone());
        report
    }

    fn install_pinning(&self) -> PinningOutcome {
        let (policy, from_config) = match self.config.pinning.clone().into_policy() {
            Ok(policy) => (policy, true),
            Err(e) => {
                error!(
                    event = "pin_config_invalid",
                    error = %e,
                    "Pin configuration rejected; using built-in pins"
                );
                match default_policy() {
                    Ok(policy) => (policy, false),
                    Err(e) => {
                        error!(error = %e, "Built-in pins invalid; pinning DISABLED");
                        return PinningOutcome::Failed(e.to_string());
                    }
                }
            }
        };

        match self.bootstrap.initialize(policy) {
            Ok(installed) if from_config => PinningOutcome::Installed {
                domains: installed.len(),
            },
            Ok(installed) => PinningOutcome::InstalledBuiltin {
                domains: installed.len(),
            },
            Err(bolt21_net::Error::AlreadyInitialized) => PinningOutcome::AlreadyInstalled,
            Err(e) => {
                warn!(error = %e, "Pinning bootstrap failed");
                PinningOutcome::Failed(e.to_string())
            }
        }
    }

    /// `applicationWillResignActive` / `onPause`
    pub fn will_resign_active(&mut self) -> OverlayState {
        self.monitor.will_resign_active()
    }

    /// `applicationDidBecomeActive` / `onResume`
    pub fn did_become_active(&mut self) -> OverlayState {
        self.monitor.did_become_active()
    }

    /// Capture status notification delivered directly by the bridge
    pub fn capture_status_changed(&mut self, is_captured: bool) -> OverlayState {
        self.monitor
            .handle(ShieldEvent::CaptureStatusChanged { is_captured })
    }

    /// Screenshot notification delivered directly by the bridge
    pub fn screenshot_taken(&mut self) {
        self.monitor.handle(ShieldEvent::ScreenshotTaken);
    }

    /// Apply events queued by platform observers
    pub fn pump(&mut self) -> usize {
        self.monitor.pump()
    }

    /// Capture protection diagnostics
    pub fn shield_status(&self) -> ShieldStatus {
        self.monitor.status()
    }

    /// Installed pin policy, for the network layer
    pub fn pin_policy(&self) -> bolt21_net::Result<Arc<PinPolicy>> {
        self.bootstrap.policy()
    }

    /// Pinning bootstrap backing this shell
    pub fn trust(&self) -> &'static PinningBootstrap {
        self.bootstrap
    }

    /// Launch report, if launched
    pub fn launch_report(&self) -> Option<&LaunchReport> {
        self.launch.as_ref()
    }
}
