//! Shield configuration

use crate::overlay::{OverlaySpec, DEFAULT_OVERLAY_MESSAGE};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Content protection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShieldConfig {
    /// Enable proactive capture blocking where the platform supports it.
    ///
    /// Blocking also hides the window from accessibility and casting tools.
    pub block_capture: bool,
    /// Advisory text drawn on the overlay
    pub overlay_message: String,
}

impl Default for ShieldConfig {
    fn default() -> Self {
        Self {
            block_capture: true,
            overlay_message: DEFAULT_OVERLAY_MESSAGE.to_string(),
        }
    }
}

impl ShieldConfig {
    /// Parse from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("Failed to parse shield config: {}", e)))
    }

    /// Overlay the controller should draw
    pub fn overlay_spec(&self) -> OverlaySpec {
        OverlaySpec::with_message(self.overlay_message.clone())
    }
}
