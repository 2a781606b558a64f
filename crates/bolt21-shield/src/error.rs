//! Error types

/// Content protection errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Platform refused a capability (capture blocking, observers)
    #[error("Capability denied: {0}")]
    CapabilityDenied(String),

    /// No window to attach the overlay to
    #[error("No active window")]
    NoActiveWindow,

    /// Overlay attach/detach failed
    #[error("Overlay error: {0}")]
    Overlay(String),

    /// Configuration parse error
    #[error("Config error: {0}")]
    Config(String),
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
