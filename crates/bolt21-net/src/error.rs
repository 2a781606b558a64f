//! Error types

/// Trust bootstrap errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed pin or pinned domain
    #[error("Invalid pin configuration: {0}")]
    InvalidPin(String),

    /// Same host configured twice
    #[error("Duplicate pinned domain: {0}")]
    DuplicateDomain(String),

    /// Bootstrap already ran for this process
    #[error("Pinning policy already initialized")]
    AlreadyInitialized,

    /// Bootstrap has not run yet
    #[error("Pinning policy not initialized")]
    NotInitialized,

    /// TLS error
    #[error("TLS error: {0}")]
    Tls(String),

    /// Configuration parse error
    #[error("Config error: {0}")]
    Config(String),
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
