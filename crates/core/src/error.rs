/// Errors produced by the pure domain layer.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A configuration value could not be parsed.
    #[error("Invalid setting {name}: {reason}")]
    Setting { name: &'static str, reason: String },

    /// The bearer credential could not be decoded into identity claims.
    #[error("Invalid credential: {0}")]
    Credential(String),
}
