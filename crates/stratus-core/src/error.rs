use thiserror::Error;

#[derive(Debug, Error)]
pub enum StratusError {
    // Input
    #[error("validation error: {0}")]
    Validation(String),

    // Remote authority
    #[error("remote call failed: {0}")]
    Remote(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// The removal phase of a reconciliation ran but the addition phase was
    /// never applied. The role holds neither the old nor the desired grant
    /// set; the caller must re-fetch and re-diff before retrying.
    #[error("role '{role}' left partially reconciled, re-read before retrying: {source}")]
    PartialReconciliation {
        role: String,
        #[source]
        source: Box<StratusError>,
    },

    // Serialization
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Config
    #[error("configuration error: {0}")]
    Config(String),

    #[error("configuration file not found at {0}")]
    ConfigNotFound(String),

    // IO
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, StratusError>;
