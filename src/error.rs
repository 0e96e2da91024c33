use thiserror::Error;

/// Errors that can occur around the normalization engine.
///
/// Extraction itself never fails: missing fields degrade to absent values and
/// unusable candidates become [`crate::model::RejectedCandidate`]s. These
/// variants cover configuration and the storage collaborator.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration could not be loaded or deserialized
    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),

    /// The storage collaborator failed during lookup or commit
    #[error("Storage error: {0}")]
    StoreError(String),

    /// Reading an input file failed
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serializing an outcome failed
    #[error("Serialization error: {0}")]
    SerializeError(#[from] serde_json::Error),
}
