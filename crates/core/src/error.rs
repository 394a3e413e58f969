#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Required fields are missing or malformed. Blocks the call; nothing is persisted.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// An import payload or stored document does not have the expected shape.
    #[error("Invalid format: {0}")]
    Format(String),

    /// The durable storage capability could not be read or written.
    #[error("Storage error: {0}")]
    Storage(String),
}
