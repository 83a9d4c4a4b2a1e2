use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessingError {
    /// Input is not an image in a supported format
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Invalid filter settings: {0}")]
    InvalidSettings(String),

    #[error("Processing task failed: {0}")]
    Task(String),
}

pub type ProcessingResult<T> = Result<T, ProcessingError>;
