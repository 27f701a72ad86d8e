use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrimurtiError {
    #[error("Parse error in {source_name} output: {message}")]
    ParseError {
        source_name: String,
        message: String,
    },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("File error: {path:?} - {message}")]
    FileError {
        path: PathBuf,
        message: String,
    },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type TrimurtiResult<T> = std::result::Result<T, TrimurtiError>;
