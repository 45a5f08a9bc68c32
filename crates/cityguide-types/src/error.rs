//! Shared error types for the City Guide system.

use thiserror::Error;

/// Top-level error type for the City Guide system.
#[derive(Error, Debug)]
pub enum CityGuideError {
    /// The requested agent was not declared.
    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    /// A manifest referenced a tool that no collaborator provides.
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// The caller supplied unusable input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A configuration error occurred.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The cache storage backend failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The language model capability failed.
    #[error("LLM driver error: {0}")]
    LlmDriver(String),

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Alias for Result with CityGuideError.
pub type CityGuideResult<T> = Result<T, CityGuideError>;
