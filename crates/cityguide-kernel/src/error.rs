//! Kernel-specific error types.

use crate::graph::GraphError;
use cityguide_types::error::CityGuideError;
use thiserror::Error;

/// Kernel error type wrapping the shared and graph errors.
#[derive(Error, Debug)]
pub enum KernelError {
    /// A wrapped CityGuideError.
    #[error(transparent)]
    CityGuide(#[from] CityGuideError),

    /// The communication graph is invalid.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// The kernel failed to boot.
    #[error("Boot failed: {0}")]
    BootFailed(String),
}

/// Alias for kernel results.
pub type KernelResult<T> = Result<T, KernelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transparent_display() {
        let err: KernelError = GraphError::SelfLoop("Cultural Curator".to_string()).into();
        assert_eq!(
            err.to_string(),
            "Agent 'Cultural Curator' may not forward to itself"
        );
        let err: KernelError = CityGuideError::InvalidInput("empty message".to_string()).into();
        assert_eq!(err.to_string(), "Invalid input: empty message");
    }
}
