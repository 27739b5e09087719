use super::config::ConfigError;
use crate::core::io::traits::IoError;
use crate::core::models::chain::ChainError;
use crate::core::profile::ProfileError;
use crate::core::surface::grid::SurfaceError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Surface error: {source}")]
    Surface {
        #[from]
        source: SurfaceError,
    },

    #[error("Path error: {source}")]
    Chain {
        #[from]
        source: ChainError,
    },

    #[error("Profile post-processing failed: {source}")]
    Profile {
        #[from]
        source: ProfileError,
    },

    #[error("Failed to read input file '{path}': {source}", path = path.display())]
    Input { path: PathBuf, source: IoError },

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid step size (dx = {dx}, dy = {dy}); steps must be finite and non-negative")]
    InvalidStepSize { dx: f64, dy: f64 },

    #[error("Cannot move node {index} to ({x}, {y}); the position lies outside the surface")]
    PositionOutOfBounds { index: usize, x: f64, y: f64 },
}

impl EngineError {
    /// Whether the error stems from a non-finite energy during evaluation.
    pub fn is_numeric_domain(&self) -> bool {
        matches!(
            self,
            EngineError::Chain {
                source: ChainError::NumericDomain { .. }
            }
        )
    }
}
