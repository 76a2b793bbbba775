use thiserror::Error;

/// Errors raised by the frame engines.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("{engine} engine used before initialize()")]
    NotInitialized { engine: &'static str },
    #[error("invalid bounds {width}x{height}: both dimensions must be positive and finite")]
    InvalidBounds { width: f32, height: f32 },
    #[error("invalid engine parameters: {0}")]
    InvalidParams(String),
    #[error("invalid sampling range: {0}")]
    Distribution(#[from] rand::distr::uniform::Error),
    #[error("molecule capacity of {capacity} reached")]
    MoleculeCapacity { capacity: usize },
}

impl From<anyhow::Error> for EngineError {
    fn from(err: anyhow::Error) -> Self {
        EngineError::InvalidParams(err.to_string())
    }
}
