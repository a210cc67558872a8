use presensi_core::error::CoreError;

/// Errors returned by engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The database rejected or failed a statement. Any open transaction
    /// has been rolled back.
    #[error("Persistence failure: {0}")]
    Persistence(#[from] sqlx::Error),
}

impl EngineError {
    /// Stable machine-readable code, shared with the API error body.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Core(core) => core.code(),
            EngineError::Persistence(_) => "PERSISTENCE_FAILURE",
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
