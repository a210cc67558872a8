use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// The operation is not legal for the entity's current state.
    #[error("Invalid transition for {entity} {id}: {from} -> {to}")]
    InvalidTransition {
        entity: &'static str,
        id: DbId,
        from: String,
        to: String,
    },

    /// A leave request collides with teaching duty or another approved leave.
    #[error("Schedule conflict: {0}")]
    ScheduleConflict(String),

    #[error("Leave duration of {days} days exceeds the maximum of {max} days")]
    DurationExceeded { days: i64, max: i64 },

    #[error("Invalid substitute: {0}")]
    InvalidSubstitute(String),

    /// A terminal entity was asked to change again.
    #[error("{entity} {id} has already been processed (status: {status})")]
    AlreadyProcessed {
        entity: &'static str,
        id: DbId,
        status: String,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Stable machine-readable code used in API error bodies and per-item
    /// bulk results.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::NotFound { .. } => "NOT_FOUND",
            CoreError::Validation(_) => "VALIDATION_ERROR",
            CoreError::InvalidTransition { .. } => "INVALID_TRANSITION",
            CoreError::ScheduleConflict(_) => "SCHEDULE_CONFLICT",
            CoreError::DurationExceeded { .. } => "DURATION_EXCEEDED",
            CoreError::InvalidSubstitute(_) => "INVALID_SUBSTITUTE",
            CoreError::AlreadyProcessed { .. } => "ALREADY_PROCESSED",
            CoreError::Conflict(_) => "CONFLICT",
            CoreError::Unauthorized(_) => "UNAUTHORIZED",
            CoreError::Forbidden(_) => "FORBIDDEN",
            CoreError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
