use thiserror::Error;

use crate::domain::models::MatchStatus;

/// Error taxonomy for the league engine.
///
/// `Validation`, `State` and `NotFound` are recoverable: nothing was written
/// and the caller may retry with corrected input. `Persistence` means the
/// enclosing transaction was aborted and should be treated as an incident.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0}")]
    Validation(String),

    #[error("match {match_id}: cannot {action} while status is '{status}'")]
    State {
        match_id: i64,
        action: &'static str,
        status: MatchStatus,
    },

    #[error("{0} not found")]
    NotFound(String),

    #[error(transparent)]
    Persistence(#[from] anyhow::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        EngineError::Validation(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        EngineError::NotFound(what.into())
    }
}
