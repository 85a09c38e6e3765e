//! Oracle access errors.

use crate::error::{ErrorSeverity, GameError};

/// Errors raised by collaborators the core consults but does not own.
///
/// None of these abort a tick: the scheduler logs them and treats the missing
/// data as empty.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OracleError {
    #[error("animation {0} not found")]
    AnimationNotFound(i32),

    #[error("animation {anim} has no frame at tick {elapsed}")]
    FrameNotFound { anim: i32, elapsed: i32 },
}

impl GameError for OracleError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        use OracleError::*;
        match self {
            AnimationNotFound(_) => "ORACLE_ANIMATION_NOT_FOUND",
            FrameNotFound { .. } => "ORACLE_FRAME_NOT_FOUND",
        }
    }
}
