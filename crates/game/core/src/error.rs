//! Common error infrastructure for fight-core.
//!
//! A fighting match must keep running at a stable tick rate even when content
//! is malformed, so almost nothing here aborts a tick. Errors exist to be
//! returned to the behavior program or logged by the scheduler; the entity
//! that caused one loses at most its own step for the tick.
//!
//! "No valid target" is never an error; lookups return `Option`.

use crate::common::EntityId;

/// Severity level of an error, used for categorization and recovery strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// A budget was exhausted; the request is skipped and the tick continues.
    Recoverable,

    /// Malformed content; a safe default was (or can be) substituted.
    Validation,

    /// An invariant was violated; only the offending entity's step is lost.
    Internal,

    /// Simulation state can no longer be trusted.
    Fatal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Contextual information attached to errors for diagnostics.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ErrorContext {
    /// Entity whose step produced the error.
    pub entity: Option<EntityId>,

    /// Logic tick at the time of error.
    pub tick: u64,

    /// State number the entity was executing, if relevant.
    pub state_no: Option<i32>,
}

impl ErrorContext {
    #[must_use]
    pub const fn new(tick: u64) -> Self {
        Self {
            entity: None,
            tick,
            state_no: None,
        }
    }

    #[must_use]
    pub const fn with_entity(mut self, entity: EntityId) -> Self {
        self.entity = Some(entity);
        self
    }

    #[must_use]
    pub const fn with_state(mut self, state_no: i32) -> Self {
        self.state_no = Some(state_no);
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Common trait for all fight-core errors.
///
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
pub trait GameError: core::fmt::Display + core::fmt::Debug {
    fn severity(&self) -> ErrorSeverity;

    fn context(&self) -> Option<&ErrorContext> {
        None
    }

    /// Static identifier for this error variant, for logs and tests.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

/// A spawn request that was skipped.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SpawnError {
    #[error("entity ceiling of {limit} reached")]
    EntityLimit { limit: usize },

    #[error("projectile ceiling of {limit} reached")]
    ProjectileLimit { limit: usize },

    #[error("spawn owner {0} does not resolve")]
    OwnerMissing(EntityId),
}

impl GameError for SpawnError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::EntityLimit { .. } | Self::ProjectileLimit { .. } => ErrorSeverity::Recoverable,
            Self::OwnerMissing(_) => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::EntityLimit { .. } => "SPAWN_ENTITY_LIMIT",
            Self::ProjectileLimit { .. } => "SPAWN_PROJECTILE_LIMIT",
            Self::OwnerMissing(_) => "SPAWN_OWNER_MISSING",
        }
    }
}

/// Problems raised while driving an entity's state machine.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    #[error("state {requested} out of range, fell back to {fallback}")]
    OutOfRange {
        requested: i32,
        fallback: i32,
        context: ErrorContext,
    },

    #[error("state loop guard of {limit} exceeded")]
    LoopGuard { limit: u32, context: ErrorContext },

    #[error("target slot {index} out of range ({len} targets), clamped")]
    TargetIndex {
        index: usize,
        len: usize,
        context: ErrorContext,
    },
}

impl GameError for StateError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::OutOfRange { .. } | Self::TargetIndex { .. } => ErrorSeverity::Validation,
            Self::LoopGuard { .. } => ErrorSeverity::Internal,
        }
    }

    fn context(&self) -> Option<&ErrorContext> {
        match self {
            Self::OutOfRange { context, .. }
            | Self::LoopGuard { context, .. }
            | Self::TargetIndex { context, .. } => Some(context),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::OutOfRange { .. } => "STATE_OUT_OF_RANGE",
            Self::LoopGuard { .. } => "STATE_LOOP_GUARD",
            Self::TargetIndex { .. } => "STATE_TARGET_INDEX",
        }
    }
}

/// Snapshot encode/decode failure.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("failed to encode snapshot: {0}")]
    Encode(String),

    #[error("failed to decode snapshot: {0}")]
    Decode(String),
}

impl GameError for SnapshotError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Fatal
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Encode(_) => "SNAPSHOT_ENCODE",
            Self::Decode(_) => "SNAPSHOT_DECODE",
        }
    }
}
