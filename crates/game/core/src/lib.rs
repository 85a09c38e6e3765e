//! Deterministic combat core for a 2D fighting-game engine.
//!
//! `fight-core` owns attack declarations, hit resolution, reaction state,
//! projectiles, body push and the per-tick scheduler. Rendering, input
//! devices and content parsing live elsewhere and reach the core through the
//! collaborators in [`env`]. All state mutation flows through
//! [`engine::FightEngine`], and a [`MatchState`] can be snapshotted and
//! restored for rollback.
pub mod character;
pub mod collision;
pub mod common;
pub mod config;
pub mod damage;
pub mod engine;
pub mod env;
pub mod error;
pub mod filters;
pub mod flags;
pub mod geometry;
pub mod gethitvar;
pub mod hitdef;
pub mod projectile;
mod push;
pub mod registry;
pub mod resolve;
pub mod snapshot;
pub mod world;

pub use character::{
    AnimCursor, Bind, Char, CharConstants, Effect, EntitySummary, HelperSpec, MoveType, Physics,
    StateController, StateType,
};
pub use collision::HitEvent;
pub use common::{EntityId, Facing, TeamSide, Vec3};
pub use config::{CompatibilityMode, CoreConfig, GainMultipliers, ReactionStates, Rounding};
pub use damage::{DamageRequest, LifeMeter, compute_damage};
pub use engine::{FightEngine, TickPhase, TickReport};
pub use env::{
    AnimationOracle, BehaviorProgram, CommandSource, Env, FightEnv, IdleProgram, NoInput, PcgRng,
    RngOracle, ScriptedInput, StaticAnimations,
};
pub use error::{ErrorContext, ErrorSeverity, GameError, SnapshotError, SpawnError, StateError};
pub use filters::{HitByFilter, HitOverride};
pub use flags::{
    AssertFlags, AttackAttr, CommandBuffer, GuardFlags, HitFlags, OverrideFlags, SystemFlags,
};
pub use geometry::{BoxSet, HitBox, boxes_overlap, depth_ranges_overlap};
pub use gethitvar::GetHitVar;
pub use hitdef::{HitDef, Priority, TradeType};
pub use projectile::{Projectile, ProjectileSpec, ProjectileStage};
pub use registry::{CharList, RootSpec};
pub use resolve::{Arbitration, HitOutcome, Rejection};
pub use snapshot::{MatchState, Snapshot};
pub use world::{StageBounds, WorldContext};
