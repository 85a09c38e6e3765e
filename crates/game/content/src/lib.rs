//! Data-driven fight content and its loaders.
//!
//! This crate reads authored data files into `fight-core` types:
//! - Core ruleset configuration (TOML)
//! - Match rulesets: stage bounds and fighter placement (RON)
//! - Animation box tables (RON)
//!
//! Content is handed to the core at match setup or through its oracles and
//! never appears in simulation state on its own.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{
    AnimationLoader, ConfigLoader, ContentFactory, FighterSpec, LoadResult, Ruleset,
    RulesetLoader,
};
