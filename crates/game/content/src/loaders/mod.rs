//! Content loaders for reading fight data from files.
//!
//! Each loader turns one RON or TOML file into a `fight-core` type.

pub mod animations;
pub mod config;
pub mod factory;
pub mod ruleset;

pub use animations::AnimationLoader;
pub use config::ConfigLoader;
pub use factory::ContentFactory;
pub use ruleset::{FighterSpec, Ruleset, RulesetLoader};

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
