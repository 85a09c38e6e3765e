//! Content factory for building match inputs from a data directory.

use std::path::{Path, PathBuf};

use fight_core::{CoreConfig, StaticAnimations};

use crate::loaders::{AnimationLoader, ConfigLoader, LoadResult, Ruleset, RulesetLoader};

/// Content factory that loads all fight content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml
/// ├── rulesets/
/// │   ├── duel.ron
/// │   └── tag.ron
/// └── animations/
///     └── kung_fu_man.ron
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load the core configuration from `config.toml`.
    pub fn load_config(&self) -> LoadResult<CoreConfig> {
        let path = self.data_dir.join("config.toml");
        ConfigLoader::load(&path)
    }

    /// Load `rulesets/{name}.ron`.
    ///
    /// When `config.toml` exists it replaces the ruleset's own `config`
    /// section, so one directory shares a single configuration.
    pub fn load_ruleset(&self, name: &str) -> LoadResult<Ruleset> {
        let path = self.data_dir.join("rulesets").join(format!("{}.ron", name));
        let mut ruleset = RulesetLoader::load(&path)?;
        if self.data_dir.join("config.toml").is_file() {
            ruleset.config = self.load_config()?;
            ruleset.validate()?;
        }
        Ok(ruleset)
    }

    /// Load `animations/{name}.ron`.
    pub fn load_animations(&self, name: &str) -> LoadResult<StaticAnimations> {
        let path = self
            .data_dir
            .join("animations")
            .join(format!("{}.ron", name));
        AnimationLoader::load(&path)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
