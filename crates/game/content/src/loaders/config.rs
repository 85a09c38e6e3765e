//! Core ruleset configuration loader.

use std::path::Path;

use fight_core::CoreConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for [`CoreConfig`] from TOML files.
///
/// Missing keys keep their defaults, so a file only lists what it changes.
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load(path: &Path) -> LoadResult<CoreConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<CoreConfig> {
        let config: CoreConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;

        Ok(config)
    }
}
