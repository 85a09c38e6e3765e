//! Animation box table loader.

use std::collections::BTreeMap;
use std::path::Path;

use fight_core::env::{AnimationDef, StaticAnimations};

use crate::loaders::{LoadResult, read_file};

/// Loader for animation box tables from RON files.
///
/// The file is a map from animation number to its frames:
///
/// ```text
/// {
///     0: (frames: [(duration: -1, vulnerable: [(left: -15.0, top: -90.0, right: 15.0, bottom: 0.0)])]),
///     200: (frames: [(duration: 4), (duration: 3, attack: [...]), (duration: 8)]),
/// }
/// ```
pub struct AnimationLoader;

impl AnimationLoader {
    pub fn load(path: &Path) -> LoadResult<StaticAnimations> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<StaticAnimations> {
        let table: BTreeMap<i32, AnimationDef> = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse animation RON: {}", e))?;

        let mut anims = StaticAnimations::new();
        for (anim, def) in table {
            if def.frames.is_empty() {
                anyhow::bail!("Animation {} has no frames", anim);
            }
            if let Some(i) = def.frames.iter().position(|f| f.duration == 0 || f.duration < -1) {
                anyhow::bail!("Animation {} frame {} has an invalid duration", anim, i);
            }
            anims.insert(anim, def);
        }

        Ok(anims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fight_core::HitBox;
    use fight_core::env::AnimationOracle;

    const TABLE: &str = r#"
        {
            0: (frames: [(duration: -1, vulnerable: [(left: -15.0, top: -90.0, right: 15.0, bottom: 0.0)])]),
            200: (frames: [
                (duration: 2),
                (duration: 3, attack: [(left: 0.0, top: -80.0, right: 45.0, bottom: -60.0)]),
                (duration: 4),
            ]),
        }
    "#;

    #[test]
    fn frames_resolve_by_elapsed_time() {
        let anims = AnimationLoader::parse(TABLE).unwrap();

        assert!(anims.frame(200, 0).unwrap().attack.is_empty());
        assert_eq!(
            anims.frame(200, 3).unwrap().attack,
            &[HitBox::new(0.0, -80.0, 45.0, -60.0)]
        );
        assert!(anims.frame(200, 6).unwrap().attack.is_empty());
        assert_eq!(anims.frame(0, 500).unwrap().vulnerable.len(), 1);
        assert!(anims.frame(1, 0).is_err());
    }

    #[test]
    fn zero_duration_frame_is_rejected() {
        let err = AnimationLoader::parse("{ 5: (frames: [(duration: 0)]) }").unwrap_err();
        assert!(err.to_string().contains("Animation 5 frame 0"));
    }

    #[test]
    fn empty_animation_is_rejected() {
        assert!(AnimationLoader::parse("{ 5: (frames: []) }").is_err());
    }
}
