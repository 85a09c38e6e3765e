//! Match ruleset loader.
//!
//! A ruleset fixes everything a match needs before the first tick: the core
//! configuration, the stage extent and where each fighter starts.

use std::path::Path;

use serde::{Deserialize, Serialize};

use fight_core::{
    CharConstants, CompatibilityMode, CoreConfig, EntityId, MatchState, RootSpec, StageBounds,
    TeamSide,
};

use crate::loaders::{LoadResult, read_file};

/// One fighter's starting placement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FighterSpec {
    pub team: TeamSide,
    pub player_no: usize,
    /// Starting x in world units.
    pub x: f32,
    #[serde(default)]
    pub constants: CharConstants,
    /// Per-fighter override of the ruleset's compatibility mode.
    #[serde(default)]
    pub compat: Option<CompatibilityMode>,
}

impl FighterSpec {
    fn root_spec(&self, config: &CoreConfig) -> RootSpec {
        RootSpec::new(self.team, self.player_no)
            .with_constants(self.constants)
            .with_compat(self.compat.unwrap_or(config.compatibility))
            .at(self.x)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Ruleset {
    #[serde(default)]
    pub config: CoreConfig,
    #[serde(default)]
    pub stage: StageBounds,
    pub fighters: Vec<FighterSpec>,
}

impl Ruleset {
    /// Rejects rulesets the core would silently misbehave on.
    pub fn validate(&self) -> LoadResult<()> {
        let StageBounds { left, right } = self.stage;
        if !(left.is_finite() && right.is_finite() && left < right) {
            anyhow::bail!("Invalid stage bounds: left {} must be below right {}", left, right);
        }
        if self.fighters.len() > self.config.max_entities {
            anyhow::bail!(
                "{} fighters exceed the entity ceiling of {}",
                self.fighters.len(),
                self.config.max_entities
            );
        }
        for (i, fighter) in self.fighters.iter().enumerate() {
            if !(left..=right).contains(&fighter.x) {
                anyhow::bail!("Fighter {} starts outside the stage at x = {}", i, fighter.x);
            }
            if let Some(dup) = self.fighters[..i]
                .iter()
                .find(|other| other.player_no == fighter.player_no)
            {
                anyhow::bail!(
                    "Fighters share player number {} (teams {:?} and {:?})",
                    fighter.player_no,
                    dup.team,
                    fighter.team
                );
            }
        }
        Ok(())
    }

    /// Builds the opening match state, spawning fighters in file order.
    pub fn into_match(self, seed: u64) -> LoadResult<(MatchState, Vec<EntityId>)> {
        self.validate()?;

        let mut state = MatchState::new(self.config, seed);
        state.world.stage = self.stage;

        let mut ids = Vec::with_capacity(self.fighters.len());
        for fighter in &self.fighters {
            let spec = fighter.root_spec(&state.world.config);
            let id = state.spawn_root(spec).map_err(|e| {
                anyhow::anyhow!("Failed to spawn player {}: {}", fighter.player_no, e)
            })?;
            ids.push(id);
        }

        Ok((state, ids))
    }
}

/// Loader for [`Ruleset`] from RON files.
pub struct RulesetLoader;

impl RulesetLoader {
    pub fn load(path: &Path) -> LoadResult<Ruleset> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<Ruleset> {
        let ruleset: Ruleset = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse ruleset RON: {}", e))?;
        ruleset.validate()?;

        Ok(ruleset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fight_core::Facing;

    const DUEL: &str = r#"
        (
            config: (compatibility: legacy, max_entities: 16),
            stage: (left: -300.0, right: 300.0),
            fighters: [
                (team: One, player_no: 0, x: -70.0),
                (
                    team: Two,
                    player_no: 1,
                    x: 70.0,
                    constants: (life: 1200, attack: 110),
                    compat: Some(current),
                ),
            ],
        )
    "#;

    #[test]
    fn duel_spawns_both_fighters() {
        let ruleset = RulesetLoader::parse(DUEL).unwrap();
        let (state, ids) = ruleset.into_match(9).unwrap();

        assert_eq!(ids.len(), 2);
        assert_eq!(state.world.stage, StageBounds { left: -300.0, right: 300.0 });
        assert_eq!(state.world.seed, 9);

        let p1 = state.chars.get(ids[0]).unwrap();
        assert_eq!(p1.pos.x, -70.0);
        assert_eq!(p1.facing, Facing::Right);
        assert_eq!(p1.compat, CompatibilityMode::Legacy);
        assert_eq!(p1.life, 1000);

        let p2 = state.chars.get(ids[1]).unwrap();
        assert_eq!(p2.facing, Facing::Left);
        assert_eq!(p2.compat, CompatibilityMode::Current);
        assert_eq!(p2.life, 1200);
        assert_eq!(p2.constants.attack, 110);
        assert_eq!(p2.constants.defence, 100);
    }

    #[test]
    fn fighter_outside_the_stage_is_rejected() {
        let err = RulesetLoader::parse(
            r#"(stage: (left: -100.0, right: 100.0), fighters: [(team: One, player_no: 0, x: 150.0)])"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("outside the stage"));
    }

    #[test]
    fn duplicate_player_numbers_are_rejected() {
        let err = RulesetLoader::parse(
            r#"(fighters: [(team: One, player_no: 0, x: 0.0), (team: Two, player_no: 0, x: 10.0)])"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("player number 0"));
    }

    #[test]
    fn inverted_stage_is_rejected() {
        let ruleset = Ruleset {
            stage: StageBounds { left: 10.0, right: -10.0 },
            ..Ruleset::default()
        };
        assert!(ruleset.into_match(0).is_err());
    }
}
