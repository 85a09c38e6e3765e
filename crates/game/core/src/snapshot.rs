//! Whole-match state and its rollback snapshots.
//!
//! Everything the simulation reads lives in [`MatchState`]; collaborators in
//! `env` are stateless. A snapshot is therefore just the bincode encoding of
//! the state, and restoring it then replaying the same input reproduces the
//! same state root tick for tick.

use crate::common::EntityId;
use crate::config::CoreConfig;
use crate::error::SpawnError;
use crate::registry::{CharList, RootSpec};
use crate::world::WorldContext;

#[cfg(feature = "serde")]
use crate::error::SnapshotError;

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatchState {
    pub world: WorldContext,
    pub chars: CharList,
}

impl MatchState {
    pub fn new(config: CoreConfig, seed: u64) -> Self {
        Self {
            world: WorldContext::new(config, seed),
            chars: CharList::new(),
        }
    }

    pub fn tick(&self) -> u64 {
        self.world.tick
    }

    pub fn spawn_root(&mut self, spec: RootSpec) -> Result<EntityId, SpawnError> {
        self.chars.spawn_root(spec, &self.world)
    }
}

/// Opaque encoded [`MatchState`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot(Vec<u8>);

impl Snapshot {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(feature = "serde")]
impl MatchState {
    pub fn snapshot(&self) -> Result<Snapshot, SnapshotError> {
        bincode::serialize(self)
            .map(Snapshot)
            .map_err(|e| SnapshotError::Encode(e.to_string()))
    }

    pub fn restore(snapshot: &Snapshot) -> Result<Self, SnapshotError> {
        bincode::deserialize(snapshot.as_bytes()).map_err(|e| SnapshotError::Decode(e.to_string()))
    }

    /// SHA-256 over the snapshot encoding.
    ///
    /// Two simulations that agree on every field agree on the root, so peers
    /// can compare roots instead of full states to detect desyncs.
    pub fn state_root(&self) -> Result<[u8; 32], SnapshotError> {
        use sha2::{Digest, Sha256};

        let snapshot = self.snapshot()?;
        let mut hasher = Sha256::new();
        hasher.update(snapshot.as_bytes());
        Ok(hasher.finalize().into())
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;
    use crate::common::TeamSide;

    fn match_state() -> MatchState {
        let mut state = MatchState::new(CoreConfig::new(), 7);
        state
            .spawn_root(RootSpec::new(TeamSide::One, 0).at(-40.0))
            .unwrap();
        state
            .spawn_root(RootSpec::new(TeamSide::Two, 1).at(40.0))
            .unwrap();
        state
    }

    #[test]
    fn restore_reproduces_the_state() {
        let state = match_state();
        let snapshot = state.snapshot().unwrap();
        let restored = MatchState::restore(&snapshot).unwrap();
        assert_eq!(restored, state);
        assert_eq!(restored.state_root().unwrap(), state.state_root().unwrap());
    }

    #[test]
    fn any_change_moves_the_root() {
        let state = match_state();
        let mut moved = state.clone();
        if let Some(c) = moved.chars.get_mut(EntityId(1)) {
            c.pos.x += 0.5;
        }
        assert_ne!(moved.state_root().unwrap(), state.state_root().unwrap());
    }

    #[test]
    fn garbage_fails_to_decode() {
        let err = MatchState::restore(&Snapshot::from_bytes(vec![1, 2, 3])).unwrap_err();
        assert!(matches!(err, SnapshotError::Decode(_)));
    }
}
