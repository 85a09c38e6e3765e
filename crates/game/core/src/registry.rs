//! Entity registry and run order.
//!
//! `chars` is kept in creation order, which is also ascending id order since
//! ids are never reused. The id index and the run order are rebuilt together
//! whenever the set of entities changes, so they never disagree.

use std::collections::BTreeMap;

use crate::character::{Char, CharConstants, HelperSpec, MoveType};
use crate::common::{EntityId, Facing, TeamSide, Vec3};
use crate::config::CompatibilityMode;
use crate::error::SpawnError;
use crate::flags::{AssertFlags, SystemFlags};
use crate::projectile::{Projectile, ProjectileSpec, ProjectileStage};
use crate::world::WorldContext;

/// Root fighter creation request.
#[derive(Clone, Debug, PartialEq)]
pub struct RootSpec {
    pub team: TeamSide,
    pub player_no: usize,
    pub constants: CharConstants,
    pub compat: CompatibilityMode,
    pub pos: Vec3,
    pub facing: Facing,
}

impl RootSpec {
    pub fn new(team: TeamSide, player_no: usize) -> Self {
        Self {
            team,
            player_no,
            constants: CharConstants::default(),
            compat: CompatibilityMode::default(),
            pos: Vec3::ZERO,
            facing: match team {
                TeamSide::One => Facing::Right,
                TeamSide::Two => Facing::Left,
            },
        }
    }

    pub fn with_constants(mut self, constants: CharConstants) -> Self {
        self.constants = constants;
        self
    }

    pub fn with_compat(mut self, compat: CompatibilityMode) -> Self {
        self.compat = compat;
        self
    }

    pub fn at(mut self, x: f32) -> Self {
        self.pos.x = x;
        self
    }
}

/// Two distinct elements of `items` borrowed mutably at once, in argument
/// order.
pub(crate) fn pair_mut<T>(items: &mut [T], i: usize, j: usize) -> (&mut T, &mut T) {
    debug_assert_ne!(i, j);
    if i < j {
        let (lo, hi) = items.split_at_mut(j);
        (&mut lo[i], &mut hi[0])
    } else {
        let (lo, hi) = items.split_at_mut(i);
        (&mut hi[0], &mut lo[j])
    }
}

/// Scheduling bucket; lower runs first.
fn run_rank(c: &Char) -> u8 {
    if c.asserts.contains(AssertFlags::RUN_FIRST) {
        0
    } else if c.asserts.contains(AssertFlags::RUN_LAST) {
        6
    } else if c.move_type == MoveType::Attack {
        1
    } else {
        let idle = c.move_type == MoveType::Idle;
        match (c.is_helper(), idle) {
            (false, true) => 2,
            (false, false) => 3,
            (true, true) => 4,
            (true, false) => 5,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CharList {
    chars: Vec<Char>,
    index: BTreeMap<EntityId, usize>,
    run_order: Vec<EntityId>,
    projectiles: Vec<Projectile>,
    next_id: u32,
}

impl CharList {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> EntityId {
        self.next_id += 1;
        EntityId(self.next_id)
    }

    fn insert(&mut self, c: Char) -> EntityId {
        let id = c.id;
        self.index.insert(id, self.chars.len());
        self.run_order.push(id);
        self.chars.push(c);
        id
    }

    fn live_chars(&self) -> usize {
        self.chars
            .iter()
            .filter(|c| !c.flags.contains(SystemFlags::DESTROY))
            .count()
    }

    fn live_projectiles(&self) -> usize {
        self.projectiles
            .iter()
            .filter(|p| p.stage != ProjectileStage::Gone)
            .count()
    }

    /// Spawns left before the entity ceiling.
    pub fn entity_room(&self, world: &WorldContext) -> usize {
        world.config.max_entities.saturating_sub(self.live_chars())
    }

    pub fn projectile_room(&self, world: &WorldContext) -> usize {
        world
            .config
            .max_projectiles
            .saturating_sub(self.live_projectiles())
    }

    pub fn spawn_root(&mut self, spec: RootSpec, world: &WorldContext) -> Result<EntityId, SpawnError> {
        if self.entity_room(world) == 0 {
            return Err(SpawnError::EntityLimit {
                limit: world.config.max_entities,
            });
        }
        let id = self.allocate_id();
        let mut c = Char::new_root(id, spec.team, spec.player_no, spec.constants, spec.compat, world);
        c.pos = spec.pos;
        c.facing = spec.facing;
        tracing::debug!(entity = %id, team = ?spec.team, "root spawned");
        Ok(self.insert(c))
    }

    /// Appends a helper; it runs after the current sorted batch.
    pub fn spawn_helper(
        &mut self,
        parent: EntityId,
        spec: &HelperSpec,
        world: &WorldContext,
    ) -> Result<EntityId, SpawnError> {
        if self.entity_room(world) == 0 {
            return Err(SpawnError::EntityLimit {
                limit: world.config.max_entities,
            });
        }
        let id = self.allocate_id();
        let Some(p) = self.get(parent) else {
            return Err(SpawnError::OwnerMissing(parent));
        };
        let c = Char::new_helper(id, p, spec);
        tracing::debug!(entity = %id, %parent, helper_id = spec.helper_id, "helper spawned");
        Ok(self.insert(c))
    }

    pub fn spawn_projectile(
        &mut self,
        owner: EntityId,
        spec: ProjectileSpec,
        world: &WorldContext,
    ) -> Result<EntityId, SpawnError> {
        if self.projectile_room(world) == 0 {
            return Err(SpawnError::ProjectileLimit {
                limit: world.config.max_projectiles,
            });
        }
        let id = self.allocate_id();
        let Some(o) = self.get(owner) else {
            return Err(SpawnError::OwnerMissing(owner));
        };
        let p = Projectile::spawn(id, o, spec, world);
        self.projectiles.push(p);
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn index_of(&self, id: EntityId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    pub fn get(&self, id: EntityId) -> Option<&Char> {
        self.index_of(id).and_then(|i| self.chars.get(i))
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Char> {
        self.index_of(id).and_then(move |i| self.chars.get_mut(i))
    }

    pub fn chars(&self) -> &[Char] {
        &self.chars
    }

    pub(crate) fn chars_mut(&mut self) -> &mut [Char] {
        &mut self.chars
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn projectile(&self, id: EntityId) -> Option<&Projectile> {
        self.projectiles.iter().find(|p| p.id == id)
    }

    /// Live projectiles of `owner` with authored id `proj_id`.
    pub fn projectiles_of(&self, owner: EntityId, proj_id: i32) -> impl Iterator<Item = &Projectile> {
        self.projectiles
            .iter()
            .filter(move |p| p.owner == owner && p.proj_id == proj_id)
    }

    /// Both halves at once, for passes that read characters while writing
    /// projectiles.
    pub(crate) fn split_mut(&mut self) -> (&mut [Char], &mut [Projectile]) {
        (&mut self.chars, &mut self.projectiles)
    }

    pub fn run_order(&self) -> &[EntityId] {
        &self.run_order
    }

    /// Run order as indices into [`chars`](Self::chars).
    pub(crate) fn run_indices(&self) -> Vec<usize> {
        self.run_order
            .iter()
            .filter_map(|&id| self.index_of(id))
            .collect()
    }

    /// Stable sort of the run order by scheduling bucket.
    pub fn sort_run_order(&mut self) {
        let chars = &self.chars;
        let index = &self.index;
        self.run_order.sort_by_key(|id| {
            index
                .get(id)
                .and_then(|&i| chars.get(i))
                .map_or(u8::MAX, run_rank)
        });
    }

    /// Drops destroyed characters and finished projectiles, then rebuilds the
    /// index and run order.
    pub fn compact(&mut self) {
        let before = self.chars.len();
        self.chars.retain(|c| !c.flags.contains(SystemFlags::DESTROY));
        self.projectiles.retain(|p| p.stage != ProjectileStage::Gone);
        if self.chars.len() != before {
            tracing::trace!(removed = before - self.chars.len(), "compacted characters");
        }

        self.index = self
            .chars
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id, i))
            .collect();
        let index = &self.index;
        self.run_order.retain(|id| index.contains_key(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoreConfig;

    fn two_fighters(world: &WorldContext) -> (CharList, EntityId, EntityId) {
        let mut list = CharList::new();
        let a = list
            .spawn_root(RootSpec::new(TeamSide::One, 0).at(-50.0), world)
            .unwrap();
        let b = list
            .spawn_root(RootSpec::new(TeamSide::Two, 1).at(50.0), world)
            .unwrap();
        (list, a, b)
    }

    #[test]
    fn ids_are_monotonic_and_resolve() {
        let world = WorldContext::default();
        let (mut list, a, b) = two_fighters(&world);
        assert!(a < b);
        let h = list.spawn_helper(a, &HelperSpec::new(1, 1000), &world).unwrap();
        assert!(h > b);
        assert_eq!(list.get(h).map(|c| c.root), Some(a));
        assert_eq!(list.get(b).map(|c| c.facing), Some(Facing::Left));
    }

    #[test]
    fn entity_ceiling_rejects_spawns() {
        let world = WorldContext::new(CoreConfig::new().with_max_entities(2), 0);
        let (mut list, a, _) = two_fighters(&world);
        assert_eq!(
            list.spawn_helper(a, &HelperSpec::new(1, 1000), &world),
            Err(SpawnError::EntityLimit { limit: 2 })
        );
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn missing_owner_is_reported() {
        let world = WorldContext::default();
        let mut list = CharList::new();
        assert_eq!(
            list.spawn_helper(EntityId(7), &HelperSpec::new(1, 1000), &world),
            Err(SpawnError::OwnerMissing(EntityId(7)))
        );
    }

    #[test]
    fn run_order_buckets_are_stable() {
        let world = WorldContext::default();
        let (mut list, a, b) = two_fighters(&world);
        let h = list.spawn_helper(a, &HelperSpec::new(1, 1000), &world).unwrap();
        let c = list
            .spawn_root(RootSpec::new(TeamSide::Two, 2), &world)
            .unwrap();

        list.get_mut(c).unwrap().move_type = MoveType::Attack;
        list.get_mut(a).unwrap().asserts = AssertFlags::RUN_LAST;
        list.get_mut(h).unwrap().asserts = AssertFlags::RUN_FIRST;
        list.sort_run_order();
        assert_eq!(list.run_order(), &[h, c, b, a]);
    }

    #[test]
    fn compaction_keeps_index_consistent() {
        let world = WorldContext::default();
        let (mut list, a, b) = two_fighters(&world);
        let h = list.spawn_helper(a, &HelperSpec::new(1, 1000), &world).unwrap();
        let h2 = list.spawn_helper(a, &HelperSpec::new(2, 1000), &world).unwrap();

        list.get_mut(h).unwrap().flags.insert(SystemFlags::DESTROY);
        list.compact();

        assert!(list.get(h).is_none());
        assert_eq!(list.get(h2).map(|c| c.id), Some(h2));
        assert_eq!(list.get(b).map(|c| c.id), Some(b));
        assert_eq!(list.run_order(), &[a, b, h2]);
    }

    #[test]
    fn every_spawn_kind_shares_one_id_sequence() {
        let world = WorldContext::default();
        let (mut list, a, b) = two_fighters(&world);
        let shot = list
            .spawn_projectile(a, ProjectileSpec::new(Default::default()), &world)
            .unwrap();
        assert!(list.spawn_helper(EntityId(40), &HelperSpec::new(1, 1000), &world).is_err());
        let h = list.spawn_helper(b, &HelperSpec::new(1, 1000), &world).unwrap();
        assert!(a < b && b < shot && shot < h);
        assert!(list.get(shot).is_none());
        assert_eq!(list.projectile(shot).map(|p| p.owner), Some(a));
    }

    #[test]
    fn run_indices_follow_the_sorted_order() {
        let world = WorldContext::default();
        let (mut list, a, _) = two_fighters(&world);
        list.get_mut(a).unwrap().asserts = AssertFlags::RUN_LAST;
        list.sort_run_order();
        assert_eq!(list.run_indices(), vec![1, 0]);
    }

    #[test]
    fn pair_mut_returns_argument_order() {
        let world = WorldContext::default();
        let (mut list, a, b) = two_fighters(&world);
        let (x, y) = pair_mut(list.chars_mut(), 1, 0);
        assert_eq!((x.id, y.id), (b, a));
    }
}
