//! The surface a behavior program drives its entity through.
//!
//! A program gets exclusive access to its own [`Char`] and a read-only view of
//! everyone else as they were at the start of the tick. Anything that touches
//! another entity or the registry is recorded as an [`Effect`] and applied by
//! the scheduler once the program returns.

use super::{Bind, Char, MoveType, Physics, StateType};
use crate::common::{EntityId, Facing, TeamSide, Vec3};
use crate::env::BehaviorProgram;
use crate::error::{ErrorContext, SpawnError, StateError};
use crate::filters::{HitByFilter, HitOverride};
use crate::flags::{AssertFlags, AttackAttr, SystemFlags};
use crate::hitdef::HitDef;
use crate::projectile::ProjectileSpec;
use crate::world::WorldContext;

/// What a program may know about other entities.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EntitySummary {
    pub id: EntityId,
    pub root: EntityId,
    pub team: TeamSide,
    pub is_helper: bool,
    pub pos: Vec3,
    pub facing: Facing,
    pub life: i32,
    pub state_no: i32,
    pub move_type: MoveType,
    pub state_type: StateType,
    pub inert: bool,
    pub ko: bool,
}

impl EntitySummary {
    pub fn of(c: &Char) -> Self {
        Self {
            id: c.id,
            root: c.root,
            team: c.team,
            is_helper: c.is_helper(),
            pos: c.pos,
            facing: c.facing,
            life: c.life,
            state_no: c.state_no,
            move_type: c.move_type,
            state_type: c.state_type,
            inert: c.is_inert(),
            ko: c.is_ko(),
        }
    }
}

/// Helper creation request.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HelperSpec {
    pub helper_id: i32,
    pub state_no: i32,
    /// Offset from the parent, world units, `x` along the parent's facing.
    pub offset: Vec3,
    pub flip_facing: bool,
    pub pushable: bool,
}

impl HelperSpec {
    pub fn new(helper_id: i32, state_no: i32) -> Self {
        Self {
            helper_id,
            state_no,
            offset: Vec3::ZERO,
            flip_facing: false,
            pushable: false,
        }
    }

    pub fn with_offset(mut self, offset: Vec3) -> Self {
        self.offset = offset;
        self
    }
}

/// Deferred mutation requested by a program.
///
/// Target effects name one target, or every current target when `target` is
/// `None`; ids that are not current targets are ignored.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    SpawnHelper(HelperSpec),
    SpawnProjectile(ProjectileSpec),
    TargetState {
        target: Option<EntityId>,
        state_no: i32,
    },
    TargetLifeAdd {
        target: Option<EntityId>,
        amount: i32,
        kill: bool,
        absolute: bool,
    },
    TargetBind {
        target: Option<EntityId>,
        offset: Vec3,
        time: i32,
    },
    Pause {
        time: i32,
        move_time: i32,
    },
}

/// Spawns still allowed this tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct SpawnBudget {
    pub entities: usize,
    pub projectiles: usize,
}

pub struct StateController<'a> {
    me: &'a mut Char,
    others: &'a [EntitySummary],
    world: &'a WorldContext,
    effects: &'a mut Vec<Effect>,
    budget: &'a mut SpawnBudget,
}

impl<'a> StateController<'a> {
    pub(crate) fn new(
        me: &'a mut Char,
        others: &'a [EntitySummary],
        world: &'a WorldContext,
        effects: &'a mut Vec<Effect>,
        budget: &'a mut SpawnBudget,
    ) -> Self {
        Self {
            me,
            others,
            world,
            effects,
            budget,
        }
    }

    /// Steps `program` until it stops changing state.
    ///
    /// Each state change re-runs the program in the same tick so the new state
    /// gets its first frame immediately. Exceeding the configured number of
    /// changes aborts the step.
    pub(crate) fn run<P>(&mut self, program: &P) -> Result<(), StateError>
    where
        P: BehaviorProgram + ?Sized,
    {
        let limit = self.world.config.state_loop_guard;
        loop {
            let before = self.me.state_changes;
            program.step(self);
            if self.me.state_changes == before {
                return Ok(());
            }
            if self.me.state_changes >= limit {
                return Err(StateError::LoopGuard {
                    limit,
                    context: self.context(),
                });
            }
        }
    }

    fn context(&self) -> ErrorContext {
        ErrorContext::new(self.world.tick)
            .with_entity(self.me.id)
            .with_state(self.me.state_no)
    }

    pub fn me(&self) -> &Char {
        self.me
    }

    pub fn world(&self) -> &WorldContext {
        self.world
    }

    pub fn tick(&self) -> u64 {
        self.world.tick
    }

    /// Every entity as of the start of this tick, in registry order.
    pub fn entities(&self) -> &[EntitySummary] {
        self.others
    }

    pub fn entity(&self, id: EntityId) -> Option<&EntitySummary> {
        self.others.iter().find(|e| e.id == id)
    }

    /// Closest opposing root fighter by horizontal distance, lowest id on ties.
    pub fn nearest_enemy(&self) -> Option<&EntitySummary> {
        let me = &*self.me;
        self.others
            .iter()
            .filter(|e| e.team != me.team && !e.is_helper && !e.inert)
            .min_by(|a, b| {
                let da = (a.pos.x - me.pos.x).abs();
                let db = (b.pos.x - me.pos.x).abs();
                da.total_cmp(&db).then(a.id.cmp(&b.id))
            })
    }

    // ===== state machine =====

    pub fn change_state(&mut self, state_no: i32) {
        if let Err(err) = self.me.change_state(state_no, self.world) {
            tracing::warn!(entity = %self.me.id, error = %err, "state change substituted");
        }
    }

    pub fn set_move_type(&mut self, move_type: MoveType) {
        self.me.set_move_type(move_type);
    }

    pub fn set_state_type(&mut self, state_type: StateType) {
        self.me.set_state_type(state_type);
    }

    pub fn set_physics(&mut self, physics: Physics) {
        self.me.physics = physics;
    }

    pub fn set_ctrl(&mut self, ctrl: bool) {
        self.me.flags.set(SystemFlags::CTRL, ctrl);
    }

    pub fn set_flags(&mut self, flags: SystemFlags, on: bool) {
        self.me.flags.set(flags, on);
    }

    /// Raises per-tick assertions; they lapse at the next Prepare.
    pub fn assert_flags(&mut self, flags: AssertFlags) {
        self.me.asserts |= flags;
    }

    pub fn change_anim(&mut self, anim_no: i32) {
        self.me.anim.anim_no = anim_no;
        self.me.anim.elapsed = 0;
    }

    // ===== movement =====

    pub fn set_velocity(&mut self, vel: Vec3) {
        self.me.vel = vel;
    }

    pub fn add_velocity(&mut self, dv: Vec3) {
        self.me.vel = self.me.vel + dv;
    }

    pub fn mul_velocity(&mut self, factor: Vec3) {
        let v = &mut self.me.vel;
        v.x *= factor.x;
        v.y *= factor.y;
        v.z *= factor.z;
    }

    /// Moves by `offset` local units, `x` along facing.
    pub fn move_by(&mut self, offset: Vec3) {
        let ls = self.me.local_scale;
        let me = &mut *self.me;
        me.pos.x += offset.x * me.facing.sign() * ls;
        me.pos.y += offset.y * ls;
        me.pos.z += offset.z * ls;
    }

    pub fn turn(&mut self) {
        self.me.facing = self.me.facing.flipped();
    }

    pub fn set_angle(&mut self, degrees: f32) {
        self.me.angle = degrees;
    }

    /// Follows `to` at `offset` for `time` ticks; `-1` until released.
    pub fn bind_to(&mut self, to: EntityId, offset: Vec3, time: i32) {
        self.me.bind = Some(Bind { to, offset, time });
    }

    pub fn release_bind(&mut self) {
        self.me.bind = None;
    }

    // ===== attack and defence =====

    /// Declares a new attack. It can only connect while the move type is
    /// `Attack`.
    pub fn declare_hit_def(&mut self, hit_def: HitDef) {
        self.me.declare_attack(hit_def, &self.world.config);
    }

    /// Declares a reversal that intercepts attacks matching `reversal_attr`.
    pub fn declare_reversal(&mut self, reversal_attr: AttackAttr, mut hit_def: HitDef) {
        hit_def.reversal_attr = Some(reversal_attr);
        self.me.declare_attack(hit_def, &self.world.config);
    }

    pub fn clear_hit_def(&mut self) {
        self.me.clear_attack();
    }

    pub fn hit_by(&mut self, slot: usize, filter: HitByFilter) {
        self.me.hit_by.set(slot, filter);
    }

    pub fn hit_override(&mut self, slot: usize, rule: HitOverride) {
        self.me.overrides.set(slot, rule);
    }

    pub fn set_unhittable(&mut self, time: i32) {
        self.me.unhittable_time = time.max(0);
    }

    // ===== targets =====

    pub fn targets(&self) -> &[EntityId] {
        &self.me.targets
    }

    pub fn add_target(&mut self, target: EntityId) {
        self.me.add_target(target);
    }

    pub fn remove_target(&mut self, target: EntityId) {
        self.me.remove_target(target);
    }

    /// Target at `index`; out-of-range indices clamp to the last target.
    pub fn target_at(&self, index: usize) -> Option<EntityId> {
        let len = self.me.targets.len();
        if len == 0 {
            return None;
        }
        if index >= len {
            let err = StateError::TargetIndex {
                index,
                len,
                context: self.context(),
            };
            tracing::warn!(entity = %self.me.id, error = %err, "target index clamped");
        }
        self.me.targets.get(index.min(len - 1)).copied()
    }

    pub fn target_state(&mut self, target: Option<EntityId>, state_no: i32) {
        self.effects.push(Effect::TargetState { target, state_no });
    }

    /// Adds `amount` to the targets' life; negative values damage.
    pub fn target_life_add(&mut self, target: Option<EntityId>, amount: i32, kill: bool, absolute: bool) {
        self.effects.push(Effect::TargetLifeAdd {
            target,
            amount,
            kill,
            absolute,
        });
    }

    pub fn target_bind(&mut self, target: Option<EntityId>, offset: Vec3, time: i32) {
        self.effects.push(Effect::TargetBind {
            target,
            offset,
            time,
        });
    }

    // ===== world =====

    pub fn pause(&mut self, time: i32, move_time: i32) {
        self.effects.push(Effect::Pause { time, move_time });
    }

    pub fn spawn_helper(&mut self, spec: HelperSpec) -> Result<(), SpawnError> {
        if self.budget.entities == 0 {
            return Err(SpawnError::EntityLimit {
                limit: self.world.config.max_entities,
            });
        }
        self.budget.entities -= 1;
        self.effects.push(Effect::SpawnHelper(spec));
        Ok(())
    }

    pub fn spawn_projectile(&mut self, spec: ProjectileSpec) -> Result<(), SpawnError> {
        if self.budget.projectiles == 0 {
            return Err(SpawnError::ProjectileLimit {
                limit: self.world.config.max_projectiles,
            });
        }
        self.budget.projectiles -= 1;
        self.effects.push(Effect::SpawnProjectile(spec));
        Ok(())
    }

    /// Removes a helper at the next compaction. Root fighters cannot leave.
    pub fn destroy_self(&mut self) {
        if !self.me.is_helper() {
            tracing::warn!(entity = %self.me.id, "root fighter cannot destroy itself");
            return;
        }
        self.me.flags.insert(SystemFlags::DESTROY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::CharConstants;
    use crate::config::{CompatibilityMode, CoreConfig};

    fn fighter(id: u32, team: TeamSide, x: f32, world: &WorldContext) -> Char {
        let mut c = Char::new_root(
            EntityId(id),
            team,
            id as usize,
            CharConstants::default(),
            CompatibilityMode::Current,
            world,
        );
        c.pos.x = x;
        c
    }

    #[test]
    fn nearest_enemy_prefers_distance_then_id() {
        let world = WorldContext::default();
        let mut me = fighter(1, TeamSide::One, 0.0, &world);
        let others = [
            EntitySummary::of(&fighter(4, TeamSide::Two, 30.0, &world)),
            EntitySummary::of(&fighter(3, TeamSide::Two, -30.0, &world)),
            EntitySummary::of(&fighter(2, TeamSide::One, 1.0, &world)),
        ];
        let mut effects = Vec::new();
        let mut budget = SpawnBudget::default();
        let ctl = StateController::new(&mut me, &others, &world, &mut effects, &mut budget);
        assert_eq!(ctl.nearest_enemy().map(|e| e.id), Some(EntityId(3)));
    }

    #[test]
    fn spawns_stop_at_the_budget() {
        let world = WorldContext::new(CoreConfig::new().with_max_projectiles(1), 0);
        let mut me = fighter(1, TeamSide::One, 0.0, &world);
        let mut effects = Vec::new();
        let mut budget = SpawnBudget {
            entities: 0,
            projectiles: 1,
        };
        let mut ctl = StateController::new(&mut me, &[], &world, &mut effects, &mut budget);

        assert!(ctl.spawn_projectile(ProjectileSpec::new(HitDef::default())).is_ok());
        assert_eq!(
            ctl.spawn_projectile(ProjectileSpec::new(HitDef::default())),
            Err(SpawnError::ProjectileLimit { limit: 1 })
        );
        assert!(matches!(
            ctl.spawn_helper(HelperSpec::new(1, 1000)),
            Err(SpawnError::EntityLimit { .. })
        ));
        assert_eq!(effects.len(), 1);
    }

    #[test]
    fn target_index_clamps() {
        let world = WorldContext::default();
        let mut me = fighter(1, TeamSide::One, 0.0, &world);
        me.add_target(EntityId(5));
        me.add_target(EntityId(6));
        let mut effects = Vec::new();
        let mut budget = SpawnBudget::default();
        let ctl = StateController::new(&mut me, &[], &world, &mut effects, &mut budget);

        assert_eq!(ctl.target_at(0), Some(EntityId(5)));
        assert_eq!(ctl.target_at(9), Some(EntityId(6)));
    }

    #[test]
    fn runaway_state_loop_is_cut_off() {
        let world = WorldContext::default();
        let mut me = fighter(1, TeamSide::One, 0.0, &world);
        let mut effects = Vec::new();
        let mut budget = SpawnBudget::default();
        let mut ctl = StateController::new(&mut me, &[], &world, &mut effects, &mut budget);

        let ping_pong = |ctl: &mut StateController<'_>| {
            let next = if ctl.me().state_no == 10 { 11 } else { 10 };
            ctl.change_state(next);
        };
        assert!(matches!(ctl.run(&ping_pong), Err(StateError::LoopGuard { .. })));
    }

    #[test]
    fn one_state_change_reruns_once() {
        let world = WorldContext::default();
        let mut me = fighter(1, TeamSide::One, 0.0, &world);
        let mut effects = Vec::new();
        let mut budget = SpawnBudget::default();
        let mut ctl = StateController::new(&mut me, &[], &world, &mut effects, &mut budget);

        let program = |ctl: &mut StateController<'_>| {
            if ctl.me().state_no == 0 {
                ctl.change_state(200);
            } else {
                ctl.set_velocity(Vec3::xy(2.0, 0.0));
            }
        };
        ctl.run(&program).unwrap();
        assert_eq!(me.state_no, 200);
        assert_eq!(me.vel.x, 2.0);
    }
}
