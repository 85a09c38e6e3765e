//! Simulated bodies: root fighters and their helpers.
//!
//! A [`Char`] owns its attack declaration and its reaction ledger outright and
//! refers to every other entity by [`EntityId`] only.

mod controller;
mod tick;

pub use controller::{EntitySummary, Effect, HelperSpec, StateController};
pub(crate) use controller::SpawnBudget;

use arrayvec::ArrayVec;

use crate::common::{EntityId, Facing, TeamSide, Vec3};
use crate::config::{CompatibilityMode, CoreConfig};
use crate::error::{ErrorContext, StateError};
use crate::filters::{HitBySlots, OverrideSlots};
use crate::flags::{AssertFlags, CommandBuffer, SystemFlags};
use crate::gethitvar::GetHitVar;
use crate::hitdef::{DeclarationContext, HitDef, VictimPosture};
use crate::world::WorldContext;

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum MoveType {
    #[default]
    Idle,
    Attack,
    BeingHit,
}

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum StateType {
    #[default]
    Standing,
    Crouching,
    Air,
    Lying,
}

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum Physics {
    #[default]
    Stand,
    Crouch,
    Air,
    None,
}

/// Body dimensions, local units.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SizeConstants {
    pub ground_back: f32,
    pub ground_front: f32,
    pub air_back: f32,
    pub air_front: f32,
    pub height: f32,
    pub depth: [f32; 2],
    /// Relative mass for push resolution.
    pub weight: f32,
}

impl Default for SizeConstants {
    fn default() -> Self {
        Self {
            ground_back: 15.0,
            ground_front: 16.0,
            air_back: 12.0,
            air_front: 12.0,
            height: 60.0,
            depth: [3.0, 3.0],
            weight: 100.0,
        }
    }
}

/// Movement constants, local units per tick.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MovementConstants {
    pub yaccel: f32,
    pub stand_friction: f32,
    pub crouch_friction: f32,
}

impl Default for MovementConstants {
    fn default() -> Self {
        Self {
            yaccel: 0.44,
            stand_friction: 0.85,
            crouch_friction: 0.82,
        }
    }
}

/// Authored per-character data.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CharConstants {
    pub life: i32,
    pub power: i32,
    /// Percent; 100 is neutral.
    pub attack: i32,
    /// Percent; 100 is neutral.
    pub defence: i32,
    pub guard_points: i32,
    pub dizzy_points: i32,
    /// Juggle points; `None` uses the ruleset default.
    pub air_juggle: Option<i32>,
    /// Authoring resolution width.
    pub localcoord: f32,
    pub scale: [f32; 2],
    pub size: SizeConstants,
    pub movement: MovementConstants,
}

impl Default for CharConstants {
    fn default() -> Self {
        Self {
            life: 1000,
            power: 3000,
            attack: 100,
            defence: 100,
            guard_points: 1000,
            dizzy_points: 1000,
            air_juggle: None,
            localcoord: 320.0,
            scale: [1.0, 1.0],
            size: SizeConstants::default(),
            movement: MovementConstants::default(),
        }
    }
}

/// Body extents after scaling, world units.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BodySize {
    pub back: f32,
    pub front: f32,
    pub height: f32,
    pub depth: [f32; 2],
}

impl BodySize {
    /// Horizontal extents `(left, right)` of the body for the given facing.
    pub fn extents(&self, facing: Facing) -> (f32, f32) {
        match facing {
            Facing::Right => (self.back, self.front),
            Facing::Left => (self.front, self.back),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnimCursor {
    pub anim_no: i32,
    pub elapsed: i32,
}

/// Position binding to another entity.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bind {
    pub to: EntityId,
    /// Offset from the binder, world units, `x` along the binder's facing.
    pub offset: Vec3,
    /// Ticks left; `-1` binds until released.
    pub time: i32,
}

/// What the current attack has touched since the last state change.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MoveContact {
    pub hit: bool,
    pub guarded: bool,
    pub reversed: bool,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Char {
    pub id: EntityId,
    pub root: EntityId,
    pub parent: Option<EntityId>,
    /// Authored helper number; `None` for roots.
    pub helper_id: Option<i32>,
    pub team: TeamSide,
    /// Input slot sampled for this entity.
    pub player_no: usize,
    /// Ruleset this entity's content was written for.
    pub compat: CompatibilityMode,
    pub constants: CharConstants,
    pub local_scale: f32,

    /// World units.
    pub pos: Vec3,
    /// Local units, `x` relative to facing.
    pub vel: Vec3,
    pub facing: Facing,
    /// Draw and collision rotation, degrees.
    pub angle: f32,

    pub state_no: i32,
    pub prev_state_no: i32,
    pub state_time: i32,
    pub move_type: MoveType,
    pub state_type: StateType,
    pub physics: Physics,
    pub anim: AnimCursor,

    pub flags: SystemFlags,
    pub asserts: AssertFlags,
    pub commands: CommandBuffer,

    pub life: i32,
    pub power: i32,
    pub guard_points: i32,
    pub dizzy_points: i32,
    pub red_life: i32,

    pub attack: Option<HitDef>,
    /// Attack may land this tick. Cleared for the rest of the tick when the
    /// attack loses an exchange.
    pub attack_armed: bool,
    /// Tick of the attack's first contact.
    pub contact_tick: Option<u64>,
    /// Victims the current attack already connected with.
    pub hit_targets: ArrayVec<EntityId, { CoreConfig::MAX_HIT_TARGETS }>,
    /// Victims affected since the last attack declaration.
    pub targets: ArrayVec<EntityId, { CoreConfig::MAX_TARGETS }>,
    pub ghv: GetHitVar,
    pub hit_by: HitBySlots,
    pub overrides: OverrideSlots,
    pub unhittable_time: i32,
    pub hit_pause: i32,
    pub bind: Option<Bind>,
    pub size: BodySize,
    /// Higher priority moves the other body exclusively.
    pub push_priority: i32,
    pub pushable: bool,
    pub move_contact: MoveContact,
    /// Attacker-side state jump queued by a landed attack.
    pub pending_state: Option<i32>,

    /// Frozen by a world pause this tick.
    pub(crate) frozen: bool,
    /// In hit pause at the start of this tick.
    pub(crate) hit_paused: bool,
    pub(crate) state_changes: u32,
}

impl Char {
    pub(crate) fn new_root(
        id: EntityId,
        team: TeamSide,
        player_no: usize,
        constants: CharConstants,
        compat: CompatibilityMode,
        world: &WorldContext,
    ) -> Self {
        let local_scale = world.local_scale(constants.localcoord);
        Self::blank(id, team, player_no, constants, compat, local_scale)
    }

    fn blank(
        id: EntityId,
        team: TeamSide,
        player_no: usize,
        constants: CharConstants,
        compat: CompatibilityMode,
        local_scale: f32,
    ) -> Self {
        let mut c = Self {
            id,
            root: id,
            parent: None,
            helper_id: None,
            team,
            player_no,
            compat,
            constants,
            local_scale,
            pos: Vec3::ZERO,
            vel: Vec3::ZERO,
            facing: Facing::Right,
            angle: 0.0,
            state_no: 0,
            prev_state_no: 0,
            state_time: 0,
            move_type: MoveType::Idle,
            state_type: StateType::Standing,
            physics: Physics::Stand,
            anim: AnimCursor::default(),
            flags: SystemFlags::CTRL,
            asserts: AssertFlags::empty(),
            commands: CommandBuffer::empty(),
            life: constants.life,
            power: 0,
            guard_points: constants.guard_points,
            dizzy_points: constants.dizzy_points,
            red_life: constants.life,
            attack: None,
            attack_armed: false,
            contact_tick: None,
            hit_targets: ArrayVec::new(),
            targets: ArrayVec::new(),
            ghv: GetHitVar::default(),
            hit_by: HitBySlots::default(),
            overrides: OverrideSlots::default(),
            unhittable_time: 0,
            hit_pause: 0,
            bind: None,
            size: BodySize::default(),
            push_priority: 0,
            pushable: true,
            move_contact: MoveContact::default(),
            pending_state: None,
            frozen: false,
            hit_paused: false,
            state_changes: 0,
        };
        c.recompute_size();
        c
    }

    pub(crate) fn new_helper(id: EntityId, parent: &Char, spec: &HelperSpec) -> Self {
        let mut c = Self::blank(
            id,
            parent.team,
            parent.player_no,
            parent.constants,
            parent.compat,
            parent.local_scale,
        );
        c.root = parent.root;
        c.parent = Some(parent.id);
        c.helper_id = Some(spec.helper_id);
        c.facing = if spec.flip_facing {
            parent.facing.flipped()
        } else {
            parent.facing
        };
        c.pos = parent.pos
            + Vec3::new(
                spec.offset.x * parent.facing.sign(),
                spec.offset.y,
                spec.offset.z,
            );
        c.state_no = spec.state_no;
        c.prev_state_no = spec.state_no;
        c.flags = SystemFlags::empty();
        c.power = 0;
        c.pushable = spec.pushable;
        c.recompute_size();
        c
    }

    pub fn is_helper(&self) -> bool {
        self.parent.is_some()
    }

    /// Halted by a world pause or hit pause this tick.
    pub fn halted(&self) -> bool {
        self.frozen || self.hit_paused
    }

    pub fn is_ko(&self) -> bool {
        self.flags.contains(SystemFlags::KO)
    }

    pub fn ctrl(&self) -> bool {
        self.flags.contains(SystemFlags::CTRL)
    }

    /// Not participating in collisions at all.
    pub fn is_inert(&self) -> bool {
        self.flags
            .intersects(SystemFlags::STANDBY | SystemFlags::DISABLED | SystemFlags::DESTROY)
    }

    pub fn max_juggle(&self, config: &CoreConfig) -> i32 {
        self.constants.air_juggle.unwrap_or(config.default_air_juggle)
    }

    pub fn attack_mul(&self) -> f64 {
        f64::from(self.constants.attack) / 100.0
    }

    pub fn defence_mul(&self) -> f64 {
        f64::from(self.constants.defence) / 100.0
    }

    /// Posture used to pick a reaction.
    pub fn posture(&self) -> VictimPosture {
        match self.state_type {
            StateType::Air => VictimPosture::Air,
            StateType::Lying => VictimPosture::Down,
            StateType::Standing | StateType::Crouching => VictimPosture::Ground,
        }
    }

    /// Knocked down and still airborne or bouncing.
    pub fn is_falling(&self) -> bool {
        self.move_type == MoveType::BeingHit && self.ghv.fall
    }

    /// Id of the attack currently reeling this entity.
    pub fn reeling_from(&self) -> Option<i32> {
        if self.move_type == MoveType::BeingHit {
            self.ghv.hit_id
        } else {
            None
        }
    }

    pub fn declaration_context(&self, config: &CoreConfig) -> DeclarationContext {
        DeclarationContext {
            local_scale: self.local_scale,
            depth: self.constants.size.depth,
            compatibility: self.compat,
            gains: config.gains,
        }
    }

    /// Stores and finalizes a new attack; forgets who the previous one hit.
    pub fn declare_attack(&mut self, mut hit_def: HitDef, config: &CoreConfig) {
        hit_def.finalize(&self.declaration_context(config));
        self.attack = Some(hit_def);
        self.contact_tick = None;
        self.hit_targets.clear();
        self.targets.clear();
    }

    pub fn clear_attack(&mut self) {
        self.attack = None;
        self.attack_armed = false;
        self.contact_tick = None;
        self.hit_targets.clear();
    }

    /// Enters `state_no`. Out-of-range numbers fall back to the configured
    /// safe state and are reported.
    pub fn change_state(&mut self, state_no: i32, world: &WorldContext) -> Result<(), StateError> {
        let config = &world.config;
        let (target, result) = if (0..=config.max_state_no).contains(&state_no) {
            (state_no, Ok(()))
        } else {
            let fallback = config.reactions.fallback;
            (
                fallback,
                Err(StateError::OutOfRange {
                    requested: state_no,
                    fallback,
                    context: ErrorContext::new(world.tick)
                        .with_entity(self.id)
                        .with_state(self.state_no),
                }),
            )
        };

        self.prev_state_no = self.state_no;
        self.state_no = target;
        self.state_time = 0;
        self.state_changes += 1;
        self.clear_attack();
        self.move_contact = MoveContact::default();
        result
    }

    /// Sets the move type; leaving `BeingHit` forgets the reaction ledger.
    pub fn set_move_type(&mut self, move_type: MoveType) {
        if self.move_type == MoveType::BeingHit && move_type != MoveType::BeingHit {
            self.ghv.clear();
        }
        self.move_type = move_type;
    }

    pub fn set_state_type(&mut self, state_type: StateType) {
        self.state_type = state_type;
        self.recompute_size();
    }

    pub fn add_target(&mut self, target: EntityId) {
        if !self.targets.contains(&target) && self.targets.try_push(target).is_err() {
            tracing::warn!(entity = %self.id, %target, "target list full");
        }
    }

    pub fn remove_target(&mut self, target: EntityId) {
        self.targets.retain(|t| *t != target);
    }

    pub(crate) fn recompute_size(&mut self) {
        let s = &self.constants.size;
        let (back, front) = if self.state_type == StateType::Air {
            (s.air_back, s.air_front)
        } else {
            (s.ground_back, s.ground_front)
        };
        let [sx, sy] = self.constants.scale;
        let ls = self.local_scale;
        self.size = BodySize {
            back: back * sx * ls,
            front: front * sx * ls,
            height: s.height * sy * ls,
            depth: [s.depth[0] * ls, s.depth[1] * ls],
        };
    }

    /// Horizontal body interval, world units.
    pub fn body_span(&self) -> (f32, f32) {
        let (l, r) = self.size.extents(self.facing);
        (self.pos.x - l, self.pos.x + r)
    }

    pub(crate) fn add_power(&mut self, amount: i32) {
        self.power = (self.power + amount).min(self.constants.power).max(0);
    }
}
