//! Projectile entities.
//!
//! A projectile carries its own finalized [`HitDef`] and hit budget and never
//! runs a behavior program. It leaves `Active` exactly once, at which point
//! its authored id is complemented so lookups by id stop matching it.

use crate::character::{AnimCursor, Char};
use crate::common::{EntityId, Facing, TeamSide, Vec3};
use crate::config::CompatibilityMode;
use crate::hitdef::HitDef;
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
pub enum ProjectileStage {
    #[default]
    Active,
    /// Spent its hits or its lifetime; playing out before removal.
    Removing,
    /// Lost a trade or was cancelled by its owner.
    Cancelled,
    /// Awaiting compaction.
    Gone,
}

/// Projectile creation request.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProjectileSpec {
    pub proj_id: i32,
    pub hit_def: HitDef,
    /// Offset from the owner, world units, `x` along the owner's facing.
    pub offset: Vec3,
    /// Local units per tick, `x` along facing.
    pub velocity: Vec3,
    pub accel: Vec3,
    pub vel_mul: Vec3,
    /// Ticks before removal; `-1` lives until it leaves the bounds.
    pub remove_time: i32,
    pub hits: i32,
    pub priority: i32,
    /// Ticks between two hits of a multi-hit projectile.
    pub miss_time: i32,
    /// Ticks spent removing or cancelled before it is gone.
    pub remove_anim_time: i32,
    /// Distance past the screen edge it may travel, world units.
    pub edge_bound: f32,
    /// Distance past the stage edge it may travel, world units.
    pub stage_bound: f32,
    /// Allowed vertical range `[top, bottom]`, local units.
    pub height_bound: [f32; 2],
    pub anim_no: i32,
}

impl ProjectileSpec {
    pub fn new(hit_def: HitDef) -> Self {
        Self {
            proj_id: 0,
            hit_def,
            offset: Vec3::ZERO,
            velocity: Vec3::ZERO,
            accel: Vec3::ZERO,
            vel_mul: Vec3::new(1.0, 1.0, 1.0),
            remove_time: -1,
            hits: 1,
            priority: 1,
            miss_time: 0,
            remove_anim_time: 0,
            edge_bound: 40.0,
            stage_bound: 40.0,
            height_bound: [-240.0, 1.0],
            anim_no: 0,
        }
    }

    pub fn with_proj_id(mut self, proj_id: i32) -> Self {
        self.proj_id = proj_id;
        self
    }

    pub fn with_offset(mut self, offset: Vec3) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_hits(mut self, hits: i32) -> Self {
        self.hits = hits;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_remove_time(mut self, remove_time: i32) -> Self {
        self.remove_time = remove_time;
        self
    }

    pub fn with_anim(mut self, anim_no: i32) -> Self {
        self.anim_no = anim_no;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Projectile {
    pub id: EntityId,
    pub owner: EntityId,
    pub owner_root: EntityId,
    pub team: TeamSide,
    /// Authored id; complemented once the projectile stops being active.
    pub proj_id: i32,
    pub hit_def: HitDef,
    pub compat: CompatibilityMode,
    pub local_scale: f32,

    /// World units.
    pub pos: Vec3,
    /// Local units, `x` along facing.
    pub vel: Vec3,
    pub accel: Vec3,
    pub vel_mul: Vec3,
    pub facing: Facing,
    pub anim: AnimCursor,

    pub remove_time: i32,
    /// Hits left; `-1` once spent, `-2` once cancelled.
    pub hits: i32,
    pub priority: i32,
    pub miss_time: i32,
    pub miss_timer: i32,
    pub remove_anim_time: i32,
    pub edge_bound: f32,
    pub stage_bound: f32,
    pub height_bound: [f32; 2],
    pub hit_pause: i32,
    pub stage: ProjectileStage,
}

impl Projectile {
    pub(crate) fn spawn(id: EntityId, owner: &Char, spec: ProjectileSpec, world: &WorldContext) -> Self {
        let mut hit_def = spec.hit_def;
        hit_def.finalize(&owner.declaration_context(&world.config));
        let pos = owner.pos
            + Vec3::new(
                spec.offset.x * owner.facing.sign(),
                spec.offset.y,
                spec.offset.z,
            );
        Self {
            id,
            owner: owner.id,
            owner_root: owner.root,
            team: owner.team,
            proj_id: spec.proj_id,
            hit_def,
            compat: owner.compat,
            local_scale: owner.local_scale,
            pos,
            vel: spec.velocity,
            accel: spec.accel,
            vel_mul: spec.vel_mul,
            facing: owner.facing,
            anim: AnimCursor {
                anim_no: spec.anim_no,
                elapsed: 0,
            },
            remove_time: spec.remove_time,
            hits: spec.hits,
            priority: spec.priority,
            miss_time: spec.miss_time,
            miss_timer: 0,
            remove_anim_time: spec.remove_anim_time,
            edge_bound: spec.edge_bound,
            stage_bound: spec.stage_bound,
            height_bound: spec.height_bound,
            hit_pause: 0,
            stage: ProjectileStage::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.stage == ProjectileStage::Active
    }

    /// May connect with something this tick.
    pub fn can_hit(&self) -> bool {
        self.is_active() && self.hits > 0 && self.miss_timer <= 0 && self.hit_pause <= 0
    }

    fn leave(&mut self, stage: ProjectileStage) {
        if self.is_active() {
            self.proj_id = !self.proj_id;
        }
        self.stage = stage;
    }

    /// Spends one hit after connecting with a character.
    pub fn on_hit(&mut self, pause: i32) {
        self.hits -= 1;
        self.hit_pause = pause.max(0);
        if self.hits <= 0 {
            self.hits = -1;
            self.leave(ProjectileStage::Removing);
        } else {
            self.miss_timer = self.miss_time;
        }
    }

    pub fn cancel(&mut self) {
        self.hits = -2;
        self.leave(ProjectileStage::Cancelled);
    }

    fn spend_hit(&mut self) {
        self.hits -= 1;
        if self.hits <= 0 {
            self.cancel();
        }
    }

    fn out_of_bounds(&self, world: &WorldContext) -> bool {
        let x = self.pos.x;
        let ls = self.local_scale;
        x < world.screen.left() - self.edge_bound
            || x > world.screen.right() + self.edge_bound
            || x < world.stage.left - self.stage_bound
            || x > world.stage.right + self.stage_bound
            || self.pos.y < self.height_bound[0] * ls
            || self.pos.y > self.height_bound[1] * ls
    }

    /// One tick of motion and lifetime.
    pub(crate) fn advance(&mut self, world: &WorldContext) {
        if world.pause.freezes(self.owner) {
            return;
        }
        if self.hit_pause > 0 {
            self.hit_pause -= 1;
            return;
        }
        self.anim.elapsed += 1;

        match self.stage {
            ProjectileStage::Active => {
                let ls = self.local_scale;
                self.pos.x += self.vel.x * self.facing.sign() * ls;
                self.pos.y += self.vel.y * ls;
                self.pos.z += self.vel.z * ls;
                self.vel = Vec3::new(
                    self.vel.x * self.vel_mul.x + self.accel.x,
                    self.vel.y * self.vel_mul.y + self.accel.y,
                    self.vel.z * self.vel_mul.z + self.accel.z,
                );
                if self.miss_timer > 0 {
                    self.miss_timer -= 1;
                }
                if self.remove_time > 0 {
                    self.remove_time -= 1;
                    if self.remove_time == 0 {
                        self.leave(ProjectileStage::Removing);
                    }
                }
                if self.out_of_bounds(world) {
                    tracing::trace!(projectile = %self.id, "left the bounds");
                    self.leave(ProjectileStage::Gone);
                }
            }
            ProjectileStage::Removing | ProjectileStage::Cancelled => {
                self.remove_anim_time -= 1;
                if self.remove_anim_time <= 0 {
                    self.stage = ProjectileStage::Gone;
                }
            }
            ProjectileStage::Gone => {}
        }
    }
}

/// Settles two colliding projectiles.
///
/// Equal priority cancels both. Otherwise the lower one is cancelled and the
/// winner loses one priority and one hit.
pub fn trade(a: &mut Projectile, b: &mut Projectile) {
    use std::cmp::Ordering;

    match a.priority.cmp(&b.priority) {
        Ordering::Equal => {
            a.cancel();
            b.cancel();
        }
        Ordering::Greater => {
            b.cancel();
            a.priority -= 1;
            a.spend_hit();
        }
        Ordering::Less => {
            a.cancel();
            b.priority -= 1;
            b.spend_hit();
        }
    }
}
