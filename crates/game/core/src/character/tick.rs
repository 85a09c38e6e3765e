//! Per-entity halves of the tick pipeline.
//!
//! `prepare` runs before any program, `finish` after every collision pass.
//! Cross-entity work (binding, collisions) stays in the scheduler.

use super::{Char, MoveType, Physics, StateType};
use crate::common::{Facing, Vec3};
use crate::config::CompatibilityMode;
use crate::damage::{DamageRequest, LifeMeter, compute_damage};
use crate::flags::{AssertFlags, SystemFlags};
use crate::world::WorldContext;

/// Ticks a knocked-down victim stays on the ground.
const LIE_DOWN_TIME: i32 = 60;

impl Char {
    /// Start-of-tick bookkeeping: pause state, timers, per-tick assertions.
    ///
    /// A halted entity keeps last tick's assertions and timers.
    pub(crate) fn prepare(&mut self, world: &WorldContext) {
        self.frozen = world.pause.freezes(self.id);
        if self.frozen {
            return;
        }
        self.hit_paused = self.hit_pause > 0;
        if self.hit_paused {
            self.hit_pause -= 1;
            self.ghv.hit_shake_time = self.hit_pause;
            return;
        }

        self.asserts = AssertFlags::empty();
        self.state_changes = 0;
        self.hit_by.tick();
        self.overrides.tick();
        if self.unhittable_time > 0 {
            self.unhittable_time -= 1;
        }
        if self.move_type == MoveType::BeingHit {
            let g = &mut self.ghv;
            g.hit_time = (g.hit_time - 1).max(0);
            g.slide_time = (g.slide_time - 1).max(0);
            g.ctrl_time = (g.ctrl_time - 1).max(0);
        }
        self.recompute_size();
    }

    /// Late-tick work: queued resource deltas, KO, reaction entry, physics
    /// and state time.
    pub(crate) fn finish(&mut self, world: &WorldContext) {
        let fresh = self.ghv.fresh;
        if fresh {
            self.apply_pending();
            self.check_ko(world, true);
            if !self.ghv.keep_state {
                self.enter_reaction(world);
            } else {
                self.vel = self.ghv.velocity;
                self.move_type = MoveType::BeingHit;
            }
            self.ghv.fresh = false;
        }

        if !self.halted() {
            if self.bind.is_none() {
                self.integrate(world);
            }
            if !fresh {
                self.recover(world);
            }
            self.state_time += 1;
            self.anim.elapsed += 1;
        }
        self.check_ko(world, false);

        self.clamp_to_bounds(world);
        if self.compat == CompatibilityMode::Current && self.dizzy_points <= 0 {
            self.flags.insert(SystemFlags::DIZZY);
        }

        if let Some(state_no) = self.pending_state.take() {
            if let Err(err) = self.change_state(state_no, world) {
                tracing::warn!(entity = %self.id, error = %err, "attacker state jump substituted");
            }
        }
    }

    fn apply_pending(&mut self) {
        let p = std::mem::take(&mut self.ghv.pending);
        let max = self.constants.life;
        self.life = (self.life - p.life).min(max).max(0);
        self.red_life = (self.red_life - p.red_life).min(max).max(self.life);
        self.dizzy_points = (self.dizzy_points - p.dizzy_points)
            .min(self.constants.dizzy_points)
            .max(0);
        self.guard_points = (self.guard_points - p.guard_points)
            .min(self.constants.guard_points)
            .max(0);
        self.add_power(p.power);
    }

    /// Raises the KO flag once life is gone. A victim KO'd by a fresh hit
    /// is knocked down by it; anything else jumps straight to the KO state.
    fn check_ko(&mut self, world: &WorldContext, reeling: bool) {
        if self.life > 0 || self.is_ko() || self.asserts.contains(AssertFlags::NO_KO) {
            return;
        }
        self.flags.insert(SystemFlags::KO);
        self.flags.remove(SystemFlags::CTRL);
        tracing::debug!(entity = %self.id, tick = world.tick, "knocked out");
        if reeling {
            self.ghv.fall = true;
        } else if self.move_type != MoveType::BeingHit {
            if let Err(err) = self.change_state(world.config.reactions.ko, world) {
                tracing::warn!(entity = %self.id, error = %err, "ko state substituted");
            }
        }
    }

    fn enter_reaction(&mut self, world: &WorldContext) {
        let reactions = &world.config.reactions;
        let airborne = self.ghv.force_air
            || self.state_type == StateType::Air
            || (!self.ghv.guarded && (self.ghv.fall || self.ghv.velocity.y < 0.0));

        let (default_state, state_type, physics) = if self.ghv.guarded {
            match self.state_type {
                StateType::Air => (reactions.air_guard, StateType::Air, Physics::Air),
                StateType::Crouching => (reactions.crouch_guard, StateType::Crouching, Physics::Crouch),
                _ => (reactions.stand_guard, StateType::Standing, Physics::Stand),
            }
        } else if airborne {
            (reactions.air_hit, StateType::Air, Physics::Air)
        } else {
            match self.state_type {
                StateType::Lying => (reactions.lying_hit, StateType::Lying, Physics::None),
                StateType::Crouching => (reactions.crouch_hit, StateType::Crouching, Physics::Crouch),
                _ => (reactions.stand_hit, StateType::Standing, Physics::Stand),
            }
        };
        let state_no = self.ghv.custom_state.unwrap_or(default_state);

        if let Err(err) = self.change_state(state_no, world) {
            tracing::warn!(entity = %self.id, error = %err, "reaction state substituted");
        }
        self.move_type = MoveType::BeingHit;
        self.set_state_type(state_type);
        self.physics = physics;
        self.flags.remove(SystemFlags::CTRL);
        self.vel = self.ghv.velocity;
    }

    fn integrate(&mut self, world: &WorldContext) {
        let ls = self.local_scale;
        self.pos.x += self.vel.x * self.facing.sign() * ls;
        self.pos.y += self.vel.y * ls;
        self.pos.z += self.vel.z * ls;

        let movement = self.constants.movement;
        let sliding = self.move_type == MoveType::BeingHit && self.ghv.slide_time > 0;
        match self.physics {
            Physics::Air => {
                self.vel.y += if self.move_type == MoveType::BeingHit {
                    self.ghv.yaccel
                } else {
                    movement.yaccel
                };
                if self.pos.y >= 0.0 && self.vel.y > 0.0 {
                    self.land(world);
                }
            }
            Physics::Stand if !sliding => self.vel.x *= movement.stand_friction,
            Physics::Crouch if !sliding => self.vel.x *= movement.crouch_friction,
            Physics::Stand | Physics::Crouch | Physics::None => {}
        }
    }

    fn land(&mut self, world: &WorldContext) {
        self.pos.y = 0.0;
        if !self.is_falling() {
            self.vel.y = 0.0;
            self.set_state_type(StateType::Standing);
            self.physics = Physics::Stand;
            return;
        }

        self.ghv.fall_count += 1;
        let fall = self.ghv.fall_params;
        if fall.damage != 0 {
            let req = DamageRequest::new(fall.damage).absolute().with_kill(fall.kill);
            let meter = LifeMeter {
                current: self.life,
                max: self.constants.life,
            };
            self.life -= compute_damage(&req, meter, true);
        }

        if self.ghv.fall_count == 1 && fall.yvelocity != 0.0 {
            if let Some(x) = fall.xvelocity {
                self.vel.x = x;
            }
            self.vel.y = fall.yvelocity;
            return;
        }

        self.vel = Vec3::ZERO;
        self.set_state_type(StateType::Lying);
        self.physics = Physics::None;
        self.ghv.hit_time = LIE_DOWN_TIME;
        if let Err(err) = self.change_state(world.config.reactions.lie_down, world) {
            tracing::warn!(entity = %self.id, error = %err, "lie down state substituted");
        }
    }

    /// Returns a victim in a core-entered reaction to neutral once its
    /// reaction time runs out on the ground.
    fn recover(&mut self, world: &WorldContext) {
        let ghv = &self.ghv;
        if self.move_type != MoveType::BeingHit
            || self.is_ko()
            || ghv.custom_state.is_some()
            || ghv.keep_state
            || ghv.hit_time > 0
            || self.state_type == StateType::Air
        {
            return;
        }
        if let Err(err) = self.change_state(world.config.reactions.idle, world) {
            tracing::warn!(entity = %self.id, error = %err, "recovery state substituted");
        }
        self.set_move_type(MoveType::Idle);
        self.set_state_type(StateType::Standing);
        self.physics = Physics::Stand;
        self.vel = Vec3::ZERO;
        self.flags.insert(SystemFlags::CTRL);
    }

    pub(crate) fn clamp_to_bounds(&mut self, world: &WorldContext) {
        let (back, front) = self.size.extents(self.facing);
        if !self.asserts.contains(AssertFlags::NO_STAGE_BOUND) {
            self.pos.x = self
                .pos
                .x
                .max(world.stage.left + back)
                .min(world.stage.right - front);
        }
        if !self.is_helper() && !self.asserts.contains(AssertFlags::NO_SCREEN_BOUND) {
            self.pos.x = self
                .pos
                .x
                .max(world.screen.left() + back)
                .min(world.screen.right() - front);
        }
    }

    /// Snaps to the binder and counts the binding down.
    pub(crate) fn follow(&mut self, binder_pos: Vec3, binder_facing: Facing) {
        let Some(bind) = self.bind.as_mut() else {
            return;
        };
        self.pos = binder_pos
            + Vec3::new(
                bind.offset.x * binder_facing.sign(),
                bind.offset.y,
                bind.offset.z,
            );
        if bind.time > 0 {
            bind.time -= 1;
            if bind.time == 0 {
                self.bind = None;
            }
        }
    }

    /// Turns to face `x` when standing idle with control.
    pub(crate) fn auto_turn(&mut self, x: f32) {
        if self.asserts.contains(AssertFlags::NO_AUTO_TURN)
            || !self.ctrl()
            || self.move_type != MoveType::Idle
            || self.state_type == StateType::Air
        {
            return;
        }
        self.facing = self.facing.towards(self.pos.x, x);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::CharConstants;
    use crate::common::{EntityId, TeamSide};
    use crate::world::WorldPause;

    fn fighter(world: &WorldContext) -> Char {
        Char::new_root(
            EntityId(1),
            TeamSide::One,
            0,
            CharConstants::default(),
            CompatibilityMode::Current,
            world,
        )
    }

    #[test]
    fn hit_pause_holds_timers_and_asserts() {
        let world = WorldContext::default();
        let mut c = fighter(&world);
        c.hit_pause = 2;
        c.unhittable_time = 5;
        c.asserts = AssertFlags::NO_KO;

        c.prepare(&world);
        assert!(c.halted());
        assert_eq!(c.hit_pause, 1);
        assert_eq!(c.unhittable_time, 5);
        assert!(c.asserts.contains(AssertFlags::NO_KO));

        c.prepare(&world);
        c.prepare(&world);
        assert!(!c.halted());
        assert_eq!(c.unhittable_time, 4);
        assert!(c.asserts.is_empty());
    }

    #[test]
    fn world_pause_freezes_everyone_but_the_owner() {
        let mut world = WorldContext::default();
        world.pause = WorldPause {
            remaining: 3,
            move_time: 3,
            owner: Some(EntityId(1)),
        };
        let mut owner = fighter(&world);
        owner.prepare(&world);
        assert!(!owner.halted());

        let mut other = fighter(&world);
        other.id = EntityId(2);
        other.prepare(&world);
        assert!(other.halted());
    }

    #[test]
    fn falling_victim_bounces_then_lies_down() {
        let world = WorldContext::default();
        let mut c = fighter(&world);
        c.move_type = MoveType::BeingHit;
        c.set_state_type(StateType::Air);
        c.physics = Physics::Air;
        c.ghv.fall = true;
        c.ghv.fall_params.yvelocity = -4.5;
        c.ghv.fall_params.damage = 30;
        c.ghv.yaccel = 0.35;
        c.pos.y = -1.0;
        c.vel = Vec3::xy(-2.0, 3.0);

        c.finish(&world);
        assert_eq!(c.ghv.fall_count, 1);
        assert_eq!(c.vel.y, -4.5);
        assert_eq!(c.vel.x, -2.0);
        assert_eq!(c.life, 970);

        c.pos.y = -1.0;
        c.vel.y = 3.0;
        c.finish(&world);
        assert_eq!(c.ghv.fall_count, 2);
        assert_eq!(c.state_type, StateType::Lying);
        assert_eq!(c.state_no, world.config.reactions.lie_down);
        assert_eq!(c.vel, Vec3::ZERO);
    }

    #[test]
    fn fresh_ko_forces_a_fall() {
        let world = WorldContext::default();
        let mut c = fighter(&world);
        c.ghv.begin_hit(0);
        c.ghv.pending.life = 2000;
        c.ghv.fresh = true;

        c.finish(&world);
        assert!(c.is_ko());
        assert!(c.ghv.fall);
        assert_eq!(c.state_type, StateType::Air);
        assert_eq!(c.state_no, world.config.reactions.air_hit);
        assert_eq!(c.life, 0);
    }

    #[test]
    fn no_ko_assert_keeps_the_fighter_standing() {
        let world = WorldContext::default();
        let mut c = fighter(&world);
        c.asserts = AssertFlags::NO_KO;
        c.life = 0;
        c.finish(&world);
        assert!(!c.is_ko());
    }

    #[test]
    fn ground_hit_recovers_after_hit_time() {
        let world = WorldContext::default();
        let mut c = fighter(&world);
        c.ghv.begin_hit(0);
        c.ghv.hit_time = 2;
        c.ghv.fresh = true;
        c.finish(&world);
        assert_eq!(c.move_type, MoveType::BeingHit);
        assert_eq!(c.state_no, world.config.reactions.stand_hit);
        assert!(!c.ctrl());

        for _ in 0..2 {
            c.prepare(&world);
            c.finish(&world);
        }
        assert_eq!(c.move_type, MoveType::Idle);
        assert_eq!(c.state_no, world.config.reactions.idle);
        assert!(c.ctrl());
    }

    #[test]
    fn bounds_clamp_to_stage_and_screen() {
        let world = WorldContext::default();
        let mut c = fighter(&world);
        c.pos.x = 1000.0;
        c.clamp_to_bounds(&world);
        assert_eq!(c.pos.x, world.screen.right() - c.size.front);

        c.asserts = AssertFlags::NO_SCREEN_BOUND;
        c.pos.x = 1000.0;
        c.clamp_to_bounds(&world);
        assert_eq!(c.pos.x, world.stage.right - c.size.front);
    }
}
