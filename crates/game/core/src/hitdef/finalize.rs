//! Default resolution for partially specified attacks.

use super::{AnimType, HitDef};
use crate::common::Vec3;
use crate::config::{CompatibilityMode, GainMultipliers, Rounding};

pub(super) const DEFAULT_AIR_HIT_TIME: i32 = 20;
const DEFAULT_YACCEL: f32 = 0.35;
const DEFAULT_FALL_YVELOCITY: f32 = -4.5;
const CORNERPUSH_FACTOR: f32 = 1.3;
const AIRGUARD_VELOCITY_SCALE: [f32; 2] = [1.5, 0.5];

/// What finalization needs to know about the declaring entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DeclarationContext {
    pub local_scale: f32,
    /// Owner's depth extents, used when the attack declares none.
    pub depth: [f32; 2],
    pub compatibility: CompatibilityMode,
    pub gains: GainMultipliers,
}

impl Default for DeclarationContext {
    fn default() -> Self {
        Self {
            local_scale: 1.0,
            depth: [3.0, 3.0],
            compatibility: CompatibilityMode::default(),
            gains: GainMultipliers::default(),
        }
    }
}

fn scaled(base: i32, mul: f64, rounding: Rounding) -> i32 {
    rounding.apply(f64::from(base) * mul)
}

impl HitDef {
    /// Fills every unset field from its fallback chain.
    ///
    /// Runs once per declaration; later calls are no-ops. Explicit fields are
    /// never touched.
    pub fn finalize(&mut self, ctx: &DeclarationContext) {
        if self.finalized {
            return;
        }
        self.finalized = true;

        let ls = if ctx.local_scale > 0.0 {
            ctx.local_scale
        } else {
            1.0
        };

        // Timing.
        self.guard_hit_time.get_or_insert(self.ground_hit_time);
        let guard_slide = *self.guard_slide_time.get_or_insert(self.ground_slide_time);
        self.guard_ctrl_time.get_or_insert(guard_slide);
        self.guard_pause_time.get_or_insert(self.pause_time);
        self.air_hit_time.get_or_insert(DEFAULT_AIR_HIT_TIME);
        self.down_hit_time.get_or_insert(self.ground_hit_time);

        // Reaction kinds.
        self.air_type.get_or_insert(self.ground_type);
        let air_anim = *self.air_anim_type.get_or_insert(self.anim_type);
        self.fall_anim_type.get_or_insert(if air_anim == AnimType::Up {
            AnimType::Up
        } else {
            AnimType::Back
        });
        self.air_fall.get_or_insert(self.ground_fall);
        self.hit_once.get_or_insert(self.attr.is_throw());

        // Velocities.
        self.down_velocity.get_or_insert(self.air_velocity);
        let guard_velocity = *self.guard_velocity.get_or_insert(self.ground_velocity.x);
        self.airguard_velocity.get_or_insert(Vec3::new(
            self.air_velocity.x * AIRGUARD_VELOCITY_SCALE[0],
            self.air_velocity.y * AIRGUARD_VELOCITY_SCALE[1],
            0.0,
        ));

        let ground_push = *self.ground_cornerpush_veloff.get_or_insert(if self.attr.is_air_attack() {
            0.0
        } else {
            CORNERPUSH_FACTOR * guard_velocity
        });
        self.air_cornerpush_veloff.get_or_insert(ground_push);
        self.down_cornerpush_veloff.get_or_insert(ground_push);
        let guard_push = *self.guard_cornerpush_veloff.get_or_insert(ground_push);
        self.airguard_cornerpush_veloff.get_or_insert(guard_push);

        self.yaccel.get_or_insert(DEFAULT_YACCEL / ls);
        self.fall.yvelocity.get_or_insert(DEFAULT_FALL_YVELOCITY / ls);

        // Resource gains.
        let rounding = Rounding::from(ctx.compatibility);
        let gains = &ctx.gains;
        let hit_get = *self
            .hit_get_power
            .get_or_insert(scaled(self.hit_damage, gains.attack_life_to_power, rounding));
        let hit_give = *self
            .hit_give_power
            .get_or_insert(scaled(self.hit_damage, gains.gethit_life_to_power, rounding));
        self.guard_get_power
            .get_or_insert(scaled(hit_get, gains.guard_power_ratio, rounding));
        self.guard_give_power
            .get_or_insert(scaled(hit_give, gains.guard_power_ratio, rounding));
        self.dizzy_points
            .get_or_insert(scaled(self.hit_damage, gains.life_to_dizzy_points, rounding));
        self.guard_points
            .get_or_insert(scaled(self.guard_damage, gains.life_to_guard_points, rounding));
        self.red_life
            .get_or_insert(scaled(self.hit_damage, gains.life_to_red_life, rounding));

        self.depth.get_or_insert(ctx.depth);
    }
}
