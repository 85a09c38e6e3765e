//! Writing a landed attack into the victim.

use super::{AttackerView, HitOutcome, HitPlan};
use crate::character::Char;
use crate::common::Facing;
use crate::config::Rounding;
use crate::damage::{DamageRequest, LifeMeter, compute_damage};
use crate::gethitvar::FallState;
use crate::hitdef::VictimPosture;
use crate::world::WorldContext;

/// Distance from a wall within which the attacker gets pushed back instead.
const CORNER_DISTANCE: f32 = 1.0;

/// What the attacker side must apply after a commit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CommitResult {
    pub guarded: bool,
    /// Life taken from the victim.
    pub damage: i32,
    pub attacker_power: i32,
    pub attacker_pause: i32,
    /// Attacker `x` velocity when the victim is cornered.
    pub cornerpush: Option<f32>,
    /// Attacker state jump.
    pub p1_state: Option<i32>,
}

fn cornered(v: &Char, world: &WorldContext) -> bool {
    let (left, right) = v.body_span();
    match v.facing {
        Facing::Right => left - world.stage.left.max(world.screen.left()) <= CORNER_DISTANCE,
        Facing::Left => world.stage.right.min(world.screen.right()) - right <= CORNER_DISTANCE,
    }
}

/// Records the landed attack in `v`'s reaction ledger and queues its
/// resource deltas. Everything lands in `GetHitVar`; the victim's Finish
/// phase turns it into life loss and a reaction state.
pub fn commit(a: &AttackerView, v: &mut Char, plan: &HitPlan, world: &WorldContext) -> CommitResult {
    let hd = &a.hit_def;
    let guarded = plan.outcome == HitOutcome::Guarded;
    let posture = plan.posture;
    let ratio = if v.local_scale > 0.0 {
        a.local_scale / v.local_scale
    } else {
        1.0
    };

    let was_falling = v.ghv.fall && v.ghv.attacker.is_some();
    v.ghv.begin_hit(world.tick);
    let falls = !guarded && (hd.falls(posture) || was_falling);

    let g = &mut v.ghv;
    g.attacker = Some(a.id);
    g.hit_id = Some(hd.id);
    g.attr = hd.attr;
    g.guarded = guarded;
    g.hit_type = hd.hit_type(posture);
    g.anim_type = hd.reaction_anim(posture, falls);
    g.velocity = hd.velocity_for(posture, guarded).scaled(ratio);
    g.yaccel = hd.yaccel.unwrap_or_default() * ratio;
    g.hit_time = hd.hit_time_for(posture, guarded);
    g.slide_time = hd.slide_time_for(guarded);
    g.ctrl_time = hd.ctrl_time_for(guarded);
    g.fall = falls;
    if !guarded && hd.falls(posture) {
        g.fall_params = FallState {
            xvelocity: (!hd.fall.keeps_xvelocity()).then(|| hd.fall.xvelocity * ratio),
            yvelocity: hd.fall.yvelocity.unwrap_or_default() * ratio,
            recover: hd.fall.recover,
            recover_time: hd.fall.recover_time,
            damage: hd.fall.damage,
            kill: hd.fall.kill,
        };
    }
    g.kill = if guarded { hd.guard_kill } else { hd.kill };
    g.custom_state = plan
        .override_state
        .or(if guarded { None } else { hd.p2_state_no });
    g.force_air = plan.force_air;
    g.keep_state = plan.keep_state;

    let current = v.life - v.ghv.pending.life;
    let amount = if guarded { hd.guard_damage } else { hd.hit_damage };
    let req = DamageRequest::new(amount)
        .with_multipliers(a.attack_mul, v.defence_mul())
        .with_kill(v.ghv.kill)
        .with_rounding(Rounding::from(a.compat));
    let damage = compute_damage(
        &req,
        LifeMeter {
            current,
            max: v.constants.life,
        },
        true,
    );

    let [get_power, give_power] = hd.power_for(guarded);
    let g = &mut v.ghv;
    g.last_damage = damage;
    g.pending.life += damage;
    g.pending.power += give_power;
    if guarded {
        g.pending.guard_points += hd.guard_points.unwrap_or_default();
        g.guard_count += 1;
    } else {
        g.pending.red_life += hd.red_life.unwrap_or_default();
        g.pending.dizzy_points += hd.dizzy_points.unwrap_or_default();
        g.hit_count += hd.num_hits;
    }

    let launches = falls || posture == VictimPosture::Air || g.velocity.y < 0.0;
    if !guarded && (plan.juggle_checked || launches) && !g.register_juggle(a.root, hd.air_juggle) {
        tracing::warn!(victim = %v.id, attacker = %a.root, "juggle ledger full");
    }

    let [attacker_pause, victim_pause] = hd.pause_for(guarded);
    v.ghv.hit_shake_time = victim_pause;
    v.ghv.fresh = true;
    v.hit_pause = victim_pause.max(0);

    v.facing = match a.projectile {
        Some(_) => a.facing.flipped(),
        None => v.facing.towards(v.pos.x, a.pos.x),
    };

    let cornerpush = if a.projectile.is_none() && cornered(v, world) {
        Some(hd.cornerpush_for(posture, guarded))
    } else {
        None
    };

    tracing::debug!(
        attacker = %a.id,
        victim = %v.id,
        damage,
        guarded,
        tick = world.tick,
        "attack committed"
    );

    CommitResult {
        guarded,
        damage,
        attacker_power: get_power,
        attacker_pause,
        cornerpush,
        p1_state: if guarded { None } else { hd.p1_state_no },
    }
}
