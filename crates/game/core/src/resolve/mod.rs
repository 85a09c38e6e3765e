//! Combat resolution: whether an attack lands on a victim, and how.
//!
//! Resolution is split so the borrow checker never needs two live mutable
//! entities: [`evaluate`] reads an owned [`AttackerView`] and the victim,
//! [`commit`] writes only the victim and hands back what the attacker side
//! must apply afterwards.

mod arbitration;
mod commit;
mod guard;

pub use arbitration::{Arbitration, Contender, arbitrate};
pub use commit::{CommitResult, commit};

use arrayvec::ArrayVec;

use crate::character::{Char, MoveType, StateType};
use crate::common::{EntityId, Facing, TeamSide, Vec3};
use crate::config::{CompatibilityMode, CoreConfig};
use crate::flags::{AssertFlags, HitFlags, OverrideFlags};
use crate::hitdef::{HitDef, VictimPosture};
use crate::projectile::Projectile;
use crate::world::WorldContext;

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum HitOutcome {
    Hit,
    Guarded,
    None,
}

/// Why an overlapping attack did not land.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum Rejection {
    Unhittable,
    /// A HitBy / NotHitBy slot refused the attribute.
    Filtered,
    /// The victim's posture is not in the attack's hit flags.
    Posture,
    Chain,
    AlreadyHit,
    /// A hit override turned the attack into a miss.
    Override,
    Juggle,
}

/// An attack that will land.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HitPlan {
    pub outcome: HitOutcome,
    pub posture: VictimPosture,
    /// State forced by a hit override.
    pub override_state: Option<i32>,
    pub force_air: bool,
    pub keep_state: bool,
    pub juggle_checked: bool,
}

/// Snapshot of the attacking side, detached from the registry.
#[derive(Clone, Debug, PartialEq)]
pub struct AttackerView {
    /// Attacking character, or the owner of the projectile.
    pub id: EntityId,
    pub root: EntityId,
    pub team: TeamSide,
    pub pos: Vec3,
    pub facing: Facing,
    pub local_scale: f32,
    pub compat: CompatibilityMode,
    pub attack_mul: f64,
    pub asserts: AssertFlags,
    pub hit_def: HitDef,
    pub hit_targets: ArrayVec<EntityId, { CoreConfig::MAX_HIT_TARGETS }>,
    pub projectile: Option<EntityId>,
}

impl AttackerView {
    /// `None` when `c` has no attack declared.
    pub fn of_char(c: &Char) -> Option<Self> {
        let hit_def = c.attack.clone()?;
        Some(Self {
            id: c.id,
            root: c.root,
            team: c.team,
            pos: c.pos,
            facing: c.facing,
            local_scale: c.local_scale,
            compat: c.compat,
            attack_mul: c.attack_mul(),
            asserts: c.asserts,
            hit_def,
            hit_targets: c.hit_targets.clone(),
            projectile: None,
        })
    }

    /// `owner` is the projectile's owner, if it still exists.
    pub fn of_projectile(p: &Projectile, owner: Option<&Char>) -> Self {
        Self {
            id: p.owner,
            root: p.owner_root,
            team: p.team,
            pos: p.pos,
            facing: p.facing,
            local_scale: p.local_scale,
            compat: p.compat,
            attack_mul: owner.map_or(1.0, Char::attack_mul),
            asserts: owner.map_or(AssertFlags::empty(), |o| o.asserts),
            hit_def: p.hit_def.clone(),
            hit_targets: ArrayVec::new(),
            projectile: Some(p.id),
        }
    }
}

fn posture_allowed(flags: HitFlags, v: &Char) -> bool {
    let being_hit = v.move_type == MoveType::BeingHit;
    if flags.contains(HitFlags::NOT_HIT) && being_hit {
        return false;
    }
    if flags.contains(HitFlags::ONLY_HIT) && !being_hit {
        return false;
    }
    let needed = match v.state_type {
        StateType::Lying => HitFlags::DOWN,
        _ if v.is_falling() => HitFlags::FALL,
        StateType::Air => HitFlags::AIR,
        StateType::Crouching => HitFlags::LOW,
        StateType::Standing => HitFlags::HIGH,
    };
    flags.contains(needed)
}

/// Decides whether `a`'s attack lands on `v`, in resolution order:
/// vulnerability, chain, guard, override, juggle budget.
///
/// Never mutates anything; a rejected attack leaves both sides untouched.
pub fn evaluate(a: &AttackerView, v: &Char, world: &WorldContext) -> Result<HitPlan, Rejection> {
    let hd = &a.hit_def;

    if v.unhittable_time > 0 {
        return Err(Rejection::Unhittable);
    }
    if !v.hit_by.allows(hd.attr) {
        return Err(Rejection::Filtered);
    }
    if !posture_allowed(hd.hit_flags, v) {
        return Err(Rejection::Posture);
    }

    if !hd.chain_allows(v.reeling_from()) {
        return Err(Rejection::Chain);
    }
    if a.hit_targets.contains(&v.id) || (hd.hits_once() && !a.hit_targets.is_empty()) {
        return Err(Rejection::AlreadyHit);
    }

    let mut plan = HitPlan {
        outcome: guard::decide(a, v),
        posture: v.posture(),
        override_state: None,
        force_air: false,
        keep_state: false,
        juggle_checked: false,
    };

    if let Some(rule) = v.overrides.find(hd.attr, hd.guard_flags) {
        if rule.flags.contains(OverrideFlags::MISS) {
            return Err(Rejection::Override);
        }
        if rule.flags.contains(OverrideFlags::FORCE_GUARD) {
            plan.outcome = HitOutcome::Guarded;
        }
        plan.force_air = rule.flags.contains(OverrideFlags::FORCE_AIR);
        plan.keep_state = rule.flags.contains(OverrideFlags::KEEP_STATE);
        plan.override_state = rule.state_no;
        if plan.force_air {
            plan.posture = VictimPosture::Air;
        }
    }

    let airborne = v.ghv.fall || v.state_type == StateType::Air;
    if plan.outcome == HitOutcome::Hit
        && v.move_type == MoveType::BeingHit
        && airborne
        && !a.asserts.contains(AssertFlags::NO_JUGGLE_CHECK)
    {
        let max = v.max_juggle(&world.config);
        let spent = if a.compat.is_legacy() {
            v.ghv.juggle_spent_by(a.root)
        } else {
            v.ghv.juggle_spent_total()
        };
        if hd.air_juggle > max - spent {
            return Err(Rejection::Juggle);
        }
        plan.juggle_checked = true;
    }

    Ok(plan)
}
