//! Victim-side reaction ledger.
//!
//! Written by the resolver when an attack lands or is guarded, consumed by the
//! victim's Finish phase. [`GetHitVar::begin_hit`] resets everything that
//! belongs to one attack while keeping combo counters, the juggle ledger and
//! the fall flag; [`GetHitVar::clear`] wipes it all once the victim stops
//! reeling.

use arrayvec::ArrayVec;

use crate::common::{EntityId, Vec3};
use crate::config::CoreConfig;
use crate::flags::AttackAttr;
use crate::hitdef::{AnimType, HitType};

/// Juggle points one attacker root has spent on this victim.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JuggleEntry {
    pub attacker: EntityId,
    pub spent: i32,
}

/// Resolved fall parameters, victim local units.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FallState {
    /// `None` keeps the victim's horizontal velocity on the bounce.
    pub xvelocity: Option<f32>,
    pub yvelocity: f32,
    pub recover: bool,
    pub recover_time: i32,
    pub damage: i32,
    pub kill: bool,
}

impl Default for FallState {
    fn default() -> Self {
        Self {
            xvelocity: None,
            yvelocity: 0.0,
            recover: true,
            recover_time: 0,
            damage: 0,
            kill: true,
        }
    }
}

/// Resource deltas waiting for the victim's Finish phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PendingDeltas {
    pub life: i32,
    pub red_life: i32,
    pub dizzy_points: i32,
    pub guard_points: i32,
    pub power: i32,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GetHitVar {
    pub attacker: Option<EntityId>,
    /// Id of the attack currently applied.
    pub hit_id: Option<i32>,
    pub attr: AttackAttr,
    pub guarded: bool,
    pub hit_type: HitType,
    pub anim_type: AnimType,

    pub pending: PendingDeltas,
    /// Damage of the most recent hit, for display and programs.
    pub last_damage: i32,

    /// Reaction velocity, victim local units, `x` relative to facing.
    pub velocity: Vec3,
    pub yaccel: f32,
    pub hit_time: i32,
    pub slide_time: i32,
    pub ctrl_time: i32,
    pub hit_shake_time: i32,

    pub fall: bool,
    pub fall_params: FallState,

    pub targeted_by: ArrayVec<JuggleEntry, { CoreConfig::MAX_TARGETED_BY }>,
    pub hit_count: i32,
    pub guard_count: i32,
    pub fall_count: i32,
    /// Tick of the most recent hit.
    pub frame: Option<u64>,

    pub kill: bool,
    /// State to enter instead of the default reaction.
    pub custom_state: Option<i32>,
    pub force_air: bool,
    pub keep_state: bool,
    /// Set by the resolver, consumed by Finish.
    pub fresh: bool,
}

impl Default for GetHitVar {
    fn default() -> Self {
        Self {
            attacker: None,
            hit_id: None,
            attr: AttackAttr::empty(),
            guarded: false,
            hit_type: HitType::default(),
            anim_type: AnimType::default(),
            pending: PendingDeltas::default(),
            last_damage: 0,
            velocity: Vec3::ZERO,
            yaccel: 0.0,
            hit_time: 0,
            slide_time: 0,
            ctrl_time: 0,
            hit_shake_time: 0,
            fall: false,
            fall_params: FallState::default(),
            targeted_by: ArrayVec::new(),
            hit_count: 0,
            guard_count: 0,
            fall_count: 0,
            frame: None,
            kill: true,
            custom_state: None,
            force_air: false,
            keep_state: false,
            fresh: false,
        }
    }
}

impl GetHitVar {
    /// Prepares for a new hit at `tick`.
    ///
    /// Pending deltas stack with another hit landing in the same tick; every
    /// other per-attack field starts over.
    pub fn begin_hit(&mut self, tick: u64) {
        let same_frame = self.frame == Some(tick);
        *self = Self {
            pending: if same_frame {
                self.pending
            } else {
                PendingDeltas::default()
            },
            fall: self.fall,
            fall_params: self.fall_params,
            targeted_by: std::mem::take(&mut self.targeted_by),
            hit_count: self.hit_count,
            guard_count: self.guard_count,
            fall_count: self.fall_count,
            frame: Some(tick),
            ..Self::default()
        };
    }

    /// Forgets everything; called when the victim stops reeling.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Juggle points spent by `attacker_root`.
    pub fn juggle_spent_by(&self, attacker_root: EntityId) -> i32 {
        self.targeted_by
            .iter()
            .find(|e| e.attacker == attacker_root)
            .map_or(0, |e| e.spent)
    }

    pub fn juggle_spent_total(&self) -> i32 {
        self.targeted_by.iter().map(|e| e.spent).sum()
    }

    /// Records juggle points spent. Returns `false` when the ledger is full and
    /// the attacker could not be added.
    pub fn register_juggle(&mut self, attacker_root: EntityId, cost: i32) -> bool {
        if let Some(entry) = self
            .targeted_by
            .iter_mut()
            .find(|e| e.attacker == attacker_root)
        {
            entry.spent += cost;
            return true;
        }
        self.targeted_by
            .try_push(JuggleEntry {
                attacker: attacker_root,
                spent: cost,
            })
            .is_ok()
    }

    pub fn is_targeted_by(&self, attacker_root: EntityId) -> bool {
        self.targeted_by.iter().any(|e| e.attacker == attacker_root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_hit_keeps_combo_state() {
        let mut ghv = GetHitVar::default();
        ghv.begin_hit(10);
        ghv.hit_count = 3;
        ghv.fall = true;
        ghv.velocity = Vec3::xy(-3.0, -5.0);
        ghv.pending.life = 40;
        ghv.register_juggle(EntityId(1), 5);

        ghv.begin_hit(11);
        assert_eq!(ghv.hit_count, 3);
        assert!(ghv.fall);
        assert_eq!(ghv.juggle_spent_by(EntityId(1)), 5);
        assert_eq!(ghv.velocity, Vec3::ZERO);
        assert_eq!(ghv.pending.life, 0);
        assert_eq!(ghv.frame, Some(11));
    }

    #[test]
    fn pending_stacks_within_a_frame() {
        let mut ghv = GetHitVar::default();
        ghv.begin_hit(4);
        ghv.pending.life = 30;
        ghv.begin_hit(4);
        ghv.pending.life += 20;
        assert_eq!(ghv.pending.life, 50);
    }

    #[test]
    fn juggle_ledger_totals() {
        let mut ghv = GetHitVar::default();
        assert!(ghv.register_juggle(EntityId(1), 4));
        assert!(ghv.register_juggle(EntityId(2), 3));
        assert!(ghv.register_juggle(EntityId(1), 2));
        assert_eq!(ghv.juggle_spent_by(EntityId(1)), 6);
        assert_eq!(ghv.juggle_spent_total(), 9);

        ghv.clear();
        assert_eq!(ghv.juggle_spent_total(), 0);
        assert!(!ghv.is_targeted_by(EntityId(1)));
    }
}
