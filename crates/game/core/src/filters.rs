//! Victim-side vulnerability filters and hit overrides.

use crate::config::CoreConfig;
use crate::flags::{AttackAttr, GuardFlags, OverrideFlags};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FilterKind {
    /// Only matching attacks may land.
    HitBy,
    /// Matching attacks may not land.
    NotHitBy,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HitByFilter {
    pub kind: FilterKind,
    pub attr: AttackAttr,
    /// Ticks left; `-1` lasts until replaced.
    pub time: i32,
    /// Stacking filters are alternatives to each other.
    pub stack: bool,
}

impl HitByFilter {
    pub fn hit_by(attr: AttackAttr, time: i32) -> Self {
        Self {
            kind: FilterKind::HitBy,
            attr,
            time,
            stack: false,
        }
    }

    pub fn not_hit_by(attr: AttackAttr, time: i32) -> Self {
        Self {
            kind: FilterKind::NotHitBy,
            attr,
            time,
            stack: false,
        }
    }

    pub fn stacking(mut self) -> Self {
        self.stack = true;
        self
    }

    fn allows(&self, attack: AttackAttr) -> bool {
        let matched = attack.matches(self.attr);
        match self.kind {
            FilterKind::HitBy => matched,
            FilterKind::NotHitBy => !matched,
        }
    }
}

/// Fixed slots of vulnerability filters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HitBySlots {
    slots: [Option<HitByFilter>; CoreConfig::MAX_HITBY_SLOTS],
}

impl HitBySlots {
    /// Writes `filter` into `slot`; out-of-range slots clamp to the last one.
    pub fn set(&mut self, slot: usize, filter: HitByFilter) {
        let last = self.slots.len() - 1;
        if slot > last {
            tracing::warn!(slot, last, "hitby slot out of range, clamped");
        }
        self.slots[slot.min(last)] = Some(filter);
    }

    pub fn clear(&mut self) {
        self.slots = Default::default();
    }

    pub fn iter(&self) -> impl Iterator<Item = &HitByFilter> {
        self.slots.iter().flatten()
    }

    /// Whether `attack` passes every active filter.
    ///
    /// Non-stacking filters must all allow the attack; when any stacking
    /// filters are active, at least one of them must allow it.
    pub fn allows(&self, attack: AttackAttr) -> bool {
        let mut any_stacking = false;
        let mut stacking_ok = false;
        for filter in self.iter() {
            if filter.stack {
                any_stacking = true;
                stacking_ok |= filter.allows(attack);
            } else if !filter.allows(attack) {
                return false;
            }
        }
        !any_stacking || stacking_ok
    }

    pub(crate) fn tick(&mut self) {
        for slot in &mut self.slots {
            if let Some(filter) = slot {
                if filter.time > 0 {
                    filter.time -= 1;
                    if filter.time == 0 {
                        *slot = None;
                    }
                }
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HitOverride {
    pub attr: AttackAttr,
    /// Attacks whose guard flags intersect this mask; empty matches all.
    pub guard_flags: GuardFlags,
    pub state_no: Option<i32>,
    /// Ticks left; `-1` lasts until replaced.
    pub time: i32,
    pub flags: OverrideFlags,
}

impl HitOverride {
    pub fn new(attr: AttackAttr, state_no: Option<i32>, time: i32) -> Self {
        Self {
            attr,
            guard_flags: GuardFlags::empty(),
            state_no,
            time,
            flags: OverrideFlags::empty(),
        }
    }

    pub fn with_flags(mut self, flags: OverrideFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_guard_flags(mut self, guard_flags: GuardFlags) -> Self {
        self.guard_flags = guard_flags;
        self
    }

    fn matches(&self, attack: AttackAttr, guard: GuardFlags) -> bool {
        self.time != 0
            && attack.matches(self.attr)
            && (self.guard_flags.is_empty() || self.guard_flags.intersects(guard))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OverrideSlots {
    slots: [Option<HitOverride>; CoreConfig::MAX_HIT_OVERRIDES],
}

impl OverrideSlots {
    pub fn set(&mut self, slot: usize, rule: HitOverride) {
        let last = self.slots.len() - 1;
        if slot > last {
            tracing::warn!(slot, last, "hit override slot out of range, clamped");
        }
        self.slots[slot.min(last)] = Some(rule);
    }

    pub fn clear(&mut self) {
        self.slots = Default::default();
    }

    /// First slot, in slot order, that intercepts the attack.
    pub fn find(&self, attack: AttackAttr, guard: GuardFlags) -> Option<HitOverride> {
        self.slots
            .iter()
            .flatten()
            .find(|rule| rule.matches(attack, guard))
            .copied()
    }

    pub(crate) fn tick(&mut self) {
        for slot in &mut self.slots {
            if let Some(rule) = slot {
                if rule.time > 0 {
                    rule.time -= 1;
                    if rule.time == 0 {
                        *slot = None;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PUNCH: AttackAttr = AttackAttr::STANDING.union(AttackAttr::NORMAL_ATTACK);
    const FIREBALL: AttackAttr = AttackAttr::STANDING.union(AttackAttr::SPECIAL_PROJECTILE);

    #[test]
    fn full_mask_not_hit_by_blocks_everything() {
        let mut slots = HitBySlots::default();
        slots.set(0, HitByFilter::not_hit_by(AttackAttr::everything(), -1));
        assert!(!slots.allows(PUNCH));
        assert!(!slots.allows(FIREBALL));
    }

    #[test]
    fn non_stacking_filters_and_together() {
        let mut slots = HitBySlots::default();
        slots.set(0, HitByFilter::hit_by(AttackAttr::POSTURES | AttackAttr::KINDS, -1));
        slots.set(1, HitByFilter::not_hit_by(AttackAttr::POSTURES | AttackAttr::PROJECTILES, -1));
        assert!(slots.allows(PUNCH));
        assert!(!slots.allows(FIREBALL));
    }

    #[test]
    fn stacking_filters_or_together() {
        let mut slots = HitBySlots::default();
        slots.set(0, HitByFilter::hit_by(AttackAttr::POSTURES | AttackAttr::NORMAL_ATTACK, -1).stacking());
        slots.set(1, HitByFilter::hit_by(AttackAttr::POSTURES | AttackAttr::SPECIAL_PROJECTILE, -1).stacking());
        assert!(slots.allows(PUNCH));
        assert!(slots.allows(FIREBALL));
        assert!(!slots.allows(AttackAttr::STANDING | AttackAttr::HYPER_ATTACK));
    }

    #[test]
    fn timed_filters_expire() {
        let mut slots = HitBySlots::default();
        slots.set(0, HitByFilter::not_hit_by(AttackAttr::everything(), 2));
        slots.tick();
        assert!(!slots.allows(PUNCH));
        slots.tick();
        assert!(slots.allows(PUNCH));
    }

    #[test]
    fn overrides_match_attr_and_guard_mask() {
        let mut overrides = OverrideSlots::default();
        overrides.set(
            0,
            HitOverride::new(AttackAttr::POSTURES | AttackAttr::PROJECTILES, Some(700), 5)
                .with_guard_flags(GuardFlags::LOW),
        );

        assert!(overrides.find(FIREBALL, GuardFlags::HIGH | GuardFlags::LOW).is_some());
        assert!(overrides.find(FIREBALL, GuardFlags::HIGH).is_none());
        assert!(overrides.find(PUNCH, GuardFlags::LOW).is_none());
    }
}
