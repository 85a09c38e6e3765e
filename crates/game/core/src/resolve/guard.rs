//! Guard decision.

use super::{AttackerView, HitOutcome};
use crate::character::{Char, MoveType, StateType};
use crate::config::Rounding;
use crate::damage::{DamageRequest, LifeMeter, compute_damage};
use crate::flags::{AssertFlags, GuardFlags, SystemFlags};

/// `Guarded` when the victim is able and willing to block; `Hit` otherwise.
pub(super) fn decide(a: &AttackerView, v: &Char) -> HitOutcome {
    let hd = &a.hit_def;
    if hd.guard_flags.is_empty() || a.asserts.contains(AssertFlags::UNGUARDABLE) {
        return HitOutcome::Hit;
    }
    if v.move_type == MoveType::BeingHit && !v.ghv.guarded {
        return HitOutcome::Hit;
    }
    if !(v.ctrl() || v.flags.contains(SystemFlags::GUARDING)) || !v.commands.holding_back() {
        return HitOutcome::Hit;
    }
    if (a.pos.x - v.pos.x) * v.facing.sign() < 0.0 {
        return HitOutcome::Hit;
    }

    let (needed, blocked) = match v.state_type {
        StateType::Standing => (GuardFlags::HIGH, AssertFlags::NO_STAND_GUARD),
        StateType::Crouching => (GuardFlags::LOW, AssertFlags::NO_CROUCH_GUARD),
        StateType::Air => (GuardFlags::AIR, AssertFlags::NO_AIR_GUARD),
        StateType::Lying => return HitOutcome::Hit,
    };
    if !hd.guard_flags.contains(needed) || v.asserts.contains(blocked) {
        return HitOutcome::Hit;
    }

    if !a.compat.is_legacy() && v.guard_points - hd.guard_points.unwrap_or_default() <= 0 {
        tracing::debug!(victim = %v.id, "guard crushed");
        return HitOutcome::Hit;
    }

    let current = v.life - v.ghv.pending.life;
    let chip = compute_damage(
        &DamageRequest::new(hd.guard_damage)
            .with_multipliers(a.attack_mul, v.defence_mul())
            .with_rounding(Rounding::from(a.compat)),
        LifeMeter {
            current,
            max: v.constants.life,
        },
        false,
    );
    if hd.guard_kill && chip >= current {
        return HitOutcome::Hit;
    }

    HitOutcome::Guarded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::CharConstants;
    use crate::common::{EntityId, Facing, TeamSide};
    use crate::config::CompatibilityMode;
    use crate::flags::CommandBuffer;
    use crate::hitdef::HitDef;
    use crate::world::WorldContext;

    fn setup(hd: HitDef) -> (AttackerView, Char) {
        let world = WorldContext::default();
        let mut a = Char::new_root(
            EntityId(1),
            TeamSide::One,
            0,
            CharConstants::default(),
            CompatibilityMode::Current,
            &world,
        );
        a.declare_attack(hd, &world.config);
        let mut v = Char::new_root(
            EntityId(2),
            TeamSide::Two,
            1,
            CharConstants::default(),
            CompatibilityMode::Current,
            &world,
        );
        v.pos.x = 30.0;
        v.facing = Facing::Left;
        v.commands = CommandBuffer::BACK;
        (AttackerView::of_char(&a).unwrap(), v)
    }

    fn guardable() -> HitDef {
        let mut hd = HitDef::default();
        hd.guard_flags = GuardFlags::HIGH | GuardFlags::LOW;
        hd
    }

    #[test]
    fn facing_away_cannot_guard() {
        let (a, mut v) = setup(guardable());
        assert_eq!(decide(&a, &v), HitOutcome::Guarded);
        v.facing = Facing::Right;
        assert_eq!(decide(&a, &v), HitOutcome::Hit);
    }

    #[test]
    fn crouching_needs_low_flag() {
        let mut hd = guardable();
        hd.guard_flags = GuardFlags::HIGH;
        let (a, mut v) = setup(hd);
        v.state_type = StateType::Crouching;
        assert_eq!(decide(&a, &v), HitOutcome::Hit);
    }

    #[test]
    fn guard_points_crush() {
        let mut hd = guardable();
        hd.guard_points = Some(1000);
        let (a, v) = setup(hd);
        assert_eq!(decide(&a, &v), HitOutcome::Hit);
    }

    #[test]
    fn lethal_chip_breaks_the_guard() {
        let mut hd = guardable();
        hd.guard_damage = 50;
        let (a, mut v) = setup(hd.clone());
        v.life = 40;
        assert_eq!(decide(&a, &v), HitOutcome::Hit);

        hd.guard_kill = false;
        let (a, mut v) = setup(hd);
        v.life = 40;
        assert_eq!(decide(&a, &v), HitOutcome::Guarded);
    }
}
