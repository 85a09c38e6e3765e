//! Shared damage formula.
//!
//! Every life, guard-point and dizzy-point delta goes through
//! [`compute_damage`]. The multiply and clamp chain runs in `f64`; only the
//! final value is rounded to an integer resource unit.

use crate::config::Rounding;

/// Current and maximum of a resource meter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LifeMeter {
    pub current: i32,
    pub max: i32,
}

impl LifeMeter {
    pub const fn new(current: i32, max: i32) -> Self {
        Self { current, max }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DamageRequest {
    /// Nominal damage; negative values heal.
    pub amount: i32,
    /// Attacker's attack multiplier (`1.0` is neutral).
    pub attack_mul: f64,
    /// Victim's defence multiplier (`1.0` is neutral).
    pub defence_mul: f64,
    /// May the result take the meter to exactly zero.
    pub kill: bool,
    /// Ignore both multipliers.
    pub absolute: bool,
    pub rounding: Rounding,
}

impl DamageRequest {
    pub fn new(amount: i32) -> Self {
        Self {
            amount,
            attack_mul: 1.0,
            defence_mul: 1.0,
            kill: true,
            absolute: false,
            rounding: Rounding::default(),
        }
    }

    pub fn with_multipliers(mut self, attack_mul: f64, defence_mul: f64) -> Self {
        self.attack_mul = attack_mul;
        self.defence_mul = defence_mul;
        self
    }

    pub fn with_kill(mut self, kill: bool) -> Self {
        self.kill = kill;
        self
    }

    pub fn absolute(mut self) -> Self {
        self.absolute = true;
        self
    }

    pub fn with_rounding(mut self, rounding: Rounding) -> Self {
        self.rounding = rounding;
        self
    }
}

/// Damage to subtract from `life`.
///
/// A strictly positive nominal amount never scales below a magnitude of 1
/// unless the attack multiplier is exactly zero. With `bounds`, the result
/// never takes the meter below zero (below one when `kill` is false) nor above
/// `max`; at 1 life a non-lethal hit therefore deals 0.
pub fn compute_damage(req: &DamageRequest, life: LifeMeter, bounds: bool) -> i32 {
    if req.amount == 0 || (!req.absolute && req.attack_mul == 0.0) {
        return 0;
    }

    let nominal = f64::from(req.amount);
    let mut value = if req.absolute {
        nominal
    } else {
        let defence = if req.defence_mul > 0.0 {
            req.defence_mul
        } else {
            1.0
        };
        nominal * req.attack_mul / defence
    };

    if !value.is_finite() {
        value = nominal;
    }
    if value.abs() < 1.0 {
        value = nominal.signum();
    }

    let mut damage = req.rounding.apply(value);
    if damage == 0 {
        damage = req.amount.signum();
    }

    if bounds {
        let floor = -(life.max - life.current).max(0);
        let ceiling = if req.kill {
            life.current.max(0)
        } else {
            (life.current - 1).max(0)
        };
        damage = damage.clamp(floor, ceiling);
    }

    damage
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multipliers_scale_damage() {
        let req = DamageRequest::new(100).with_multipliers(1.5, 2.0);
        assert_eq!(compute_damage(&req, LifeMeter::new(1000, 1000), true), 75);
    }

    #[test]
    fn small_damage_never_rounds_to_zero() {
        let req = DamageRequest::new(1).with_multipliers(0.1, 1.0);
        assert_eq!(compute_damage(&req, LifeMeter::new(1000, 1000), false), 1);

        let heal = DamageRequest::new(-1).with_multipliers(0.1, 1.0);
        assert_eq!(compute_damage(&heal, LifeMeter::new(500, 1000), false), -1);
    }

    #[test]
    fn zero_attack_multiplier_deals_nothing() {
        let req = DamageRequest::new(50).with_multipliers(0.0, 1.0);
        assert_eq!(compute_damage(&req, LifeMeter::new(1000, 1000), true), 0);

        let absolute = req.absolute();
        assert_eq!(compute_damage(&absolute, LifeMeter::new(1000, 1000), true), 50);
    }

    #[test]
    fn bounds_respect_kill_flag() {
        let lethal = DamageRequest::new(300);
        assert_eq!(compute_damage(&lethal, LifeMeter::new(120, 1000), true), 120);

        let spare = lethal.with_kill(false);
        assert_eq!(compute_damage(&spare, LifeMeter::new(120, 1000), true), 119);
        assert_eq!(compute_damage(&spare, LifeMeter::new(1, 1000), true), 0);
    }

    #[test]
    fn healing_stops_at_max() {
        let heal = DamageRequest::new(-300);
        assert_eq!(compute_damage(&heal, LifeMeter::new(900, 1000), true), -100);
    }

    #[test]
    fn rounding_mode_applies_last() {
        let req = DamageRequest::new(10).with_multipliers(1.25, 1.0);
        assert_eq!(compute_damage(&req, LifeMeter::new(1000, 1000), false), 12);
        let nearest = req.with_rounding(Rounding::Nearest);
        assert_eq!(compute_damage(&nearest, LifeMeter::new(1000, 1000), false), 13);
    }
}
