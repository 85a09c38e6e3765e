//! Mutual-attack arbitration.
//!
//! When two armed attacks reach each other in the same tick, this decides
//! which of them connects. The rule is symmetric: swapping the arguments
//! swaps `FirstWins` and `SecondWins` and leaves the other results alone.

use crate::common::EntityId;
use crate::hitdef::{HitDef, TradeType};

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
pub enum Arbitration {
    FirstWins,
    SecondWins,
    /// Neither connects; both stay armed.
    Neither,
}

impl Arbitration {
    pub fn mirrored(self) -> Self {
        match self {
            Self::FirstWins => Self::SecondWins,
            Self::SecondWins => Self::FirstWins,
            other => other,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Contender<'a> {
    pub id: EntityId,
    pub hit_def: &'a HitDef,
}

/// Settles an exchange between two armed attacks.
///
/// `coin` is only consulted for two attacks of equal priority that both trade
/// as `Hit`, and must pick the same entity regardless of argument order. The
/// loser is disarmed for the exchange.
pub fn arbitrate(
    a: Contender<'_>,
    b: Contender<'_>,
    coin: impl FnOnce(EntityId, EntityId) -> EntityId,
) -> Arbitration {
    let (ha, hb) = (a.hit_def, b.hit_def);

    match (ha.reversal_attr, hb.reversal_attr) {
        (Some(_), Some(_)) => return Arbitration::Neither,
        (Some(filter), None) => {
            return if hb.attr.matches(filter) {
                Arbitration::FirstWins
            } else {
                Arbitration::SecondWins
            };
        }
        (None, Some(filter)) => {
            return if ha.attr.matches(filter) {
                Arbitration::SecondWins
            } else {
                Arbitration::FirstWins
            };
        }
        (None, None) => {}
    }

    if ha.priority.value != hb.priority.value {
        return if ha.priority.value > hb.priority.value {
            Arbitration::FirstWins
        } else {
            Arbitration::SecondWins
        };
    }

    match (ha.priority.trade, hb.priority.trade) {
        (TradeType::Hit, TradeType::Hit) => {
            if coin(a.id, b.id) == a.id {
                Arbitration::FirstWins
            } else {
                Arbitration::SecondWins
            }
        }
        (TradeType::Hit, _) => Arbitration::FirstWins,
        (_, TradeType::Hit) => Arbitration::SecondWins,
        _ => Arbitration::Neither,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{PcgRng, RngOracle, compute_seed};
    use crate::flags::AttackAttr;
    use crate::hitdef::Priority;

    const PUNCH: AttackAttr = AttackAttr::STANDING.union(AttackAttr::NORMAL_ATTACK);
    const THROW: AttackAttr = AttackAttr::STANDING.union(AttackAttr::NORMAL_THROW);

    fn hd(attr: AttackAttr, value: i32, trade: TradeType) -> HitDef {
        let mut hd = HitDef::new(attr);
        hd.priority = Priority::new(value, trade);
        hd
    }

    fn both_ways(a: &HitDef, b: &HitDef, seed: u64) -> (Arbitration, Arbitration) {
        let rng = PcgRng;
        let coin = |x, y| rng.coin_flip(compute_seed(seed, 0, x, y), x, y);
        let ab = arbitrate(
            Contender { id: EntityId(1), hit_def: a },
            Contender { id: EntityId(2), hit_def: b },
            coin,
        );
        let ba = arbitrate(
            Contender { id: EntityId(2), hit_def: b },
            Contender { id: EntityId(1), hit_def: a },
            coin,
        );
        (ab, ba)
    }

    #[test]
    fn higher_priority_wins() {
        let (ab, ba) = both_ways(
            &hd(PUNCH, 5, TradeType::Hit),
            &hd(PUNCH, 4, TradeType::Hit),
            0,
        );
        assert_eq!(ab, Arbitration::FirstWins);
        assert_eq!(ba, ab.mirrored());
    }

    #[test]
    fn equal_priority_rules() {
        let hit = hd(PUNCH, 4, TradeType::Hit);
        let miss = hd(PUNCH, 4, TradeType::Miss);
        let dodge = hd(PUNCH, 4, TradeType::Dodge);

        assert!(matches!(
            both_ways(&hit, &hit, 0).0,
            Arbitration::FirstWins | Arbitration::SecondWins
        ));
        assert_eq!(both_ways(&hit, &miss, 0).0, Arbitration::FirstWins);
        assert_eq!(both_ways(&dodge, &hit, 0).0, Arbitration::SecondWins);
        assert_eq!(both_ways(&miss, &dodge, 0).0, Arbitration::Neither);
    }

    #[test]
    fn reversal_beats_matching_attack_only() {
        let reversal = HitDef::reversal(AttackAttr::POSTURES | AttackAttr::NORMAL_ATTACK);
        let (ab, _) = both_ways(&reversal, &hd(PUNCH, 7, TradeType::Hit), 0);
        assert_eq!(ab, Arbitration::FirstWins);
        let (ab, _) = both_ways(&reversal, &hd(THROW, 1, TradeType::Hit), 0);
        assert_eq!(ab, Arbitration::SecondWins);
    }

    #[test]
    fn equal_hit_clash_picks_exactly_one_deterministically() {
        for attack in [hd(PUNCH, 4, TradeType::Hit), hd(THROW, 4, TradeType::Hit)] {
            for seed in 0..32 {
                let (ab, ba) = both_ways(&attack, &attack, seed);
                assert!(matches!(ab, Arbitration::FirstWins | Arbitration::SecondWins));
                assert_eq!(ba, ab.mirrored());
                assert_eq!(both_ways(&attack, &attack, seed).0, ab);
            }
        }
    }
}
