//! Hit detection passes, run once per tick after push resolution.
//!
//! Order matters: reversals intercept attacks before they can land, then
//! character attacks, then projectiles. Every pass walks characters in run
//! order, given as indices into the character slice, so entities scheduled
//! first also claim their hits and clashes first.

use crate::character::{AnimCursor, Char};
use crate::common::EntityId;
use crate::env::{AnimFrame, AnimationOracle, RngOracle, compute_seed};
use crate::geometry::{BoxSet, HitBox, boxes_overlap, depth_ranges_overlap};
use crate::hitdef::HitDef;
use crate::projectile::{Projectile, trade};
use crate::registry::pair_mut;
use crate::resolve::{
    Arbitration, AttackerView, CommitResult, Contender, HitOutcome, HitPlan, arbitrate, commit,
    evaluate,
};
use crate::world::WorldContext;

/// One landed attack.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HitEvent {
    /// Attacking character, or the projectile's owner.
    pub attacker: EntityId,
    pub victim: EntityId,
    pub projectile: Option<EntityId>,
    pub outcome: HitOutcome,
    pub damage: i32,
    /// Landed by a reversal intercepting the victim's own attack.
    pub reversal: bool,
}

impl HitEvent {
    fn new(attacker: EntityId, victim: EntityId, res: &CommitResult) -> Self {
        Self {
            attacker,
            victim,
            projectile: None,
            outcome: if res.guarded {
                HitOutcome::Guarded
            } else {
                HitOutcome::Hit
            },
            damage: res.damage,
            reversal: false,
        }
    }
}

fn frame<'a, A>(anims: &'a A, who: EntityId, cursor: AnimCursor) -> AnimFrame<'a>
where
    A: AnimationOracle + ?Sized,
{
    anims
        .frame(cursor.anim_no, cursor.elapsed)
        .unwrap_or_else(|err| {
            tracing::warn!(entity = %who, anim = cursor.anim_no, error = %err, "no collision boxes");
            AnimFrame::EMPTY
        })
}

fn char_boxes<'a>(c: &Char, boxes: &'a [HitBox]) -> BoxSet<'a> {
    let ls = c.local_scale;
    BoxSet::new(boxes, [c.pos.x, c.pos.y], c.facing.sign())
        .with_scale([c.constants.scale[0] * ls, c.constants.scale[1] * ls])
        .with_angle(c.angle)
}

fn projectile_boxes<'a>(p: &Projectile, boxes: &'a [HitBox]) -> BoxSet<'a> {
    BoxSet::new(boxes, [p.pos.x, p.pos.y], p.facing.sign())
        .with_scale([p.local_scale, p.local_scale])
}

fn within_depth(world: &WorldContext, center: f32, hd: &HitDef, scale: f32, v: &Char) -> bool {
    !world.config.depth_enabled
        || depth_ranges_overlap(
            center,
            hd.depth.unwrap_or_default(),
            scale,
            v.pos.z,
            v.size.depth,
            1.0,
        )
}

/// Attacker-side bookkeeping after a character attack lands.
fn credit_attacker(a: &mut Char, victim: EntityId, res: &CommitResult, tick: u64) {
    a.add_power(res.attacker_power);
    a.hit_pause = res.attacker_pause.max(0);
    if !a.hit_targets.contains(&victim) && a.hit_targets.try_push(victim).is_err() {
        tracing::warn!(entity = %a.id, %victim, "hit target list full");
    }
    a.add_target(victim);
    if res.guarded {
        a.move_contact.guarded = true;
    } else {
        a.move_contact.hit = true;
    }
    a.contact_tick.get_or_insert(tick);
    if res.p1_state.is_some() {
        a.pending_state = res.p1_state;
    }
    if let Some(vx) = res.cornerpush {
        a.vel.x = vx;
    }
}

fn armed_reversal(c: &Char) -> bool {
    c.attack_armed && c.attack.as_ref().is_some_and(HitDef::is_reversal)
}

/// Armed reversals against opposing armed attacks their filter matches.
///
/// An intercepted attacker is disarmed and takes the reversal's hit.
pub(crate) fn reversal_pass<A>(
    chars: &mut [Char],
    order: &[usize],
    world: &WorldContext,
    anims: &A,
    events: &mut Vec<HitEvent>,
) where
    A: AnimationOracle + ?Sized,
{
    for &r in order {
        if !armed_reversal(&chars[r]) {
            continue;
        }
        let r_frame = frame(anims, chars[r].id, chars[r].anim);
        for &a in order {
            if a == r {
                continue;
            }
            let (rc, ac) = pair_mut(chars, r, a);
            if rc.team == ac.team || !ac.attack_armed || ac.is_inert() {
                continue;
            }
            let (Some(filter), Some(incoming)) = (
                rc.attack.as_ref().and_then(|hd| hd.reversal_attr),
                ac.attack.as_ref(),
            ) else {
                continue;
            };
            if incoming.is_reversal() || !incoming.attr.matches(filter) {
                continue;
            }
            let a_frame = frame(anims, ac.id, ac.anim);
            if !boxes_overlap(&char_boxes(rc, r_frame.attack), &char_boxes(ac, a_frame.attack)) {
                continue;
            }
            let Some(view) = AttackerView::of_char(rc) else {
                continue;
            };
            if view.hit_targets.contains(&ac.id)
                || !within_depth(world, rc.pos.z, &view.hit_def, rc.local_scale, ac)
            {
                continue;
            }

            let plan = HitPlan {
                outcome: HitOutcome::Hit,
                posture: ac.posture(),
                override_state: None,
                force_air: false,
                keep_state: false,
                juggle_checked: false,
            };
            ac.attack_armed = false;
            let res = commit(&view, ac, &plan, world);
            credit_attacker(rc, ac.id, &res, world.tick);
            rc.move_contact.reversed = true;
            tracing::debug!(reverser = %rc.id, attacker = %ac.id, "attack reversed");
            events.push(HitEvent {
                reversal: true,
                ..HitEvent::new(rc.id, ac.id, &res)
            });
        }
    }
}

/// Character attacks against opposing characters.
///
/// When the victim's own armed attack reaches back and would land too, the
/// exchange is settled by [`arbitrate`] before anything commits.
pub(crate) fn player_pass<A, R>(
    chars: &mut [Char],
    order: &[usize],
    world: &WorldContext,
    anims: &A,
    rng: &R,
    events: &mut Vec<HitEvent>,
) where
    A: AnimationOracle + ?Sized,
    R: RngOracle + ?Sized,
{
    let coin = |x: EntityId, y: EntityId| rng.coin_flip(compute_seed(world.seed, world.tick, x, y), x, y);

    for &ai in order {
        if !chars[ai].attack_armed || armed_reversal(&chars[ai]) {
            continue;
        }
        let Some(mut view) = AttackerView::of_char(&chars[ai]) else {
            continue;
        };
        let a_frame = frame(anims, chars[ai].id, chars[ai].anim);
        if a_frame.attack.is_empty() {
            continue;
        }

        for &vi in order {
            if vi == ai {
                continue;
            }
            let (a, v) = pair_mut(chars, ai, vi);
            if !a.attack_armed {
                break;
            }
            if v.team == a.team || v.is_inert() {
                continue;
            }
            let v_frame = frame(anims, v.id, v.anim);
            if !boxes_overlap(&char_boxes(a, a_frame.attack), &char_boxes(v, v_frame.vulnerable))
                || !within_depth(world, a.pos.z, &view.hit_def, a.local_scale, v)
            {
                continue;
            }

            let plan = match evaluate(&view, v, world) {
                Ok(plan) => plan,
                Err(reason) => {
                    tracing::debug!(attacker = %a.id, victim = %v.id, %reason, "attack rejected");
                    continue;
                }
            };

            let reaches_back = v.attack_armed
                && !armed_reversal(v)
                && boxes_overlap(&char_boxes(v, v_frame.attack), &char_boxes(a, a_frame.vulnerable));
            let counter = if reaches_back {
                AttackerView::of_char(v).filter(|theirs| evaluate(theirs, a, world).is_ok())
            } else {
                None
            };
            if let Some(theirs) = counter {
                let verdict = arbitrate(
                    Contender {
                        id: a.id,
                        hit_def: &view.hit_def,
                    },
                    Contender {
                        id: v.id,
                        hit_def: &theirs.hit_def,
                    },
                    coin,
                );
                tracing::debug!(first = %a.id, second = %v.id, %verdict, "attacks clashed");
                match verdict {
                    Arbitration::FirstWins => v.attack_armed = false,
                    Arbitration::SecondWins => {
                        a.attack_armed = false;
                        break;
                    }
                    Arbitration::Neither => continue,
                }
            }

            let res = commit(&view, v, &plan, world);
            credit_attacker(a, v.id, &res, world.tick);
            // try_push: a full list only loses AlreadyHit bookkeeping.
            let _ = view.hit_targets.try_push(v.id);
            events.push(HitEvent::new(a.id, v.id, &res));
        }
    }
}

/// Projectile trades first, then projectiles against characters.
///
/// Projectiles take their owner's place in the run order; ownerless ones go
/// last.
pub(crate) fn projectile_pass<A>(
    chars: &mut [Char],
    order: &[usize],
    projectiles: &mut [Projectile],
    world: &WorldContext,
    anims: &A,
    events: &mut Vec<HitEvent>,
) where
    A: AnimationOracle + ?Sized,
{
    let shots = {
        let rank = |owner: EntityId| {
            order
                .iter()
                .position(|&i| chars[i].id == owner)
                .unwrap_or(usize::MAX)
        };
        let mut shots: Vec<usize> = (0..projectiles.len()).collect();
        shots.sort_by_key(|&i| rank(projectiles[i].owner));
        shots
    };

    for (n, &i) in shots.iter().enumerate() {
        for &j in &shots[n + 1..] {
            let (p, q) = pair_mut(projectiles, i, j);
            if p.team == q.team || !p.can_hit() || !q.can_hit() {
                continue;
            }
            let (pf, qf) = (frame(anims, p.id, p.anim), frame(anims, q.id, q.anim));
            if boxes_overlap(&projectile_boxes(p, pf.attack), &projectile_boxes(q, qf.attack)) {
                trade(p, q);
                tracing::debug!(first = %p.id, second = %q.id, "projectiles traded");
            }
        }
    }

    for &pi in &shots {
        let p = &mut projectiles[pi];
        if !p.can_hit() {
            continue;
        }
        let p_frame = frame(anims, p.id, p.anim);
        if p_frame.attack.is_empty() {
            continue;
        }
        let owner = chars.iter().position(|c| c.id == p.owner);

        for &vi in order {
            if !p.can_hit() {
                break;
            }
            let v = &chars[vi];
            if v.team == p.team || v.is_inert() {
                continue;
            }
            let v_frame = frame(anims, v.id, v.anim);
            if !boxes_overlap(&projectile_boxes(p, p_frame.attack), &char_boxes(v, v_frame.vulnerable))
                || !within_depth(world, p.pos.z, &p.hit_def, p.local_scale, v)
            {
                continue;
            }

            let view = AttackerView::of_projectile(p, owner.map(|o| &chars[o]));
            let plan = match evaluate(&view, v, world) {
                Ok(plan) => plan,
                Err(reason) => {
                    tracing::debug!(projectile = %p.id, victim = %v.id, %reason, "projectile rejected");
                    continue;
                }
            };
            let victim = v.id;
            let res = commit(&view, &mut chars[vi], &plan, world);
            p.on_hit(res.attacker_pause);
            if let Some(o) = owner {
                let o = &mut chars[o];
                o.add_power(res.attacker_power);
                o.add_target(victim);
                if res.guarded {
                    o.move_contact.guarded = true;
                } else {
                    o.move_contact.hit = true;
                }
            }
            events.push(HitEvent {
                projectile: Some(p.id),
                ..HitEvent::new(p.owner, victim, &res)
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::{CharConstants, MoveType};
    use crate::common::{Facing, TeamSide};
    use crate::config::CompatibilityMode;
    use crate::env::{PcgRng, StaticAnimations};
    use crate::filters::HitByFilter;
    use crate::flags::AttackAttr;
    use crate::hitdef::{Priority, TradeType};
    use crate::projectile::{ProjectileSpec, ProjectileStage};

    const BODY: HitBox = HitBox::new(-15.0, -90.0, 15.0, 0.0);
    const FIST: HitBox = HitBox::new(0.0, -80.0, 45.0, -60.0);
    const STANCE: i32 = 0;
    const SWING: i32 = 200;

    fn anims() -> StaticAnimations {
        StaticAnimations::new()
            .with_still(STANCE, &[], &[BODY])
            .with_still(SWING, &[FIST], &[BODY])
    }

    fn fighter(id: u32, team: TeamSide, x: f32, world: &WorldContext) -> Char {
        let mut c = Char::new_root(
            EntityId(id),
            team,
            id as usize,
            CharConstants::default(),
            CompatibilityMode::Current,
            world,
        );
        c.pos.x = x;
        c.facing = if team == TeamSide::One {
            Facing::Right
        } else {
            Facing::Left
        };
        c
    }

    fn swing(c: &mut Char, hd: HitDef, world: &WorldContext) {
        c.declare_attack(hd, &world.config);
        c.move_type = MoveType::Attack;
        c.anim.anim_no = SWING;
        c.attack_armed = true;
    }

    fn punch(damage: i32) -> HitDef {
        let mut hd = HitDef::default();
        hd.hit_damage = damage;
        hd.priority = Priority::new(4, TradeType::Hit);
        hd
    }

    #[test]
    fn single_attack_lands_once() {
        let world = WorldContext::default();
        let mut chars = vec![
            fighter(1, TeamSide::One, 0.0, &world),
            fighter(2, TeamSide::Two, 30.0, &world),
        ];
        swing(&mut chars[0], punch(20), &world);

        let mut events = Vec::new();
        player_pass(&mut chars, &[0, 1], &world, &anims(), &PcgRng, &mut events);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].victim, EntityId(2));
        assert_eq!(chars[1].ghv.pending.life, 20);
        assert!(chars[0].move_contact.hit);
        assert_eq!(chars[0].targets.as_slice(), &[EntityId(2)]);

        player_pass(&mut chars, &[0, 1], &world, &anims(), &PcgRng, &mut events);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn out_of_reach_does_nothing() {
        let world = WorldContext::default();
        let mut chars = vec![
            fighter(1, TeamSide::One, 0.0, &world),
            fighter(2, TeamSide::Two, 80.0, &world),
        ];
        swing(&mut chars[0], punch(20), &world);
        let mut events = Vec::new();
        player_pass(&mut chars, &[0, 1], &world, &anims(), &PcgRng, &mut events);
        assert!(events.is_empty());
        assert_eq!(chars[1].ghv.attacker, None);
    }

    #[test]
    fn equal_hits_land_exactly_one() {
        let clash = |seed| {
            let world = WorldContext::new(Default::default(), seed);
            let mut chars = vec![
                fighter(1, TeamSide::One, 0.0, &world),
                fighter(2, TeamSide::Two, 30.0, &world),
            ];
            swing(&mut chars[0], punch(10), &world);
            swing(&mut chars[1], punch(30), &world);

            let mut events = Vec::new();
            player_pass(&mut chars, &[0, 1], &world, &anims(), &PcgRng, &mut events);
            assert_eq!(events.len(), 1, "seed {seed}");
            assert_eq!(chars.iter().filter(|c| !c.attack_armed).count(), 1, "seed {seed}");
            events[0].attacker
        };
        for seed in 0..16 {
            assert_eq!(clash(seed), clash(seed));
        }
    }

    #[test]
    fn counter_that_cannot_land_does_not_clash() {
        let world = WorldContext::default();
        let mut chars = vec![
            fighter(1, TeamSide::One, 0.0, &world),
            fighter(2, TeamSide::Two, 30.0, &world),
        ];
        let mut weak = punch(20);
        weak.priority = Priority::new(3, TradeType::Hit);
        let mut strong = punch(40);
        strong.priority = Priority::new(5, TradeType::Hit);
        swing(&mut chars[0], weak, &world);
        swing(&mut chars[1], strong, &world);
        chars[0]
            .hit_by
            .set(0, HitByFilter::not_hit_by(AttackAttr::everything(), -1));

        for order in [vec![0, 1], vec![1, 0]] {
            let mut chars = chars.clone();
            let mut events = Vec::new();
            player_pass(&mut chars, &order, &world, &anims(), &PcgRng, &mut events);
            assert_eq!(events.len(), 1, "order {order:?}");
            assert_eq!(events[0].attacker, EntityId(1));
            assert_eq!(chars[1].ghv.pending.life, 20);
            assert_eq!(chars[0].ghv.pending.life, 0);
        }
    }

    #[test]
    fn run_order_decides_who_strikes_first() {
        let world = WorldContext::default();
        let mut chars = vec![
            fighter(1, TeamSide::One, 0.0, &world),
            fighter(2, TeamSide::Two, 30.0, &world),
            fighter(3, TeamSide::One, -5.0, &world),
        ];
        swing(&mut chars[0], punch(10), &world);
        swing(&mut chars[2], punch(10), &world);

        let mut events = Vec::new();
        player_pass(&mut chars.clone(), &[2, 0, 1], &world, &anims(), &PcgRng, &mut events);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].attacker, EntityId(3));

        events.clear();
        player_pass(&mut chars, &[0, 1, 2], &world, &anims(), &PcgRng, &mut events);
        assert_eq!(events[0].attacker, EntityId(1));
    }

    #[test]
    fn throw_clash_lands_exactly_one() {
        let throw = || {
            let mut hd = HitDef::new(AttackAttr::STANDING | AttackAttr::NORMAL_THROW);
            hd.priority = Priority::new(4, TradeType::Hit);
            hd
        };
        for seed in 0..16 {
            let world = WorldContext::new(Default::default(), seed);
            let mut chars = vec![
                fighter(1, TeamSide::One, 0.0, &world),
                fighter(2, TeamSide::Two, 30.0, &world),
            ];
            swing(&mut chars[0], throw(), &world);
            swing(&mut chars[1], throw(), &world);

            let mut events = Vec::new();
            player_pass(&mut chars, &[0, 1], &world, &anims(), &PcgRng, &mut events);
            assert_eq!(events.len(), 1, "seed {seed}");
            let disarmed = chars.iter().filter(|c| !c.attack_armed).count();
            assert_eq!(disarmed, 1, "seed {seed}");
        }
    }

    #[test]
    fn reversal_intercepts_matching_attack() {
        let world = WorldContext::default();
        let mut chars = vec![
            fighter(1, TeamSide::One, 0.0, &world),
            fighter(2, TeamSide::Two, 30.0, &world),
        ];
        swing(&mut chars[0], punch(20), &world);
        let mut counter = HitDef::reversal(AttackAttr::POSTURES | AttackAttr::NORMAL_ATTACK);
        counter.hit_damage = 50;
        swing(&mut chars[1], counter, &world);

        let mut events = Vec::new();
        reversal_pass(&mut chars, &[0, 1], &world, &anims(), &mut events);
        player_pass(&mut chars, &[0, 1], &world, &anims(), &PcgRng, &mut events);

        assert_eq!(events.len(), 1);
        assert!(events[0].reversal);
        assert_eq!(events[0].victim, EntityId(1));
        assert!(!chars[0].attack_armed);
        assert!(chars[1].move_contact.reversed);
        assert_eq!(chars[0].ghv.pending.life, 50);
        assert_eq!(chars[1].ghv.pending.life, 0);
    }

    #[test]
    fn single_hit_projectile_connects_once() {
        let world = WorldContext::default();
        let mut chars = vec![
            fighter(1, TeamSide::One, -100.0, &world),
            fighter(2, TeamSide::Two, 30.0, &world),
            fighter(3, TeamSide::Two, 35.0, &world),
        ];
        let mut spec = ProjectileSpec::new(punch(25)).with_anim(SWING);
        spec.offset.x = 100.0;
        let mut projectiles = vec![Projectile::spawn(EntityId(9), &chars[0], spec, &world)];

        let mut events = Vec::new();
        projectile_pass(&mut chars, &[0, 1, 2], &mut projectiles, &world, &anims(), &mut events);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].projectile, Some(EntityId(9)));
        assert_eq!(events[0].attacker, EntityId(1));
        assert_eq!(projectiles[0].stage, ProjectileStage::Removing);
        assert_eq!(projectiles[0].hits, -1);
        assert!(chars[0].move_contact.hit);
        assert_eq!(chars[2].ghv.attacker, None);
    }
}
