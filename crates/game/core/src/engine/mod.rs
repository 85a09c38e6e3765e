//! Tick scheduler.
//!
//! The [`FightEngine`] is the only thing that advances a [`MatchState`]. One
//! call to [`FightEngine::tick`] runs every stage of [`TickPhase`] in order and
//! reports what happened. Given the same state and the same collaborators, a
//! tick always produces the same next state.

mod phase;

pub use phase::TickPhase;

use std::collections::VecDeque;

use crate::character::{Bind, Char, Effect, EntitySummary, MoveType, SpawnBudget, StateController};
use crate::collision::{self, HitEvent};
use crate::common::{EntityId, Facing, TeamSide, Vec3};
use crate::config::Rounding;
use crate::damage::{DamageRequest, LifeMeter, compute_damage};
use crate::env::FightEnv;
use crate::error::SpawnError;
use crate::flags::SystemFlags;
use crate::push;
use crate::registry::CharList;
use crate::snapshot::MatchState;
use crate::world::WorldContext;

/// Everything observable that happened during one tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    /// Tick number that was simulated.
    pub tick: u64,
    pub hits: Vec<HitEvent>,
    pub spawn_failures: Vec<SpawnError>,
    /// Entities whose program step was cut short by the state-loop guard.
    pub aborted: Vec<EntityId>,
}

/// Drives a borrowed [`MatchState`] forward one tick at a time.
pub struct FightEngine<'a> {
    state: &'a mut MatchState,
}

impl<'a> FightEngine<'a> {
    pub fn new(state: &'a mut MatchState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &MatchState {
        self.state
    }

    /// Simulates one tick.
    pub fn tick(&mut self, env: FightEnv<'_>) -> TickReport {
        let tick = self.state.world.tick;
        let span = tracing::debug_span!("tick", tick);
        let _guard = span.enter();

        let mut report = TickReport {
            tick,
            ..TickReport::default()
        };
        let MatchState { world, chars } = &mut *self.state;

        enter(TickPhase::Input);
        for c in chars.chars_mut() {
            c.commands = env.commands().sample(c.player_no, tick);
        }

        enter(TickPhase::Prepare);
        chars.sort_run_order();
        for c in chars.chars_mut() {
            c.prepare(world);
        }

        enter(TickPhase::Program);
        run_programs(world, chars, env, &mut report);

        enter(TickPhase::Arm);
        for c in chars.chars_mut() {
            arm(c, tick);
        }

        enter(TickPhase::Push);
        push::resolve_push(chars.chars_mut(), world);

        enter(TickPhase::Hit);
        let order = chars.run_indices();
        collision::reversal_pass(chars.chars_mut(), &order, world, env.animations(), &mut report.hits);
        collision::player_pass(
            chars.chars_mut(),
            &order,
            world,
            env.animations(),
            env.rng(),
            &mut report.hits,
        );
        let (fighters, projectiles) = chars.split_mut();
        collision::projectile_pass(
            fighters,
            &order,
            projectiles,
            world,
            env.animations(),
            &mut report.hits,
        );

        enter(TickPhase::Finish);
        for c in chars.chars_mut() {
            c.finish(world);
        }
        let (_, projectiles) = chars.split_mut();
        for p in projectiles {
            p.advance(world);
        }
        turn_towards_enemies(chars.chars_mut());

        enter(TickPhase::Bind);
        resolve_binds(chars);

        enter(TickPhase::Compact);
        world.advance_pause();
        world.tick += 1;
        chars.compact();

        if !report.hits.is_empty() {
            tracing::debug!(hits = report.hits.len(), "tick resolved");
        }
        report
    }
}

fn enter(phase: TickPhase) {
    tracing::trace!(%phase, "phase");
}

/// An attack may strike while the move is an attack, the attacker is not
/// halted, and it has not already connected on an earlier tick.
fn arm(c: &mut Char, tick: u64) {
    c.attack_armed = c.attack.is_some()
        && c.move_type == MoveType::Attack
        && !c.halted()
        && c.contact_tick.is_none_or(|t| t == tick);
}

fn run_programs(world: &mut WorldContext, chars: &mut CharList, env: FightEnv<'_>, report: &mut TickReport) {
    let summaries: Vec<EntitySummary> = chars.chars().iter().map(EntitySummary::of).collect();
    let mut queue: VecDeque<EntityId> = chars.run_order().iter().copied().collect();
    let mut effects = Vec::new();

    while let Some(id) = queue.pop_front() {
        let Some(idx) = chars.index_of(id) else {
            continue;
        };
        let c = &chars.chars()[idx];
        if c.halted() || c.flags.intersects(SystemFlags::DISABLED | SystemFlags::DESTROY) {
            continue;
        }

        let mut budget = SpawnBudget {
            entities: chars.entity_room(world),
            projectiles: chars.projectile_room(world),
        };
        let c = &mut chars.chars_mut()[idx];
        let stepped =
            StateController::new(c, &summaries, world, &mut effects, &mut budget).run(env.program());
        if let Err(err) = stepped {
            tracing::warn!(entity = %id, error = %err, "program step aborted");
            report.aborted.push(id);
            effects.clear();
            continue;
        }

        for effect in effects.drain(..) {
            apply_effect(world, chars, id, effect, report, &mut queue);
        }
    }
}

/// Current targets of `actor` addressed by `target`.
fn targets_of(chars: &CharList, actor: EntityId, target: Option<EntityId>) -> Vec<EntityId> {
    chars
        .get(actor)
        .map(|c| {
            c.targets
                .iter()
                .copied()
                .filter(|t| target.is_none_or(|wanted| wanted == *t))
                .collect()
        })
        .unwrap_or_default()
}

fn apply_effect(
    world: &mut WorldContext,
    chars: &mut CharList,
    actor: EntityId,
    effect: Effect,
    report: &mut TickReport,
    queue: &mut VecDeque<EntityId>,
) {
    match effect {
        Effect::SpawnHelper(spec) => match chars.spawn_helper(actor, &spec, world) {
            Ok(helper) => {
                if let Some(h) = chars.get_mut(helper) {
                    h.prepare(world);
                }
                queue.push_back(helper);
            }
            Err(err) => {
                tracing::warn!(entity = %actor, error = %err, "helper spawn failed");
                report.spawn_failures.push(err);
            }
        },
        Effect::SpawnProjectile(spec) => {
            if let Err(err) = chars.spawn_projectile(actor, spec, world) {
                tracing::warn!(entity = %actor, error = %err, "projectile spawn failed");
                report.spawn_failures.push(err);
            }
        }
        Effect::TargetState { target, state_no } => {
            for t in targets_of(chars, actor, target) {
                let Some(v) = chars.get_mut(t) else {
                    continue;
                };
                if let Err(err) = v.change_state(state_no, world) {
                    tracing::warn!(entity = %t, error = %err, "target state substituted");
                }
                v.set_move_type(MoveType::BeingHit);
                v.flags.remove(SystemFlags::CTRL);
                v.ghv.custom_state = Some(v.state_no);
            }
        }
        Effect::TargetLifeAdd {
            target,
            amount,
            kill,
            absolute,
        } => {
            let attack_mul = chars.get(actor).map_or(1.0, Char::attack_mul);
            for t in targets_of(chars, actor, target) {
                let Some(v) = chars.get_mut(t) else {
                    continue;
                };
                let req = DamageRequest::new(-amount)
                    .with_kill(kill)
                    .with_rounding(Rounding::from(v.compat));
                let req = if absolute {
                    req.absolute()
                } else {
                    req.with_multipliers(attack_mul, v.defence_mul())
                };
                let damage = compute_damage(&req, LifeMeter::new(v.life, v.constants.life), true);
                v.life -= damage;
            }
        }
        Effect::TargetBind {
            target,
            offset,
            time,
        } => {
            for t in targets_of(chars, actor, target) {
                if let Some(v) = chars.get_mut(t) {
                    v.bind = Some(Bind {
                        to: actor,
                        offset,
                        time,
                    });
                }
            }
        }
        Effect::Pause { time, move_time } => world.request_pause(actor, time, move_time),
    }
}

/// Roots standing idle turn to face the nearest opposing root.
fn turn_towards_enemies(chars: &mut [Char]) {
    let roots: Vec<(EntityId, TeamSide, f32)> = chars
        .iter()
        .filter(|c| !c.is_helper() && !c.is_inert())
        .map(|c| (c.id, c.team, c.pos.x))
        .collect();

    for c in chars.iter_mut().filter(|c| !c.is_helper() && !c.halted()) {
        let (x, team) = (c.pos.x, c.team);
        let nearest = roots
            .iter()
            .filter(|(_, t, _)| *t != team)
            .min_by(|a, b| (a.2 - x).abs().total_cmp(&(b.2 - x).abs()).then(a.0.cmp(&b.0)));
        if let Some(&(_, _, enemy_x)) = nearest {
            c.auto_turn(enemy_x);
        }
    }
}

/// Snaps bound entities to their binders; a binding to something gone is
/// released.
fn resolve_binds(chars: &mut CharList) {
    let anchors: Vec<(usize, Option<(Vec3, Facing)>)> = chars
        .chars()
        .iter()
        .enumerate()
        .filter_map(|(i, c)| {
            let to = c.bind.as_ref()?.to;
            let anchor = chars
                .get(to)
                .filter(|b| b.id != c.id && !b.flags.contains(SystemFlags::DESTROY))
                .map(|b| (b.pos, b.facing));
            Some((i, anchor))
        })
        .collect();

    let list = chars.chars_mut();
    for (i, anchor) in anchors {
        let c = &mut list[i];
        match anchor {
            Some((pos, facing)) => c.follow(pos, facing),
            None => {
                tracing::trace!(entity = %c.id, "binding released");
                c.bind = None;
            }
        }
    }
}
