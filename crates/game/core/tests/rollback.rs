use fight_core::{
    AttackAttr, CommandBuffer, CoreConfig, FightEngine, FightEnv, HitBox, HitDef, MatchState,
    MoveType, PcgRng, Priority, RootSpec, ScriptedInput, StateController, StaticAnimations,
    TeamSide, TradeType, Vec3,
};

const BODY: HitBox = HitBox::new(-15.0, -90.0, 15.0, 0.0);
const FIST: HitBox = HitBox::new(0.0, -80.0, 45.0, -60.0);
const STANCE: i32 = 0;
const SWING: i32 = 200;
const ATTACK_STATE: i32 = 200;

fn anims() -> StaticAnimations {
    StaticAnimations::new()
        .with_still(STANCE, &[], &[BODY])
        .with_still(SWING, &[FIST], &[BODY])
}

/// Walks in, jabs when close, and recovers after eight ticks.
fn brawler(ctl: &mut StateController<'_>) {
    let me = ctl.me();
    let (x, state_no, state_time) = (me.pos.x, me.state_no, me.state_time);
    let idle = me.move_type == MoveType::Idle && me.ctrl();
    let phase = me.player_no as u64 * 3;
    let close = ctl
        .nearest_enemy()
        .is_some_and(|enemy| (enemy.pos.x - x).abs() < 55.0);

    if idle && close && ctl.tick() % 6 == phase {
        let mut hd = HitDef::new(AttackAttr::STANDING | AttackAttr::NORMAL_ATTACK);
        hd.hit_damage = 35;
        hd.pause_time = [4, 6];
        hd.ground_hit_time = 10;
        hd.ground_velocity = Vec3::xy(-3.0, 0.0);
        hd.priority = Priority::new(4, TradeType::Hit);

        ctl.change_state(ATTACK_STATE);
        ctl.set_move_type(MoveType::Attack);
        ctl.set_ctrl(false);
        ctl.change_anim(SWING);
        ctl.declare_hit_def(hd);
    } else if state_no == ATTACK_STATE && state_time >= 8 {
        ctl.change_state(0);
        ctl.set_move_type(MoveType::Idle);
        ctl.set_ctrl(true);
        ctl.change_anim(STANCE);
    } else if idle && !close {
        ctl.set_velocity(Vec3::xy(2.0, 0.0));
    }
}

fn new_match() -> MatchState {
    let mut state = MatchState::new(CoreConfig::new(), 0x5eed);
    state
        .spawn_root(RootSpec::new(TeamSide::One, 0).at(-50.0))
        .unwrap();
    state
        .spawn_root(RootSpec::new(TeamSide::Two, 1).at(50.0))
        .unwrap();
    state
}

fn input() -> ScriptedInput {
    ScriptedInput::new()
        .press(1, 20, CommandBuffer::BACK)
        .press(1, 26, CommandBuffer::empty())
}

fn advance(state: &mut MatchState, ticks: u32) -> usize {
    let anims = anims();
    let input = input();
    let env = FightEnv::with_all(&brawler, &input, &anims, &PcgRng);
    let mut engine = FightEngine::new(state);
    (0..ticks).map(|_| engine.tick(env).hits.len()).sum()
}

/// Set `RUST_LOG=fight_core=debug` to see the tick log of a failing run.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn root(state: &MatchState) -> String {
    hex::encode(state.state_root().unwrap())
}

#[test]
fn identical_runs_agree_on_every_root() {
    init_tracing();
    let mut first = new_match();
    let mut second = new_match();
    for _ in 0..60 {
        advance(&mut first, 1);
        advance(&mut second, 1);
        assert_eq!(root(&first), root(&second), "tick {}", first.tick());
    }
}

#[test]
fn restored_snapshot_replays_to_the_same_root() {
    init_tracing();
    let mut live = new_match();
    advance(&mut live, 15);
    let snapshot = live.snapshot().unwrap();

    let hits = advance(&mut live, 45);
    assert!(hits > 0, "the scripted match should contain contact");
    let expected = root(&live);

    let mut replay = MatchState::restore(&snapshot).unwrap();
    assert_eq!(replay.tick(), 15);
    advance(&mut replay, 45);
    assert_eq!(root(&replay), expected);
    assert_eq!(replay.tick(), live.tick());
}

#[test]
fn roots_diverge_when_input_differs() {
    let mut a = new_match();
    let mut b = new_match();
    advance(&mut a, 30);

    let anims = anims();
    let other = ScriptedInput::new().press(1, 0, CommandBuffer::FORWARD);
    let env = FightEnv::with_all(&brawler, &other, &anims, &PcgRng);
    let mut engine = FightEngine::new(&mut b);
    for _ in 0..30 {
        engine.tick(env);
    }
    assert_ne!(root(&a), root(&b));
}
