//! Named stages of one simulation tick, in execution order.

/// Stage of [`FightEngine::tick`](super::FightEngine::tick).
///
/// Only used for tracing; the engine always runs every stage.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum TickPhase {
    /// Command buffers sampled for every player.
    Input,
    /// Run order re-sorted and per-entity timers advanced.
    Prepare,
    /// Behavior programs stepped and their effects applied.
    Program,
    Arm,
    Push,
    /// Reversals, then character attacks, then projectiles.
    Hit,
    Finish,
    Bind,
    Compact,
}
