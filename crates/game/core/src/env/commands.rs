//! Command-input oracle.

use std::collections::BTreeMap;

use crate::flags::CommandBuffer;

/// Per-player direction and button state, sampled once per tick before
/// Prepare. Device polling happens elsewhere.
pub trait CommandSource: Send + Sync {
    /// Buffer for `player` at `tick`; empty when nothing is held.
    fn sample(&self, player: usize, tick: u64) -> CommandBuffer;
}

/// Holds nothing, ever.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoInput;

impl CommandSource for NoInput {
    fn sample(&self, _player: usize, _tick: u64) -> CommandBuffer {
        CommandBuffer::empty()
    }
}

/// Pre-recorded input, as used for replays and tests.
///
/// A buffer recorded at tick `t` stays held until the next recorded tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScriptedInput {
    players: BTreeMap<usize, BTreeMap<u64, CommandBuffer>>,
}

impl ScriptedInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(mut self, player: usize, tick: u64, buffer: CommandBuffer) -> Self {
        self.players.entry(player).or_default().insert(tick, buffer);
        self
    }
}

impl CommandSource for ScriptedInput {
    fn sample(&self, player: usize, tick: u64) -> CommandBuffer {
        self.players
            .get(&player)
            .and_then(|timeline| timeline.range(..=tick).next_back())
            .map(|(_, buffer)| *buffer)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_input_holds_until_next_entry() {
        let input = ScriptedInput::new()
            .press(0, 2, CommandBuffer::BACK)
            .press(0, 5, CommandBuffer::empty());

        assert_eq!(input.sample(0, 1), CommandBuffer::empty());
        assert_eq!(input.sample(0, 2), CommandBuffer::BACK);
        assert_eq!(input.sample(0, 4), CommandBuffer::BACK);
        assert_eq!(input.sample(0, 5), CommandBuffer::empty());
        assert_eq!(input.sample(1, 3), CommandBuffer::empty());
    }
}
