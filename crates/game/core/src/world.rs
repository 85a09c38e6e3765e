//! Engine-wide state shared by every entity of one simulation.
//!
//! Held by the scheduler and handed to entity operations by reference, so two
//! simulations (a confirmed one and a predicted one, say) never share anything.

use crate::common::EntityId;
use crate::config::CoreConfig;

/// Horizontal extent of the stage in world units.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StageBounds {
    pub left: f32,
    pub right: f32,
}

impl Default for StageBounds {
    fn default() -> Self {
        Self {
            left: -400.0,
            right: 400.0,
        }
    }
}

/// Visible window. The host moves the camera; the core only clamps to it.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScreenBounds {
    pub center_x: f32,
    pub half_width: f32,
}

impl ScreenBounds {
    pub fn left(&self) -> f32 {
        self.center_x - self.half_width
    }

    pub fn right(&self) -> f32 {
        self.center_x + self.half_width
    }
}

/// Global freeze issued by one entity (super-pause style).
///
/// While `remaining > 0` every other entity is frozen; the issuer keeps moving
/// for `move_time` ticks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorldPause {
    pub remaining: i32,
    pub move_time: i32,
    pub owner: Option<EntityId>,
}

impl WorldPause {
    pub fn active(&self) -> bool {
        self.remaining > 0
    }

    /// True when `id` is held still by the pause this tick.
    pub fn freezes(&self, id: EntityId) -> bool {
        if !self.active() {
            return false;
        }
        self.owner != Some(id) || self.move_time <= 0
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorldContext {
    pub config: CoreConfig,
    /// Match seed for tie-break draws.
    pub seed: u64,
    pub tick: u64,
    pub stage: StageBounds,
    pub screen: ScreenBounds,
    pub pause: WorldPause,
}

impl WorldContext {
    pub fn new(config: CoreConfig, seed: u64) -> Self {
        let config = config.sanitized();
        let screen = ScreenBounds {
            center_x: 0.0,
            half_width: config.reference_width / 2.0,
        };
        Self {
            config,
            seed,
            tick: 0,
            stage: StageBounds::default(),
            screen,
            pause: WorldPause::default(),
        }
    }

    pub fn with_stage(mut self, stage: StageBounds) -> Self {
        self.stage = stage;
        self
    }

    /// Ratio that converts a `localcoord` width into world units.
    pub fn local_scale(&self, localcoord: f32) -> f32 {
        if localcoord > 0.0 && localcoord.is_finite() {
            self.config.reference_width / localcoord
        } else {
            1.0
        }
    }

    /// Starts a pause unless one owned by someone else is already running.
    pub fn request_pause(&mut self, owner: EntityId, time: i32, move_time: i32) {
        if time <= 0 {
            return;
        }
        if self.pause.active() && self.pause.owner != Some(owner) {
            tracing::debug!(%owner, "pause request ignored, another pause is active");
            return;
        }
        self.pause = WorldPause {
            remaining: time,
            move_time: move_time.max(0),
            owner: Some(owner),
        };
    }

    pub(crate) fn advance_pause(&mut self) {
        if self.pause.active() {
            self.pause.remaining -= 1;
            if self.pause.move_time > 0 {
                self.pause.move_time -= 1;
            }
            if !self.pause.active() {
                self.pause = WorldPause::default();
            }
        }
    }
}

impl Default for WorldContext {
    fn default() -> Self {
        Self::new(CoreConfig::default(), 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_scale_normalises_to_reference_width() {
        let world = WorldContext::default();
        assert_eq!(world.local_scale(320.0), 1.0);
        assert_eq!(world.local_scale(640.0), 0.5);
        assert_eq!(world.local_scale(0.0), 1.0);
    }

    #[test]
    fn pause_freezes_everyone_but_the_moving_owner() {
        let mut world = WorldContext::default();
        world.request_pause(EntityId(1), 3, 1);

        assert!(!world.pause.freezes(EntityId(1)));
        assert!(world.pause.freezes(EntityId(2)));

        world.advance_pause();
        assert!(world.pause.freezes(EntityId(1)));

        world.advance_pause();
        world.advance_pause();
        assert!(!world.pause.active());
        assert!(!world.pause.freezes(EntityId(2)));
    }
}
