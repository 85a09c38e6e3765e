//! Animation-frame oracle.
//!
//! The core never renders; it only needs to know, for an animation number and
//! the ticks elapsed in it, which boxes can hit and which can be hit.

use std::collections::BTreeMap;

use super::OracleError;
use crate::geometry::HitBox;

/// Collision boxes of one animation frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AnimFrame<'a> {
    pub attack: &'a [HitBox],
    pub vulnerable: &'a [HitBox],
}

impl AnimFrame<'_> {
    pub const EMPTY: AnimFrame<'static> = AnimFrame {
        attack: &[],
        vulnerable: &[],
    };
}

/// Read-only animation data.
pub trait AnimationOracle: Send + Sync {
    /// Boxes active `elapsed` ticks into `anim`.
    fn frame(&self, anim: i32, elapsed: i32) -> Result<AnimFrame<'_>, OracleError>;

    /// Total duration in ticks, or `None` for an animation that never ends.
    fn length(&self, anim: i32) -> Option<i32>;
}

/// One authored frame.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FrameDef {
    /// Ticks the frame is displayed; `-1` holds it forever.
    pub duration: i32,
    pub attack: Vec<HitBox>,
    pub vulnerable: Vec<HitBox>,
}

impl FrameDef {
    pub fn new(duration: i32) -> Self {
        Self {
            duration,
            ..Self::default()
        }
    }

    pub fn with_attack(mut self, attack: impl Into<Vec<HitBox>>) -> Self {
        self.attack = attack.into();
        self
    }

    pub fn with_vulnerable(mut self, vulnerable: impl Into<Vec<HitBox>>) -> Self {
        self.vulnerable = vulnerable.into();
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AnimationDef {
    pub frames: Vec<FrameDef>,
    /// Restart from the first frame after the last one.
    pub looping: bool,
}

impl AnimationDef {
    fn total(&self) -> Option<i32> {
        let mut sum = 0i32;
        for frame in &self.frames {
            if frame.duration < 0 {
                return None;
            }
            sum = sum.saturating_add(frame.duration);
        }
        Some(sum)
    }

    fn frame_at(&self, elapsed: i32) -> Option<&FrameDef> {
        let total = self.total();
        let mut t = match total {
            Some(total) if self.looping && total > 0 => elapsed.rem_euclid(total),
            _ => elapsed.max(0),
        };
        for frame in &self.frames {
            if frame.duration < 0 || t < frame.duration {
                return Some(frame);
            }
            t -= frame.duration;
        }
        self.frames.last()
    }
}

/// In-memory [`AnimationOracle`] for tools and tests.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StaticAnimations {
    anims: BTreeMap<i32, AnimationDef>,
}

impl StaticAnimations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, anim: i32, def: AnimationDef) -> &mut Self {
        self.anims.insert(anim, def);
        self
    }

    /// Single endless frame with the given boxes.
    pub fn with_still(mut self, anim: i32, attack: &[HitBox], vulnerable: &[HitBox]) -> Self {
        self.insert(
            anim,
            AnimationDef {
                frames: vec![
                    FrameDef::new(-1)
                        .with_attack(attack)
                        .with_vulnerable(vulnerable),
                ],
                looping: false,
            },
        );
        self
    }
}

impl AnimationOracle for StaticAnimations {
    fn frame(&self, anim: i32, elapsed: i32) -> Result<AnimFrame<'_>, OracleError> {
        let def = self
            .anims
            .get(&anim)
            .ok_or(OracleError::AnimationNotFound(anim))?;
        let frame = def
            .frame_at(elapsed)
            .ok_or(OracleError::FrameNotFound { anim, elapsed })?;
        Ok(AnimFrame {
            attack: &frame.attack,
            vulnerable: &frame.vulnerable,
        })
    }

    fn length(&self, anim: i32) -> Option<i32> {
        self.anims.get(&anim).and_then(AnimationDef::total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_frames(looping: bool) -> StaticAnimations {
        let mut anims = StaticAnimations::new();
        anims.insert(
            10,
            AnimationDef {
                frames: vec![
                    FrameDef::new(3).with_vulnerable(vec![HitBox::new(-5.0, -50.0, 5.0, 0.0)]),
                    FrameDef::new(2).with_attack(vec![HitBox::new(0.0, -40.0, 30.0, -30.0)]),
                ],
                looping,
            },
        );
        anims
    }

    #[test]
    fn frames_follow_durations() {
        let anims = two_frames(false);
        assert!(anims.frame(10, 2).unwrap().attack.is_empty());
        assert_eq!(anims.frame(10, 3).unwrap().attack.len(), 1);
        // Past the end the last frame holds.
        assert_eq!(anims.frame(10, 40).unwrap().attack.len(), 1);
        assert_eq!(anims.length(10), Some(5));
    }

    #[test]
    fn looping_wraps_elapsed() {
        let anims = two_frames(true);
        assert!(anims.frame(10, 5).unwrap().attack.is_empty());
        assert_eq!(anims.frame(10, 8).unwrap().attack.len(), 1);
    }

    #[test]
    fn missing_animation_is_an_error() {
        let anims = StaticAnimations::new();
        assert_eq!(
            anims.frame(99, 0).unwrap_err(),
            OracleError::AnimationNotFound(99)
        );
        assert_eq!(anims.length(99), None);
    }
}
