//! Attack declarations.
//!
//! A [`HitDef`] is what an entity declares when it attacks. Authors fill in
//! only what they care about; every other field is `None` until
//! [`HitDef::finalize`] derives it from related fields. The single NaN
//! sentinel is [`FallDef::xvelocity`], where NaN means "keep the victim's
//! current horizontal velocity".
//!
//! A ReversalDef is a `HitDef` with [`HitDef::reversal_attr`] set: instead of
//! striking vulnerable boxes it intercepts incoming attacks whose attribute
//! matches.

mod finalize;

pub use finalize::DeclarationContext;

use crate::common::Vec3;
use crate::flags::{AttackAttr, GuardFlags, HitFlags};

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TradeType {
    #[default]
    Hit,
    Miss,
    Dodge,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Priority {
    pub value: i32,
    pub trade: TradeType,
}

impl Priority {
    pub const fn new(value: i32, trade: TradeType) -> Self {
        Self { value, trade }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::new(4, TradeType::Hit)
    }
}

/// Which way the victim is knocked.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum HitType {
    #[default]
    High,
    Low,
    Trip,
    None,
}

/// Reaction animation family.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum AnimType {
    #[default]
    Light,
    Medium,
    Hard,
    Back,
    Up,
    DiagUp,
}

/// Where the victim is when the reaction is chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VictimPosture {
    Ground,
    Air,
    /// Lying on the ground.
    Down,
}

/// Fall parameters of a hit that knocks the victim down.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FallDef {
    /// Horizontal velocity applied on the bounce; NaN keeps the current one.
    pub xvelocity: f32,
    /// Vertical velocity applied on the bounce, local units.
    pub yvelocity: Option<f32>,
    pub recover: bool,
    pub recover_time: i32,
    /// Absolute damage taken on landing.
    pub damage: i32,
    /// May the landing damage KO.
    pub kill: bool,
}

impl Default for FallDef {
    fn default() -> Self {
        Self {
            xvelocity: f32::NAN,
            yvelocity: None,
            recover: true,
            recover_time: 4,
            damage: 0,
            kill: true,
        }
    }
}

impl FallDef {
    /// `xvelocity` is the "keep current" sentinel.
    pub fn keeps_xvelocity(&self) -> bool {
        self.xvelocity.is_nan()
    }
}

/// An attack declaration.
///
/// Velocities, accelerations and depth extents are in the declaring entity's
/// local units. Victim velocities are relative to the victim's facing once it
/// turns toward the attacker, so a negative `x` knocks it back.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HitDef {
    pub attr: AttackAttr,
    /// Set on a ReversalDef: the attacks it intercepts.
    pub reversal_attr: Option<AttackAttr>,
    pub hit_flags: HitFlags,
    pub guard_flags: GuardFlags,
    pub priority: Priority,
    /// Identifier other attacks can chain from.
    pub id: i32,
    /// Only lands on a victim currently reeling from an attack with this id.
    pub chain_id: Option<i32>,
    /// Never lands on a victim reeling from an attack with one of these ids.
    pub no_chain_id: [Option<i32>; 2],
    pub hit_once: Option<bool>,
    pub num_hits: i32,

    pub hit_damage: i32,
    pub guard_damage: i32,
    pub kill: bool,
    pub guard_kill: bool,

    pub hit_get_power: Option<i32>,
    pub hit_give_power: Option<i32>,
    pub guard_get_power: Option<i32>,
    pub guard_give_power: Option<i32>,
    pub dizzy_points: Option<i32>,
    pub guard_points: Option<i32>,
    pub red_life: Option<i32>,

    /// Hit pause for attacker and victim.
    pub pause_time: [i32; 2],
    pub guard_pause_time: Option<[i32; 2]>,

    pub ground_type: HitType,
    pub air_type: Option<HitType>,
    pub anim_type: AnimType,
    pub air_anim_type: Option<AnimType>,
    pub fall_anim_type: Option<AnimType>,

    pub ground_hit_time: i32,
    pub ground_slide_time: i32,
    pub air_hit_time: Option<i32>,
    pub down_hit_time: Option<i32>,
    pub guard_hit_time: Option<i32>,
    pub guard_slide_time: Option<i32>,
    pub guard_ctrl_time: Option<i32>,

    pub ground_velocity: Vec3,
    pub air_velocity: Vec3,
    pub down_velocity: Option<Vec3>,
    pub guard_velocity: Option<f32>,
    pub airguard_velocity: Option<Vec3>,

    pub ground_cornerpush_veloff: Option<f32>,
    pub air_cornerpush_veloff: Option<f32>,
    pub down_cornerpush_veloff: Option<f32>,
    pub guard_cornerpush_veloff: Option<f32>,
    pub airguard_cornerpush_veloff: Option<f32>,

    /// Gravity applied to the victim while reeling.
    pub yaccel: Option<f32>,
    pub ground_fall: bool,
    pub air_fall: Option<bool>,
    pub fall: FallDef,

    /// Juggle points this attack costs.
    pub air_juggle: i32,

    /// State the attacker jumps to on contact.
    pub p1_state_no: Option<i32>,
    /// State the victim jumps to instead of the default reaction.
    pub p2_state_no: Option<i32>,

    /// Depth extents `[toward viewer, away from viewer]`.
    pub depth: Option<[f32; 2]>,

    finalized: bool,
}

impl Default for HitDef {
    fn default() -> Self {
        Self {
            attr: AttackAttr::STANDING | AttackAttr::NORMAL_ATTACK,
            reversal_attr: None,
            hit_flags: HitFlags::default(),
            guard_flags: GuardFlags::empty(),
            priority: Priority::default(),
            id: 0,
            chain_id: None,
            no_chain_id: [None, None],
            hit_once: None,
            num_hits: 1,
            hit_damage: 0,
            guard_damage: 0,
            kill: true,
            guard_kill: true,
            hit_get_power: None,
            hit_give_power: None,
            guard_get_power: None,
            guard_give_power: None,
            dizzy_points: None,
            guard_points: None,
            red_life: None,
            pause_time: [0, 0],
            guard_pause_time: None,
            ground_type: HitType::High,
            air_type: None,
            anim_type: AnimType::Light,
            air_anim_type: None,
            fall_anim_type: None,
            ground_hit_time: 0,
            ground_slide_time: 0,
            air_hit_time: None,
            down_hit_time: None,
            guard_hit_time: None,
            guard_slide_time: None,
            guard_ctrl_time: None,
            ground_velocity: Vec3::ZERO,
            air_velocity: Vec3::ZERO,
            down_velocity: None,
            guard_velocity: None,
            airguard_velocity: None,
            ground_cornerpush_veloff: None,
            air_cornerpush_veloff: None,
            down_cornerpush_veloff: None,
            guard_cornerpush_veloff: None,
            airguard_cornerpush_veloff: None,
            yaccel: None,
            ground_fall: false,
            air_fall: None,
            fall: FallDef::default(),
            air_juggle: 0,
            p1_state_no: None,
            p2_state_no: None,
            depth: None,
            finalized: false,
        }
    }
}

impl HitDef {
    pub fn new(attr: AttackAttr) -> Self {
        Self {
            attr,
            ..Self::default()
        }
    }

    /// A reversal intercepting attacks that match `reversal_attr`.
    pub fn reversal(reversal_attr: AttackAttr) -> Self {
        Self {
            reversal_attr: Some(reversal_attr),
            ..Self::default()
        }
    }

    pub fn is_reversal(&self) -> bool {
        self.reversal_attr.is_some()
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn hits_once(&self) -> bool {
        self.hit_once.unwrap_or_else(|| self.attr.is_throw())
    }

    pub fn falls(&self, posture: VictimPosture) -> bool {
        match posture {
            VictimPosture::Air => self.air_fall.unwrap_or(self.ground_fall),
            VictimPosture::Ground | VictimPosture::Down => self.ground_fall,
        }
    }

    pub fn hit_type(&self, posture: VictimPosture) -> HitType {
        match posture {
            VictimPosture::Air => self.air_type.unwrap_or(self.ground_type),
            VictimPosture::Ground | VictimPosture::Down => self.ground_type,
        }
    }

    pub fn reaction_anim(&self, posture: VictimPosture, falling: bool) -> AnimType {
        let air = self.air_anim_type.unwrap_or(self.anim_type);
        if falling {
            return self.fall_anim_type.unwrap_or(if air == AnimType::Up {
                AnimType::Up
            } else {
                AnimType::Back
            });
        }
        match posture {
            VictimPosture::Air => air,
            VictimPosture::Ground | VictimPosture::Down => self.anim_type,
        }
    }

    /// Pause ticks `[attacker, victim]`.
    pub fn pause_for(&self, guarded: bool) -> [i32; 2] {
        if guarded {
            self.guard_pause_time.unwrap_or(self.pause_time)
        } else {
            self.pause_time
        }
    }

    pub fn hit_time_for(&self, posture: VictimPosture, guarded: bool) -> i32 {
        if guarded {
            return self.guard_hit_time.unwrap_or(self.ground_hit_time);
        }
        match posture {
            VictimPosture::Ground => self.ground_hit_time,
            VictimPosture::Air => self.air_hit_time.unwrap_or(finalize::DEFAULT_AIR_HIT_TIME),
            VictimPosture::Down => self.down_hit_time.unwrap_or(self.ground_hit_time),
        }
    }

    pub fn slide_time_for(&self, guarded: bool) -> i32 {
        if guarded {
            self.guard_slide_time.unwrap_or(self.ground_slide_time)
        } else {
            self.ground_slide_time
        }
    }

    pub fn ctrl_time_for(&self, guarded: bool) -> i32 {
        if guarded {
            self.guard_ctrl_time
                .or(self.guard_slide_time)
                .unwrap_or(self.ground_slide_time)
        } else {
            0
        }
    }

    /// Victim velocity in attacker local units.
    pub fn velocity_for(&self, posture: VictimPosture, guarded: bool) -> Vec3 {
        match (guarded, posture) {
            (true, VictimPosture::Air) => self
                .airguard_velocity
                .unwrap_or(Vec3::new(self.air_velocity.x * 1.5, self.air_velocity.y * 0.5, 0.0)),
            (true, _) => Vec3::xy(self.guard_velocity.unwrap_or(self.ground_velocity.x), 0.0),
            (false, VictimPosture::Ground) => self.ground_velocity,
            (false, VictimPosture::Air) => self.air_velocity,
            (false, VictimPosture::Down) => self.down_velocity.unwrap_or(self.air_velocity),
        }
    }

    /// Attacker velocity offset applied when the victim is against a wall.
    pub fn cornerpush_for(&self, posture: VictimPosture, guarded: bool) -> f32 {
        let ground = self.ground_cornerpush_veloff.unwrap_or(0.0);
        let guard = self.guard_cornerpush_veloff.unwrap_or(ground);
        match (guarded, posture) {
            (true, VictimPosture::Air) => self.airguard_cornerpush_veloff.unwrap_or(guard),
            (true, _) => guard,
            (false, VictimPosture::Ground) => ground,
            (false, VictimPosture::Air) => self.air_cornerpush_veloff.unwrap_or(ground),
            (false, VictimPosture::Down) => self.down_cornerpush_veloff.unwrap_or(ground),
        }
    }

    /// Power `[attacker gain, victim gain]`.
    pub fn power_for(&self, guarded: bool) -> [i32; 2] {
        if guarded {
            [
                self.guard_get_power.unwrap_or_default(),
                self.guard_give_power.unwrap_or_default(),
            ]
        } else {
            [
                self.hit_get_power.unwrap_or_default(),
                self.hit_give_power.unwrap_or_default(),
            ]
        }
    }

    /// Whether an attack with `hit_id` currently reeling the victim blocks this
    /// one, or fails to satisfy its chain requirement.
    pub fn chain_allows(&self, victim_reeling_from: Option<i32>) -> bool {
        if let Some(required) = self.chain_id {
            if victim_reeling_from != Some(required) {
                return false;
            }
        }
        match victim_reeling_from {
            Some(id) => !self.no_chain_id.contains(&Some(id)),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_id_requires_matching_reel() {
        let mut hd = HitDef::default();
        hd.chain_id = Some(7);
        assert!(!hd.chain_allows(None));
        assert!(!hd.chain_allows(Some(3)));
        assert!(hd.chain_allows(Some(7)));
    }

    #[test]
    fn no_chain_id_rejects_matching_reel() {
        let mut hd = HitDef::default();
        hd.no_chain_id = [Some(5), None];
        assert!(hd.chain_allows(None));
        assert!(hd.chain_allows(Some(4)));
        assert!(!hd.chain_allows(Some(5)));
    }

    #[test]
    fn throws_hit_once_by_default() {
        assert!(HitDef::new(AttackAttr::STANDING | AttackAttr::NORMAL_THROW).hits_once());
        assert!(!HitDef::default().hits_once());
    }

    #[test]
    fn fall_anim_follows_air_anim() {
        let mut hd = HitDef::default();
        hd.air_anim_type = Some(AnimType::Up);
        assert_eq!(hd.reaction_anim(VictimPosture::Air, true), AnimType::Up);
        hd.air_anim_type = Some(AnimType::Hard);
        assert_eq!(hd.reaction_anim(VictimPosture::Air, true), AnimType::Back);
    }

    #[test]
    fn fall_xvelocity_defaults_to_keep() {
        assert!(FallDef::default().keeps_xvelocity());
    }
}
