/// Engine-version rules a ruleset follows.
///
/// Defaults, power rounding and juggle accounting changed between engine
/// generations; content authored for the older generation selects `Legacy`.
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
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum CompatibilityMode {
    /// Power gains truncate; juggle points are tracked per attacker.
    Legacy,
    /// Power gains round; juggle points are shared by every attacker.
    #[default]
    Current,
}

impl CompatibilityMode {
    pub const fn is_legacy(self) -> bool {
        matches!(self, Self::Legacy)
    }
}

/// How a fractional damage or gain value becomes an integer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, strum::Display, strum::AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum Rounding {
    #[default]
    Truncate,
    Nearest,
}

impl Rounding {
    #[inline]
    pub fn apply(self, value: f64) -> i32 {
        match self {
            Rounding::Truncate => value.trunc() as i32,
            Rounding::Nearest => value.round() as i32,
        }
    }
}

impl From<CompatibilityMode> for Rounding {
    fn from(mode: CompatibilityMode) -> Self {
        match mode {
            CompatibilityMode::Legacy => Rounding::Truncate,
            CompatibilityMode::Current => Rounding::Nearest,
        }
    }
}

/// Multipliers used when a HitDef leaves a resource gain unset.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GainMultipliers {
    /// Attacker power per point of hit damage.
    pub attack_life_to_power: f64,
    /// Victim power per point of hit damage taken.
    pub gethit_life_to_power: f64,
    /// Fraction of the hit power gains awarded on guard.
    pub guard_power_ratio: f64,
    pub life_to_dizzy_points: f64,
    pub life_to_guard_points: f64,
    pub life_to_red_life: f64,
}

impl Default for GainMultipliers {
    fn default() -> Self {
        Self {
            attack_life_to_power: 0.7,
            gethit_life_to_power: 0.6,
            guard_power_ratio: 0.5,
            life_to_dizzy_points: 1.8,
            life_to_guard_points: 1.5,
            life_to_red_life: 0.75,
        }
    }
}

/// State numbers the core jumps to on its own.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ReactionStates {
    pub stand_hit: i32,
    pub crouch_hit: i32,
    pub air_hit: i32,
    pub lying_hit: i32,
    pub stand_guard: i32,
    pub crouch_guard: i32,
    pub air_guard: i32,
    /// Lying on the ground after a fall.
    pub lie_down: i32,
    /// Neutral state a recovered victim returns to.
    pub idle: i32,
    pub ko: i32,
    /// Fallback when content asks for a state outside the valid range.
    pub fallback: i32,
}

impl Default for ReactionStates {
    fn default() -> Self {
        Self {
            stand_hit: 5000,
            crouch_hit: 5010,
            air_hit: 5020,
            lying_hit: 5080,
            stand_guard: 150,
            crouch_guard: 152,
            air_guard: 154,
            lie_down: 5110,
            idle: 0,
            ko: 5150,
            fallback: 0,
        }
    }
}

/// Ruleset for one simulation.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CoreConfig {
    pub compatibility: CompatibilityMode,
    /// Characters (roots and helpers) alive at once.
    pub max_entities: usize,
    /// Projectiles alive at once, across all owners.
    pub max_projectiles: usize,
    /// Juggle points of a character that does not declare its own.
    pub default_air_juggle: i32,
    pub gains: GainMultipliers,
    /// Horizontal resolution the world coordinates are expressed in.
    pub reference_width: f32,
    pub reactions: ReactionStates,
    /// State changes one entity may perform in a single tick.
    pub state_loop_guard: u32,
    /// Highest valid state number.
    pub max_state_no: i32,
    /// Enables the depth gate on every collision test.
    pub depth_enabled: bool,
}

impl CoreConfig {
    // ===== compile-time ceilings =====
    pub const MAX_HITBY_SLOTS: usize = 8;
    pub const MAX_HIT_OVERRIDES: usize = 8;
    pub const MAX_TARGETS: usize = 32;
    pub const MAX_TARGETED_BY: usize = 16;
    pub const MAX_HIT_TARGETS: usize = 32;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_MAX_ENTITIES: usize = 64;
    pub const DEFAULT_MAX_PROJECTILES: usize = 128;
    pub const DEFAULT_AIR_JUGGLE: i32 = 15;
    pub const DEFAULT_REFERENCE_WIDTH: f32 = 320.0;
    pub const STATE_LOOP_GUARD: u32 = 2500;
    pub const DEFAULT_MAX_STATE_NO: i32 = 0x7fff_ffff;

    pub fn new() -> Self {
        Self {
            compatibility: CompatibilityMode::default(),
            max_entities: Self::DEFAULT_MAX_ENTITIES,
            max_projectiles: Self::DEFAULT_MAX_PROJECTILES,
            default_air_juggle: Self::DEFAULT_AIR_JUGGLE,
            gains: GainMultipliers::default(),
            reference_width: Self::DEFAULT_REFERENCE_WIDTH,
            reactions: ReactionStates::default(),
            state_loop_guard: Self::STATE_LOOP_GUARD,
            max_state_no: Self::DEFAULT_MAX_STATE_NO,
            depth_enabled: false,
        }
    }

    pub fn with_compatibility(mut self, compatibility: CompatibilityMode) -> Self {
        self.compatibility = compatibility;
        self
    }

    pub fn with_max_entities(mut self, max_entities: usize) -> Self {
        self.max_entities = max_entities;
        self
    }

    pub fn with_max_projectiles(mut self, max_projectiles: usize) -> Self {
        self.max_projectiles = max_projectiles;
        self
    }

    pub fn with_gains(mut self, gains: GainMultipliers) -> Self {
        self.gains = gains;
        self
    }

    pub fn with_depth(mut self, depth_enabled: bool) -> Self {
        self.depth_enabled = depth_enabled;
        self
    }

    /// Replaces out-of-range values with defaults, logging each substitution.
    pub fn sanitized(mut self) -> Self {
        if !(self.reference_width.is_finite() && self.reference_width > 0.0) {
            tracing::warn!(
                value = self.reference_width,
                "invalid reference_width, using default"
            );
            self.reference_width = Self::DEFAULT_REFERENCE_WIDTH;
        }
        if self.state_loop_guard == 0 {
            tracing::warn!("state_loop_guard of 0 would block every state, using default");
            self.state_loop_guard = Self::STATE_LOOP_GUARD;
        }
        if self.default_air_juggle < 0 {
            tracing::warn!(
                value = self.default_air_juggle,
                "negative default_air_juggle, clamping to 0"
            );
            self.default_air_juggle = 0;
        }
        if self.max_state_no < 0 {
            self.max_state_no = Self::DEFAULT_MAX_STATE_NO;
        }
        self
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::new()
    }
}
