//! Strongly typed bit sets.
//!
//! Two containers carry entity flags: [`SystemFlags`] persist until cleared
//! explicitly, while [`AssertFlags`] are wiped at the start of every tick and
//! must be re-asserted by the behavior program each frame.

use bitflags::bitflags;

bitflags! {
    /// Attack attribute: posture of the attacker × class × kind.
    ///
    /// Posture bits (`STANDING`, `CROUCHING`, `AIR`) describe where the attack
    /// comes from; the remaining bits are one per (class, kind) pair.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct AttackAttr: u32 {
        const STANDING          = 1 << 0;
        const CROUCHING         = 1 << 1;
        const AIR               = 1 << 2;

        const NORMAL_ATTACK     = 1 << 3;
        const NORMAL_THROW      = 1 << 4;
        const NORMAL_PROJECTILE = 1 << 5;
        const SPECIAL_ATTACK    = 1 << 6;
        const SPECIAL_THROW     = 1 << 7;
        const SPECIAL_PROJECTILE = 1 << 8;
        const HYPER_ATTACK      = 1 << 9;
        const HYPER_THROW       = 1 << 10;
        const HYPER_PROJECTILE  = 1 << 11;

        const POSTURES = Self::STANDING.bits() | Self::CROUCHING.bits() | Self::AIR.bits();
        const THROWS = Self::NORMAL_THROW.bits() | Self::SPECIAL_THROW.bits() | Self::HYPER_THROW.bits();
        const PROJECTILES = Self::NORMAL_PROJECTILE.bits()
            | Self::SPECIAL_PROJECTILE.bits()
            | Self::HYPER_PROJECTILE.bits();
        const HYPERS = Self::HYPER_ATTACK.bits() | Self::HYPER_THROW.bits() | Self::HYPER_PROJECTILE.bits();
        const KINDS = !Self::POSTURES.bits() & 0x0fff;
    }
}

impl AttackAttr {
    /// Every posture and every kind: the widest possible mask.
    pub const fn everything() -> Self {
        Self::all()
    }

    #[inline]
    pub fn posture(self) -> Self {
        self & Self::POSTURES
    }

    #[inline]
    pub fn kinds(self) -> Self {
        self & Self::KINDS
    }

    #[inline]
    pub fn is_throw(self) -> bool {
        self.intersects(Self::THROWS)
    }

    #[inline]
    pub fn is_air_attack(self) -> bool {
        self.contains(Self::AIR)
    }

    /// True when this attack falls inside `filter`: the postures overlap and
    /// the kinds overlap.
    pub fn matches(self, filter: AttackAttr) -> bool {
        self.posture().intersects(filter.posture()) && self.kinds().intersects(filter.kinds())
    }
}

bitflags! {
    /// Victim postures an attack is able to affect.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct HitFlags: u8 {
        /// Standing victims.
        const HIGH      = 1 << 0;
        /// Crouching victims.
        const LOW       = 1 << 1;
        /// Airborne victims that are not falling.
        const AIR       = 1 << 2;
        /// Falling victims.
        const FALL      = 1 << 3;
        /// Victims lying on the ground.
        const DOWN      = 1 << 4;
        /// Only victims that are not currently being hit.
        const NOT_HIT   = 1 << 5;
        /// Only victims that are currently being hit.
        const ONLY_HIT  = 1 << 6;
    }
}

impl Default for HitFlags {
    fn default() -> Self {
        Self::HIGH | Self::LOW | Self::AIR | Self::FALL
    }
}

bitflags! {
    /// Postures in which the victim may guard an attack.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct GuardFlags: u8 {
        const HIGH = 1 << 0;
        const LOW  = 1 << 1;
        const AIR  = 1 << 2;
    }
}

bitflags! {
    /// Persistent system flags; cleared only explicitly.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct SystemFlags: u16 {
        const CTRL     = 1 << 0;
        const GUARDING = 1 << 1;
        const DIZZY    = 1 << 2;
        const KO       = 1 << 3;
        const STANDBY  = 1 << 4;
        const DISABLED = 1 << 5;
        /// Marked for removal at the next compaction point.
        const DESTROY  = 1 << 6;
    }
}

bitflags! {
    /// Per-tick assertions; reset during Prepare.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct AssertFlags: u32 {
        const NO_STAND_GUARD  = 1 << 0;
        const NO_CROUCH_GUARD = 1 << 1;
        const NO_AIR_GUARD    = 1 << 2;
        const NO_KO           = 1 << 3;
        const NO_JUGGLE_CHECK = 1 << 4;
        const RUN_FIRST       = 1 << 5;
        const RUN_LAST        = 1 << 6;
        const NO_PUSH         = 1 << 7;
        const NO_SCREEN_BOUND = 1 << 8;
        const NO_STAGE_BOUND  = 1 << 9;
        const UNGUARDABLE     = 1 << 10;
        const NO_AUTO_TURN    = 1 << 11;
    }
}

bitflags! {
    /// Direction and button state sampled from the command-input collaborator.
    ///
    /// Directions are relative to the entity's facing.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct CommandBuffer: u16 {
        const UP      = 1 << 0;
        const DOWN    = 1 << 1;
        const BACK    = 1 << 2;
        const FORWARD = 1 << 3;
        const A       = 1 << 4;
        const B       = 1 << 5;
        const C       = 1 << 6;
        const X       = 1 << 7;
        const Y       = 1 << 8;
        const Z       = 1 << 9;
        const START   = 1 << 10;
    }
}

impl CommandBuffer {
    #[inline]
    pub fn holding_back(self) -> bool {
        self.contains(Self::BACK) && !self.contains(Self::FORWARD)
    }
}

bitflags! {
    /// Independent policies of a hit override slot.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct OverrideFlags: u8 {
        /// The intercepted attack whiffs entirely.
        const MISS        = 1 << 0;
        /// The intercepted attack is treated as guarded.
        const FORCE_GUARD = 1 << 1;
        /// The victim reacts as if airborne.
        const FORCE_AIR   = 1 << 2;
        /// No state jump; damage and velocities still apply.
        const KEEP_STATE  = 1 << 3;
    }
}
