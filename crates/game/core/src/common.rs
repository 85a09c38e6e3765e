//! Shared primitive types: entity handles, vectors, facing and team side.

use std::fmt;

/// Opaque handle for any simulated body (root fighter or helper).
///
/// Entities never hold references to each other; they store this handle and
/// resolve it through the registry at the point of use, so a destroyed entity
/// simply stops resolving.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Three-component vector: `x` horizontal, `y` vertical (positive is down,
/// ground is `0`), `z` depth.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub const fn xy(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    pub fn scaled(self, s: f32) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s)
    }
}

impl std::ops::Add for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

/// Horizontal facing of an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Facing {
    #[default]
    Right,
    Left,
}

impl Facing {
    /// `1.0` when facing right, `-1.0` when facing left.
    #[inline]
    pub const fn sign(self) -> f32 {
        match self {
            Facing::Right => 1.0,
            Facing::Left => -1.0,
        }
    }

    pub const fn flipped(self) -> Self {
        match self {
            Facing::Right => Facing::Left,
            Facing::Left => Facing::Right,
        }
    }

    /// Facing that looks from `from_x` towards `to_x`; keeps `self` when equal.
    pub fn towards(self, from_x: f32, to_x: f32) -> Self {
        if to_x > from_x {
            Facing::Right
        } else if to_x < from_x {
            Facing::Left
        } else {
            self
        }
    }
}

/// Team side of an entity. Helpers and projectiles inherit their root's side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TeamSide {
    #[default]
    One,
    Two,
}

impl TeamSide {
    pub const fn opposite(self) -> Self {
        match self {
            TeamSide::One => TeamSide::Two,
            TeamSide::Two => TeamSide::One,
        }
    }
}
