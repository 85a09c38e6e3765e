//! Oriented-box overlap tests.
//!
//! Pure functions with no hidden state. Given identical float inputs they
//! produce identical answers on every platform, which replay and rollback rely
//! on: the only operations are IEEE add/mul/compare plus one `sin_cos` per set.
//!
//! Boxes are authored facing right in the entity's local frame (y down).
//! Overlap is strict: boxes that only touch along an edge do not overlap.

/// Axis-aligned rectangle in an entity's local frame.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HitBox {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl HitBox {
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Same rectangle with `left <= right` and `top <= bottom`.
    fn normalized(self) -> Self {
        Self {
            left: self.left.min(self.right),
            top: self.top.min(self.bottom),
            right: self.left.max(self.right),
            bottom: self.top.max(self.bottom),
        }
    }
}

/// A list of boxes together with the transform that places them in the world.
#[derive(Clone, Copy, Debug)]
pub struct BoxSet<'a> {
    pub boxes: &'a [HitBox],
    /// Non-uniform scale (x, y).
    pub scale: [f32; 2],
    /// World position of the local origin.
    pub pos: [f32; 2],
    /// `1.0` or `-1.0`; mirrors the boxes horizontally.
    pub facing: f32,
    /// Rotation in degrees around the local origin.
    pub angle: f32,
}

impl<'a> BoxSet<'a> {
    pub fn new(boxes: &'a [HitBox], pos: [f32; 2], facing: f32) -> Self {
        Self {
            boxes,
            scale: [1.0, 1.0],
            pos,
            facing,
            angle: 0.0,
        }
    }

    pub fn with_scale(mut self, scale: [f32; 2]) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    /// Mirrored and scaled rectangle relative to the origin, before rotation.
    fn local_rect(&self, b: &HitBox) -> HitBox {
        let b = b.normalized();
        let (l, r) = if self.facing < 0.0 {
            (-b.right, -b.left)
        } else {
            (b.left, b.right)
        };
        HitBox::new(
            l * self.scale[0],
            b.top * self.scale[1],
            r * self.scale[0],
            b.bottom * self.scale[1],
        )
        .normalized()
    }

    fn world_rect(&self, b: &HitBox) -> HitBox {
        let r = self.local_rect(b);
        HitBox::new(
            r.left + self.pos[0],
            r.top + self.pos[1],
            r.right + self.pos[0],
            r.bottom + self.pos[1],
        )
    }

    fn corners(&self, b: &HitBox, sin: f32, cos: f32) -> [[f32; 2]; 4] {
        let r = self.local_rect(b);
        let raw = [
            [r.left, r.top],
            [r.right, r.top],
            [r.right, r.bottom],
            [r.left, r.bottom],
        ];
        raw.map(|[x, y]| {
            [
                x * cos - y * sin + self.pos[0],
                x * sin + y * cos + self.pos[1],
            ]
        })
    }

    /// Rotation mirrors with facing so a rotated attack turns the same way on
    /// both sides of the screen.
    fn sin_cos(&self) -> (f32, f32) {
        (self.angle * self.facing).to_radians().sin_cos()
    }
}

/// Tests every box in `a` against every box in `b`; true on the first
/// overlapping pair.
pub fn boxes_overlap(a: &BoxSet<'_>, b: &BoxSet<'_>) -> bool {
    if a.boxes.is_empty() || b.boxes.is_empty() {
        return false;
    }

    if a.angle == 0.0 && b.angle == 0.0 {
        return a.boxes.iter().any(|ba| {
            let ra = a.world_rect(ba);
            b.boxes.iter().any(|bb| rects_overlap(&ra, &b.world_rect(bb)))
        });
    }

    let (sin_a, cos_a) = a.sin_cos();
    let (sin_b, cos_b) = b.sin_cos();
    let axes = [[cos_a, sin_a], [-sin_a, cos_a], [cos_b, sin_b], [-sin_b, cos_b]];

    a.boxes.iter().any(|ba| {
        let pa = a.corners(ba, sin_a, cos_a);
        b.boxes.iter().any(|bb| {
            let pb = b.corners(bb, sin_b, cos_b);
            axes.iter().all(|axis| projections_overlap(&pa, &pb, *axis))
        })
    })
}

/// One-dimensional overlap on the depth axis.
///
/// `range` is `[toward viewer, away from viewer]` extent around `center`, each
/// multiplied by `scale`.
pub fn depth_ranges_overlap(
    center_a: f32,
    range_a: [f32; 2],
    scale_a: f32,
    center_b: f32,
    range_b: [f32; 2],
    scale_b: f32,
) -> bool {
    let (a_lo, a_hi) = (center_a - range_a[0] * scale_a, center_a + range_a[1] * scale_a);
    let (b_lo, b_hi) = (center_b - range_b[0] * scale_b, center_b + range_b[1] * scale_b);
    a_lo < b_hi && b_lo < a_hi
}

fn rects_overlap(a: &HitBox, b: &HitBox) -> bool {
    a.left < b.right && b.left < a.right && a.top < b.bottom && b.top < a.bottom
}

fn projections_overlap(pa: &[[f32; 2]; 4], pb: &[[f32; 2]; 4], axis: [f32; 2]) -> bool {
    let project = |pts: &[[f32; 2]; 4]| {
        pts.iter()
            .map(|p| p[0] * axis[0] + p[1] * axis[1])
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            })
    };
    let (a_lo, a_hi) = project(pa);
    let (b_lo, b_hi) = project(pb);
    a_lo < b_hi && b_lo < a_hi
}
