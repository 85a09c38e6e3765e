//! Body push resolution between opposing fighters.
//!
//! Overlapping bodies are separated along the axis where they overlap least,
//! relative to their combined size. The higher push priority stands its
//! ground; equal priorities share the displacement by weight.

use crate::character::Char;
use crate::common::Facing;
use crate::flags::AssertFlags;
use crate::registry::pair_mut;
use crate::world::WorldContext;

fn takes_part(c: &Char) -> bool {
    c.pushable && !c.is_inert() && c.bind.is_none() && !c.asserts.contains(AssertFlags::NO_PUSH)
}

fn overlap(lo_a: f32, hi_a: f32, lo_b: f32, hi_b: f32) -> f32 {
    hi_a.min(hi_b) - lo_a.max(lo_b)
}

/// `true` when `a` should end up on the lower side of the axis.
fn goes_first(a: &Char, b: &Char) -> bool {
    if a.pos.x != b.pos.x {
        return a.pos.x < b.pos.x;
    }
    if a.facing != b.facing {
        return a.facing == Facing::Right;
    }
    a.id < b.id
}

/// Shares of `amount` moved by `(a, b)`.
fn shares(a: &Char, b: &Char, amount: f32) -> (f32, f32) {
    use std::cmp::Ordering;

    match a.push_priority.cmp(&b.push_priority) {
        Ordering::Greater => (0.0, amount),
        Ordering::Less => (amount, 0.0),
        Ordering::Equal => {
            let (wa, wb) = (
                a.constants.size.weight.max(0.0),
                b.constants.size.weight.max(0.0),
            );
            let total = wa + wb;
            if total <= 0.0 {
                (amount / 2.0, amount / 2.0)
            } else {
                let da = amount * wb / total;
                (da, amount - da)
            }
        }
    }
}

fn separate(a: &mut Char, b: &mut Char, world: &WorldContext) {
    let (al, ar) = a.body_span();
    let (bl, br) = b.body_span();
    let ox = overlap(al, ar, bl, br);
    if ox <= 0.0 {
        return;
    }
    let oy = overlap(
        a.pos.y - a.size.height,
        a.pos.y,
        b.pos.y - b.size.height,
        b.pos.y,
    );
    if oy <= 0.0 {
        return;
    }

    let mut along_z = false;
    let mut oz = 0.0;
    if world.config.depth_enabled {
        oz = overlap(
            a.pos.z - a.size.depth[0],
            a.pos.z + a.size.depth[1],
            b.pos.z - b.size.depth[0],
            b.pos.z + b.size.depth[1],
        );
        if oz <= 0.0 {
            return;
        }
        let width = (ar - al) + (br - bl);
        let depth = a.size.depth[0] + a.size.depth[1] + b.size.depth[0] + b.size.depth[1];
        // Least relative overlap is the axis whose centers are displaced
        // furthest relative to the bodies' size.
        along_z = depth > 0.0 && width > 0.0 && oz / depth < ox / width;
    }

    if along_z {
        let (da, db) = shares(a, b, oz);
        let a_front = a.pos.z < b.pos.z || (a.pos.z == b.pos.z && a.id < b.id);
        let sign = if a_front { 1.0 } else { -1.0 };
        a.pos.z -= da * sign;
        b.pos.z += db * sign;
        return;
    }

    let (da, db) = shares(a, b, ox);
    let sign = if goes_first(a, b) { 1.0 } else { -1.0 };
    let target_a = a.pos.x - da * sign;
    let target_b = b.pos.x + db * sign;
    a.pos.x = target_a;
    b.pos.x = target_b;

    // A body stopped by a wall hands the rest of its share to the other.
    a.clamp_to_bounds(world);
    b.pos.x += a.pos.x - target_a;
    b.clamp_to_bounds(world);
    a.pos.x += b.pos.x - target_b - (a.pos.x - target_a);
    a.clamp_to_bounds(world);
}

/// Separates every overlapping pair of opposing bodies, lowest index first.
pub(crate) fn resolve_push(chars: &mut [Char], world: &WorldContext) {
    for i in 0..chars.len() {
        for j in (i + 1)..chars.len() {
            let (a, b) = pair_mut(chars, i, j);
            if a.team == b.team || !takes_part(a) || !takes_part(b) {
                continue;
            }
            separate(a, b, world);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::CharConstants;
    use crate::common::{EntityId, TeamSide};
    use crate::config::{CompatibilityMode, CoreConfig};

    fn body(id: u32, team: TeamSide, x: f32, world: &WorldContext) -> Char {
        let mut c = Char::new_root(
            EntityId(id),
            team,
            id as usize,
            CharConstants::default(),
            CompatibilityMode::Current,
            world,
        );
        c.pos.x = x;
        c
    }

    fn gap(a: &Char, b: &Char) -> f32 {
        b.body_span().0 - a.body_span().1
    }

    #[test]
    fn equal_weights_split_evenly() {
        let world = WorldContext::default();
        let mut chars = vec![
            body(1, TeamSide::One, 0.0, &world),
            body(2, TeamSide::Two, 20.0, &world),
        ];
        chars[1].facing = Facing::Left;
        resolve_push(&mut chars, &world);

        assert!(gap(&chars[0], &chars[1]).abs() < 1e-4);
        let moved_a = -chars[0].pos.x;
        let moved_b = chars[1].pos.x - 20.0;
        assert!((moved_a - moved_b).abs() < 1e-4);
    }

    #[test]
    fn touching_bodies_do_not_move() {
        let world = WorldContext::default();
        let mut chars = vec![
            body(1, TeamSide::One, 0.0, &world),
            body(2, TeamSide::Two, 32.0, &world),
        ];
        chars[1].facing = Facing::Left;
        resolve_push(&mut chars, &world);
        assert_eq!(chars[0].pos.x, 0.0);
        assert_eq!(chars[1].pos.x, 32.0);
    }

    #[test]
    fn higher_priority_stands_still() {
        let world = WorldContext::default();
        let mut chars = vec![
            body(1, TeamSide::One, 0.0, &world),
            body(2, TeamSide::Two, 20.0, &world),
        ];
        chars[1].facing = Facing::Left;
        chars[0].push_priority = 1;
        resolve_push(&mut chars, &world);
        assert_eq!(chars[0].pos.x, 0.0);
        assert!(gap(&chars[0], &chars[1]).abs() < 1e-4);
    }

    #[test]
    fn same_team_and_no_push_are_ignored() {
        let world = WorldContext::default();
        let mut chars = vec![
            body(1, TeamSide::One, 0.0, &world),
            body(2, TeamSide::One, 5.0, &world),
        ];
        resolve_push(&mut chars, &world);
        assert_eq!(chars[1].pos.x, 5.0);

        chars[1].team = TeamSide::Two;
        chars[1].asserts = AssertFlags::NO_PUSH;
        resolve_push(&mut chars, &world);
        assert_eq!(chars[1].pos.x, 5.0);
    }

    #[test]
    fn shallow_depth_overlap_separates_along_depth() {
        let world = WorldContext::new(CoreConfig::new().with_depth(true), 0);
        let mut chars = vec![
            body(1, TeamSide::One, 0.0, &world),
            body(2, TeamSide::Two, 2.0, &world),
        ];
        chars[1].facing = Facing::Left;
        chars[1].pos.z = 5.0;
        resolve_push(&mut chars, &world);

        assert_eq!((chars[0].pos.x, chars[1].pos.x), (0.0, 2.0));
        assert!((chars[0].pos.z + 0.5).abs() < 1e-4);
        assert!((chars[1].pos.z - 5.5).abs() < 1e-4);
    }

    #[test]
    fn wall_hands_the_share_to_the_other_body() {
        let world = WorldContext::new(CoreConfig::new(), 0);
        let left = world.screen.left() + 15.0;
        let mut chars = vec![
            body(1, TeamSide::One, left, &world),
            body(2, TeamSide::Two, left + 20.0, &world),
        ];
        chars[1].facing = Facing::Left;
        resolve_push(&mut chars, &world);
        assert_eq!(chars[0].pos.x, left);
        assert!(gap(&chars[0], &chars[1]).abs() < 1e-4);
    }
}
