use serde::{Deserialize, Serialize};

use ledge_core::roles::{EntityId, SolidEntity};
use ledge_core::{Aabb, Body};

/// How far above a platform's top a body's bottom may float and still count
/// as standing on it (px).
pub const STAND_TOLERANCE: f32 = 2.0;
/// How far a body may sink below a platform's top and still be standing (px).
pub const SINK_EPSILON: f32 = 0.01;

/// Outcome of pushing a body out of one or more solids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushResult {
    /// The body was pushed up onto a solid.
    pub grounded: bool,
    pub pushed_sideways: bool,
    /// -1 pushed left, +1 pushed right, 0 no sideways push.
    pub push_dir: i8,
}

/// Push `body` out of `solid` along the axis of least penetration.
///
/// Vertical wins exact ties. A non-overlapping solid leaves the body untouched.
pub fn push_out(body: &mut Body, solid: &Aabb) -> PushResult {
    let b = body.aabb();
    if !b.intersects(solid) {
        return PushResult::default();
    }

    let to_left = b.right() - solid.left();
    let to_right = solid.right() - b.left();
    let to_top = b.bottom() - solid.top();
    let to_bottom = solid.bottom() - b.top();
    let min_x = to_left.min(to_right);
    let min_y = to_top.min(to_bottom);

    let mut result = PushResult::default();
    if min_y <= min_x {
        // A ceiling hit only stops upward motion; the body is not moved.
        if to_top <= to_bottom {
            body.y = solid.top() - body.h;
            body.on_ground = true;
            result.grounded = true;
        }
        body.vel_y = 0.0;
    } else {
        if to_left <= to_right {
            body.x = solid.left() - body.w;
            if body.vel_x > 0.0 {
                body.vel_x = 0.0;
            }
            result.push_dir = -1;
        } else {
            body.x = solid.right();
            if body.vel_x < 0.0 {
                body.vel_x = 0.0;
            }
            result.push_dir = 1;
        }
        result.pushed_sideways = true;
    }
    tracing::trace!(
        x = body.x,
        y = body.y,
        grounded = result.grounded,
        push_dir = result.push_dir,
        "Pushed out of solid"
    );
    result
}

/// Push `body` out of each solid in order. `grounded` is OR-ed across solids;
/// the last sideways push decides the direction.
pub fn push_out_all<'a, I>(body: &mut Body, solids: I) -> PushResult
where
    I: IntoIterator<Item = &'a Aabb>,
{
    solids
        .into_iter()
        .fold(PushResult::default(), |mut acc, solid| {
            let r = push_out(body, solid);
            acc.grounded |= r.grounded;
            if r.pushed_sideways {
                acc.pushed_sideways = true;
                acc.push_dir = r.push_dir;
            }
            acc
        })
}

/// Whether `player` rests on top of `platform`.
pub fn is_standing_on(player: &Aabb, platform: &Aabb) -> bool {
    let gap = platform.top() - player.bottom();
    let overlaps_x = player.left() < platform.right() && player.right() > platform.left();
    overlaps_x && gap <= STAND_TOLERANCE && gap >= -SINK_EPSILON
}

/// A static solid that blocks only while closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Door {
    pub id: EntityId,
    pub bounds: Aabb,
    pub open: bool,
}

impl Door {
    pub fn new(id: EntityId, bounds: Aabb) -> Self {
        Self {
            id,
            bounds,
            open: false,
        }
    }
}

impl SolidEntity for Door {
    fn solid_bounds(&self) -> Option<Aabb> {
        (!self.open).then_some(self.bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_penetration_resolves_vertically() {
        let mut body = Body::new(0.0, 0.0, 10.0, 10.0);
        body.vel_y = 50.0;
        let r = push_out(&mut body, &Aabb::new(5.0, 5.0, 10.0, 10.0));
        assert_eq!(body.x, 0.0);
        assert_eq!(body.y, -5.0);
        assert!(r.grounded);
        assert!(!r.pushed_sideways);
        assert!(body.on_ground);
        assert_eq!(body.vel_y, 0.0);
    }

    #[test]
    fn tie_break_is_stable_across_repeats() {
        for _ in 0..10 {
            let mut body = Body::new(0.0, 0.0, 10.0, 10.0);
            push_out(&mut body, &Aabb::new(5.0, 5.0, 10.0, 10.0));
            assert_eq!((body.x, body.y), (0.0, -5.0));
        }
    }

    #[test]
    fn shallow_side_overlap_pushes_left_and_stops_inward_velocity() {
        let mut body = Body::new(0.0, 0.0, 10.0, 20.0);
        body.vel_x = 80.0;
        let r = push_out(&mut body, &Aabb::new(8.0, 0.0, 20.0, 20.0));
        assert_eq!(body.x, -2.0);
        assert!(r.pushed_sideways);
        assert_eq!(r.push_dir, -1);
        assert!(!r.grounded);
        assert_eq!(body.vel_x, 0.0);
    }

    #[test]
    fn sideways_push_keeps_velocity_away_from_solid() {
        let mut body = Body::new(25.0, 0.0, 10.0, 20.0);
        body.vel_x = 40.0;
        let r = push_out(&mut body, &Aabb::new(8.0, 0.0, 20.0, 20.0));
        assert_eq!(body.x, 28.0);
        assert_eq!(r.push_dir, 1);
        assert_eq!(body.vel_x, 40.0);
    }

    #[test]
    fn ceiling_hit_stops_rise_without_moving_body() {
        let mut body = Body::new(0.0, 18.0, 10.0, 10.0);
        body.vel_y = -120.0;
        let r = push_out(&mut body, &Aabb::new(-20.0, 0.0, 60.0, 20.0));
        assert_eq!(body.x, 0.0);
        assert_eq!(body.y, 18.0);
        assert_eq!(body.vel_y, 0.0);
        assert!(!r.grounded);
        assert!(!body.on_ground);
    }

    #[test]
    fn touching_solid_is_skipped() {
        let mut body = Body::new(0.0, 0.0, 10.0, 10.0);
        let r = push_out(&mut body, &Aabb::new(10.0, 0.0, 10.0, 10.0));
        assert_eq!(r, PushResult::default());
        assert_eq!(body.x, 0.0);
    }

    #[test]
    fn aggregate_ors_grounded_and_keeps_last_direction() {
        let mut body = Body::new(10.0, 10.0, 10.0, 10.0);
        let floor = Aabb::new(0.0, 19.0, 40.0, 10.0);
        let right_wall = Aabb::new(19.0, -40.0, 10.0, 58.0);
        let r = push_out_all(&mut body, [floor, right_wall].iter());
        assert!(r.grounded);
        assert!(r.pushed_sideways);
        assert_eq!(r.push_dir, -1);
        assert_eq!(body.y, 9.0);
        assert_eq!(body.x, 9.0);
    }

    #[test]
    fn standing_detection() {
        let platform = Aabb::new(0.0, 100.0, 64.0, 16.0);
        assert!(is_standing_on(&Aabb::new(10.0, 88.0, 12.0, 12.0), &platform));
        assert!(is_standing_on(&Aabb::new(10.0, 86.5, 12.0, 12.0), &platform));
        // Too high above the top.
        assert!(!is_standing_on(&Aabb::new(10.0, 85.0, 12.0, 12.0), &platform));
        // Sunk into the platform.
        assert!(!is_standing_on(&Aabb::new(10.0, 89.0, 12.0, 12.0), &platform));
        // Only touching the side edge.
        assert!(!is_standing_on(&Aabb::new(64.0, 88.0, 12.0, 12.0), &platform));
    }

    #[test]
    fn open_door_is_passable() {
        let mut door = Door::new(3, Aabb::new(0.0, 0.0, 16.0, 48.0));
        assert_eq!(door.solid_bounds(), Some(door.bounds));
        door.open = true;
        assert_eq!(door.solid_bounds(), None);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn push_out_clears_overlap_unless_hitting_ceiling(
                bx in -30.0f32..30.0,
                by in -30.0f32..30.0,
                bw in 1.0f32..20.0,
                bh in 1.0f32..20.0,
            ) {
                let solid = Aabb::new(0.0, 0.0, 24.0, 24.0);
                let before = Body::new(bx, by, bw, bh);
                let mut body = before.clone();
                let r = push_out(&mut body, &solid);
                if before.aabb().intersects(&solid) && !r.grounded && !r.pushed_sideways {
                    // Ceiling hit: position kept, upward motion stopped.
                    prop_assert_eq!(body.position(), before.position());
                    prop_assert_eq!(body.vel_y, 0.0);
                } else {
                    let b = body.aabb();
                    let depth_x =
                        (b.right().min(solid.right()) - b.left().max(solid.left())).max(0.0);
                    let depth_y =
                        (b.bottom().min(solid.bottom()) - b.top().max(solid.top())).max(0.0);
                    prop_assert!(
                        depth_x.min(depth_y) <= 1e-3,
                        "still embedded: {depth_x} x {depth_y}"
                    );
                }
            }
        }
    }
}
