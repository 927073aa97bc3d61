use serde::{Deserialize, Serialize};

use ledge_core::{Aabb, Body, Vec2};

use crate::query::{CollisionQuery, cell_span};

/// Depth of the probe box used to test for support under a resting body.
const GROUND_PROBE_DEPTH: f32 = 0.5;

/// Displacement actually applied by a resolve call, with per-axis hit flags.
/// A blocked axis reports zero displacement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Applied {
    pub dx: f32,
    pub dy: f32,
    pub hit_x: bool,
    pub hit_y: bool,
}

/// Move `body` by `(dx, dy)` against the tile world, X axis first.
///
/// On a hit the leading edge snaps flush to the nearest colliding tile and
/// the velocity on that axis is zeroed. A body already embedded in tiles is
/// not ejected unless it moves on that axis.
pub fn move_and_collide<Q>(body: &mut Body, query: &Q, dx: f32, dy: f32) -> Applied
where
    Q: CollisionQuery + ?Sized,
{
    let mut applied = Applied::default();

    if dx != 0.0 {
        body.x += dx;
        let tiles = query.overlapping_solid_tiles(&body.aabb());
        if tiles.is_empty() {
            applied.dx = dx;
        } else {
            let bounds = tiles.iter().map(|&(tx, ty)| query.tile_bounds(tx, ty));
            if dx > 0.0 {
                let edge = bounds.map(|b| b.left()).fold(f32::INFINITY, f32::min);
                body.x = edge - body.w;
            } else {
                let edge = bounds.map(|b| b.right()).fold(f32::NEG_INFINITY, f32::max);
                body.x = edge;
            }
            body.vel_x = 0.0;
            applied.hit_x = true;
            tracing::trace!(x = body.x, "Tile hit on x axis");
        }
    }

    body.on_ground = false;
    if dy != 0.0 {
        body.y += dy;
        let tiles = query.overlapping_solid_tiles(&body.aabb());
        if tiles.is_empty() {
            applied.dy = dy;
        } else {
            let bounds = tiles.iter().map(|&(tx, ty)| query.tile_bounds(tx, ty));
            if dy > 0.0 {
                let edge = bounds.map(|b| b.top()).fold(f32::INFINITY, f32::min);
                body.y = edge - body.h;
                body.on_ground = true;
            } else {
                let edge = bounds.map(|b| b.bottom()).fold(f32::NEG_INFINITY, f32::max);
                body.y = edge;
            }
            body.vel_y = 0.0;
            applied.hit_y = true;
            tracing::trace!(y = body.y, on_ground = body.on_ground, "Tile hit on y axis");
        }
    } else {
        body.on_ground = query.overlaps_solid(&ground_probe(body));
    }

    applied
}

/// Thin box directly beneath the body's bottom edge.
fn ground_probe(body: &Body) -> Aabb {
    Aabb::new(body.x, body.y + body.h, body.w, GROUND_PROBE_DEPTH)
}

/// A normal-annotated collision with one cell of a fixed-size grid.
///
/// Each normal component is the sign of `body_center - cell_center` on that
/// axis, so a cell to the right of the body has `normal.x < 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub cell_x: i32,
    pub cell_y: i32,
    pub normal: Vec2,
}

fn sign(v: f32) -> f32 {
    if v < 0.0 {
        -1.0
    } else if v > 0.0 {
        1.0
    } else {
        0.0
    }
}

/// Contacts for every `cell_size` cell overlapped by `aabb` that `blocked`
/// reports as solid. The grid is anchored at the world origin.
pub fn cell_contacts<F>(aabb: &Aabb, cell_size: f32, mut blocked: F) -> Vec<Contact>
where
    F: FnMut(&Aabb) -> bool,
{
    let Some((xs, ys)) = cell_span(aabb, Vec2::ZERO, cell_size, cell_size) else {
        return Vec::new();
    };
    let center = aabb.center();
    let mut contacts = Vec::new();
    for cy in ys {
        for cx in xs.clone() {
            let cell = Aabb::new(
                cx as f32 * cell_size,
                cy as f32 * cell_size,
                cell_size,
                cell_size,
            );
            if blocked(&cell) {
                let cc = cell.center();
                contacts.push(Contact {
                    cell_x: cx,
                    cell_y: cy,
                    normal: Vec2::new(sign(center.x - cc.x), sign(center.y - cc.y)),
                });
            }
        }
    }
    contacts
}

/// Contacts against solid tiles of `query`.
pub fn tile_contacts<Q>(query: &Q, aabb: &Aabb, cell_size: f32) -> Vec<Contact>
where
    Q: CollisionQuery + ?Sized,
{
    cell_contacts(aabb, cell_size, |cell| query.overlaps_solid(cell))
}

/// Contacts against the cells covered by solid entity bounds.
pub fn solid_contacts(solids: &[Aabb], aabb: &Aabb, cell_size: f32) -> Vec<Contact> {
    if solids.is_empty() {
        return Vec::new();
    }
    cell_contacts(aabb, cell_size, |cell| solids.iter().any(|s| s.intersects(cell)))
}

/// Per-axis resolve against normal-annotated contacts on a `cell_size` grid.
///
/// `contacts` is queried with the body's box after each axis move. Only
/// contacts whose normal opposes the motion block it; the body snaps flush to
/// the first blocking cell along that axis.
pub fn move_with_contacts<F>(
    body: &mut Body,
    dx: f32,
    dy: f32,
    cell_size: f32,
    mut contacts: F,
) -> Applied
where
    F: FnMut(&Aabb) -> Vec<Contact>,
{
    let mut applied = Applied::default();

    if dx != 0.0 {
        body.x += dx;
        let hits = contacts(&body.aabb());
        let blocking = hits
            .iter()
            .filter(|c| if dx > 0.0 { c.normal.x < 0.0 } else { c.normal.x > 0.0 });
        let edge = if dx > 0.0 {
            blocking
                .map(|c| c.cell_x as f32 * cell_size)
                .reduce(f32::min)
                .map(|left| left - body.w)
        } else {
            blocking
                .map(|c| (c.cell_x + 1) as f32 * cell_size)
                .reduce(f32::max)
        };
        match edge {
            Some(x) => {
                body.x = x;
                body.vel_x = 0.0;
                applied.hit_x = true;
            },
            None => applied.dx = dx,
        }
    }

    body.on_ground = false;
    if dy != 0.0 {
        body.y += dy;
        let hits = contacts(&body.aabb());
        let blocking = hits
            .iter()
            .filter(|c| if dy > 0.0 { c.normal.y < 0.0 } else { c.normal.y > 0.0 });
        let edge = if dy > 0.0 {
            blocking
                .map(|c| c.cell_y as f32 * cell_size)
                .reduce(f32::min)
                .map(|top| top - body.h)
        } else {
            blocking
                .map(|c| (c.cell_y + 1) as f32 * cell_size)
                .reduce(f32::max)
        };
        match edge {
            Some(y) => {
                body.y = y;
                body.on_ground = dy > 0.0;
                body.vel_y = 0.0;
                applied.hit_y = true;
            },
            None => applied.dy = dy,
        }
    } else {
        body.on_ground = !contacts(&ground_probe(body)).is_empty();
    }

    applied
}
