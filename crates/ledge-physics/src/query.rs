use std::ops::RangeInclusive;

use ledge_core::{Aabb, Vec2};

/// Overlaps shallower than this (px) count as touching. Snapped positions are
/// computed as `edge - size`, which can land an ulp inside the edge.
pub const CONTACT_EPSILON: f32 = 1e-3;

/// Read-only view of the static tile world.
///
/// Implementors supply tile size and per-tile solidity; overlap queries and
/// enumeration are derived. Coordinates outside the grid must report not solid.
pub trait CollisionQuery {
    /// Tile width and height in world pixels.
    fn tile_size(&self) -> (f32, f32);

    /// World position of tile (0, 0)'s top-left corner.
    fn grid_origin(&self) -> Vec2 {
        Vec2::ZERO
    }

    fn is_solid_at_tile(&self, tx: i32, ty: i32) -> bool;

    /// World bounds of tile `(tx, ty)`.
    fn tile_bounds(&self, tx: i32, ty: i32) -> Aabb {
        let (tw, th) = self.tile_size();
        let origin = self.grid_origin();
        Aabb::new(
            origin.x + tx as f32 * tw,
            origin.y + ty as f32 * th,
            tw,
            th,
        )
    }

    /// Coordinates of every tile (solid or not) that `aabb` overlaps.
    fn overlapping_tiles(&self, aabb: &Aabb) -> Vec<(i32, i32)> {
        let (tw, th) = self.tile_size();
        let Some((xs, ys)) = cell_span(aabb, self.grid_origin(), tw, th) else {
            return Vec::new();
        };
        let mut tiles = Vec::new();
        for ty in ys {
            for tx in xs.clone() {
                tiles.push((tx, ty));
            }
        }
        tiles
    }

    /// Coordinates of the solid tiles that `aabb` overlaps.
    fn overlapping_solid_tiles(&self, aabb: &Aabb) -> Vec<(i32, i32)> {
        self.overlapping_tiles(aabb)
            .into_iter()
            .filter(|&(tx, ty)| self.is_solid_at_tile(tx, ty))
            .collect()
    }

    fn overlaps_solid(&self, aabb: &Aabb) -> bool {
        let (tw, th) = self.tile_size();
        let Some((xs, ys)) = cell_span(aabb, self.grid_origin(), tw, th) else {
            return false;
        };
        ys.into_iter()
            .any(|ty| xs.clone().any(|tx| self.is_solid_at_tile(tx, ty)))
    }
}

/// Inclusive column and row ranges of the `cw`×`ch` cells `aabb` strictly
/// overlaps, or `None` for an empty box or degenerate cell size.
pub fn cell_span(
    aabb: &Aabb,
    origin: Vec2,
    cw: f32,
    ch: f32,
) -> Option<(RangeInclusive<i32>, RangeInclusive<i32>)> {
    if aabb.is_empty() || cw <= 0.0 || ch <= 0.0 {
        return None;
    }
    let min_x = ((aabb.left() - origin.x + CONTACT_EPSILON) / cw).floor() as i32;
    let max_x = ((aabb.right() - origin.x - CONTACT_EPSILON) / cw).ceil() as i32 - 1;
    let min_y = ((aabb.top() - origin.y + CONTACT_EPSILON) / ch).floor() as i32;
    let max_y = ((aabb.bottom() - origin.y - CONTACT_EPSILON) / ch).ceil() as i32 - 1;
    if max_x < min_x || max_y < min_y {
        return None;
    }
    Some((min_x..=max_x, min_y..=max_y))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Single solid tile at (2, 3) on a 16px grid.
    struct OneTile;

    impl CollisionQuery for OneTile {
        fn tile_size(&self) -> (f32, f32) {
            (16.0, 16.0)
        }

        fn is_solid_at_tile(&self, tx: i32, ty: i32) -> bool {
            tx == 2 && ty == 3
        }
    }

    #[test]
    fn span_excludes_touching_cells() {
        let b = Aabb::new(16.0, 16.0, 16.0, 16.0);
        let (xs, ys) = cell_span(&b, Vec2::ZERO, 16.0, 16.0).unwrap();
        assert_eq!(xs, 1..=1);
        assert_eq!(ys, 1..=1);
    }

    #[test]
    fn span_covers_partial_cells() {
        let b = Aabb::new(10.0, 30.0, 12.0, 12.0);
        let (xs, ys) = cell_span(&b, Vec2::ZERO, 16.0, 16.0).unwrap();
        assert_eq!(xs, 0..=1);
        assert_eq!(ys, 1..=2);
    }

    #[test]
    fn span_respects_origin() {
        let b = Aabb::new(104.0, 104.0, 12.0, 12.0);
        let origin = Vec2::new(0.0, 4.0);
        let (_, ys) = cell_span(&b, origin, 16.0, 16.0).unwrap();
        // Rows start at 4, 20, ... 100, 116: the box spans row 6 only.
        assert_eq!(ys, 6..=6);
    }

    #[test]
    fn empty_box_spans_nothing() {
        assert!(cell_span(&Aabb::new(5.0, 5.0, 0.0, 8.0), Vec2::ZERO, 16.0, 16.0).is_none());
        assert!(OneTile.overlapping_tiles(&Aabb::new(40.0, 56.0, 0.0, 0.0)).is_empty());
    }

    #[test]
    fn derived_overlap_queries() {
        let inside = Aabb::new(36.0, 52.0, 4.0, 4.0);
        let beside = Aabb::new(48.0, 48.0, 16.0, 16.0);
        assert!(OneTile.overlaps_solid(&inside));
        assert!(!OneTile.overlaps_solid(&beside));
        assert_eq!(OneTile.overlapping_solid_tiles(&inside), vec![(2, 3)]);
        assert_eq!(OneTile.tile_bounds(2, 3), Aabb::new(32.0, 48.0, 16.0, 16.0));
    }

    #[test]
    fn sub_epsilon_overlap_is_touching() {
        let grazing = Aabb::new(32.0 - 16.0 + 0.0001, 48.0, 16.0, 16.0);
        assert!(!OneTile.overlaps_solid(&grazing));
    }
}
