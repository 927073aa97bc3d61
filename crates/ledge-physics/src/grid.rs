use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use ledge_core::Vec2;

use crate::query::CollisionQuery;

/// Default tile edge length in world pixels.
pub const TILE_SIZE: f32 = 16.0;

/// Tile types relevant to collision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tile {
    Empty,
    Solid,
}

/// A fixed-size tile grid stored row-major, usable as a collision query surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileGrid {
    /// Width in tiles.
    pub width: u32,
    /// Height in tiles.
    pub height: u32,
    pub tile_w: f32,
    pub tile_h: f32,
    /// World position of tile (0, 0)'s top-left corner.
    pub origin: Vec2,
    /// Tile data stored row-major (y * width + x).
    pub tiles: Vec<Tile>,
    /// Suggested player spawn (world px, top-left).
    pub spawn: Vec2,
}

impl TileGrid {
    pub fn new(width: u32, height: u32, tile_size: f32) -> Self {
        Self {
            width,
            height,
            tile_w: tile_size,
            tile_h: tile_size,
            origin: Vec2::ZERO,
            tiles: vec![Tile::Empty; (width * height) as usize],
            spawn: Vec2::ZERO,
        }
    }

    /// Build a grid from text rows, `#` marking solid tiles.
    pub fn from_rows(rows: &[&str], tile_size: f32) -> Self {
        let height = rows.len() as u32;
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0) as u32;
        let mut grid = Self::new(width, height, tile_size);
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                if c == '#' {
                    grid.set_tile(x as u32, y as u32, Tile::Solid);
                }
            }
        }
        grid
    }

    pub fn with_origin(mut self, origin: Vec2) -> Self {
        self.origin = origin;
        self
    }

    pub fn get_tile(&self, x: i32, y: i32) -> Tile {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return Tile::Empty;
        }
        self.tiles[y as usize * self.width as usize + x as usize]
    }

    pub fn set_tile(&mut self, x: u32, y: u32, tile: Tile) {
        if x < self.width && y < self.height {
            self.tiles[y as usize * self.width as usize + x as usize] = tile;
        }
    }

    fn fill_rect(&mut self, x0: u32, y0: u32, w: u32, h: u32, tile: Tile) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                self.set_tile(x, y, tile);
            }
        }
    }
}

impl CollisionQuery for TileGrid {
    fn tile_size(&self) -> (f32, f32) {
        (self.tile_w, self.tile_h)
    }

    fn grid_origin(&self) -> Vec2 {
        self.origin
    }

    fn is_solid_at_tile(&self, tx: i32, ty: i32) -> bool {
        matches!(self.get_tile(tx, ty), Tile::Solid)
    }
}

/// Chunk width in tiles (each generated section is this wide).
const CHUNK_WIDTH: u32 = 8;
/// Number of chunks in a generated grid.
const NUM_CHUNKS: u32 = 8;
/// Generated grid height in tiles.
pub const GRID_HEIGHT: u32 = 20;
/// Rows of solid floor at the bottom of a generated grid.
const FLOOR_ROWS: u32 = 2;

/// Generate a deterministic test grid from a seed: a solid floor with pits,
/// ledges, staircases, and walls with gaps. The first chunk is always flat.
pub fn generate_grid(seed: u64) -> TileGrid {
    let width = CHUNK_WIDTH * NUM_CHUNKS;
    let height = GRID_HEIGHT;
    let floor_y = height - FLOOR_ROWS;
    let mut grid = TileGrid::new(width, height, TILE_SIZE);
    grid.fill_rect(0, floor_y, width, FLOOR_ROWS, Tile::Solid);
    // Left boundary wall
    grid.fill_rect(0, 0, 1, floor_y, Tile::Solid);
    grid.spawn = Vec2::new(2.0 * TILE_SIZE, (floor_y - 3) as f32 * TILE_SIZE);

    let mut rng = StdRng::seed_from_u64(seed);
    for chunk_idx in 1..NUM_CHUNKS {
        generate_chunk(&mut grid, &mut rng, chunk_idx * CHUNK_WIDTH, floor_y);
    }
    grid
}

fn generate_chunk(grid: &mut TileGrid, rng: &mut StdRng, base_x: u32, floor_y: u32) {
    match rng.random_range(0u8..4) {
        0 => {
            // Pit through the floor
            let pit_start = base_x + rng.random_range(2..5);
            let pit_width = rng.random_range(2..4);
            grid.fill_rect(pit_start, floor_y, pit_width, FLOOR_ROWS, Tile::Empty);
        },
        1 => {
            // Floating ledge
            let ledge_y = floor_y - rng.random_range(3u32..6);
            let ledge_start = base_x + rng.random_range(1..3);
            let ledge_len = rng.random_range(3..6);
            grid.fill_rect(ledge_start, ledge_y, ledge_len, 1, Tile::Solid);
        },
        2 => {
            // Staircase going up
            for i in 0..4u32 {
                grid.fill_rect(base_x + i * 2, floor_y - 1 - i, 2, i + 1, Tile::Solid);
            }
        },
        _ => {
            // Wall with a gap
            let wall_x = base_x + CHUNK_WIDTH / 2;
            let gap_y = floor_y - rng.random_range(3u32..6);
            for y in floor_y.saturating_sub(8)..floor_y {
                if y != gap_y && y != gap_y + 1 {
                    grid.set_tile(wall_x, y, Tile::Solid);
                }
            }
        },
    }
}
