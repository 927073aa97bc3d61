use ledge_core::Body;
use ledge_physics::{SimConfig, Simulation, TILE_SIZE, TileGrid};

/// Top of the floor row in [`floor_room`].
pub const FLOOR_Y: f32 = 192.0;

/// 30x13 room of 16px tiles: open air above a one-tile floor at row 12.
pub fn floor_room() -> TileGrid {
    let mut rows = vec![".............................."; 12];
    rows.push("##############################");
    TileGrid::from_rows(&rows, TILE_SIZE)
}

/// 12x12 player body with its top-left corner at `(x, y)`.
pub fn player_at(x: f32, y: f32) -> Body {
    Body::new(x, y, 12.0, 12.0)
}

/// Simulation with default config and a player resting on the floor at `x`.
pub fn sim_on_floor(x: f32) -> Simulation {
    sim_with(SimConfig::default(), x)
}

pub fn sim_with(config: SimConfig, x: f32) -> Simulation {
    Simulation::new(config, player_at(x, FLOOR_Y - 12.0))
}
