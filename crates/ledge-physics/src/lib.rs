pub mod collision;
pub mod controller;
pub mod grid;
pub mod platform;
pub mod query;
pub mod solids;

use serde::{Deserialize, Serialize};

use ledge_core::config::{ConfigError, Validate, load_or_default, non_negative};
use ledge_core::roles::{EntityId, Kinematic, Trigger, advance_all, solid_bounds, triggered_by};
use ledge_core::time::{
    DEFAULT_MAX_FRAME_SECS, DEFAULT_TICK_RATE_HZ, FixedTimestep, MAX_TICK_RATE_HZ,
};
use ledge_core::{Aabb, Body, InputFrame, InputSource, Vec2};

pub use collision::{
    Applied, Contact, move_and_collide, move_with_contacts, solid_contacts, tile_contacts,
};
pub use controller::{MovementController, PlayerState, Tuning};
pub use grid::{TILE_SIZE, Tile, TileGrid, generate_grid};
pub use platform::MovingPlatform;
pub use query::{CONTACT_EPSILON, CollisionQuery};
pub use solids::{Door, PushResult, is_standing_on, push_out, push_out_all};

/// Top-level simulation configuration, loadable from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub tuning: Tuning,
    pub tick_rate_hz: f32,
    pub max_frame_secs: f32,
    /// Cell size of the contact grid used when solids block during movement.
    pub cell_size: f32,
    /// Resolve solid entities inside the movement step instead of pushing
    /// the player out afterwards.
    pub block_solids_during_move: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tuning: Tuning::default(),
            tick_rate_hz: DEFAULT_TICK_RATE_HZ,
            max_frame_secs: DEFAULT_MAX_FRAME_SECS,
            cell_size: TILE_SIZE,
            block_solids_during_move: false,
        }
    }
}

impl Validate for SimConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.tuning.validate()?;
        positive("tick_rate_hz", self.tick_rate_hz)?;
        if self.tick_rate_hz > MAX_TICK_RATE_HZ {
            return Err(ConfigError::Invalid {
                field: "tick_rate_hz",
                reason: format!(
                    "expected at most {MAX_TICK_RATE_HZ} Hz, got {}",
                    self.tick_rate_hz
                ),
            });
        }
        non_negative("max_frame_secs", self.max_frame_secs)?;
        positive("cell_size", self.cell_size)
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigError::Invalid {
            field,
            reason: format!("expected a finite value > 0, got {value}"),
        });
    }
    Ok(())
}

impl SimConfig {
    /// Load config from a TOML file. Falls back to defaults if the file is
    /// missing, unparseable, or out of range.
    pub fn load() -> Self {
        load_or_default("LEDGE_CONFIG", "config/ledge.toml")
    }
}

/// Errors from encoding or decoding a simulation snapshot.
#[derive(Debug)]
pub enum SnapshotError {
    Encode(String),
    Decode(String),
}

impl std::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encode(e) => write!(f, "snapshot encode error: {e}"),
            Self::Decode(e) => write!(f, "snapshot decode error: {e}"),
        }
    }
}

impl std::error::Error for SnapshotError {}

/// What happened to the player during one tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    /// Index of this tick, starting at 0.
    pub tick: u64,
    pub grounded: bool,
    pub pushed_sideways: bool,
    /// -1 pushed left, +1 pushed right, 0 no sideways push.
    pub push_dir: i8,
    /// Platform whose motion was applied to the player this tick.
    pub carried_by: Option<EntityId>,
    /// Displacement each platform applied this tick, in insertion order.
    pub platform_deltas: Vec<(EntityId, Vec2)>,
    /// Movement the controller resolved against the world.
    pub applied: Applied,
}

/// Mutable simulation state captured by a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SimState {
    tick: u64,
    clock: FixedTimestep,
    pending: Option<InputFrame>,
    player: Body,
    controller: PlayerState,
    platforms: Vec<MovingPlatform>,
    doors: Vec<Door>,
}

/// One player, its movement controller, and the entities it collides with,
/// advanced together on a fixed timestep.
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimConfig,
    clock: FixedTimestep,
    controller: MovementController,
    player: Body,
    platforms: Vec<MovingPlatform>,
    doors: Vec<Door>,
    tick: u64,
    /// Input received on frames too short to run a tick.
    pending: Option<InputFrame>,
}

impl Simulation {
    pub fn new(config: SimConfig, player: Body) -> Self {
        Self {
            clock: FixedTimestep::new(config.tick_rate_hz, config.max_frame_secs),
            controller: MovementController::new(config.tuning.clone()),
            config,
            player,
            platforms: Vec::new(),
            doors: Vec::new(),
            tick: 0,
            pending: None,
        }
    }

    pub fn add_platform(&mut self, platform: MovingPlatform) {
        self.platforms.push(platform);
    }

    pub fn add_door(&mut self, door: Door) {
        self.doors.push(door);
    }

    pub fn door_mut(&mut self, id: EntityId) -> Option<&mut Door> {
        self.doors.iter_mut().find(|d| d.id == id)
    }

    pub fn doors(&self) -> &[Door] {
        &self.doors
    }

    pub fn player(&self) -> &Body {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Body {
        &mut self.player
    }

    pub fn controller(&self) -> &MovementController {
        &self.controller
    }

    pub fn platforms(&self) -> &[MovingPlatform] {
        &self.platforms
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Number of ticks run so far.
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Fixed tick duration in seconds.
    pub fn dt(&self) -> f32 {
        self.clock.step()
    }

    /// Fraction of a tick left over after the last `advance`.
    pub fn alpha(&self) -> f32 {
        self.clock.alpha()
    }

    /// Hot-swap the player tuning. Timers and positions are kept.
    pub fn set_tuning(&mut self, tuning: Tuning) {
        self.controller.replace_tuning(tuning.clone());
        self.config.tuning = tuning;
    }

    /// IDs of the triggers the player currently overlaps.
    pub fn triggered<T: Trigger>(&self, triggers: &[T]) -> Vec<EntityId> {
        triggered_by(&self.player.aabb(), triggers)
    }

    /// Bounds of every entity currently blocking the player.
    fn blocking_solids(&self) -> Vec<Aabb> {
        let mut solids = solid_bounds(self.platforms.iter().filter(|p| p.push_player));
        solids.extend(solid_bounds(&self.doors));
        solids
    }

    /// Run exactly one fixed tick.
    pub fn tick<I, Q>(&mut self, input: &I, query: &Q) -> TickReport
    where
        I: InputSource + ?Sized,
        Q: CollisionQuery + ?Sized,
    {
        let dt = self.clock.step();

        let player_box = self.player.aabb();
        let rider_of = self
            .platforms
            .iter()
            .find(|p| p.carries_riders() && is_standing_on(&player_box, &p.body.aabb()))
            .map(|p| p.id);

        let platform_deltas = advance_all(&mut self.platforms, dt);

        let carried_by = rider_of.and_then(|id| {
            let &(_, delta) = platform_deltas.iter().find(|(pid, _)| *pid == id)?;
            self.player.translate(delta);
            Some(id)
        });

        let applied = if self.config.block_solids_during_move {
            let solids = self.blocking_solids();
            let cell = self.config.cell_size;
            self.controller
                .update_with_contacts(&mut self.player, input, dt, cell, |aabb| {
                    let mut contacts = tile_contacts(query, aabb, cell);
                    contacts.extend(solid_contacts(&solids, aabb, cell));
                    contacts
                })
        } else {
            self.controller.update(&mut self.player, input, dt, query)
        };

        let solids = self.blocking_solids();
        let push = push_out_all(&mut self.player, &solids);

        let report = TickReport {
            tick: self.tick,
            grounded: self.player.on_ground,
            pushed_sideways: push.pushed_sideways,
            push_dir: push.push_dir,
            carried_by,
            platform_deltas,
            applied,
        };
        self.tick += 1;
        report
    }

    /// Feed one frame of wall-clock time and run the whole ticks it covers.
    ///
    /// Press edges are delivered on the first tick only. A frame too short to
    /// run a tick keeps its edges for the next frame that does.
    pub fn advance<Q>(&mut self, frame_secs: f32, input: InputFrame, query: &Q) -> Vec<TickReport>
    where
        Q: CollisionQuery + ?Sized,
    {
        let mut frame = match self.pending.take() {
            Some(earlier) => earlier.accumulate(input),
            None => input,
        };
        let ticks = self.clock.advance(frame_secs);
        if ticks == 0 {
            self.pending = Some(frame);
            return Vec::new();
        }

        let mut reports = Vec::with_capacity(ticks as usize);
        for _ in 0..ticks {
            reports.push(self.tick(&frame, query));
            frame = frame.without_edges();
        }
        reports
    }

    /// Encode the mutable state (player, timers, entities, clock) as MessagePack.
    pub fn snapshot(&self) -> Result<Vec<u8>, SnapshotError> {
        let state = SimState {
            tick: self.tick,
            clock: self.clock.clone(),
            pending: self.pending,
            player: self.player.clone(),
            controller: self.controller.state().clone(),
            platforms: self.platforms.clone(),
            doors: self.doors.clone(),
        };
        rmp_serde::to_vec(&state).map_err(|e| SnapshotError::Encode(e.to_string()))
    }

    /// Replace the mutable state with a snapshot. Configuration is kept.
    pub fn restore(&mut self, bytes: &[u8]) -> Result<(), SnapshotError> {
        let state: SimState =
            rmp_serde::from_slice(bytes).map_err(|e| SnapshotError::Decode(e.to_string()))?;
        self.tick = state.tick;
        self.clock = state.clock;
        self.pending = state.pending;
        self.player = state.player;
        self.controller.restore_state(state.controller);
        self.platforms = state.platforms;
        self.doors = state.doors;
        tracing::debug!(tick = self.tick, "Restored snapshot");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledge_core::config::parse_toml;
    use ledge_core::test_helpers::{held, idle, jump_tap};
    use ledge_core::Action;

    fn open_room() -> TileGrid {
        let mut rows = vec!["...................."; 12];
        rows.push("####################");
        TileGrid::from_rows(&rows, TILE_SIZE)
    }

    /// Player standing on the floor of `open_room`.
    fn resting_sim() -> Simulation {
        let player = Body::new(40.0, 192.0 - 12.0, 12.0, 12.0);
        Simulation::new(SimConfig::default(), player)
    }

    #[test]
    fn default_config_is_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg: SimConfig = parse_toml(
            r#"
            tick_rate_hz = 120.0

            [tuning]
            max_speed = 150.0
            "#,
        )
        .unwrap();
        assert_eq!(cfg.tick_rate_hz, 120.0);
        assert_eq!(cfg.tuning.max_speed, 150.0);
        assert_eq!(cfg.tuning.gravity, controller::GRAVITY);
        assert_eq!(cfg.cell_size, TILE_SIZE);
        assert!(!cfg.block_solids_during_move);
    }

    #[test]
    fn shipped_config_matches_defaults() {
        let cfg: SimConfig = parse_toml(include_str!("../../../config/ledge.toml")).unwrap();
        assert_eq!(cfg, SimConfig::default());
    }

    #[test]
    fn zero_tick_rate_is_rejected() {
        let err = parse_toml::<SimConfig>("tick_rate_hz = 0.0").unwrap_err();
        match err {
            ConfigError::Invalid { field, .. } => assert_eq!(field, "tick_rate_hz"),
            other => panic!("expected invalid tick rate, got {other}"),
        }
    }

    #[test]
    fn huge_tick_rate_is_rejected() {
        let err = parse_toml::<SimConfig>("tick_rate_hz = 1e9").unwrap_err();
        match err {
            ConfigError::Invalid { field, .. } => assert_eq!(field, "tick_rate_hz"),
            other => panic!("expected invalid tick rate, got {other}"),
        }
        let max = format!("tick_rate_hz = {MAX_TICK_RATE_HZ:?}");
        assert!(parse_toml::<SimConfig>(&max).is_ok());
    }

    #[test]
    fn nested_tuning_errors_surface() {
        let err = parse_toml::<SimConfig>("[tuning]\nfriction = 1.5").unwrap_err();
        assert!(err.to_string().contains("friction"), "got {err}");
    }

    #[test]
    fn tick_numbers_increase() {
        let grid = open_room();
        let mut sim = Simulation::new(SimConfig::default(), Body::new(40.0, 40.0, 12.0, 12.0));
        let a = sim.tick(&idle(), &grid);
        let b = sim.tick(&idle(), &grid);
        assert_eq!((a.tick, b.tick), (0, 1));
        assert_eq!(sim.tick_count(), 2);
    }

    #[test]
    fn short_frame_keeps_jump_edge_for_next_tick() {
        let grid = open_room();
        let mut sim = resting_sim();
        sim.tick(&idle(), &grid);
        assert!(sim.player().on_ground);

        // A tap shorter than one tick, released before the next frame.
        let dt = sim.dt();
        assert!(sim.advance(dt * 0.25, jump_tap(&[]), &grid).is_empty());
        let reports = sim.advance(dt, idle(), &grid);
        assert_eq!(reports.len(), 1);
        assert!(sim.player().vel_y < 0.0, "tap should have produced a jump");
    }

    #[test]
    fn multi_tick_frame_delivers_edge_once() {
        let grid = open_room();
        let mut sim = resting_sim();
        sim.tick(&idle(), &grid);
        let dt = sim.dt();
        let reports = sim.advance(dt * 3.5, jump_tap(&[Action::Jump]), &grid);
        assert_eq!(reports.len(), 3);
        assert!(!sim.controller().state().jump_buffered);
        assert!(sim.controller().state().is_jumping);
    }

    #[test]
    fn hot_swapped_tuning_applies() {
        let grid = open_room();
        let mut sim = resting_sim();
        sim.set_tuning(Tuning {
            max_speed: 30.0,
            ..Tuning::default()
        });
        for _ in 0..30 {
            sim.tick(&held(&[Action::MoveRight]), &grid);
        }
        assert_eq!(sim.player().vel_x, 30.0);
        assert_eq!(sim.config().tuning.max_speed, 30.0);
    }

    #[test]
    fn teleported_player_falls_back_to_floor() {
        let grid = open_room();
        let mut sim = resting_sim();
        sim.tick(&idle(), &grid);
        assert!(sim.player().on_ground);

        let player = sim.player_mut();
        player.y = 100.0;
        player.on_ground = false;
        sim.tick(&idle(), &grid);
        assert!(sim.player().y > 100.0);
        assert!(!sim.player().on_ground);

        for _ in 0..60 {
            sim.tick(&idle(), &grid);
        }
        assert!(sim.player().on_ground);
        assert!((sim.player().y - 180.0).abs() < 1e-3);
    }

    #[test]
    fn garbage_snapshot_fails_to_decode() {
        let mut sim = Simulation::new(SimConfig::default(), Body::new(0.0, 0.0, 12.0, 12.0));
        match sim.restore(&[0xc1, 0x00, 0x07]) {
            Err(SnapshotError::Decode(_)) => {},
            other => panic!("expected decode error, got {other:?}"),
        }
    }
}
