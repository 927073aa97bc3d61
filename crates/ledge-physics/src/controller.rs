use serde::{Deserialize, Serialize};

use ledge_core::config::{ConfigError, Validate, non_negative, unit_interval};
use ledge_core::{Aabb, Action, Body, InputSource};

use crate::collision::{Applied, Contact, move_and_collide, move_with_contacts};
use crate::query::CollisionQuery;

/// Horizontal acceleration while a direction is held (px/s^2).
pub const ACCELERATION: f32 = 1400.0;
/// Linear deceleration toward rest with no direction held (px/s^2).
pub const DECELERATION: f32 = 1800.0;
/// Horizontal speed cap (px/s).
pub const MAX_SPEED: f32 = 180.0;
/// Fraction of horizontal speed lost per 60 Hz tick on the ground.
pub const FRICTION: f32 = 0.15;
/// Multiplier on acceleration and deceleration while airborne.
pub const AIR_CONTROL: f32 = 0.65;
/// Jump launch velocity (px/s, negative is up).
pub const JUMP_VELOCITY: f32 = -420.0;
/// Grace period after leaving the ground during which a jump is accepted (s).
pub const COYOTE_TIME: f32 = 0.1;
/// How long an early jump press is remembered (s).
pub const JUMP_BUFFER_TIME: f32 = 0.1;
/// Extra gravity while rising after the jump button is released.
pub const EARLY_RELEASE_MULTIPLIER: f32 = 2.5;
/// Gravity acceleration (px/s^2, downward).
pub const GRAVITY: f32 = 1200.0;
/// Gravity multiplier while falling.
pub const FALL_MULTIPLIER: f32 = 1.5;
/// Terminal fall speed (px/s).
pub const MAX_FALL_SPEED: f32 = 600.0;

/// Player feel parameters, loadable from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub acceleration: f32,
    pub deceleration: f32,
    pub max_speed: f32,
    /// Ground friction coefficient (0-1).
    pub friction: f32,
    /// Air control multiplier (0-1).
    pub air_control: f32,
    pub jump_velocity: f32,
    pub coyote_time: f32,
    pub jump_buffer_time: f32,
    /// Releasing jump early cuts the jump short.
    pub variable_jump: bool,
    pub early_release_multiplier: f32,
    pub gravity: f32,
    pub fall_multiplier: f32,
    pub max_fall_speed: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            acceleration: ACCELERATION,
            deceleration: DECELERATION,
            max_speed: MAX_SPEED,
            friction: FRICTION,
            air_control: AIR_CONTROL,
            jump_velocity: JUMP_VELOCITY,
            coyote_time: COYOTE_TIME,
            jump_buffer_time: JUMP_BUFFER_TIME,
            variable_jump: true,
            early_release_multiplier: EARLY_RELEASE_MULTIPLIER,
            gravity: GRAVITY,
            fall_multiplier: FALL_MULTIPLIER,
            max_fall_speed: MAX_FALL_SPEED,
        }
    }
}

impl Validate for Tuning {
    fn validate(&self) -> Result<(), ConfigError> {
        non_negative("acceleration", self.acceleration)?;
        non_negative("deceleration", self.deceleration)?;
        non_negative("max_speed", self.max_speed)?;
        unit_interval("friction", self.friction)?;
        unit_interval("air_control", self.air_control)?;
        if !self.jump_velocity.is_finite() || self.jump_velocity > 0.0 {
            return Err(ConfigError::Invalid {
                field: "jump_velocity",
                reason: format!("expected a finite value <= 0 (up), got {}", self.jump_velocity),
            });
        }
        non_negative("coyote_time", self.coyote_time)?;
        non_negative("jump_buffer_time", self.jump_buffer_time)?;
        non_negative("early_release_multiplier", self.early_release_multiplier)?;
        non_negative("gravity", self.gravity)?;
        non_negative("fall_multiplier", self.fall_multiplier)?;
        non_negative("max_fall_speed", self.max_fall_speed)
    }
}

/// Transient jump and grounding timers owned by one controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub time_since_grounded: f32,
    pub jump_buffered: bool,
    pub jump_buffer_time: f32,
    pub is_jumping: bool,
    pub jump_held_time: f32,
    pub jump_released: bool,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            // A body that has never touched ground gets no coyote window.
            time_since_grounded: f32::MAX,
            jump_buffered: false,
            jump_buffer_time: 0.0,
            is_jumping: false,
            jump_held_time: 0.0,
            jump_released: false,
        }
    }
}

/// Turns per-tick input intent into player velocity and resolved movement.
#[derive(Debug, Clone)]
pub struct MovementController {
    tuning: Tuning,
    state: PlayerState,
}

impl MovementController {
    pub fn new(tuning: Tuning) -> Self {
        Self {
            tuning,
            state: PlayerState::default(),
        }
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Swap in a new tuning record. Timers are kept.
    pub fn replace_tuning(&mut self, tuning: Tuning) {
        self.tuning = tuning;
    }

    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    pub fn restore_state(&mut self, state: PlayerState) {
        self.state = state;
    }

    /// Advance the player one tick, resolving against the tile grid.
    pub fn update<I, Q>(&mut self, body: &mut Body, input: &I, dt: f32, query: &Q) -> Applied
    where
        I: InputSource + ?Sized,
        Q: CollisionQuery + ?Sized,
    {
        let was_grounded = body.on_ground;
        let (dx, dy) = self.integrate(body, input, dt);
        let applied = move_and_collide(body, query, dx, dy);
        log_landing(was_grounded, body);
        applied
    }

    /// Advance the player one tick, resolving against normal-annotated
    /// contacts on a `cell_size` grid (tiles plus solid entities).
    pub fn update_with_contacts<I, F>(
        &mut self,
        body: &mut Body,
        input: &I,
        dt: f32,
        cell_size: f32,
        contacts: F,
    ) -> Applied
    where
        I: InputSource + ?Sized,
        F: FnMut(&Aabb) -> Vec<Contact>,
    {
        let was_grounded = body.on_ground;
        let (dx, dy) = self.integrate(body, input, dt);
        let applied = move_with_contacts(body, dx, dy, cell_size, contacts);
        log_landing(was_grounded, body);
        applied
    }

    /// Velocity sub-steps shared by both resolve paths. Returns the requested
    /// displacement for this tick.
    fn integrate<I>(&mut self, body: &mut Body, input: &I, dt: f32) -> (f32, f32)
    where
        I: InputSource + ?Sized,
    {
        self.apply_horizontal(body, input.move_axis(), dt);
        self.update_jump(body, input, dt);
        self.apply_gravity(body, dt);
        (body.vel_x * dt, body.vel_y * dt)
    }

    fn apply_horizontal(&self, body: &mut Body, axis: f32, dt: f32) {
        let t = &self.tuning;
        if axis != 0.0 {
            let accel = if body.on_ground {
                t.acceleration
            } else {
                t.acceleration * t.air_control
            };
            body.vel_x = approach(body.vel_x, axis * t.max_speed, accel * dt);
        } else if body.on_ground {
            let factor = (t.friction * dt * 60.0).min(1.0);
            body.vel_x *= 1.0 - factor;
            body.vel_x = approach(body.vel_x, 0.0, t.deceleration * dt);
        } else {
            body.vel_x = approach(body.vel_x, 0.0, t.deceleration * t.air_control * dt);
        }
    }

    fn update_jump<I>(&mut self, body: &mut Body, input: &I, dt: f32)
    where
        I: InputSource + ?Sized,
    {
        let t = &self.tuning;
        let s = &mut self.state;

        if body.on_ground {
            s.time_since_grounded = 0.0;
            s.is_jumping = false;
            s.jump_released = false;
        } else {
            s.time_since_grounded += dt;
        }

        if input.just_pressed(Action::Jump) {
            s.jump_buffered = true;
            s.jump_buffer_time = t.jump_buffer_time;
        } else if s.jump_buffered {
            s.jump_buffer_time -= dt;
            if s.jump_buffer_time <= 0.0 {
                s.jump_buffered = false;
                s.jump_buffer_time = 0.0;
                tracing::trace!("Jump buffer expired");
            }
        }

        let eligible = body.on_ground || s.time_since_grounded <= t.coyote_time;
        if s.jump_buffered && eligible {
            tracing::debug!(
                coyote = !body.on_ground,
                since_grounded = s.time_since_grounded,
                "Jump"
            );
            body.vel_y = t.jump_velocity;
            body.on_ground = false;
            s.is_jumping = true;
            s.jump_held_time = 0.0;
            s.time_since_grounded = t.coyote_time + dt;
            s.jump_buffered = false;
            s.jump_buffer_time = 0.0;
        }

        if s.is_jumping {
            if input.pressed(Action::Jump) {
                if !s.jump_released {
                    s.jump_held_time += dt;
                }
            } else if t.variable_jump {
                s.jump_released = true;
            }
        }
    }

    fn apply_gravity(&self, body: &mut Body, dt: f32) {
        let t = &self.tuning;
        let mut gravity = t.gravity;
        if body.vel_y > 0.0 {
            gravity *= t.fall_multiplier;
        }
        if t.variable_jump && self.state.jump_released && body.vel_y < 0.0 {
            gravity *= t.early_release_multiplier;
        }
        body.vel_y = (body.vel_y + gravity * dt).min(t.max_fall_speed);
    }
}

fn log_landing(was_grounded: bool, body: &Body) {
    if !was_grounded && body.on_ground {
        tracing::debug!(x = body.x, y = body.y, "Landed");
    }
}

/// Move `current` toward `target` by at most `step`, without overshooting.
fn approach(current: f32, target: f32, step: f32) -> f32 {
    if current < target {
        (current + step).min(target)
    } else {
        (current - step).max(target)
    }
}
