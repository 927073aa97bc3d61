use serde::{Deserialize, Serialize};

use ledge_core::roles::{EntityId, HasBody, Kinematic, SolidEntity};
use ledge_core::{Aabb, Body, Vec2};

/// Remaining distance (px) below which a platform counts as arrived.
pub const ARRIVE_EPSILON: f32 = 1e-3;

/// A platform shuttling between two points at constant speed, pausing at
/// each end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovingPlatform {
    pub id: EntityId,
    pub body: Body,
    pub start: Vec2,
    pub end: Vec2,
    /// Travel speed (px/s).
    pub speed: f32,
    pub going_to_end: bool,
    /// Seconds left in the current pause.
    pub wait_timer: f32,
    /// Pause at each end (s).
    pub wait_time: f32,
    /// Whether the player is pushed out of this platform's bounds.
    pub push_player: bool,
}

impl MovingPlatform {
    /// Platform of size `w`×`h` placed at `start`, heading toward `end`.
    pub fn new(
        id: EntityId,
        start: Vec2,
        end: Vec2,
        w: f32,
        h: f32,
        speed: f32,
        wait_time: f32,
    ) -> Self {
        Self {
            id,
            body: Body::new(start.x, start.y, w, h),
            start,
            end,
            speed,
            going_to_end: true,
            wait_timer: 0.0,
            wait_time,
            push_player: true,
        }
    }

    pub fn with_push_player(mut self, push_player: bool) -> Self {
        self.push_player = push_player;
        self
    }

    fn target(&self) -> Vec2 {
        if self.going_to_end { self.end } else { self.start }
    }

    fn stop(&mut self) {
        self.body.vel_x = 0.0;
        self.body.vel_y = 0.0;
    }

    /// Advance one tick and return the displacement actually applied.
    pub fn update(&mut self, dt: f32) -> Vec2 {
        if self.wait_timer > 0.0 {
            self.wait_timer -= dt;
            self.stop();
            return Vec2::ZERO;
        }

        let to_target = self.target() - self.body.position();
        let remaining = to_target.length();
        if remaining < ARRIVE_EPSILON {
            self.going_to_end = !self.going_to_end;
            self.stop();
            return Vec2::ZERO;
        }

        let step = self.speed * dt;
        if step >= remaining {
            self.body.set_position(self.target());
            self.going_to_end = !self.going_to_end;
            self.wait_timer = self.wait_time;
            self.stop();
            tracing::debug!(
                id = self.id,
                x = self.body.x,
                y = self.body.y,
                "Platform arrived"
            );
            return to_target;
        }

        let dir = to_target * (1.0 / remaining);
        let delta = dir * step;
        self.body.translate(delta);
        self.body.vel_x = dir.x * self.speed;
        self.body.vel_y = dir.y * self.speed;
        delta
    }
}

impl HasBody for MovingPlatform {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }
}

impl Kinematic for MovingPlatform {
    fn id(&self) -> EntityId {
        self.id
    }

    fn advance(&mut self, dt: f32) -> Vec2 {
        self.update(dt)
    }
}

impl SolidEntity for MovingPlatform {
    fn solid_bounds(&self) -> Option<Aabb> {
        Some(self.body.aabb())
    }
}
