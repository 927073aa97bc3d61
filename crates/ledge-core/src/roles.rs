use crate::geom::{Aabb, Body, Vec2};

/// Unique identifier for an entity owned by the simulation.
pub type EntityId = u32;

/// An entity that owns a physical body.
pub trait HasBody {
    fn body(&self) -> &Body;

    fn body_mut(&mut self) -> &mut Body;

    fn aabb(&self) -> Aabb {
        self.body().aabb()
    }
}

/// A body that drives its own motion by a fixed rule.
///
/// Kinematic entities are advanced before the player is resolved each tick,
/// so the player always collides against their current-tick position.
pub trait Kinematic: HasBody {
    fn id(&self) -> EntityId;

    /// Advance one tick and return the displacement actually applied.
    fn advance(&mut self, dt: f32) -> Vec2;

    /// Whether a rider standing on this body inherits its displacement.
    fn carries_riders(&self) -> bool {
        true
    }
}

/// An entity that blocks the player (platforms, doors).
pub trait SolidEntity {
    /// Blocking bounds, or `None` while the entity is passable (e.g. an open door).
    fn solid_bounds(&self) -> Option<Aabb>;
}

/// A region that reacts when the player's final AABB overlaps it.
pub trait Trigger {
    fn id(&self) -> EntityId;

    fn region(&self) -> Aabb;
}

/// Advance every kinematic entity in order, returning `(id, applied delta)` pairs.
pub fn advance_all<K: Kinematic>(entities: &mut [K], dt: f32) -> Vec<(EntityId, Vec2)> {
    entities
        .iter_mut()
        .map(|k| {
            let delta = k.advance(dt);
            (k.id(), delta)
        })
        .collect()
}

/// Collect the currently blocking bounds of a set of solid entities.
pub fn solid_bounds<'a, I, S>(entities: I) -> Vec<Aabb>
where
    I: IntoIterator<Item = &'a S>,
    S: SolidEntity + 'a,
{
    entities
        .into_iter()
        .filter_map(S::solid_bounds)
        .collect()
}

/// IDs of triggers whose region overlaps `aabb`, in input order.
pub fn triggered_by<T: Trigger>(aabb: &Aabb, triggers: &[T]) -> Vec<EntityId> {
    triggers
        .iter()
        .filter(|t| t.region().intersects(aabb))
        .map(T::id)
        .collect()
}
