//! Typed messages exchanged between actors
//!
//! Messages never run inline. `World::send` queues them on the receiver's
//! inbox and the receiver sees them at the start of its next tick.

use std::any::Any;
use std::sync::Arc;

use crate::geom::{Aabb, Face};
use crate::sim::material::Health;
use crate::sim::world::Actor;

/// Why an actor is being destroyed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DestroyCause {
    Removed,
    OutOfBounds,
}

/// What happened to a neighbour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NotifyCause {
    Broken,
    Changed,
    Created,
    Died,
    Moved,
}

/// Commands that application code maps input onto
#[derive(Debug, Clone)]
pub enum Action<const N: usize> {
    /// Leap upward at `speed` pixels/tick when standing on something
    Jump { speed: i64 },
    /// Set velocity along a horizontal axis
    Walk { dim: usize, speed: i64 },
    /// Stop horizontal motion
    Brake,
    /// Hit whatever lies within `reach` of a face
    Dig {
        face: Face,
        reach: i64,
        strength: Health,
    },
    /// Application-defined payload; the receiver downcasts it
    Custom(Arc<dyn Any + Send + Sync>),
}

impl<const N: usize> Action<N> {
    pub fn custom<T: Any + Send + Sync>(value: T) -> Self {
        Action::Custom(Arc::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Action::Custom(payload) => payload.downcast_ref::<T>(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Message<const N: usize> {
    /// Damage `area` (world coordinates) with `strength`
    Hit { area: Aabb<N>, strength: Health },
    Destroy(DestroyCause),
    Notify(NotifyCause),
    /// Sent by the spawner to a freshly spawned actor
    Created,
    Action(Action<N>),
}

impl<const N: usize> Message<N> {
    pub fn hit(area: Aabb<N>, strength: Health) -> Self {
        Message::Hit { area, strength }
    }

    #[inline]
    pub fn is_hit(&self) -> bool {
        matches!(self, Message::Hit { .. })
    }
}

/// A message plus who sent it
#[derive(Debug, Clone)]
pub struct Envelope<const N: usize> {
    pub sender: Option<Actor>,
    pub message: Message<N>,
}

impl<const N: usize> Envelope<N> {
    pub fn new(sender: Option<Actor>, message: Message<N>) -> Self {
        Self { sender, message }
    }
}
