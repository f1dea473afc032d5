//! Deterministic simulation
//!
//! Everything that decides what happens in a world lives here:
//! - Integer positions only; floats appear only in ray queries
//! - One seeded RNG, owned by the world
//! - Stable iteration order (by actor id)
//! - No rendering beyond the `Window` draw calls entities emit

pub mod avatar;
pub mod block;
pub mod entity;
pub mod material;
pub mod message;
pub mod part;
pub mod world;

pub use avatar::Avatar;
pub use block::{Block, Bulwark};
pub use entity::{Body, Entity, Status, draw_body, receive_default, spawn_fragments, tick_entity};
pub use material::{Color, Health, Material, MaterialKind};
pub use message::{Action, DestroyCause, Envelope, Message, NotifyCause};
pub use part::Part;
pub use world::{Actor, World};
