//! Shatterbox - an N-dimensional world of breakable falling blocks
//!
//! Core modules:
//! - `geom`: Integer boxes, positions, faces and rays
//! - `tree`: Orthant-split R-Tree and its bordered, movable variant
//! - `sim`: Deterministic simulation (materials, entities, messages, world)
//! - `config`: Data-driven world settings
//! - `view`, `screen`, `driver`: The contract with a front end and its main loop

pub mod config;
pub mod driver;
pub mod error;
pub mod geom;
pub mod screen;
pub mod sim;
pub mod tree;
pub mod view;

pub use config::WorldConfig;
pub use error::{Error, Result};

/// Engine constants
pub mod consts {
    /// Index of the vertical axis; y grows downward
    pub const VERTICAL: usize = 1;

    /// Maximum catch-up ticks per driver step to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Avatar walking speed (pixels/tick)
    pub const WALK_SPEED: i64 = 8;
    /// Avatar take-off speed (pixels/tick)
    pub const JUMP_SPEED: i64 = 60;
    /// How far a dig reaches past the avatar's face (pixels)
    pub const DIG_REACH: i64 = 10;
    pub const DIG_STRENGTH: u32 = 1;

    /// Camera turn per pixel of right-button drag
    pub const MOUSE_DEGREES_PER_PIXEL: f64 = 0.25;
}
