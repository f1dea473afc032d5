//! Volume algebra on the integer grid
//!
//! Points, boxes, faces, edge bands and line segments. Everything here is
//! dimension-parametric through a `const N: usize`.

pub mod aabb;
pub mod face;
pub mod line;
pub mod pos;

pub use aabb::{Aabb, Points};
pub use face::{Dir, Edge, Face, is_down, is_up};
pub use line::{Intersect, Line};
pub use pos::{Pos, Vector, snap_down, snap_up};
