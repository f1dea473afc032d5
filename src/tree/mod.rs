//! Spatial indexes
//!
//! - `rtree`: orthant-split R-Tree over anything `Bounded`
//! - `components`: face-adjacency grouping on top of an R-Tree
//! - `brtree`: R-Tree with a global offset and cached border edges

pub mod brtree;
pub mod components;
pub mod rtree;

pub use brtree::BRTree;
pub use components::UnionFind;
pub use rtree::{Bounded, GRID_EXP_MAX, GRID_EXP_MIN, ItemId, MAX_ENTRIES, RTree};
