//! Occupancy grid module.
//!
//! A board is a fixed set of capacity-3 slots; `grid` holds the board and its
//! placement/swap operations, `slot` the per-slot membership and layout table.

pub mod grid;
pub mod slot;

pub use grid::*;
pub use slot::*;
