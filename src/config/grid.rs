/// Occupancy grid configuration constants.
///
/// This module defines the slot layout of a peer's board: how many slots,
/// how far apart their centers are, and how occupants are spread inside a slot.

/// Maximum number of entities a single slot can hold.
pub const SLOT_CAPACITY: usize = 3;

/// Number of rows in a board.
pub const GRID_ROW: usize = 3;

/// Number of columns in a board.
pub const GRID_COL: usize = 6;

/// Distance between two neighbouring slot centers (world units).
pub const SLOT_SPACING: f32 = 1.0;

/// World position of the center of slot 0 (bottom-left of the board).
pub const GRID_ORIGIN: (f32, f32, f32) = (-2.5, -3.0, 0.0);

/// Horizontal spread of occupants inside a slot.
pub const SLOT_OFFSET_X: f32 = 0.1;

/// Vertical spread of occupants inside a slot (3-occupant layout only).
pub const SLOT_OFFSET_Y: f32 = 0.1;
