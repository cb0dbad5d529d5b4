/// Movement configuration constants.
///
/// Speeds are in world units per second, distances in world units,
/// the drag threshold in screen pixels.
pub const CHARACTER_MOVE_SPEED: f32 = 5.0;

/// Monsters walk their patrol route slower than characters relocate.
pub const MONSTER_MOVE_SPEED: f32 = 2.0;

/// Remaining distance under which a move counts as reached.
pub const REACHED_DISTANCE: f32 = 0.1;

/// Pointer travel (pixels) before a press on a slot becomes a drag.
pub const DRAG_THRESHOLD_PX: f32 = 10.0;

/// Hit points a character starts with.
pub const CHARACTER_HP: f32 = 100.0;

/// Hit points a monster starts with.
pub const MONSTER_HP: f32 = 10.0;
