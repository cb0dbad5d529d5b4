/// Mirroring configuration constants.
///
/// Entities owned by the other peer are reflected about this axis so that
/// each peer sees its own board at the bottom of the screen.
pub const ENABLE_MIRRORING: bool = true;

/// Coordinate of the reflection axis.
pub const MIRROR_AXIS_OFFSET: f32 = 0.0;
