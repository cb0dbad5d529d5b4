/// Entity pool configuration constants.
pub const POOL_SIZE_PER_KIND: usize = 20;

/// Off-screen parking position for inactive pooled entities.
pub const POOL_SENTINEL: (f32, f32, f32) = (-1000.0, -1000.0, 0.0);
