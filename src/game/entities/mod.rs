//! Entity records and the pool that recycles them.

pub mod entity;
pub mod pool;

pub use entity::*;
pub use pool::*;
