pub mod movement;
pub mod patrol;
pub mod placement;

pub use movement::*;
pub use patrol::*;
pub use placement::*;
