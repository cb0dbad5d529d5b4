pub mod actor;
pub mod messages;

pub use actor::PeerActor;
pub use messages::*;
