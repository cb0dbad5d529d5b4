use actix::prelude::*;
use uuid::Uuid;

/// What the relay pushes down to a websocket session.
#[derive(Message, Debug, Clone, PartialEq)]
#[rtype(result = "()")]
pub enum RelayFrame {
    /// An envelope from the other peer, forwarded as received.
    Text(String),
    /// The session is refused or replaced; it sends the error and closes.
    Rejected { code: &'static str, message: String },
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Join {
    pub room: String,
    pub peer: String,
    pub session: Uuid,
    pub addr: Recipient<RelayFrame>,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Leave {
    pub room: String,
    pub peer: String,
    pub session: Uuid,
}

#[derive(Message, Debug, Clone)]
#[rtype(result = "()")]
pub struct Forward {
    pub room: String,
    pub from: String,
    pub text: String,
}

/// Names of the peers currently in `room`.
#[derive(Message, Debug, Clone)]
#[rtype(result = "Vec<String>")]
pub struct RoomPeers {
    pub room: String,
}
