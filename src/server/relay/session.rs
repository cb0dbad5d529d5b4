/// WebSocket session of one peer in a duel room.
///
/// Text frames must be `RpcEnvelope` JSON. Valid ones are handed to the relay
/// as the original text; anything else is answered with an error frame and
/// never reaches the other peer.
use actix::prelude::*;
use actix_web::{web, Error, HttpRequest, HttpResponse, http::StatusCode};
use actix_web_actors::ws;
use log::{debug, warn};
use serde_json::json;
use std::borrow::Cow;
use uuid::Uuid;

use super::messages::{Forward, Join, Leave, RelayFrame};
use super::server::RelayServer;
use crate::game::rpc::RpcEnvelope;
use crate::server::ws_error::{http_error_response, ws_error_message};

pub struct RelaySession {
    pub room: String,
    pub peer: String,
    pub session: Uuid,
    pub relay_addr: Addr<RelayServer>,
}

impl RelaySession {
    fn context(&self) -> serde_json::Value {
        json!({ "room": self.room, "peer": self.peer })
    }
}

impl Actor for RelaySession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        self.relay_addr.do_send(Join {
            room: self.room.clone(),
            peer: self.peer.clone(),
            session: self.session,
            addr: ctx.address().recipient(),
        });
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        self.relay_addr.do_send(Leave {
            room: self.room.clone(),
            peer: self.peer.clone(),
            session: self.session,
        });
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for RelaySession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Text(text)) => match serde_json::from_str::<RpcEnvelope>(&text) {
                Ok(envelope) => {
                    debug!(
                        "[Relay] {} -> room {}: {} #{}",
                        self.peer,
                        self.room,
                        envelope.message.name(),
                        envelope.seq
                    );
                    self.relay_addr.do_send(Forward {
                        room: self.room.clone(),
                        from: self.peer.clone(),
                        text: text.to_string(),
                    });
                }
                Err(e) => {
                    warn!("[Relay] Invalid envelope from {}: {}", self.peer, e);
                    ctx.text(ws_error_message(
                        "INVALID_ENVELOPE",
                        &format!("Could not parse RPC envelope: {}", e),
                        Some(self.context()),
                    ));
                }
            },
            Ok(ws::Message::Binary(_)) => {
                ctx.text(ws_error_message(
                    "BINARY_UNSUPPORTED",
                    "Envelopes are sent as JSON text frames",
                    Some(self.context()),
                ));
            }
            Ok(ws::Message::Ping(msg)) => ctx.pong(&msg),
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Err(e) => {
                warn!("[Relay] Protocol error from {}: {}", self.peer, e);
                ctx.stop();
            }
            _ => (),
        }
    }
}

impl Handler<RelayFrame> for RelaySession {
    type Result = ();

    fn handle(&mut self, msg: RelayFrame, ctx: &mut Self::Context) {
        match msg {
            RelayFrame::Text(text) => ctx.text(text),
            RelayFrame::Rejected { code, message } => {
                ctx.text(ws_error_message(code, &message, Some(self.context())));
                ctx.close(Some(ws::CloseReason {
                    code: ws::CloseCode::Policy,
                    description: Some(message),
                }));
                ctx.stop();
            }
        }
    }
}

/// WebSocket endpoint of a duel room.
///
/// Expects the room id in the path and the peer name as the `peer` query
/// parameter.
pub async fn ws_relay(
    req: HttpRequest,
    stream: web::Payload,
    room_id: web::Path<String>,
    data: web::Data<crate::server::state::AppState>,
) -> Result<HttpResponse, Error> {
    let mut peer = String::new();
    for kv in req.query_string().split('&') {
        let mut split = kv.split('=');
        if let (Some("peer"), Some(name)) = (split.next(), split.next()) {
            peer = urlencoding::decode(name)
                .unwrap_or_else(|_| Cow::Borrowed(""))
                .into_owned();
        }
    }

    if peer.is_empty() {
        return Ok(http_error_response(
            "MISSING_PEER",
            "The peer query parameter is required",
            Some(json!({ "room": room_id.as_str() })),
            StatusCode::BAD_REQUEST,
        ));
    }

    ws::start(
        RelaySession {
            room: room_id.into_inner(),
            peer,
            session: Uuid::new_v4(),
            relay_addr: data.relay_addr.clone(),
        },
        &req,
        stream,
    )
}
