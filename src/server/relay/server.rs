/// Relay server actor.
///
/// Keeps one room per duel and forwards each envelope text to the other
/// peer of the room, unchanged and in arrival order. The relay never looks
/// inside the battlefield; it only checks who may talk to whom.
use actix::prelude::*;
use log::{debug, info, warn};
use std::collections::HashMap;
use uuid::Uuid;

use super::messages::{Forward, Join, Leave, RelayFrame, RoomPeers};

#[derive(Clone)]
struct Member {
    peer: String,
    session: Uuid,
    addr: Recipient<RelayFrame>,
}

pub struct RelayServer {
    rooms: HashMap<String, Vec<Member>>,
    max_peers: usize,
}

impl RelayServer {
    pub fn new(max_peers: usize) -> Self {
        Self {
            rooms: HashMap::new(),
            max_peers,
        }
    }
}

impl Actor for RelayServer {
    type Context = Context<Self>;
}

impl Handler<Join> for RelayServer {
    type Result = ();

    fn handle(&mut self, msg: Join, _: &mut Context<Self>) {
        let members = self.rooms.entry(msg.room.clone()).or_default();

        // Same peer name reconnecting: the new session replaces the old one.
        if let Some(existing) = members.iter_mut().find(|m| m.peer == msg.peer) {
            existing.addr.do_send(RelayFrame::Rejected {
                code: "SESSION_KICKED",
                message: "Another session joined this room under your name".to_string(),
            });
            existing.session = msg.session;
            existing.addr = msg.addr;
            info!("[Relay] {} reconnected to room {}", msg.peer, msg.room);
            return;
        }

        if members.len() >= self.max_peers {
            warn!("[Relay] Room {} is full, refusing {}", msg.room, msg.peer);
            msg.addr.do_send(RelayFrame::Rejected {
                code: "ROOM_FULL",
                message: format!("Room {} already has {} peers", msg.room, self.max_peers),
            });
            return;
        }

        members.push(Member {
            peer: msg.peer.clone(),
            session: msg.session,
            addr: msg.addr,
        });
        info!("[Relay] {} joined room {} ({}/{})", msg.peer, msg.room, members.len(), self.max_peers);
    }
}

impl Handler<Leave> for RelayServer {
    type Result = ();

    fn handle(&mut self, msg: Leave, _: &mut Context<Self>) {
        let Some(members) = self.rooms.get_mut(&msg.room) else {
            return;
        };
        // A replaced session leaving must not evict its successor.
        members.retain(|m| !(m.peer == msg.peer && m.session == msg.session));
        if members.is_empty() {
            self.rooms.remove(&msg.room);
            debug!("[Relay] Room {} closed", msg.room);
        }
        info!("[Relay] {} left room {}", msg.peer, msg.room);
    }
}

impl Handler<Forward> for RelayServer {
    type Result = ();

    fn handle(&mut self, msg: Forward, _: &mut Context<Self>) {
        let Some(members) = self.rooms.get(&msg.room) else {
            warn!("[Relay] Forward to unknown room {}", msg.room);
            return;
        };
        if !members.iter().any(|m| m.peer == msg.from) {
            warn!("[Relay] {} is not in room {}, dropping frame", msg.from, msg.room);
            return;
        }
        for member in members.iter().filter(|m| m.peer != msg.from) {
            member.addr.do_send(RelayFrame::Text(msg.text.clone()));
        }
    }
}

impl Handler<RoomPeers> for RelayServer {
    type Result = MessageResult<RoomPeers>;

    fn handle(&mut self, msg: RoomPeers, _: &mut Context<Self>) -> Self::Result {
        let peers = self
            .rooms
            .get(&msg.room)
            .map(|members| members.iter().map(|m| m.peer.clone()).collect())
            .unwrap_or_default();
        MessageResult(peers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default, Clone)]
    struct Probe {
        frames: Arc<Mutex<Vec<RelayFrame>>>,
    }

    impl Actor for Probe {
        type Context = Context<Self>;
    }

    impl Handler<RelayFrame> for Probe {
        type Result = ();

        fn handle(&mut self, msg: RelayFrame, _: &mut Context<Self>) {
            self.frames.lock().unwrap().push(msg);
        }
    }

    fn join(room: &str, peer: &str, session: Uuid, probe: &Addr<Probe>) -> Join {
        Join {
            room: room.to_string(),
            peer: peer.to_string(),
            session,
            addr: probe.clone().recipient(),
        }
    }

    // Frames the relay queued before replying are ahead of the snapshot in the mailbox.
    async fn settle(probe: &Addr<Probe>) -> Vec<RelayFrame> {
        probe.send(Snapshot).await.unwrap()
    }

    #[derive(Message)]
    #[rtype(result = "Vec<RelayFrame>")]
    struct Snapshot;

    impl Handler<Snapshot> for Probe {
        type Result = MessageResult<Snapshot>;

        fn handle(&mut self, _: Snapshot, _: &mut Context<Self>) -> Self::Result {
            MessageResult(self.frames.lock().unwrap().clone())
        }
    }

    #[actix::test]
    async fn forwards_only_to_the_other_peer_in_order() {
        let relay = RelayServer::new(2).start();
        let alice = Probe::default().start();
        let bob = Probe::default().start();
        relay.send(join("duel", "alice", Uuid::new_v4(), &alice)).await.unwrap();
        relay.send(join("duel", "bob", Uuid::new_v4(), &bob)).await.unwrap();

        for text in ["one", "two"] {
            relay
                .send(Forward { room: "duel".into(), from: "alice".into(), text: text.into() })
                .await
                .unwrap();
        }

        assert!(settle(&alice).await.is_empty());
        assert_eq!(
            settle(&bob).await,
            vec![RelayFrame::Text("one".into()), RelayFrame::Text("two".into())]
        );
    }

    #[actix::test]
    async fn third_peer_is_refused() {
        let relay = RelayServer::new(2).start();
        let probes: Vec<Addr<Probe>> = (0..3).map(|_| Probe::default().start()).collect();
        for (i, probe) in probes.iter().enumerate() {
            relay.send(join("duel", &format!("p{}", i), Uuid::new_v4(), probe)).await.unwrap();
        }

        let peers = relay.send(RoomPeers { room: "duel".into() }).await.unwrap();
        assert_eq!(peers, vec!["p0".to_string(), "p1".to_string()]);
        let frames = settle(&probes[2]).await;
        assert!(matches!(frames.as_slice(), [RelayFrame::Rejected { code: "ROOM_FULL", .. }]));
    }

    #[actix::test]
    async fn stale_session_leaving_keeps_its_replacement() {
        let relay = RelayServer::new(2).start();
        let old = Probe::default().start();
        let new = Probe::default().start();
        let old_session = Uuid::new_v4();
        relay.send(join("duel", "alice", old_session, &old)).await.unwrap();
        relay.send(join("duel", "alice", Uuid::new_v4(), &new)).await.unwrap();
        relay
            .send(Leave { room: "duel".into(), peer: "alice".into(), session: old_session })
            .await
            .unwrap();

        let peers = relay.send(RoomPeers { room: "duel".into() }).await.unwrap();
        assert_eq!(peers, vec!["alice".to_string()]);
        let frames = settle(&old).await;
        assert!(matches!(frames.as_slice(), [RelayFrame::Rejected { code: "SESSION_KICKED", .. }]));
    }
}
