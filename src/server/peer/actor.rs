//! Actor hosting one peer's battlefield.
//!
//! All battlefield access goes through this actor's mailbox, which gives the
//! single-threaded, in-order processing the sync core relies on. After every
//! handled message the outbox is flushed to the linked peer.

use std::sync::Arc;

use actix::prelude::*;
use log::{debug, info, warn};

use crate::config::EngineConfig;
use crate::game::animation::UniformCatalog;
use crate::game::ownership::SessionRoster;
use crate::game::presentation::LogSink;
use crate::game::state::Battlefield;
use crate::game::types::PeerId;
use crate::server::peer::messages::*;

pub struct PeerActor {
    battlefield: Battlefield,
    link: Option<Recipient<Inbound>>,
    auto_tick: bool,
}

impl PeerActor {
    /// A headless peer: standard clip counts, HP changes go to the log.
    pub fn new(config: EngineConfig, local: PeerId) -> Self {
        let battlefield = Battlefield::new(
            config,
            Box::new(SessionRoster::solo(local)),
            Arc::new(UniformCatalog::standard()),
            Box::new(LogSink),
        );
        Self::with_battlefield(battlefield)
    }

    pub fn with_battlefield(battlefield: Battlefield) -> Self {
        Self {
            battlefield,
            link: None,
            auto_tick: true,
        }
    }

    /// Do not start the tick timer; the simulation only advances on `Tick`.
    pub fn without_timer(mut self) -> Self {
        self.auto_tick = false;
        self
    }

    /// Send queued announcements to the linked peer. Until a peer is linked
    /// they stay queued, so nothing announced before linking is lost.
    fn flush(&mut self) {
        let Some(link) = &self.link else {
            return;
        };
        for envelope in self.battlefield.drain_outbox() {
            link.do_send(Inbound { envelope });
        }
    }
}

impl Actor for PeerActor {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!("[Peer] {} started", self.battlefield.local_peer());
        if !self.auto_tick {
            return;
        }
        let interval = self.battlefield.config().tick.interval();
        let dt = interval.as_secs_f32();
        ctx.run_interval(interval, move |act, _ctx| {
            act.battlefield.tick(dt);
            act.flush();
        });
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        info!("[Peer] {} stopped", self.battlefield.local_peer());
    }
}

impl Handler<Inbound> for PeerActor {
    type Result = ();

    fn handle(&mut self, msg: Inbound, _ctx: &mut Context<Self>) {
        let seq = msg.envelope.seq;
        let name = msg.envelope.message.name();
        if let Err(e) = self.battlefield.apply_remote(msg.envelope) {
            warn!("[Peer] Dropped remote {} #{}: {}", name, seq, e);
        }
        self.flush();
    }
}

impl Handler<Gesture> for PeerActor {
    type Result = MessageResult<Gesture>;

    fn handle(&mut self, msg: Gesture, _ctx: &mut Context<Self>) -> Self::Result {
        let request = self.battlefield.handle_gesture(msg.event);
        self.flush();
        MessageResult(request)
    }
}

impl Handler<SpawnCharacter> for PeerActor {
    type Result = MessageResult<SpawnCharacter>;

    fn handle(&mut self, msg: SpawnCharacter, _ctx: &mut Context<Self>) -> Self::Result {
        let id = self.battlefield.spawn_character(msg.kind);
        self.flush();
        MessageResult(id)
    }
}

impl Handler<SpawnMonster> for PeerActor {
    type Result = MessageResult<SpawnMonster>;

    fn handle(&mut self, msg: SpawnMonster, _ctx: &mut Context<Self>) -> Self::Result {
        let id = self.battlefield.spawn_monster(msg.kind, msg.route);
        self.flush();
        MessageResult(id)
    }
}

impl Handler<DamageEntity> for PeerActor {
    type Result = MessageResult<DamageEntity>;

    fn handle(&mut self, msg: DamageEntity, _ctx: &mut Context<Self>) -> Self::Result {
        let hp = self.battlefield.damage(msg.entity, msg.amount);
        self.flush();
        MessageResult(hp)
    }
}

impl Handler<DespawnEntity> for PeerActor {
    type Result = MessageResult<DespawnEntity>;

    fn handle(&mut self, msg: DespawnEntity, _ctx: &mut Context<Self>) -> Self::Result {
        let result = self.battlefield.despawn(msg.entity);
        self.flush();
        MessageResult(result)
    }
}

impl Handler<Tick> for PeerActor {
    type Result = MessageResult<Tick>;

    fn handle(&mut self, msg: Tick, _ctx: &mut Context<Self>) -> Self::Result {
        let settled = self.battlefield.tick(msg.dt).len();
        self.flush();
        MessageResult(settled)
    }
}

impl Handler<LinkPeer> for PeerActor {
    type Result = ();

    fn handle(&mut self, msg: LinkPeer, _ctx: &mut Context<Self>) {
        let local = self.battlefield.local_peer();
        self.battlefield
            .set_roster(Box::new(SessionRoster::new(local, vec![msg.peer])));
        self.link = Some(msg.recipient);
        info!("[Peer] {} linked with {}", local, msg.peer);
        self.flush();
    }
}

impl Handler<QuerySlot> for PeerActor {
    type Result = MessageResult<QuerySlot>;

    fn handle(&mut self, msg: QuerySlot, _ctx: &mut Context<Self>) -> Self::Result {
        debug!("[Peer] Query slot {} of {}", msg.slot, msg.owner);
        MessageResult(self.battlefield.slot_occupants(msg.owner, msg.slot))
    }
}

impl Handler<QueryEntity> for PeerActor {
    type Result = MessageResult<QueryEntity>;

    fn handle(&mut self, msg: QueryEntity, _ctx: &mut Context<Self>) -> Self::Result {
        MessageResult(self.battlefield.view(msg.entity))
    }
}
