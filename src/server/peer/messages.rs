use actix::prelude::*;

use crate::game::entities::EntityView;
use crate::game::error::SyncError;
use crate::game::rpc::RpcEnvelope;
use crate::game::systems::GestureEvent;
use crate::game::types::{EntityId, EntityKind, PeerId, SlotIndex, Vec3};

/// An announcement from the other peer.
#[derive(Message, Debug, Clone)]
#[rtype(result = "()")]
pub struct Inbound {
    pub envelope: RpcEnvelope,
}

/// Local pointer input. Replies with the relocation id when a drag resolves.
#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "Option<u64>")]
pub struct Gesture {
    pub event: GestureEvent,
}

#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "Option<EntityId>")]
pub struct SpawnCharacter {
    pub kind: EntityKind,
}

#[derive(Message, Debug, Clone)]
#[rtype(result = "Option<EntityId>")]
pub struct SpawnMonster {
    pub kind: EntityKind,
    pub route: Vec<Vec3>,
}

#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "Result<Option<f32>, SyncError>")]
pub struct DamageEntity {
    pub entity: EntityId,
    pub amount: f32,
}

#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "Result<(), SyncError>")]
pub struct DespawnEntity {
    pub entity: EntityId,
}

/// Advance the simulation by hand (for actors started without the timer).
/// Replies with how many relocations settled.
#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "usize")]
pub struct Tick {
    pub dt: f32,
}

/// Pair this peer with the other side of the duel.
#[derive(Message)]
#[rtype(result = "()")]
pub struct LinkPeer {
    pub peer: PeerId,
    pub recipient: Recipient<Inbound>,
}

#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "Option<Vec<EntityId>>")]
pub struct QuerySlot {
    pub owner: PeerId,
    pub slot: SlotIndex,
}

#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "Option<EntityView>")]
pub struct QueryEntity {
    pub entity: EntityId,
}
