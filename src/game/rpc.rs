//! Wire messages between the two peers.
//!
//! Reliable and in order per sender. Positions on the wire are always the
//! authoritative (un-mirrored) coordinates; receivers mirror on display.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::game::types::{AnimationState, EntityId, EntityKind, PeerId, SlotIndex, Vec3};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "data")]
pub enum RpcMessage {
    SpawnAt {
        entity_id: EntityId,
        kind: EntityKind,
        owner: PeerId,
        position: Vec3,
    },
    PlaceInSlot {
        entity_id: EntityId,
        slot: SlotIndex,
    },
    RemoveFromSlot {
        entity_id: EntityId,
        slot: SlotIndex,
    },
    Relocate {
        source: SlotIndex,
        destination: SlotIndex,
    },
    MoveTo {
        entity_id: EntityId,
        target: Vec3,
    },
    SetAnimation {
        entity_id: EntityId,
        state: AnimationState,
        index: usize,
    },
    SetPosition {
        entity_id: EntityId,
        position: Vec3,
    },
    SetRoute {
        entity_id: EntityId,
        points: Vec<Vec3>,
    },
    Despawn {
        entity_id: EntityId,
    },
    Damage {
        entity_id: EntityId,
        amount: f32,
    },
    HpChanged {
        entity_id: EntityId,
        hp: f32,
    },
}

impl RpcMessage {
    pub fn name(&self) -> &'static str {
        match self {
            RpcMessage::SpawnAt { .. } => "SpawnAt",
            RpcMessage::PlaceInSlot { .. } => "PlaceInSlot",
            RpcMessage::RemoveFromSlot { .. } => "RemoveFromSlot",
            RpcMessage::Relocate { .. } => "Relocate",
            RpcMessage::MoveTo { .. } => "MoveTo",
            RpcMessage::SetAnimation { .. } => "SetAnimation",
            RpcMessage::SetPosition { .. } => "SetPosition",
            RpcMessage::SetRoute { .. } => "SetRoute",
            RpcMessage::Despawn { .. } => "Despawn",
            RpcMessage::Damage { .. } => "Damage",
            RpcMessage::HpChanged { .. } => "HpChanged",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcEnvelope {
    pub sender: PeerId,
    pub seq: u64,
    pub message: RpcMessage,
}

/// Messages queued during one handling step, numbered on drain.
#[derive(Debug, Default)]
pub struct Outbox {
    queued: Vec<RpcMessage>,
    next_seq: u64,
}

impl Outbox {
    pub fn push(&mut self, message: RpcMessage) {
        debug!("[Rpc] Queued {}", message.name());
        self.queued.push(message);
    }

    pub fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queued.len()
    }

    /// Queued messages not yet drained, oldest first.
    pub fn pending(&self) -> &[RpcMessage] {
        &self.queued
    }

    pub fn drain(&mut self, sender: PeerId) -> Vec<RpcEnvelope> {
        self.queued
            .drain(..)
            .map(|message| {
                let seq = self.next_seq;
                self.next_seq += 1;
                RpcEnvelope { sender, seq, message }
            })
            .collect()
    }
}

/// Tracks the last sequence number seen per sender.
#[derive(Debug, Default)]
pub struct SequenceTracker {
    last: std::collections::HashMap<PeerId, u64>,
}

impl SequenceTracker {
    /// Record `envelope`; returns false (and warns) on a gap or a regression.
    /// The envelope is applied either way.
    pub fn observe(&mut self, envelope: &RpcEnvelope) -> bool {
        let expected = self.last.get(&envelope.sender).map(|s| s + 1).unwrap_or(0);
        self.last.insert(envelope.sender, envelope.seq);
        if envelope.seq != expected {
            warn!(
                "[Rpc] Sequence jump from {}: expected {} got {} ({}), desync possible",
                envelope.sender,
                expected,
                envelope.seq,
                envelope.message.name()
            );
            return false;
        }
        true
    }
}
