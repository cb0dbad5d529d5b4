//! Ownership and mirror resolution.
//!
//! Every authority check in the core goes through `OwnershipResolver`. The
//! peer roster is a collaborator: when it cannot answer, an entity counts as
//! authoritative only if its owner is the local peer, and nothing is mirrored.

use crate::config::MirrorConfig;
use crate::game::entities::entity::Entity;
use crate::game::types::{PeerId, PlacedPosition, Vec3};

pub trait PeerRoster {
    fn local_peer(&self) -> PeerId;

    /// `None` while the roster is unavailable (not connected, peer list not known yet).
    fn am_i_authoritative_for(&self, owner: PeerId) -> Option<bool>;

    fn local_peer_rank(&self) -> Option<u32>;
}

/// Roster of a two-peer session. Ranks follow the sorted peer ids, so both
/// sides agree on them without exchanging anything.
#[derive(Debug, Clone)]
pub struct SessionRoster {
    local: PeerId,
    peers: Vec<PeerId>,
}

impl SessionRoster {
    /// A roster that only knows the local peer (unavailable until `join`).
    pub fn solo(local: PeerId) -> Self {
        Self { local, peers: vec![local] }
    }

    pub fn new(local: PeerId, mut peers: Vec<PeerId>) -> Self {
        if !peers.contains(&local) {
            peers.push(local);
        }
        peers.sort();
        peers.dedup();
        Self { local, peers }
    }

    pub fn join(&mut self, peer: PeerId) {
        if !self.peers.contains(&peer) {
            self.peers.push(peer);
            self.peers.sort();
        }
    }

    pub fn peers(&self) -> &[PeerId] {
        &self.peers
    }

    fn is_available(&self) -> bool {
        self.peers.len() >= 2
    }
}

impl PeerRoster for SessionRoster {
    fn local_peer(&self) -> PeerId {
        self.local
    }

    fn am_i_authoritative_for(&self, owner: PeerId) -> Option<bool> {
        self.is_available().then_some(owner == self.local)
    }

    fn local_peer_rank(&self) -> Option<u32> {
        if !self.is_available() {
            return None;
        }
        self.peers.iter().position(|p| *p == self.local).map(|i| i as u32)
    }
}

pub struct OwnershipResolver {
    roster: Box<dyn PeerRoster + Send>,
    mirror: MirrorConfig,
}

impl OwnershipResolver {
    pub fn new(roster: Box<dyn PeerRoster + Send>, mirror: MirrorConfig) -> Self {
        Self { roster, mirror }
    }

    pub fn set_roster(&mut self, roster: Box<dyn PeerRoster + Send>) {
        self.roster = roster;
    }

    pub fn local_peer(&self) -> PeerId {
        self.roster.local_peer()
    }

    pub fn local_rank(&self) -> Option<u32> {
        self.roster.local_peer_rank()
    }

    pub fn is_authoritative_owner(&self, owner: PeerId) -> bool {
        self.roster
            .am_i_authoritative_for(owner)
            .unwrap_or_else(|| owner == self.roster.local_peer())
    }

    pub fn is_authoritative(&self, entity: &Entity) -> bool {
        self.is_authoritative_owner(entity.owner)
    }

    /// Mirror only when enabled and the roster positively says we don't own it.
    pub fn should_mirror_owner(&self, owner: PeerId) -> bool {
        self.mirror.enabled && self.roster.am_i_authoritative_for(owner) == Some(false)
    }

    pub fn should_mirror(&self, entity: &Entity) -> bool {
        self.should_mirror_owner(entity.owner)
    }

    /// Reflect one axis about the configured offset: `axis - (p - axis)`.
    pub fn mirror_position(&self, p: Vec3) -> Vec3 {
        let axis = self.mirror.offset;
        let value = p.component(self.mirror.axis);
        p.with_component(self.mirror.axis, axis - (value - axis))
    }

    pub fn display_for(&self, owner: PeerId, original: Vec3) -> Vec3 {
        if self.should_mirror_owner(owner) {
            self.mirror_position(original)
        } else {
            original
        }
    }

    /// Pure: derived from `original` every time, never from the previous display.
    pub fn to_display_position(&self, entity: &Entity) -> PlacedPosition {
        let original = entity.position.original;
        PlacedPosition {
            original,
            display: self.display_for(entity.owner, original),
        }
    }
}
