//! Entity pool.
//!
//! Every peer warms the same per-kind pools at scene load on its own; nothing
//! about pool contents goes over the wire. Activation hands an inactive
//! instance a network id, release parks it at the sentinel for reuse.
//!
//! The pool is also the entity registry: entities instantiated outside the
//! pool (remote spawns that found the pool exhausted) live in `transient` and
//! are destroyed on release.

use std::collections::HashMap;

use log::{debug, info, warn};

use crate::game::entities::entity::{Entity, KindDefaults};
use crate::game::error::SyncError;
use crate::game::grid::OccupantAccess;
use crate::game::types::{EntityId, EntityKind, PeerId, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Location {
    Pooled { kind: EntityKind, slot: usize },
    Transient,
}

pub struct EntityPool {
    instances: HashMap<EntityKind, Vec<Entity>>,
    transient: HashMap<EntityId, Entity>,
    index: HashMap<EntityId, Location>,
    sentinel: Vec3,
    defaults: KindDefaults,
    /// Used only for audit labels in logs.
    rank: u32,
}

impl EntityPool {
    pub fn new(sentinel: Vec3, defaults: KindDefaults) -> Self {
        Self {
            instances: HashMap::new(),
            transient: HashMap::new(),
            index: HashMap::new(),
            sentinel,
            defaults,
            rank: 0,
        }
    }

    pub fn set_rank(&mut self, rank: u32) {
        self.rank = rank;
    }

    /// Instantiate `count` more inactive instances of `kind`, parked at the sentinel.
    pub fn warm_up(&mut self, kind: EntityKind, count: usize) {
        let list = self.instances.entry(kind).or_default();
        let start = list.len();
        for slot in start..start + count {
            list.push(Entity::parked(kind, PeerId::default(), self.sentinel, Some(slot)));
        }
        debug!("[Pool] Warmed {} x{} (total {})", kind, count, list.len());
    }

    /// Activate the first inactive instance of `kind` under the given id/owner.
    /// Returns `None` when every instance is active; the pool never grows.
    pub fn acquire(&mut self, kind: EntityKind, id: EntityId, owner: PeerId) -> Option<&mut Entity> {
        if self.index.contains_key(&id) {
            warn!("[Pool] {} is already active, refusing second activation", id);
            return None;
        }
        let list = self.instances.get_mut(&kind)?;
        let slot = list.iter().position(|e| !e.is_active())?;
        let entity = &mut list[slot];
        entity.activate(id, owner, &self.defaults);
        self.index.insert(id, Location::Pooled { kind, slot });
        info!("[Pool] Activated {} as {}", audit_label(self.rank, kind, slot), id);
        Some(entity)
    }

    /// Create a non-poolable entity (destroyed on release).
    pub fn instantiate(&mut self, kind: EntityKind, id: EntityId, owner: PeerId) -> &mut Entity {
        let mut entity = Entity::parked(kind, owner, self.sentinel, None);
        entity.activate(id, owner, &self.defaults);
        self.index.insert(id, Location::Transient);
        info!("[Pool] Instantiated transient {} as {}", kind, id);
        self.transient.entry(id).or_insert(entity)
    }

    /// Deactivate and park a pooled entity, or destroy a transient one.
    pub fn release(&mut self, id: EntityId) -> Result<(), SyncError> {
        match self.index.remove(&id) {
            Some(Location::Pooled { kind, slot }) => {
                if let Some(entity) = self.instances.get_mut(&kind).and_then(|l| l.get_mut(slot)) {
                    entity.deactivate(self.sentinel);
                }
                info!("[Pool] Released {} ({})", id, audit_label(self.rank, kind, slot));
                Ok(())
            }
            Some(Location::Transient) => {
                self.transient.remove(&id);
                info!("[Pool] Destroyed transient {}", id);
                Ok(())
            }
            None => Err(SyncError::DesyncPossible(id)),
        }
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        match self.index.get(&id)? {
            Location::Pooled { kind, slot } => self.instances.get(kind)?.get(*slot),
            Location::Transient => self.transient.get(&id),
        }
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        match self.index.get(&id)? {
            Location::Pooled { kind, slot } => self.instances.get_mut(kind)?.get_mut(*slot),
            Location::Transient => self.transient.get_mut(&id),
        }
    }

    /// Inactive instances of `kind` still available.
    pub fn available(&self, kind: EntityKind) -> usize {
        self.instances
            .get(&kind)
            .map(|l| l.iter().filter(|e| !e.is_active()).count())
            .unwrap_or(0)
    }

    pub fn active_count(&self) -> usize {
        self.index.len()
    }

    pub fn active_ids(&self) -> Vec<EntityId> {
        self.index.keys().copied().collect()
    }

    pub fn iter_active_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.instances
            .values_mut()
            .flat_map(|list| list.iter_mut())
            .filter(|e| e.is_active())
            .chain(self.transient.values_mut())
    }
}

fn audit_label(rank: u32, kind: EntityKind, slot: usize) -> String {
    format!("p{}/{}#{}", rank, kind, slot)
}

impl OccupantAccess for EntityPool {
    fn kind_of(&self, id: EntityId) -> Option<EntityKind> {
        self.get(id).map(|e| e.kind)
    }

    fn is_moving(&self, id: EntityId) -> bool {
        self.get(id).is_some_and(|e| e.is_moving())
    }

    fn snap_to(&mut self, id: EntityId, position: Vec3) {
        if let Some(entity) = self.get_mut(id) {
            entity.snap_to(position);
        }
    }

    fn retarget(&mut self, id: EntityId, target: Vec3) {
        if let Some(motion) = self.get_mut(id).and_then(|e| e.motion.as_mut()) {
            motion.target = target;
        }
    }
}
