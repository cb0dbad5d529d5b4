//! The battlefield: one peer's view of the shared duel.
//!
//! Owns every service of the sync core and is the only place they meet.
//! Local operations mutate state and queue announcements in the outbox;
//! `apply_remote` replays the other peer's announcements through the same
//! pipeline. Nothing here is shared between threads or peers.

use std::collections::HashMap;
use std::sync::Arc;

use crossbeam_channel::Sender;
use log::{debug, info, warn};

use crate::config::{EngineConfig, GridConfig};
use crate::game::animation::AnimationCatalog;
use crate::game::entities::entity::{EntityView, KindDefaults};
use crate::game::entities::pool::EntityPool;
use crate::game::error::SyncError;
use crate::game::grid::OccupancyGrid;
use crate::game::ownership::{OwnershipResolver, PeerRoster};
use crate::game::presentation::PresentationSink;
use crate::game::rpc::{Outbox, RpcEnvelope, RpcMessage, SequenceTracker};
use crate::game::systems::movement::MovementController;
use crate::game::systems::patrol::PatrolRoute;
use crate::game::systems::placement::{GestureEvent, MoveCompleted, PlacementContext, PlacementOrchestrator, Rendezvous};
use crate::game::types::{EntityId, EntityKind, PeerId, PlacedPosition, SlotIndex, Vec3};

pub struct Battlefield {
    config: EngineConfig,
    resolver: OwnershipResolver,
    movement: MovementController,
    boards: HashMap<PeerId, OccupancyGrid>,
    entities: EntityPool,
    placement: PlacementOrchestrator,
    completions: Sender<MoveCompleted>,
    outbox: Outbox,
    inbound: SequenceTracker,
    sink: Box<dyn PresentationSink + Send>,
}

impl Battlefield {
    pub fn new(
        config: EngineConfig,
        roster: Box<dyn PeerRoster + Send>,
        catalog: Arc<dyn AnimationCatalog + Send + Sync>,
        sink: Box<dyn PresentationSink + Send>,
    ) -> Self {
        let resolver = OwnershipResolver::new(roster, config.mirror.clone());
        let movement = MovementController::new(config.movement.reached_distance, catalog);

        let mut entities = EntityPool::new(config.pool.sentinel, KindDefaults::from(&config.movement));
        entities.set_rank(resolver.local_rank().unwrap_or(0));
        for kind in EntityKind::all() {
            entities.warm_up(kind, config.pool.size_per_kind);
        }

        let mut boards = HashMap::new();
        boards.insert(resolver.local_peer(), OccupancyGrid::from_config(&config.grid));

        let placement = PlacementOrchestrator::new(config.movement.drag_threshold_px);
        let completions = placement.completion_sender();

        info!(
            "[Battlefield] Ready for {} ({} slots, {} per kind pooled)",
            resolver.local_peer(),
            config.grid.slot_count(),
            config.pool.size_per_kind
        );

        Self {
            config,
            resolver,
            movement,
            boards,
            entities,
            placement,
            completions,
            outbox: Outbox::default(),
            inbound: SequenceTracker::default(),
            sink,
        }
    }

    pub fn local_peer(&self) -> PeerId {
        self.resolver.local_peer()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Swap in a roster once the session's peers are known.
    pub fn set_roster(&mut self, roster: Box<dyn PeerRoster + Send>) {
        self.resolver.set_roster(roster);
        self.entities.set_rank(self.resolver.local_rank().unwrap_or(0));
        self.refresh_display();
    }

    /// Spawn a character of `kind` for the local peer in the next free slot.
    ///
    /// Announces `SpawnAt`, `PlaceInSlot` and `SetPosition` in that order.
    /// Without a free slot the pooled instance goes straight back.
    pub fn spawn_character(&mut self, kind: EntityKind) -> Option<EntityId> {
        if kind.is_monster() {
            warn!("[Battlefield] {} is a monster, use spawn_monster", kind);
            return None;
        }
        let local = self.local_peer();
        let id = EntityId::new();
        if self.entities.acquire(kind, id, local).is_none() {
            warn!("[Battlefield] Spawn refused: {}", SyncError::PoolExhausted(kind));
            return None;
        }

        let board = board_of(&mut self.boards, &self.config.grid, local);
        let Some(slot) = board.next_free_slot_for(kind, &self.entities) else {
            warn!("[Battlefield] No free slot for {}, rolling back {}", kind, id);
            self.roll_back(id);
            return None;
        };
        let Some(position) = board.slot(slot).map(|s| board.offset_for(s.center, s.len(), s.len() + 1)) else {
            self.roll_back(id);
            return None;
        };
        if let Some(entity) = self.entities.get_mut(id) {
            entity.snap_to(position);
        }

        self.outbox.push(RpcMessage::SpawnAt { entity_id: id, kind, owner: local, position });
        if let Err(e) = board.place(slot, id, &mut self.entities) {
            warn!("[Battlefield] Placing {} in slot {} failed: {}", id, slot, e);
            self.outbox.push(RpcMessage::Despawn { entity_id: id });
            self.roll_back(id);
            return None;
        }
        self.outbox.push(RpcMessage::PlaceInSlot { entity_id: id, slot });
        self.outbox.push(RpcMessage::SetPosition { entity_id: id, position });

        info!("[Battlefield] Spawned {} {} in slot {}", kind, id, slot);
        self.refresh_display();
        Some(id)
    }

    fn roll_back(&mut self, id: EntityId) {
        if let Err(e) = self.entities.release(id) {
            warn!("[Battlefield] Rolling back {} failed: {}", id, e);
        }
    }

    /// Spawn a local monster at the first point of `route` and walk it in a loop.
    pub fn spawn_monster(&mut self, kind: EntityKind, route: Vec<Vec3>) -> Option<EntityId> {
        if !kind.is_monster() {
            warn!("[Battlefield] {} is not a monster", kind);
            return None;
        }
        let Some(route) = PatrolRoute::new(route) else {
            warn!("[Battlefield] Monster route is empty");
            return None;
        };
        let local = self.local_peer();
        let id = EntityId::new();
        let Some(entity) = self.entities.acquire(kind, id, local) else {
            warn!("[Battlefield] Spawn refused: {}", SyncError::PoolExhausted(kind));
            return None;
        };

        let start = route.start();
        let points = route.points().to_vec();
        entity.snap_to(start);
        entity.route = Some(route);

        self.outbox.push(RpcMessage::SpawnAt { entity_id: id, kind, owner: local, position: start });
        self.outbox.push(RpcMessage::SetRoute { entity_id: id, points });
        info!("[Battlefield] Spawned monster {} {} at {}", kind, id, start);
        self.refresh_display();
        Some(id)
    }

    /// Remove a locally owned entity everywhere.
    pub fn despawn(&mut self, id: EntityId) -> Result<(), SyncError> {
        let entity = self.entities.get(id).ok_or(SyncError::DesyncPossible(id))?;
        if !self.resolver.is_authoritative(entity) {
            return Err(SyncError::invalid(format!("{} is owned by {}", id, entity.owner)));
        }
        let owner = entity.owner;
        if let Some(slot) = self.unplace(owner, id) {
            self.outbox.push(RpcMessage::RemoveFromSlot { entity_id: id, slot });
        }
        self.outbox.push(RpcMessage::Despawn { entity_id: id });
        self.placement.forget(id);
        self.entities.release(id)
    }

    /// Damage `id`. The owner applies it and answers with the new HP; any
    /// other peer forwards the request to the owner and gets `None`.
    pub fn damage(&mut self, id: EntityId, amount: f32) -> Result<Option<f32>, SyncError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(SyncError::invalid(format!("damage amount {}", amount)));
        }
        let entity = self.entities.get(id).ok_or(SyncError::DesyncPossible(id))?;
        if !self.resolver.is_authoritative(entity) {
            debug!("[Battlefield] Forwarding {} damage on {} to {}", amount, id, entity.owner);
            self.outbox.push(RpcMessage::Damage { entity_id: id, amount });
            return Ok(None);
        }
        self.apply_damage(id, amount).map(Some)
    }

    fn apply_damage(&mut self, id: EntityId, amount: f32) -> Result<f32, SyncError> {
        let entity = self.entities.get_mut(id).ok_or(SyncError::DesyncPossible(id))?;
        entity.hp = (entity.hp - amount).max(0.0);
        let (hp, kind) = (entity.hp, entity.kind);

        self.outbox.push(RpcMessage::HpChanged { entity_id: id, hp });
        self.sink.show_hp(id, kind, hp);
        if hp <= 0.0 {
            info!("[Battlefield] {} {} died", kind, id);
            self.despawn(id)?;
        }
        Ok(hp)
    }

    /// Feed a local pointer event; starts a relocation when a drag resolves.
    pub fn handle_gesture(&mut self, event: GestureEvent) -> Option<u64> {
        let local = self.local_peer();
        let board = board_of(&mut self.boards, &self.config.grid, local);
        let (source, destination) = self.placement.handle_gesture(event, board)?;
        self.relocate(source, destination)
    }

    /// Relocate on the local board; invalid requests are logged and ignored.
    pub fn relocate(&mut self, source: SlotIndex, destination: SlotIndex) -> Option<u64> {
        let local = self.local_peer();
        match self.relocate_on(local, source, destination) {
            Ok(request) => request,
            Err(e) => {
                warn!("[Battlefield] Relocation {} -> {} ignored: {}", source, destination, e);
                None
            }
        }
    }

    fn relocate_on(&mut self, owner: PeerId, source: SlotIndex, destination: SlotIndex) -> Result<Option<u64>, SyncError> {
        board_of(&mut self.boards, &self.config.grid, owner);
        let ctx = PlacementContext {
            boards: &mut self.boards,
            entities: &mut self.entities,
            movement: &self.movement,
            resolver: &self.resolver,
            outbox: &mut self.outbox,
        };
        self.placement.relocate(owner, source, destination, ctx)
    }

    /// One fixed simulation step. Returns the relocations that settled.
    pub fn tick(&mut self, dt: f32) -> Vec<Rendezvous> {
        let reached = self.config.movement.reached_distance;
        for entity in self.entities.iter_active_mut() {
            if let Some(route) = entity.route.as_mut() {
                entity.position.original = route.step(entity.position.original, entity.speed, dt, reached);
                continue;
            }
            if let Some(id) = self.movement.advance(entity, dt, &self.resolver, &mut self.outbox) {
                let _ = self.completions.send(MoveCompleted { entity: id });
            }
        }

        let settled = self.placement.drain(&mut self.boards, &mut self.entities);
        self.refresh_display();
        settled
    }

    /// Recompute every display position from its authoritative one.
    fn refresh_display(&mut self) {
        for entity in self.entities.iter_active_mut() {
            entity.position = self.resolver.to_display_position(entity);
        }
    }

    /// Replay one announcement from the other peer.
    pub fn apply_remote(&mut self, envelope: RpcEnvelope) -> Result<(), SyncError> {
        let sender = envelope.sender;
        if sender == self.local_peer() {
            debug!("[Battlefield] Ignoring own echo #{}", envelope.seq);
            return Ok(());
        }
        self.inbound.observe(&envelope);
        let result = self.apply_message(sender, envelope.message);
        self.refresh_display();
        result
    }

    fn apply_message(&mut self, sender: PeerId, message: RpcMessage) -> Result<(), SyncError> {
        match message {
            RpcMessage::SpawnAt { entity_id, kind, owner, position } => {
                if self.entities.contains(entity_id) {
                    return Err(SyncError::invalid(format!("{} spawned twice", entity_id)));
                }
                if self.entities.acquire(kind, entity_id, owner).is_none() {
                    warn!("[Battlefield] {}, instantiating {} outside the pool", SyncError::PoolExhausted(kind), entity_id);
                    self.entities.instantiate(kind, entity_id, owner);
                }
                let display = self.resolver.display_for(owner, position);
                let entity = self.entities.get_mut(entity_id).ok_or(SyncError::DesyncPossible(entity_id))?;
                entity.position = PlacedPosition { original: position, display };
                debug!("[Battlefield] Remote spawn {} {} for {}", kind, entity_id, owner);
            }
            RpcMessage::PlaceInSlot { entity_id, slot } => {
                let owner = self.owner_of(entity_id)?;
                board_of(&mut self.boards, &self.config.grid, owner).place(slot, entity_id, &mut self.entities)?;
            }
            RpcMessage::RemoveFromSlot { entity_id, slot } => {
                let owner = self.owner_of(entity_id)?;
                board_of(&mut self.boards, &self.config.grid, owner).remove(slot, entity_id, &mut self.entities)?;
            }
            RpcMessage::Relocate { source, destination } => {
                self.relocate_on(sender, source, destination)?;
            }
            RpcMessage::MoveTo { entity_id, target } => {
                let entity = self.entities.get_mut(entity_id).ok_or(SyncError::DesyncPossible(entity_id))?;
                if entity.target() != Some(target) {
                    self.movement.begin_move(entity, target, &self.resolver, &mut self.outbox);
                }
            }
            RpcMessage::SetAnimation { entity_id, state, index } => {
                let entity = self.entities.get_mut(entity_id).ok_or(SyncError::DesyncPossible(entity_id))?;
                entity.play(state, index, self.movement.catalog());
            }
            RpcMessage::SetPosition { entity_id, position } => {
                let entity = self.entities.get_mut(entity_id).ok_or(SyncError::DesyncPossible(entity_id))?;
                entity.snap_to(position);
            }
            RpcMessage::SetRoute { entity_id, points } => {
                let entity = self.entities.get_mut(entity_id).ok_or(SyncError::DesyncPossible(entity_id))?;
                entity.route = PatrolRoute::new(points);
            }
            RpcMessage::Despawn { entity_id } => {
                let owner = self.owner_of(entity_id)?;
                self.unplace(owner, entity_id);
                self.placement.forget(entity_id);
                self.entities.release(entity_id)?;
            }
            RpcMessage::Damage { entity_id, amount } => {
                let entity = self.entities.get(entity_id).ok_or(SyncError::DesyncPossible(entity_id))?;
                if !self.resolver.is_authoritative(entity) {
                    return Err(SyncError::invalid(format!("damage for {} sent to a non-owner", entity_id)));
                }
                self.apply_damage(entity_id, amount)?;
            }
            RpcMessage::HpChanged { entity_id, hp } => {
                let entity = self.entities.get_mut(entity_id).ok_or(SyncError::DesyncPossible(entity_id))?;
                entity.hp = hp;
                let kind = entity.kind;
                self.sink.show_hp(entity_id, kind, hp);
            }
        }
        Ok(())
    }

    fn owner_of(&self, id: EntityId) -> Result<PeerId, SyncError> {
        self.entities.get(id).map(|e| e.owner).ok_or(SyncError::DesyncPossible(id))
    }

    /// Take `id` off its owner's board, returning the slot it was in.
    fn unplace(&mut self, owner: PeerId, id: EntityId) -> Option<SlotIndex> {
        let board = self.boards.get_mut(&owner)?;
        let slot = board.slot_of(id)?;
        board.remove(slot, id, &mut self.entities).ok()?;
        Some(slot)
    }

    /// Announcements queued since the last drain, numbered for the wire.
    pub fn drain_outbox(&mut self) -> Vec<RpcEnvelope> {
        let local = self.local_peer();
        self.outbox.drain(local)
    }

    pub fn view(&self, id: EntityId) -> Option<EntityView> {
        let entity = self.entities.get(id)?;
        Some(EntityView {
            id: entity.id,
            kind: entity.kind,
            owner: entity.owner,
            authoritative: self.resolver.is_authoritative(entity),
            position: entity.position,
            is_moving: entity.is_moving(),
            animation: entity.animation.clone(),
            hp: entity.hp,
        })
    }

    pub fn board(&self, owner: PeerId) -> Option<&OccupancyGrid> {
        self.boards.get(&owner)
    }

    pub fn slot_occupants(&self, owner: PeerId, slot: SlotIndex) -> Option<Vec<EntityId>> {
        self.boards.get(&owner)?.slot(slot).map(|s| s.occupants().to_vec())
    }

    pub fn active_count(&self) -> usize {
        self.entities.active_count()
    }

    pub fn available(&self, kind: EntityKind) -> usize {
        self.entities.available(kind)
    }

    pub fn pending_relocations(&self) -> usize {
        self.placement.pending_requests()
    }
}

fn board_of<'a>(boards: &'a mut HashMap<PeerId, OccupancyGrid>, cfg: &GridConfig, owner: PeerId) -> &'a mut OccupancyGrid {
    boards.entry(owner).or_insert_with(|| OccupancyGrid::from_config(cfg))
}
