//! Drag-to-relocate placement.
//!
//! A drag from one slot to another swaps the two slots' membership right
//! away, then walks every affected entity to its new offset. The slots are
//! repacked once, after the last of those entities has arrived. Arrivals are
//! posted to a channel and drained by the orchestrator on the simulation tick.

use std::collections::{HashMap, HashSet};

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::game::entities::pool::EntityPool;
use crate::game::error::SyncError;
use crate::game::grid::OccupancyGrid;
use crate::game::ownership::OwnershipResolver;
use crate::game::rpc::{Outbox, RpcMessage};
use crate::game::systems::movement::MovementController;
use crate::game::types::{EntityId, PeerId, ScreenPoint, SlotIndex};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GesturePhase {
    Idle,
    Selecting {
        source: SlotIndex,
        origin: ScreenPoint,
    },
    Dragging {
        source: SlotIndex,
        origin: ScreenPoint,
        target: Option<SlotIndex>,
    },
}

/// Pointer input, already hit-tested against the slots.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "data")]
pub enum GestureEvent {
    PointerDown { slot: Option<SlotIndex>, at: ScreenPoint },
    PointerMove { at: ScreenPoint, hovered: Option<SlotIndex> },
    PointerUp,
    Cancel,
}

/// Posted by the movement pass when an entity arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveCompleted {
    pub entity: EntityId,
}

/// A relocation waiting for its entities to arrive.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendezvous {
    pub id: u64,
    pub owner: PeerId,
    pub source: SlotIndex,
    pub destination: SlotIndex,
    pending: HashSet<EntityId>,
}

impl Rendezvous {
    pub fn new(id: u64, owner: PeerId, source: SlotIndex, destination: SlotIndex, members: impl IntoIterator<Item = EntityId>) -> Self {
        Self {
            id,
            owner,
            source,
            destination,
            pending: members.into_iter().collect(),
        }
    }

    /// Mark `entity` as arrived. True exactly once: when the last member arrives.
    pub fn arrive(&mut self, entity: EntityId) -> bool {
        self.pending.remove(&entity) && self.pending.is_empty()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

/// Everything a relocation touches, borrowed from the battlefield for one call.
pub struct PlacementContext<'a> {
    pub boards: &'a mut HashMap<PeerId, OccupancyGrid>,
    pub entities: &'a mut EntityPool,
    pub movement: &'a MovementController,
    pub resolver: &'a OwnershipResolver,
    pub outbox: &'a mut Outbox,
}

pub struct PlacementOrchestrator {
    phase: GesturePhase,
    threshold: f32,
    next_request: u64,
    requests: HashMap<u64, Rendezvous>,
    enrolled: HashMap<EntityId, u64>,
    completions_tx: Sender<MoveCompleted>,
    completions_rx: Receiver<MoveCompleted>,
}

impl PlacementOrchestrator {
    pub fn new(drag_threshold_px: f32) -> Self {
        let (completions_tx, completions_rx) = unbounded();
        Self {
            phase: GesturePhase::Idle,
            threshold: drag_threshold_px,
            next_request: 0,
            requests: HashMap::new(),
            enrolled: HashMap::new(),
            completions_tx,
            completions_rx,
        }
    }

    pub fn phase(&self) -> GesturePhase {
        self.phase
    }

    pub fn completion_sender(&self) -> Sender<MoveCompleted> {
        self.completions_tx.clone()
    }

    pub fn pending_requests(&self) -> usize {
        self.requests.len()
    }

    pub fn is_enrolled(&self, entity: EntityId) -> bool {
        self.enrolled.contains_key(&entity)
    }

    /// Feed one pointer event. Returns `(source, destination)` when a drag
    /// resolves onto a different slot; nothing has been mutated yet.
    pub fn handle_gesture(&mut self, event: GestureEvent, grid: &OccupancyGrid) -> Option<(SlotIndex, SlotIndex)> {
        match (self.phase, event) {
            (_, GestureEvent::Cancel) => {
                if self.phase != GesturePhase::Idle {
                    debug!("[Placement] Gesture cancelled");
                }
                self.phase = GesturePhase::Idle;
                None
            }
            (GesturePhase::Idle, GestureEvent::PointerDown { slot: Some(source), at }) => {
                if grid.slot(source).is_some_and(|s| !s.is_empty()) {
                    self.phase = GesturePhase::Selecting { source, origin: at };
                }
                None
            }
            (GesturePhase::Selecting { source, origin }, GestureEvent::PointerMove { at, hovered }) => {
                if origin.distance(at) > self.threshold {
                    self.phase = GesturePhase::Dragging { source, origin, target: hovered };
                }
                None
            }
            (GesturePhase::Dragging { source, origin, target }, GestureEvent::PointerMove { hovered, .. }) => {
                // Leaving every slot keeps the last hovered one.
                self.phase = GesturePhase::Dragging {
                    source,
                    origin,
                    target: hovered.or(target),
                };
                None
            }
            (GesturePhase::Dragging { source, target, .. }, GestureEvent::PointerUp) => {
                self.phase = GesturePhase::Idle;
                match target {
                    Some(destination) if destination != source => Some((source, destination)),
                    _ => {
                        debug!("[Placement] Drag from slot {} resolved without a destination", source);
                        None
                    }
                }
            }
            (_, GestureEvent::PointerUp) => {
                self.phase = GesturePhase::Idle;
                None
            }
            _ => None,
        }
    }

    /// Swap `source` and `destination` on `owner`'s board and start every
    /// affected entity toward its new offset. Returns the rendezvous id, or
    /// `None` when nothing had to move.
    pub fn relocate(&mut self, owner: PeerId, source: SlotIndex, destination: SlotIndex, ctx: PlacementContext<'_>) -> Result<Option<u64>, SyncError> {
        let PlacementContext { boards, entities, movement, resolver, outbox } = ctx;
        let grid = boards
            .get_mut(&owner)
            .ok_or_else(|| SyncError::invalid(format!("no board for {}", owner)))?;

        let (moving, swapped) = grid.swap(source, destination)?;
        if resolver.is_authoritative_owner(owner) {
            outbox.push(RpcMessage::Relocate { source, destination });
        }

        let members: Vec<EntityId> = moving.iter().chain(swapped.iter()).copied().collect();
        if members.is_empty() {
            return Ok(None);
        }

        // Entities still walking for an older relocation leave it; it may
        // be the last thing that request was waiting for. Those requests
        // settle only once the new members are walking, so their repack
        // retargets instead of snapping.
        let mut superseded = Vec::new();
        for id in &members {
            if let Some(old) = self.enrolled.remove(id) {
                let done = self.requests.get_mut(&old).is_some_and(|r| r.arrive(*id));
                if done {
                    if let Some(request) = self.requests.remove(&old) {
                        superseded.push(request);
                    }
                }
            }
        }

        let id = self.next_request;
        self.next_request += 1;
        let mut request = Rendezvous::new(id, owner, source, destination, members.iter().copied());

        for member in &members {
            let target = grid.target_for(*member);
            match (target, entities.get_mut(*member)) {
                (Some(target), Some(entity)) => {
                    movement.begin_move(entity, target, resolver, outbox);
                    self.enrolled.insert(*member, id);
                }
                _ => {
                    warn!("[Placement] {} listed in slot but not registered, desync possible", member);
                    request.arrive(*member);
                }
            }
        }

        info!(
            "[Placement] Relocation #{} slot {} -> {} ({} moving, {} swapped)",
            id,
            source,
            destination,
            moving.len(),
            swapped.len()
        );
        for old in &superseded {
            Self::finalize(old, grid, entities);
        }
        if request.pending() == 0 {
            Self::finalize(&request, grid, entities);
        } else {
            self.requests.insert(id, request);
        }
        Ok(Some(id))
    }

    /// Drop `entity` from whatever it is walking for (despawn mid-move).
    pub fn forget(&mut self, entity: EntityId) {
        if self.enrolled.contains_key(&entity) {
            let _ = self.completions_tx.send(MoveCompleted { entity });
        }
    }

    /// Consume posted arrivals. Each finished relocation repacks both of its
    /// slots once; the finished rendezvous are returned in completion order.
    pub fn drain(&mut self, boards: &mut HashMap<PeerId, OccupancyGrid>, entities: &mut EntityPool) -> Vec<Rendezvous> {
        let mut finished = Vec::new();
        while let Ok(MoveCompleted { entity }) = self.completions_rx.try_recv() {
            let Some(request_id) = self.enrolled.remove(&entity) else {
                continue;
            };
            let done = self.requests.get_mut(&request_id).is_some_and(|r| r.arrive(entity));
            if !done {
                continue;
            }
            let Some(request) = self.requests.remove(&request_id) else {
                continue;
            };
            match boards.get_mut(&request.owner) {
                Some(grid) => Self::finalize(&request, grid, entities),
                None => warn!("[Placement] Board of {} vanished before relocation #{} finished", request.owner, request.id),
            }
            finished.push(request);
        }
        finished
    }

    fn finalize(request: &Rendezvous, grid: &mut OccupancyGrid, entities: &mut EntityPool) {
        grid.repack(request.source, entities);
        grid.repack(request.destination, entities);
        debug!("[Placement] Relocation #{} settled, slots {} and {} repacked", request.id, request.source, request.destination);
    }
}
