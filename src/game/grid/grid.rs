use log::debug;

use crate::config::GridConfig;
use crate::game::error::SyncError;
use crate::game::grid::slot::{Slot, SlotLayout};
use crate::game::types::{EntityId, EntityKind, SlotIndex, Vec3};

/// What the grid needs to know about (and do to) the entities it holds.
pub trait OccupantAccess {
    fn kind_of(&self, id: EntityId) -> Option<EntityKind>;
    fn is_moving(&self, id: EntityId) -> bool;
    fn snap_to(&mut self, id: EntityId, position: Vec3);
    fn retarget(&mut self, id: EntityId, target: Vec3);
}

/// One peer's board. Process-local: the copy of the other peer's board is
/// kept consistent by replaying that peer's announcements, never shared.
#[derive(Debug, Clone)]
pub struct OccupancyGrid {
    slots: Vec<Slot>,
    layout: SlotLayout,
}

impl OccupancyGrid {
    pub fn new(centers: Vec<Vec3>, layout: SlotLayout) -> Self {
        let slots = centers
            .into_iter()
            .enumerate()
            .map(|(index, center)| Slot::new(index, center))
            .collect();
        Self { slots, layout }
    }

    pub fn from_config(cfg: &GridConfig) -> Self {
        Self::new(
            cfg.slot_centers(),
            SlotLayout {
                offset_x: cfg.offset_x,
                offset_y: cfg.offset_y,
            },
        )
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slot(&self, index: SlotIndex) -> Option<&Slot> {
        self.slots.get(index)
    }

    pub fn layout(&self) -> SlotLayout {
        self.layout
    }

    /// Slot currently listing `id`.
    pub fn slot_of(&self, id: EntityId) -> Option<SlotIndex> {
        self.slots.iter().find(|s| s.contains(id)).map(|s| s.index)
    }

    pub fn offset_for(&self, center: Vec3, index: usize, count: usize) -> Vec3 {
        self.layout.offset_for(center, index, count)
    }

    /// Canonical position of `id` given the slot's current membership.
    pub fn target_for(&self, id: EntityId) -> Option<Vec3> {
        let slot = self.slots.iter().find(|s| s.contains(id))?;
        let index = slot.position_of(id)?;
        Some(self.offset_for(slot.center, index, slot.len()))
    }

    /// Append `id` to `slot` and lay every occupant out again.
    /// Already present is a no-op; a full slot is refused.
    pub fn place(&mut self, slot: SlotIndex, id: EntityId, occupants: &mut impl OccupantAccess) -> Result<(), SyncError> {
        let target = self.slots.get_mut(slot).ok_or(SyncError::UnknownSlot(slot))?;
        if target.contains(id) {
            return Ok(());
        }
        if target.is_full() {
            return Err(SyncError::invalid(format!("slot {} is full", slot)));
        }
        target.push(id);
        debug!("[Grid] Placed {} in slot {} ({} occupants)", id, slot, target.len());
        self.repack(slot, occupants);
        Ok(())
    }

    /// Drop `id` from `slot` and lay the remaining occupants out again.
    pub fn remove(&mut self, slot: SlotIndex, id: EntityId, occupants: &mut impl OccupantAccess) -> Result<(), SyncError> {
        let target = self.slots.get_mut(slot).ok_or(SyncError::UnknownSlot(slot))?;
        if !target.remove(id) {
            return Err(SyncError::NotFound { entity: id, slot });
        }
        debug!("[Grid] Removed {} from slot {} ({} left)", id, slot, target.len());
        self.repack(slot, occupants);
        Ok(())
    }

    /// Put every occupant of `slot` on its canonical offset. Occupants that
    /// are mid-move keep moving; only their target changes.
    pub fn repack(&mut self, slot: SlotIndex, occupants: &mut impl OccupantAccess) {
        let Some(s) = self.slots.get(slot) else {
            return;
        };
        let count = s.len();
        for (index, id) in s.occupants().iter().enumerate() {
            let position = self.layout.offset_for(s.center, index, count);
            if occupants.is_moving(*id) {
                occupants.retarget(*id, position);
            } else {
                occupants.snap_to(*id, position);
            }
        }
    }

    /// Exchange the whole membership of two slots. Membership only: the
    /// caller decides how the exchanged entities get to their new offsets.
    ///
    /// Returns `(moving, swapped)`: the former occupants of `source` and of
    /// `destination`, in their original order.
    pub fn swap(&mut self, source: SlotIndex, destination: SlotIndex) -> Result<(Vec<EntityId>, Vec<EntityId>), SyncError> {
        if source == destination {
            return Err(SyncError::invalid(format!("relocation from slot {} onto itself", source)));
        }
        if source >= self.slots.len() {
            return Err(SyncError::UnknownSlot(source));
        }
        if destination >= self.slots.len() {
            return Err(SyncError::UnknownSlot(destination));
        }

        // Both lists are emptied before either is refilled, so neither slot
        // ever holds more than its own former count.
        let moving = self.slots[source].take_all();
        let swapped = self.slots[destination].take_all();
        for id in &moving {
            self.slots[destination].push(*id);
        }
        for id in &swapped {
            self.slots[source].push(*id);
        }
        debug!(
            "[Grid] Swapped slot {} ({} occupants) with slot {} ({} occupants)",
            source,
            moving.len(),
            destination,
            swapped.len()
        );
        Ok((moving, swapped))
    }

    /// Where a new entity of `kind` should go: the lowest-index slot already
    /// stacking that kind with room left, otherwise the lowest-index empty slot.
    pub fn next_free_slot_for(&self, kind: EntityKind, occupants: &impl OccupantAccess) -> Option<SlotIndex> {
        let stacking = self.slots.iter().find(|s| {
            !s.is_empty()
                && !s.is_full()
                && s.occupants().iter().any(|id| occupants.kind_of(*id) == Some(kind))
        });
        stacking
            .or_else(|| self.slots.iter().find(|s| s.is_empty()))
            .map(|s| s.index)
    }
}
