use serde::{Deserialize, Serialize};

use crate::config::grid::SLOT_CAPACITY;
use crate::game::types::{EntityId, SlotIndex, Vec3};

/// How far occupants are spread around a slot center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlotLayout {
    pub offset_x: f32,
    pub offset_y: f32,
}

impl SlotLayout {
    /// Position of occupant `index` in a slot holding `count` occupants.
    ///
    /// 1 → centered; 2 → left/right; 3 → two at the bottom, one on top.
    pub fn offset_for(&self, center: Vec3, index: usize, count: usize) -> Vec3 {
        let (x, y) = (self.offset_x, self.offset_y);
        match (count, index) {
            (2, 0) => Vec3::new(center.x - x, center.y, center.z),
            (2, _) => Vec3::new(center.x + x, center.y, center.z),
            (3, 0) => Vec3::new(center.x - x, center.y - y, center.z),
            (3, 1) => Vec3::new(center.x + x, center.y - y, center.z),
            (3, _) => Vec3::new(center.x, center.y + y, center.z),
            _ => center,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub index: SlotIndex,
    pub center: Vec3,
    occupants: Vec<EntityId>,
}

impl Slot {
    pub fn new(index: SlotIndex, center: Vec3) -> Self {
        Self {
            index,
            center,
            occupants: Vec::with_capacity(SLOT_CAPACITY),
        }
    }

    pub fn occupants(&self) -> &[EntityId] {
        &self.occupants
    }

    pub fn len(&self) -> usize {
        self.occupants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occupants.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.occupants.len() >= SLOT_CAPACITY
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.occupants.contains(&id)
    }

    pub fn position_of(&self, id: EntityId) -> Option<usize> {
        self.occupants.iter().position(|o| *o == id)
    }

    pub(crate) fn push(&mut self, id: EntityId) {
        self.occupants.push(id);
    }

    pub(crate) fn remove(&mut self, id: EntityId) -> bool {
        match self.position_of(id) {
            Some(i) => {
                self.occupants.remove(i);
                true
            }
            None => false,
        }
    }

    pub(crate) fn take_all(&mut self) -> Vec<EntityId> {
        std::mem::take(&mut self.occupants)
    }
}
