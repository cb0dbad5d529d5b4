//! Animation clip lookup.
//!
//! Clip tables are owned by the asset side; the core only asks how many clips
//! a kind has for a state and which handle sits at an index.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::game::types::{AnimationState, EntityKind};

/// Opaque clip reference handed back by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClipHandle(pub String);

pub trait AnimationCatalog {
    fn clip_count(&self, kind: EntityKind, state: AnimationState) -> usize;

    fn get_clip(&self, kind: EntityKind, state: AnimationState, index: usize) -> Option<ClipHandle>;
}

/// Same clip counts for every kind; handles are `"{kind}/{state}/{index}"`.
#[derive(Debug, Clone, Default)]
pub struct UniformCatalog {
    counts: HashMap<AnimationState, usize>,
}

impl UniformCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Eight move directions, two idle variants, one clip for everything else.
    pub fn standard() -> Self {
        Self::new()
            .with(AnimationState::Idle, 2)
            .with(AnimationState::Move, 8)
            .with(AnimationState::Attack, 1)
            .with(AnimationState::Damaged, 1)
            .with(AnimationState::Debuff, 1)
            .with(AnimationState::Death, 1)
            .with(AnimationState::Other, 1)
    }

    pub fn with(mut self, state: AnimationState, count: usize) -> Self {
        self.counts.insert(state, count);
        self
    }
}

impl AnimationCatalog for UniformCatalog {
    fn clip_count(&self, _kind: EntityKind, state: AnimationState) -> usize {
        self.counts.get(&state).copied().unwrap_or(0)
    }

    fn get_clip(&self, kind: EntityKind, state: AnimationState, index: usize) -> Option<ClipHandle> {
        (index < self.clip_count(kind, state))
            .then(|| ClipHandle(format!("{}/{:?}/{}", kind, state, index)))
    }
}

/// What an entity currently shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationSlot {
    pub state: AnimationState,
    pub index: usize,
    pub clip: Option<ClipHandle>,
}

impl Default for AnimationSlot {
    fn default() -> Self {
        Self {
            state: AnimationState::Idle,
            index: 0,
            clip: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::types::MonsterName;

    #[test]
    fn out_of_range_index_has_no_clip() {
        let catalog = UniformCatalog::new().with(AnimationState::Move, 4);
        let kind = EntityKind::Monster(MonsterName::Bird1);
        assert!(catalog.get_clip(kind, AnimationState::Move, 3).is_some());
        assert!(catalog.get_clip(kind, AnimationState::Move, 4).is_none());
        assert!(catalog.get_clip(kind, AnimationState::Idle, 0).is_none());
    }
}
