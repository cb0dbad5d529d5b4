//! Entity record.
//!
//! The minimal state of a placeable/movable unit. Authority is not stored
//! here; it is derived from `owner` by the ownership resolver.

use serde::{Deserialize, Serialize};

use crate::game::animation::{AnimationCatalog, AnimationSlot};
use crate::game::systems::patrol::PatrolRoute;
use crate::game::types::{AnimationState, EntityId, EntityKind, PeerId, PlacedPosition, Vec3};

/// An in-flight move toward `target` (authoritative coordinates).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Motion {
    pub target: Vec3,
}

/// Per-kind starting stats handed out on activation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KindDefaults {
    pub character_speed: f32,
    pub monster_speed: f32,
    pub character_hp: f32,
    pub monster_hp: f32,
}

impl KindDefaults {
    pub fn speed(&self, kind: EntityKind) -> f32 {
        if kind.is_monster() { self.monster_speed } else { self.character_speed }
    }

    pub fn hp(&self, kind: EntityKind) -> f32 {
        if kind.is_monster() { self.monster_hp } else { self.character_hp }
    }
}

impl From<&crate::config::MovementConfig> for KindDefaults {
    fn from(cfg: &crate::config::MovementConfig) -> Self {
        Self {
            character_speed: cfg.character_speed,
            monster_speed: cfg.monster_speed,
            character_hp: cfg.character_hp,
            monster_hp: cfg.monster_hp,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub owner: PeerId,
    pub position: PlacedPosition,
    pub motion: Option<Motion>,
    pub animation: AnimationSlot,
    pub speed: f32,
    pub hp: f32,
    pub route: Option<PatrolRoute>,
    active: bool,
    pool_slot: Option<usize>,
}

impl Entity {
    /// A parked, inactive instance. `pool_slot` is `None` for entities that
    /// were instantiated outside the pool and get destroyed on release.
    pub(crate) fn parked(kind: EntityKind, owner: PeerId, at: Vec3, pool_slot: Option<usize>) -> Self {
        Self {
            id: EntityId::new(),
            kind,
            owner,
            position: PlacedPosition::unmirrored(at),
            motion: None,
            animation: AnimationSlot::default(),
            speed: 0.0,
            hp: 0.0,
            route: None,
            active: false,
            pool_slot,
        }
    }

    pub(crate) fn activate(&mut self, id: EntityId, owner: PeerId, defaults: &KindDefaults) {
        self.id = id;
        self.owner = owner;
        self.speed = defaults.speed(self.kind);
        self.hp = defaults.hp(self.kind);
        self.motion = None;
        self.route = None;
        self.animation = AnimationSlot::default();
        self.active = true;
    }

    pub(crate) fn deactivate(&mut self, sentinel: Vec3) {
        self.active = false;
        self.motion = None;
        self.route = None;
        self.position = PlacedPosition::unmirrored(sentinel);
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_moving(&self) -> bool {
        self.motion.is_some()
    }

    pub fn target(&self) -> Option<Vec3> {
        self.motion.map(|m| m.target)
    }

    pub fn pool_slot(&self) -> Option<usize> {
        self.pool_slot
    }

    /// Snap the authoritative position. Display is refreshed by the caller.
    pub fn snap_to(&mut self, position: Vec3) {
        self.position.original = position;
    }

    /// Show `state`/`index`. Returns false when that clip is already playing.
    pub fn play(&mut self, state: AnimationState, index: usize, catalog: &dyn AnimationCatalog) -> bool {
        if self.animation.state == state && self.animation.index == index && self.animation.clip.is_some() {
            return false;
        }
        self.animation = AnimationSlot {
            state,
            index,
            clip: catalog.get_clip(self.kind, state, index),
        };
        true
    }
}

/// Read-only snapshot handed out of the core (queries, actor replies).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityView {
    pub id: EntityId,
    pub kind: EntityKind,
    pub owner: PeerId,
    pub authoritative: bool,
    pub position: PlacedPosition,
    pub is_moving: bool,
    pub animation: AnimationSlot,
    pub hp: f32,
}
