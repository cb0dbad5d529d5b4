//! Movement system.
//!
//! Moves entities toward their target in authoritative coordinates. Both
//! peers run the same interpolation from the same `MoveTo`, so only the
//! start of a move and the final idle pose go over the wire.

use std::sync::Arc;

use log::debug;
use rand::Rng;

use crate::game::animation::AnimationCatalog;
use crate::game::entities::entity::{Entity, Motion};
use crate::game::ownership::OwnershipResolver;
use crate::game::rpc::{Outbox, RpcMessage};
use crate::game::types::{AnimationState, EntityId, Vec3};

pub struct MovementController {
    reached_distance: f32,
    catalog: Arc<dyn AnimationCatalog + Send + Sync>,
}

impl MovementController {
    pub fn new(reached_distance: f32, catalog: Arc<dyn AnimationCatalog + Send + Sync>) -> Self {
        Self { reached_distance, catalog }
    }

    pub fn catalog(&self) -> &dyn AnimationCatalog {
        self.catalog.as_ref()
    }

    /// Start moving `entity` toward `target` (z is kept from the current position).
    /// Only the authoritative copy announces the move.
    pub fn begin_move(&self, entity: &mut Entity, target: Vec3, resolver: &OwnershipResolver, outbox: &mut Outbox) {
        let from = entity.position.original;
        let target = Vec3::new(target.x, target.y, from.z);
        entity.motion = Some(Motion { target });

        let clips = self.catalog.clip_count(entity.kind, AnimationState::Move);
        let index = direction_index(target - from, clips);
        entity.play(AnimationState::Move, index, self.catalog.as_ref());

        if resolver.is_authoritative(entity) {
            outbox.push(RpcMessage::MoveTo { entity_id: entity.id, target });
        }
        debug!("[Movement] {} moving {} -> {}", entity.id, from, target);
    }

    pub fn is_reached(&self, entity: &Entity) -> bool {
        entity
            .target()
            .is_some_and(|t| entity.position.original.distance(t) <= self.reached_distance)
    }

    /// Step `entity` by `dt` seconds. Returns the id once, on the tick the
    /// entity arrives; idle entities return `None`.
    pub fn advance(&self, entity: &mut Entity, dt: f32, resolver: &OwnershipResolver, outbox: &mut Outbox) -> Option<EntityId> {
        let target = entity.target()?;

        if !self.is_reached(entity) {
            let from = entity.position.original;
            let remaining = from.distance(target);
            let fraction = (entity.speed * dt / remaining).min(1.0);
            entity.position.original = from.lerp(target, fraction);
            self.refresh_direction(entity, target);
        }

        if self.is_reached(entity) {
            self.finish(entity, target, resolver, outbox);
            return Some(entity.id);
        }
        None
    }

    fn refresh_direction(&self, entity: &mut Entity, target: Vec3) {
        if entity.animation.state != AnimationState::Move {
            return;
        }
        let clips = self.catalog.clip_count(entity.kind, AnimationState::Move);
        let index = direction_index(target - entity.position.original, clips);
        if index != entity.animation.index {
            entity.play(AnimationState::Move, index, self.catalog.as_ref());
        }
    }

    fn finish(&self, entity: &mut Entity, target: Vec3, resolver: &OwnershipResolver, outbox: &mut Outbox) {
        entity.motion = None;
        entity.snap_to(target);
        debug!("[Movement] {} reached {}", entity.id, target);

        // The remote copy waits for the announced idle pose.
        if !resolver.is_authoritative(entity) {
            return;
        }
        let clips = self.catalog.clip_count(entity.kind, AnimationState::Idle);
        let index = if clips > 1 { rand::rng().random_range(0..clips) } else { 0 };
        entity.play(AnimationState::Idle, index, self.catalog.as_ref());
        outbox.push(RpcMessage::SetAnimation {
            entity_id: entity.id,
            state: AnimationState::Idle,
            index,
        });
    }
}

/// Move-clip index for a heading. 8 clips: 45° sectors counter-clockwise from
/// right. 4 clips: dominant axis, right=0 up=1 left=2 down=3. Otherwise 0.
pub fn direction_index(direction: Vec3, clip_count: usize) -> usize {
    let dir = direction.normalized();
    if clip_count >= 8 {
        let mut angle = dir.y.atan2(dir.x).to_degrees();
        if angle < 0.0 {
            angle += 360.0;
        }
        let index = (angle / 45.0).round() as usize % 8;
        index.min(clip_count - 1)
    } else if clip_count >= 4 {
        if dir.x.abs() > dir.y.abs() {
            if dir.x > 0.0 { 0 } else { 2 }
        } else if dir.y > 0.0 {
            1
        } else {
            3
        }
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MirrorConfig;
    use crate::game::animation::UniformCatalog;
    use crate::game::entities::entity::KindDefaults;
    use crate::game::ownership::SessionRoster;
    use crate::game::types::{CharacterName, EntityKind, PeerId};

    fn setup(local: PeerId, remote: PeerId) -> (MovementController, OwnershipResolver) {
        let catalog = UniformCatalog::new()
            .with(AnimationState::Move, 4)
            .with(AnimationState::Idle, 3);
        let controller = MovementController::new(0.1, Arc::new(catalog));
        let resolver = OwnershipResolver::new(
            Box::new(SessionRoster::new(local, vec![remote])),
            MirrorConfig::default(),
        );
        (controller, resolver)
    }

    fn knight(owner: PeerId) -> Entity {
        let kind = EntityKind::Character(CharacterName::Knight);
        let mut e = Entity::parked(kind, owner, Vec3::ZERO, None);
        let defaults = KindDefaults {
            character_speed: 5.0,
            monster_speed: 2.0,
            character_hp: 100.0,
            monster_hp: 10.0,
        };
        e.activate(EntityId::new(), owner, &defaults);
        e.snap_to(Vec3::ZERO);
        e
    }

    #[test]
    fn direction_index_eight_and_four_way() {
        assert_eq!(direction_index(Vec3::new(1.0, 0.0, 0.0), 8), 0);
        assert_eq!(direction_index(Vec3::new(0.0, 1.0, 0.0), 8), 2);
        assert_eq!(direction_index(Vec3::new(-1.0, 0.0, 0.0), 8), 4);
        assert_eq!(direction_index(Vec3::new(0.0, -1.0, 0.0), 8), 6);
        assert_eq!(direction_index(Vec3::new(1.0, 1.0, 0.0), 8), 1);

        assert_eq!(direction_index(Vec3::new(3.0, 1.0, 0.0), 4), 0);
        assert_eq!(direction_index(Vec3::new(1.0, 3.0, 0.0), 4), 1);
        assert_eq!(direction_index(Vec3::new(-3.0, 1.0, 0.0), 4), 2);
        assert_eq!(direction_index(Vec3::new(1.0, -3.0, 0.0), 4), 3);

        assert_eq!(direction_index(Vec3::new(-1.0, 0.0, 0.0), 3), 0);
    }

    #[test]
    fn authoritative_move_is_announced_and_completes_once() {
        let local = PeerId::new();
        let (controller, resolver) = setup(local, PeerId::new());
        let mut outbox = Outbox::default();
        let mut entity = knight(local);

        controller.begin_move(&mut entity, Vec3::new(1.0, 0.0, 0.0), &resolver, &mut outbox);
        assert!(entity.is_moving());
        assert_eq!(entity.animation.state, AnimationState::Move);
        assert!(matches!(outbox.pending()[0], RpcMessage::MoveTo { .. }));

        // speed 5, dt 0.1 covers 0.5 of the 1.0 distance
        assert_eq!(controller.advance(&mut entity, 0.1, &resolver, &mut outbox), None);
        assert!((entity.position.original.x - 0.5).abs() < 1e-5);

        assert_eq!(controller.advance(&mut entity, 0.1, &resolver, &mut outbox), Some(entity.id));
        assert!(!entity.is_moving());
        assert_eq!(entity.position.original, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(entity.animation.state, AnimationState::Idle);
        assert!(matches!(outbox.pending()[1], RpcMessage::SetAnimation { state: AnimationState::Idle, .. }));

        assert_eq!(controller.advance(&mut entity, 0.1, &resolver, &mut outbox), None);
        assert_eq!(outbox.len(), 2);
    }

    #[test]
    fn remote_copy_moves_silently() {
        let local = PeerId::new();
        let remote = PeerId::new();
        let (controller, resolver) = setup(local, remote);
        let mut outbox = Outbox::default();
        let mut entity = knight(remote);

        controller.begin_move(&mut entity, Vec3::new(0.0, 2.0, 0.0), &resolver, &mut outbox);
        while controller.advance(&mut entity, 0.05, &resolver, &mut outbox).is_none() {}

        assert!(outbox.is_empty());
        assert_eq!(entity.position.original, Vec3::new(0.0, 2.0, 0.0));
        // Still showing the move pose until SetAnimation arrives.
        assert_eq!(entity.animation.state, AnimationState::Move);
    }

    #[test]
    fn begin_move_keeps_current_depth() {
        let local = PeerId::new();
        let (controller, resolver) = setup(local, PeerId::new());
        let mut outbox = Outbox::default();
        let mut entity = knight(local);
        entity.snap_to(Vec3::new(0.0, 0.0, 2.0));

        controller.begin_move(&mut entity, Vec3::new(1.0, 1.0, 9.0), &resolver, &mut outbox);
        assert_eq!(entity.target(), Some(Vec3::new(1.0, 1.0, 2.0)));
    }
}
