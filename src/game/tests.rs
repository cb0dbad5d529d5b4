use std::sync::{Arc, Mutex};

use crate::config::{EngineConfig, GridConfig};
use crate::game::animation::UniformCatalog;
use crate::game::error::SyncError;
use crate::game::ownership::SessionRoster;
use crate::game::presentation::PresentationSink;
use crate::game::rpc::{RpcEnvelope, RpcMessage};
use crate::game::state::Battlefield;
use crate::game::systems::placement::GestureEvent;
use crate::game::types::*;

const KNIGHT: EntityKind = EntityKind::Character(CharacterName::Knight);
const ARCHER: EntityKind = EntityKind::Character(CharacterName::ElfArcher);
const BIRD: EntityKind = EntityKind::Monster(MonsterName::Bird1);
const DT: f32 = 0.02;

#[derive(Clone, Default)]
struct HpLog(Arc<Mutex<Vec<(EntityId, f32)>>>);

impl PresentationSink for HpLog {
    fn show_hp(&mut self, entity: EntityId, _kind: EntityKind, hp: f32) {
        self.0.lock().unwrap().push((entity, hp));
    }
}

fn battlefield(config: EngineConfig, local: PeerId, remote: PeerId) -> (Battlefield, HpLog) {
    let hp = HpLog::default();
    let bf = Battlefield::new(
        config,
        Box::new(SessionRoster::new(local, vec![remote])),
        Arc::new(UniformCatalog::standard()),
        Box::new(hp.clone()),
    );
    (bf, hp)
}

fn duel(config: EngineConfig) -> (Battlefield, Battlefield) {
    let a = PeerId::new();
    let b = PeerId::new();
    (battlefield(config.clone(), a, b).0, battlefield(config, b, a).0)
}

fn pump(from: &mut Battlefield, to: &mut Battlefield) {
    for envelope in from.drain_outbox() {
        to.apply_remote(envelope).unwrap();
    }
}

fn drag(bf: &mut Battlefield, source: SlotIndex, destination: SlotIndex) -> Option<u64> {
    bf.handle_gesture(GestureEvent::PointerDown { slot: Some(source), at: ScreenPoint::new(0.0, 0.0) });
    bf.handle_gesture(GestureEvent::PointerMove { at: ScreenPoint::new(40.0, 0.0), hovered: Some(destination) });
    bf.handle_gesture(GestureEvent::PointerUp)
}

fn settle(bf: &mut Battlefield) -> usize {
    let mut settled = 0;
    for _ in 0..500 {
        settled += bf.tick(DT).len();
        if bf.pending_relocations() == 0 {
            break;
        }
    }
    settled
}

fn occupants(bf: &Battlefield, slot: SlotIndex) -> Vec<EntityId> {
    bf.slot_occupants(bf.local_peer(), slot).unwrap()
}

fn assert_capacity(bf: &Battlefield, owner: PeerId) {
    for slot in bf.board(owner).unwrap().slots() {
        assert!(slot.len() <= 3, "slot {} holds {}", slot.index, slot.len());
    }
}

#[test]
fn full_slot_relocates_to_empty_slot_and_repacks_after_last_arrival() {
    let (mut a, _) = duel(EngineConfig::default());
    let ids: Vec<EntityId> = (0..3).map(|_| a.spawn_character(KNIGHT).unwrap()).collect();
    assert_eq!(occupants(&a, 0), ids);

    assert!(drag(&mut a, 0, 5).is_some());
    assert!(occupants(&a, 0).is_empty());
    assert_eq!(occupants(&a, 5), ids);
    assert!(ids.iter().all(|id| a.view(*id).unwrap().is_moving));

    let mut repacks = 0;
    for _ in 0..500 {
        let settled = a.tick(DT);
        if !settled.is_empty() {
            assert!(ids.iter().all(|id| !a.view(*id).unwrap().is_moving));
            repacks += settled.len();
        }
        if a.pending_relocations() == 0 {
            break;
        }
    }
    assert_eq!(repacks, 1);

    let board = a.board(a.local_peer()).unwrap();
    let center = board.slot(5).unwrap().center;
    for (index, id) in ids.iter().enumerate() {
        let expected = board.offset_for(center, index, 3);
        assert_eq!(a.view(*id).unwrap().position.original, expected);
    }
}

#[test]
fn relocation_announces_swap_then_moves() {
    let (mut a, _) = duel(EngineConfig::default());
    let knight = a.spawn_character(KNIGHT).unwrap();
    let archer = a.spawn_character(ARCHER).unwrap();
    a.drain_outbox();

    drag(&mut a, 0, 1);
    let sent: Vec<RpcMessage> = a.drain_outbox().into_iter().map(|e| e.message).collect();
    assert_eq!(sent[0], RpcMessage::Relocate { source: 0, destination: 1 });
    let moved: Vec<EntityId> = sent[1..]
        .iter()
        .filter_map(|m| match m {
            RpcMessage::MoveTo { entity_id, .. } => Some(*entity_id),
            _ => None,
        })
        .collect();
    assert_eq!(moved, vec![knight, archer]);
    assert_eq!(occupants(&a, 1), vec![knight]);
    assert_eq!(occupants(&a, 0), vec![archer]);
}

#[test]
fn dropping_onto_source_or_cancelling_changes_nothing() {
    let (mut a, _) = duel(EngineConfig::default());
    let id = a.spawn_character(KNIGHT).unwrap();
    a.drain_outbox();

    assert_eq!(drag(&mut a, 0, 0), None);
    a.handle_gesture(GestureEvent::PointerDown { slot: Some(0), at: ScreenPoint::new(0.0, 0.0) });
    a.handle_gesture(GestureEvent::PointerMove { at: ScreenPoint::new(40.0, 0.0), hovered: Some(3) });
    a.handle_gesture(GestureEvent::Cancel);
    assert_eq!(a.handle_gesture(GestureEvent::PointerUp), None);

    assert_eq!(occupants(&a, 0), vec![id]);
    assert!(!a.view(id).unwrap().is_moving);
    assert!(a.drain_outbox().is_empty());
}

#[test]
fn slots_never_exceed_capacity_across_relocations() {
    let (mut a, _) = duel(EngineConfig::default());
    for kind in [KNIGHT, KNIGHT, KNIGHT, ARCHER, ARCHER, KNIGHT] {
        a.spawn_character(kind).unwrap();
    }
    let local = a.local_peer();
    assert_capacity(&a, local);

    for (source, destination) in [(0, 1), (1, 2), (2, 0), (0, 4), (4, 2), (1, 0)] {
        a.relocate(source, destination);
        assert_capacity(&a, local);
        // Half way through, then start another relocation on top of it.
        for _ in 0..5 {
            a.tick(DT);
        }
        assert_capacity(&a, local);
    }
    settle(&mut a);
    assert_eq!(a.pending_relocations(), 0);
    assert_capacity(&a, local);
}

#[test]
fn overlapping_relocation_reads_live_lists_and_settles_each_request() {
    let (mut a, _) = duel(EngineConfig::default());
    let first = a.spawn_character(KNIGHT).unwrap();
    let second = a.spawn_character(ARCHER).unwrap();

    a.relocate(0, 3).unwrap();
    a.tick(DT);
    a.relocate(3, 4).unwrap();
    assert_eq!(occupants(&a, 4), vec![first]);
    assert_eq!(occupants(&a, 1), vec![second]);

    settle(&mut a);
    assert_eq!(a.pending_relocations(), 0);
    let board = a.board(a.local_peer()).unwrap();
    assert_eq!(a.view(first).unwrap().position.original, board.slot(4).unwrap().center);
}

#[test]
fn superseded_relocation_settles_without_snapping_the_new_swap() {
    let (mut a, mut b) = duel(EngineConfig::default());
    let knight = a.spawn_character(KNIGHT).unwrap();
    let archer = a.spawn_character(ARCHER).unwrap();
    pump(&mut a, &mut b);
    let start = a.view(archer).unwrap().position.original;

    a.relocate(0, 3).unwrap();
    a.tick(DT);
    // Pulls the knight, the only pending member of the first relocation.
    a.relocate(3, 1).unwrap();
    pump(&mut a, &mut b);

    for bf in [&a, &b] {
        let view = bf.view(archer).unwrap();
        assert_eq!(view.position.original, start, "archer jumped to its new slot");
        assert!(view.is_moving);
    }
    assert_eq!(a.pending_relocations(), 1);

    settle(&mut a);
    let board = a.board(a.local_peer()).unwrap();
    assert_eq!(a.view(archer).unwrap().position.original, board.slot(3).unwrap().center);
    assert_eq!(a.view(knight).unwrap().position.original, board.slot(1).unwrap().center);
}

#[test]
fn spawn_without_free_slot_rolls_back_pool_instance() {
    let config = EngineConfig {
        grid: GridConfig { rows: 1, cols: 1, ..GridConfig::default() },
        ..EngineConfig::default()
    };
    let (mut a, _) = duel(config);
    for _ in 0..3 {
        a.spawn_character(KNIGHT).unwrap();
    }
    let before = a.available(KNIGHT);

    assert_eq!(a.spawn_character(KNIGHT), None);
    assert_eq!(a.spawn_character(ARCHER), None);
    assert_eq!(a.available(KNIGHT), before);
    assert_eq!(a.active_count(), 3);
}

#[test]
fn spawn_stops_when_pool_is_exhausted() {
    let mut config = EngineConfig::default();
    config.pool.size_per_kind = 2;
    let (mut a, _) = duel(config);
    assert!(a.spawn_character(KNIGHT).is_some());
    assert!(a.spawn_character(KNIGHT).is_some());
    assert_eq!(a.spawn_character(KNIGHT), None);
    assert_eq!(a.active_count(), 2);
}

#[test]
fn spawn_is_announced_in_order() {
    let (mut a, _) = duel(EngineConfig::default());
    let id = a.spawn_character(KNIGHT).unwrap();
    let sent: Vec<RpcEnvelope> = a.drain_outbox();
    let names: Vec<&str> = sent.iter().map(|e| e.message.name()).collect();
    assert_eq!(names, vec!["SpawnAt", "PlaceInSlot", "SetPosition"]);
    assert_eq!(sent[1].message, RpcMessage::PlaceInSlot { entity_id: id, slot: 0 });
    assert!(sent.windows(2).all(|w| w[1].seq == w[0].seq + 1));
}

#[test]
fn remote_peer_mirrors_and_tracks_opponent_board() {
    let (mut a, mut b) = duel(EngineConfig::default());
    let id = a.spawn_character(KNIGHT).unwrap();
    pump(&mut a, &mut b);

    let mine = a.view(id).unwrap();
    let theirs = b.view(id).unwrap();
    assert!(mine.authoritative);
    assert!(!theirs.authoritative);
    assert_eq!(mine.position.display, mine.position.original);
    assert_eq!(theirs.position.original, mine.position.original);
    let o = mine.position.original;
    assert_eq!(theirs.position.display, Vec3::new(o.x, -o.y, o.z));

    assert_eq!(b.slot_occupants(a.local_peer(), 0), Some(vec![id]));
    assert!(b.slot_occupants(b.local_peer(), 0).unwrap().is_empty());
}

#[test]
fn mirrored_display_does_not_drift() {
    let a = PeerId::new();
    let (mut b, _) = battlefield(EngineConfig::default(), PeerId::new(), a);
    let id = EntityId::new();
    b.apply_remote(RpcEnvelope {
        sender: a,
        seq: 0,
        message: RpcMessage::SpawnAt { entity_id: id, kind: KNIGHT, owner: a, position: Vec3::new(2.0, 5.0, 0.0) },
    })
    .unwrap();

    for _ in 0..50 {
        b.tick(DT);
        let view = b.view(id).unwrap();
        assert_eq!(view.position.original, Vec3::new(2.0, 5.0, 0.0));
        assert_eq!(view.position.display, Vec3::new(2.0, -5.0, 0.0));
    }
}

#[test]
fn relocation_replays_on_remote_peer() {
    let (mut a, mut b) = duel(EngineConfig::default());
    let ids: Vec<EntityId> = (0..2).map(|_| a.spawn_character(KNIGHT).unwrap()).collect();
    let archer = a.spawn_character(ARCHER).unwrap();
    pump(&mut a, &mut b);

    drag(&mut a, 0, 1).unwrap();
    pump(&mut a, &mut b);
    let owner = a.local_peer();
    assert_eq!(b.slot_occupants(owner, 1), Some(ids.clone()));
    assert_eq!(b.slot_occupants(owner, 0), Some(vec![archer]));

    assert_eq!(settle(&mut a), 1);
    assert_eq!(settle(&mut b), 1);
    pump(&mut a, &mut b);

    for id in ids.iter().chain([archer].iter()) {
        let here = a.view(*id).unwrap();
        let there = b.view(*id).unwrap();
        assert_eq!(here.position.original, there.position.original);
        assert!(!there.is_moving);
        assert_eq!(there.animation.state, AnimationState::Idle);
        assert_eq!(there.animation.index, here.animation.index);
    }
}

#[test]
fn damage_from_non_owner_is_forwarded_and_applied_by_owner() {
    let a_id = PeerId::new();
    let b_id = PeerId::new();
    let (mut a, a_hp) = battlefield(EngineConfig::default(), a_id, b_id);
    let (mut b, b_hp) = battlefield(EngineConfig::default(), b_id, a_id);
    let id = a.spawn_character(KNIGHT).unwrap();
    pump(&mut a, &mut b);

    assert_eq!(b.damage(id, 30.0), Ok(None));
    assert_eq!(b.view(id).unwrap().hp, 100.0);
    pump(&mut b, &mut a);
    assert_eq!(a.view(id).unwrap().hp, 70.0);
    pump(&mut a, &mut b);
    assert_eq!(b.view(id).unwrap().hp, 70.0);
    assert_eq!(a_hp.0.lock().unwrap().as_slice(), &[(id, 70.0)]);
    assert_eq!(b_hp.0.lock().unwrap().as_slice(), &[(id, 70.0)]);

    assert_eq!(a.damage(id, 500.0), Ok(Some(0.0)));
    assert!(a.view(id).is_none());
    pump(&mut a, &mut b);
    assert!(b.view(id).is_none());
    assert!(b.slot_occupants(a_id, 0).unwrap().is_empty());
    assert_eq!(b.active_count(), 0);
}

#[test]
fn despawn_mid_relocation_still_settles() {
    let (mut a, _) = duel(EngineConfig::default());
    let first = a.spawn_character(KNIGHT).unwrap();
    let second = a.spawn_character(KNIGHT).unwrap();
    a.relocate(0, 2).unwrap();
    a.tick(DT);

    a.despawn(second).unwrap();
    assert_eq!(occupants(&a, 2), vec![first]);
    assert_eq!(settle(&mut a), 1);
    let board = a.board(a.local_peer()).unwrap();
    assert_eq!(a.view(first).unwrap().position.original, board.slot(2).unwrap().center);
}

#[test]
fn only_the_owner_despawns() {
    let (mut a, mut b) = duel(EngineConfig::default());
    let id = a.spawn_character(KNIGHT).unwrap();
    pump(&mut a, &mut b);
    assert!(matches!(b.despawn(id), Err(SyncError::InvalidOperation(_))));
    assert!(b.view(id).is_some());
}

#[test]
fn remote_message_for_unknown_entity_is_a_desync() {
    let (_, mut b) = duel(EngineConfig::default());
    let stranger = PeerId::new();
    let ghost = EntityId::new();
    let err = b
        .apply_remote(RpcEnvelope {
            sender: stranger,
            seq: 0,
            message: RpcMessage::MoveTo { entity_id: ghost, target: Vec3::ZERO },
        })
        .unwrap_err();
    assert_eq!(err, SyncError::DesyncPossible(ghost));
}

#[test]
fn remote_spawn_beyond_pool_falls_back_to_instantiation() {
    let mut config = EngineConfig::default();
    config.pool.size_per_kind = 1;
    let a = PeerId::new();
    let (mut b, _) = battlefield(config, PeerId::new(), a);

    let ids: Vec<EntityId> = (0..2).map(|_| EntityId::new()).collect();
    for (seq, id) in ids.iter().enumerate() {
        b.apply_remote(RpcEnvelope {
            sender: a,
            seq: seq as u64,
            message: RpcMessage::SpawnAt { entity_id: *id, kind: KNIGHT, owner: a, position: Vec3::ZERO },
        })
        .unwrap();
    }
    assert_eq!(b.active_count(), 2);
    assert_eq!(b.available(KNIGHT), 0);

    b.apply_remote(RpcEnvelope { sender: a, seq: 2, message: RpcMessage::Despawn { entity_id: ids[1] } })
        .unwrap();
    assert_eq!(b.active_count(), 1);
}

#[test]
fn monsters_patrol_in_lockstep_on_both_peers() {
    let (mut a, mut b) = duel(EngineConfig::default());
    let route = vec![Vec3::new(0.0, 1.0, 0.0), Vec3::new(2.0, 1.0, 0.0)];
    let id = a.spawn_monster(BIRD, route).unwrap();
    assert_eq!(a.spawn_monster(KNIGHT, vec![Vec3::ZERO]), None);
    pump(&mut a, &mut b);

    for _ in 0..120 {
        a.tick(DT);
        b.tick(DT);
        let here = a.view(id).unwrap().position;
        let there = b.view(id).unwrap().position;
        assert_eq!(here.original, there.original);
        assert_eq!(there.display.y, -here.original.y);
    }
    assert!(a.drain_outbox().is_empty());
}
