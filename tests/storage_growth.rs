use std::sync::Once;

use bytemuck::{Pod, Zeroable};
use packed_ecs::{
    component_id_of, register_component, ComponentId, Ecs, EntityType, TypeHooks,
    INITIAL_SEGMENT_CAPACITY,
};

#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
struct Value(u64);

static INIT: Once = Once::new();

fn init_components() {
    INIT.call_once(|| {
        register_component::<Value>("Value").unwrap();
    });
}

fn value_id() -> ComponentId {
    component_id_of::<Value>().unwrap()
}

fn value_type(ecs: &Ecs) -> EntityType {
    ecs.create_entity_type("value", &[value_id()], TypeHooks::default())
        .unwrap()
}

#[test]
fn one_growth_event_past_initial_capacity() {
    init_components();
    let value = value_id();
    let ecs = Ecs::new(1);
    let ty = value_type(&ecs);

    let mut created = Vec::new();
    for n in 0..INITIAL_SEGMENT_CAPACITY {
        let id = ecs.create_entity(&ty, 0);
        *ecs.entity(id).unwrap().get_mut::<Value>(value) = Value(n as u64 * 10);
        created.push(id);
    }

    let array = ecs.entities_of_exact_type(&ty).unwrap();
    assert_eq!(array.segment_count(), 1);

    // The record past the initial capacity links exactly one new segment.
    let id = ecs.create_entity(&ty, 0);
    *ecs.entity(id).unwrap().get_mut::<Value>(value) = Value(999);
    created.push(id);
    assert_eq!(array.segment_count(), 2);
    assert_eq!(array.live_count(), INITIAL_SEGMENT_CAPACITY + 1);

    // Growth moved nothing: every prior record still reads its own value.
    for (n, &id) in created.iter().enumerate().take(INITIAL_SEGMENT_CAPACITY) {
        assert_eq!(
            *ecs.entity(id).unwrap().get::<Value>(value),
            Value(n as u64 * 10)
        );
    }
    assert_eq!(
        *ecs.entity(created[INITIAL_SEGMENT_CAPACITY]).unwrap().get::<Value>(value),
        Value(999)
    );
}

#[test]
fn integration_folds_the_chain_back_to_one_segment() {
    init_components();
    let value = value_id();
    let ecs = Ecs::new(1);
    let ty = value_type(&ecs);

    let created: Vec<_> = (0..INITIAL_SEGMENT_CAPACITY + 5)
        .map(|n| {
            let id = ecs.create_entity(&ty, 0);
            *ecs.entity(id).unwrap().get_mut::<Value>(value) = Value(n as u64);
            id
        })
        .collect();

    let array = ecs.entities_of_exact_type(&ty).unwrap();
    assert_eq!(array.segment_count(), 2);

    // A tick with no registered systems still integrates.
    ecs.update();

    assert_eq!(array.segment_count(), 1);
    assert_eq!(array.published_count(), created.len());
    for (n, &id) in created.iter().enumerate() {
        assert_eq!(*ecs.entity(id).unwrap().get::<Value>(value), Value(n as u64));
    }
}

#[test]
fn swap_remove_moves_the_last_record_into_the_freed_slot() {
    init_components();
    let value = value_id();
    let ecs = Ecs::new(1);
    let ty = value_type(&ecs);

    let created: Vec<_> = (0..5)
        .map(|n| {
            let id = ecs.create_entity(&ty, 0);
            *ecs.entity(id).unwrap().get_mut::<Value>(value) = Value(100 + n as u64);
            id
        })
        .collect();

    let victim = created[1];
    let last = created[4];
    let victim_index = ecs.entity(victim).unwrap().index();

    ecs.delete_entity(victim);
    ecs.update();

    let array = ecs.entities_of_exact_type(&ty).unwrap();
    assert_eq!(array.live_count(), 4);
    assert!(ecs.entity(victim).is_none());

    // The previous last record now occupies the freed slot, and the id map
    // was repointed with it.
    let moved = ecs.entity(last).unwrap();
    assert_eq!(moved.index(), victim_index);
    assert_eq!(*moved.get::<Value>(value), Value(104));

    // Untouched records keep their values.
    assert_eq!(*ecs.entity(created[0]).unwrap().get::<Value>(value), Value(100));
    assert_eq!(*ecs.entity(created[2]).unwrap().get::<Value>(value), Value(102));
    assert_eq!(*ecs.entity(created[3]).unwrap().get::<Value>(value), Value(103));
}

#[test]
fn deleting_the_last_record_needs_no_move() {
    init_components();
    let value = value_id();
    let ecs = Ecs::new(1);
    let ty = value_type(&ecs);

    let keep = ecs.create_entity(&ty, 0);
    let tail = ecs.create_entity(&ty, 0);
    *ecs.entity(keep).unwrap().get_mut::<Value>(value) = Value(1);

    ecs.delete_entity(tail);
    ecs.update();

    let array = ecs.entities_of_exact_type(&ty).unwrap();
    assert_eq!(array.live_count(), 1);
    assert!(ecs.entity(tail).is_none());
    let record = ecs.entity(keep).unwrap();
    assert_eq!(record.index(), 0);
    assert_eq!(*record.get::<Value>(value), Value(1));
}

#[test]
#[should_panic(expected = "out of range")]
fn stale_indices_are_fatal() {
    init_components();
    let ecs = Ecs::new(1);
    let ty = value_type(&ecs);

    let id = ecs.create_entity(&ty, 0);
    let array = ecs.entities_of_exact_type(&ty).unwrap();
    assert_eq!(array.record_id(0), id);
    let _ = array.record_id(1);
}
