use std::sync::Once;

use bytemuck::{Pod, Zeroable};
use packed_ecs::{
    component_id_of, register_component, ComponentId, Ecs, EntityType, TypeHooks,
    RECORD_HEADER_SIZE,
};

#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
struct Velocity {
    dx: f32,
    dy: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
struct Health(u32);

static INIT: Once = Once::new();

fn init_components() {
    INIT.call_once(|| {
        register_component::<Position>("Position").unwrap();
        register_component::<Velocity>("Velocity").unwrap();
        register_component::<Health>("Health").unwrap();
    });
}

fn ids() -> (ComponentId, ComponentId) {
    (
        component_id_of::<Position>().unwrap(),
        component_id_of::<Velocity>().unwrap(),
    )
}

fn movable_type(ecs: &Ecs) -> EntityType {
    let (pos, vel) = ids();
    ecs.create_entity_type("movable", &[pos, vel], TypeHooks::default())
        .unwrap()
}

#[test]
fn record_size_is_header_plus_component_sizes() {
    init_components();
    let ecs = Ecs::new(1);
    let movable = movable_type(&ecs);

    // Two 8-byte components behind the 8-byte id header.
    assert_eq!(movable.record_size(), RECORD_HEADER_SIZE + 16);
    assert_eq!(movable.component_count(), 2);
}

#[test]
fn fresh_record_is_zeroed_and_id_matches() {
    init_components();
    let (pos, vel) = ids();
    let ecs = Ecs::new(1);
    let movable = movable_type(&ecs);

    let id = ecs.create_entity(&movable, 0);
    let record = ecs.entity(id).expect("created outside a block");

    assert_eq!(record.id(), id);
    assert_eq!(*record.get::<Position>(pos), Position { x: 0.0, y: 0.0 });
    assert_eq!(*record.get::<Velocity>(vel), Velocity { dx: 0.0, dy: 0.0 });
}

#[test]
fn component_views_read_back_written_values() {
    init_components();
    let (pos, vel) = ids();
    let ecs = Ecs::new(1);
    let movable = movable_type(&ecs);

    let id = ecs.create_entity(&movable, 0);
    let record = ecs.entity(id).unwrap();
    *record.get_mut::<Position>(pos) = Position { x: 1.5, y: -2.0 };
    *record.get_mut::<Velocity>(vel) = Velocity { dx: 0.25, dy: 4.0 };

    let record = ecs.entity(id).unwrap();
    assert_eq!(*record.get::<Position>(pos), Position { x: 1.5, y: -2.0 });
    assert_eq!(*record.get::<Velocity>(vel), Velocity { dx: 0.25, dy: 4.0 });
}

#[test]
fn five_entities_get_sequential_ids_and_live_count() {
    init_components();
    let ecs = Ecs::new(1);
    let movable = movable_type(&ecs);

    let created: Vec<_> = (0..5).map(|_| ecs.create_entity(&movable, 0)).collect();
    assert_eq!(created, vec![1, 2, 3, 4, 5]);

    let array = ecs.entities_of_exact_type(&movable).unwrap();
    assert_eq!(array.live_count(), 5);
    assert_eq!(array.published_count(), 5);
    assert_eq!(array.entity_type().record_size(), RECORD_HEADER_SIZE + 16);
}

#[test]
fn copy_entity_duplicates_components_not_identity() {
    init_components();
    let (pos, vel) = ids();
    let ecs = Ecs::new(1);
    let movable = movable_type(&ecs);

    let original = ecs.create_entity(&movable, 0);
    *ecs.entity(original).unwrap().get_mut::<Position>(pos) = Position { x: 7.0, y: 8.0 };

    let clone = ecs.copy_entity(original, 0);
    assert_ne!(clone, original);

    let cloned = ecs.entity(clone).unwrap();
    assert_eq!(cloned.id(), clone);
    assert_eq!(*cloned.get::<Position>(pos), Position { x: 7.0, y: 8.0 });

    // The clone is independent storage.
    *cloned.get_mut::<Velocity>(vel) = Velocity { dx: 9.0, dy: 9.0 };
    assert_eq!(
        *ecs.entity(original).unwrap().get::<Velocity>(vel),
        Velocity { dx: 0.0, dy: 0.0 }
    );
}

#[test]
#[should_panic(expected = "schema mismatch")]
fn fetching_a_component_outside_the_schema_is_fatal() {
    init_components();
    let ecs = Ecs::new(1);
    let (pos, _) = ids();
    let health = component_id_of::<Health>().unwrap();
    let walker = ecs
        .create_entity_type("walker", &[pos], TypeHooks::default())
        .unwrap();

    let id = ecs.create_entity(&walker, 0);
    let record = ecs.entity(id).unwrap();
    let _ = record.get::<Health>(health);
}
