use std::sync::Once;

use bytemuck::{Pod, Zeroable};
use packed_ecs::{component_id_of, register_component, ComponentId, Ecs, EntityType, TypeHooks};

pub const AGENTS_SMALL: usize = 10_000;
pub const AGENTS_MED: usize = 100_000;

#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Velocity {
    pub dx: f32,
    pub dy: f32,
}

static INIT: Once = Once::new();

pub fn init_components() {
    INIT.call_once(|| {
        register_component::<Position>("Position").unwrap();
        register_component::<Velocity>("Velocity").unwrap();
    });
}

pub fn position_id() -> ComponentId {
    component_id_of::<Position>().unwrap()
}

pub fn velocity_id() -> ComponentId {
    component_id_of::<Velocity>().unwrap()
}

pub fn movable_type(ecs: &Ecs) -> EntityType {
    ecs.create_entity_type("movable", &[position_id(), velocity_id()], TypeHooks::default())
        .unwrap()
}

pub fn populate(ecs: &Ecs, ty: &EntityType, count: usize) {
    let velocity = velocity_id();
    for n in 0..count {
        let id = ecs.create_entity(ty, 0);
        let record = ecs.entity(id).expect("created outside a block");
        *record.get_mut::<Velocity>(velocity) = Velocity {
            dx: (n % 7) as f32,
            dy: (n % 3) as f32,
        };
    }
}
