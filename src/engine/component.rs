//! # Component Registry
//!
//! Global registry assigning stable [`ComponentId`] values to Rust component
//! types.
//!
//! ## Purpose
//! A component kind is a named, fixed-size field descriptor. The registry
//! decouples component identity (a compact id, compared by identity and never
//! by value) from the Rust type carrying the data, so schemas and storage can
//! be described in terms of plain ids while typed access stays checked.
//!
//! ## Design
//! - Components are registered once per process, at startup, and assigned a
//!   compact `ComponentId` in `[0, COMPONENT_CAP)`.
//! - A descriptor ([`ComponentDesc`]) records the display name, `TypeId`,
//!   size, and alignment used for record layout and diagnostics.
//! - The registry can be frozen after world setup; registration past that
//!   point is rejected.
//!
//! ## Invariants
//! - `ComponentId` values are unique and stable for the lifetime of the
//!   process.
//! - Registered component types are `Pod`: any bit pattern is valid, so a
//!   zero-initialized record slot is a valid value for every component.
//! - Component alignment never exceeds `RECORD_ALIGN`.
//!
//! ## Concurrency
//! The registry is protected by an `RwLock` for concurrent reads and
//! serialized writes. Registration is expected to happen on one thread during
//! startup; lookups are hot and read-only.

use std::{
    any::{type_name, TypeId},
    collections::HashMap,
    mem::{align_of, size_of},
    sync::{OnceLock, RwLock},
};

use bytemuck::Pod;

use crate::engine::error::{
    ComponentCapacityError, EcsResult, RegistryFrozenError, UnknownComponentError,
};
use crate::engine::types::{ComponentId, COMPONENT_CAP, RECORD_ALIGN};

/// Describes a registered component kind.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ComponentDesc {
    /// Runtime identifier assigned to this component kind.
    pub component_id: ComponentId,
    /// Display name given at registration.
    pub name: &'static str,
    /// Runtime `TypeId` of the carrying Rust type.
    pub type_id: TypeId,
    /// Size of the component in bytes.
    pub size: usize,
    /// Alignment of the component in bytes.
    pub align: usize,
}

impl std::fmt::Display for ComponentDesc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ComponentDesc {{ id: {}, name: {}, size: {}, align: {} }}",
            self.component_id, self.name, self.size, self.align
        )
    }
}

struct ComponentRegistry {
    next_id: ComponentId,
    by_type: HashMap<TypeId, ComponentId>,
    by_id: Vec<Option<ComponentDesc>>,
    frozen: bool,
}

static REGISTRY: OnceLock<RwLock<ComponentRegistry>> = OnceLock::new();

fn component_registry() -> &'static RwLock<ComponentRegistry> {
    REGISTRY.get_or_init(|| {
        RwLock::new(ComponentRegistry {
            next_id: 0,
            by_type: HashMap::new(),
            by_id: vec![None; COMPONENT_CAP],
            frozen: false,
        })
    })
}

impl ComponentRegistry {
    fn register<T: Pod + Send + Sync + 'static>(
        &mut self,
        name: &'static str,
    ) -> EcsResult<ComponentId> {
        let type_id = TypeId::of::<T>();
        if let Some(&existing) = self.by_type.get(&type_id) {
            return Ok(existing);
        }

        if self.frozen {
            return Err(RegistryFrozenError {
                type_name: type_name::<T>(),
            }
            .into());
        }
        if (self.next_id as usize) >= COMPONENT_CAP {
            return Err(ComponentCapacityError {
                capacity: COMPONENT_CAP,
            }
            .into());
        }
        assert!(
            align_of::<T>() <= RECORD_ALIGN,
            "component {} alignment {} exceeds the record alignment {}",
            name,
            align_of::<T>(),
            RECORD_ALIGN
        );

        let id = self.next_id;
        self.next_id += 1;
        self.by_type.insert(type_id, id);
        self.by_id[id as usize] = Some(ComponentDesc {
            component_id: id,
            name,
            type_id,
            size: size_of::<T>(),
            align: align_of::<T>(),
        });
        Ok(id)
    }
}

/// Registers component type `T` under `name` and returns its id.
///
/// ## Behavior
/// - If `T` is already registered, the existing id is returned and `name` is
///   ignored.
/// - Otherwise a new id is assigned and a descriptor stored.
///
/// ## Errors
/// Fails if the registry is frozen or component capacity is exhausted.
pub fn register_component<T: Pod + Send + Sync + 'static>(
    name: &'static str,
) -> EcsResult<ComponentId> {
    let mut registry = component_registry().write().unwrap();
    registry.register::<T>(name)
}

/// Freezes the global component registry.
///
/// After freezing, component identity is stable for the process lifetime and
/// any further registration attempt fails.
pub fn freeze_components() {
    let mut registry = component_registry().write().unwrap();
    registry.frozen = true;
}

/// Returns the id registered for type `T`, if any.
pub fn component_id_of<T: 'static>() -> Option<ComponentId> {
    let registry = component_registry().read().unwrap();
    registry.by_type.get(&TypeId::of::<T>()).copied()
}

/// Returns the descriptor for `component_id`.
///
/// ## Errors
/// Fails if the id was never assigned.
pub fn component_desc(component_id: ComponentId) -> EcsResult<ComponentDesc> {
    let registry = component_registry().read().unwrap();
    registry
        .by_id
        .get(component_id as usize)
        .and_then(|slot| *slot)
        .ok_or_else(|| UnknownComponentError { component_id }.into())
}
