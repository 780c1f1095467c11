//! # packed_ecs
//!
//! Entity/component store that packs homogeneous game-object records into
//! contiguous byte arenas and executes per-record update logic across a fixed
//! worker pool, organized into ordered execution blocks.
//!
//! ## Design Goals
//! - Schema-driven packed record storage (id header + offset-table component
//!   access over byte arenas)
//! - Link-then-merge growth: record pointers stay valid for a whole execution
//!   block, even under concurrent creation
//! - Deferred structural mutation: creation and deletion during parallel
//!   execution never corrupt in-flight reads
//! - Deterministic scheduling: blocks and systems run in registration order
//!
//! ## Failure semantics
//! Construction-time problems (frozen registry, capacity, bad schemas) are
//! `Result`s. Invariant breaks on the hot path — schema-mismatched component
//! access, stale indices, allocation failure — are fatal: they indicate
//! corrupted bookkeeping in a path where continuing would silently corrupt
//! game state.

#![forbid(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]
#![allow(clippy::module_inception)]

pub mod engine;

// ─────────────────────────────────────────────────────────────────────────────
// Re-exports (Public API)
// ─────────────────────────────────────────────────────────────────────────────

pub use engine::manager::{Ecs, NotifyFn};

pub use engine::entity::{EntityLocation, EntityRef};

pub use engine::entity_type::{EntityType, LifecycleFn, TypeHooks, UiFactoryFn};

pub use engine::component::{
    component_desc, component_id_of, freeze_components, register_component, ComponentDesc,
};

pub use engine::storage::EntityArray;

pub use engine::query::EntityTypeIter;

pub use engine::systems::{System, SystemFn};

pub use engine::random::SeededRng;

pub use engine::error::{
    ComponentCapacityError, DuplicateComponentError, EcsError, EcsResult, RegistryFrozenError,
    UnknownComponentError,
};

pub use engine::types::{
    ArrayId, ComponentId, EntityId, Signature, CHUNK_SIZE, INITIAL_SEGMENT_CAPACITY,
    RECORD_HEADER_SIZE, TOMBSTONE_ID, WORKER_THREADS,
};

// ─────────────────────────────────────────────────────────────────────────────
// Prelude (Optional but recommended)
// ─────────────────────────────────────────────────────────────────────────────

/// Commonly used store types.
///
/// Import with:
/// ```rust
/// use packed_ecs::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        component_id_of, freeze_components, register_component, Ecs, EntityId, EntityRef,
        EntityType, System, TypeHooks,
    };
}
