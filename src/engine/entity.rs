//! Record handles and typed component access.
//!
//! An [`EntityRef`] is a lightweight view of one record inside an
//! [`EntityArray`]: the record's id plus typed, offset-computed accessors
//! into its component bytes. Accessors are keyed by component identity and
//! resolved through the schema's offset table — no per-access walk over the
//! component list.
//!
//! ## Failure semantics
//!
//! Fetching a component the record's schema does not contain, or with a type
//! other than the one registered for that component, is a schema-mismatch
//! error: it means schema construction was wrong, and it panics rather than
//! returning an error. A stale index panics inside the storage layer for the
//! same reason.

use bytemuck::Pod;

use crate::engine::storage::EntityArray;
use crate::engine::types::{ArrayId, ComponentId, EntityId, TOMBSTONE_ID};

/// Where a record currently lives: its owning array and index within it.
///
/// Mutated only during the single-threaded integration phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntityLocation {
    /// Owning array.
    pub array: ArrayId,
    /// Record index within the array.
    pub index: usize,
}

/// View of one record: id header plus typed component access.
#[derive(Clone, Copy)]
pub struct EntityRef<'a> {
    array: &'a EntityArray,
    index: usize,
}

impl<'a> EntityRef<'a> {
    /// Builds a view of the record at `index`.
    ///
    /// ## Panics
    /// Panics if `index` is past the array's handed-out slots.
    pub fn new(array: &'a EntityArray, index: usize) -> Self {
        // Resolve eagerly so a stale index fails at construction.
        let _ = array.record_ptr(index);
        Self { array, index }
    }

    /// The record's id. `0` marks a tombstoned slot.
    #[inline]
    pub fn id(&self) -> EntityId {
        self.array.record_id(self.index)
    }

    /// Returns `true` if the record slot holds a live entity.
    #[inline]
    pub fn is_live(&self) -> bool {
        self.id() != TOMBSTONE_ID
    }

    /// The record's index within its owning array.
    ///
    /// Valid until the next integration phase.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// The owning array.
    #[inline]
    pub fn array(&self) -> &'a EntityArray {
        self.array
    }

    /// Shared view of the component registered as `component`.
    ///
    /// ## Panics
    /// Panics if the record's schema does not contain `component`, or if `T`
    /// is not the type registered for it.
    #[inline]
    pub fn get<T: Pod + 'static>(&self, component: ComponentId) -> &'a T {
        let bytes = self.component_bytes(component, std::any::TypeId::of::<T>());
        // SAFETY: `bytes` is a live, aligned, exactly-sized view of the
        // component; shared reads are unrestricted.
        bytemuck::from_bytes(unsafe { &*bytes })
    }

    /// Exclusive view of the component registered as `component`.
    ///
    /// Takes `&self`: exclusivity is guaranteed by the dispatch protocol
    /// (work chunks from one array never overlap in index range) rather than
    /// the borrow checker. Callers outside the worker machinery must not
    /// alias views of the same record.
    ///
    /// ## Panics
    /// Panics if the record's schema does not contain `component`, or if `T`
    /// is not the type registered for it.
    #[inline]
    #[allow(clippy::mut_from_ref)]
    pub fn get_mut<T: Pod + 'static>(&self, component: ComponentId) -> &'a mut T {
        let bytes = self.component_bytes(component, std::any::TypeId::of::<T>());
        // SAFETY: as in `get`, plus exclusivity by the dispatch protocol.
        bytemuck::from_bytes_mut(unsafe { &mut *bytes })
    }

    /// Resolves `component` to its byte range inside this record.
    fn component_bytes(&self, component: ComponentId, requested: std::any::TypeId) -> *mut [u8] {
        let entity_type = self.array.entity_type();
        let slot = entity_type.slot(component).unwrap_or_else(|| {
            panic!(
                "schema mismatch: component id {} is not part of schema {}",
                component,
                entity_type.name()
            )
        });
        assert!(
            slot.type_id == requested,
            "schema mismatch: component {} accessed with the wrong type",
            slot.name
        );
        let record = self.array.record_ptr(self.index);
        // SAFETY: offset and size come from the schema's layout table, which
        // the record was sized by.
        unsafe {
            std::ptr::slice_from_raw_parts_mut(record.add(slot.offset), slot.size)
        }
    }
}

impl std::fmt::Debug for EntityRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityRef")
            .field("id", &self.id())
            .field("index", &self.index)
            .field("schema", &self.array.entity_type().name())
            .finish()
    }
}
