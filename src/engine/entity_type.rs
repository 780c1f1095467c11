//! Entity schemas: ordered component sets with a fixed record layout.
//!
//! An [`EntityType`] describes one kind of record: which components it
//! carries, at which byte offset each component lives, and how many bytes one
//! record occupies. The offset table is computed once at construction so
//! component access never re-walks the component list.
//!
//! Two set relations drive the rest of the engine:
//!
//! - **superset** ([`EntityType::is_entity_of_type`]) — query matching: a
//!   candidate schema matches a query schema when it carries every component
//!   the query names.
//! - **exact match** ([`EntityType::is_strictly_of_type`]) — storage
//!   selection: every concrete record type maps to exactly one entity array.
//!
//! Schemas may carry optional behavioral hooks for external collaborators
//! (a UI-object factory, a post-create setup callback, a pre-delete teardown
//! callback). The hooks are opaque to the core: lifecycle callbacks run during
//! the integration phase, the factory is merely stored and handed out.

use std::any::Any;
use std::sync::Arc;

use crate::engine::component::component_desc;
use crate::engine::error::{DuplicateComponentError, EcsResult};
use crate::engine::types::{
    align_up, ComponentId, EntityId, Signature, RECORD_ALIGN, RECORD_HEADER_SIZE,
};

/// Factory producing an opaque presentation object for a freshly created
/// entity. Stored on behalf of the UI layer, never invoked by the core.
pub type UiFactoryFn = Arc<dyn Fn(EntityId) -> Box<dyn Any + Send> + Send + Sync>;

/// Lifecycle callback invoked with an entity id during the integration phase.
pub type LifecycleFn = Arc<dyn Fn(EntityId) + Send + Sync>;

/// Optional behavioral hooks carried by a schema.
#[derive(Default, Clone)]
pub struct TypeHooks {
    /// Factory for a presentation object, consumed by the UI layer.
    pub ui_factory: Option<UiFactoryFn>,
    /// Post-create setup, run when the entity materializes.
    pub on_create: Option<LifecycleFn>,
    /// Pre-delete teardown, run just before the record is removed.
    pub on_delete: Option<LifecycleFn>,
}

/// Layout of one component within a record.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ComponentSlot {
    /// Component identity.
    pub component_id: ComponentId,
    /// Byte offset of the component within the record.
    pub offset: usize,
    /// Component size in bytes.
    pub size: usize,
    /// `TypeId` of the carrying Rust type, for access checking.
    pub type_id: std::any::TypeId,
    /// Display name, for diagnostics.
    pub name: &'static str,
}

struct EntityTypeData {
    name: &'static str,
    slots: Vec<ComponentSlot>,
    signature: Signature,
    record_size: usize,
    hooks: TypeHooks,
}

/// A schema handle. Cheap to clone; all clones share the same layout.
#[derive(Clone)]
pub struct EntityType {
    data: Arc<EntityTypeData>,
}

impl EntityType {
    /// Builds a schema from an ordered component list.
    ///
    /// The offset table and record size are computed once here. Offsets are
    /// padded to each component's alignment and the record size is rounded up
    /// to [`RECORD_ALIGN`] so consecutive records stay aligned; for naturally
    /// ordered component sets the record size equals the id header plus the
    /// sum of the component sizes.
    ///
    /// ## Errors
    /// Fails if a component id is unregistered or listed twice.
    pub fn new(
        name: &'static str,
        components: &[ComponentId],
        hooks: TypeHooks,
    ) -> EcsResult<Self> {
        let mut slots = Vec::with_capacity(components.len());
        let mut signature = Signature::default();
        let mut offset = RECORD_HEADER_SIZE;

        for &component_id in components {
            let desc = component_desc(component_id)?;
            if signature.has(component_id) {
                return Err(DuplicateComponentError {
                    component_id,
                    name: desc.name,
                }
                .into());
            }
            signature.set(component_id);

            offset = align_up(offset, desc.align.max(1));
            slots.push(ComponentSlot {
                component_id,
                offset,
                size: desc.size,
                type_id: desc.type_id,
                name: desc.name,
            });
            offset += desc.size;
        }

        Ok(Self {
            data: Arc::new(EntityTypeData {
                name,
                slots,
                signature,
                record_size: align_up(offset, RECORD_ALIGN),
                hooks,
            }),
        })
    }

    /// Display name given at registration.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.data.name
    }

    /// Size in bytes of one record of this schema, id header included.
    #[inline]
    pub fn record_size(&self) -> usize {
        self.data.record_size
    }

    /// Number of components in this schema.
    #[inline]
    pub fn component_count(&self) -> usize {
        self.data.slots.len()
    }

    /// Component ids in declaration order.
    pub fn components(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.data.slots.iter().map(|slot| slot.component_id)
    }

    /// The component bitset of this schema.
    #[inline]
    pub fn signature(&self) -> &Signature {
        &self.data.signature
    }

    /// Returns `true` if this schema carries every component of `query`.
    ///
    /// This is the read/iterate matching relation: reflexive, and
    /// order-independent over the component sets.
    #[inline]
    pub fn is_entity_of_type(&self, query: &EntityType) -> bool {
        self.data.signature.contains_all(&query.data.signature)
    }

    /// Returns `true` if this schema and `other` carry the same component set.
    ///
    /// Used for storage selection so every record type maps to exactly one
    /// entity array.
    #[inline]
    pub fn is_strictly_of_type(&self, other: &EntityType) -> bool {
        self.data.slots.len() == other.data.slots.len() && self.is_entity_of_type(other)
    }

    /// Looks up the layout slot of `component_id`, if present.
    #[inline]
    pub(crate) fn slot(&self, component_id: ComponentId) -> Option<&ComponentSlot> {
        self.data
            .slots
            .iter()
            .find(|slot| slot.component_id == component_id)
    }

    /// The schema's UI-object factory, if one was attached.
    pub fn ui_factory(&self) -> Option<&UiFactoryFn> {
        self.data.hooks.ui_factory.as_ref()
    }

    /// Post-create setup hook, if one was attached.
    pub(crate) fn on_create(&self) -> Option<&LifecycleFn> {
        self.data.hooks.on_create.as_ref()
    }

    /// Pre-delete teardown hook, if one was attached.
    pub(crate) fn on_delete(&self) -> Option<&LifecycleFn> {
        self.data.hooks.on_delete.as_ref()
    }
}

impl std::fmt::Debug for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityType")
            .field("name", &self.data.name)
            .field("components", &self.data.slots.len())
            .field("record_size", &self.data.record_size)
            .finish()
    }
}
