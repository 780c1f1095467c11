//! System definitions: a query schema plus per-record update logic.
//!
//! A **system** is the unit of scheduled logic: it names the components a
//! record must carry (its query schema) and a function run once per matching
//! record. Systems are registered into ordered execution blocks
//! ([`crate::Ecs::register_system`]); the scheduler fans each one out over
//! every matching array in bounded-size work chunks.
//!
//! Systems must be `Send + Sync`: any worker thread may execute any chunk.
//! Within one chunk, records are processed strictly in increasing index
//! order; across chunks there is no ordering guarantee.

use std::sync::Arc;

use crate::engine::entity::EntityRef;
use crate::engine::entity_type::EntityType;
use crate::engine::manager::Ecs;

/// Per-record update function executed by workers.
pub type SystemFn = Arc<dyn Fn(&Ecs, EntityRef<'_>) + Send + Sync>;

/// A scheduled unit of per-record logic.
pub struct System {
    name: &'static str,
    query: EntityType,
    run: SystemFn,
}

impl System {
    /// Creates a system from a query schema and an update function.
    ///
    /// `name` is used for diagnostics only.
    pub fn new(
        name: &'static str,
        query: EntityType,
        run: impl Fn(&Ecs, EntityRef<'_>) + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            query,
            run: Arc::new(run),
        }
    }

    /// Diagnostic name of this system.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The schema a record must be a superset of to be processed.
    #[inline]
    pub fn query(&self) -> &EntityType {
        &self.query
    }

    /// The update function, shareable across work items.
    #[inline]
    pub(crate) fn run_fn(&self) -> SystemFn {
        Arc::clone(&self.run)
    }
}

impl std::fmt::Debug for System {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("System")
            .field("name", &self.name)
            .field("query", &self.query)
            .finish()
    }
}
