//! The store itself: registry, block scheduler, and integration phase.
//!
//! [`Ecs`] owns every entity array, the id→location index, the ordered list
//! of execution blocks, the shared work queue, and the deferred
//! creation/deletion lists. One call to [`Ecs::update`] runs one simulation
//! tick.
//!
//! ## Per-block state machine
//!
//! Each block moves through **Idle → Dispatching → Draining → Integrating**:
//!
//! 1. *Dispatching* — every system in the block, in registration order, is
//!    fanned out over its matching arrays as fixed-size work chunks.
//! 2. *Draining* — the calling thread drains chunks alongside the worker
//!    pool, then blocks on the completion barrier. Systems are drained one at
//!    a time so two systems never touch the same record concurrently.
//! 3. *Integrating* — single-threaded: arrays fold multi-segment growth back
//!    to one segment, pending creations resolve into the id map (before
//!    deletions, whose swap-removes would invalidate the fresh indices),
//!    pending deletions run, and the add/delete notification hooks fire.
//!
//! ## Concurrency model
//!
//! The store is internally mutable (`UnsafeCell`) and `Sync`; safety comes
//! from scheduling discipline, not the borrow checker:
//!
//! - The id map and block list are written only while no worker is active —
//!   during integration or setup.
//! - Mid-block structural requests go through the mutex-guarded pending
//!   lists and touch storage only via thread-safe slot reservation.
//! - Workers read records through chunk ranges that never overlap.
//!
//! Calls that resolve immediately (creation outside a block, setup-phase
//! registration) must not race with `update`; the store has one driving
//! thread per tick.

use std::cell::UnsafeCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::Mutex;

use crate::engine::entity::{EntityLocation, EntityRef};
use crate::engine::entity_type::{EntityType, TypeHooks};
use crate::engine::error::EcsResult;
use crate::engine::query::EntityTypeIter;
use crate::engine::random::SeededRng;
use crate::engine::scheduler;
use crate::engine::storage::EntityArray;
use crate::engine::systems::System;
use crate::engine::types::{ArrayId, ComponentId, EntityId, WORKER_THREADS};
use crate::engine::worker::{spawn_workers, WorkQueue};

/// Notification hook invoked with an entity id during integration.
pub type NotifyFn = Box<dyn Fn(EntityId) + Send + Sync>;

/// A creation awaiting resolution at the next integration phase.
///
/// The index is provisional: growth or compaction may move the record before
/// the entry resolves.
struct PendingCreate {
    id: EntityId,
    array: ArrayId,
    index: usize,
}

/// State mutated only during setup or the single-threaded integration phase.
struct EcsState {
    entities_by_id: HashMap<EntityId, EntityLocation>,
    blocks: Vec<Vec<System>>,
}

/// The entity/component store and its scheduler.
pub struct Ecs {
    state: UnsafeCell<EcsState>,
    arrays: Mutex<Vec<Box<EntityArray>>>,
    to_create: Mutex<Vec<PendingCreate>>,
    to_delete: Mutex<Vec<EntityId>>,
    next_id: AtomicU64,
    in_block: AtomicBool,
    on_add: Option<NotifyFn>,
    on_delete: Option<NotifyFn>,
    rng: Mutex<SeededRng>,
    queue: Arc<WorkQueue>,
    workers: Vec<JoinHandle<()>>,
}

// SAFETY: interior state follows the phase discipline documented above; all
// cross-thread access during a tick goes through locks, atomics, or
// non-overlapping work chunks.
unsafe impl Sync for Ecs {}

impl Ecs {
    /// Creates a store with `seed` for its deterministic generator and spawns
    /// the worker pool.
    pub fn new(seed: u64) -> Self {
        let queue = WorkQueue::new();
        let workers = spawn_workers(&queue, WORKER_THREADS);
        Self {
            state: UnsafeCell::new(EcsState {
                entities_by_id: HashMap::new(),
                blocks: Vec::new(),
            }),
            arrays: Mutex::new(Vec::new()),
            to_create: Mutex::new(Vec::new()),
            to_delete: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            in_block: AtomicBool::new(false),
            on_add: None,
            on_delete: None,
            rng: Mutex::new(SeededRng::new(seed)),
            queue,
            workers,
        }
    }

    /// Installs the hook notified once per entity that materializes.
    ///
    /// Invoked during the integration phase (or immediately for out-of-block
    /// creation), never during parallel execution. The hook must not call
    /// back into structural store operations.
    pub fn set_on_add_entity(&mut self, hook: impl Fn(EntityId) + Send + Sync + 'static) {
        self.on_add = Some(Box::new(hook));
    }

    /// Installs the hook notified once per entity that is deleted.
    ///
    /// Same invocation rules as [`Self::set_on_add_entity`]. An entity
    /// created and deleted within one block fires neither hook.
    pub fn set_on_delete_entity(&mut self, hook: impl Fn(EntityId) + Send + Sync + 'static) {
        self.on_delete = Some(Box::new(hook));
    }

    /// Registers a schema: pure metadata construction, no storage yet.
    ///
    /// The backing array is created lazily when the first entity of this
    /// exact component set is created.
    pub fn create_entity_type(
        &self,
        name: &'static str,
        components: &[ComponentId],
        hooks: TypeHooks,
    ) -> EcsResult<EntityType> {
        EntityType::new(name, components, hooks)
    }

    /// Appends `system` to block `block_index`, growing the block list as
    /// needed.
    ///
    /// Registration order within a block and block order are both preserved;
    /// execution is deterministic with respect to them.
    pub fn register_system(&mut self, system: System, block_index: usize) {
        let state = self.state.get_mut();
        if state.blocks.len() <= block_index {
            state.blocks.resize_with(block_index + 1, Vec::new);
        }
        log::debug!(
            "system {} registered in block {}",
            system.name(),
            block_index
        );
        state.blocks[block_index].push(system);
    }

    /// Creates an entity of `entity_type`, returning its id.
    ///
    /// The record is zero-initialized with the id written into its header.
    /// Inside a block the creation is deferred: the entity resolves into the
    /// id map — and becomes visible to queries — at the next integration
    /// phase. Outside a block it resolves immediately.
    ///
    /// `creator` is the id of the creating entity, `0` for none; it is
    /// recorded for tracing only.
    pub fn create_entity(&self, entity_type: &EntityType, creator: EntityId) -> EntityId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (array_ptr, array_id) = self.array_for_exact(entity_type);
        // SAFETY: arrays are boxed and never dropped while the store lives.
        let array = unsafe { &*array_ptr };
        let index = array.create_record(id);
        log::trace!("entity {id} created by {creator} in array {array_id}");
        self.finish_creation(array, array_id, id, index);
        id
    }

    /// Clones `source`'s record into a fresh entity of the same schema,
    /// copying every component but not the id header. Same deferral rules as
    /// [`Self::create_entity`].
    ///
    /// ## Panics
    /// Panics if `source` is unknown.
    pub fn copy_entity(&self, source: EntityId, creator: EntityId) -> EntityId {
        let location = self
            .location_of(source)
            .unwrap_or_else(|| panic!("copy_entity: unknown entity {source}"));
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let array_ptr = self.array_ptr(location.array);
        // SAFETY: arrays are boxed and never dropped while the store lives.
        let array = unsafe { &*array_ptr };
        let index = array.create_record(id);
        array.copy_components(location.index, index);
        log::trace!("entity {id} copied from {source} by {creator}");
        self.finish_creation(array, location.array, id, index);
        id
    }

    /// Requests deletion of `id`. Always deferred to the next integration
    /// phase: the record stays visible to queries issued later in the same
    /// block and disappears before the next block begins.
    ///
    /// If `id` is itself pending creation in the current block, the pending
    /// entry is scrubbed and its reserved slot tombstoned: the entity never
    /// resolves and fires no notification.
    pub fn delete_entity(&self, id: EntityId) {
        {
            let mut to_create = self.to_create.lock();
            if let Some(position) = to_create.iter().position(|pending| pending.id == id) {
                let pending = to_create.remove(position);
                drop(to_create);
                // SAFETY: arrays are boxed and never dropped while the store
                // lives.
                let array = unsafe { &*self.array_ptr(pending.array) };
                array.tombstone(pending.index);
                log::trace!("entity {id} scrubbed: created and deleted within one block");
                return;
            }
        }
        self.to_delete.lock().push(id);
    }

    /// Resolves `id` to a record view.
    ///
    /// Resolution consults the id map and, during a block, the
    /// pending-creation list — so the creator of a mid-block entity can
    /// initialize its components before the entity materializes. Query
    /// iteration stays snapshot-based regardless: pending records are not
    /// dispatched to and not yielded by iterators.
    pub fn entity(&self, id: EntityId) -> Option<EntityRef<'_>> {
        let location = self.location_of(id)?;
        // SAFETY: arrays are boxed and never dropped while the store lives.
        let array = unsafe { &*self.array_ptr(location.array) };
        Some(EntityRef::new(array, location.index))
    }

    /// Number of entities currently resolved in the id map.
    pub fn entity_count(&self) -> usize {
        // SAFETY: as in [`Self::entity`].
        unsafe { &*self.state.get() }.entities_by_id.len()
    }

    /// Builds a snapshot iterator over every record whose schema is a
    /// superset of `query`. Arrays created after this call are not visible
    /// to the iterator.
    pub fn entities_of_type(&self, query: &EntityType) -> EntityTypeIter<'_> {
        let snapshot = self
            .matching_arrays(query)
            .into_iter()
            // SAFETY: arrays are boxed and never dropped while the store
            // lives; the borrow is tied to `&self`.
            .map(|(ptr, count)| (unsafe { &*ptr }, count))
            .collect();
        EntityTypeIter::new(snapshot)
    }

    /// Returns the array storing exactly `entity_type`'s component set, if
    /// one was ever created.
    pub fn entities_of_exact_type(&self, entity_type: &EntityType) -> Option<&EntityArray> {
        let arrays = self.arrays.lock();
        arrays
            .iter()
            .find(|array| array.entity_type().is_strictly_of_type(entity_type))
            // SAFETY: as in [`Self::entities_of_type`].
            .map(|array| unsafe { &*(&**array as *const EntityArray) })
    }

    /// Applies `op` to every record matching `query`, synchronously on the
    /// calling thread. Convenience path for callers outside the block/worker
    /// machinery; no chunking, no locking of the iterated arrays.
    pub fn for_each_entity(&self, query: &EntityType, mut op: impl FnMut(&Ecs, EntityRef<'_>)) {
        for record in self.entities_of_type(query) {
            op(self, record);
        }
    }

    /// Runs one simulation tick: every block in registration order, each
    /// followed by its integration phase.
    pub fn update(&self) {
        // SAFETY: the block list is stable during a tick (registration is a
        // setup-phase, `&mut self` operation).
        let block_count = unsafe { &*self.state.get() }.blocks.len();
        if block_count == 0 {
            // Deferred mutations are still honored once per tick.
            self.integrate();
            return;
        }
        for block_index in 0..block_count {
            self.in_block.store(true, Ordering::Release);
            {
                // SAFETY: shared view; state is not mutated until integration.
                let state = unsafe { &*self.state.get() };
                for system in &state.blocks[block_index] {
                    scheduler::dispatch(self, system);
                    self.queue.run_until_idle();
                }
            }
            self.in_block.store(false, Ordering::Release);
            self.integrate();
        }
    }

    /// Draws the next value from the store's deterministic generator.
    pub fn rand_u64(&self) -> u64 {
        self.rng.lock().next_u64()
    }

    /// Draws a value in `[0, bound)` from the store's deterministic
    /// generator.
    pub fn rand_below(&self, bound: u64) -> u64 {
        self.rng.lock().next_below(bound)
    }

    /// Arrays whose schema is a superset of `query` and whose published
    /// count is nonzero, paired with those counts.
    pub(crate) fn matching_arrays(&self, query: &EntityType) -> Vec<(*const EntityArray, usize)> {
        let arrays = self.arrays.lock();
        arrays
            .iter()
            .filter(|array| array.entity_type().is_entity_of_type(query))
            .map(|array| (&**array as *const EntityArray, array.published_count()))
            .filter(|&(_, count)| count > 0)
            .collect()
    }

    /// The shared work queue.
    pub(crate) fn queue(&self) -> &WorkQueue {
        &self.queue
    }

    /// Looks up the array storing exactly `entity_type`'s component set,
    /// creating it if this is a new exact schema.
    fn array_for_exact(&self, entity_type: &EntityType) -> (*const EntityArray, ArrayId) {
        let mut arrays = self.arrays.lock();
        if let Some((index, array)) = arrays
            .iter()
            .enumerate()
            .find(|(_, array)| array.entity_type().is_strictly_of_type(entity_type))
        {
            return (&**array as *const EntityArray, index as ArrayId);
        }
        let array_id = ArrayId::try_from(arrays.len()).expect("entity array capacity exceeded");
        arrays.push(EntityArray::new(array_id, entity_type.clone()));
        let array = arrays.last().expect("just pushed");
        (&**array as *const EntityArray, array_id)
    }

    /// Pointer to the array with id `array_id`.
    fn array_ptr(&self, array_id: ArrayId) -> *const EntityArray {
        let arrays = self.arrays.lock();
        &*arrays[array_id as usize] as *const EntityArray
    }

    /// Completes a creation: deferred into `to_create` mid-block, resolved
    /// immediately otherwise.
    fn finish_creation(&self, array: &EntityArray, array_id: ArrayId, id: EntityId, index: usize) {
        if self.in_block.load(Ordering::Acquire) {
            self.to_create.lock().push(PendingCreate {
                id,
                array: array_id,
                index,
            });
            return;
        }
        array.publish();
        // SAFETY: out-of-block resolution; the caller is the store's single
        // driving thread.
        let state = unsafe { &mut *self.state.get() };
        state.entities_by_id.insert(
            id,
            EntityLocation {
                array: array_id,
                index,
            },
        );
        if let Some(setup) = array.entity_type().on_create() {
            setup(id);
        }
        if let Some(notify) = &self.on_add {
            notify(id);
        }
    }

    /// Resolves a record location from the id map or the pending-creation
    /// list.
    fn location_of(&self, id: EntityId) -> Option<EntityLocation> {
        // SAFETY: as in [`Self::entity`].
        let state = unsafe { &*self.state.get() };
        if let Some(&location) = state.entities_by_id.get(&id) {
            return Some(location);
        }
        self.to_create
            .lock()
            .iter()
            .find(|pending| pending.id == id)
            .map(|pending| EntityLocation {
                array: pending.array,
                index: pending.index,
            })
    }

    /// The single-threaded integration phase: compaction, create resolution,
    /// deletions, creation notifications — in that order.
    fn integrate(&self) {
        // Snapshot array pointers so no lock is held while hooks run.
        let arrays: Vec<*const EntityArray> = self
            .arrays
            .lock()
            .iter()
            .map(|array| &**array as *const EntityArray)
            .collect();

        // SAFETY: no worker is active past the completion barrier; this is
        // the phase where exclusive state access is legal.
        let state = unsafe { &mut *self.state.get() };
        let mut to_create = std::mem::take(&mut *self.to_create.lock());

        // (a) Fold multi-segment growth back to one segment per array and
        // repoint every relocated record — resolved or still pending.
        for &array in &arrays {
            // SAFETY: arrays are boxed and never dropped while the store
            // lives.
            let array = unsafe { &*array };
            array.clean_up(|id, new_index| {
                if let Some(location) = state.entities_by_id.get_mut(&id) {
                    location.index = new_index;
                } else if let Some(pending) = to_create.iter_mut().find(|p| p.id == id) {
                    pending.index = new_index;
                }
            });
        }

        // (b) Resolve pending creations with the now-stable indices. Must
        // precede deletions: their swap-removes would invalidate these.
        let mut resolved = Vec::with_capacity(to_create.len());
        for pending in to_create.drain(..) {
            state.entities_by_id.insert(
                pending.id,
                EntityLocation {
                    array: pending.array,
                    index: pending.index,
                },
            );
            resolved.push((pending.id, pending.array));
        }

        // (c) Apply pending deletions.
        let to_delete = std::mem::take(&mut *self.to_delete.lock());
        for id in to_delete {
            let Some(location) = state.entities_by_id.remove(&id) else {
                continue;
            };
            // SAFETY: as above.
            let array = unsafe { &*arrays[location.array as usize] };
            if let Some(teardown) = array.entity_type().on_delete() {
                teardown(id);
            }
            array.swap_remove(location.index, |moved_id, new_index| {
                if let Some(moved) = state.entities_by_id.get_mut(&moved_id) {
                    moved.index = new_index;
                }
            });
            if let Some(notify) = &self.on_delete {
                notify(id);
            }
        }

        // (d) Creation notifications for every entity that materialized.
        for (id, array_id) in resolved {
            if !state.entities_by_id.contains_key(&id) {
                continue;
            }
            // SAFETY: as above.
            let array = unsafe { &*arrays[array_id as usize] };
            if let Some(setup) = array.entity_type().on_create() {
                setup(id);
            }
            if let Some(notify) = &self.on_add {
                notify(id);
            }
        }
    }
}

impl Drop for Ecs {
    fn drop(&mut self) {
        self.queue.shutdown();
        log::debug!("shutting down {} worker threads", self.workers.len());
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}
