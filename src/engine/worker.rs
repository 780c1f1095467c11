//! The worker pool: a shared work queue and its completion barrier.
//!
//! A fixed pool of OS threads, plus the calling thread, cooperates through
//! one mutex-guarded FIFO of [`WorkItem`]s. Each item names a system
//! function, a target array, and a half-open index range; it is queued and
//! consumed exactly once, by whichever thread gets to it first.
//!
//! ## Completion barrier
//!
//! Draining uses a counted barrier instead of a busy/yield loop: the queue
//! tracks outstanding items (queued plus in flight), idle workers block on a
//! condvar, and [`WorkQueue::run_until_idle`] first drains items on the
//! calling thread itself — the "main-thread worker" — then sleeps until the
//! outstanding count reaches zero. The ordering guarantees are unchanged:
//! any free worker may take any queued chunk, and within one chunk indices
//! are processed strictly in increasing order.
//!
//! ## Failure
//!
//! A panic inside a work item would otherwise strand the barrier, so it is
//! treated as fatal: the panic is logged and the process aborts. Continuing
//! past it would silently corrupt game state.
//!
//! ## Cancellation
//!
//! Worker threads are torn down only at store destruction, via a shutdown
//! flag checked between items. There is no draining or graceful stop for an
//! in-progress tick.

use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::{Condvar, Mutex};

use crate::engine::entity::EntityRef;
use crate::engine::manager::Ecs;
use crate::engine::storage::EntityArray;
use crate::engine::systems::SystemFn;

/// An immutable description of one unit of parallel work: run a system
/// function over `[start, end)` of one array.
pub(crate) struct WorkItem {
    /// The store the system function receives.
    pub ecs: *const Ecs,
    /// Target array.
    pub array: *const EntityArray,
    /// First record index, inclusive.
    pub start: usize,
    /// Last record index, exclusive.
    pub end: usize,
    /// System function to apply.
    pub run: SystemFn,
}

// SAFETY: the pointers refer to the store and an array it owns, both alive
// and pinned for the duration of the tick that queued the item. Chunks from
// one array never overlap in index range, so concurrent execution never
// touches the same record.
unsafe impl Send for WorkItem {}

struct QueueState {
    items: VecDeque<WorkItem>,
    /// Items queued or currently executing.
    outstanding: usize,
    shutdown: bool,
}

/// Mutex-guarded FIFO of work items shared by the pool and the main thread.
pub(crate) struct WorkQueue {
    state: Mutex<QueueState>,
    /// Signals queued work to sleeping workers.
    work_ready: Condvar,
    /// Signals the outstanding count reaching zero.
    drained: Condvar,
}

impl WorkQueue {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                outstanding: 0,
                shutdown: false,
            }),
            work_ready: Condvar::new(),
            drained: Condvar::new(),
        })
    }

    /// Queues a batch of work items.
    pub(crate) fn push_batch(&self, batch: impl IntoIterator<Item = WorkItem>) {
        let mut state = self.state.lock();
        let before = state.items.len();
        state.items.extend(batch);
        state.outstanding += state.items.len() - before;
        drop(state);
        self.work_ready.notify_all();
    }

    /// Pops one item without blocking.
    fn try_pop(&self) -> Option<WorkItem> {
        self.state.lock().items.pop_front()
    }

    /// Marks one item finished, waking the barrier when the count drains.
    fn finish_one(&self) {
        let mut state = self.state.lock();
        state.outstanding -= 1;
        if state.outstanding == 0 {
            drop(state);
            self.drained.notify_all();
        }
    }

    /// Drains the queue on the calling thread, then blocks until every item
    /// — including those claimed by workers — has finished.
    ///
    /// This is the per-dispatch completion barrier: when it returns, no
    /// worker is touching any record.
    pub(crate) fn run_until_idle(&self) {
        while let Some(item) = self.try_pop() {
            execute(&item);
            self.finish_one();
        }
        let mut state = self.state.lock();
        while state.outstanding > 0 {
            self.drained.wait(&mut state);
        }
    }

    /// Flags shutdown and wakes every sleeping worker.
    pub(crate) fn shutdown(&self) {
        self.state.lock().shutdown = true;
        self.work_ready.notify_all();
    }
}

/// Spawns the dedicated worker threads for `queue`.
pub(crate) fn spawn_workers(queue: &Arc<WorkQueue>, count: usize) -> Vec<JoinHandle<()>> {
    log::debug!("spawning {count} worker threads");
    (0..count)
        .map(|worker_index| {
            let queue = Arc::clone(queue);
            std::thread::Builder::new()
                .name(format!("ecs-worker-{worker_index}"))
                .spawn(move || worker_loop(&queue))
                .expect("failed to spawn worker thread")
        })
        .collect()
}

/// Body of one dedicated worker: pull items until shutdown.
fn worker_loop(queue: &WorkQueue) {
    loop {
        let item = {
            let mut state = queue.state.lock();
            loop {
                if state.shutdown {
                    return;
                }
                if let Some(item) = state.items.pop_front() {
                    break item;
                }
                queue.work_ready.wait(&mut state);
            }
        };
        execute(&item);
        queue.finish_one();
    }
}

/// Runs a work item: the system function over every record in its range,
/// in increasing index order. Tombstoned slots are skipped.
fn execute(item: &WorkItem) {
    let result = catch_unwind(AssertUnwindSafe(|| {
        // SAFETY: the store and array outlive the tick that queued this item,
        // and this range is the item's exclusive property.
        let (ecs, array) = unsafe { (&*item.ecs, &*item.array) };
        for index in item.start..item.end {
            let record = EntityRef::new(array, index);
            if record.is_live() {
                (item.run)(ecs, record);
            }
        }
    }));
    if result.is_err() {
        log::error!("system function panicked inside a work item; aborting");
        std::process::abort();
    }
}
