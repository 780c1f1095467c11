//! Chunked dispatch of systems over matching arrays.
//!
//! For a system and the set of arrays whose schema is a superset of its
//! query, the dispatcher partitions each array's published `[0, count)` range
//! into fixed-size chunks and queues one work item per chunk. Partitioning is
//! exact: the union of the dispatched ranges covers every record once, with
//! no gaps, overlaps, or duplicates — the property the data-race-freedom
//! argument rests on.
//!
//! Systems are dispatched one at a time and drained to quiescence before the
//! next system in the block runs, preserving registration order.

use crate::engine::manager::Ecs;
use crate::engine::systems::System;
use crate::engine::types::CHUNK_SIZE;
use crate::engine::worker::WorkItem;

/// Partitions `[0, count)` into half-open ranges of at most `chunk_size`.
pub(crate) fn chunk_ranges(count: usize, chunk_size: usize) -> Vec<(usize, usize)> {
    debug_assert!(chunk_size > 0);
    let mut ranges = Vec::with_capacity(count.div_ceil(chunk_size));
    let mut start = 0;
    while start < count {
        let end = (start + chunk_size).min(count);
        ranges.push((start, end));
        start = end;
    }
    ranges
}

/// Queues one work item per chunk of every array matching `system`'s query.
///
/// Array counts are the published snapshots taken at the start of the current
/// block; records created mid-block are not dispatched to.
pub(crate) fn dispatch(ecs: &Ecs, system: &System) {
    let mut items = Vec::new();
    for (array, count) in ecs.matching_arrays(system.query()) {
        for (start, end) in chunk_ranges(count, CHUNK_SIZE) {
            items.push(WorkItem {
                ecs,
                array,
                start,
                end,
                run: system.run_fn(),
            });
        }
    }
    if items.is_empty() {
        return;
    }
    log::trace!(
        "dispatching system {} as {} work items",
        system.name(),
        items.len()
    );
    ecs.queue().push_batch(items);
}
