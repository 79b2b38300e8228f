//! Deterministic sharding of the selected build list.
//!
//! Parallelism here is horizontal: the CI system launches N independent
//! processes with the same inputs and distinct 1-based indices, and each
//! process builds only its own contiguous slice. The assignment is a pure
//! function of (list length, shard count, shard index), so two processes
//! never claim the same unit.

use anyhow::{Result, bail};

/// Half-open element range `[start, end)` owned by one shard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardRange {
    pub start: usize,
    pub end: usize,
}

impl ShardRange {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Compute the contiguous, size-balanced range for shard `index` (1-based)
/// out of `count` over a list of `len` elements. The first `len % count`
/// shards get one extra element, so shard sizes differ by at most one and
/// concatenating the shards in index order reproduces the whole list.
pub fn shard_range(len: usize, count: usize, index: usize) -> Result<ShardRange> {
    if count == 0 {
        bail!("--parallel-count must be at least 1");
    }
    if index == 0 || index > count {
        bail!(
            "--parallel-index {} is out of range [1, {}]",
            index,
            count
        );
    }

    let base = len / count;
    let extra = len % count;
    let i = index - 1;

    // Shards before this one: `min(i, extra)` of them carry base+1 elements.
    let start = i * base + i.min(extra);
    let size = base + usize::from(i < extra);
    Ok(ShardRange {
        start,
        end: start + size,
    })
}

/// Slice out the shard owned by (index of count) from the selected list.
pub fn take_shard<T: Clone>(items: &[T], count: usize, index: usize) -> Result<Vec<T>> {
    let range = shard_range(items.len(), count, index)?;
    Ok(items[range.start..range.end].to_vec())
}
