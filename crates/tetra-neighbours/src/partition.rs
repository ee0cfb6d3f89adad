//! Static partition of the tetrahedron range into worker blocks.

use tetra_mesh::TetId;

/// Number of overflow records reserved per hash bucket.
pub const OVERFLOW_FACTOR: usize = 4;

/// A contiguous range of tetrahedra owned by one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    /// Worker that owns the block.
    pub worker: usize,
    /// 1-based index of the first tetrahedron.
    pub first: u32,
    /// Number of tetrahedra.
    pub len: usize,
}

impl Block {
    /// 1-based index of the last tetrahedron, `first - 1` when empty.
    pub fn last(&self) -> u32 {
        self.first + self.len as u32 - 1
    }

    /// Whether the block holds no tetrahedra.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether tetrahedron `id` belongs to the block.
    pub fn contains(&self, id: TetId) -> bool {
        id.get() >= self.first && ((id.get() - self.first) as usize) < self.len
    }

    /// Position of `id` inside the block.
    pub fn offset(&self, id: TetId) -> usize {
        debug_assert!(self.contains(id), "tetrahedron {id} outside block {self:?}");
        (id.get() - self.first) as usize
    }

    /// Ids of the block's tetrahedra in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = TetId> {
        (self.first..self.first + self.len as u32).filter_map(TetId::new)
    }

    /// Hash table size for this block: the next power of two at or above
    /// twice the block length.
    pub fn table_size(&self) -> usize {
        (2 * self.len).max(1).next_power_of_two()
    }
}

/// Split tetrahedra `1..=count` into `workers` blocks.
///
/// With `B = ceil(count / workers)`, worker `w` owns `[w*B + 1, (w+1)*B]`
/// clamped to `count`. Blocks are contiguous, disjoint and cover the whole
/// range; trailing workers get empty blocks when `workers > count`.
pub fn partition(count: usize, workers: usize) -> Vec<Block> {
    let workers = workers.max(1);
    let chunk = count.div_ceil(workers);

    (0..workers)
        .map(|worker| {
            let start = (worker * chunk).min(count);
            let end = ((worker + 1) * chunk).min(count);
            Block {
                worker,
                first: start as u32 + 1,
                len: end - start,
            }
        })
        .collect()
}
