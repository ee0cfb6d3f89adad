//! Per-tetrahedron neighbour slots.

use tetra_mesh::TetId;

use crate::error::{NeighbourError, Result};
use crate::partition::Block;

/// Neighbour through each local face, `None` for a boundary face.
pub type FaceSlots = [Option<TetId>; 4];

/// Neighbour table of a whole mesh, indexed by tetrahedron id.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Adjacency {
    slots: Vec<FaceSlots>,
    degrees: Vec<u8>,
}

impl Adjacency {
    /// Allocate an all-boundary table for `count` tetrahedra.
    pub(crate) fn allocate(count: usize) -> Result<Self> {
        let mut slots = Vec::new();
        let mut degrees = Vec::new();
        slots
            .try_reserve_exact(count)
            .and_then(|()| degrees.try_reserve_exact(count))
            .map_err(|_| NeighbourError::Allocation {
                what: "adjacency table",
                count,
            })?;
        slots.resize(count, [None; 4]);
        degrees.resize(count, 0);
        Ok(Self { slots, degrees })
    }

    /// Number of tetrahedra covered.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the table covers no tetrahedra.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Neighbours of `id` through its four local faces.
    pub fn neighbours(&self, id: TetId) -> &FaceSlots {
        &self.slots[id.index()]
    }

    /// Neighbour of `id` through local face `face`.
    pub fn neighbour(&self, id: TetId, face: usize) -> Option<TetId> {
        self.slots[id.index()][face]
    }

    /// Number of resolved faces of `id`.
    pub fn degree(&self, id: TetId) -> u8 {
        self.degrees[id.index()]
    }

    /// All entries in id order.
    pub fn iter(&self) -> impl Iterator<Item = (TetId, &FaceSlots)> + '_ {
        (1..=self.slots.len() as u32)
            .filter_map(TetId::new)
            .zip(&self.slots)
    }

    /// Split the table into one mutable view per block.
    ///
    /// `blocks` must be contiguous from tetrahedron `1` and cover the table,
    /// as produced by [`partition`](crate::partition::partition).
    pub(crate) fn split_blocks(&mut self, blocks: &[Block]) -> Vec<BlockSlots<'_>> {
        let mut slots = self.slots.as_mut_slice();
        let mut degrees = self.degrees.as_mut_slice();
        let mut views = Vec::with_capacity(blocks.len());

        for &block in blocks {
            let (block_slots, rest_slots) = std::mem::take(&mut slots).split_at_mut(block.len);
            let (block_degrees, rest_degrees) =
                std::mem::take(&mut degrees).split_at_mut(block.len);
            slots = rest_slots;
            degrees = rest_degrees;
            views.push(BlockSlots {
                block,
                slots: block_slots,
                degrees: block_degrees,
            });
        }
        debug_assert!(slots.is_empty(), "blocks must cover the adjacency table");

        views
    }
}

/// Mutable window over the slots of one block.
///
/// This is the whole write scope of a worker: both phases only ever record
/// neighbours of tetrahedra inside `block`.
#[derive(Debug)]
pub(crate) struct BlockSlots<'a> {
    pub block: Block,
    slots: &'a mut [FaceSlots],
    degrees: &'a mut [u8],
}

impl BlockSlots<'_> {
    pub fn neighbour(&self, id: TetId, face: usize) -> Option<TetId> {
        self.slots[self.block.offset(id)][face]
    }

    pub fn degree(&self, id: TetId) -> u8 {
        self.degrees[self.block.offset(id)]
    }

    /// Record `neighbour` behind local face `face` of `id`.
    pub fn link(&mut self, id: TetId, face: usize, neighbour: TetId) {
        let offset = self.block.offset(id);
        self.slots[offset][face] = Some(neighbour);
        self.degrees[offset] += 1;
    }
}
