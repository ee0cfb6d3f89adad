//! Open-addressing face hash table with chained overflow records.
//!
//! The first `size` records are the buckets; every record past them is an
//! overflow record appended when a bucket's chain ends without a match.
//! A table is built by exactly one worker (Phase 1) and only read afterwards
//! (Phase 2), so it needs no synchronisation.

use tetra_mesh::{FaceKey, TetId};

use crate::error::{NeighbourError, Result};
use crate::partition::{Block, OVERFLOW_FACTOR};

#[derive(Debug, Clone, Copy)]
struct FaceRecord {
    /// Owning tetrahedron, `None` for an empty bucket.
    owner: Option<TetId>,
    face: u8,
    /// Set once a second tetrahedron matched this face.
    paired: bool,
    key: FaceKey,
    next: Option<usize>,
}

impl FaceRecord {
    const EMPTY: Self = Self {
        owner: None,
        face: 0,
        paired: false,
        key: FaceKey {
            min: 0,
            mid: 0,
            max: 0,
        },
        next: None,
    };

    fn new(key: FaceKey, owner: TetId, face: usize) -> Self {
        Self {
            owner: Some(owner),
            face: face as u8,
            paired: false,
            key,
            next: None,
        }
    }
}

/// A face found in a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FaceMatch {
    /// Tetrahedron that inserted the face.
    pub tet: TetId,
    /// Its local face id.
    pub face: usize,
    /// Whether a second tetrahedron of the same block already matched it.
    pub paired: bool,
}

/// Outcome of [`FaceTable::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Insertion {
    /// The face was new and is now stored.
    Stored,
    /// The face was already stored by another tetrahedron.
    Matched(FaceMatch),
}

/// Face hash table of one worker block.
#[derive(Debug)]
pub(crate) struct FaceTable {
    records: Vec<FaceRecord>,
    mask: usize,
    pairs: usize,
}

impl FaceTable {
    /// Allocate the table for `block`, reserving the overflow area up front.
    pub fn for_block(block: &Block) -> Result<Self> {
        let size = block.table_size();
        let capacity = size * (1 + OVERFLOW_FACTOR);
        let mut records = Vec::new();
        records
            .try_reserve_exact(capacity)
            .map_err(|_| NeighbourError::Allocation {
                what: "face hash table",
                count: capacity,
            })?;
        records.resize(size, FaceRecord::EMPTY);

        Ok(Self {
            records,
            mask: size - 1,
            pairs: 0,
        })
    }

    /// Number of buckets.
    pub fn size(&self) -> usize {
        self.mask + 1
    }

    /// Number of overflow records in use.
    pub fn overflow_len(&self) -> usize {
        self.records.len() - self.size()
    }

    /// Number of faces matched by two tetrahedra of this table's block.
    pub fn pairs(&self) -> usize {
        self.pairs
    }

    /// Store face `face` of `owner`, or match it against the same face
    /// stored earlier by another tetrahedron.
    ///
    /// Fails with [`NeighbourError::NonManifoldFace`] when the stored face
    /// was already matched once.
    pub fn insert(&mut self, key: FaceKey, owner: TetId, face: usize) -> Result<Insertion> {
        let mut pos = key.bucket(self.mask);
        if self.records[pos].owner.is_none() {
            self.records[pos] = FaceRecord::new(key, owner, face);
            return Ok(Insertion::Stored);
        }

        loop {
            let record = &mut self.records[pos];
            if let (Some(tet), true) = (record.owner, record.key == key) {
                if record.paired {
                    return Err(NeighbourError::NonManifoldFace {
                        tet: owner.get(),
                        vertices: key.vertices(),
                    });
                }
                record.paired = true;
                self.pairs += 1;
                return Ok(Insertion::Matched(FaceMatch {
                    tet,
                    face: record.face as usize,
                    paired: false,
                }));
            }

            match record.next {
                Some(next) => pos = next,
                None => {
                    let slot = self.records.len();
                    debug_assert!(
                        slot < self.records.capacity(),
                        "overflow area exhausted"
                    );
                    self.records[pos].next = Some(slot);
                    self.records.push(FaceRecord::new(key, owner, face));
                    return Ok(Insertion::Stored);
                }
            }
        }
    }

    /// Look a face up without modifying the table.
    pub fn find(&self, key: FaceKey) -> Option<FaceMatch> {
        let mut pos = key.bucket(self.mask);
        loop {
            let record = &self.records[pos];
            let tet = record.owner?;
            if record.key == key {
                return Some(FaceMatch {
                    tet,
                    face: record.face as usize,
                    paired: record.paired,
                });
            }
            pos = record.next?;
        }
    }
}
