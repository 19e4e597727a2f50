//! Bounded chunk cache with least-recently-used eviction.

use std::collections::{HashMap, VecDeque};
use tracing::trace;

use super::Row;

/// A batch of consecutive parsed rows starting at `start_row`.
///
/// Holds fewer than `chunk_size` rows only when it is the final chunk of the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub start_row: usize,
    pub rows: Vec<Row>,
}

impl Chunk {
    /// Row at absolute index `row`, if this chunk holds it.
    pub fn row(&self, row: usize) -> Option<&Row> {
        row.checked_sub(self.start_row)
            .and_then(|offset| self.rows.get(offset))
    }

    /// Rows paired with their absolute index.
    pub fn numbered_rows(&self) -> impl DoubleEndedIterator<Item = (usize, &Row)> + '_ {
        self.rows
            .iter()
            .enumerate()
            .map(move |(i, row)| (self.start_row + i, row))
    }
}

/// Map of chunk index to chunk plus an explicit recency list (front = most recent).
///
/// Residency is only a performance matter: an evicted chunk is reloaded on demand.
pub struct ChunkCache {
    max_chunks: usize,
    chunks: HashMap<usize, Chunk>,
    recency: VecDeque<usize>,
}

impl ChunkCache {
    pub fn new(max_chunks: usize) -> Self {
        let max_chunks = max_chunks.max(1);
        Self {
            max_chunks,
            chunks: HashMap::with_capacity(max_chunks + 1),
            recency: VecDeque::with_capacity(max_chunks + 1),
        }
    }

    /// Look up a chunk without affecting recency.
    pub fn peek(&self, chunk_idx: usize) -> Option<&Chunk> {
        self.chunks.get(&chunk_idx)
    }

    pub fn contains(&self, chunk_idx: usize) -> bool {
        self.chunks.contains_key(&chunk_idx)
    }

    /// Move a resident chunk to the front of the recency list.
    /// Returns false when the chunk is not resident.
    pub fn touch(&mut self, chunk_idx: usize) -> bool {
        if !self.chunks.contains_key(&chunk_idx) {
            return false;
        }
        if self.recency.front() != Some(&chunk_idx) {
            if let Some(pos) = self.recency.iter().position(|&idx| idx == chunk_idx) {
                self.recency.remove(pos);
            }
            self.recency.push_front(chunk_idx);
        }
        true
    }

    /// Insert (or replace) a chunk as most recently used, evicting from the
    /// back until the budget holds. Returns the evicted chunk indices.
    pub fn insert(&mut self, chunk_idx: usize, chunk: Chunk) -> Vec<usize> {
        self.chunks.insert(chunk_idx, chunk);
        self.touch(chunk_idx);

        let mut evicted = Vec::new();
        while self.chunks.len() > self.max_chunks {
            let Some(victim) = self.recency.pop_back() else {
                break;
            };
            self.chunks.remove(&victim);
            trace!(chunk = victim, "evicted chunk");
            evicted.push(victim);
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn max_chunks(&self) -> usize {
        self.max_chunks
    }

    /// Chunk indices from most to least recently used.
    pub fn recency(&self) -> impl Iterator<Item = usize> + '_ {
        self.recency.iter().copied()
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
        self.recency.clear();
    }
}
