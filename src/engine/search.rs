//! Synchronous substring search over the row/column grid.
//!
//! Searches run on the caller's thread and load chunks on demand through the
//! same lock the prefetch worker uses. On a large file that has not been
//! indexed yet they block until a hit, a miss, or the end of the file.

use super::cache::Chunk;
use super::loader::ChunkStatus;
use super::worker::Shared;

/// Location of a match: data row, column, and byte offset within the cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchHit {
    pub row: usize,
    pub column: usize,
    pub offset: usize,
}

/// First hit at or after `from_row`, rows in order then columns left to right.
fn first_match(chunk: &Chunk, pattern: &str, from_row: usize) -> Option<SearchHit> {
    chunk
        .numbered_rows()
        .filter(|(row, _)| *row >= from_row)
        .find_map(|(row, cells)| {
            cells.iter().enumerate().find_map(|(column, cell)| {
                cell.find(pattern).map(|offset| SearchHit {
                    row,
                    column,
                    offset,
                })
            })
        })
}

/// Last row holding a hit at or before `upto_row`; within that row the
/// leftmost matching column, at the last occurrence in the cell.
fn last_match(chunk: &Chunk, pattern: &str, upto_row: usize) -> Option<SearchHit> {
    chunk
        .numbered_rows()
        .rev()
        .filter(|(row, _)| *row <= upto_row)
        .find_map(|(row, cells)| {
            cells.iter().enumerate().find_map(|(column, cell)| {
                cell.rfind(pattern).map(|offset| SearchHit {
                    row,
                    column,
                    offset,
                })
            })
        })
}

/// Load `chunk_idx` and run `scan` over it while the lock is held.
fn scan_chunk(
    shared: &Shared,
    chunk_idx: usize,
    scan: impl FnOnce(&Chunk) -> Option<SearchHit>,
) -> (ChunkStatus, Option<SearchHit>) {
    let (status, hit) = {
        let mut state = shared.lock();
        let status = state.load_chunk(chunk_idx);
        let hit = match status {
            ChunkStatus::Missing => None,
            _ => state.cache.peek(chunk_idx).and_then(scan),
        };
        (status, hit)
    };
    if status == ChunkStatus::Loaded {
        shared.notify_data_ready();
    }
    (status, hit)
}

pub(crate) fn find_next(shared: &Shared, pattern: &str, start_row: usize) -> Option<SearchHit> {
    if pattern.is_empty() {
        return None;
    }
    let mut chunk_idx = start_row / shared.chunk_size;
    loop {
        let (status, hit) = scan_chunk(shared, chunk_idx, |chunk| {
            first_match(chunk, pattern, start_row)
        });
        if hit.is_some() {
            return hit;
        }
        // running off the end has finalized the row count
        if status == ChunkStatus::Missing {
            return None;
        }
        chunk_idx += 1;
    }
}

pub(crate) fn find_prev(shared: &Shared, pattern: &str, start_row: usize) -> Option<SearchHit> {
    if pattern.is_empty() {
        return None;
    }
    // a full scan when the end is not known yet
    let total = shared.lock().ensure_row_count_known();
    let last_row = total.checked_sub(1)?;
    let start_row = start_row.min(last_row);

    let mut chunk_idx = start_row / shared.chunk_size;
    loop {
        let (_, hit) = scan_chunk(shared, chunk_idx, |chunk| {
            last_match(chunk, pattern, start_row)
        });
        if hit.is_some() {
            return hit;
        }
        if chunk_idx == 0 {
            return None;
        }
        chunk_idx -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(start_row: usize, rows: &[&[&str]]) -> Chunk {
        Chunk {
            start_row,
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn test_first_match_order() {
        let c = chunk(10, &[&["x", "y"], &["foo", "bar foo"], &["a", "foo"]]);
        assert_eq!(
            first_match(&c, "foo", 0),
            Some(SearchHit {
                row: 11,
                column: 0,
                offset: 0
            })
        );
        assert_eq!(
            first_match(&c, "foo", 12),
            Some(SearchHit {
                row: 12,
                column: 1,
                offset: 0
            })
        );
        assert_eq!(first_match(&c, "foo", 13), None);
        assert_eq!(first_match(&c, "zzz", 0), None);
    }

    #[test]
    fn test_last_match_order() {
        let c = chunk(0, &[&["foo", "x"], &["a", "foo foo"], &["b", "c"]]);
        // row 1 is the last row with a hit; the last occurrence in the cell wins
        assert_eq!(
            last_match(&c, "foo", 2),
            Some(SearchHit {
                row: 1,
                column: 1,
                offset: 4
            })
        );
        assert_eq!(
            last_match(&c, "foo", 0),
            Some(SearchHit {
                row: 0,
                column: 0,
                offset: 0
            })
        );
    }

    #[test]
    fn test_last_match_prefers_leftmost_column() {
        let c = chunk(0, &[&["foo", "foo"]]);
        assert_eq!(last_match(&c, "foo", 0).map(|h| h.column), Some(0));
    }

    #[test]
    fn test_offset_is_byte_offset() {
        let c = chunk(0, &[&["héllo wörld"]]);
        assert_eq!(first_match(&c, "wörld", 0).map(|h| h.offset), Some(7));
    }
}
