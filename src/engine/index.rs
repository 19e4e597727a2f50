//! Sparse chunk-number to byte-offset table, grown lazily.

use std::io::{self, BufRead, Seek, SeekFrom};
use tracing::debug;

use super::RowCountState;

/// Entry `i` is the byte offset of the first row of chunk `i`.
///
/// Append-only and strictly increasing. Entry 0 (the first data row, right
/// after the header) exists from the moment the file is opened.
#[derive(Debug, Clone)]
pub struct LineIndex {
    offsets: Vec<u64>,
}

impl LineIndex {
    pub fn new(data_offset: u64) -> Self {
        Self {
            offsets: vec![data_offset],
        }
    }

    pub fn get(&self, chunk_idx: usize) -> Option<u64> {
        self.offsets.get(chunk_idx).copied()
    }

    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    /// Record the start offset of `chunk_idx` once its predecessor has been
    /// fully read. Only the next unindexed chunk can be recorded.
    pub fn record(&mut self, chunk_idx: usize, offset: u64) {
        if chunk_idx == self.offsets.len() {
            self.push(offset);
        } else {
            debug_assert!(
                self.get(chunk_idx).map_or(true, |known| known == offset),
                "chunk {chunk_idx} re-indexed at a different offset"
            );
        }
    }

    fn push(&mut self, offset: u64) {
        debug_assert!(
            self.offsets.last().map_or(true, |&last| offset > last),
            "line index must be strictly increasing"
        );
        self.offsets.push(offset);
    }

    /// Byte offset of `chunk_idx`, scanning forward from the last indexed
    /// boundary if needed.
    ///
    /// Returns `Ok(None)` when the chunk lies past the end of the file. Reaching
    /// EOF during the scan finalizes `rows`. Each byte is scanned at most once
    /// over the life of the index.
    pub fn resolve<R: BufRead + Seek>(
        &mut self,
        reader: &mut R,
        chunk_idx: usize,
        chunk_size: usize,
        rows: &mut RowCountState,
    ) -> io::Result<Option<u64>> {
        if let RowCountState::Known(total) = *rows {
            if chunk_idx.saturating_mul(chunk_size) >= total {
                return Ok(None);
            }
        }
        if let Some(offset) = self.get(chunk_idx) {
            return Ok(Some(offset));
        }

        let mut known = self.offsets.len() - 1;
        let mut offset = self.offsets[known];
        reader.seek(SeekFrom::Start(offset))?;

        let mut line = Vec::new();
        while known < chunk_idx {
            let mut lines = 0;
            while lines < chunk_size {
                line.clear();
                let read = reader.read_until(b'\n', &mut line)?;
                if read == 0 {
                    break;
                }
                offset += read as u64;
                lines += 1;
            }
            if lines < chunk_size {
                let total = known * chunk_size + lines;
                rows.finalize(total);
                debug!(rows = total, "reached end of file while indexing");
                return Ok(None);
            }
            known += 1;
            self.push(offset);
            rows.raise(known * chunk_size);
        }
        Ok(Some(offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn data(lines: usize) -> Cursor<Vec<u8>> {
        let mut text = String::from("h1,h2\n");
        for i in 0..lines {
            text.push_str(&format!("{i},{}\n", i * 2));
        }
        Cursor::new(text.into_bytes())
    }

    #[test]
    fn test_resolve_indexed_chunk_without_io() {
        let mut index = LineIndex::new(6);
        let mut rows = RowCountState::default();
        let mut empty = Cursor::new(Vec::new());
        assert_eq!(index.resolve(&mut empty, 0, 10, &mut rows).unwrap(), Some(6));
    }

    #[test]
    fn test_resolve_scans_forward() {
        let mut reader = data(25);
        let mut index = LineIndex::new(6);
        let mut rows = RowCountState::default();

        let offset = index.resolve(&mut reader, 2, 10, &mut rows).unwrap();
        assert_eq!(index.offsets().len(), 3);
        assert_eq!(offset, index.get(2));
        assert_eq!(rows, RowCountState::LowerBound(20));

        // offset of chunk 2 is the start of the line "20,40"
        let bytes = reader.get_ref();
        let start = offset.unwrap() as usize;
        assert!(bytes[start..].starts_with(b"20,40\n"));
    }

    #[test]
    fn test_resolve_past_end_finalizes() {
        let mut reader = data(25);
        let mut index = LineIndex::new(6);
        let mut rows = RowCountState::default();

        assert_eq!(index.resolve(&mut reader, 7, 10, &mut rows).unwrap(), None);
        assert_eq!(rows, RowCountState::Known(25));
        assert_eq!(index.offsets().len(), 3);

        // further lookups past the end do no I/O and still report no chunk
        let mut empty = Cursor::new(Vec::new());
        assert_eq!(index.resolve(&mut empty, 3, 10, &mut rows).unwrap(), None);
        assert_eq!(index.resolve(&mut empty, 1, 10, &mut rows).unwrap(), index.get(1));
    }

    #[test]
    fn test_resolve_exact_multiple() {
        let mut reader = data(20);
        let mut index = LineIndex::new(6);
        let mut rows = RowCountState::default();

        // chunk 2 starts exactly at EOF; it is indexed but holds no rows
        assert!(index.resolve(&mut reader, 2, 10, &mut rows).unwrap().is_some());
        assert!(!rows.is_known());
        assert_eq!(index.resolve(&mut reader, 3, 10, &mut rows).unwrap(), None);
        assert_eq!(rows, RowCountState::Known(20));
    }

    #[test]
    fn test_offsets_strictly_increasing() {
        let mut reader = data(95);
        let mut index = LineIndex::new(6);
        let mut rows = RowCountState::default();
        index.resolve(&mut reader, 100, 7, &mut rows).unwrap();
        assert!(index.offsets().windows(2).all(|w| w[0] < w[1]));
        assert_eq!(rows, RowCountState::Known(95));
    }

    #[test]
    fn test_last_line_without_newline() {
        let mut reader = Cursor::new(b"h\n1\n2\n3".to_vec());
        let mut index = LineIndex::new(2);
        let mut rows = RowCountState::default();
        assert_eq!(index.resolve(&mut reader, 1, 2, &mut rows).unwrap(), Some(6));
        assert_eq!(index.resolve(&mut reader, 2, 2, &mut rows).unwrap(), None);
        assert_eq!(rows, RowCountState::Known(3));
    }

    #[test]
    fn test_record_only_appends_next() {
        let mut index = LineIndex::new(0);
        index.record(1, 10);
        index.record(3, 30);
        assert_eq!(index.offsets(), &[0, 10]);
        index.record(1, 10);
        assert_eq!(index.offsets().len(), 2);
    }
}
