//! Reading and parsing one chunk of rows.

use std::io::{self, BufRead, Seek, SeekFrom};
use tracing::{debug, warn};

use super::cache::Chunk;
use super::error::LoadError;
use super::{Row, State};

/// Outcome of asking for a chunk to be resident.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChunkStatus {
    /// Already cached.
    Resident,
    /// Read from disk and inserted into the cache.
    Loaded,
    /// Past the end of the data, or unreadable.
    Missing,
}

/// Strip a trailing `\n` and then a trailing `\r`.
pub fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Split one physical line on `delimiter`. No quoting rules apply.
pub fn split_line(line: &[u8], delimiter: u8) -> Row {
    trim_line_ending(line)
        .split(|&b| b == delimiter)
        .map(|field| String::from_utf8_lossy(field).into_owned())
        .collect()
}

pub(crate) struct ReadChunk {
    pub chunk: Chunk,
    /// Offset just past the last line read.
    pub next_offset: u64,
}

/// Read up to `chunk_size` lines starting at byte `offset`.
pub(crate) fn read_chunk<R: BufRead + Seek>(
    reader: &mut R,
    offset: u64,
    start_row: usize,
    chunk_size: usize,
    delimiter: u8,
) -> io::Result<ReadChunk> {
    // sequential loads continue where the previous one stopped
    if reader.stream_position()? != offset {
        reader.seek(SeekFrom::Start(offset))?;
    }

    let mut rows = Vec::with_capacity(chunk_size);
    let mut next_offset = offset;
    let mut line = Vec::new();
    while rows.len() < chunk_size {
        line.clear();
        let read = reader.read_until(b'\n', &mut line)?;
        if read == 0 {
            break;
        }
        next_offset += read as u64;
        rows.push(split_line(&line, delimiter));
    }

    Ok(ReadChunk {
        chunk: Chunk { start_row, rows },
        next_offset,
    })
}

impl State {
    /// Byte offset of `chunk_idx`, growing the line index as needed.
    pub(crate) fn resolve_offset(&mut self, chunk_idx: usize) -> Result<Option<u64>, LoadError> {
        let reader = self.source.as_mut().ok_or(LoadError::Closed)?;
        Ok(self
            .index
            .resolve(reader, chunk_idx, self.chunk_size, &mut self.rows)?)
    }

    /// Make `chunk_idx` resident, reading it from disk on a cache miss.
    ///
    /// A read failure is treated as the end of the data: the row count is
    /// capped at what has been seen and the chunk is never retried.
    pub(crate) fn load_chunk(&mut self, chunk_idx: usize) -> ChunkStatus {
        if self.cache.touch(chunk_idx) {
            return ChunkStatus::Resident;
        }
        if self.failed_from.is_some_and(|failed| chunk_idx >= failed) {
            return ChunkStatus::Missing;
        }

        match self.read_chunk_at(chunk_idx) {
            Ok(Some(chunk)) => {
                debug!(
                    chunk = chunk_idx,
                    rows = chunk.rows.len(),
                    "loaded chunk"
                );
                self.cache.insert(chunk_idx, chunk);
                ChunkStatus::Loaded
            }
            Ok(None) => ChunkStatus::Missing,
            Err(e) => {
                warn!(chunk = chunk_idx, error = %e, "chunk load failed; treating as end of data");
                self.failed_from = Some(self.failed_from.map_or(chunk_idx, |f| f.min(chunk_idx)));
                let seen = self.rows.value();
                self.rows.finalize(seen);
                ChunkStatus::Missing
            }
        }
    }

    fn read_chunk_at(&mut self, chunk_idx: usize) -> Result<Option<Chunk>, LoadError> {
        let Some(offset) = self.resolve_offset(chunk_idx)? else {
            return Ok(None);
        };
        let chunk_size = self.chunk_size;
        let start_row = chunk_idx * chunk_size;
        let reader = self.source.as_mut().ok_or(LoadError::Closed)?;
        let ReadChunk { chunk, next_offset } =
            read_chunk(reader, offset, start_row, chunk_size, self.delimiter)?;

        let read = chunk.rows.len();
        if read < chunk_size {
            if self.rows.finalize(start_row + read) {
                debug!(rows = start_row + read, "row count is now known");
            }
        } else {
            self.rows.raise(start_row + read);
            self.index.record(chunk_idx + 1, next_offset);
        }

        Ok((read > 0).then_some(chunk))
    }

    /// Force the row count to `Known`, scanning the rest of the file if needed.
    pub(crate) fn ensure_row_count_known(&mut self) -> usize {
        if !self.rows.is_known() {
            if let Err(e) = self.resolve_offset(usize::MAX) {
                warn!(error = %e, "indexing failed; capping row count");
                let seen = self.rows.value();
                self.rows.finalize(seen);
            }
        }
        self.rows.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_split_line() {
        assert_eq!(split_line(b"a,b,c\n", b','), vec!["a", "b", "c"]);
        assert_eq!(split_line(b"a;b\r\n", b';'), vec!["a", "b"]);
        assert_eq!(split_line(b"a,,c", b','), vec!["a", "", "c"]);
        assert_eq!(split_line(b"a,b,", b','), vec!["a", "b", ""]);
        assert_eq!(split_line(b"\n", b','), vec![""]);
    }

    #[test]
    fn test_split_line_is_not_quote_aware() {
        assert_eq!(
            split_line(b"\"x,y\",z", b','),
            vec!["\"x", "y\"", "z"]
        );
    }

    #[test]
    fn test_split_line_invalid_utf8_is_lossy() {
        let row = split_line(b"ok,\xff\n", b',');
        assert_eq!(row[0], "ok");
        assert_eq!(row[1], "\u{fffd}");
    }

    #[test]
    fn test_read_chunk() {
        let mut reader = Cursor::new(b"h\n1|a\n2|b\n3|c\n".to_vec());
        let read = read_chunk(&mut reader, 2, 0, 2, b'|').unwrap();
        assert_eq!(read.chunk.start_row, 0);
        assert_eq!(read.chunk.rows, vec![vec!["1", "a"], vec!["2", "b"]]);
        assert_eq!(read.next_offset, 10);

        let rest = read_chunk(&mut reader, read.next_offset, 2, 2, b'|').unwrap();
        assert_eq!(rest.chunk.rows, vec![vec!["3", "c"]]);
        assert_eq!(rest.next_offset, 14);
    }

    #[test]
    fn test_read_chunk_at_eof_is_empty() {
        let mut reader = Cursor::new(b"h\n".to_vec());
        let read = read_chunk(&mut reader, 2, 0, 4, b',').unwrap();
        assert!(read.chunk.rows.is_empty());
        assert_eq!(read.next_offset, 2);
    }
}
