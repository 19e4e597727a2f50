//! Chunked, incrementally indexed access to a delimited text file.
//!
//! [`CsvModel`] is the only type callers touch. Rows are read in chunks of
//! `chunk_size` by a background thread that serves the latest viewport
//! request; a bounded LRU cache keeps memory flat, and a sparse line index
//! grows as the file is explored so any chunk can be reached by a seek.
//! The total row count stays a lower bound until the end of the file has
//! actually been seen.

mod cache;
mod error;
mod index;
mod loader;
mod row_count;
mod search;
pub mod sniff;
mod worker;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{info, warn};

pub use cache::{Chunk, ChunkCache};
pub use error::OpenError;
pub use index::LineIndex;
pub use loader::{split_line, trim_line_ending};
pub use row_count::RowCountState;
pub use search::SearchHit;
pub use worker::DataReadyHook;

use worker::Shared;

/// One parsed line: field strings in file column order.
pub type Row = Vec<String>;

/// Text of the single-cell placeholder row returned for rows not loaded yet.
pub const LOADING_CELL: &str = "loading...";

pub const DEFAULT_CHUNK_SIZE: usize = 512;
/// Largest viewport height accepted; longer requests are cut to this.
pub const MAX_VIEWPORT_ROWS: usize = 1 << 16;
pub const DEFAULT_MAX_CHUNKS: usize = 8;

/// Engine tuning, fixed for the lifetime of an open file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Rows per chunk, the unit of I/O and caching.
    pub chunk_size: usize,
    /// Chunks kept resident before the least recently used is evicted.
    pub max_chunks: usize,
    /// Skip delimiter detection and use this byte.
    pub delimiter: Option<u8>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_chunks: DEFAULT_MAX_CHUNKS,
            delimiter: None,
        }
    }
}

impl EngineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_max_chunks(mut self, max_chunks: usize) -> Self {
        self.max_chunks = max_chunks;
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    fn validate(&self) -> Result<(), OpenError> {
        if self.chunk_size == 0 {
            return Err(OpenError::InvalidOptions(
                "chunk_size must be greater than 0".to_string(),
            ));
        }
        if self.max_chunks == 0 {
            return Err(OpenError::InvalidOptions(
                "max_chunks must be greater than 0".to_string(),
            ));
        }
        if matches!(self.delimiter, Some(b'\n' | b'\r')) {
            return Err(OpenError::InvalidOptions(
                "delimiter cannot be a line break".to_string(),
            ));
        }
        Ok(())
    }
}

/// The rows a caller wants to see. Each request fully replaces the last.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewport {
    pub start_row: usize,
    pub row_count: usize,
    /// Keep reading past the viewport until the row count is known.
    pub read_to_end: bool,
}

impl Viewport {
    /// Indices of the chunks intersecting `[start_row, start_row + row_count)`.
    pub fn chunks(&self, chunk_size: usize) -> Range<usize> {
        let first = self.start_row / chunk_size;
        if self.row_count == 0 {
            return first..first;
        }
        let last = self.start_row.saturating_add(self.row_count - 1) / chunk_size;
        first..last.saturating_add(1)
    }
}

/// Everything guarded by the engine lock.
pub(crate) struct State {
    pub source: Option<BufReader<File>>,
    pub index: LineIndex,
    pub cache: ChunkCache,
    pub rows: RowCountState,
    pub delimiter: u8,
    pub chunk_size: usize,
    /// First chunk whose load failed; it and later chunks are not retried.
    pub failed_from: Option<usize>,
    pub viewport: Viewport,
    /// Single-slot mailbox read by the prefetch worker.
    pub pending: Option<Viewport>,
    pub stop: bool,
}

impl State {
    fn new(source: BufReader<File>, data_offset: u64, delimiter: u8, options: &EngineOptions) -> Self {
        Self {
            source: Some(source),
            index: LineIndex::new(data_offset),
            cache: ChunkCache::new(options.max_chunks),
            rows: RowCountState::default(),
            delimiter,
            chunk_size: options.chunk_size,
            failed_from: None,
            viewport: Viewport::default(),
            pending: None,
            stop: false,
        }
    }

    fn is_resident(&self, viewport: &Viewport) -> bool {
        viewport
            .chunks(self.chunk_size)
            .all(|idx| self.cache.contains(idx))
    }

    fn is_beyond_data(&self, row: usize) -> bool {
        match self.rows {
            RowCountState::Known(total) if row >= total => true,
            _ => self
                .failed_from
                .is_some_and(|failed| row / self.chunk_size >= failed),
        }
    }
}

/// An open file: its immutable header and the shared engine state.
struct Session {
    path: PathBuf,
    header: Vec<String>,
    delimiter: u8,
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

/// Viewer engine for one delimited text file at a time.
pub struct CsvModel {
    options: EngineOptions,
    on_data_ready: Option<DataReadyHook>,
    session: Option<Session>,
}

impl Default for CsvModel {
    fn default() -> Self {
        Self::new(EngineOptions::default())
    }
}

impl CsvModel {
    pub fn new(options: EngineOptions) -> Self {
        Self {
            options,
            on_data_ready: None,
            session: None,
        }
    }

    /// Register a callback run (off the lock) whenever fresh rows land in the
    /// cache. Takes effect on the next [`open`](Self::open).
    pub fn with_data_ready_hook(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_data_ready = Some(Arc::new(hook));
        self
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Open `path`, replacing any file already open.
    ///
    /// Reads and parses the header line, picks the delimiter, and starts the
    /// prefetch worker. Nothing beyond the header is read here.
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<(), OpenError> {
        self.close();
        self.options.validate()?;

        let path = path.as_ref().to_path_buf();
        let io_error = |source| OpenError::Io {
            path: path.clone(),
            source,
        };

        let mut reader = BufReader::new(File::open(&path).map_err(io_error)?);
        let mut first_line = Vec::new();
        reader.read_until(b'\n', &mut first_line).map_err(io_error)?;
        let header_line = trim_line_ending(&first_line);
        if header_line.is_empty() {
            return Err(OpenError::EmptyHeader { path });
        }

        let delimiter = self
            .options
            .delimiter
            .unwrap_or_else(|| sniff::detect_delimiter(header_line));
        let header = split_line(header_line, delimiter);

        let state = State::new(reader, first_line.len() as u64, delimiter, &self.options);
        let shared = Arc::new(Shared::new(state, self.on_data_ready.clone()));
        let worker = worker::spawn(Arc::clone(&shared)).map_err(io_error)?;

        info!(
            path = %path.display(),
            columns = header.len(),
            delimiter = %sniff::delimiter_name(delimiter),
            chunk_size = self.options.chunk_size,
            max_chunks = self.options.max_chunks,
            "opened file"
        );
        self.session = Some(Session {
            path,
            header,
            delimiter,
            shared,
            worker: Some(worker),
        });
        Ok(())
    }

    /// Stop and join the prefetch worker, then release the file and all
    /// cached data. The worker is always gone before the handle is dropped.
    pub fn close(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        {
            let mut state = session.shared.lock();
            state.stop = true;
            state.pending = None;
        }
        session.shared.wake_worker();
        if let Some(worker) = session.worker.take() {
            if worker.join().is_err() {
                warn!("prefetch worker panicked");
            }
        }

        let mut state = session.shared.lock();
        state.source = None;
        state.cache.clear();
        info!(path = %session.path.display(), rows = %state.rows, "closed file");
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn path(&self) -> Option<&Path> {
        self.session.as_ref().map(|s| s.path.as_path())
    }

    /// Delimiter in use, detected or configured.
    pub fn delimiter(&self) -> Option<u8> {
        self.session.as_ref().map(|s| s.delimiter)
    }

    /// Column names from the first line; empty when no file is open.
    pub fn header(&self) -> &[String] {
        self.session
            .as_ref()
            .map(|s| s.header.as_slice())
            .unwrap_or_default()
    }

    /// Request rows `[start_row, start_row + row_count)` and wake the worker.
    ///
    /// `row_count` is capped at [`MAX_VIEWPORT_ROWS`]. Never blocks on I/O. An
    /// identical request that is already pending, or already fully served, is
    /// a no-op.
    pub fn set_viewport(&self, start_row: usize, row_count: usize, read_to_end: bool) {
        let Some(session) = &self.session else {
            return;
        };
        let request = Viewport {
            start_row,
            row_count: row_count.min(MAX_VIEWPORT_ROWS),
            read_to_end,
        };
        {
            let mut state = session.shared.lock();
            if state.pending == Some(request) {
                return;
            }
            let served = state.pending.is_none()
                && state.viewport == request
                && state.is_resident(&request)
                && (!read_to_end || state.rows.is_known());
            if served {
                return;
            }
            state.viewport = request;
            state.pending = Some(request);
        }
        session.shared.wake_worker();
    }

    /// The current viewport request.
    pub fn viewport(&self) -> Viewport {
        self.session
            .as_ref()
            .map(|s| s.shared.lock().viewport)
            .unwrap_or_default()
    }

    /// Rows of the current viewport, assembled from whatever is cached.
    ///
    /// The header comes first when the viewport starts at row 0. Rows not
    /// loaded yet are a single [`LOADING_CELL`]; rows past the end of the data
    /// are omitted.
    pub fn visible_rows(&self) -> Vec<Row> {
        let Some(session) = &self.session else {
            return Vec::new();
        };
        let mut state = session.shared.lock();
        let viewport = state.viewport;
        let chunk_size = state.chunk_size;

        let mut rows = Vec::with_capacity(viewport.row_count.saturating_add(1));
        if viewport.start_row == 0 {
            rows.push(session.header.clone());
        }
        let end = viewport.start_row.saturating_add(viewport.row_count);
        for row in viewport.start_row..end {
            if state.is_beyond_data(row) {
                break;
            }
            match state.cache.peek(row / chunk_size) {
                Some(chunk) => match chunk.row(row) {
                    Some(cells) => rows.push(cells.clone()),
                    None => break,
                },
                None => rows.push(vec![LOADING_CELL.to_string()]),
            }
        }
        for chunk_idx in viewport.chunks(chunk_size) {
            state.cache.touch(chunk_idx);
        }
        rows
    }

    /// Confirmed row count, or the best lower bound so far.
    pub fn row_count(&self) -> usize {
        self.row_count_state().value()
    }

    pub fn row_count_known(&self) -> bool {
        self.row_count_state().is_known()
    }

    pub fn row_count_state(&self) -> RowCountState {
        self.session
            .as_ref()
            .map(|s| s.shared.lock().rows)
            .unwrap_or(RowCountState::Known(0))
    }

    /// Number of chunks currently cached.
    pub fn resident_chunks(&self) -> usize {
        self.session
            .as_ref()
            .map(|s| s.shared.lock().cache.len())
            .unwrap_or(0)
    }

    /// Snapshot of the line index: byte offset of each indexed chunk.
    pub fn chunk_offsets(&self) -> Vec<u64> {
        self.session
            .as_ref()
            .map(|s| s.shared.lock().index.offsets().to_vec())
            .unwrap_or_default()
    }

    /// First cell at or after `start_row` containing `pattern`.
    ///
    /// Runs on the calling thread and may read the rest of the file; a miss
    /// leaves the row count known.
    pub fn find_next(&self, pattern: &str, start_row: usize) -> Option<SearchHit> {
        let session = self.session.as_ref()?;
        search::find_next(&session.shared, pattern, start_row)
    }

    /// Last row at or before `start_row` holding a cell that contains
    /// `pattern`. Always establishes the row count first.
    pub fn find_prev(&self, pattern: &str, start_row: usize) -> Option<SearchHit> {
        let session = self.session.as_ref()?;
        search::find_prev(&session.shared, pattern, start_row)
    }
}

impl Drop for CsvModel {
    fn drop(&mut self) {
        self.close();
    }
}
