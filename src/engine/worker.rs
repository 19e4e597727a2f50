//! Background prefetch: one thread loading whatever the latest viewport needs.

use std::io;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::debug;

use super::loader::ChunkStatus;
use super::{State, Viewport};

/// Called after each chunk freshly inserted into the cache.
pub type DataReadyHook = Arc<dyn Fn() + Send + Sync>;

/// State shared between the foreground and the prefetch thread.
///
/// Every mutable structure, the file handle included, sits behind the one
/// lock, so background reads and foreground searches never interleave on the
/// seek cursor.
pub(crate) struct Shared {
    pub chunk_size: usize,
    state: Mutex<State>,
    wake: Condvar,
    on_data_ready: Option<DataReadyHook>,
}

impl Shared {
    pub fn new(state: State, on_data_ready: Option<DataReadyHook>) -> Self {
        Self {
            chunk_size: state.chunk_size,
            state: Mutex::new(state),
            wake: Condvar::new(),
            on_data_ready,
        }
    }

    /// Every operation leaves the state consistent before releasing the lock,
    /// so a poisoned lock is still safe to use.
    pub fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn wake_worker(&self) {
        self.wake.notify_all();
    }

    pub fn notify_data_ready(&self) {
        if let Some(hook) = &self.on_data_ready {
            hook();
        }
    }

    /// Block until a viewport request is pending or shutdown was signalled.
    /// Takes and clears the request slot; `None` means stop.
    fn next_request(&self) -> Option<Viewport> {
        let mut state = self.lock();
        loop {
            if state.stop {
                return None;
            }
            if let Some(request) = state.pending.take() {
                return Some(request);
            }
            state = self
                .wake
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Load one chunk unless shutdown was signalled. False when stopped or
    /// when the chunk does not exist.
    fn load(&self, chunk_idx: usize) -> bool {
        let status = {
            let mut state = self.lock();
            if state.stop {
                return false;
            }
            state.load_chunk(chunk_idx)
        };
        if status == ChunkStatus::Loaded {
            self.notify_data_ready();
        }
        status != ChunkStatus::Missing
    }

    fn load_range(&self, request: &Viewport) {
        for chunk_idx in request.chunks(self.chunk_size) {
            if !self.load(chunk_idx) {
                break;
            }
        }
    }

    /// Keep loading successive chunks until the row count is known, a load
    /// fails, or shutdown. Newer viewport requests are served between chunks.
    /// After every load the latest viewport's chunks are touched again, so the
    /// scan evicts its own earlier chunks and never the visible ones.
    fn load_to_end(&self, request: Viewport) {
        let mut latest = request;
        let mut next = request.chunks(self.chunk_size).end;
        loop {
            let newer = {
                let mut state = self.lock();
                if state.stop || state.rows.is_known() {
                    break;
                }
                state.pending.take()
            };
            if let Some(newer) = newer {
                self.load_range(&newer);
                latest = newer;
                continue;
            }

            let status = {
                let mut state = self.lock();
                if state.stop {
                    break;
                }
                let status = state.load_chunk(next);
                for chunk_idx in latest.chunks(self.chunk_size) {
                    state.cache.touch(chunk_idx);
                }
                status
            };
            match status {
                ChunkStatus::Missing => break,
                ChunkStatus::Loaded => self.notify_data_ready(),
                ChunkStatus::Resident => {}
            }
            next = next.saturating_add(1);
        }
        debug!(rows = %self.lock().rows, "finished reading to end");
        self.load_range(&latest);
    }
}

pub(crate) fn spawn(shared: Arc<Shared>) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("csvpeek-prefetch".to_string())
        .spawn(move || run(&shared))
}

fn run(shared: &Shared) {
    debug!("prefetch worker started");
    while let Some(request) = shared.next_request() {
        debug!(
            start = request.start_row,
            count = request.row_count,
            to_end = request.read_to_end,
            "prefetching viewport"
        );
        shared.load_range(&request);
        if request.read_to_end {
            shared.load_to_end(request);
        }
    }
    debug!("prefetch worker stopped");
}
