//! Asynchronous path requests served by one background worker.
//!
//! `submit` never blocks on a search. The worker drains all pending requests in one go, runs each
//! through `Pathfinder::find_path` with its own `SearchContext`, and parks the results. Callbacks
//! run only inside `pump_completions`, on whichever thread calls it, with no lock held.

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use tracing::{debug, error, warn};

use crate::{DrainOrder, PathFindingOptions, Pathfinder, QueueConfig, SearchContext, Vec3};

pub type PathCallback = Box<dyn FnOnce(PathResponse) + Send + 'static>;

#[derive(Debug, Clone, PartialEq)]
pub struct PathResponse {
    pub id: u64,
    pub found: bool,
    /// The caller's buffer, filled with the path (empty when `found` is false).
    pub path: Vec<Vec3>,
}

struct PathRequest {
    id: u64,
    start: Vec3,
    end: Vec3,
    buffer: Vec<Vec3>,
    options: PathFindingOptions,
    on_complete: PathCallback,
}

struct Completed {
    response: PathResponse,
    on_complete: PathCallback,
}

#[derive(Default)]
struct Pending {
    requests: Vec<PathRequest>,
    quit: bool,
}

#[derive(Default)]
struct Shared {
    pending: Mutex<Pending>,
    wake: Condvar,
    completed: Mutex<Vec<Completed>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panic while holding these locks cannot leave the lists half-updated.
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct PathRequestQueue {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl PathRequestQueue {
    pub fn new(pathfinder: Arc<Pathfinder>) -> io::Result<Self> {
        Self::with_config(pathfinder, QueueConfig::default())
    }

    pub fn with_config(pathfinder: Arc<Pathfinder>, config: QueueConfig) -> io::Result<Self> {
        let shared = Arc::new(Shared::default());
        let worker_shared = Arc::clone(&shared);
        let order = config.drain_order;
        let worker = thread::Builder::new()
            .name(config.thread_name)
            .spawn(move || worker_main(pathfinder, worker_shared, order))?;
        Ok(Self {
            shared,
            worker: Some(worker),
        })
    }

    /// Queue a search. `buffer` is reused for the result and handed back in the response.
    pub fn submit<F>(
        &self,
        id: u64,
        start: Vec3,
        end: Vec3,
        buffer: Vec<Vec3>,
        options: PathFindingOptions,
        on_complete: F,
    ) where
        F: FnOnce(PathResponse) + Send + 'static,
    {
        lock(&self.shared.pending).requests.push(PathRequest {
            id,
            start,
            end,
            buffer,
            options,
            on_complete: Box::new(on_complete),
        });
        self.shared.wake.notify_one();
    }

    /// Requests submitted but not yet picked up by the worker.
    pub fn pending_len(&self) -> usize {
        lock(&self.shared.pending).requests.len()
    }

    /// Run the callbacks of every finished request. Returns how many ran.
    pub fn pump_completions(&self) -> usize {
        let ready = std::mem::take(&mut *lock(&self.shared.completed));
        let count = ready.len();
        for done in ready {
            (done.on_complete)(done.response);
        }
        count
    }

    /// Stop the worker after the batch it is processing. Requests it has not picked up yet are
    /// dropped without their callbacks running; finished ones can still be pumped.
    pub fn shutdown(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        lock(&self.shared.pending).quit = true;
        self.shared.wake.notify_all();
        if worker.join().is_err() {
            warn!("path worker exited with a panic");
        }
    }
}

impl Drop for PathRequestQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_main(pathfinder: Arc<Pathfinder>, shared: Arc<Shared>, order: DrainOrder) {
    let mut ctx = SearchContext::with_capacity(pathfinder.graph().edge_count());
    debug!(?order, "path worker started");

    loop {
        let batch = {
            let mut pending = lock(&shared.pending);
            while pending.requests.is_empty() && !pending.quit {
                pending = shared
                    .wake
                    .wait(pending)
                    .unwrap_or_else(PoisonError::into_inner);
            }
            if pending.quit {
                if !pending.requests.is_empty() {
                    debug!(
                        discarded = pending.requests.len(),
                        "dropping unstarted path requests"
                    );
                }
                break;
            }
            std::mem::take(&mut pending.requests)
        };

        debug!(batch = batch.len(), "processing path requests");
        for request in in_drain_order(batch, order) {
            complete(&shared, run(&pathfinder, &mut ctx, request));
        }
    }

    debug!("path worker stopped");
}

/// Reorder a batch drained in submission order.
fn in_drain_order<T>(mut batch: Vec<T>, order: DrainOrder) -> Vec<T> {
    if order == DrainOrder::NewestFirst {
        batch.reverse();
    }
    batch
}

fn run(pathfinder: &Pathfinder, ctx: &mut SearchContext, request: PathRequest) -> Completed {
    let PathRequest {
        id,
        start,
        end,
        mut buffer,
        options,
        on_complete,
    } = request;

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        pathfinder.find_path(start, end, &mut buffer, Some(&mut *ctx), options)
    }));
    let found = match result {
        Ok(found) => found,
        Err(_) => {
            error!(id, "path request panicked; reporting no path");
            *ctx = SearchContext::new();
            buffer.clear();
            false
        }
    };

    Completed {
        response: PathResponse {
            id,
            found,
            path: buffer,
        },
        on_complete,
    }
}

fn complete(shared: &Shared, done: Completed) {
    lock(&shared.completed).push(done);
}
