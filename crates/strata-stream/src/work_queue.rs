//! Background computation with completion delivery on the owning thread.
//!
//! Every submitted job runs on its own short-lived worker thread. When it
//! finishes, its completion callback and result are pushed onto one FIFO
//! channel. The owner calls [`WorkQueue::drain`] once per tick to run the
//! callbacks that are ready, in enqueue order, against its own state.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, unbounded};
use tracing::{debug, error};

/// A finished job: the callback with its result already bound.
type Completion<C> = Box<dyn FnOnce(&mut C) + Send>;

/// Errors raised while submitting background work.
#[derive(Debug, thiserror::Error)]
pub enum WorkQueueError {
    /// The OS refused to start a worker thread.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),
}

#[derive(Debug, Default)]
struct Counters {
    submitted: AtomicU64,
    failed: AtomicU64,
    running: AtomicUsize,
}

/// Cloneable submission side of a [`WorkQueue`].
///
/// Components that need to start background work hold one of these; only
/// the queue owner can drain completions.
pub struct WorkHandle<C> {
    sender: Sender<Completion<C>>,
    counters: Arc<Counters>,
}

impl<C> Clone for WorkHandle<C> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            counters: Arc::clone(&self.counters),
        }
    }
}

impl<C: 'static> WorkHandle<C> {
    /// Run `compute` on a new worker thread and queue `on_complete` with its
    /// result for the next [`WorkQueue::drain`].
    ///
    /// A panic inside `compute` is caught on the worker, logged, and counted;
    /// its completion is dropped and other jobs are unaffected.
    pub fn submit<T, F, G>(&self, compute: F, on_complete: G) -> Result<(), WorkQueueError>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
        G: FnOnce(&mut C, T) + Send + 'static,
    {
        let sender = self.sender.clone();
        let counters = Arc::clone(&self.counters);
        counters.running.fetch_add(1, Ordering::SeqCst);

        let spawned = std::thread::Builder::new()
            .name("strata-worker".into())
            .spawn(move || {
                let outcome = panic::catch_unwind(AssertUnwindSafe(compute));
                match outcome {
                    Ok(result) => {
                        let completion: Completion<C> = Box::new(move |ctx| on_complete(ctx, result));
                        if sender.send(completion).is_err() {
                            debug!("completion queue closed, dropping result");
                        }
                    }
                    Err(payload) => {
                        counters.failed.fetch_add(1, Ordering::SeqCst);
                        error!(
                            reason = panic_message(payload.as_ref()),
                            "background job panicked, completion dropped"
                        );
                    }
                }
                // After the send, so an idle queue has every result drainable.
                counters.running.fetch_sub(1, Ordering::SeqCst);
            });

        match spawned {
            Ok(_) => {
                self.counters.submitted.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            Err(err) => {
                self.counters.running.fetch_sub(1, Ordering::SeqCst);
                Err(WorkQueueError::Spawn(err))
            }
        }
    }

    /// Jobs still computing on a worker.
    pub fn running(&self) -> usize {
        self.counters.running.load(Ordering::SeqCst)
    }

    /// Jobs whose computation panicked.
    pub fn failed(&self) -> u64 {
        self.counters.failed.load(Ordering::SeqCst)
    }

    /// Jobs successfully handed to a worker.
    pub fn submitted(&self) -> u64 {
        self.counters.submitted.load(Ordering::SeqCst)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

/// Owner side: holds the completion FIFO and runs callbacks against `C`.
pub struct WorkQueue<C> {
    handle: WorkHandle<C>,
    receiver: Receiver<Completion<C>>,
}

impl<C: 'static> WorkQueue<C> {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self {
            handle: WorkHandle {
                sender,
                counters: Arc::new(Counters::default()),
            },
            receiver,
        }
    }

    /// A submission handle sharing this queue.
    pub fn handle(&self) -> WorkHandle<C> {
        self.handle.clone()
    }

    /// Shorthand for [`WorkHandle::submit`] on this queue.
    pub fn submit<T, F, G>(&self, compute: F, on_complete: G) -> Result<(), WorkQueueError>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
        G: FnOnce(&mut C, T) + Send + 'static,
    {
        self.handle.submit(compute, on_complete)
    }

    /// Run every completion that was queued when the call started, in
    /// enqueue order, on the calling thread. Returns how many ran.
    ///
    /// Completions queued by callbacks during this call wait for the next one.
    pub fn drain(&mut self, ctx: &mut C) -> usize {
        let ready = self.receiver.len();
        let mut ran = 0;
        for _ in 0..ready {
            match self.receiver.try_recv() {
                Ok(completion) => {
                    completion(ctx);
                    ran += 1;
                }
                Err(_) => break,
            }
        }
        ran
    }

    /// Completions waiting for the next drain.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    pub fn running(&self) -> usize {
        self.handle.running()
    }

    pub fn failed(&self) -> u64 {
        self.handle.failed()
    }

    pub fn submitted(&self) -> u64 {
        self.handle.submitted()
    }

    /// Block until no job is computing, or `timeout` elapses.
    ///
    /// Returns `true` if the queue went idle, at which point every finished
    /// job's completion is already pending. Meant for shutdown and tests;
    /// the streaming loop itself never waits on workers.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.running() > 0 {
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        true
    }
}

impl<C: 'static> Default for WorkQueue<C> {
    fn default() -> Self {
        Self::new()
    }
}
