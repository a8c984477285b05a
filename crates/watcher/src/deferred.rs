//! Deferred work queue
//!
//! Some reactions to a change notification must not run while the resource
//! system is still delivering it. They are handed to a small pool of worker
//! threads instead. Jobs are fire-and-forget: failures are logged, never
//! returned to the submitter.

use bp_core::BreakpointError;
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

type Job = Box<dyn FnOnce() -> Result<(), BreakpointError> + Send + 'static>;

struct Task {
    label: &'static str,
    job: Job,
}

/// Count of submitted jobs not yet finished
#[derive(Default)]
struct Pending {
    count: Mutex<usize>,
    idle: Condvar,
}

impl Pending {
    fn start(&self) {
        *self.count.lock() += 1;
    }

    fn finish(&self) {
        let mut count = self.count.lock();
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.idle.notify_all();
        }
    }
}

/// Fixed pool of worker threads fed by a channel
pub struct DeferredQueue {
    sender: Option<Sender<Task>>,
    workers: Vec<JoinHandle<()>>,
    pending: Arc<Pending>,
}

impl DeferredQueue {
    /// Spawn `workers` worker threads (at least one)
    pub fn new(workers: usize) -> std::io::Result<Self> {
        let (sender, receiver) = unbounded::<Task>();
        let pending = Arc::new(Pending::default());

        let mut handles = Vec::with_capacity(workers.max(1));
        for index in 0..workers.max(1) {
            let receiver = receiver.clone();
            let pending = pending.clone();
            let handle = std::thread::Builder::new()
                .name(format!("bp-deferred-{}", index))
                .spawn(move || run_worker(receiver, pending))?;
            handles.push(handle);
        }

        debug!(workers = handles.len(), "Deferred queue started");
        Ok(Self {
            sender: Some(sender),
            workers: handles,
            pending,
        })
    }

    /// Queue `job` for execution on a worker thread
    pub fn submit<F>(&self, label: &'static str, job: F)
    where
        F: FnOnce() -> Result<(), BreakpointError> + Send + 'static,
    {
        let Some(sender) = &self.sender else {
            warn!(task = label, "Deferred queue closed, dropping task");
            return;
        };

        self.pending.start();
        let task = Task {
            label,
            job: Box::new(job),
        };
        if sender.send(task).is_err() {
            warn!(task = label, "Deferred workers gone, dropping task");
            self.pending.finish();
        }
    }

    /// Jobs submitted but not yet finished
    pub fn pending(&self) -> usize {
        *self.pending.count.lock()
    }

    /// Block until every submitted job has finished, up to `timeout`
    ///
    /// Returns whether the queue became idle.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut count = self.pending.count.lock();
        while *count > 0 {
            if self.pending.idle.wait_until(&mut count, deadline).timed_out() {
                return *count == 0;
            }
        }
        true
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }
}

impl Drop for DeferredQueue {
    fn drop(&mut self) {
        // Closing the channel lets workers drain what is queued and exit
        self.sender.take();
        let current = std::thread::current().id();
        for handle in self.workers.drain(..) {
            // The last owner went away inside a job; that worker exits on its own
            if handle.thread().id() == current {
                debug!("Deferred queue dropped on its own worker, detaching it");
                continue;
            }
            if handle.join().is_err() {
                warn!("Deferred worker panicked");
            }
        }
    }
}

fn run_worker(receiver: Receiver<Task>, pending: Arc<Pending>) {
    for task in receiver.iter() {
        debug!(task = task.label, "Running deferred task");
        if let Err(e) = (task.job)() {
            error!(task = task.label, error = %e, "Deferred task failed");
        }
        pending.finish();
    }
}
