//! Background job execution for expensive LOD content setup and teardown.
//!
//! Everything goes through the single-method [`JobQueue`] contract:
//! - [`BackgroundWorker`]: one dedicated thread, FIFO order
//! - [`RayonQueue`]: rayon's shared pool, best-effort order
//! - [`InlineQueue`]: runs the job on the calling thread (wasm without
//!   threads, deterministic tools)
//!
//! Results never come back through the queue. Callers that need a
//! completion signal use [`submit_with_completion`], which hands back a
//! channel to poll once per frame.
//!
//! # Usage
//!
//! ```ignore
//! let worker = BackgroundWorker::new()?;
//!
//! // Queue work (non-blocking)
//! let done = submit_with_completion(&worker, move || content.prepare());
//!
//! // Poll each frame
//! match done.try_recv() {
//!     Ok(outcome) => { /* finalize on the render thread */ }
//!     Err(TryRecvError::Empty) => { /* still running */ }
//!     Err(TryRecvError::Disconnected) => { /* job lost */ }
//! }
//! ```

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{self as channel, Receiver, Sender};

use crate::error::PrepareError;

/// A unit of background work.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Outcome of a job submitted with [`submit_with_completion`].
pub type JobOutcome = Result<(), PrepareError>;

/// Job submission contract.
pub trait JobQueue: Send + Sync {
  /// Queue a job. Never blocks on the job itself.
  fn enqueue(&self, job: Job);
}

/// Single dedicated worker thread fed by a FIFO channel.
///
/// Dropping the worker closes the queue, lets already queued jobs finish,
/// and joins the thread.
pub struct BackgroundWorker {
  sender: Option<Sender<Job>>,
  handle: Option<JoinHandle<()>>,
  pending: Arc<AtomicUsize>,
}

impl BackgroundWorker {
  /// Spawn the worker thread.
  pub fn new() -> std::io::Result<Self> {
    Self::with_name("scenegraph-worker")
  }

  /// Spawn the worker thread with a custom thread name.
  pub fn with_name(name: &str) -> std::io::Result<Self> {
    let (sender, receiver) = channel::unbounded::<Job>();
    let pending = Arc::new(AtomicUsize::new(0));
    let worker_pending = Arc::clone(&pending);

    let handle = thread::Builder::new().name(name.to_owned()).spawn(move || {
      for job in receiver {
        run_guarded(job);
        worker_pending.fetch_sub(1, Ordering::AcqRel);
      }
      tracing::debug!("background worker queue closed");
    })?;

    Ok(Self {
      sender: Some(sender),
      handle: Some(handle),
      pending,
    })
  }

  /// Jobs queued or running.
  pub fn pending_count(&self) -> usize {
    self.pending.load(Ordering::Acquire)
  }

  /// True when no job is queued or running.
  pub fn is_idle(&self) -> bool {
    self.pending_count() == 0
  }
}

impl JobQueue for BackgroundWorker {
  fn enqueue(&self, job: Job) {
    let Some(sender) = &self.sender else {
      return;
    };
    self.pending.fetch_add(1, Ordering::AcqRel);
    if sender.send(job).is_err() {
      // Worker thread is gone; the job is dropped along with its
      // completion sender, which callers observe as Disconnected.
      self.pending.fetch_sub(1, Ordering::AcqRel);
      tracing::warn!("background worker is not running, job dropped");
    }
  }
}

impl Drop for BackgroundWorker {
  fn drop(&mut self) {
    self.sender.take();
    if let Some(handle) = self.handle.take() {
      if handle.join().is_err() {
        tracing::warn!("background worker thread panicked");
      }
    }
  }
}

/// Jobs run on rayon's global thread pool.
#[derive(Clone, Copy, Debug, Default)]
pub struct RayonQueue;

impl JobQueue for RayonQueue {
  fn enqueue(&self, job: Job) {
    rayon::spawn(move || run_guarded(job));
  }
}

/// Jobs run synchronously inside `enqueue`.
#[derive(Clone, Copy, Debug, Default)]
pub struct InlineQueue;

impl JobQueue for InlineQueue {
  fn enqueue(&self, job: Job) {
    run_guarded(job);
  }
}

impl<Q: JobQueue + ?Sized> JobQueue for Arc<Q> {
  fn enqueue(&self, job: Job) {
    (**self).enqueue(job);
  }
}

/// Queue `work` and return a channel that receives exactly one outcome.
///
/// A panic inside `work` is caught and reported as
/// [`PrepareError::Panicked`]. If the job is dropped without running, the
/// receiver reports `Disconnected`.
pub fn submit_with_completion<Q, F>(queue: &Q, work: F) -> Receiver<JobOutcome>
where
  Q: JobQueue + ?Sized,
  F: FnOnce() -> JobOutcome + Send + 'static,
{
  let (sender, receiver) = channel::bounded(1);
  queue.enqueue(Box::new(move || {
    let outcome = match panic::catch_unwind(AssertUnwindSafe(work)) {
      Ok(outcome) => outcome,
      Err(payload) => Err(PrepareError::Panicked(panic_message(payload.as_ref()))),
    };
    // Ignore send error (receiver dropped = nobody is waiting)
    let _ = sender.send(outcome);
  }));
  receiver
}

fn run_guarded(job: Job) {
  if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
    tracing::warn!(
      reason = %panic_message(payload.as_ref()),
      "background job panicked"
    );
  }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
  if let Some(message) = payload.downcast_ref::<&str>() {
    (*message).to_owned()
  } else if let Some(message) = payload.downcast_ref::<String>() {
    message.clone()
  } else {
    "unknown panic".to_owned()
  }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
  use std::sync::Mutex;
  use std::time::Duration;

  use crossbeam_channel::TryRecvError;

  use super::*;

  fn wait_for(receiver: &Receiver<JobOutcome>) -> Option<JobOutcome> {
    for _ in 0..1000 {
      match receiver.try_recv() {
        Ok(outcome) => return Some(outcome),
        Err(TryRecvError::Empty) => thread::sleep(Duration::from_millis(1)),
        Err(TryRecvError::Disconnected) => return None,
      }
    }
    None
  }

  #[test]
  fn test_background_worker_runs_job() {
    let worker = BackgroundWorker::new().unwrap();
    let done = submit_with_completion(&worker, || Ok(()));
    assert_eq!(wait_for(&done), Some(Ok(())));
  }

  #[test]
  fn test_background_worker_is_fifo() {
    let worker = BackgroundWorker::new().unwrap();
    let order = Arc::new(Mutex::new(Vec::new()));

    for i in 0..10 {
      let order = Arc::clone(&order);
      worker.enqueue(Box::new(move || order.lock().unwrap().push(i)));
    }
    let done = submit_with_completion(&worker, || Ok(()));
    assert!(wait_for(&done).is_some());

    assert_eq!(*order.lock().unwrap(), (0..10).collect::<Vec<_>>());
  }

  #[test]
  fn test_panic_is_reported_and_worker_survives() {
    let worker = BackgroundWorker::new().unwrap();

    let failed = submit_with_completion(&worker, || panic!("boom"));
    match wait_for(&failed) {
      Some(Err(PrepareError::Panicked(message))) => assert_eq!(message, "boom"),
      other => panic!("expected panic outcome, got {other:?}"),
    }

    let after = submit_with_completion(&worker, || Ok(()));
    assert_eq!(wait_for(&after), Some(Ok(())));
  }

  #[test]
  fn test_drop_drains_queue() {
    let counter = Arc::new(AtomicUsize::new(0));
    {
      let worker = BackgroundWorker::new().unwrap();
      for _ in 0..5 {
        let counter = Arc::clone(&counter);
        worker.enqueue(Box::new(move || {
          counter.fetch_add(1, Ordering::SeqCst);
        }));
      }
    }
    assert_eq!(counter.load(Ordering::SeqCst), 5);
  }

  #[test]
  fn test_inline_queue_completes_immediately() {
    let done = submit_with_completion(&InlineQueue, || {
      Err(PrepareError::Failed("missing asset".into()))
    });
    assert_eq!(
      done.try_recv(),
      Ok(Err(PrepareError::Failed("missing asset".into())))
    );
  }

  #[test]
  fn test_rayon_queue_runs_job() {
    let done = submit_with_completion(&RayonQueue, || Ok(()));
    assert_eq!(wait_for(&done), Some(Ok(())));
  }
}
