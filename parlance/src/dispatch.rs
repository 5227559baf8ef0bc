//! Background execution with serialized result delivery.
//!
//! Every operation runs on its own named worker thread. Completions are queued
//! on one channel and handed to their callbacks by a single delivery thread, so
//! callbacks never run concurrently with each other.
//!
//! ```rust
//! use std::sync::mpsc;
//!
//! use parlance::TaskDispatcher;
//!
//! let dispatcher = TaskDispatcher::start().expect("delivery thread starts");
//! let (tx, rx) = mpsc::channel();
//! dispatcher
//!     .run_in_background("answer", || 6 * 7, move |outcome| {
//!         let _ = tx.send(outcome);
//!     })
//!     .expect("worker spawns");
//!
//! assert_eq!(rx.recv().expect("delivered"), Ok(42));
//! dispatcher.shutdown();
//! ```

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};

use tokio::sync::mpsc;

pub const DELIVERY_THREAD_NAME: &str = "parlance-delivery";

type Delivery = Box<dyn FnOnce() + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchErrorKind {
    Spawn,
    Runtime,
    Panicked,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchError {
    pub kind: DispatchErrorKind,
    pub message: String,
}

impl DispatchError {
    pub fn new(kind: DispatchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn spawn(message: impl Into<String>) -> Self {
        Self::new(DispatchErrorKind::Spawn, message)
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(DispatchErrorKind::Runtime, message)
    }

    pub fn panicked(task: &str) -> Self {
        Self::new(DispatchErrorKind::Panicked, format!("task '{task}' panicked"))
    }

    pub fn closed() -> Self {
        Self::new(DispatchErrorKind::Closed, "dispatcher has shut down")
    }
}

impl Display for DispatchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for DispatchError {}

/// Handle to one background worker.
#[derive(Debug)]
pub struct TaskHandle {
    id: u64,
    name: String,
    worker: JoinHandle<()>,
}

impl TaskHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Waits for the worker to finish. Its result may still be waiting for delivery.
    pub fn join(self) -> Result<(), DispatchError> {
        self.worker
            .join()
            .map_err(|_| DispatchError::panicked(&self.name))
    }
}

#[derive(Debug)]
pub struct TaskDispatcher {
    sender: Option<mpsc::UnboundedSender<Delivery>>,
    delivery: Option<JoinHandle<()>>,
    next_task_id: AtomicU64,
}

impl TaskDispatcher {
    /// Starts the delivery thread.
    pub fn start() -> Result<Self, DispatchError> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let delivery = thread::Builder::new()
            .name(DELIVERY_THREAD_NAME.to_string())
            .spawn(move || drain_deliveries(receiver))
            .map_err(|error| {
                DispatchError::spawn(format!("failed to spawn delivery thread: {error}"))
            })?;

        Ok(Self {
            sender: Some(sender),
            delivery: Some(delivery),
            next_task_id: AtomicU64::new(1),
        })
    }

    /// Runs `operation` on a fresh worker thread and queues `on_complete` for delivery.
    ///
    /// A panicking operation is reported to `on_complete` as [`DispatchErrorKind::Panicked`].
    pub fn run_in_background<T, F, C>(
        &self,
        name: &str,
        operation: F,
        on_complete: C,
    ) -> Result<TaskHandle, DispatchError>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
        C: FnOnce(Result<T, DispatchError>) + Send + 'static,
    {
        let sender = self.sender.clone().ok_or_else(DispatchError::closed)?;
        let id = self.next_task_id.fetch_add(1, Ordering::SeqCst);
        let task = name.to_string();

        let worker = thread::Builder::new()
            .name(format!("parlance-task-{id}"))
            .spawn(move || {
                let outcome = catch_unwind(AssertUnwindSafe(operation))
                    .map_err(|_| DispatchError::panicked(&task));
                if let Err(error) = &outcome {
                    tracing::error!(
                        phase = "dispatch",
                        event = "task_panicked",
                        task_id = id,
                        task = %task,
                        error = %error
                    );
                }

                let delivery: Delivery = Box::new(move || on_complete(outcome));
                if sender.send(delivery).is_err() {
                    tracing::warn!(
                        phase = "dispatch",
                        event = "delivery_dropped",
                        task_id = id,
                        task = %task
                    );
                }
            })
            .map_err(|error| DispatchError::spawn(format!("failed to spawn worker: {error}")))?;

        tracing::debug!(phase = "dispatch", event = "task_spawned", task_id = id, task = name);
        Ok(TaskHandle {
            id,
            name: name.to_string(),
            worker,
        })
    }

    /// Drives `future` to completion on a worker-local current-thread runtime.
    pub fn spawn_future<T, Fut, C>(
        &self,
        name: &str,
        future: Fut,
        on_complete: C,
    ) -> Result<TaskHandle, DispatchError>
    where
        T: Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        C: FnOnce(Result<T, DispatchError>) + Send + 'static,
    {
        self.run_in_background(
            name,
            move || {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .map_err(|error| {
                        DispatchError::runtime(format!("failed to build task runtime: {error}"))
                    })?;
                Ok(runtime.block_on(future))
            },
            move |outcome: Result<Result<T, DispatchError>, DispatchError>| {
                on_complete(outcome.and_then(|inner| inner))
            },
        )
    }

    /// Stops accepting work and waits until every queued result has been delivered.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.sender.take();
        if let Some(delivery) = self.delivery.take()
            && delivery.thread().id() != thread::current().id()
            && delivery.join().is_err()
        {
            tracing::error!(phase = "dispatch", event = "delivery_thread_panicked");
        }
    }
}

impl Drop for TaskDispatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn drain_deliveries(mut receiver: mpsc::UnboundedReceiver<Delivery>) {
    while let Some(delivery) = receiver.blocking_recv() {
        if catch_unwind(AssertUnwindSafe(delivery)).is_err() {
            tracing::error!(phase = "dispatch", event = "callback_panicked");
        }
    }
    tracing::debug!(phase = "dispatch", event = "delivery_stopped");
}
