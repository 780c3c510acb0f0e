//! Mutation Queue
//!
//! One FIFO per mutation kind. Operations are sent over an mpsc channel to a
//! single worker task that runs them one at a time, so server calls of the
//! same kind complete in the order they were submitted. Each caller gets its
//! own operation's outcome back over a oneshot channel.
//!
//! ```text
//!   enqueue()        mpsc         worker task
//!   ┌──────────┐  ──────────▶  ┌─────────────────────────┐
//!   │ op + tx  │               │ run op 1, then op 2 ... │
//!   └──────────┘  ◀──────────  └─────────────────────────┘
//!   MutationHandle   oneshot
//! ```

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tracing::{debug, error};

use crate::errors::SyncError;

type Job = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Kind of cart mutation; each kind has its own queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    /// Adding line items
    Add,

    /// Removing line items
    Remove,
}

impl Display for MutationKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Add => f.write_str("add"),
            Self::Remove => f.write_str("remove"),
        }
    }
}

/// Serializes mutations of one kind.
#[derive(Debug)]
pub struct MutationQueue {
    kind: MutationKind,
    tx: mpsc::UnboundedSender<Job>,
    worker: JoinHandle<()>,
}

impl MutationQueue {
    /// Create a queue and spawn its worker.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(kind: MutationKind) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_worker(kind, rx));

        Self { kind, tx, worker }
    }

    /// Kind of mutation this queue serializes.
    pub fn kind(&self) -> MutationKind {
        self.kind
    }

    /// Append an operation after everything already queued.
    ///
    /// The operation starts once every earlier operation has settled, whether
    /// it succeeded or failed. The returned handle resolves with this
    /// operation's own result; dropping the handle does not cancel it.
    pub fn enqueue<T, F>(&self, operation: F) -> MutationHandle<T>
    where
        T: Send + 'static,
        F: Future<Output = Result<T, SyncError>> + Send + 'static,
    {
        let (reply, rx) = oneshot::channel();
        let kind = self.kind;

        let job: Job = Box::pin(async move {
            let outcome = operation.await;

            if reply.send(outcome).is_err() {
                debug!(%kind, "mutation settled after its handle was dropped");
            }
        });

        if self.tx.send(job).is_err() {
            debug!(%kind, "mutation queue closed, dropping operation");
        }

        MutationHandle { rx }
    }

    /// Stop accepting operations and wait for the queued ones to finish.
    pub async fn shutdown(self) {
        let Self { kind, tx, worker } = self;

        drop(tx);

        if let Err(source) = worker.await {
            error!(%kind, "mutation queue worker failed: {source}");
        }
    }
}

async fn run_worker(kind: MutationKind, mut rx: mpsc::UnboundedReceiver<Job>) {
    while let Some(job) = rx.recv().await {
        // A panicking step only takes down its own task.
        if let Err(source) = tokio::spawn(job).await {
            error!(%kind, "queued mutation aborted: {source}");
        }
    }

    debug!(%kind, "mutation queue drained");
}

/// Completion of one queued mutation.
///
/// Resolves with the operation's own result, or [`SyncError::Aborted`] if the
/// operation was dropped before reporting back.
#[derive(Debug)]
pub struct MutationHandle<T> {
    rx: oneshot::Receiver<Result<T, SyncError>>,
}

impl<T> MutationHandle<T> {
    /// A handle that is already settled.
    pub(crate) fn ready(outcome: Result<T, SyncError>) -> Self {
        let (reply, rx) = oneshot::channel();

        if reply.send(outcome).is_err() {
            debug!("settled handle dropped before creation finished");
        }

        Self { rx }
    }
}

impl<T> Future for MutationHandle<T> {
    type Output = Result<T, SyncError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(SyncError::Aborted)))
    }
}
