//! Cancellation and completion handle for a request.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{watch, Notify};
use tokio_util::sync::CancellationToken;

use super::FinishStatus;

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl RequestId {
    pub(crate) fn next() -> Self {
        Self(NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct HandleShared {
    id: RequestId,
    cancel: CancellationToken,
    status: watch::Sender<Option<FinishStatus>>,
    /// Wakes the owning center's driver; set on submission.
    waker: Mutex<Option<Arc<Notify>>>,
}

/// Cloneable handle to a request.
///
/// Obtain one before submission with [`super::LocationRequest::handle`] or from
/// [`crate::LocationCenter::process_request`]. Cancellation is cooperative:
/// `cancel()` records intent and wakes the coordinator, which delivers the
/// `Canceled` finish on its next evaluation pass.
#[derive(Clone)]
pub struct RequestHandle {
    inner: Arc<HandleShared>,
}

impl RequestHandle {
    pub(crate) fn new() -> Self {
        let (status, _) = watch::channel(None);
        Self {
            inner: Arc::new(HandleShared {
                id: RequestId::next(),
                cancel: CancellationToken::new(),
                status,
                waker: Mutex::new(None),
            }),
        }
    }

    /// Identifier of the request.
    pub fn id(&self) -> RequestId {
        self.inner.id
    }

    /// Ask the coordinator to finish this request with `Canceled`.
    ///
    /// Has no effect once the request has finished.
    pub fn cancel(&self) {
        if self.is_finished() {
            return;
        }
        self.inner.cancel.cancel();
        if let Some(waker) = self.inner.waker.lock().as_ref() {
            waker.notify_one();
        }
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// Terminal status, if the request has finished.
    pub fn status(&self) -> Option<FinishStatus> {
        *self.inner.status.borrow()
    }

    /// Whether the request has finished.
    pub fn is_finished(&self) -> bool {
        self.status().is_some()
    }

    /// Wait for the request to finish and return its status.
    pub async fn finished(&self) -> FinishStatus {
        let mut rx = self.inner.status.subscribe();
        loop {
            if let Some(status) = *rx.borrow_and_update() {
                return status;
            }
            // The sender lives in `self.inner`, so the channel cannot close
            // while we are waiting on it.
            let _ = rx.changed().await;
        }
    }

    pub(crate) fn attach(&self, waker: Arc<Notify>) {
        *self.inner.waker.lock() = Some(waker);
    }

    pub(crate) fn mark_finished(&self, status: FinishStatus) {
        self.inner.status.send_replace(Some(status));
        self.inner.waker.lock().take();
    }
}

impl fmt::Debug for RequestHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestHandle")
            .field("id", &self.inner.id)
            .field("cancelled", &self.is_cancelled())
            .field("status", &self.status())
            .finish()
    }
}
