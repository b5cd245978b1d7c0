// ABOUTME: Handles for in-flight uploads: progress, cancellation, and awaiting results
// ABOUTME: UploadTask is a future of the outcome; UploadHandle pairs with a completion callback

use crate::error::UploadError;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::{oneshot, watch};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Bytes of the image part handed to the transport so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadProgress {
    pub completed: u64,
    /// `None` when the source length is unknown (streams).
    pub total: Option<u64>,
}

impl UploadProgress {
    pub fn fraction(&self) -> Option<f64> {
        match self.total {
            Some(0) => Some(1.0),
            Some(total) => Some((self.completed as f64 / total as f64).min(1.0)),
            None => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.total, Some(total) if self.completed >= total)
    }
}

/// An upload running on the tokio runtime. Await it for the hosted URL.
///
/// Dropping the task does not cancel the upload; call [`UploadTask::cancel`].
pub struct UploadTask {
    pub(crate) cancel: CancellationToken,
    pub(crate) progress: watch::Receiver<UploadProgress>,
    pub(crate) result: oneshot::Receiver<Result<Url, UploadError>>,
}

impl UploadTask {
    pub fn progress(&self) -> watch::Receiver<UploadProgress> {
        self.progress.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// A handle that can cancel this upload from elsewhere.
    pub fn handle(&self) -> UploadHandle {
        UploadHandle {
            cancel: self.cancel.clone(),
            progress: self.progress.clone(),
        }
    }
}

impl Future for UploadTask {
    type Output = Result<Url, UploadError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let outcome = match Pin::new(&mut self.result).poll(cx) {
            Poll::Pending => return Poll::Pending,
            // Worker panics are caught, so a dropped sender means the runtime dropped the task.
            Poll::Ready(received) => received.unwrap_or(Err(UploadError::Cancelled)),
        };

        if self.cancel.is_cancelled() {
            return Poll::Ready(Err(UploadError::Cancelled));
        }
        Poll::Ready(outcome)
    }
}

/// Controls an upload whose outcome goes to a completion callback.
#[derive(Clone)]
pub struct UploadHandle {
    pub(crate) cancel: CancellationToken,
    pub(crate) progress: watch::Receiver<UploadProgress>,
}

impl UploadHandle {
    pub fn progress(&self) -> watch::Receiver<UploadProgress> {
        self.progress.clone()
    }

    /// Cancel the upload. The completion callback then receives `UploadError::Cancelled`.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
