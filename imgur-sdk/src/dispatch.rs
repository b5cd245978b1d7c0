// ABOUTME: Single-threaded callback queue on which upload completions are delivered
// ABOUTME: Runs submitted closures serially, in order, on one dedicated thread

use crate::error::UploadError;
use once_cell::sync::OnceCell;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tokio::sync::mpsc;

type Job = Box<dyn FnOnce() + Send + 'static>;

const MAIN_QUEUE_NAME: &str = "imgur-callbacks";

static MAIN_QUEUE: OnceCell<CallbackQueue> = OnceCell::new();

/// A designated execution context for completion callbacks.
///
/// Every callback dispatched to a queue runs on that queue's thread, one at a
/// time, in submission order. Clones share the thread; it exits once every
/// clone has been dropped and the backlog has drained.
#[derive(Clone)]
pub struct CallbackQueue {
    sender: mpsc::UnboundedSender<Job>,
    thread: Arc<ThreadInfo>,
}

struct ThreadInfo {
    id: ThreadId,
    name: String,
}

impl CallbackQueue {
    pub fn new(name: impl Into<String>) -> std::io::Result<Self> {
        let name = name.into();
        let (sender, mut receiver) = mpsc::unbounded_channel::<Job>();

        let handle = thread::Builder::new().name(name.clone()).spawn(move || {
            while let Some(job) = receiver.blocking_recv() {
                if std::panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                    log::error!("Upload completion callback panicked");
                }
            }
        })?;

        Ok(Self {
            sender,
            thread: Arc::new(ThreadInfo {
                id: handle.thread().id(),
                name,
            }),
        })
    }

    /// The process-wide default queue, created on first use.
    pub fn main() -> Result<Self, UploadError> {
        MAIN_QUEUE
            .get_or_try_init(|| CallbackQueue::new(MAIN_QUEUE_NAME))
            .cloned()
            .map_err(|e| {
                UploadError::Configuration(format!("Failed to start callback thread: {}", e))
            })
    }

    /// Queue `job` to run on this queue's thread. Returns `false` if the thread is gone.
    pub fn dispatch<F>(&self, job: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        self.sender.send(Box::new(job)).is_ok()
    }

    /// Whether the caller is running on this queue's thread.
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.thread.id
    }

    pub fn name(&self) -> &str {
        &self.thread.name
    }
}

impl std::fmt::Debug for CallbackQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackQueue")
            .field("name", &self.thread.name)
            .finish_non_exhaustive()
    }
}
