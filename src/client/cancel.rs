//! Caller-side cancellation for in-flight completions.

use tokio_util::sync::CancellationToken;

/// A handle that can be used to request cancellation.
///
/// Clones observe the same state. Cancelling aborts the pending HTTP request
/// and the pending stream read; the call then fails with
/// [`Error::Aborted`](crate::Error::Aborted).
#[derive(Clone, Debug, Default)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// A future that resolves when cancellation is requested.
    pub fn cancelled(&self) -> tokio_util::sync::WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }
}
