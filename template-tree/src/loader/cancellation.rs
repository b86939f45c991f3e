//! Cancellation of in-flight template loads

use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::trace;

/// A cancellation token for a pending load
///
/// Clones share state: cancelling any clone cancels them all.
///
/// # Examples
///
/// ```rust
/// use template_tree::loader::CancellationToken;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let token = CancellationToken::new();
/// token.cancel();
///
/// let outcome = token.run_until_cancelled(std::future::pending::<()>()).await;
/// assert!(outcome.is_none());
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    state: Arc<CancellationState>,
}

#[derive(Debug)]
struct CancellationState {
    tx: watch::Sender<bool>,
    rx: watch::Receiver<bool>,
}

impl CancellationToken {
    /// Create a token that is not cancelled
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            state: Arc::new(CancellationState { tx, rx }),
        }
    }

    /// Check if cancellation has been requested
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.state.rx.borrow()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        let _ = self.state.tx.send(true);
        trace!("load cancellation requested");
    }

    /// Wait for the cancellation signal; returns immediately if already cancelled
    pub async fn cancelled(&self) {
        let mut rx = self.state.rx.clone();
        while !*rx.borrow() {
            if rx.changed().await.is_err() {
                break;
            }
        }
    }

    /// Drive `future` until it completes or the token is cancelled
    ///
    /// On cancellation the future is dropped, which aborts any request it
    /// owns, and `None` is returned. Cancellation wins when both are ready.
    pub async fn run_until_cancelled<F, T>(&self, future: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        tokio::select! {
            biased;
            () = self.cancelled() => None,
            result = future => Some(result),
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_cancel_is_shared_by_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());

        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[tokio::test]
    async fn test_run_until_cancelled_completes() {
        let token = CancellationToken::new();
        assert_eq!(token.run_until_cancelled(async { 42 }).await, Some(42));
    }

    #[tokio::test]
    async fn test_run_until_cancelled_drops_future() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });

        let outcome = token
            .run_until_cancelled(async {
                tokio::time::sleep(Duration::from_secs(1000)).await;
                "loaded"
            })
            .await;
        assert_eq!(outcome, None);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_wins() {
        let token = CancellationToken::new();
        token.cancel();
        assert_eq!(token.run_until_cancelled(async { 1 }).await, None);
    }
}
