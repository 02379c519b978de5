//! Per-invocation dialog sessions.
//!
//! A [`DialogHost`] shows at most one dialog at a time. Opening a new one
//! supersedes the previous session, whose waiter then sees a cancellation.

use tokio::sync::{Mutex, oneshot};
use tracing::debug;

pub struct DialogHost<T> {
    pending: Mutex<Option<oneshot::Sender<Option<T>>>>,
}

impl<T> Default for DialogHost<T> {
    fn default() -> Self {
        Self {
            pending: Mutex::new(None),
        }
    }
}

impl<T: Send> DialogHost<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session, superseding any session still open.
    pub async fn open(&self) -> DialogSession<T> {
        let (sender, receiver) = oneshot::channel();
        if self.pending.lock().await.replace(sender).is_some() {
            debug!("Superseding an open dialog session");
        }
        DialogSession { receiver }
    }

    pub async fn is_open(&self) -> bool {
        self.pending.lock().await.is_some()
    }

    /// Resolve the open session with `value`. Returns false when no session
    /// was waiting.
    pub async fn confirm(&self, value: T) -> bool {
        match self.pending.lock().await.take() {
            Some(sender) => sender.send(Some(value)).is_ok(),
            None => false,
        }
    }

    pub async fn cancel(&self) -> bool {
        match self.pending.lock().await.take() {
            Some(sender) => sender.send(None).is_ok(),
            None => false,
        }
    }
}

/// Waiting side of one dialog
pub struct DialogSession<T> {
    receiver: oneshot::Receiver<Option<T>>,
}

impl<T> DialogSession<T> {
    /// The confirmed value, or `None` when cancelled or superseded.
    pub async fn response(self) -> Option<T> {
        self.receiver.await.ok().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_confirm_resolves_session() {
        let host = DialogHost::new();
        let session = host.open().await;
        assert!(host.confirm(vec![1, 0]).await);
        assert_eq!(session.response().await, Some(vec![1, 0]));
        assert!(!host.is_open().await);
    }

    #[tokio::test]
    async fn test_cancel_resolves_to_none() {
        let host: DialogHost<u8> = DialogHost::new();
        let session = host.open().await;
        assert!(host.cancel().await);
        assert_eq!(session.response().await, None);
    }

    #[tokio::test]
    async fn test_new_session_supersedes_old_one() {
        let host = DialogHost::new();
        let first = host.open().await;
        let second = host.open().await;
        assert!(host.confirm("second").await);
        assert_eq!(first.response().await, None);
        assert_eq!(second.response().await, Some("second"));
    }
}
