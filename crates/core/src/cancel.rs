use std::future::Future;
use tokio::sync::watch;
use tokio::time::Instant;

/// Triggers every [`Cancellation`] cloned from the same pair.
#[derive(Debug)]
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }
}

/// Cooperative cancellation for calls to external services, fired by a
/// [`CancelHandle`] or by an optional deadline, whichever comes first.
#[derive(Debug, Clone)]
pub struct Cancellation {
    receiver: watch::Receiver<bool>,
    deadline: Option<Instant>,
}

impl Cancellation {
    pub fn new() -> (CancelHandle, Self) {
        let (sender, receiver) = watch::channel(false);
        (
            CancelHandle { sender },
            Self {
                receiver,
                deadline: None,
            },
        )
    }

    /// A token that only its deadline (if any) can fire.
    pub fn never() -> Self {
        let (_handle, token) = Self::new();
        token
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow() || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        let signal = async move {
            loop {
                if *receiver.borrow_and_update() {
                    return;
                }
                if receiver.changed().await.is_err() {
                    // Handle dropped without firing.
                    std::future::pending::<()>().await;
                }
            }
        };

        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = signal => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => signal.await,
        }
    }

    /// Runs `future` to completion unless cancellation fires first.
    pub async fn run<F: Future>(&self, future: F) -> Option<F::Output> {
        if self.is_cancelled() {
            return None;
        }

        tokio::select! {
            biased;
            _ = self.cancelled() => None,
            output = future => Some(output),
        }
    }
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::never()
    }
}

#[cfg(test)]
mod tests {
    use super::Cancellation;
    use std::time::Duration;
    use tokio::time::Instant;

    #[tokio::test]
    async fn handle_cancels_pending_work() {
        let (handle, token) = Cancellation::new();
        handle.cancel();
        let outcome = token.run(std::future::pending::<()>()).await;
        assert!(outcome.is_none());
        assert!(token.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_fires_without_handle() {
        let token = Cancellation::never().with_deadline(Instant::now() + Duration::from_secs(1));
        let outcome = token
            .run(tokio::time::sleep(Duration::from_secs(5)))
            .await;
        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn completes_when_not_cancelled() {
        let token = Cancellation::never();
        assert_eq!(token.run(async { 7 }).await, Some(7));
    }
}
