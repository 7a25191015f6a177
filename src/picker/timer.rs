//! Single-slot timers
//!
//! A [`Debouncer`] holds at most one pending timer. Scheduling again aborts
//! the previous one, and every fired event carries the generation it was
//! scheduled with so an event that was already queued when the timer was
//! replaced can be recognised and dropped.

use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

#[derive(Debug, Default)]
pub(crate) struct Debouncer {
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

impl Debouncer {
    /// Replace any pending timer with one that sends `make(generation)`
    /// after `delay`
    pub fn schedule<E, F>(&mut self, delay: Duration, tx: &UnboundedSender<E>, make: F)
    where
        E: Send + 'static,
        F: FnOnce(u64) -> E,
    {
        self.cancel();
        self.generation += 1;

        let event = make(self.generation);
        let tx = tx.clone();
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(event);
        }));
    }

    /// Drop the pending timer, if any
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Accept a fired event
    ///
    /// Returns true only for the most recently scheduled, still pending
    /// timer; the slot is then empty.
    pub fn fire(&mut self, generation: u64) -> bool {
        if self.handle.is_some() && generation == self.generation {
            self.handle = None;
            true
        } else {
            false
        }
    }

    pub fn is_pending(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn test_only_last_schedule_fires() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut debouncer = Debouncer::default();

        debouncer.schedule(Duration::from_millis(300), &tx, |g| g);
        debouncer.schedule(Duration::from_millis(300), &tx, |g| g);
        debouncer.schedule(Duration::from_millis(300), &tx, |g| g);

        let generation = rx.recv().await.unwrap();
        assert_eq!(generation, 3);
        assert!(debouncer.fire(generation));
        assert!(!debouncer.is_pending());

        drop(tx);
        drop(debouncer);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_generation_rejected() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut debouncer = Debouncer::default();

        debouncer.schedule(Duration::from_millis(10), &tx, |g| g);
        let first = rx.recv().await.unwrap();

        // Rescheduled before the queued event was handled
        debouncer.schedule(Duration::from_millis(10), &tx, |g| g);
        assert!(!debouncer.fire(first));
        assert!(debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel() {
        let (tx, mut rx) = mpsc::unbounded_channel::<u64>();
        let mut debouncer = Debouncer::default();

        debouncer.schedule(Duration::from_millis(10), &tx, |g| g);
        debouncer.cancel();
        assert!(!debouncer.is_pending());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
    }
}
