//! Replay-latest broadcast value.
//!
//! An [`Observable`] holds a current value and fans every change out to all
//! live subscribers. A new subscriber immediately receives the current value,
//! then every later value in emission order. Closed subscribers are dropped on
//! the next emission.

use std::sync::{Mutex, PoisonError};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

struct Inner<T> {
    value: T,
    subscribers: Vec<UnboundedSender<T>>,
}

/// A value with change notifications.
pub struct Observable<T> {
    inner: Mutex<Inner<T>>,
}

impl<T: Clone> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(Inner {
                value,
                subscribers: Vec::new(),
            }),
        }
    }

    /// Current value.
    pub fn get(&self) -> T {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.value.clone()
    }

    /// Replaces the value and notifies every subscriber, even when unchanged.
    pub fn set(&self, value: T) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.value = value.clone();
        inner
            .subscribers
            .retain(|tx| tx.send(value.clone()).is_ok());
    }

    /// Subscribes to changes. The returned subscription already holds the
    /// current value.
    pub fn subscribe(&self) -> Subscription<T> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let (tx, rx) = mpsc::unbounded_channel();
        if tx.send(inner.value.clone()).is_ok() {
            inner.subscribers.push(tx);
        }
        Subscription { rx }
    }

    /// Number of subscribers that were still open at the last emission.
    pub fn subscriber_count(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.subscribers.len()
    }
}

/// Receiving end of an [`Observable`].
pub struct Subscription<T> {
    rx: UnboundedReceiver<T>,
}

impl<T> Subscription<T> {
    /// Next pending value without waiting.
    pub fn try_next(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    /// Waits for the next value. Returns `None` once the observable is gone.
    pub async fn next(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// All pending values, oldest first.
    pub fn drain(&mut self) -> Vec<T> {
        std::iter::from_fn(|| self.try_next()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_subscriber_receives_current_value() {
        let flag = Observable::new(false);
        flag.set(true);

        let mut sub = flag.subscribe();
        assert_eq!(sub.try_next(), Some(true));
        assert_eq!(sub.try_next(), None);
    }

    #[test]
    fn test_values_delivered_in_emission_order() {
        let value = Observable::new(0);
        let mut first = value.subscribe();
        let mut second = value.subscribe();

        value.set(1);
        value.set(2);
        value.set(2);

        assert_eq!(first.drain(), vec![0, 1, 2, 2]);
        assert_eq!(second.drain(), vec![0, 1, 2, 2]);
        assert_eq!(value.get(), 2);
    }

    #[test]
    fn test_dropped_subscribers_are_pruned() {
        let value = Observable::new("a".to_string());
        let kept = value.subscribe();
        let dropped = value.subscribe();
        assert_eq!(value.subscriber_count(), 2);

        drop(dropped);
        value.set("b".to_string());
        assert_eq!(value.subscriber_count(), 1);
        drop(kept);
    }

    #[tokio::test]
    async fn test_next_waits_for_emission() {
        let value = std::sync::Arc::new(Observable::new(None::<u32>));
        let mut sub = value.subscribe();
        assert_eq!(sub.next().await, Some(None));

        let producer = std::sync::Arc::clone(&value);
        tokio::spawn(async move { producer.set(Some(7)) });

        assert_eq!(sub.next().await, Some(Some(7)));
    }
}
