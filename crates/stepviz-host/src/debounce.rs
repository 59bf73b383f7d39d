//! Trailing-edge debounce for document edits.
//!
//! Every [`ChangeDebouncer::schedule`] call cancels the pending timer and
//! starts a new one; only the last timer of a burst delivers its value.
//! There is no leading edge and no max-wait cap.

use std::marker::PhantomData;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// A value delivered when the quiet period elapses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Debounced<T> {
    pub generation: u64,
    pub value: T,
}

/// Debounces values of type `T`, delivering them as `E` (any event type
/// that can be built from a [`Debounced<T>`]).
pub struct ChangeDebouncer<T, E = Debounced<T>> {
    delay: Duration,
    generation: u64,
    pending: Option<JoinHandle<()>>,
    tx: UnboundedSender<E>,
    _value: PhantomData<fn(T)>,
}

impl<T, E> ChangeDebouncer<T, E>
where
    T: Send + 'static,
    E: From<Debounced<T>> + Send + 'static,
{
    /// Expired timers deliver their value on `tx`.
    pub fn new(delay: Duration, tx: UnboundedSender<E>) -> Self {
        ChangeDebouncer {
            delay,
            generation: 0,
            pending: None,
            tx,
            _value: PhantomData,
        }
    }

    /// (Re)starts the timer; `value` is delivered when it expires.
    pub fn schedule(&mut self, value: T) {
        self.cancel();
        let generation = self.generation;
        let deadline = Instant::now() + self.delay;
        let tx = self.tx.clone();
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let _ = tx.send(E::from(Debounced { generation, value }));
        }));
    }

    /// Cancels the pending timer, if any. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        // A timer that already fired may have a delivery queued; bumping the
        // generation makes `is_current` reject it.
        self.generation = self.generation.wrapping_add(1);
        match self.pending.take() {
            Some(handle) => {
                let was_pending = !handle.is_finished();
                handle.abort();
                was_pending
            }
            None => false,
        }
    }

    /// Whether a delivery still belongs to the latest scheduled timer.
    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    /// Whether a timer is counting down right now.
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl<T, E> Drop for ChangeDebouncer<T, E> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}
