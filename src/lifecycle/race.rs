//! The race between a bound upstream and its lifecycle.
//!
//! Exactly one side finishes a binding. Whoever claims the [`Race`] first
//! disposes both subscriptions and is the only one allowed to deliver a
//! terminal event downstream.

use std::{
    error::Error,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
};

use parking_lot::Mutex;

use crate::{
    lifecycle::signal::Signal,
    observer::Observer,
    shapes::{CompletableObserver, MaybeObserver, SingleObserver},
    subscribe::{Subscriber, Subscription, SubscriptionHandle, UnsubscribeLogic},
    subscription::SubscriptionSlot,
};

/// How a binding ended, before it is mapped onto a stream shape.
pub(crate) enum Terminal {
    /// The upstream completed on its own.
    Complete,
    /// The lifecycle ended the binding.
    Cancelled,
    Error(Arc<dyn Error + Send + Sync>),
}

/// Delivery of a [`Terminal`] to one kind of downstream observer.
pub(crate) trait Terminate {
    fn terminate(&mut self, terminal: Terminal);
}

// Multi-value shapes end silently when the lifecycle wins.
impl<T> Terminate for Subscriber<T> {
    fn terminate(&mut self, terminal: Terminal) {
        match terminal {
            Terminal::Complete | Terminal::Cancelled => self.complete(),
            Terminal::Error(e) => self.error(e),
        }
    }
}

impl<T> Terminate for MaybeObserver<T> {
    fn terminate(&mut self, terminal: Terminal) {
        match terminal {
            Terminal::Complete | Terminal::Cancelled => self.complete(),
            Terminal::Error(e) => self.error(e),
        }
    }
}

// A single result was expected, losing it to the lifecycle is an error.
impl<T> Terminate for SingleObserver<T> {
    fn terminate(&mut self, terminal: Terminal) {
        match terminal {
            Terminal::Error(e) => self.error(e),
            Terminal::Complete | Terminal::Cancelled => {
                self.error(crate::errors::LifecycleError::Cancelled.shared());
            }
        }
    }
}

impl Terminate for CompletableObserver {
    fn terminate(&mut self, terminal: Terminal) {
        match terminal {
            Terminal::Complete => self.complete(),
            Terminal::Cancelled => self.error(crate::errors::LifecycleError::Cancelled.shared()),
            Terminal::Error(e) => self.error(e),
        }
    }
}

/// Fire-once guard shared by the upstream and the lifecycle of one binding.
pub(crate) struct Race {
    finished: AtomicBool,
    upstream: SubscriptionSlot,
    lifecycle: SubscriptionSlot,
}

impl Race {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Race {
            finished: AtomicBool::new(false),
            upstream: SubscriptionSlot::new(),
            lifecycle: SubscriptionSlot::new(),
        })
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Claims the binding. Only the first caller gets `true`; it has already
    /// released both subscriptions when this returns.
    pub(crate) fn claim(&self) -> bool {
        if self.finished.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.lifecycle.dispose();
        self.upstream.dispose();
        true
    }

    pub(crate) fn set_upstream(&self, s: Subscription) {
        self.upstream.set(s);
    }

    pub(crate) fn set_lifecycle(&self, s: Subscription) {
        self.lifecycle.set(s);
    }

    /// Resolves a lifecycle signal into the terminal to deliver, if the
    /// lifecycle won.
    pub(crate) fn on_signal(&self, signal: Signal) -> Option<Terminal> {
        match signal {
            Signal::Fire => {
                if self.claim() {
                    tracing::debug!("lifecycle ended the binding");
                    return Some(Terminal::Cancelled);
                }
                None
            }
            Signal::Fault(e) => {
                if self.claim() {
                    return Some(Terminal::Error(e));
                }
                tracing::warn!(error = %e, "lifecycle fault arrived after the binding ended");
                None
            }
        }
    }

    /// Resolves an upstream error into the terminal to deliver, if the upstream
    /// won.
    pub(crate) fn on_upstream_error(&self, e: Arc<dyn Error + Send + Sync>) -> Option<Terminal> {
        if self.claim() {
            return Some(Terminal::Error(e));
        }
        tracing::warn!(error = %e, "upstream error arrived after the lifecycle ended the binding");
        None
    }

    /// The subscription handed to the consumer of the bound stream. Disposing
    /// it releases both sides without delivering anything.
    pub(crate) fn subscription(self: &Arc<Self>, handle: SubscriptionHandle) -> Subscription {
        let race = Arc::clone(self);
        Subscription::new(
            UnsubscribeLogic::Logic(Box::new(move || {
                if race.claim() {
                    tracing::debug!("bound stream disposed");
                }
            })),
            handle,
        )
    }
}

/// Single-result downstream: taken out exactly once, by the race winner.
pub(crate) struct Downstream<O>(Mutex<Option<O>>);

impl<O: Terminate> Downstream<O> {
    pub(crate) fn new(observer: O) -> Arc<Self> {
        Arc::new(Downstream(Mutex::new(Some(observer))))
    }

    pub(crate) fn take(&self) -> Option<O> {
        self.0.lock().take()
    }

    pub(crate) fn terminate(&self, terminal: Terminal) {
        if let Some(mut observer) = self.take() {
            observer.terminate(terminal);
        }
    }
}

/// Multi-value downstream that serializes values and the terminal event.
///
/// Values and the terminal may arrive from different threads, or the terminal
/// may be triggered from inside a value callback. Whoever holds `wip` delivers;
/// a terminal arriving meanwhile is parked and delivered by the holder once the
/// value has been handed over.
pub(crate) struct SerializedSubscriber<T> {
    subscriber: Mutex<Option<Subscriber<T>>>,
    terminal: Mutex<Option<Terminal>>,
    wip: AtomicUsize,
}

impl<T> SerializedSubscriber<T> {
    pub(crate) fn new(subscriber: Subscriber<T>) -> Arc<Self> {
        Arc::new(SerializedSubscriber {
            subscriber: Mutex::new(Some(subscriber)),
            terminal: Mutex::new(None),
            wip: AtomicUsize::new(0),
        })
    }

    pub(crate) fn next(&self, v: T) {
        if self
            .wip
            .compare_exchange(0, 1, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        if let Some(subscriber) = self.subscriber.lock().as_mut() {
            subscriber.next(v);
        }
        if self.wip.fetch_sub(1, Ordering::AcqRel) != 1 {
            self.deliver_terminal();
        }
    }

    pub(crate) fn terminate(&self, terminal: Terminal) {
        *self.terminal.lock() = Some(terminal);
        if self.wip.fetch_add(1, Ordering::AcqRel) == 0 {
            self.deliver_terminal();
        }
    }

    fn deliver_terminal(&self) {
        let terminal = self.terminal.lock().take();
        let subscriber = self.subscriber.lock().take();
        if let (Some(terminal), Some(mut subscriber)) = (terminal, subscriber) {
            subscriber.terminate(terminal);
        }
    }
}

/// Upstream side of a multi-value binding.
pub(crate) fn upstream_subscriber<T: 'static>(
    race: &Arc<Race>,
    downstream: &Arc<SerializedSubscriber<T>>,
) -> Subscriber<T> {
    let (race_n, race_e, race_c) = (Arc::clone(race), Arc::clone(race), Arc::clone(race));
    let (down_n, down_e, down_c) = (
        Arc::clone(downstream),
        Arc::clone(downstream),
        Arc::clone(downstream),
    );

    Subscriber::new(
        move |v| {
            if !race_n.is_finished() {
                down_n.next(v);
            }
        },
        move |e| {
            if let Some(terminal) = race_e.on_upstream_error(e) {
                down_e.terminate(terminal);
            }
        },
        move || {
            if race_c.claim() {
                down_c.terminate(Terminal::Complete);
            }
        },
    )
}
