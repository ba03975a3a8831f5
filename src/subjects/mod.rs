//! The `subjects` module provides multicasting sources. Subjects serve both as
//! observers and observables, allowing multiple observers to subscribe to a
//! single source and receive the same emissions.
//!
//! Subjects are split into emitter and receiver using the `emitter_receiver`
//! function. The emitter behaves as an `Observer` and the receiver functions as
//! a subscribeable source.
//!
//! `BehaviorSubject` additionally replays its latest value to every new
//! subscriber, which makes it the natural carrier for a lifecycle: a binding
//! created mid-lifecycle learns the current phase right away.
//!
//! Observers are called without holding the subject's lock, so a callback may
//! unsubscribe itself or other observers while an emission is in flight. A
//! callback may also emit into the subject it is observing: the nested event is
//! queued and delivered to that observer once its current callback returns.

mod behavior_subject;
mod subject;

pub use behavior_subject::*;
pub use subject::*;

use std::{
    collections::VecDeque,
    error::Error,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use parking_lot::Mutex;

use crate::{observer::Observer, subscribe::Subscriber};

pub(crate) type SharedSubscriber<T> = Arc<QueuedObserver<T>>;

enum Event<T> {
    Next(T),
    Error(Arc<dyn Error + Send + Sync>),
    Complete,
}

/// A registered subscriber fed through a queue.
///
/// Whoever finds the queue idle drains it, and everyone else only enqueues.
/// Events therefore reach the subscriber one at a time and in enqueue order,
/// including events emitted from inside the subscriber's own callbacks.
pub(crate) struct QueuedObserver<T> {
    subscriber: Mutex<Subscriber<T>>,
    pending: Mutex<VecDeque<Event<T>>>,
    wip: AtomicUsize,
}

impl<T> QueuedObserver<T> {
    pub(crate) fn new(subscriber: Subscriber<T>) -> Arc<Self> {
        Arc::new(QueuedObserver {
            subscriber: Mutex::new(subscriber),
            pending: Mutex::new(VecDeque::new()),
            wip: AtomicUsize::new(0),
        })
    }

    pub(crate) fn next(&self, v: T) {
        self.enqueue_next(v);
        self.drain();
    }

    pub(crate) fn error(&self, e: Arc<dyn Error + Send + Sync>) {
        self.pending.lock().push_back(Event::Error(e));
        self.drain();
    }

    pub(crate) fn complete(&self) {
        self.pending.lock().push_back(Event::Complete);
        self.drain();
    }

    /// Queues `v` without delivering it. Pair with [`drain`](Self::drain).
    pub(crate) fn enqueue_next(&self, v: T) {
        self.pending.lock().push_back(Event::Next(v));
    }

    pub(crate) fn drain(&self) {
        if self.wip.fetch_add(1, Ordering::AcqRel) != 0 {
            return;
        }
        let mut missed = 1;
        loop {
            loop {
                // The queue lock is released before the callback runs.
                let event = self.pending.lock().pop_front();
                let Some(event) = event else { break };
                let mut subscriber = self.subscriber.lock();
                match event {
                    Event::Next(v) => subscriber.next(v),
                    Event::Error(e) => subscriber.error(e),
                    Event::Complete => subscriber.complete(),
                }
            }
            missed = self.wip.fetch_sub(missed, Ordering::AcqRel) - missed;
            if missed == 0 {
                break;
            }
        }
    }
}

/// Keyed registry of the observers of one subject.
pub(crate) struct Observers<T> {
    entries: Vec<(u64, SharedSubscriber<T>)>,
    next_key: u64,
}

impl<T> Observers<T> {
    pub(crate) fn new() -> Self {
        Observers {
            entries: Vec::with_capacity(16),
            next_key: 0,
        }
    }

    pub(crate) fn insert(&mut self, s: SharedSubscriber<T>) -> u64 {
        let key = self.next_key;
        self.next_key += 1;
        self.entries.push((key, s));
        key
    }

    pub(crate) fn remove(&mut self, key: u64) {
        self.entries.retain(|(k, _)| *k != key);
    }

    pub(crate) fn snapshot(&self) -> Vec<SharedSubscriber<T>> {
        self.entries.iter().map(|(_, s)| Arc::clone(s)).collect()
    }

    pub(crate) fn drain(&mut self) -> Vec<SharedSubscriber<T>> {
        self.entries.drain(..).map(|(_, s)| s).collect()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
