use std::{error::Error, sync::Arc};

use parking_lot::Mutex;

use crate::{
    observer::Observer,
    subscription::subscribe::{
        Subscribeable, Subscriber, Subscription, SubscriptionHandle, UnsubscribeLogic,
        Unsubscribeable,
    },
    Observable,
};

use super::{Observers, QueuedObserver, SharedSubscriber};

/// A `BehaviorSubject` stores the latest value emitted to it and hands that value
/// to every new subscriber before any further emissions.
///
/// # Examples
///
///```no_run
/// use rxr_lifecycle::{subjects::BehaviorSubject, subscribe::Subscriber};
/// use rxr_lifecycle::{Observer, Subscribeable};
///
/// let (mut emitter, mut receiver) = BehaviorSubject::emitter_receiver("created");
///
/// emitter.next("started");
///
/// // Receives "started" right away, then "resumed".
/// receiver.subscribe(Subscriber::on_next(|v| println!("phase {}", v)));
/// emitter.next("resumed");
///```
pub struct BehaviorSubject<T> {
    value: T,
    observers: Observers<T>,
    completed: bool,
    closed: bool,
    error: Option<Arc<dyn Error + Send + Sync>>,
}

impl<T: Clone + Send + 'static> BehaviorSubject<T> {
    /// Creates a new pair of `BehaviorSubjectEmitter` and `BehaviorSubjectReceiver`
    /// holding `value` as the current value.
    pub fn emitter_receiver(value: T) -> (BehaviorSubjectEmitter<T>, BehaviorSubjectReceiver<T>) {
        let s = Arc::new(Mutex::new(BehaviorSubject {
            value,
            observers: Observers::new(),
            completed: false,
            closed: false,
            error: None,
        }));

        (
            BehaviorSubjectEmitter(Arc::clone(&s)),
            BehaviorSubjectReceiver(Arc::clone(&s)),
        )
    }
}

/// Subscription handler for `BehaviorSubject`.
pub struct BehaviorSubjectReceiver<T>(Arc<Mutex<BehaviorSubject<T>>>);

/// Multicasting emitter for `BehaviorSubject`.
pub struct BehaviorSubjectEmitter<T>(Arc<Mutex<BehaviorSubject<T>>>);

impl<T> Clone for BehaviorSubjectReceiver<T> {
    fn clone(&self) -> Self {
        BehaviorSubjectReceiver(Arc::clone(&self.0))
    }
}

impl<T> Clone for BehaviorSubjectEmitter<T> {
    fn clone(&self) -> Self {
        BehaviorSubjectEmitter(Arc::clone(&self.0))
    }
}

impl<T: Clone> BehaviorSubjectReceiver<T> {
    pub(crate) fn id(&self) -> usize {
        Arc::as_ptr(&self.0).cast::<()>() as usize
    }

    /// Returns the number of registered observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.lock().observers.len()
    }

    /// Returns `true` if no observers are registered, `false` otherwise.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the stored value.
    #[must_use]
    pub fn value(&self) -> T {
        self.0.lock().value.clone()
    }

    /// `true` once the subject completed, errored or was closed.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        let src = self.0.lock();
        src.completed || src.closed
    }
}

impl<T: Clone + Send + 'static> Subscribeable for BehaviorSubjectReceiver<T> {
    type ObsType = T;

    fn subscribe(&mut self, mut v: Subscriber<Self::ObsType>) -> Subscription {
        let mut src = self.0.lock();

        if src.closed {
            return Subscription::new(UnsubscribeLogic::Nil, SubscriptionHandle::Nil);
        }
        if src.completed {
            let err = src.error.clone();
            drop(src);
            match err {
                Some(err) => v.error(err),
                None => v.complete(),
            }
            return Subscription::new(UnsubscribeLogic::Nil, SubscriptionHandle::Nil);
        }

        // Queue the replayed value while registering, so an emission racing this
        // subscribe is delivered after it.
        let observer = QueuedObserver::new(v);
        let key = src.observers.insert(Arc::clone(&observer));
        observer.enqueue_next(src.value.clone());
        drop(src);

        observer.drain();

        let source_cloned = Arc::clone(&self.0);

        Subscription::new(
            UnsubscribeLogic::Logic(Box::new(move || {
                source_cloned.lock().observers.remove(key);
            })),
            SubscriptionHandle::Nil,
        )
    }
}

impl<T> Unsubscribeable for BehaviorSubjectReceiver<T> {
    fn unsubscribe(self) {
        let mut r = self.0.lock();
        r.closed = true;
        r.observers.clear();
    }
}

impl<T: Clone> BehaviorSubjectEmitter<T> {
    fn store(&self, v: &T) -> Option<Vec<SharedSubscriber<T>>> {
        let mut src = self.0.lock();
        if src.completed || src.closed {
            return None;
        }
        src.value = v.clone();
        Some(src.observers.snapshot())
    }

    fn terminate(&self, error: Option<Arc<dyn Error + Send + Sync>>) -> Vec<SharedSubscriber<T>> {
        let mut src = self.0.lock();
        if src.completed || src.closed {
            return Vec::new();
        }
        src.completed = true;
        src.error = error;
        src.observers.drain()
    }
}

impl<T: Clone> Observer for BehaviorSubjectEmitter<T> {
    type NextFnType = T;

    fn next(&mut self, v: Self::NextFnType) {
        if let Some(observers) = self.store(&v) {
            for o in observers {
                o.next(v.clone());
            }
        }
    }

    fn error(&mut self, e: Arc<dyn Error + Send + Sync>) {
        for o in self.terminate(Some(Arc::clone(&e))) {
            o.error(Arc::clone(&e));
        }
    }

    fn complete(&mut self) {
        for o in self.terminate(None) {
            o.complete();
        }
    }
}

impl<T: Clone + Send + 'static> From<BehaviorSubjectEmitter<T>> for Subscriber<T> {
    fn from(value: BehaviorSubjectEmitter<T>) -> Self {
        let mut vn = value.clone();
        let mut ve = value.clone();
        let mut vc = value;
        Subscriber::new(
            move |v| {
                vn.next(v);
            },
            move |e| ve.error(e),
            move || vc.complete(),
        )
    }
}

impl<T: Clone + Send + 'static> From<BehaviorSubjectReceiver<T>> for Observable<T> {
    fn from(value: BehaviorSubjectReceiver<T>) -> Self {
        Observable::new(move |subscriber| value.clone().subscribe(subscriber))
    }
}
