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

/// A `Subject` represents a unique variant of an `Observable` that enables
/// multicasting values to multiple `Observers`.
///
/// Unlike regular `Observables`, which are unicast (each subscribed `Observer` has
/// its independent execution of the `Observable`), `Subjects` are multicast.
/// Values are not stored: a late subscriber only sees what is emitted after it
/// registered.
///
/// If the subject terminated, new subscribers receive the terminal notification
/// immediately.
///
/// # Examples
///
///```no_run
/// use rxr_lifecycle::{subjects::Subject, subscribe::Subscriber};
/// use rxr_lifecycle::{Observer, Subscribeable};
///
/// let (mut emitter, mut receiver) = Subject::emitter_receiver();
///
/// receiver.subscribe(Subscriber::on_next(|v: i32| println!("emitted {}", v)));
///
/// emitter.next(101);
/// emitter.complete();
///```
pub struct Subject<T> {
    observers: Observers<T>,
    completed: bool,
    closed: bool,
    error: Option<Arc<dyn Error + Send + Sync>>,
}

impl<T: 'static> Subject<T> {
    /// Creates a new pair of `SubjectEmitter` for emitting values and
    /// `SubjectReceiver` for subscribing to values.
    #[must_use]
    pub fn emitter_receiver() -> (SubjectEmitter<T>, SubjectReceiver<T>) {
        let s = Arc::new(Mutex::new(Subject {
            observers: Observers::new(),
            completed: false,
            closed: false,
            error: None,
        }));

        (
            SubjectEmitter(Arc::clone(&s)),
            SubjectReceiver(Arc::clone(&s)),
        )
    }
}

/// Subscription handler for `Subject`.
///
/// `SubjectReceiver` acts as an `Observable`, allowing you to utilize its
/// `subscribe` method for receiving emissions from the `Subject`'s multicasting.
/// Its `unsubscribe` method closes the `Subject` and removes registered observers.
pub struct SubjectReceiver<T>(Arc<Mutex<Subject<T>>>);

/// Multicasting emitter for `Subject`.
pub struct SubjectEmitter<T>(Arc<Mutex<Subject<T>>>);

// Shallow clones: both only copy the pointer to the `Subject`.
impl<T> Clone for SubjectReceiver<T> {
    fn clone(&self) -> Self {
        SubjectReceiver(Arc::clone(&self.0))
    }
}

impl<T> Clone for SubjectEmitter<T> {
    fn clone(&self) -> Self {
        SubjectEmitter(Arc::clone(&self.0))
    }
}

impl<T> SubjectReceiver<T> {
    // Address of the shared subject, stable for as long as any handle lives.
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
}

impl<T: Send + 'static> Subscribeable for SubjectReceiver<T> {
    type ObsType = T;

    fn subscribe(&mut self, mut v: Subscriber<Self::ObsType>) -> Subscription {
        let key = {
            let mut src = self.0.lock();

            // When closed Subject does not emit nor subscribes.
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
            src.observers.insert(QueuedObserver::new(v))
        };

        let source_cloned = Arc::clone(&self.0);

        Subscription::new(
            UnsubscribeLogic::Logic(Box::new(move || {
                source_cloned.lock().observers.remove(key);
            })),
            SubscriptionHandle::Nil,
        )
    }
}

impl<T> Unsubscribeable for SubjectReceiver<T> {
    fn unsubscribe(self) {
        let mut r = self.0.lock();
        r.closed = true;
        r.observers.clear();
    }
}

impl<T> SubjectEmitter<T> {
    fn live_observers(&self) -> Option<Vec<SharedSubscriber<T>>> {
        let src = self.0.lock();
        if src.completed || src.closed {
            return None;
        }
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

impl<T: Clone> Observer for SubjectEmitter<T> {
    type NextFnType = T;

    fn next(&mut self, v: Self::NextFnType) {
        if let Some(observers) = self.live_observers() {
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

impl<T: Clone + Send + 'static> From<SubjectEmitter<T>> for Subscriber<T> {
    fn from(value: SubjectEmitter<T>) -> Self {
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

impl<T: Send + 'static> From<SubjectReceiver<T>> for Observable<T> {
    fn from(value: SubjectReceiver<T>) -> Self {
        Observable::new(move |subscriber| value.clone().subscribe(subscriber))
    }
}
