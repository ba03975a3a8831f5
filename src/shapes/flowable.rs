use std::sync::{
    atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    Arc,
};

use parking_lot::Mutex;

use crate::{
    observer::Observer,
    subscribe::{Subscriber, Subscription, SubscriptionHandle, UnsubscribeLogic, Unsubscribeable},
};

type DrainFn = Box<dyn FnMut(&Demand) + Send>;

struct DemandState {
    requested: AtomicU64,
    cancelled: AtomicBool,
    wip: AtomicUsize,
    drain: Mutex<Option<DrainFn>>,
}

/// Outstanding request count shared between a `Flowable` producer and its
/// consumer.
///
/// The consumer calls [`request`](Demand::request); the producer emits only
/// after a successful [`try_take`](Demand::try_take). A request of
/// `u64::MAX` means unbounded.
#[derive(Clone)]
pub struct Demand(Arc<DemandState>);

impl Demand {
    pub(crate) fn new() -> Self {
        Demand(Arc::new(DemandState {
            requested: AtomicU64::new(0),
            cancelled: AtomicBool::new(false),
            wip: AtomicUsize::new(0),
            drain: Mutex::new(None),
        }))
    }

    /// Adds `n` to the outstanding demand and runs the producer's drain hook.
    pub fn request(&self, n: u64) {
        if n == 0 || self.is_cancelled() {
            return;
        }
        let _ = self
            .0
            .requested
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |r| {
                Some(r.saturating_add(n))
            });
        self.drain();
    }

    /// Consumes one unit of demand. Returns `false` when nothing is requested or
    /// the consumer cancelled.
    pub fn try_take(&self) -> bool {
        if self.is_cancelled() {
            return false;
        }
        self.0
            .requested
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |r| match r {
                0 => None,
                u64::MAX => Some(u64::MAX),
                r => Some(r - 1),
            })
            .is_ok()
    }

    #[must_use]
    pub fn outstanding(&self) -> u64 {
        self.0.requested.load(Ordering::Acquire)
    }

    /// Stops the producer. Further requests are ignored.
    pub fn cancel(&self) {
        self.0.cancelled.store(true, Ordering::Release);
        // The hook may be running on this very call stack; it is dropped at the
        // end of that drain pass instead.
        if let Some(mut drain) = self.0.drain.try_lock() {
            *drain = None;
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.cancelled.load(Ordering::Acquire)
    }

    /// Registers the producer's drain hook, called whenever demand grows.
    ///
    /// Calls are serialized: a `request` issued while the hook runs, from the
    /// same call stack or another thread, schedules one more pass instead of
    /// re-entering it.
    pub fn on_request(&self, drain: impl FnMut(&Demand) + Send + 'static) {
        *self.0.drain.lock() = Some(Box::new(drain));
        if self.outstanding() > 0 {
            self.drain();
        }
    }

    fn drain(&self) {
        if self.0.wip.fetch_add(1, Ordering::AcqRel) != 0 {
            return;
        }
        let mut missed = 1;
        loop {
            {
                let mut hook = self.0.drain.lock();
                if let Some(drain) = hook.as_mut() {
                    drain(self);
                }
                if self.is_cancelled() {
                    *hook = None;
                }
            }
            missed = self.0.wip.fetch_sub(missed, Ordering::AcqRel) - missed;
            if missed == 0 {
                break;
            }
        }
    }
}

/// A multi-value stream that honors its consumer's requested demand.
pub struct Flowable<T> {
    subscribe_fn: Box<dyn FnMut(Subscriber<T>, Demand) -> Subscription + Send + Sync>,
}

impl<T: 'static> Flowable<T> {
    /// Creates a new `Flowable`. The subscribe function receives the consumer
    /// and the `Demand` it must respect.
    pub fn new(
        sf: impl FnMut(Subscriber<T>, Demand) -> Subscription + Send + Sync + 'static,
    ) -> Self {
        Flowable {
            subscribe_fn: Box::new(sf),
        }
    }

    /// Emits the items of `iter` as they are requested, then completes.
    pub fn from_iter<I>(iter: I) -> Self
    where
        T: Send,
        I: IntoIterator<Item = T> + Clone + Send + Sync + 'static,
        I::IntoIter: Send + 'static,
    {
        Flowable::new(move |mut subscriber, demand| {
            let mut items = iter.clone().into_iter().peekable();
            if items.peek().is_none() {
                subscriber.complete();
                return Subscription::new(UnsubscribeLogic::Nil, SubscriptionHandle::Nil);
            }

            demand.on_request(move |demand| {
                while items.peek().is_some() && demand.try_take() {
                    if let Some(v) = items.next() {
                        subscriber.next(v);
                    }
                    if items.peek().is_none() {
                        subscriber.complete();
                        demand.cancel();
                    }
                }
            });

            let demand = demand.clone();
            Subscription::new(
                UnsubscribeLogic::Logic(Box::new(move || demand.cancel())),
                SubscriptionHandle::Nil,
            )
        })
    }

    /// Subscribes with a fresh `Demand`. Nothing is emitted until the returned
    /// `FlowSubscription` requests items.
    pub fn subscribe(&mut self, s: Subscriber<T>) -> FlowSubscription {
        let demand = Demand::new();
        let subscription = self.subscribe_with(s, demand.clone());
        FlowSubscription {
            demand,
            subscription,
        }
    }

    pub(crate) fn subscribe_with(&mut self, s: Subscriber<T>, demand: Demand) -> Subscription {
        (self.subscribe_fn)(s, demand)
    }
}

/// Subscription to a `Flowable`, used to request items and to cancel.
pub struct FlowSubscription {
    demand: Demand,
    subscription: Subscription,
}

impl FlowSubscription {
    pub fn request(&self, n: u64) {
        self.demand.request(n);
    }

    #[must_use]
    pub fn demand(&self) -> Demand {
        self.demand.clone()
    }
}

impl Unsubscribeable for FlowSubscription {
    fn unsubscribe(self) {
        self.demand.cancel();
        self.subscription.unsubscribe();
    }
}
