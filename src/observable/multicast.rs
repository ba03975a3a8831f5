//! Module for handling observables with multicast capabilities.
//!
//! A [`Connectable`] shares one subscription to an underlying source between all
//! of its subscribers. Nothing flows until [`Connectable::connect`] is called, so
//! every subscriber registered before connecting observes exactly the same
//! sequence, starting from the same first value.

use std::sync::Arc;

use crate::{
    observable::SharedSource,
    subjects::{Subject, SubjectEmitter, SubjectReceiver},
    subscribe::{Subscribeable, Subscriber, Subscription, UnsubscribeLogic},
    subscription::SubscriptionSlot,
    Observable,
};

/// Multicasting observable with a `connect()` method for creating the shared
/// subscription to an underlying source.
///
/// Subscribers are sunk into an internal `Subject`. Once connected, the source
/// emits into that `Subject`, and it forwards each emission to all registered
/// subscribers in registration order.
pub struct Connectable<T> {
    source: SharedSource<T>,
    state_subject: (SubjectEmitter<T>, SubjectReceiver<T>),
    connection: Arc<SubscriptionSlot>,
}

impl<T: Clone + Send + 'static> Connectable<T> {
    /// Creates a new `Connectable` over `source`.
    ///
    /// Typically the [`connectable()`] operator is used instead.
    ///
    /// [`connectable()`]: ../trait.ObservableExt.html#method.connectable
    pub fn new(source: Observable<T>) -> Self {
        Connectable::from_shared(source.into_shared())
    }

    pub(crate) fn from_shared(source: SharedSource<T>) -> Self {
        Connectable {
            source,
            state_subject: Subject::emitter_receiver(),
            connection: Arc::new(SubscriptionSlot::new()),
        }
    }

    /// Returns an `Observable` view of the shared sequence.
    ///
    /// Every view subscribes to the same internal `Subject`, so operators
    /// applied to different views still agree on every position of the
    /// sequence once connected.
    pub fn observe(&self) -> Observable<T> {
        Observable::from(self.state_subject.1.clone())
    }

    /// Connects the `Connectable` observable, allowing it to emit values to
    /// its subscribers.
    ///
    /// The returned subscription disconnects the source from every subscriber
    /// and can be used to await the source when it is asynchronous.
    #[must_use]
    pub fn connect(self) -> Subscription {
        // Turn `SubjectEmitter` into `Subscriber` so the source drives every
        // subscriber sunk into the `Subject`.
        let mut subscription = (self.source)(self.state_subject.0.clone().into());

        let subscription_future = subscription.subscription_future.take();
        self.connection.set(subscription);

        let connection = Arc::clone(&self.connection);
        Subscription::new(
            UnsubscribeLogic::Logic(Box::new(move || connection.dispose())),
            subscription_future,
        )
    }
}

impl<T: Send + 'static> Subscribeable for Connectable<T> {
    type ObsType = T;

    fn subscribe(&mut self, s: Subscriber<Self::ObsType>) -> Subscription {
        self.state_subject.1.subscribe(s)
    }
}
