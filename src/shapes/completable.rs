use std::{error::Error, sync::Arc};

use crate::subscribe::{Subscription, SubscriptionHandle, UnsubscribeLogic};

type CompleteFn = Box<dyn FnOnce() + Send>;
type ErrorFn = Box<dyn FnOnce(Arc<dyn Error + Send + Sync>) + Send>;

/// Observer of a [`Completable`].
pub struct CompletableObserver {
    complete_fn: Option<CompleteFn>,
    error_fn: Option<ErrorFn>,
}

impl CompletableObserver {
    pub fn new(
        complete_fn: impl FnOnce() + Send + 'static,
        error_fn: impl FnOnce(Arc<dyn Error + Send + Sync>) + Send + 'static,
    ) -> Self {
        CompletableObserver {
            complete_fn: Some(Box::new(complete_fn)),
            error_fn: Some(Box::new(error_fn)),
        }
    }

    pub fn complete(&mut self) {
        self.error_fn = None;
        if let Some(f) = self.complete_fn.take() {
            f();
        }
    }

    pub fn error(&mut self, e: Arc<dyn Error + Send + Sync>) {
        self.complete_fn = None;
        if let Some(f) = self.error_fn.take() {
            f(e);
        }
    }

    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.complete_fn.is_none() && self.error_fn.is_none()
    }
}

/// A stream that only signals completion or failure of a side effect.
pub struct Completable {
    subscribe_fn: Box<dyn FnMut(CompletableObserver) -> Subscription + Send + Sync>,
}

impl Completable {
    pub fn new(
        sf: impl FnMut(CompletableObserver) -> Subscription + Send + Sync + 'static,
    ) -> Self {
        Completable {
            subscribe_fn: Box::new(sf),
        }
    }

    #[must_use]
    pub fn complete() -> Self {
        Completable::new(|mut o| {
            o.complete();
            Subscription::new(UnsubscribeLogic::Nil, SubscriptionHandle::Nil)
        })
    }

    pub fn error(e: Arc<dyn Error + Send + Sync>) -> Self {
        Completable::new(move |mut o| {
            o.error(Arc::clone(&e));
            Subscription::new(UnsubscribeLogic::Nil, SubscriptionHandle::Nil)
        })
    }

    #[must_use]
    pub fn never() -> Self {
        Completable::new(|_| Subscription::new(UnsubscribeLogic::Nil, SubscriptionHandle::Nil))
    }

    pub fn subscribe(&mut self, o: CompletableObserver) -> Subscription {
        (self.subscribe_fn)(o)
    }
}
