use std::{error::Error, sync::Arc};

use crate::subscribe::{Subscription, SubscriptionHandle, UnsubscribeLogic};

type SuccessFn<T> = Box<dyn FnOnce(T) + Send>;
type ErrorFn = Box<dyn FnOnce(Arc<dyn Error + Send + Sync>) + Send>;

/// Observer of a [`Single`]: receives either one value or one error.
pub struct SingleObserver<T> {
    success_fn: Option<SuccessFn<T>>,
    error_fn: Option<ErrorFn>,
}

impl<T> SingleObserver<T> {
    pub fn new(
        success_fn: impl FnOnce(T) + Send + 'static,
        error_fn: impl FnOnce(Arc<dyn Error + Send + Sync>) + Send + 'static,
    ) -> Self {
        SingleObserver {
            success_fn: Some(Box::new(success_fn)),
            error_fn: Some(Box::new(error_fn)),
        }
    }

    pub fn success(&mut self, v: T) {
        self.error_fn = None;
        if let Some(f) = self.success_fn.take() {
            f(v);
        }
    }

    pub fn error(&mut self, e: Arc<dyn Error + Send + Sync>) {
        self.success_fn = None;
        if let Some(f) = self.error_fn.take() {
            f(e);
        }
    }

    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.success_fn.is_none() && self.error_fn.is_none()
    }
}

/// A stream that produces one value or an error.
pub struct Single<T> {
    subscribe_fn: Box<dyn FnMut(SingleObserver<T>) -> Subscription + Send + Sync>,
}

impl<T: 'static> Single<T> {
    /// Creates a new `Single` with the provided subscribe function.
    pub fn new(
        sf: impl FnMut(SingleObserver<T>) -> Subscription + Send + Sync + 'static,
    ) -> Self {
        Single {
            subscribe_fn: Box::new(sf),
        }
    }

    /// Succeeds with a clone of `value` on every subscription.
    pub fn just(value: T) -> Self
    where
        T: Clone + Send + Sync,
    {
        Single::new(move |mut o| {
            o.success(value.clone());
            Subscription::new(UnsubscribeLogic::Nil, SubscriptionHandle::Nil)
        })
    }

    /// Fails with `e` on every subscription.
    pub fn error(e: Arc<dyn Error + Send + Sync>) -> Self {
        Single::new(move |mut o| {
            o.error(Arc::clone(&e));
            Subscription::new(UnsubscribeLogic::Nil, SubscriptionHandle::Nil)
        })
    }

    /// Never produces anything.
    #[must_use]
    pub fn never() -> Self {
        Single::new(|_| Subscription::new(UnsubscribeLogic::Nil, SubscriptionHandle::Nil))
    }

    pub fn subscribe(&mut self, o: SingleObserver<T>) -> Subscription {
        (self.subscribe_fn)(o)
    }
}
