use std::{error::Error, sync::Arc};

use crate::subscribe::{Subscription, SubscriptionHandle, UnsubscribeLogic};

type SuccessFn<T> = Box<dyn FnOnce(T) + Send>;
type CompleteFn = Box<dyn FnOnce() + Send>;
type ErrorFn = Box<dyn FnOnce(Arc<dyn Error + Send + Sync>) + Send>;

/// Observer of a [`Maybe`]: receives one value, an empty completion or an error.
pub struct MaybeObserver<T> {
    success_fn: Option<SuccessFn<T>>,
    complete_fn: Option<CompleteFn>,
    error_fn: Option<ErrorFn>,
}

impl<T> MaybeObserver<T> {
    pub fn new(
        success_fn: impl FnOnce(T) + Send + 'static,
        error_fn: impl FnOnce(Arc<dyn Error + Send + Sync>) + Send + 'static,
        complete_fn: impl FnOnce() + Send + 'static,
    ) -> Self {
        MaybeObserver {
            success_fn: Some(Box::new(success_fn)),
            complete_fn: Some(Box::new(complete_fn)),
            error_fn: Some(Box::new(error_fn)),
        }
    }

    fn finish(&mut self) -> (Option<SuccessFn<T>>, Option<CompleteFn>, Option<ErrorFn>) {
        (
            self.success_fn.take(),
            self.complete_fn.take(),
            self.error_fn.take(),
        )
    }

    pub fn success(&mut self, v: T) {
        if let (Some(f), _, _) = self.finish() {
            f(v);
        }
    }

    pub fn complete(&mut self) {
        if let (_, Some(f), _) = self.finish() {
            f();
        }
    }

    pub fn error(&mut self, e: Arc<dyn Error + Send + Sync>) {
        if let (_, _, Some(f)) = self.finish() {
            f(e);
        }
    }

    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.success_fn.is_none() && self.complete_fn.is_none() && self.error_fn.is_none()
    }
}

/// A stream that produces at most one value.
pub struct Maybe<T> {
    subscribe_fn: Box<dyn FnMut(MaybeObserver<T>) -> Subscription + Send + Sync>,
}

impl<T: 'static> Maybe<T> {
    pub fn new(sf: impl FnMut(MaybeObserver<T>) -> Subscription + Send + Sync + 'static) -> Self {
        Maybe {
            subscribe_fn: Box::new(sf),
        }
    }

    pub fn just(value: T) -> Self
    where
        T: Clone + Send + Sync,
    {
        Maybe::new(move |mut o| {
            o.success(value.clone());
            Subscription::new(UnsubscribeLogic::Nil, SubscriptionHandle::Nil)
        })
    }

    #[must_use]
    pub fn empty() -> Self {
        Maybe::new(|mut o| {
            o.complete();
            Subscription::new(UnsubscribeLogic::Nil, SubscriptionHandle::Nil)
        })
    }

    #[must_use]
    pub fn never() -> Self {
        Maybe::new(|_| Subscription::new(UnsubscribeLogic::Nil, SubscriptionHandle::Nil))
    }

    pub fn subscribe(&mut self, o: MaybeObserver<T>) -> Subscription {
        (self.subscribe_fn)(o)
    }
}
