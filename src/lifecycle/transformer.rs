use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use crate::{
    lifecycle::{
        signal::{self, Policy, Signal},
        Phase, PhaseStream,
    },
    subscribe::Subscription,
};

/// Reusable binding of streams to a lifecycle.
///
/// Created by [`bind_until_event`](super::bind_until_event),
/// [`bind`](super::bind) or [`bind_with`](super::bind_with), and applied with
/// [`Compose::compose`](super::Compose::compose). Every stream it is applied to
/// gets its own termination signal, so one transformer can serve any number of
/// independent subscriptions.
///
/// Two transformers are equal when they observe the same lifecycle with the
/// same policy: the same target phase, or the same shared resolver. Binding
/// the same subject receiver twice observes the same lifecycle, as described
/// on [`PhaseStream`].
pub struct LifecycleTransformer<E> {
    lifecycle: PhaseStream<E>,
    policy: Policy<E>,
}

impl<E: Phase> LifecycleTransformer<E> {
    pub(crate) fn new(lifecycle: PhaseStream<E>, policy: Policy<E>) -> Self {
        LifecycleTransformer { lifecycle, policy }
    }

    #[must_use]
    pub fn lifecycle(&self) -> &PhaseStream<E> {
        &self.lifecycle
    }

    /// Subscribes a fresh termination signal for one bound subscription.
    pub(crate) fn signal(&self, on_signal: impl FnOnce(Signal) + Send + 'static) -> Subscription {
        signal::subscribe_signal(&self.lifecycle, &self.policy, on_signal)
    }
}

impl<E: Clone> Clone for LifecycleTransformer<E> {
    fn clone(&self) -> Self {
        LifecycleTransformer {
            lifecycle: self.lifecycle.clone(),
            policy: self.policy.clone(),
        }
    }
}

impl<E: fmt::Debug> fmt::Debug for LifecycleTransformer<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let policy = match &self.policy {
            Policy::UntilEvent(e) => format!("UntilEvent({e:?})"),
            Policy::AnyEvent => "AnyEvent".to_string(),
            Policy::Corresponding(r) => {
                format!("Corresponding({:p})", Arc::as_ptr(r).cast::<()>())
            }
        };
        f.debug_struct("LifecycleTransformer")
            .field("lifecycle", &self.lifecycle.id())
            .field("policy", &policy)
            .finish()
    }
}

impl<E: PartialEq> PartialEq for LifecycleTransformer<E> {
    fn eq(&self, other: &Self) -> bool {
        if self.lifecycle.id() != other.lifecycle.id() {
            return false;
        }
        match (&self.policy, &other.policy) {
            (Policy::UntilEvent(a), Policy::UntilEvent(b)) => a == b,
            (Policy::AnyEvent, Policy::AnyEvent) => true,
            (Policy::Corresponding(a), Policy::Corresponding(b)) => {
                Arc::as_ptr(a).cast::<()>() == Arc::as_ptr(b).cast::<()>()
            }
            _ => false,
        }
    }
}

impl<E: Eq> Eq for LifecycleTransformer<E> {}

impl<E: Hash> Hash for LifecycleTransformer<E> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.lifecycle.id().hash(state);
        match &self.policy {
            Policy::UntilEvent(e) => {
                0u8.hash(state);
                e.hash(state);
            }
            Policy::AnyEvent => 1u8.hash(state),
            Policy::Corresponding(r) => {
                2u8.hash(state);
                Arc::as_ptr(r).cast::<()>().hash(state);
            }
        }
    }
}
