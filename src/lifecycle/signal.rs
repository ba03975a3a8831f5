//! Termination signals derived from a lifecycle.
//!
//! A signal is delivered at most once, to a single callback. It is either
//! [`Signal::Fire`] (the lifecycle reached the point that ends the binding) or
//! [`Signal::Fault`] (the phase active at subscribe time could not be resolved).

use std::{error::Error, sync::Arc};

use parking_lot::Mutex;

use crate::{
    errors::{LifecycleError, ResolveError},
    lifecycle::{resolver::resolve_guarded, CorrespondingEvents, Phase, PhaseStream},
    observable::ObservableExt,
    subscribe::{Subscribeable, Subscriber, Subscription, SubscriptionHandle, UnsubscribeLogic},
    subscription::SubscriptionSlot,
    Unsubscribeable,
};

pub(crate) enum Signal {
    Fire,
    Fault(Arc<dyn Error + Send + Sync>),
}

/// Which phases end a binding.
pub(crate) enum Policy<E> {
    UntilEvent(E),
    AnyEvent,
    Corresponding(Arc<dyn CorrespondingEvents<E>>),
}

impl<E: Clone> Clone for Policy<E> {
    fn clone(&self) -> Self {
        match self {
            Policy::UntilEvent(e) => Policy::UntilEvent(e.clone()),
            Policy::AnyEvent => Policy::AnyEvent,
            Policy::Corresponding(r) => Policy::Corresponding(Arc::clone(r)),
        }
    }
}

type SignalFn = Box<dyn FnOnce(Signal) + Send>;

/// Single-shot delivery of a `Signal`, shared by every observer the policy
/// installs on the lifecycle.
#[derive(Clone)]
struct SignalSink(Arc<Mutex<Option<SignalFn>>>);

impl SignalSink {
    fn new(on_signal: impl FnOnce(Signal) + Send + 'static) -> Self {
        SignalSink(Arc::new(Mutex::new(Some(Box::new(on_signal)))))
    }

    fn deliver(&self, signal: Signal) {
        // Take the callback out first, it may dispose the lifecycle subscription
        // that owns this sink.
        let on_signal = self.0.lock().take();
        if let Some(on_signal) = on_signal {
            on_signal(signal);
        }
    }
}

// Phase streams that end or fail without reaching the terminating phase leave
// the bound stream to its own termination.
fn signal_subscriber<E: 'static>(on_next: impl FnMut(E) + Send + 'static) -> Subscriber<E> {
    Subscriber::new(
        on_next,
        |e| tracing::debug!(error = %e, "lifecycle failed before the binding ended"),
        || tracing::debug!("lifecycle completed before the binding ended"),
    )
}

/// Subscribes to `lifecycle` and calls `on_signal` at most once, when `policy`
/// says the binding ends.
///
/// The returned subscription releases every lifecycle subscription made here.
pub(crate) fn subscribe_signal<E: Phase>(
    lifecycle: &PhaseStream<E>,
    policy: &Policy<E>,
    on_signal: impl FnOnce(Signal) + Send + 'static,
) -> Subscription {
    let sink = SignalSink::new(on_signal);
    match policy {
        Policy::UntilEvent(event) => {
            let event = event.clone();
            lifecycle
                .observable()
                .filter(move |phase| *phase == event)
                .take(1)
                .subscribe(signal_subscriber(move |_| sink.deliver(Signal::Fire)))
        }
        Policy::AnyEvent => lifecycle
            .observable()
            .take(1)
            .subscribe(signal_subscriber(move |_| sink.deliver(Signal::Fire))),
        Policy::Corresponding(resolver) => corresponding(lifecycle, Arc::clone(resolver), sink),
    }
}

// Resolves the first phase to a target, then fires on the first later phase
// equal to it. Both halves observe one connection to the lifecycle, so they
// agree on which phase came first. The connection is dropped before the signal
// is delivered.
fn corresponding<E: Phase>(
    lifecycle: &PhaseStream<E>,
    resolver: Arc<dyn CorrespondingEvents<E>>,
    sink: SignalSink,
) -> Subscription {
    let shared = lifecycle.connectable();
    let target: Arc<Mutex<Option<E>>> = Arc::new(Mutex::new(None));
    let connection = Arc::new(SubscriptionSlot::new());

    let target_first = Arc::clone(&target);
    let sink_first = sink.clone();
    let connection_first = Arc::clone(&connection);
    let first = shared
        .observe()
        .take(1)
        .subscribe(signal_subscriber(move |phase: E| {
            match resolve_guarded(resolver.as_ref(), &phase) {
                Ok(end) => {
                    tracing::trace!("binding resolved its terminating phase");
                    *target_first.lock() = Some(end);
                }
                Err(ResolveError::AlreadyTerminal(reason)) => {
                    tracing::debug!(%reason, "binding started in a terminal phase");
                    connection_first.dispose();
                    sink_first.deliver(Signal::Fire);
                }
                Err(e @ ResolveError::UnmappablePhase(_)) => {
                    tracing::warn!(error = %e, "cannot bind to the current phase");
                    connection_first.dispose();
                    sink_first.deliver(Signal::Fault(LifecycleError::from(e).shared()));
                }
            }
        }));

    let connection_rest = Arc::clone(&connection);
    let rest = shared
        .observe()
        .skip(1)
        .filter(move |phase| target.lock().as_ref() == Some(phase))
        .take(1)
        .subscribe(signal_subscriber(move |_| {
            connection_rest.dispose();
            sink.deliver(Signal::Fire);
        }));

    connection.set(shared.connect());

    Subscription::new(
        UnsubscribeLogic::Logic(Box::new(move || {
            connection.dispose();
            first.unsubscribe();
            rest.unsubscribe();
        })),
        SubscriptionHandle::Nil,
    )
}
