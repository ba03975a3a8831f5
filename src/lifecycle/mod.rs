//! Binding streams to a lifecycle.
//!
//! A lifecycle is a stream of phases, usually driven by whatever owns the
//! resources a subscription uses. Binding a stream to it ends the stream
//! automatically once the lifecycle reaches a chosen point:
//!
//! * [`bind_until_event`] ends the stream when one specific phase is emitted.
//! * [`bind`] ends it on the next phase, whatever it is.
//! * [`bind_with`] ends it on the phase that corresponds to the one active
//!   when the stream was subscribed, as decided by a [`CorrespondingEvents`]
//!   resolver.
//!
//! Each entry point returns a [`LifecycleTransformer`], applied to any stream
//! shape with [`Compose::compose`]. Multi-value streams and `Maybe` complete
//! silently when the lifecycle wins; `Single` and `Completable` fail with
//! [`LifecycleError::Cancelled`](crate::LifecycleError::Cancelled).
//!
//! ```no_run
//! use rxr_lifecycle::{
//!     bind_with, subjects::BehaviorSubject, subscribe::Subscriber, Compose,
//!     CorrespondenceTable, Observable, Observer, Subscribeable,
//! };
//!
//! #[derive(Debug, Clone, Copy, PartialEq)]
//! enum Phase { Start, Resume, Pause, Stop }
//!
//! let table = CorrespondenceTable::builder()
//!     .map(Phase::Start, Phase::Stop)
//!     .map(Phase::Resume, Phase::Pause)
//!     .map(Phase::Pause, Phase::Stop)
//!     .terminal(Phase::Stop)
//!     .build()
//!     .unwrap();
//!
//! let (mut phases, lifecycle) = BehaviorSubject::emitter_receiver(Phase::Start);
//! let (mut values, source) = rxr_lifecycle::subjects::Subject::emitter_receiver();
//!
//! let transformer = bind_with(lifecycle, table);
//! Observable::from(source)
//!     .compose(&transformer)
//!     .subscribe(Subscriber::on_next(|v: u32| println!("{v}")));
//!
//! values.next(1);
//! phases.next(Phase::Resume);
//! values.next(2);
//! phases.next(Phase::Stop); // ends the binding started in `Start`
//! values.next(3); // not delivered
//! ```

mod adapters;
mod provider;
mod race;
mod resolver;
mod signal;
mod transformer;

pub use adapters::Compose;
pub use provider::*;
pub use resolver::*;
pub use transformer::LifecycleTransformer;

use std::sync::Arc;

use crate::{
    observable::{Connectable, SharedSource},
    subjects::{BehaviorSubjectReceiver, SubjectReceiver},
    subscribe::{Subscribeable, Subscriber, Subscription},
    Observable,
};

use signal::Policy;

/// Bounds every phase type satisfies.
///
/// Implemented for anything comparable, cloneable and shareable across threads.
pub trait Phase: PartialEq + Clone + Send + Sync + 'static {}

impl<E> Phase for E where E: PartialEq + Clone + Send + Sync + 'static {}

/// Shared handle to the stream of phases a binding observes.
///
/// Identity follows the underlying source. Handles converted from receivers of
/// the same subject are the same lifecycle, however many times the receiver
/// was cloned or converted. Handles converted from clones of one `Observable`
/// are the same lifecycle too. A stream built with [`PhaseStream::new`] is
/// only the same as its own clones.
pub struct PhaseStream<E> {
    source: SharedSource<E>,
    identity: usize,
}

impl<E> Clone for PhaseStream<E> {
    fn clone(&self) -> Self {
        PhaseStream {
            source: Arc::clone(&self.source),
            identity: self.identity,
        }
    }
}

impl<E> PhaseStream<E> {
    /// `true` if both handles refer to the same lifecycle.
    #[must_use]
    pub fn same_as(&self, other: &PhaseStream<E>) -> bool {
        self.id() == other.id()
    }

    // `source` keeps the identified allocation alive, so the address cannot be
    // reused while this handle exists.
    pub(crate) fn id(&self) -> usize {
        self.identity
    }

    fn keyed(source: SharedSource<E>, identity: usize) -> Self {
        PhaseStream { source, identity }
    }

    fn from_source(source: SharedSource<E>) -> Self {
        let identity = Arc::as_ptr(&source).cast::<()>() as usize;
        PhaseStream::keyed(source, identity)
    }
}

impl<E: Phase> PhaseStream<E> {
    /// Creates a phase stream from a subscribe function. It is called once for
    /// each binding that subscribes to the lifecycle.
    pub fn new(sf: impl Fn(Subscriber<E>) -> Subscription + Send + Sync + 'static) -> Self {
        PhaseStream::from_source(Arc::new(sf))
    }

    pub(crate) fn observable(&self) -> Observable<E> {
        Observable::from_shared(Arc::clone(&self.source))
    }

    pub(crate) fn connectable(&self) -> Connectable<E> {
        Connectable::from_shared(Arc::clone(&self.source))
    }
}

impl<E: Phase> From<Observable<E>> for PhaseStream<E> {
    fn from(source: Observable<E>) -> Self {
        PhaseStream::from_source(source.into_shared())
    }
}

impl<E: Phase> From<SubjectReceiver<E>> for PhaseStream<E> {
    fn from(receiver: SubjectReceiver<E>) -> Self {
        let identity = receiver.id();
        PhaseStream::keyed(Arc::new(move |s| receiver.clone().subscribe(s)), identity)
    }
}

impl<E: Phase> From<BehaviorSubjectReceiver<E>> for PhaseStream<E> {
    fn from(receiver: BehaviorSubjectReceiver<E>) -> Self {
        let identity = receiver.id();
        PhaseStream::keyed(Arc::new(move |s| receiver.clone().subscribe(s)), identity)
    }
}

/// Binds until `lifecycle` emits `event`.
///
/// The bound stream ends the first time `event` is emitted after subscribing.
/// If the lifecycle ends without ever emitting it, the bound stream is left to
/// end on its own.
pub fn bind_until_event<E: Phase>(
    lifecycle: impl Into<PhaseStream<E>>,
    event: E,
) -> LifecycleTransformer<E> {
    LifecycleTransformer::new(lifecycle.into(), Policy::UntilEvent(event))
}

/// Binds until `lifecycle` emits its next phase.
///
/// A lifecycle that replays its current phase on subscribe, such as a
/// `BehaviorSubject`, ends the binding right away.
pub fn bind<E: Phase>(lifecycle: impl Into<PhaseStream<E>>) -> LifecycleTransformer<E> {
    LifecycleTransformer::new(lifecycle.into(), Policy::AnyEvent)
}

/// Binds until the phase corresponding to the first one observed.
///
/// The first phase emitted after subscribing is passed to `resolver`; the
/// binding ends the next time the resolved phase is emitted. The lifecycle must
/// make the current phase available to new subscribers, typically by being
/// backed by a `BehaviorSubject`.
///
/// A resolver answering [`ResolveError::AlreadyTerminal`](crate::ResolveError)
/// ends the binding immediately. One answering
/// [`ResolveError::UnmappablePhase`](crate::ResolveError), or panicking, fails
/// the bound stream with [`LifecycleError::UnmappablePhase`](crate::LifecycleError).
pub fn bind_with<E: Phase>(
    lifecycle: impl Into<PhaseStream<E>>,
    resolver: impl CorrespondingEvents<E> + 'static,
) -> LifecycleTransformer<E> {
    bind_with_shared(lifecycle, Arc::new(resolver))
}

/// Like [`bind_with`], for a resolver that is already shared.
///
/// Transformers built from the same lifecycle and the same `Arc` compare equal.
pub fn bind_with_shared<E: Phase>(
    lifecycle: impl Into<PhaseStream<E>>,
    resolver: Arc<dyn CorrespondingEvents<E>>,
) -> LifecycleTransformer<E> {
    LifecycleTransformer::new(lifecycle.into(), Policy::Corresponding(resolver))
}
