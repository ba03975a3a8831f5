//! Objects that own a lifecycle and hand out bindings to it.

use std::sync::Arc;

use crate::{
    lifecycle::{
        bind_until_event, bind_with_shared, CorrespondingEvents, LifecycleTransformer, Phase,
        PhaseStream,
    },
    observer::Observer,
    subjects::{BehaviorSubject, BehaviorSubjectEmitter, BehaviorSubjectReceiver},
};

/// Something with a lifecycle that streams can be bound to.
///
/// Host-specific integrations implement this for their own component types;
/// [`LifecycleHost`] is a ready-made implementation driven by hand.
pub trait LifecycleProvider<E: Phase> {
    /// The lifecycle of this provider.
    fn lifecycle(&self) -> PhaseStream<E>;

    /// Binds until the lifecycle emits `event`.
    fn bind_until_event(&self, event: E) -> LifecycleTransformer<E> {
        bind_until_event(self.lifecycle(), event)
    }

    /// Binds until the phase that corresponds to the one active at subscribe
    /// time.
    fn bind_to_lifecycle(&self) -> LifecycleTransformer<E>;
}

/// A lifecycle driven explicitly through [`advance`](LifecycleHost::advance).
///
/// The host remembers its current phase and replays it to every new binding,
/// so streams subscribed in the middle of the lifecycle end at the phase that
/// corresponds to where the host is at that moment.
///
/// ```no_run
/// use rxr_lifecycle::{CorrespondenceTable, LifecycleHost, LifecycleProvider};
///
/// #[derive(Debug, Clone, Copy, PartialEq)]
/// enum Phase { Attach, Detach }
///
/// let host = LifecycleHost::new(
///     Phase::Attach,
///     CorrespondenceTable::builder()
///         .map(Phase::Attach, Phase::Detach)
///         .terminal(Phase::Detach)
///         .build()
///         .unwrap(),
/// );
/// let transformer = host.bind_to_lifecycle();
/// host.advance(Phase::Detach);
/// ```
pub struct LifecycleHost<E> {
    emitter: BehaviorSubjectEmitter<E>,
    receiver: BehaviorSubjectReceiver<E>,
    lifecycle: PhaseStream<E>,
    resolver: Arc<dyn CorrespondingEvents<E>>,
}

impl<E: Phase> LifecycleHost<E> {
    pub fn new(initial: E, resolver: impl CorrespondingEvents<E> + 'static) -> Self {
        let (emitter, receiver) = BehaviorSubject::emitter_receiver(initial);
        LifecycleHost {
            lifecycle: PhaseStream::from(receiver.clone()),
            emitter,
            receiver,
            resolver: Arc::new(resolver),
        }
    }

    /// Moves the host to `phase`, notifying every binding.
    pub fn advance(&self, phase: E) {
        tracing::trace!("lifecycle host advanced");
        self.emitter.clone().next(phase);
    }

    /// Ends the lifecycle. Bindings still waiting for their phase are left to
    /// end on their own.
    pub fn finish(&self) {
        self.emitter.clone().complete();
    }

    /// The phase the host is in.
    #[must_use]
    pub fn current(&self) -> E {
        self.receiver.value()
    }

    /// Number of bindings currently observing the host.
    #[must_use]
    pub fn observers(&self) -> usize {
        self.receiver.len()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.receiver.is_stopped()
    }
}

impl<E: Phase> LifecycleProvider<E> for LifecycleHost<E> {
    fn lifecycle(&self) -> PhaseStream<E> {
        self.lifecycle.clone()
    }

    fn bind_to_lifecycle(&self) -> LifecycleTransformer<E> {
        bind_with_shared(self.lifecycle.clone(), Arc::clone(&self.resolver))
    }
}
