use std::{
    any::Any,
    fmt::Debug,
    panic::{self, AssertUnwindSafe},
};

use crate::errors::{LifecycleError, ResolveError};

/// Maps the phase a binding starts in to the phase that ends it.
///
/// Resolvers are called once per bound subscription, with the first phase the
/// lifecycle emits after subscribing. They should be pure: the same input
/// always yields the same outcome.
///
/// Any `Fn(&E) -> Result<E, ResolveError>` closure is a resolver:
///
/// ```no_run
/// use rxr_lifecycle::{CorrespondingEvents, ResolveError};
///
/// let resolver = |phase: &u8| -> Result<u8, ResolveError> {
///     match phase {
///         0 => Ok(3),
///         1 => Ok(2),
///         3 => Err(ResolveError::AlreadyTerminal("stopped".into())),
///         other => Err(ResolveError::UnmappablePhase(format!("{other}"))),
///     }
/// };
/// assert_eq!(resolver.resolve(&1), Ok(2));
/// ```
pub trait CorrespondingEvents<E>: Send + Sync {
    fn resolve(&self, phase: &E) -> Result<E, ResolveError>;
}

impl<E, F> CorrespondingEvents<E> for F
where
    F: Fn(&E) -> Result<E, ResolveError> + Send + Sync,
{
    fn resolve(&self, phase: &E) -> Result<E, ResolveError> {
        self(phase)
    }
}

/// Runs `resolver`, turning a panic inside it into `UnmappablePhase`.
pub(crate) fn resolve_guarded<E>(
    resolver: &dyn CorrespondingEvents<E>,
    phase: &E,
) -> Result<E, ResolveError> {
    match panic::catch_unwind(AssertUnwindSafe(|| resolver.resolve(phase))) {
        Ok(outcome) => outcome,
        Err(payload) => {
            let reason = panic_message(payload.as_ref());
            tracing::warn!(%reason, "lifecycle resolver panicked");
            Err(ResolveError::UnmappablePhase(reason))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "resolver panicked".to_string()
    }
}

/// A resolver made of plain data: a list of `from -> to` pairs plus the phases
/// that already end the lifecycle.
///
/// ```no_run
/// use rxr_lifecycle::CorrespondenceTable;
///
/// #[derive(Debug, Clone, PartialEq)]
/// enum Phase { Start, Stop }
///
/// let table = CorrespondenceTable::builder()
///     .map(Phase::Start, Phase::Stop)
///     .terminal(Phase::Stop)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct CorrespondenceTable<E> {
    pairs: Vec<(E, E)>,
    terminal: Vec<E>,
}

impl<E> CorrespondenceTable<E> {
    #[must_use]
    pub fn builder() -> CorrespondenceTableBuilder<E> {
        CorrespondenceTableBuilder {
            pairs: Vec::new(),
            terminal: Vec::new(),
        }
    }
}

impl<E> CorrespondingEvents<E> for CorrespondenceTable<E>
where
    E: Debug + PartialEq + Clone + Send + Sync,
{
    fn resolve(&self, phase: &E) -> Result<E, ResolveError> {
        if let Some((_, to)) = self.pairs.iter().find(|(from, _)| from == phase) {
            return Ok(to.clone());
        }
        if self.terminal.contains(phase) {
            return Err(ResolveError::AlreadyTerminal(format!("{phase:?}")));
        }
        Err(ResolveError::UnmappablePhase(format!("{phase:?}")))
    }
}

/// Builder for [`CorrespondenceTable`].
#[derive(Debug)]
pub struct CorrespondenceTableBuilder<E> {
    pairs: Vec<(E, E)>,
    terminal: Vec<E>,
}

impl<E: Debug + PartialEq> CorrespondenceTableBuilder<E> {
    /// A binding started in `from` ends when `to` is emitted.
    #[must_use]
    pub fn map(mut self, from: E, to: E) -> Self {
        self.pairs.push((from, to));
        self
    }

    /// A binding started in `phase` ends as soon as it is subscribed.
    #[must_use]
    pub fn terminal(mut self, phase: E) -> Self {
        self.terminal.push(phase);
        self
    }

    /// # Errors
    ///
    /// Returns [`LifecycleError::Validation`] when the table is empty, when a
    /// phase is mapped twice or when a phase is both mapped and terminal.
    pub fn build(self) -> Result<CorrespondenceTable<E>, LifecycleError> {
        if self.pairs.is_empty() && self.terminal.is_empty() {
            return Err(LifecycleError::Validation(
                "correspondence table has no phases".to_string(),
            ));
        }
        for (i, (from, _)) in self.pairs.iter().enumerate() {
            if self.pairs[..i].iter().any(|(earlier, _)| earlier == from) {
                return Err(LifecycleError::Validation(format!(
                    "phase {from:?} is mapped more than once"
                )));
            }
            if self.terminal.contains(from) {
                return Err(LifecycleError::Validation(format!(
                    "phase {from:?} is both mapped and terminal"
                )));
            }
        }
        Ok(CorrespondenceTable {
            pairs: self.pairs,
            terminal: self.terminal,
        })
    }
}
