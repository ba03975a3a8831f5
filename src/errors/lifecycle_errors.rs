use std::{error::Error, sync::Arc};

use thiserror::Error;

/// Outcome of resolving the phase a binding started in to the phase that ends it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The starting phase is already the end of the lifecycle. Binding from here
    /// terminates the bound stream immediately and successfully.
    #[error("already at the end of the lifecycle: {0}")]
    AlreadyTerminal(String),

    /// The resolver has no entry for the starting phase.
    #[error("cannot bind to phase: {0}")]
    UnmappablePhase(String),
}

/// Errors observed on the error channel of a bound stream.
///
/// Use [`LifecycleError::from_observed`] on the `Arc<dyn Error + Send + Sync>`
/// delivered to an `error` callback to tell lifecycle errors apart from
/// failures of the upstream itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    /// The lifecycle ended before a single-result stream produced its result.
    #[error("lifecycle ended before the stream produced a result")]
    Cancelled,

    /// The resolver could not map the phase active at subscribe time.
    #[error("cannot resolve the terminating phase: {reason}")]
    UnmappablePhase { reason: String },

    /// A stream expected to emit at least one value completed empty.
    #[error("stream completed without emitting a value")]
    NoSuchElement,

    /// Arguments rejected while building a binding.
    #[error("invalid lifecycle binding: {0}")]
    Validation(String),
}

impl LifecycleError {
    /// Returns the `LifecycleError` carried by an observed stream error, if any.
    pub fn from_observed(e: &Arc<dyn Error + Send + Sync>) -> Option<&LifecycleError> {
        e.downcast_ref::<LifecycleError>()
    }

    /// `true` for the cancellation class.
    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        matches!(self, LifecycleError::Cancelled)
    }

    pub(crate) fn shared(self) -> Arc<dyn Error + Send + Sync> {
        Arc::new(self)
    }
}

impl From<ResolveError> for LifecycleError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::UnmappablePhase(reason) | ResolveError::AlreadyTerminal(reason) => {
                LifecycleError::UnmappablePhase { reason }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observed_errors_downcast() {
        let e = LifecycleError::Cancelled.shared();
        assert_eq!(LifecycleError::from_observed(&e), Some(&LifecycleError::Cancelled));
        assert!(LifecycleError::from_observed(&e).unwrap().is_cancellation());

        #[derive(Debug, thiserror::Error)]
        #[error("io")]
        struct Io;

        let other: Arc<dyn Error + Send + Sync> = Arc::new(Io);
        assert!(LifecycleError::from_observed(&other).is_none());
    }

    #[test]
    fn resolve_error_maps_to_unmappable() {
        let e: LifecycleError = ResolveError::UnmappablePhase("x".into()).into();
        assert_eq!(
            e,
            LifecycleError::UnmappablePhase {
                reason: "x".to_string()
            }
        );
        assert_eq!(e.to_string(), "cannot resolve the terminating phase: x");
    }
}
