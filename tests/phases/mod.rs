use rxr_lifecycle::{CorrespondenceTable, CorrespondingEvents, ResolveError};

/// Phases of a typical UI component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Create,
    Start,
    Resume,
    Pause,
    Stop,
    Destroy,
}

/// Each phase ends at its counterpart; nothing can be bound once destroyed.
pub fn correspondence() -> CorrespondenceTable<Phase> {
    CorrespondenceTable::builder()
        .map(Phase::Create, Phase::Destroy)
        .map(Phase::Start, Phase::Stop)
        .map(Phase::Resume, Phase::Pause)
        .map(Phase::Pause, Phase::Stop)
        .map(Phase::Stop, Phase::Destroy)
        .terminal(Phase::Destroy)
        .build()
        .unwrap()
}

/// Only knows about `Start`.
pub fn partial_correspondence() -> impl CorrespondingEvents<Phase> {
    |phase: &Phase| -> Result<Phase, ResolveError> {
        match phase {
            Phase::Start => Ok(Phase::Stop),
            other => Err(ResolveError::UnmappablePhase(format!("{other:?}"))),
        }
    }
}
