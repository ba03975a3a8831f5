//! `rxr-lifecycle` binds reactive streams to a lifecycle, so subscriptions end
//! on their own when whatever they belong to moves past the point where they
//! are useful.
//!
//! The crate carries a small push-based reactive core in the style of `rxr`:
//! [`Observable`] with its [`ObservableExt`] operators, hot [`subjects`], and
//! the [`shapes`] a stream can take: backpressured [`Flowable`], [`Single`],
//! [`Maybe`] and [`Completable`].
//!
//! On top of that core, the [`lifecycle`] module derives a termination signal
//! from a stream of phases and races it against any of those shapes:
//!
//! * [`bind_until_event`]: end at one chosen phase.
//! * [`bind`]: end at the next phase.
//! * [`bind_with`]: end at the phase corresponding to the one active at
//!   subscribe time, as decided by a [`CorrespondingEvents`] resolver such as a
//!   [`CorrespondenceTable`].
//!
//! Apply the resulting [`LifecycleTransformer`] with [`Compose::compose`].
//! Multi-value streams and `Maybe` complete silently when the lifecycle ends
//! them. `Single` and `Completable` promised a result, so they fail with
//! [`LifecycleError::Cancelled`] instead.
//!
//! Nothing here spawns threads or schedules work. Every callback runs on the
//! thread that delivered the triggering event, and the race between the
//! upstream and the lifecycle is settled by an atomic guard, so the two may be
//! driven from different threads.

mod errors;
mod observer;
mod subscription;

pub mod lifecycle;
pub mod observable;
pub mod shapes;
pub mod subjects;

pub use errors::*;
pub use lifecycle::{
    bind, bind_until_event, bind_with, bind_with_shared, Compose, CorrespondenceTable,
    CorrespondenceTableBuilder, CorrespondingEvents, LifecycleHost, LifecycleProvider,
    LifecycleTransformer, Phase, PhaseStream,
};
pub use observable::{Connectable, Observable, ObservableExt};
pub use observer::Observer;
pub use shapes::{
    Completable, CompletableObserver, Demand, FlowSubscription, Flowable, Maybe, MaybeObserver,
    Single, SingleObserver,
};
pub use subscription::subscribe;
pub use subscription::subscribe::{Subscribeable, Unsubscribeable};
