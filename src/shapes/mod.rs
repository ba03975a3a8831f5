//! Stream shapes other than the multi-value `Observable`.
//!
//! * [`Flowable`] emits many values, but only as many as its consumer requested
//!   through a [`Demand`] handle.
//! * [`Single`] produces exactly one value or an error.
//! * [`Maybe`] produces at most one value, then completes, or errors.
//! * [`Completable`] produces no value, only completion or an error.
//!
//! Every observer type in this module delivers at most one terminal event.

mod completable;
mod flowable;
mod maybe;
mod single;

pub use completable::*;
pub use flowable::*;
pub use maybe::*;
pub use single::*;
