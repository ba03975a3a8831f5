//! Provides structures and traits related to subscription management.
//!
//! This module includes `Subscriber` for handling observed values, errors and
//! completions, and `Subscription` for controlling subscriptions to observables,
//! subjects and the other stream shapes.
pub mod subscribe;

mod slot;

pub(crate) use slot::SubscriptionSlot;
