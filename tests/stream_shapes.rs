mod custom_error;
mod phases;
mod register_emissions;

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use custom_error::CustomError;
use phases::Phase;
use register_emissions::Emissions;
use rxr_lifecycle::subjects::Subject;
use rxr_lifecycle::subscribe::{Subscriber, Subscription, SubscriptionHandle, UnsubscribeLogic};
use rxr_lifecycle::{
    bind_until_event, Completable, Compose, Demand, Flowable, LifecycleError, Maybe, Observer,
    Single, Unsubscribeable,
};

#[test]
fn flowable_keeps_consumer_demand() {
    let emissions = Emissions::new();
    let (mut phases, lifecycle) = Subject::emitter_receiver();

    let subscription = Flowable::from_iter(0..100)
        .compose(&bind_until_event(lifecycle.clone(), Phase::Stop))
        .subscribe(emissions.subscriber());
    assert!(emissions.nexts().is_empty());

    subscription.request(2);
    assert_eq!(emissions.nexts(), vec![0, 1]);
    subscription.request(1);
    assert_eq!(emissions.nexts(), vec![0, 1, 2]);

    phases.next(Phase::Stop);
    subscription.request(10);

    assert_eq!(emissions.nexts(), vec![0, 1, 2]);
    assert_eq!(emissions.completes(), 1);
    assert!(subscription.demand().is_cancelled());
    assert_eq!(lifecycle.len(), 0);
}

#[test]
fn flowable_producer_sees_only_requested_amount() {
    let emissions = Emissions::new();
    let (_phases, lifecycle) = Subject::<Phase>::emitter_receiver();
    let seen_outstanding = Arc::new(AtomicU64::new(0));
    let seen_c = Arc::clone(&seen_outstanding);

    // Emits one item per unit of demand, recording the largest outstanding
    // request it was ever offered.
    let upstream = Flowable::new(move |mut s: Subscriber<u64>, demand: Demand| {
        let seen = Arc::clone(&seen_c);
        let mut i = 0;
        demand.on_request(move |demand| {
            seen.fetch_max(demand.outstanding(), Ordering::SeqCst);
            while demand.try_take() {
                s.next(i);
                i += 1;
            }
        });
        let demand = demand.clone();
        Subscription::new(
            UnsubscribeLogic::Logic(Box::new(move || demand.cancel())),
            SubscriptionHandle::Nil,
        )
    });

    let subscription = upstream
        .compose(&bind_until_event(lifecycle, Phase::Destroy))
        .subscribe(emissions.subscriber());
    subscription.request(3);
    subscription.request(2);

    assert_eq!(emissions.nexts(), vec![0, 1, 2, 3, 4]);
    assert_eq!(seen_outstanding.load(Ordering::SeqCst), 3);
    assert!(emissions.is_silent());

    subscription.unsubscribe();
}

#[test]
fn single_reports_cancellation_when_lifecycle_wins() {
    let emissions = Emissions::<String>::new();
    let (mut phases, lifecycle) = Subject::emitter_receiver();

    Single::never()
        .compose(&bind_until_event(lifecycle.clone(), Phase::Pause))
        .subscribe(emissions.single());
    phases.next(Phase::Pause);

    assert!(emissions.is_cancelled());
    assert!(emissions.nexts().is_empty());
    assert!(LifecycleError::Cancelled.is_cancellation());
    assert_eq!(lifecycle.len(), 0);
}

#[test]
fn single_that_already_succeeded_is_not_cancelled() {
    let emissions = Emissions::new();
    let (mut phases, lifecycle) = Subject::emitter_receiver();

    Single::just(42)
        .compose(&bind_until_event(lifecycle.clone(), Phase::Pause))
        .subscribe(emissions.single());
    phases.next(Phase::Pause);

    assert_eq!(emissions.nexts(), vec![42]);
    assert_eq!(emissions.errors(), 0);
    assert_eq!(lifecycle.len(), 0);
}

#[test]
fn single_failure_is_not_mistaken_for_cancellation() {
    let emissions = Emissions::<u8>::new();
    let (_phases, lifecycle) = Subject::<Phase>::emitter_receiver();

    Single::error(Arc::new(CustomError))
        .compose(&bind_until_event(lifecycle, Phase::Pause))
        .subscribe(emissions.single());

    assert_eq!(emissions.errors(), 1);
    assert!(emissions.lifecycle_errors().is_empty());
}

#[test]
fn maybe_completes_silently_when_lifecycle_wins() {
    let emissions = Emissions::<u8>::new();
    let (mut phases, lifecycle) = Subject::emitter_receiver();

    Maybe::never()
        .compose(&bind_until_event(lifecycle, Phase::Stop))
        .subscribe(emissions.maybe());
    phases.next(Phase::Stop);

    assert_eq!(emissions.completes(), 1);
    assert_eq!(emissions.errors(), 0);
}

#[test]
fn maybe_success_and_empty_pass_through() {
    let (_phases, lifecycle) = Subject::<Phase>::emitter_receiver();
    let transformer = bind_until_event(lifecycle, Phase::Stop);

    let value = Emissions::new();
    Maybe::just('x')
        .compose(&transformer)
        .subscribe(value.maybe());
    assert_eq!(value.nexts(), vec!['x']);
    assert_eq!(value.completes(), 0);

    let empty = Emissions::<char>::new();
    Maybe::empty().compose(&transformer).subscribe(empty.maybe());
    assert!(empty.nexts().is_empty());
    assert_eq!(empty.completes(), 1);
}

#[test]
fn completable_reports_cancellation_when_lifecycle_wins() {
    let emissions = Emissions::<()>::new();
    let (mut phases, lifecycle) = Subject::emitter_receiver();

    Completable::never()
        .compose(&bind_until_event(lifecycle, Phase::Destroy))
        .subscribe(emissions.completable());
    phases.next(Phase::Destroy);

    assert!(emissions.is_cancelled());
    assert_eq!(emissions.completes(), 0);
}

#[test]
fn completable_that_finished_first_completes() {
    let emissions = Emissions::<()>::new();
    let (mut phases, lifecycle) = Subject::emitter_receiver();

    Completable::complete()
        .compose(&bind_until_event(lifecycle.clone(), Phase::Destroy))
        .subscribe(emissions.completable());
    phases.next(Phase::Destroy);

    assert_eq!(emissions.completes(), 1);
    assert_eq!(emissions.errors(), 0);
    assert_eq!(lifecycle.len(), 0);
}

#[test]
fn disposing_single_binding_delivers_nothing() {
    let emissions = Emissions::<u8>::new();
    let (mut phases, lifecycle) = Subject::emitter_receiver();

    let subscription = Single::never()
        .compose(&bind_until_event(lifecycle.clone(), Phase::Stop))
        .subscribe(emissions.single());
    subscription.unsubscribe();
    phases.next(Phase::Stop);

    assert!(emissions.is_silent());
    assert!(emissions.nexts().is_empty());
    assert_eq!(lifecycle.len(), 0);
}
