use std::sync::Arc;

use crate::{
    lifecycle::{
        race::{upstream_subscriber, Downstream, Race, SerializedSubscriber, Terminal},
        LifecycleTransformer, Phase,
    },
    shapes::{
        Completable, CompletableObserver, Demand, Flowable, Maybe, MaybeObserver, Single,
        SingleObserver,
    },
    subscribe::{Subscribeable, Subscriber, Subscription, SubscriptionHandle},
    Observable,
};

/// Applies a [`LifecycleTransformer`] to a stream.
///
/// Implemented for every stream shape. The lifecycle subscription is made
/// before the upstream one, so a lifecycle that is already at its terminating
/// point when the bound stream is subscribed wins and the upstream is never
/// subscribed at all. From then on the first side to finish wins.
pub trait Compose<E> {
    type Output;

    fn compose(self, transformer: &LifecycleTransformer<E>) -> Self::Output;
}

/// Subscribes the lifecycle side of a binding. `deliver` runs at most once,
/// only if the lifecycle wins.
fn watch_lifecycle<E: Phase>(
    transformer: &LifecycleTransformer<E>,
    race: &Arc<Race>,
    deliver: impl FnOnce(Terminal) + Send + 'static,
) {
    let race_cloned = Arc::clone(race);
    race.set_lifecycle(transformer.signal(move |signal| {
        if let Some(terminal) = race_cloned.on_signal(signal) {
            deliver(terminal);
        }
    }));
}

// Subscribes the upstream unless the lifecycle already ended the binding, and
// hands the consumer a subscription that releases both sides.
fn finish_subscribe(race: &Arc<Race>, subscribe: impl FnOnce() -> Subscription) -> Subscription {
    if race.is_finished() {
        return race.subscription(SubscriptionHandle::Nil);
    }
    let mut upstream = subscribe();
    let handle = upstream.subscription_future.take();
    race.set_upstream(upstream);
    race.subscription(handle)
}

impl<T, E> Compose<E> for Observable<T>
where
    T: Send + 'static,
    E: Phase,
{
    type Output = Observable<T>;

    fn compose(self, transformer: &LifecycleTransformer<E>) -> Observable<T> {
        let transformer = transformer.clone();
        Observable::new(move |s: Subscriber<T>| {
            let race = Race::new();
            let downstream = SerializedSubscriber::new(s);

            let down_cloned = Arc::clone(&downstream);
            watch_lifecycle(&transformer, &race, move |terminal| {
                down_cloned.terminate(terminal);
            });

            finish_subscribe(&race, || {
                self.clone().subscribe(upstream_subscriber(&race, &downstream))
            })
        })
    }
}

/// The upstream receives the consumer's own `Demand`, so requests flow through
/// unchanged and nothing is buffered. When the lifecycle wins, the demand is
/// cancelled before the consumer completes.
impl<T, E> Compose<E> for Flowable<T>
where
    T: Send + 'static,
    E: Phase,
{
    type Output = Flowable<T>;

    fn compose(mut self, transformer: &LifecycleTransformer<E>) -> Flowable<T> {
        let transformer = transformer.clone();
        Flowable::new(move |s: Subscriber<T>, demand: Demand| {
            let race = Race::new();
            let downstream = SerializedSubscriber::new(s);

            let down_cloned = Arc::clone(&downstream);
            let demand_cloned = demand.clone();
            watch_lifecycle(&transformer, &race, move |terminal| {
                demand_cloned.cancel();
                down_cloned.terminate(terminal);
            });

            finish_subscribe(&race, || {
                self.subscribe_with(upstream_subscriber(&race, &downstream), demand)
            })
        })
    }
}

impl<T, E> Compose<E> for Single<T>
where
    T: Send + 'static,
    E: Phase,
{
    type Output = Single<T>;

    fn compose(mut self, transformer: &LifecycleTransformer<E>) -> Single<T> {
        let transformer = transformer.clone();
        Single::new(move |o: SingleObserver<T>| {
            let race = Race::new();
            let downstream = Downstream::new(o);

            let down_cloned = Arc::clone(&downstream);
            watch_lifecycle(&transformer, &race, move |terminal| {
                down_cloned.terminate(terminal);
            });

            finish_subscribe(&race, || {
                let (race_s, race_e) = (Arc::clone(&race), Arc::clone(&race));
                let down_e = Arc::clone(&downstream);
                self.subscribe(SingleObserver::new(
                    move |v| {
                        if race_s.claim() {
                            if let Some(mut o) = downstream.take() {
                                o.success(v);
                            }
                        }
                    },
                    move |e| {
                        if let Some(terminal) = race_e.on_upstream_error(e) {
                            down_e.terminate(terminal);
                        }
                    },
                ))
            })
        })
    }
}

impl<T, E> Compose<E> for Maybe<T>
where
    T: Send + 'static,
    E: Phase,
{
    type Output = Maybe<T>;

    fn compose(mut self, transformer: &LifecycleTransformer<E>) -> Maybe<T> {
        let transformer = transformer.clone();
        Maybe::new(move |o: MaybeObserver<T>| {
            let race = Race::new();
            let downstream = Downstream::new(o);

            let down_cloned = Arc::clone(&downstream);
            watch_lifecycle(&transformer, &race, move |terminal| {
                down_cloned.terminate(terminal);
            });

            finish_subscribe(&race, || {
                let (race_s, race_e, race_c) =
                    (Arc::clone(&race), Arc::clone(&race), Arc::clone(&race));
                let (down_e, down_c) = (Arc::clone(&downstream), Arc::clone(&downstream));
                self.subscribe(MaybeObserver::new(
                    move |v| {
                        if race_s.claim() {
                            if let Some(mut o) = downstream.take() {
                                o.success(v);
                            }
                        }
                    },
                    move |e| {
                        if let Some(terminal) = race_e.on_upstream_error(e) {
                            down_e.terminate(terminal);
                        }
                    },
                    move || {
                        if race_c.claim() {
                            down_c.terminate(Terminal::Complete);
                        }
                    },
                ))
            })
        })
    }
}

impl<E: Phase> Compose<E> for Completable {
    type Output = Completable;

    fn compose(mut self, transformer: &LifecycleTransformer<E>) -> Completable {
        let transformer = transformer.clone();
        Completable::new(move |o: CompletableObserver| {
            let race = Race::new();
            let downstream = Downstream::new(o);

            let down_cloned = Arc::clone(&downstream);
            watch_lifecycle(&transformer, &race, move |terminal| {
                down_cloned.terminate(terminal);
            });

            finish_subscribe(&race, || {
                let (race_c, race_e) = (Arc::clone(&race), Arc::clone(&race));
                let down_e = Arc::clone(&downstream);
                self.subscribe(CompletableObserver::new(
                    move || {
                        if race_c.claim() {
                            downstream.terminate(Terminal::Complete);
                        }
                    },
                    move |e| {
                        if let Some(terminal) = race_e.on_upstream_error(e) {
                            down_e.terminate(terminal);
                        }
                    },
                ))
            })
        })
    }
}
