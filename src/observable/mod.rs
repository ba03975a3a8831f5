//! The `observable` module provides the building blocks for creating and manipulating
//! observables, and for turning them into the single-result stream shapes.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
    errors::LifecycleError,
    observer::Observer,
    shapes::{Completable, CompletableObserver, Maybe, MaybeObserver, Single, SingleObserver},
    subscription::{
        subscribe::{Subscribeable, Subscriber, Subscription, SubscriptionHandle, UnsubscribeLogic},
        SubscriptionSlot,
    },
};

pub mod multicast;

pub use multicast::Connectable;

/// Subscribe function that can be shared and called concurrently.
pub(crate) type SharedSource<T> = Arc<dyn Fn(Subscriber<T>) -> Subscription + Send + Sync>;

/// The `Observable` struct represents a source of values that can be observed
/// and transformed.
///
/// This struct serves as the foundation for creating, transforming, and working with
/// observables. It provides methods for applying operators, subscribing to emitted
/// values, and creating new observables.
///
/// # Example: basic synchronous `Observable`
///
/// This simple `Observable` emits values and completes. It returns an empty
/// `Subscription`, making it unable to be unsubscribed from. Operators like `take`
/// and lifecycle bindings need a real unsubscribe to stop a source early.
///
/// ```no_run
/// use rxr_lifecycle::subscribe::{Subscriber, Subscription, SubscriptionHandle, UnsubscribeLogic};
/// use rxr_lifecycle::{Observable, Observer, Subscribeable};
///
/// // Create a custom observable that emits values from 1 to 10.
/// let mut emit_10_observable = Observable::new(|mut subscriber| {
///     for i in 1..=10 {
///         subscriber.next(i);
///     }
///     subscriber.complete();
///
///     // Return the empty subscription.
///     Subscription::new(UnsubscribeLogic::Nil, SubscriptionHandle::Nil)
/// });
///
/// let observer = Subscriber::new(
///     |v| println!("Emitted {}", v),
///     |e| eprintln!("Error {}", e),
///     || println!("Completed"),
/// );
///
/// emit_10_observable.subscribe(observer);
/// ```
pub struct Observable<T> {
    subscribe_fn: SharedSource<T>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Observable {
            subscribe_fn: Arc::clone(&self.subscribe_fn),
        }
    }
}

impl<T> Observable<T> {
    /// Creates a new `Observable` with the provided subscribe function.
    ///
    /// When the `Observable` is subscribed to, `sf` is invoked to manage the
    /// delivery of values to the `Subscriber`. It should return a `Subscription`
    /// that enables unsubscribing and, for asynchronous observables, awaiting the
    /// `Tokio` task or OS thread doing the work.
    ///
    /// `sf` is shared by every clone of the `Observable` and may be called again
    /// from inside one of its own emissions, so it takes no exclusive borrow.
    /// Per-subscription state belongs inside the call.
    pub fn new(sf: impl Fn(Subscriber<T>) -> Subscription + Send + Sync + 'static) -> Self {
        Observable {
            subscribe_fn: Arc::new(sf),
        }
    }
}

impl<T: 'static> Observable<T> {
    pub(crate) fn from_shared(source: SharedSource<T>) -> Self {
        Observable {
            subscribe_fn: source,
        }
    }

    pub(crate) fn into_shared(self) -> SharedSource<T> {
        self.subscribe_fn
    }
}

// Wraps a downstream observer so the three callbacks of an upstream `Subscriber`
// can share it.
fn forward_to<T: 'static>(
    o_shared: &Arc<Mutex<Subscriber<T>>>,
    next: impl FnMut(&Arc<Mutex<Subscriber<T>>>, T) -> Option<T> + Send + 'static,
) -> Subscriber<T> {
    forward_map(o_shared, next)
}

fn forward_map<T: 'static, U: 'static>(
    o_shared: &Arc<Mutex<Subscriber<U>>>,
    mut next: impl FnMut(&Arc<Mutex<Subscriber<U>>>, T) -> Option<U> + Send + 'static,
) -> Subscriber<T> {
    let o_cloned_n = Arc::clone(o_shared);
    let o_cloned_e = Arc::clone(o_shared);
    let o_cloned_c = Arc::clone(o_shared);

    Subscriber::new(
        move |v| {
            if let Some(u) = next(&o_cloned_n, v) {
                o_cloned_n.lock().next(u);
            }
        },
        move |observable_error| {
            o_cloned_e.lock().error(observable_error);
        },
        move || {
            o_cloned_c.lock().complete();
        },
    )
}

/// The `ObservableExt` trait provides a set of extension methods that can be applied
/// to observables to transform and manipulate their behavior.
pub trait ObservableExt<T: 'static>: Subscribeable<ObsType = T> {
    /// Transforms the items emitted by the observable using a transformation
    /// function.
    fn map<U, F>(self, f: F) -> Observable<U>
    where
        Self: Sized + Clone + Send + Sync + 'static,
        F: Fn(T) -> U + Sync + Send + 'static,
        U: 'static,
    {
        let f = Arc::new(f);
        Observable::new(move |o| {
            let f = Arc::clone(&f);
            let u = forward_map(&Arc::new(Mutex::new(o)), move |_, v| Some(f(v)));
            self.clone().subscribe(u)
        })
    }

    /// Filters the items emitted by the observable based on a predicate function.
    fn filter<P>(self, predicate: P) -> Observable<T>
    where
        Self: Sized + Clone + Send + Sync + 'static,
        P: Fn(&T) -> bool + Sync + Send + 'static,
    {
        let predicate = Arc::new(predicate);
        Observable::new(move |o| {
            let predicate = Arc::clone(&predicate);
            let u = forward_to(&Arc::new(Mutex::new(o)), move |_, v| {
                if predicate(&v) {
                    Some(v)
                } else {
                    None
                }
            });
            self.clone().subscribe(u)
        })
    }

    /// Skips the first `n` items emitted by the observable and then emits the rest.
    fn skip(self, n: usize) -> Observable<T>
    where
        Self: Sized + Clone + Send + Sync + 'static,
    {
        Observable::new(move |o| {
            let mut n = n;
            let u = forward_to(&Arc::new(Mutex::new(o)), move |_, v| {
                if n > 0 {
                    n -= 1;
                    return None;
                }
                Some(v)
            });
            self.clone().subscribe(u)
        })
    }

    /// Emits at most the first `n` items emitted by the observable, then
    /// completes and unsubscribes from the source.
    ///
    /// `take(0)` completes without subscribing to the source.
    fn take(self, n: usize) -> Observable<T>
    where
        Self: Sized + Clone + Send + Sync + 'static,
    {
        Observable::new(move |mut o| {
            if n == 0 {
                o.complete();
                return Subscription::new(UnsubscribeLogic::Nil, SubscriptionHandle::Nil);
            }
            let source = Arc::new(SubscriptionSlot::new());
            let source_cloned = Arc::clone(&source);

            let mut i = 0;
            let u = forward_to(&Arc::new(Mutex::new(o)), move |o_shared, v| {
                if i >= n {
                    return None;
                }
                i += 1;
                if i < n {
                    return Some(v);
                }
                source_cloned.dispose();
                let mut o = o_shared.lock();
                o.next(v);
                o.complete();
                None
            });

            let mut unsubscriber = self.clone().subscribe(u);
            let handle = unsubscriber.subscription_future.take();
            source.set(unsubscriber);

            Subscription::new(
                UnsubscribeLogic::Logic(Box::new(move || source.dispose())),
                handle,
            )
        })
    }

    /// Turns this observable into a [`Connectable`] that multicasts one source
    /// subscription to every subscriber, starting on [`Connectable::connect`].
    fn connectable(self) -> Connectable<T>
    where
        Self: Sized + Clone + Send + Sync + 'static,
        T: Clone + Send,
    {
        Connectable::from_shared(Arc::new(move |s: Subscriber<T>| self.clone().subscribe(s)))
    }

    /// Succeeds with the first emitted item, or fails with
    /// [`LifecycleError::NoSuchElement`] if the source completes empty.
    fn first_or_error(mut self) -> Single<T>
    where
        Self: Sized + Send + Sync + 'static,
        T: Send,
    {
        Single::new(move |o: SingleObserver<T>| {
            let o_shared = Arc::new(Mutex::new(o));
            let o_cloned_e = Arc::clone(&o_shared);
            let o_cloned_c = Arc::clone(&o_shared);

            let source = Arc::new(SubscriptionSlot::new());
            let source_cloned = Arc::clone(&source);

            let u = Subscriber::new(
                move |v| {
                    source_cloned.dispose();
                    o_shared.lock().success(v);
                },
                move |observable_error| o_cloned_e.lock().error(observable_error),
                move || o_cloned_c.lock().error(LifecycleError::NoSuchElement.shared()),
            );

            let mut unsubscriber = self.subscribe(u);
            let handle = unsubscriber.subscription_future.take();
            source.set(unsubscriber);

            Subscription::new(
                UnsubscribeLogic::Logic(Box::new(move || source.dispose())),
                handle,
            )
        })
    }

    /// Succeeds with the first emitted item, or completes empty.
    fn first_element(mut self) -> Maybe<T>
    where
        Self: Sized + Send + Sync + 'static,
        T: Send,
    {
        Maybe::new(move |o: MaybeObserver<T>| {
            let o_shared = Arc::new(Mutex::new(o));
            let o_cloned_e = Arc::clone(&o_shared);
            let o_cloned_c = Arc::clone(&o_shared);

            let source = Arc::new(SubscriptionSlot::new());
            let source_cloned = Arc::clone(&source);

            let u = Subscriber::new(
                move |v| {
                    source_cloned.dispose();
                    o_shared.lock().success(v);
                },
                move |observable_error| o_cloned_e.lock().error(observable_error),
                move || o_cloned_c.lock().complete(),
            );

            let mut unsubscriber = self.subscribe(u);
            let handle = unsubscriber.subscription_future.take();
            source.set(unsubscriber);

            Subscription::new(
                UnsubscribeLogic::Logic(Box::new(move || source.dispose())),
                handle,
            )
        })
    }

    /// Drops every item and mirrors only completion or failure.
    fn ignore_elements(mut self) -> Completable
    where
        Self: Sized + Send + Sync + 'static,
    {
        Completable::new(move |o: CompletableObserver| {
            let o_shared = Arc::new(Mutex::new(o));
            let o_cloned_c = Arc::clone(&o_shared);

            let u = Subscriber::new(
                |_| {},
                move |observable_error| o_shared.lock().error(observable_error),
                move || o_cloned_c.lock().complete(),
            );
            self.subscribe(u)
        })
    }
}

impl<T: 'static> Subscribeable for Observable<T> {
    type ObsType = T;

    fn subscribe(&mut self, v: Subscriber<Self::ObsType>) -> Subscription {
        (self.subscribe_fn)(v)
    }
}

impl<O, T: 'static> ObservableExt<T> for O where O: Subscribeable<ObsType = T> {}

#[cfg(test)]
mod tests;
