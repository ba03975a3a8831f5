use std::{
    any::Any, error::Error, future::Future, pin::Pin, sync::Arc,
    thread::JoinHandle as ThreadJoinHandle,
};

use tokio::{runtime, task::JoinHandle};

use crate::observer::Observer;

/// A trait for types that can be subscribed to, allowing consumers to receive
/// values emitted by a push stream.
pub trait Subscribeable {
    /// The type of items emitted by the stream.
    type ObsType;

    /// Subscribes to the stream and specifies how to handle emitted values.
    ///
    /// The returned `Subscription` allows the subscriber to stop receiving
    /// emissions and release resources held by the stream.
    fn subscribe(&mut self, s: Subscriber<Self::ObsType>) -> Subscription;
}

/// A trait for types that can be unsubscribed, allowing the clean release of resources
/// associated with a subscription.
pub trait Unsubscribeable {
    /// Unsubscribes from a subscription and releases associated resources.
    ///
    /// The `Subscription` instance that this method is called on is consumed, making it
    /// unusable after the `unsubscribe` operation.
    fn unsubscribe(self);
}

type NextFn<T> = Box<dyn FnMut(T) + Send>;
type CompleteFn = Box<dyn FnMut() + Send>;
type ErrorFn = Box<dyn FnMut(Arc<dyn Error + Send + Sync>) + Send>;

/// A type that acts as an observer, allowing users to handle emitted values, errors,
/// and completion when subscribing to an `Observable`, a `Flowable` or a `Subject`.
///
/// A `Subscriber` delivers at most one terminal event. Anything pushed into it
/// after `complete` or `error` is dropped.
pub struct Subscriber<NextFnType> {
    next_fn: NextFn<NextFnType>,
    complete_fn: Option<CompleteFn>,
    error_fn: Option<ErrorFn>,
    completed: bool,
    errored: bool,
}

impl<NextFnType> Subscriber<NextFnType> {
    /// Creates a new `Subscriber` instance with custom handling functions for emitted
    /// values, errors, and completion.
    pub fn new(
        next_fn: impl FnMut(NextFnType) + 'static + Send,
        error_fn: impl FnMut(Arc<dyn Error + Send + Sync>) + 'static + Send,
        complete_fn: impl FnMut() + 'static + Send,
    ) -> Self {
        Subscriber {
            next_fn: Box::new(next_fn),
            complete_fn: Some(Box::new(complete_fn)),
            error_fn: Some(Box::new(error_fn)),
            completed: false,
            errored: false,
        }
    }

    /// Create a new Subscriber with the provided `next` function.
    ///
    /// The `next` closure is called when the stream emits a new item.
    pub fn on_next(next_fn: impl FnMut(NextFnType) + 'static + Send) -> Self {
        Subscriber {
            next_fn: Box::new(next_fn),
            complete_fn: None,
            error_fn: None,
            completed: false,
            errored: false,
        }
    }

    /// Set the completion function for the Subscriber.
    pub fn on_complete(&mut self, complete_fn: impl FnMut() + 'static + Send) {
        self.complete_fn = Some(Box::new(complete_fn));
    }

    /// Set the error-handling function for the Subscriber.
    pub fn on_error(
        &mut self,
        error_fn: impl FnMut(Arc<dyn Error + Send + Sync>) + 'static + Send,
    ) {
        self.error_fn = Some(Box::new(error_fn));
    }

    /// Returns `true` once `complete` or `error` has been delivered.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.completed || self.errored
    }
}

impl<T> Observer for Subscriber<T> {
    type NextFnType = T;

    fn next(&mut self, v: Self::NextFnType) {
        if self.is_terminated() {
            return;
        }
        (self.next_fn)(v);
    }

    fn complete(&mut self) {
        if self.is_terminated() {
            return;
        }
        self.completed = true;
        if let Some(cfn) = &mut self.complete_fn {
            (cfn)();
        }
    }

    fn error(&mut self, observable_error: Arc<dyn Error + Send + Sync>) {
        if self.is_terminated() {
            return;
        }
        self.errored = true;
        if let Some(efn) = &mut self.error_fn {
            (efn)(observable_error);
        }
    }
}

/// Enumeration representing different types of handles used to await
/// asynchronous producers.
pub enum SubscriptionHandle {
    /// No specific handle for task or thread awaiting.
    Nil,

    /// Holds a join handle for awaiting an asynchronous producer using Tokio task.
    JoinTask(JoinHandle<()>),

    /// Holds a join handle for awaiting an asynchronous producer using OS thread.
    JoinThread(ThreadJoinHandle<()>),
}

impl SubscriptionHandle {
    pub(crate) fn take(&mut self) -> SubscriptionHandle {
        std::mem::replace(self, SubscriptionHandle::Nil)
    }
}

/// Represents a subscription to a stream, allowing control over the subscription.
///
/// When a stream is subscribed to it returns a `Subscription`. It is used to
/// unsubscribe and to await producers that run on `Tokio` tasks or OS threads.
pub struct Subscription {
    pub(crate) unsubscribe_logic: UnsubscribeLogic,
    pub(crate) subscription_future: SubscriptionHandle,
    pub(crate) runtime_handle: Result<runtime::Handle, runtime::TryCurrentError>,
}

impl Subscription {
    /// Creates a new Subscription instance with the specified unsubscribe logic and
    /// subscription handle.
    ///
    /// See [`UnsubscribeLogic`] and [`SubscriptionHandle`] for the available
    /// strategies.
    ///
    /// [`UnsubscribeLogic`]: enum.UnsubscribeLogic.html
    /// [`SubscriptionHandle`]: enum.SubscriptionHandle.html
    #[must_use]
    pub fn new(
        unsubscribe_logic: UnsubscribeLogic,
        subscription_future: SubscriptionHandle,
    ) -> Self {
        let runtime_handle = tokio::runtime::Handle::try_current();
        Subscription {
            unsubscribe_logic,
            subscription_future,
            runtime_handle,
        }
    }

    /// Awaits the completion of the asynchronous task or thread associated with
    /// this subscription.
    ///
    /// # Errors
    ///
    /// Returns an error if joining a thread or awaiting a task used by the
    /// producer fails.
    pub async fn join_concurrent(self) -> Result<(), Box<dyn Any + Send>> {
        match self.subscription_future {
            SubscriptionHandle::JoinTask(task_handle) => {
                let r = task_handle.await;
                r.map_err(|e| Box::new(e) as Box<dyn Any + Send>)
            }
            SubscriptionHandle::JoinThread(thread_handle) => thread_handle.join(),
            SubscriptionHandle::Nil => Ok(()),
        }
    }

    /// Blocks until the OS thread associated with this subscription finishes.
    ///
    /// A `Tokio` task handle cannot be joined synchronously; use
    /// `join_concurrent().await` for those. Joining one here returns an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the joined thread panicked or the handle belongs to
    /// a `Tokio` task.
    pub fn join(self) -> Result<(), Box<dyn Any + Send>> {
        match self.subscription_future {
            SubscriptionHandle::JoinThread(thread_handle) => thread_handle.join(),
            SubscriptionHandle::Nil => Ok(()),
            SubscriptionHandle::JoinTask(_) => Err(Box::new(
                "subscription is backed by a Tokio task, use `join_concurrent().await`",
            )),
        }
    }
}

impl Unsubscribeable for Subscription {
    fn unsubscribe(self) {
        self.unsubscribe_logic.unsubscribe(self.runtime_handle);
    }
}

/// Enumerates various unsubscribe logic options for a subscription.
pub enum UnsubscribeLogic {
    /// No specific unsubscribe logic.
    Nil,

    /// If one subscription depends on another. Wrapped subscription's unsubscribe
    /// will be called upon unsubscribing.
    Wrapped(Box<Subscription>),

    /// Unsubscribe logic defined by a function.
    Logic(Box<dyn FnOnce() + Send>),

    /// Asynchronous unsubscribe logic represented by a future. Use if you need to
    /// spawn `Tokio` tasks or `.await` as a part of the unsubscribe logic.
    Future(Pin<Box<dyn Future<Output = ()> + Send>>),
}

impl UnsubscribeLogic {
    fn unsubscribe(self, runtime_handle: Result<runtime::Handle, runtime::TryCurrentError>) {
        match self {
            UnsubscribeLogic::Nil => (),
            UnsubscribeLogic::Logic(fnc) => fnc(),
            UnsubscribeLogic::Wrapped(subscription) => subscription.unsubscribe(),
            UnsubscribeLogic::Future(future) => match runtime_handle {
                Ok(handle) => {
                    handle.spawn(future);
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "asynchronous unsubscribe logic dropped outside of a Tokio runtime"
                    );
                }
            },
        }
    }
}
