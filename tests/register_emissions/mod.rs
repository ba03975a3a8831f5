use std::{
    error::Error,
    sync::{Arc, Mutex},
};

use rxr_lifecycle::{
    subscribe::Subscriber, CompletableObserver, LifecycleError, MaybeObserver, SingleObserver,
};

/// Records every event delivered to the observers it hands out.
pub struct Emissions<T> {
    nexts: Arc<Mutex<Vec<T>>>,
    completes: Arc<Mutex<usize>>,
    errors: Arc<Mutex<Vec<Arc<dyn Error + Send + Sync>>>>,
}

impl<T> Clone for Emissions<T> {
    fn clone(&self) -> Self {
        Emissions {
            nexts: Arc::clone(&self.nexts),
            completes: Arc::clone(&self.completes),
            errors: Arc::clone(&self.errors),
        }
    }
}

impl<T: Clone + Send + 'static> Emissions<T> {
    pub fn new() -> Self {
        Emissions {
            nexts: Arc::new(Mutex::new(Vec::with_capacity(5))),
            completes: Arc::new(Mutex::new(0)),
            errors: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn subscriber(&self) -> Subscriber<T> {
        let (n, c, e) = (self.clone(), self.clone(), self.clone());
        Subscriber::new(
            move |v| n.nexts.lock().unwrap().push(v),
            move |err| e.errors.lock().unwrap().push(err),
            move || *c.completes.lock().unwrap() += 1,
        )
    }

    pub fn single(&self) -> SingleObserver<T> {
        let (n, e) = (self.clone(), self.clone());
        SingleObserver::new(
            move |v| n.nexts.lock().unwrap().push(v),
            move |err| e.errors.lock().unwrap().push(err),
        )
    }

    pub fn maybe(&self) -> MaybeObserver<T> {
        let (n, c, e) = (self.clone(), self.clone(), self.clone());
        MaybeObserver::new(
            move |v| n.nexts.lock().unwrap().push(v),
            move |err| e.errors.lock().unwrap().push(err),
            move || *c.completes.lock().unwrap() += 1,
        )
    }

    pub fn nexts(&self) -> Vec<T> {
        self.nexts.lock().unwrap().clone()
    }

    pub fn completes(&self) -> usize {
        *self.completes.lock().unwrap()
    }

    pub fn errors(&self) -> usize {
        self.errors.lock().unwrap().len()
    }

    /// `LifecycleError`s observed on the error channel, in order.
    pub fn lifecycle_errors(&self) -> Vec<LifecycleError> {
        self.errors
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| LifecycleError::from_observed(e).cloned())
            .collect()
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors.lock().unwrap().iter().map(|e| e.to_string()).collect()
    }

    pub fn is_cancelled(&self) -> bool {
        self.lifecycle_errors() == vec![LifecycleError::Cancelled]
    }

    pub fn is_silent(&self) -> bool {
        self.completes() == 0 && self.errors() == 0
    }
}

impl Emissions<()> {
    pub fn completable(&self) -> CompletableObserver {
        let (c, e) = (self.clone(), self.clone());
        CompletableObserver::new(
            move || *c.completes.lock().unwrap() += 1,
            move |err| e.errors.lock().unwrap().push(err),
        )
    }
}
