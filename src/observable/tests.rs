use super::*;

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex as StdMutex,
};

use crate::{subjects::Subject, Unsubscribeable};

pub fn make_emit_u32_observable(end: u32, unsubscribed: Arc<AtomicBool>) -> Observable<u32> {
    Observable::new(move |mut o: Subscriber<_>| {
        for i in 0..=end {
            o.next(i);
        }
        o.complete();

        let unsubscribed = Arc::clone(&unsubscribed);
        Subscription::new(
            UnsubscribeLogic::Logic(Box::new(move || {
                unsubscribed.store(true, Ordering::SeqCst);
            })),
            SubscriptionHandle::Nil,
        )
    })
}

fn collect<T: Send + 'static>() -> (Subscriber<T>, Arc<StdMutex<Vec<T>>>, Arc<AtomicBool>) {
    let nexts = Arc::new(StdMutex::new(Vec::new()));
    let nexts_c = Arc::clone(&nexts);
    let completed = Arc::new(AtomicBool::new(false));
    let completed_c = Arc::clone(&completed);

    let mut s = Subscriber::on_next(move |v| nexts_c.lock().unwrap().push(v));
    s.on_complete(move || completed_c.store(true, Ordering::SeqCst));
    (s, nexts, completed)
}

#[test]
fn map_filter_skip_chain() {
    let (s, nexts, completed) = collect();

    make_emit_u32_observable(10, Arc::new(AtomicBool::new(false)))
        .skip(2)
        .filter(|v| v % 2 == 0)
        .map(|v| format!("#{v}"))
        .subscribe(s);

    assert_eq!(*nexts.lock().unwrap(), vec!["#2", "#4", "#6", "#8", "#10"]);
    assert!(completed.load(Ordering::SeqCst));
}

#[test]
fn take_completes_and_unsubscribes_source() {
    let unsubscribed = Arc::new(AtomicBool::new(false));
    let (s, nexts, completed) = collect();

    make_emit_u32_observable(100, Arc::clone(&unsubscribed))
        .take(3)
        .subscribe(s);

    assert_eq!(*nexts.lock().unwrap(), vec![0, 1, 2]);
    assert!(completed.load(Ordering::SeqCst));
    // The source emitted synchronously, so its subscription arrived after
    // `take` already finished and was released right away.
    assert!(unsubscribed.load(Ordering::SeqCst));
}

#[test]
fn take_zero_never_subscribes() {
    let unsubscribed = Arc::new(AtomicBool::new(false));
    let (s, nexts, completed) = collect::<u32>();

    make_emit_u32_observable(5, Arc::clone(&unsubscribed))
        .take(0)
        .subscribe(s);

    assert!(nexts.lock().unwrap().is_empty());
    assert!(completed.load(Ordering::SeqCst));
    assert!(!unsubscribed.load(Ordering::SeqCst));
}

#[test]
fn take_on_subject_removes_observer() {
    let (mut tx, rx) = Subject::emitter_receiver();
    let (s, nexts, completed) = collect();

    rx.clone().take(2).subscribe(s);
    tx.next(1);
    assert_eq!(rx.len(), 1);
    tx.next(2);
    tx.next(3);

    assert_eq!(*nexts.lock().unwrap(), vec![1, 2]);
    assert!(completed.load(Ordering::SeqCst));
    assert!(rx.is_empty());
}

#[test]
fn first_or_error_on_empty_source() {
    let (mut tx, rx) = Subject::<u32>::emitter_receiver();
    let failure = Arc::new(StdMutex::new(None));
    let failure_c = Arc::clone(&failure);

    rx.first_or_error().subscribe(SingleObserver::new(
        |_| {},
        move |e| *failure_c.lock().unwrap() = LifecycleError::from_observed(&e).cloned(),
    ));
    tx.complete();

    assert_eq!(*failure.lock().unwrap(), Some(LifecycleError::NoSuchElement));
}

#[test]
fn first_or_error_takes_first_value() {
    let (mut tx, rx) = Subject::emitter_receiver();
    let value = Arc::new(StdMutex::new(None));
    let value_c = Arc::clone(&value);

    let subscription = rx.clone().first_or_error().subscribe(SingleObserver::new(
        move |v| *value_c.lock().unwrap() = Some(v),
        |_| {},
    ));
    tx.next(7);
    tx.next(8);

    assert_eq!(*value.lock().unwrap(), Some(7));
    assert!(rx.is_empty());
    subscription.unsubscribe();
}

#[test]
fn first_element_completes_empty() {
    let (mut tx, rx) = Subject::<u32>::emitter_receiver();
    let completed = Arc::new(AtomicBool::new(false));
    let completed_c = Arc::clone(&completed);

    rx.first_element().subscribe(MaybeObserver::new(
        |_| {},
        |_| {},
        move || completed_c.store(true, Ordering::SeqCst),
    ));
    tx.complete();

    assert!(completed.load(Ordering::SeqCst));
}

#[test]
fn ignore_elements_mirrors_completion() {
    let (mut tx, rx) = Subject::emitter_receiver();
    let completed = Arc::new(AtomicBool::new(false));
    let completed_c = Arc::clone(&completed);

    rx.ignore_elements().subscribe(CompletableObserver::new(
        move || completed_c.store(true, Ordering::SeqCst),
        |_| {},
    ));
    tx.next(1);
    assert!(!completed.load(Ordering::SeqCst));
    tx.complete();

    assert!(completed.load(Ordering::SeqCst));
}
