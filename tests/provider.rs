mod phases;
mod register_emissions;

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use phases::{correspondence, Phase};
use register_emissions::Emissions;
use rxr_lifecycle::subjects::Subject;
use rxr_lifecycle::subscribe::Subscriber;
use rxr_lifecycle::{
    Compose, LifecycleHost, LifecycleProvider, LifecycleTransformer, Maybe, Observable, Observer,
    PhaseStream, Single, Subscribeable,
};

/// A component that exposes the lifecycle of the host it is attached to.
struct Screen {
    host: LifecycleHost<Phase>,
}

impl Screen {
    fn new() -> Self {
        Screen {
            host: LifecycleHost::new(Phase::Create, correspondence()),
        }
    }
}

impl LifecycleProvider<Phase> for Screen {
    fn lifecycle(&self) -> PhaseStream<Phase> {
        self.host.lifecycle()
    }

    fn bind_to_lifecycle(&self) -> LifecycleTransformer<Phase> {
        self.host.bind_to_lifecycle()
    }
}

#[test]
fn host_bindings_follow_the_current_phase() {
    let host = LifecycleHost::new(Phase::Create, correspondence());
    let (mut values, source) = Subject::emitter_receiver();

    let whole = Emissions::new();
    Observable::from(source.clone())
        .compose(&host.bind_to_lifecycle())
        .subscribe(whole.subscriber());

    host.advance(Phase::Start);
    host.advance(Phase::Resume);
    let foreground = Emissions::new();
    Observable::from(source)
        .compose(&host.bind_to_lifecycle())
        .subscribe(foreground.subscriber());
    assert_eq!(host.observers(), 2);

    values.next(1);
    host.advance(Phase::Pause);
    values.next(2);

    assert_eq!(foreground.nexts(), vec![1]);
    assert_eq!(foreground.completes(), 1);
    assert_eq!(host.observers(), 1);

    host.advance(Phase::Stop);
    host.advance(Phase::Destroy);
    assert_eq!(whole.nexts(), vec![1, 2]);
    assert_eq!(whole.completes(), 1);
    assert_eq!(host.observers(), 0);
    assert_eq!(host.current(), Phase::Destroy);
}

#[test]
fn host_bind_until_event_uses_explicit_phase() {
    let host = LifecycleHost::new(Phase::Resume, correspondence());
    let emissions = Emissions::<u8>::new();

    Single::never()
        .compose(&host.bind_until_event(Phase::Stop))
        .subscribe(emissions.single());

    host.advance(Phase::Pause);
    assert!(emissions.is_silent());
    host.advance(Phase::Stop);
    assert!(emissions.is_cancelled());
}

#[test]
fn finishing_the_host_leaves_pending_bindings_running() {
    let host = LifecycleHost::new(Phase::Start, correspondence());
    let (mut values, source) = Subject::emitter_receiver();
    let emissions = Emissions::new();

    Observable::from(source)
        .compose(&host.bind_to_lifecycle())
        .subscribe(emissions.subscriber());
    host.finish();
    values.next('a');

    assert!(host.is_finished());
    assert_eq!(emissions.nexts(), vec!['a']);
    assert!(emissions.is_silent());
    assert_eq!(host.observers(), 0);
}

#[test]
fn custom_provider_delegates_to_its_host() {
    let screen = Screen::new();
    let emissions = Emissions::<u8>::new();

    Maybe::never()
        .compose(&screen.bind_to_lifecycle())
        .subscribe(emissions.maybe());
    let repeated = Emissions::<u8>::new();
    Maybe::never()
        .compose(&screen.bind_until_event(Phase::Start))
        .subscribe(repeated.maybe());

    screen.host.advance(Phase::Start);
    assert_eq!(repeated.completes(), 1);
    assert!(emissions.is_silent());

    screen.host.advance(Phase::Destroy);
    assert_eq!(emissions.completes(), 1);
    assert!(emissions.nexts().is_empty());
    assert!(screen.lifecycle().same_as(&screen.host.lifecycle()));
    assert_eq!(screen.bind_to_lifecycle(), screen.host.bind_to_lifecycle());
}

// Completes the bound stream by advancing the host it is bound to.
fn advancing_on_complete(
    host: &Arc<LifecycleHost<Phase>>,
    to: Phase,
    completes: &Arc<AtomicUsize>,
) -> Subscriber<u8> {
    let host = Arc::clone(host);
    let completes = Arc::clone(completes);
    Subscriber::new(
        |_| {},
        |_| {},
        move || {
            completes.fetch_add(1, Ordering::SeqCst);
            host.advance(to);
        },
    )
}

#[test]
fn binding_to_a_destroyed_host_may_advance_it_on_completion() {
    let host = Arc::new(LifecycleHost::new(Phase::Destroy, correspondence()));
    let completes = Arc::new(AtomicUsize::new(0));
    let (_values, source) = Subject::emitter_receiver();

    Observable::from(source)
        .compose(&host.bind_to_lifecycle())
        .subscribe(advancing_on_complete(&host, Phase::Destroy, &completes));

    assert_eq!(completes.load(Ordering::SeqCst), 1);
    assert_eq!(host.observers(), 0);
    assert_eq!(host.current(), Phase::Destroy);
}

#[test]
fn binding_ended_by_the_replayed_phase_may_advance_the_host() {
    let host = Arc::new(LifecycleHost::new(Phase::Pause, correspondence()));
    let completes = Arc::new(AtomicUsize::new(0));
    let (_values, source) = Subject::emitter_receiver();

    Observable::from(source)
        .compose(&host.bind_until_event(Phase::Pause))
        .subscribe(advancing_on_complete(&host, Phase::Stop, &completes));

    assert_eq!(completes.load(Ordering::SeqCst), 1);
    assert_eq!(host.observers(), 0);
    assert_eq!(host.current(), Phase::Stop);
}

#[test]
fn cleanup_may_advance_the_host_that_ended_the_binding() {
    let host = Arc::new(LifecycleHost::new(Phase::Resume, correspondence()));
    let completes = Arc::new(AtomicUsize::new(0));
    let (mut values, source) = Subject::emitter_receiver();

    let later = Emissions::new();
    Observable::from(source.clone())
        .compose(&host.bind_to_lifecycle())
        .subscribe(advancing_on_complete(&host, Phase::Stop, &completes));
    Observable::from(source)
        .compose(&host.bind_until_event(Phase::Stop))
        .subscribe(later.subscriber());

    values.next(1);
    host.advance(Phase::Pause);

    assert_eq!(completes.load(Ordering::SeqCst), 1);
    assert_eq!(later.nexts(), vec![1]);
    assert_eq!(later.completes(), 1);
    assert_eq!(host.current(), Phase::Stop);
    assert_eq!(host.observers(), 0);
}
