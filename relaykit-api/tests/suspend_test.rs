// Integration tests for the suspend/skip primitive

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use relaykit_api::errors::TaskError;
use relaykit_api::suspend::{SkipPolicy, SuspendOutcome, SuspendState, Suspender};

fn wait_until_suspended(suspender: &Suspender) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while suspender.state() != SuspendState::Suspended {
        assert!(Instant::now() < deadline, "task never suspended");
        thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn test_skip_returns_well_before_requested_duration() {
    let suspender = Arc::new(Suspender::new(SkipPolicy::Persist));
    let parked = Arc::clone(&suspender);

    let waiter = thread::spawn(move || {
        let started = Instant::now();
        let outcome = parked.suspend(Duration::from_secs(30));
        (outcome, started.elapsed())
    });

    wait_until_suspended(&suspender);
    let skipped_at = Instant::now();
    suspender.skip();

    let (outcome, _) = waiter.join().unwrap();
    assert_eq!(outcome, Ok(SuspendOutcome::Skipped));
    assert!(skipped_at.elapsed() < Duration::from_millis(50));
    assert_eq!(suspender.state(), SuspendState::Idle);
}

#[test]
fn test_idle_skip_is_discarded_under_discard_policy() {
    let suspender = Suspender::new(SkipPolicy::DiscardWhenIdle);

    suspender.skip();
    assert_eq!(suspender.state(), SuspendState::Idle);

    let started = Instant::now();
    let outcome = suspender.suspend(Duration::from_millis(30)).unwrap();
    assert_eq!(outcome, SuspendOutcome::Elapsed);
    assert!(started.elapsed() >= Duration::from_millis(30));
}

#[test]
fn test_idle_skip_is_consumed_by_next_suspend_under_persist_policy() {
    let suspender = Suspender::new(SkipPolicy::Persist);

    suspender.skip();
    assert_eq!(suspender.state(), SuspendState::SkipRequested);

    let started = Instant::now();
    let outcome = suspender.suspend(Duration::from_secs(30)).unwrap();
    assert_eq!(outcome, SuspendOutcome::Skipped);
    assert!(started.elapsed() < Duration::from_millis(50));

    // Only one suspend call is released per request.
    let outcome = suspender.suspend(Duration::from_millis(10)).unwrap();
    assert_eq!(outcome, SuspendOutcome::Elapsed);
}

#[test]
fn test_repeated_idle_skips_do_not_accumulate() {
    let suspender = Suspender::new(SkipPolicy::Persist);
    suspender.skip();
    suspender.skip();
    suspender.skip();

    assert_eq!(suspender.suspend(Duration::from_secs(5)).unwrap(), SuspendOutcome::Skipped);
    assert_eq!(
        suspender.suspend(Duration::from_millis(5)).unwrap(),
        SuspendOutcome::Elapsed
    );
}

#[test]
fn test_interrupt_while_parked_fails_suspend() {
    let suspender = Arc::new(Suspender::default());
    let parked = Arc::clone(&suspender);

    let waiter = thread::spawn(move || parked.suspend(Duration::from_secs(30)));

    wait_until_suspended(&suspender);
    suspender.interrupt();

    assert_eq!(waiter.join().unwrap(), Err(TaskError::Interrupted));
    assert!(!suspender.is_interrupted());
    assert_eq!(suspender.state(), SuspendState::Idle);
}

#[test]
fn test_fractional_millis_suspend() {
    let suspender = Suspender::default();
    let started = Instant::now();

    let outcome = suspender.suspend_millis(12.5).unwrap();
    assert_eq!(outcome, SuspendOutcome::Elapsed);
    assert!(started.elapsed() >= Duration::from_micros(12_500));
}

#[test]
fn test_skip_policy_serde_names() {
    let persist: SkipPolicy = serde_json::from_str("\"persist\"").unwrap();
    let discard: SkipPolicy = serde_json::from_str("\"discard_when_idle\"").unwrap();

    assert_eq!(persist, SkipPolicy::Persist);
    assert_eq!(discard, SkipPolicy::DiscardWhenIdle);
    assert_eq!(SkipPolicy::default(), SkipPolicy::Persist);
}
