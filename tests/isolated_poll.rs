//! Polls run in a killable worker process.

#![cfg(unix)]

mod common;

use common::ProbeError;
use polling::{ConfigError, IsolationError, Observed, Poll, PollError};
use std::time::{Duration, Instant};

#[test]
fn blocking_target_cut_off_at_hard_timeout() {
    let hard = Duration::from_millis(300);
    let started = Instant::now();
    let err = Poll::new(Duration::from_millis(10))
        .timeout(Duration::from_millis(300))
        .isolate()
        .hard_timeout(hard)
        .run(|| -> Result<bool, ProbeError> {
            std::thread::sleep(Duration::from_secs(3600));
            Ok(true)
        })
        .unwrap_err();
    let elapsed = started.elapsed();
    assert!(matches!(err, PollError::HardTimeout { timeout } if timeout == hard));
    assert!(err.history().is_empty());
    assert!(err.is_timeout());
    assert!(elapsed >= hard);
    assert!(elapsed < hard + Duration::from_secs(3), "took {:?}", elapsed);
    assert_eq!(
        err.to_string(),
        "poll()'s target blocked and failed to return within 300ms"
    );
}

#[test]
fn busy_loop_target_is_killed_too() {
    let err = Poll::new(Duration::ZERO)
        .poll_forever(true)
        .isolate()
        .hard_timeout(Duration::from_millis(200))
        .run(|| -> Result<u64, ProbeError> {
            let mut x = 0u64;
            loop {
                x = std::hint::black_box(x.wrapping_add(1));
            }
        })
        .unwrap_err();
    assert!(matches!(err, PollError::HardTimeout { .. }));
}

#[test]
fn success_value_propagates_unchanged() {
    let mut n = 0;
    let value = Poll::new(Duration::from_millis(5))
        .max_tries(10)
        .isolate()
        .hard_timeout(Duration::from_secs(10))
        .run(|| -> Result<String, ProbeError> {
            n += 1;
            Ok(if n < 4 { String::new() } else { format!("ready after {}", n) })
        })
        .unwrap();
    assert_eq!(value, "ready after 4");
}

#[test]
fn exhausted_failure_keeps_history_and_last_value() {
    let mut n = 0;
    let err = Poll::new(Duration::ZERO)
        .max_tries(3)
        .ignore_exceptions(|e| matches!(e, ProbeError::Eof))
        .isolate()
        .hard_timeout(Duration::from_secs(10))
        .run(|| -> Result<u8, ProbeError> {
            n += 1;
            if n == 3 {
                Err(ProbeError::Eof)
            } else {
                Ok(0)
            }
        })
        .unwrap_err();
    assert!(matches!(err, PollError::AttemptsExhausted { max_tries: 3, .. }));
    assert_eq!(
        err.history(),
        &[
            Observed::Value(0),
            Observed::Value(0),
            Observed::Ignored(ProbeError::Eof)
        ]
    );
    assert_eq!(err.last(), Some(&Observed::Ignored(ProbeError::Eof)));
}

#[test]
fn soft_deadline_inside_worker_is_reported_as_deadline() {
    let err = Poll::new(Duration::from_millis(20))
        .timeout(Duration::from_millis(50))
        .isolate()
        .hard_timeout(Duration::from_secs(10))
        .run(|| -> Result<bool, ProbeError> { Ok(false) })
        .unwrap_err();
    assert!(matches!(err, PollError::DeadlineExceeded { .. }));
    assert!(!err.history().is_empty());
}

#[test]
fn fatal_target_error_propagates_verbatim() {
    let err = Poll::new(Duration::ZERO)
        .max_tries(5)
        .isolate()
        .hard_timeout(Duration::from_secs(10))
        .run(|| -> Result<bool, ProbeError> { Err(ProbeError::Runtime("disk gone".into())) })
        .unwrap_err();
    assert_eq!(
        err.into_operation_error(),
        Some(ProbeError::Runtime("disk gone".into()))
    );
}

#[test]
fn hard_timeout_is_required() {
    let err = Poll::new(Duration::ZERO)
        .max_tries(1)
        .isolate()
        .run(|| -> Result<bool, ProbeError> { Ok(true) })
        .unwrap_err();
    assert!(matches!(
        err,
        PollError::Config(ConfigError::MissingHardTimeout)
    ));
}

#[test]
fn worker_dying_with_live_subprocess_reported_promptly() {
    let hard = Duration::from_secs(20);
    let started = Instant::now();
    let err = Poll::new(Duration::ZERO)
        .max_tries(1)
        .isolate()
        .hard_timeout(hard)
        .run(|| -> Result<bool, ProbeError> {
            // Outlives the worker; it must not keep the report pipe open.
            let _sleeper = std::process::Command::new("sleep").arg("30").spawn();
            panic!("worker gave up after starting a subprocess");
        })
        .unwrap_err();
    let elapsed = started.elapsed();
    assert!(
        matches!(err, PollError::Isolation(IsolationError::WorkerDied { .. })),
        "unexpected {:?}",
        err
    );
    assert!(elapsed < Duration::from_secs(10), "took {:?}", elapsed);
}
