//! Hard timeouts through process isolation.
//!
//! A soft `timeout` is only looked at between attempts, so a target that
//! blocks forever keeps [`Poll::run`] blocked forever too. [`Isolated`] runs
//! the whole poll in a forked worker process and kills it with `SIGKILL` once
//! the hard timeout passes, whatever the target is doing.
//!
//! The outcome travels back over a pipe as JSON, so the target's value and
//! error types must be `Serialize + DeserializeOwned`. Nothing else crosses
//! the boundary: the worker's log events go to whatever the forked subscriber
//! writes to, and a killed worker's history is lost.

mod error;
mod wire;
mod worker;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use std::time::Duration;

use crate::poll::{ConfigError, Poll, PollError};
use wire::Report;
use worker::Waited;

pub use error::IsolationError;

/// A [`Poll`] that runs in a killable worker process.
///
/// ```no_run
/// use std::time::Duration;
/// use polling::{Poll, PollError};
///
/// let err = Poll::new(Duration::from_millis(100))
///     .poll_forever(true)
///     .isolate()
///     .hard_timeout(Duration::from_secs(1))
///     .run(|| -> Result<bool, String> {
///         std::thread::sleep(Duration::from_secs(3600));
///         Ok(true)
///     })
///     .unwrap_err();
/// assert!(matches!(err, PollError::HardTimeout { .. }));
/// ```
#[derive(Debug)]
pub struct Isolated<T, E> {
    poll: Poll<T, E>,
    hard_timeout: Option<Duration>,
}

impl<T, E> Poll<T, E> {
    /// Move this poll into an isolated worker. A hard timeout must still be set.
    pub fn isolate(self) -> Isolated<T, E> {
        Isolated::new(self)
    }
}

impl<T, E> Isolated<T, E> {
    pub fn new(poll: Poll<T, E>) -> Self {
        Self {
            poll,
            hard_timeout: None,
        }
    }

    /// How long to wait for the worker before killing it. Required.
    pub fn hard_timeout(mut self, timeout: Duration) -> Self {
        self.hard_timeout = Some(timeout);
        self
    }

    pub fn get_hard_timeout(&self) -> Option<Duration> {
        self.hard_timeout
    }

    /// Run the poll in a forked worker and wait at most the hard timeout.
    ///
    /// The worker's outcome (value, exhausted history, target error) is
    /// returned as if the poll had run in this process. If the worker is
    /// killed the result is [`PollError::HardTimeout`] with no history.
    pub fn run<F>(&self, target: F) -> Result<T, PollError<T, E>>
    where
        F: FnMut() -> Result<T, E>,
        T: Serialize + DeserializeOwned + Debug,
        E: Serialize + DeserializeOwned + Debug,
    {
        let hard_timeout = self.hard_timeout.ok_or(ConfigError::MissingHardTimeout)?;
        self.poll.validate()?;

        let poll = &self.poll;
        let work = move || wire::encode(&Report::from(poll.run(target)));

        match worker::spawn_and_wait(work, hard_timeout)? {
            Waited::Reported(body) => wire::decode::<T, E>(&body)
                .map_err(IsolationError::Decode)?
                .into_outcome(),
            Waited::Killed => {
                tracing::warn!(
                    "poll()'s target blocked and failed to return within {:?}; worker killed",
                    hard_timeout
                );
                Err(PollError::HardTimeout {
                    timeout: hard_timeout,
                })
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::poll::Observed;
    use std::time::Instant;

    #[test]
    fn missing_hard_timeout_is_a_config_error() {
        let mut calls = 0;
        let err = Poll::new(Duration::ZERO)
            .max_tries(1)
            .isolate()
            .run(|| -> Result<bool, String> {
                calls += 1;
                Ok(true)
            })
            .unwrap_err();
        assert!(matches!(
            err,
            PollError::Config(ConfigError::MissingHardTimeout)
        ));
        assert_eq!(calls, 0);
    }

    #[test]
    fn invalid_inner_poll_rejected_before_fork() {
        let err = Poll::new(Duration::ZERO)
            .isolate()
            .hard_timeout(Duration::from_secs(5))
            .run(|| -> Result<bool, String> { Ok(true) })
            .unwrap_err();
        assert!(matches!(err, PollError::Config(ConfigError::NoLimit)));
    }

    #[test]
    fn value_comes_back_from_worker() {
        let mut n = 0u32;
        let value = Poll::new(Duration::ZERO)
            .max_tries(5)
            .isolate()
            .hard_timeout(Duration::from_secs(10))
            .run(|| -> Result<u32, String> {
                n += 1;
                Ok(if n < 3 { 0 } else { n * 10 })
            })
            .unwrap();
        assert_eq!(value, 30);
        // The calls happened in the worker's copy of `n`.
        assert_eq!(n, 0);
    }

    #[test]
    fn exhausted_history_comes_back_from_worker() {
        let err = Poll::new(Duration::ZERO)
            .max_tries(3)
            .isolate()
            .hard_timeout(Duration::from_secs(10))
            .run(|| -> Result<bool, String> { Ok(false) })
            .unwrap_err();
        match err {
            PollError::AttemptsExhausted { max_tries, history } => {
                assert_eq!(max_tries, 3);
                assert_eq!(history, vec![Observed::Value(false); 3]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn blocked_target_is_killed() {
        let started = Instant::now();
        let err = Poll::new(Duration::from_millis(10))
            .poll_forever(true)
            .isolate()
            .hard_timeout(Duration::from_millis(200))
            .run(|| -> Result<bool, String> {
                loop {
                    std::thread::sleep(Duration::from_secs(3600));
                }
            })
            .unwrap_err();
        assert!(matches!(err, PollError::HardTimeout { .. }));
        assert!(err.history().is_empty());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn panicking_worker_reports_isolation_error() {
        let err = Poll::new(Duration::ZERO)
            .max_tries(1)
            .isolate()
            .hard_timeout(Duration::from_secs(10))
            .run(|| -> Result<bool, String> { panic!("target exploded") })
            .unwrap_err();
        assert!(matches!(
            err,
            PollError::Isolation(IsolationError::WorkerDied { .. })
        ));
    }
}
