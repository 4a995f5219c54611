//! Poll configuration and its builder.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;

use super::attempt::HistorySink;
use super::clock::{Clock, SystemClock};
use super::error::{ConfigError, PollError};
use super::run;
use super::strategy::{is_truthy, step_constant, Truthy};

/// How to poll a target: step, step growth, success check, which errors to
/// tolerate, and when to give up.
///
/// Exactly one stopping rule must be chosen: `max_tries` and/or `timeout`, or
/// `poll_forever`. The check happens when the poll is run.
///
/// ```
/// use std::time::Duration;
/// use polling::{Poll, PollError};
///
/// let mut n = 0;
/// let value = Poll::new(Duration::ZERO)
///     .max_tries(5)
///     .run(|| -> Result<u32, ()> {
///         n += 1;
///         Ok(if n < 3 { 0 } else { n })
///     })
///     .unwrap();
/// assert_eq!(value, 3);
///
/// let err = Poll::new(Duration::ZERO)
///     .max_tries(2)
///     .run(|| -> Result<bool, ()> { Ok(false) })
///     .unwrap_err();
/// assert!(matches!(err, PollError::AttemptsExhausted { max_tries: 2, .. }));
/// ```
pub struct Poll<T, E> {
    pub(crate) step: Duration,
    pub(crate) step_function: Box<dyn Fn(Duration) -> Duration>,
    pub(crate) check_success: Box<dyn Fn(&T) -> bool>,
    pub(crate) ignore: Option<Box<dyn Fn(&E) -> bool>>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) max_tries: Option<u32>,
    pub(crate) poll_forever: bool,
    pub(crate) log: Option<Level>,
    pub(crate) log_error: Option<Level>,
    pub(crate) name: Option<String>,
    pub(crate) clock: Arc<dyn Clock>,
}

impl<T: Truthy + 'static, E> Poll<T, E> {
    /// Poll with a fixed `step` until the target returns a truthy value.
    pub fn new(step: Duration) -> Self {
        Self::with_check(step, |v: &T| is_truthy(v))
    }
}

impl<T, E> Poll<T, E> {
    /// Poll with a fixed `step` until `check` accepts a returned value.
    pub fn with_check<C>(step: Duration, check: C) -> Self
    where
        C: Fn(&T) -> bool + 'static,
    {
        Self {
            step,
            step_function: Box::new(step_constant),
            check_success: Box::new(check),
            ignore: None,
            timeout: None,
            max_tries: None,
            poll_forever: false,
            log: None,
            log_error: None,
            name: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the success check.
    pub fn check_success<C>(mut self, check: C) -> Self
    where
        C: Fn(&T) -> bool + 'static,
    {
        self.check_success = Box::new(check);
        self
    }

    /// Wait before the second attempt; later waits come from the step function.
    pub fn step(mut self, step: Duration) -> Self {
        self.step = step;
        self
    }

    /// How the step changes after every failed attempt (default: constant).
    pub fn step_function<S>(mut self, f: S) -> Self
    where
        S: Fn(Duration) -> Duration + 'static,
    {
        self.step_function = Box::new(f);
        self
    }

    /// Errors for which `classify` returns true are recorded in the history
    /// and polling continues. Any other error ends the poll.
    pub fn ignore_exceptions<C>(mut self, classify: C) -> Self
    where
        C: Fn(&E) -> bool + 'static,
    {
        self.ignore = Some(Box::new(classify));
        self
    }

    /// Soft deadline, checked between attempts only.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn max_tries(mut self, max_tries: u32) -> Self {
        self.max_tries = Some(max_tries);
        self
    }

    pub fn poll_forever(mut self, forever: bool) -> Self {
        self.poll_forever = forever;
        self
    }

    /// Log every value handed to the success check at `level`. Also sets the
    /// level of the begin event (DEBUG otherwise).
    pub fn log(mut self, level: Level) -> Self {
        self.log = Some(level);
        self
    }

    /// Log every ignored error at `level`.
    pub fn log_error(mut self, level: Level) -> Self {
        self.log_error = Some(level);
        self
    }

    /// Label used for the target in log events instead of its type name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Share a clock with the caller (e.g. to inspect a test clock afterwards).
    pub fn shared_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn get_step(&self) -> Duration {
        self.step
    }

    pub fn get_timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn get_max_tries(&self) -> Option<u32> {
        self.max_tries
    }

    pub fn is_poll_forever(&self) -> bool {
        self.poll_forever
    }

    /// Check the stopping-rule invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let limited = self.timeout.is_some() || self.max_tries.is_some();
        match (limited, self.poll_forever) {
            (false, false) => Err(ConfigError::NoLimit),
            (true, true) => Err(ConfigError::ForeverWithLimit),
            _ if self.max_tries == Some(0) => Err(ConfigError::ZeroMaxTries),
            _ => Ok(()),
        }
    }

    /// Call `target` until its value passes the success check.
    ///
    /// Returns the first passing value, or the reason polling stopped.
    pub fn run<F>(&self, target: F) -> Result<T, PollError<T, E>>
    where
        F: FnMut() -> Result<T, E>,
        T: fmt::Debug,
        E: fmt::Debug,
    {
        run::execute(self, target, &mut run::Discard)
    }

    /// Like [`Poll::run`], also appending every history entry to `sink` as it
    /// is recorded.
    pub fn run_with_history<F, S>(&self, target: F, sink: &mut S) -> Result<T, PollError<T, E>>
    where
        F: FnMut() -> Result<T, E>,
        S: HistorySink<T, E> + ?Sized,
        T: fmt::Debug,
        E: fmt::Debug,
    {
        run::execute(self, target, sink)
    }
}

impl<T, E> fmt::Debug for Poll<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Poll")
            .field("step", &self.step)
            .field("timeout", &self.timeout)
            .field("max_tries", &self.max_tries)
            .field("poll_forever", &self.poll_forever)
            .field("log", &self.log)
            .field("log_error", &self.log_error)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
