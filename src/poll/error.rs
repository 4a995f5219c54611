//! Typed failures of a poll.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use super::attempt::Observed;
use crate::isolate::IsolationError;

/// The poll was configured in a way that cannot run. Raised before any attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum ConfigError {
    #[error(
        "no max_tries or timeout given; without either the poll would never stop. \
         Set poll_forever if that is what you want"
    )]
    NoLimit,
    #[error("poll_forever cannot be combined with max_tries or timeout")]
    ForeverWithLimit,
    #[error("max_tries must be at least 1")]
    ZeroMaxTries,
    #[error("isolated poll needs a hard timeout")]
    MissingHardTimeout,
}

/// Why a poll ended without a successful value.
#[derive(Debug)]
pub enum PollError<T, E> {
    /// Invalid configuration; nothing was run.
    Config(ConfigError),
    /// `max_tries` attempts were made and none passed the success check.
    AttemptsExhausted {
        max_tries: u32,
        history: Vec<Observed<T, E>>,
    },
    /// The soft deadline passed between two attempts.
    DeadlineExceeded {
        timeout: Duration,
        history: Vec<Observed<T, E>>,
    },
    /// The isolated worker did not report back in time and was killed.
    /// Whatever it had recorded is lost.
    HardTimeout { timeout: Duration },
    /// The target returned an error that was not ignorable.
    Operation(E),
    /// The isolated worker could not be started or died without reporting.
    Isolation(IsolationError),
}

impl<T, E> PollError<T, E> {
    /// Every recorded attempt, oldest first. Empty for failures that carry none.
    pub fn history(&self) -> &[Observed<T, E>] {
        match self {
            PollError::AttemptsExhausted { history, .. }
            | PollError::DeadlineExceeded { history, .. } => history.as_slice(),
            PollError::Config(_)
            | PollError::HardTimeout { .. }
            | PollError::Operation(_)
            | PollError::Isolation(_) => &[],
        }
    }

    /// The final recorded attempt.
    pub fn last(&self) -> Option<&Observed<T, E>> {
        self.history().last()
    }

    /// True for both the soft deadline and the hard kill.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            PollError::DeadlineExceeded { .. } | PollError::HardTimeout { .. }
        )
    }

    /// The target's own error, if that is what ended the poll.
    pub fn into_operation_error(self) -> Option<E> {
        match self {
            PollError::Operation(e) => Some(e),
            _ => None,
        }
    }
}

impl<T, E> From<ConfigError> for PollError<T, E> {
    fn from(e: ConfigError) -> Self {
        PollError::Config(e)
    }
}

impl<T, E> From<IsolationError> for PollError<T, E> {
    fn from(e: IsolationError) -> Self {
        PollError::Isolation(e)
    }
}

impl<T, E: fmt::Display> fmt::Display for PollError<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollError::Config(e) => write!(f, "invalid poll configuration: {}", e),
            PollError::AttemptsExhausted { max_tries, .. } => {
                write!(f, "poll()'s target failed check_success() after {} calls", max_tries)
            }
            PollError::DeadlineExceeded { timeout, .. } => {
                write!(f, "poll()'s target failed to return within {:?}", timeout)
            }
            PollError::HardTimeout { timeout } => write!(
                f,
                "poll()'s target blocked and failed to return within {:?}",
                timeout
            ),
            PollError::Operation(e) => write!(f, "{}", e),
            PollError::Isolation(e) => write!(f, "isolated poll failed: {}", e),
        }
    }
}

impl<T, E> std::error::Error for PollError<T, E>
where
    T: fmt::Debug,
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PollError::Config(e) => Some(e),
            PollError::Operation(e) => Some(e),
            PollError::Isolation(e) => Some(e),
            PollError::AttemptsExhausted { .. }
            | PollError::DeadlineExceeded { .. }
            | PollError::HardTimeout { .. } => None,
        }
    }
}
