//! Poll a fallible target until a success check passes.
//!
//! [`Poll`] drives the attempt/backoff loop in the calling thread with a soft
//! deadline. [`Isolated`] runs the same loop in a forked worker process so a
//! target that never returns can still be cut off.

pub mod config;
pub mod isolate;
pub mod logging;
pub mod poll;

pub use isolate::{IsolationError, Isolated};
pub use poll::{
    is_truthy, is_value, log_value, step_constant, step_linear_double, Clock, ConfigError,
    HistorySink, Observed, Poll, PollError, SystemClock, Truthy,
};
