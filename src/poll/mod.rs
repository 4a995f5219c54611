//! Polling engine.
//!
//! This module holds the attempt loop, the configuration it runs from, the
//! step/check strategies it is parameterised with, and the typed failures it
//! reports. The loop runs entirely in the calling thread; the only place it
//! yields is the sleep between attempts.

mod attempt;
mod clock;
mod error;
mod events;
mod policy;
mod run;
mod strategy;

pub use attempt::{HistorySink, Observed};
pub use clock::{Clock, SystemClock};
pub use error::{ConfigError, PollError};
pub use policy::Poll;
pub use strategy::{is_truthy, is_value, log_value, step_constant, step_linear_double, Truthy};
