//! Log events emitted by the poll loop. Formatting and destination are up to
//! whatever `tracing` subscriber is installed.

use std::fmt::Debug;
use std::time::Duration;
use tracing::Level;

/// `tracing` macros take a static level; dispatch a runtime one.
macro_rules! event_at {
    ($level:expr, $($arg:tt)+) => {{
        let level: Level = $level;
        if level == Level::ERROR {
            tracing::error!($($arg)+)
        } else if level == Level::WARN {
            tracing::warn!($($arg)+)
        } else if level == Level::INFO {
            tracing::info!($($arg)+)
        } else if level == Level::DEBUG {
            tracing::debug!($($arg)+)
        } else {
            tracing::trace!($($arg)+)
        }
    }};
}

/// Shows a set limit as its bare value and an unset one as `None`.
fn limit<T: Debug>(value: Option<T>) -> String {
    value.map_or_else(|| "None".to_owned(), |v| format!("{:?}", v))
}

pub(crate) fn begin(
    level: Level,
    operation: &str,
    step: Duration,
    timeout: Option<Duration>,
    max_tries: Option<u32>,
    poll_forever: bool,
) {
    event_at!(
        level,
        "Begin poll(target={}, step={:?}, timeout={}, max_tries={}, poll_forever={})",
        operation,
        step,
        limit(timeout),
        limit(max_tries),
        poll_forever
    );
}

pub(crate) fn check_success<T: Debug + ?Sized>(level: Level, value: &T) {
    event_at!(level, "poll() calls check_success({:?})", value);
}

pub(crate) fn ignored<E: Debug + ?Sized>(level: Level, error: &E) {
    event_at!(level, "poll() ignored exception {:?}", error);
}
