//! The poll loop: call, check, record, give up or sleep, repeat.

use std::fmt::Debug;

use tracing::Level;

use super::attempt::{Attempt, HistorySink, Observed};
use super::error::PollError;
use super::events;
use super::policy::Poll;
use super::strategy::log_value;

/// Sink used when the caller does not want the history streamed.
pub(crate) struct Discard;

impl<T, E> HistorySink<T, E> for Discard {
    fn record(&mut self, _entry: &Observed<T, E>) {}
}

/// Calls the target once and sorts the result into an [`Attempt`].
fn attempt<T, E, F>(
    target: &mut F,
    check: &dyn Fn(&T) -> bool,
    ignore: Option<&dyn Fn(&E) -> bool>,
    log_error: Option<Level>,
) -> Attempt<T, E>
where
    F: FnMut() -> Result<T, E>,
    E: Debug,
{
    match target() {
        Ok(value) if check(&value) => Attempt::Success(value),
        Ok(value) => Attempt::Failed(Observed::Value(value)),
        Err(err) if ignore.is_some_and(|ignore| ignore(&err)) => {
            if let Some(level) = log_error {
                events::ignored(level, &err);
            }
            Attempt::Failed(Observed::Ignored(err))
        }
        Err(err) => Attempt::Fatal(err),
    }
}

/// Fails with `AttemptsExhausted` once `tries` reached the configured maximum.
fn check_max_tries<T, E>(
    max_tries: Option<u32>,
    tries: u32,
    history: &mut Vec<Observed<T, E>>,
) -> Result<(), PollError<T, E>> {
    match max_tries {
        Some(max_tries) if tries >= max_tries => Err(PollError::AttemptsExhausted {
            max_tries,
            history: std::mem::take(history),
        }),
        _ => Ok(()),
    }
}

pub(crate) fn execute<T, E, F, S>(
    poll: &Poll<T, E>,
    mut target: F,
    sink: &mut S,
) -> Result<T, PollError<T, E>>
where
    F: FnMut() -> Result<T, E>,
    S: HistorySink<T, E> + ?Sized,
    T: Debug,
    E: Debug,
{
    poll.validate()?;

    let clock = &*poll.clock;
    // A timeout too large to represent as an instant never expires.
    let deadline = poll.timeout.and_then(|timeout| clock.now().checked_add(timeout));

    let name = poll
        .name
        .as_deref()
        .unwrap_or_else(|| std::any::type_name::<F>());
    events::begin(
        poll.log.unwrap_or(Level::DEBUG),
        name,
        poll.step,
        poll.timeout,
        poll.max_tries,
        poll.poll_forever,
    );

    let logged;
    let check: &dyn Fn(&T) -> bool = match poll.log {
        Some(level) => {
            logged = log_value(&*poll.check_success, level);
            &logged
        }
        None => &*poll.check_success,
    };
    let ignore = poll.ignore.as_deref();

    let mut step = poll.step;
    let mut tries = 0u32;
    let mut history = Vec::new();

    loop {
        check_max_tries(poll.max_tries, tries, &mut history)?;

        let observed = match attempt(&mut target, check, ignore, poll.log_error) {
            Attempt::Success(value) => return Ok(value),
            Attempt::Failed(observed) => observed,
            Attempt::Fatal(err) => return Err(PollError::Operation(err)),
        };

        sink.record(&observed);
        history.push(observed);
        tries = tries.saturating_add(1);

        // Checked again here so the final attempt is not followed by a sleep.
        check_max_tries(poll.max_tries, tries, &mut history)?;

        // Checked after the call so the target always runs at least once.
        if let (Some(deadline), Some(timeout)) = (deadline, poll.timeout) {
            if clock.now() >= deadline {
                return Err(PollError::DeadlineExceeded { timeout, history });
            }
        }

        clock.sleep(step);
        step = (poll.step_function)(step);
    }
}
