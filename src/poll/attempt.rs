//! What a single call of the target produced.

use serde::{Deserialize, Serialize};
use std::sync::mpsc;

/// A non-successful attempt as recorded in the poll history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Observed<T, E> {
    /// The target returned a value that failed the success check.
    Value(T),
    /// The target returned an error that the poll was told to ignore.
    Ignored(E),
}

impl<T, E> Observed<T, E> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Observed::Value(v) => Some(v),
            Observed::Ignored(_) => None,
        }
    }

    pub fn ignored(&self) -> Option<&E> {
        match self {
            Observed::Value(_) => None,
            Observed::Ignored(e) => Some(e),
        }
    }
}

/// Outcome of one attempt, threaded through the poll loop.
#[derive(Debug)]
pub(crate) enum Attempt<T, E> {
    /// Value passed the success check; the poll is done.
    Success(T),
    /// Counts toward `max_tries` and goes into the history.
    Failed(Observed<T, E>),
    /// Error not covered by the ignore classifier; ends the poll as is.
    Fatal(E),
}

/// Ordered append target that receives every history entry as it is recorded.
///
/// The engine always keeps its own history for the failure payload; a sink is
/// for callers that want the values while the poll is still running or after
/// it succeeded.
pub trait HistorySink<T, E> {
    fn record(&mut self, entry: &Observed<T, E>);
}

impl<T: Clone, E: Clone> HistorySink<T, E> for Vec<Observed<T, E>> {
    fn record(&mut self, entry: &Observed<T, E>) {
        self.push(entry.clone());
    }
}

/// Send errors (receiver dropped) are ignored.
impl<T: Clone, E: Clone> HistorySink<T, E> for mpsc::Sender<Observed<T, E>> {
    fn record(&mut self, entry: &Observed<T, E>) {
        let _ = self.send(entry.clone());
    }
}

impl<T, E, S: HistorySink<T, E> + ?Sized> HistorySink<T, E> for &mut S {
    fn record(&mut self, entry: &Observed<T, E>) {
        (**self).record(entry);
    }
}
