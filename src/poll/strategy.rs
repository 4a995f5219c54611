//! Step functions and success checks.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt::Debug;
use std::time::Duration;

use tracing::Level;

use super::events;

/// Keep the step fixed on every iteration. Good when you know roughly how
/// long the target needs.
pub fn step_constant(step: Duration) -> Duration {
    step
}

/// Double the step on every iteration.
///
/// Growth is unbounded (only saturating at `Duration::MAX`), so a few
/// iterations can produce very long waits. Wrap it in your own closure if you
/// need a ceiling:
///
/// ```
/// use std::time::Duration;
/// let capped = |step| polling::step_linear_double(step).min(Duration::from_secs(10));
/// assert_eq!(capped(Duration::from_secs(8)), Duration::from_secs(10));
/// ```
pub fn step_linear_double(step: Duration) -> Duration {
    step.saturating_mul(2)
}

/// Values that have a "false-like" zero or empty form.
pub trait Truthy {
    fn is_truthy(&self) -> bool;
}

/// Default success check: anything not `false`, zero, empty, or `None`.
pub fn is_truthy<T: Truthy + ?Sized>(value: &T) -> bool {
    value.is_truthy()
}

/// Build a check that succeeds only on values equal to `target`.
///
/// Unlike [`is_truthy`] this can accept sentinels such as `false`, `0` or
/// `None` as the success value.
pub fn is_value<T: PartialEq>(target: T) -> impl Fn(&T) -> bool {
    move |value| *value == target
}

/// Wrap a success check so every value handed to it is logged at `level`.
pub fn log_value<T, C>(check: C, level: Level) -> impl Fn(&T) -> bool
where
    T: Debug,
    C: Fn(&T) -> bool,
{
    move |value| {
        events::check_success(level, value);
        check(value)
    }
}

impl Truthy for bool {
    fn is_truthy(&self) -> bool {
        *self
    }
}

impl Truthy for () {
    fn is_truthy(&self) -> bool {
        false
    }
}

macro_rules! truthy_int {
    ($($t:ty),*) => {
        $(impl Truthy for $t {
            fn is_truthy(&self) -> bool {
                *self != 0
            }
        })*
    };
}

truthy_int!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl Truthy for f32 {
    fn is_truthy(&self) -> bool {
        *self != 0.0
    }
}

impl Truthy for f64 {
    fn is_truthy(&self) -> bool {
        *self != 0.0
    }
}

impl Truthy for str {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl Truthy for String {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl<T> Truthy for [T] {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl<T> Truthy for Vec<T> {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl<T> Truthy for VecDeque<T> {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl<K, V, S> Truthy for HashMap<K, V, S> {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl<T, S> Truthy for HashSet<T, S> {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl<K, V> Truthy for BTreeMap<K, V> {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl<T> Truthy for BTreeSet<T> {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

/// `None` is false; `Some` is true whatever it holds.
impl<T> Truthy for Option<T> {
    fn is_truthy(&self) -> bool {
        self.is_some()
    }
}

impl<T: Truthy + ?Sized> Truthy for &T {
    fn is_truthy(&self) -> bool {
        (**self).is_truthy()
    }
}

impl<T: Truthy + ?Sized> Truthy for Box<T> {
    fn is_truthy(&self) -> bool {
        (**self).is_truthy()
    }
}
