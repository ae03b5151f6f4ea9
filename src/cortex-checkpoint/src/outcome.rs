//! Results of operations that degrade instead of failing.

use crate::SnapshotError;

/// Result of a degrade-gracefully operation.
///
/// `Done` means the delegate ran cleanly, even if there was nothing to report.
/// `Degraded` carries the neutral value the caller should act on together with
/// the error that was swallowed to produce it.
#[derive(Debug)]
pub enum Outcome<T> {
    Done(T),
    Degraded { value: T, error: SnapshotError },
}

impl<T> Outcome<T> {
    pub fn degraded(value: T, error: SnapshotError) -> Self {
        Self::Degraded { value, error }
    }

    /// Borrow the value regardless of how it was produced.
    pub fn value(&self) -> &T {
        match self {
            Self::Done(value) | Self::Degraded { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Self::Done(value) | Self::Degraded { value, .. } => value,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    pub fn error(&self) -> Option<&SnapshotError> {
        match self {
            Self::Done(_) => None,
            Self::Degraded { error, .. } => Some(error),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Done(value) => Outcome::Done(f(value)),
            Self::Degraded { value, error } => Outcome::Degraded {
                value: f(value),
                error,
            },
        }
    }
}
