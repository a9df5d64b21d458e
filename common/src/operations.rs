//! Abstract operations executed by [`Handler`]s.
//!
//! [`Handler`]: crate::Handler

use std::marker::PhantomData;

/// Operation recording a value, e.g. an audit entry.
#[derive(Clone, Copy, Debug)]
pub struct Insert<T>(pub T);

/// Operation starting a long-running job described by a value.
#[derive(Clone, Copy, Debug)]
pub struct Start<T>(pub T);

/// Operation running a single iteration of a job.
#[derive(Clone, Copy, Debug)]
pub struct Perform<T>(pub T);

/// Value `B` tagged with the type `W` it is meant for.
///
/// Disambiguates operations over the same value type, e.g. configurations of
/// different jobs.
#[derive(Clone, Copy, Debug)]
pub struct By<W, B> {
    /// Type the value is meant for.
    _for: PhantomData<W>,

    /// Tagged value.
    value: B,
}

impl<W, B> By<W, B> {
    /// Tags the provided `value` with `W`.
    #[must_use]
    pub fn new(value: B) -> Self {
        Self {
            _for: PhantomData,
            value,
        }
    }

    /// Consumes this [`By`] returning the tagged value.
    #[must_use]
    pub fn into_inner(self) -> B {
        self.value
    }
}
