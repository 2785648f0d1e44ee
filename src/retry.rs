// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Retry policies for blocking framing operations.
//!
//! A [`Stream`] never blocks: when it has nothing to offer, a transfer simply
//! moves zero bytes. Framing layers in blocking mode turn this into a wait by
//! calling transfers in a loop, and consult a [`Retry`] policy every time a
//! transfer comes back empty. The policy decides whether to try again right
//! away, wait a little first, or give up.
//!
//! [`Stream`]: ../stream/trait.Stream.html
//! [`Retry`]: trait.Retry.html

use static_assertions::assert_obj_safe;

use crate::stream::Error;

/// A strategy for waiting on a stream that has no progress to report.
///
/// Any `FnMut(usize) -> Result<(), Error>` closure is a `Retry`.
pub trait Retry {
    /// Called after the `attempt`th consecutive zero-length transfer; the
    /// first call has `attempt == 1`.
    ///
    /// Returning `Ok(())` causes the transfer to be attempted again;
    /// returning an error aborts the blocking operation with that error.
    fn retry(&mut self, attempt: usize) -> Result<(), Error>;
}
assert_obj_safe!(Retry);

impl<F> Retry for F
where
    F: FnMut(usize) -> Result<(), Error>,
{
    #[inline]
    fn retry(&mut self, attempt: usize) -> Result<(), Error> {
        self(attempt)
    }
}

/// Retries forever, spinning the CPU in between.
///
/// This is the default policy: a blocking read on a stream that never
/// delivers another byte never returns.
#[derive(Copy, Clone, Debug, Default)]
pub struct Spin;

impl Retry for Spin {
    #[inline]
    fn retry(&mut self, _: usize) -> Result<(), Error> {
        core::hint::spin_loop();
        Ok(())
    }
}

/// Spins like [`Spin`], but gives up with [`Error::Timeout`] after too many
/// consecutive attempts.
///
/// [`Spin`]: struct.Spin.html
/// [`Error::Timeout`]: ../stream/enum.Error.html#variant.Timeout
#[derive(Copy, Clone, Debug)]
pub struct SpinLimit {
    /// The number of consecutive zero-length transfers tolerated.
    pub max_attempts: usize,
}

impl Retry for SpinLimit {
    fn retry(&mut self, attempt: usize) -> Result<(), Error> {
        if attempt > self.max_attempts {
            return fail!(
                Error::Timeout,
                "no progress after {} attempts",
                self.max_attempts,
            );
        }
        core::hint::spin_loop();
        Ok(())
    }
}

/// Puts the current thread to sleep for a fixed interval between attempts.
#[cfg(feature = "std")]
#[derive(Copy, Clone, Debug)]
pub struct Sleep(pub std::time::Duration);

#[cfg(feature = "std")]
impl Retry for Sleep {
    fn retry(&mut self, _: usize) -> Result<(), Error> {
        std::thread::sleep(self.0);
        Ok(())
    }
}

/// Calls `op` until it transfers at least one byte, consulting `retry`
/// after every zero-length result.
///
/// Errors from either `op` or `retry` are returned as-is.
pub(crate) fn until_progress<R, F>(
    retry: &mut R,
    mut op: F,
) -> Result<usize, Error>
where
    R: Retry + ?Sized,
    F: FnMut() -> Result<usize, Error>,
{
    let mut attempt = 0;
    loop {
        let n = op()?;
        if n > 0 {
            return Ok(n);
        }
        attempt += 1;
        retry.retry(attempt)?;
    }
}
