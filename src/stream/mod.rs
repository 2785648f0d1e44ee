// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! The [`Stream`] abstraction and generic stream decorators.
//!
//! A [`Stream`] is a non-blocking, bidirectional byte pipe. Reads and writes
//! are bounded: they transfer as many bytes as the implementation can accept
//! right now, which may be fewer than requested. A transfer of zero bytes is
//! not an error; it means the caller should try again later. Failures of the
//! underlying transport are reported as [`Error`]s.
//!
//! Every method of [`Stream`] has a default implementation describing an
//! endpoint that cannot do anything: availability queries report zero,
//! transfers move zero bytes, and `flush()`/`close()` trivially succeed.
//! Implementations only override the capabilities they actually have.
//!
//! [`Stream`]: trait.Stream.html
//! [`Error`]: enum.Error.html

use static_assertions::assert_obj_safe;

#[cfg(feature = "arbitrary-derive")]
use libfuzzer_sys::arbitrary::{self, Arbitrary};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Implements [`Stream`] for a decorator type by forwarding every operation
/// to the decorator's `inner` field.
macro_rules! delegate_stream {
    (impl<$($param:ident $(: $bound:path)?),*> for $ty:ty) => {
        impl<$($param $(: $bound)?),*> $crate::stream::Stream for $ty {
            #[inline]
            fn available_read(&self) -> usize {
                $crate::stream::Stream::available_read(&self.inner)
            }

            #[inline]
            fn read(
                &mut self,
                out: &mut [u8],
            ) -> Result<usize, $crate::stream::Error> {
                $crate::stream::Stream::read(&mut self.inner, out)
            }

            #[inline]
            fn skip(
                &mut self,
                len: usize,
            ) -> Result<usize, $crate::stream::Error> {
                $crate::stream::Stream::skip(&mut self.inner, len)
            }

            #[inline]
            fn available_write(&self) -> usize {
                $crate::stream::Stream::available_write(&self.inner)
            }

            #[inline]
            fn write(
                &mut self,
                buf: &[u8],
            ) -> Result<usize, $crate::stream::Error> {
                $crate::stream::Stream::write(&mut self.inner, buf)
            }

            #[inline]
            fn flush(&mut self) -> Result<(), $crate::stream::Error> {
                $crate::stream::Stream::flush(&mut self.inner)
            }

            #[inline]
            fn close(&mut self) -> Result<(), $crate::stream::Error> {
                $crate::stream::Stream::close(&mut self.inner)
            }
        }
    };
}

mod managed;
mod wrapper;

#[cfg(feature = "std")]
mod std_io;

pub use managed::Managed;
pub use wrapper::Wrapper;

#[cfg(feature = "std")]
pub use std_io::StdRead;
#[cfg(feature = "std")]
pub use std_io::StdWrite;

/// A stream error.
///
/// "Nothing to do yet" is never represented as an error: a would-block
/// transfer is `Ok(0)`, and an incomplete message is `Ok(None)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Error {
    /// Indicates that an argument was out of range, such as a zero line
    /// length or an oversized packet.
    InvalidParameter,

    /// Indicates that a buffer could not be allocated.
    OutOfMemory,

    /// Indicates that the underlying transport failed to transfer data.
    Io,

    /// Indicates that an operation gave up waiting for the underlying
    /// transport to make progress.
    Timeout,

    /// Indicates that the other end of the stream is gone, and no more
    /// bytes will ever be delivered.
    Closed,

    /// Indicates that a complete message was received but its contents were
    /// malformed, such as a line that is not valid UTF-8.
    InvalidData,

    /// Indicates that an unspecified failure occurred, such as a user
    /// initialization callback reporting failure.
    Unknown,
}

/// Selects how a framing layer reads messages out of its inner stream.
///
/// The mode is fixed when the framing layer is constructed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "arbitrary-derive", derive(Arbitrary))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ReadMode {
    /// Keep reading, consulting a [`Retry`] policy whenever the inner stream
    /// has nothing to offer, until a whole message has arrived.
    ///
    /// [`Retry`]: ../retry/trait.Retry.html
    Blocking,

    /// Consume whatever is currently available and return. A partially
    /// received message is kept and completed by later calls.
    NonBlocking,
}

impl Default for ReadMode {
    fn default() -> Self {
        Self::Blocking
    }
}

/// A bounded, non-blocking byte stream.
///
/// See the [module documentation](index.html) for the general contract.
pub trait Stream {
    /// Returns the number of bytes that can currently be read without the
    /// read coming up short.
    fn available_read(&self) -> usize {
        0
    }

    /// Reads up to `out.len()` bytes into `out`, returning how many were
    /// actually read.
    ///
    /// `Ok(0)` means that nothing is available right now.
    fn read(&mut self, out: &mut [u8]) -> Result<usize, Error> {
        let _ = out;
        Ok(0)
    }

    /// Discards up to `len` bytes, returning how many were actually
    /// discarded.
    ///
    /// The default implementation reads into a scratch buffer until either
    /// `len` bytes are gone or the stream has nothing more to offer.
    fn skip(&mut self, len: usize) -> Result<usize, Error> {
        let mut scratch = [0; 32];
        let mut skipped = 0;
        while skipped < len {
            let chunk = (len - skipped).min(scratch.len());
            let n = self.read(&mut scratch[..chunk])?;
            if n == 0 {
                break;
            }
            skipped += n;
        }
        Ok(skipped)
    }

    /// Returns the number of bytes that can currently be written without the
    /// write coming up short.
    fn available_write(&self) -> usize {
        0
    }

    /// Writes up to `buf.len()` bytes from `buf`, returning how many were
    /// actually written.
    ///
    /// `Ok(0)` means that the stream cannot accept anything right now.
    fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        let _ = buf;
        Ok(0)
    }

    /// Pushes any bytes buffered by the implementation out to the transport.
    fn flush(&mut self) -> Result<(), Error> {
        Ok(())
    }

    /// Shuts the stream down.
    fn close(&mut self) -> Result<(), Error> {
        Ok(())
    }
}
assert_obj_safe!(Stream);

impl<S: Stream + ?Sized> Stream for &'_ mut S {
    #[inline]
    fn available_read(&self) -> usize {
        S::available_read(*self)
    }

    #[inline]
    fn read(&mut self, out: &mut [u8]) -> Result<usize, Error> {
        S::read(*self, out)
    }

    #[inline]
    fn skip(&mut self, len: usize) -> Result<usize, Error> {
        S::skip(*self, len)
    }

    #[inline]
    fn available_write(&self) -> usize {
        S::available_write(*self)
    }

    #[inline]
    fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        S::write(*self, buf)
    }

    #[inline]
    fn flush(&mut self) -> Result<(), Error> {
        S::flush(*self)
    }

    #[inline]
    fn close(&mut self) -> Result<(), Error> {
        S::close(*self)
    }
}

impl<S: Stream + ?Sized> Stream for alloc::boxed::Box<S> {
    #[inline]
    fn available_read(&self) -> usize {
        S::available_read(self)
    }

    #[inline]
    fn read(&mut self, out: &mut [u8]) -> Result<usize, Error> {
        S::read(self, out)
    }

    #[inline]
    fn skip(&mut self, len: usize) -> Result<usize, Error> {
        S::skip(self, len)
    }

    #[inline]
    fn available_write(&self) -> usize {
        S::available_write(self)
    }

    #[inline]
    fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        S::write(self, buf)
    }

    #[inline]
    fn flush(&mut self) -> Result<(), Error> {
        S::flush(self)
    }

    #[inline]
    fn close(&mut self) -> Result<(), Error> {
        S::close(self)
    }
}
