// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Test-only streams that misbehave in controlled ways.

use crate::stream::Error;
use crate::stream::Stream;

/// A stream that fails with [`Error::Timeout`] instead of coming up short on
/// a read, like a UART driver with a hardware receive timeout.
///
/// Writes are forwarded unchanged.
pub struct Timeout<S>(pub S);

impl<S: Stream> Stream for Timeout<S> {
    fn available_read(&self) -> usize {
        self.0.available_read()
    }

    fn read(&mut self, out: &mut [u8]) -> Result<usize, Error> {
        if self.0.available_read() < out.len() {
            return Err(Error::Timeout);
        }
        self.0.read(out)
    }

    fn available_write(&self) -> usize {
        self.0.available_write()
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        self.0.write(buf)
    }
}

/// A stream that transfers at most one byte per call, and only on every
/// other call; the remaining calls report would-block.
///
/// Availability is forwarded unchanged, so a reader can be told bytes are
/// pending and still get nothing.
pub struct Trickle<S> {
    pub inner: S,
    ready: bool,
}

impl<S> Trickle<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            ready: false,
        }
    }

    fn tick(&mut self, len: usize) -> usize {
        self.ready = !self.ready;
        if self.ready {
            0
        } else {
            len.min(1)
        }
    }
}

impl<S: Stream> Stream for Trickle<S> {
    fn available_read(&self) -> usize {
        self.inner.available_read()
    }

    fn read(&mut self, out: &mut [u8]) -> Result<usize, Error> {
        let n = self.tick(out.len());
        self.inner.read(&mut out[..n])
    }

    fn available_write(&self) -> usize {
        self.inner.available_write()
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        let n = self.tick(buf.len());
        self.inner.write(&buf[..n])
    }
}

/// A stream that fails its next transfer with `fail_with`, if set, and is
/// otherwise transparent.
pub struct Faulty<S> {
    pub inner: S,
    pub fail_with: Option<Error>,
}

impl<S> Faulty<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            fail_with: None,
        }
    }
}

impl<S: Stream> Stream for Faulty<S> {
    fn available_read(&self) -> usize {
        self.inner.available_read()
    }

    fn read(&mut self, out: &mut [u8]) -> Result<usize, Error> {
        match self.fail_with.take() {
            Some(e) => Err(e),
            None => self.inner.read(out),
        }
    }

    fn available_write(&self) -> usize {
        self.inner.available_write()
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        match self.fail_with.take() {
            Some(e) => Err(e),
            None => self.inner.write(buf),
        }
    }
}
