// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Newline-delimited text framing.
//!
//! A line on the wire is any sequence of bytes terminated by a single `\n`.
//! The terminator is never part of the line handed back to the caller. Lines
//! longer than the configured maximum are truncated: the excess bytes are
//! consumed from the stream and dropped, but the terminator is still found,
//! so the next line starts in the right place.

use alloc::vec::Vec;

#[cfg(feature = "arbitrary-derive")]
use libfuzzer_sys::arbitrary::{self, Arbitrary};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::retry;
use crate::retry::Retry;
use crate::retry::Spin;
use crate::stream::Error;
use crate::stream::ReadMode;
use crate::stream::Stream;

/// The largest line length a [`LineStream`] can be configured with.
///
/// [`LineStream`]: struct.LineStream.html
pub const MAX_LINE_LEN: usize = 65534;

/// Configuration for a [`LineStream`].
///
/// [`LineStream`]: struct.LineStream.html
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary-derive", derive(Arbitrary))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LineConfig {
    /// The number of bytes of each line that are kept; must be between 1 and
    /// [`MAX_LINE_LEN`], inclusive.
    ///
    /// [`MAX_LINE_LEN`]: constant.MAX_LINE_LEN.html
    pub max_len: usize,

    /// How [`LineStream::read_line()`] waits for input.
    ///
    /// [`LineStream::read_line()`]: struct.LineStream.html#method.read_line
    pub mode: ReadMode,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            max_len: 1023,
            mode: ReadMode::Blocking,
        }
    }
}

/// A [`Stream`] decorator that reads and writes lines of text.
///
/// Raw [`Stream`] operations on a `LineStream` go straight to the inner
/// stream, bypassing the framing.
///
/// ```
/// # use commstream::buffer::CircularBuffer;
/// # use commstream::line::{LineConfig, LineStream};
/// let mut ring = CircularBuffer::new(64)?;
/// let mut lines = LineStream::new(&mut ring, LineConfig::default())?;
///
/// lines.write_line("hello\nworld")?;
/// assert_eq!(lines.read_line()?, Some(&b"hello"[..]));
/// assert_eq!(lines.read_line_str()?, Some("world"));
/// # Ok::<(), commstream::Error>(())
/// ```
///
/// [`Stream`]: ../stream/trait.Stream.html
#[derive(Debug)]
pub struct LineStream<S, R = Spin> {
    inner: S,
    retry: R,
    mode: ReadMode,
    // Always exactly `max_len` bytes long.
    buf: Vec<u8>,
    // Bytes of the current line stored in `buf`.
    len: usize,
    // Bytes of the current line dropped for being past `max_len`.
    dropped: usize,
}

impl<S> LineStream<S> {
    /// Creates a new `LineStream` on top of `inner`, retrying with [`Spin`].
    ///
    /// Fails with [`Error::InvalidParameter`] if `config.max_len` is out of
    /// range, and with [`Error::OutOfMemory`] if the line buffer cannot be
    /// allocated.
    ///
    /// [`Spin`]: ../retry/struct.Spin.html
    /// [`Error::InvalidParameter`]: ../stream/enum.Error.html#variant.InvalidParameter
    /// [`Error::OutOfMemory`]: ../stream/enum.Error.html#variant.OutOfMemory
    pub fn new(inner: S, config: LineConfig) -> Result<Self, Error> {
        check!(
            config.max_len > 0 && config.max_len <= MAX_LINE_LEN,
            Error::InvalidParameter
        );

        let mut buf = Vec::new();
        if buf.try_reserve_exact(config.max_len).is_err() {
            return fail!(
                Error::OutOfMemory,
                "could not allocate a {}-byte line buffer",
                config.max_len,
            );
        }
        buf.resize(config.max_len, 0);

        Ok(Self {
            inner,
            retry: Spin,
            mode: config.mode,
            buf,
            len: 0,
            dropped: 0,
        })
    }
}

impl<S, R> LineStream<S, R> {
    /// Replaces the retry policy used by blocking operations.
    pub fn with_retry<R2: Retry>(self, retry: R2) -> LineStream<S, R2> {
        LineStream {
            inner: self.inner,
            retry,
            mode: self.mode,
            buf: self.buf,
            len: self.len,
            dropped: self.dropped,
        }
    }

    /// Returns the maximum number of bytes kept from each line.
    pub fn max_len(&self) -> usize {
        self.buf.len()
    }

    /// Returns the read mode this stream was created with.
    pub fn mode(&self) -> ReadMode {
        self.mode
    }

    /// Returns a reference to the inner stream.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Returns a mutable reference to the inner stream.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Discards any partially-received line and returns the inner stream.
    pub fn into_inner(self) -> S {
        self.inner
    }

    /// Appends `byte` to the current line, returning whether it completed
    /// the line.
    fn push(&mut self, byte: u8) -> bool {
        if byte == b'\n' {
            if self.dropped > 0 {
                warn!(
                    "line truncated to {} bytes; {} bytes dropped",
                    self.len, self.dropped,
                );
            }
            return true;
        }

        if self.len < self.buf.len() {
            self.buf[self.len] = byte;
            self.len += 1;
        } else {
            self.dropped += 1;
        }
        false
    }

    /// Forgets the current line, returning how many bytes of it were stored.
    fn reset(&mut self) -> usize {
        self.dropped = 0;
        core::mem::replace(&mut self.len, 0)
    }
}

impl<S: Stream, R: Retry> LineStream<S, R> {
    /// Writes `text` followed by a `\n` terminator.
    ///
    /// If `text` already ends in `\n`, no second terminator is added; an
    /// empty `text` writes just the terminator. Zero-length writes are
    /// retried with the retry policy until every byte has been accepted.
    /// The inner stream is flushed afterwards.
    pub fn write_line(&mut self, text: impl AsRef<[u8]>) -> Result<(), Error> {
        let text = text.as_ref();
        let inner = &mut self.inner;

        let mut last = None;
        for &byte in text {
            retry::until_progress(&mut self.retry, || inner.write(&[byte]))?;
            last = Some(byte);
        }
        if last != Some(b'\n') {
            retry::until_progress(&mut self.retry, || inner.write(b"\n"))?;
        }

        trace!("wrote {}-byte line", text.len());
        inner.flush()
    }

    /// Reads a line, without its `\n` terminator.
    ///
    /// In [`ReadMode::Blocking`], this keeps reading, consulting the retry
    /// policy whenever no byte is available, until a whole line has arrived.
    /// It never returns `Ok(None)`.
    ///
    /// In [`ReadMode::NonBlocking`], this consumes whatever input is
    /// currently available. If that does not complete a line, the partial
    /// line is kept, `Ok(None)` is returned, and a later call picks up where
    /// this one left off.
    ///
    /// In either mode, an error from the inner stream discards the partial
    /// line and is returned as-is.
    ///
    /// The returned slice borrows this stream's line buffer, and is valid
    /// until the next mutable call.
    ///
    /// [`ReadMode::Blocking`]: ../stream/enum.ReadMode.html#variant.Blocking
    /// [`ReadMode::NonBlocking`]: ../stream/enum.ReadMode.html#variant.NonBlocking
    pub fn read_line(&mut self) -> Result<Option<&[u8]>, Error> {
        match self.mode {
            ReadMode::Blocking => self.read_blocking().map(Some),
            ReadMode::NonBlocking => self.read_nonblocking(),
        }
    }

    /// Reads a line like [`read_line()`], and checks that it is UTF-8.
    ///
    /// A line that is not valid UTF-8 is consumed, and reported as
    /// [`Error::InvalidData`].
    ///
    /// [`read_line()`]: #method.read_line
    /// [`Error::InvalidData`]: ../stream/enum.Error.html#variant.InvalidData
    pub fn read_line_str(&mut self) -> Result<Option<&str>, Error> {
        let line = match self.read_line()? {
            Some(line) => line,
            None => return Ok(None),
        };
        match core::str::from_utf8(line) {
            Ok(line) => Ok(Some(line)),
            Err(_) => fail!(Error::InvalidData, "line is not valid UTF-8"),
        }
    }

    fn read_blocking(&mut self) -> Result<&[u8], Error> {
        self.reset();
        loop {
            let mut byte = [0];
            let inner = &mut self.inner;
            let result = retry::until_progress(&mut self.retry, || {
                inner.read(&mut byte)
            });
            if let Err(e) = result {
                self.reset();
                return Err(e);
            }

            if self.push(byte[0]) {
                let len = self.reset();
                return Ok(&self.buf[..len]);
            }
        }
    }

    fn read_nonblocking(&mut self) -> Result<Option<&[u8]>, Error> {
        while self.inner.available_read() > 0 {
            let mut byte = [0];
            match self.inner.read(&mut byte) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    trace!("discarding {}-byte partial line", self.len);
                    self.reset();
                    return Err(e);
                }
            }

            if self.push(byte[0]) {
                let len = self.reset();
                return Ok(Some(&self.buf[..len]));
            }
        }
        Ok(None)
    }
}

delegate_stream!(impl<S: crate::stream::Stream, R> for LineStream<S, R>);
