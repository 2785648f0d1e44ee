// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Adapters from [`std::io`] into [`Stream`].
//!
//! These types are provided instead of implementing [`Stream`] directly for
//! every [`std::io::Read`] and [`std::io::Write`], due to trait coherence
//! issues involving the blanket impl on `&mut _`.
//!
//! [`Stream`]: trait.Stream.html

use std::io;
use std::io::ErrorKind;

use crate::stream::Error;
use crate::stream::Stream;

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            ErrorKind::UnexpectedEof
            | ErrorKind::BrokenPipe
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted => Self::Closed,
            ErrorKind::TimedOut => Self::Timeout,
            ErrorKind::InvalidData => Self::InvalidData,
            ErrorKind::InvalidInput => Self::InvalidParameter,
            ErrorKind::OutOfMemory => Self::OutOfMemory,
            _ => Self::Io,
        }
    }
}

/// Maps the result of a `std::io` transfer onto the [`Stream`] contract.
///
/// Interruptions and would-block conditions become zero-length transfers.
fn transfer(result: io::Result<usize>) -> Result<usize, Error> {
    match result {
        Ok(n) => Ok(n),
        Err(e)
            if matches!(
                e.kind(),
                ErrorKind::Interrupted | ErrorKind::WouldBlock
            ) =>
        {
            Ok(0)
        }
        Err(e) => {
            let error = Error::from(e);
            fail!(error, "std::io transfer failed: {:?}", error)
        }
    }
}

/// Converts a [`std::io::Write`] into a write-only [`Stream`].
///
/// [`Stream::available_write()`] reports `usize::MAX`, since a `std` writer
/// has no way to advertise how much it can take.
///
/// [`Stream`]: trait.Stream.html
/// [`Stream::available_write()`]: trait.Stream.html#method.available_write
#[derive(Debug)]
pub struct StdWrite<W>(pub W);

impl<W: io::Write> Stream for StdWrite<W> {
    fn available_write(&self) -> usize {
        usize::MAX
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        if buf.is_empty() {
            return Ok(0);
        }
        transfer(self.0.write(buf))
    }

    fn flush(&mut self) -> Result<(), Error> {
        self.0.flush().map_err(|e| {
            error!("std::io flush failed: {}", e);
            Error::from(e)
        })
    }
}

/// Converts a [`std::io::Read`] into a read-only [`Stream`].
///
/// `std` readers block rather than report "nothing yet", and have no notion
/// of how many bytes are pending, so [`Stream::available_read()`] always
/// reports zero. This adapter is therefore only useful with framing layers
/// in [`ReadMode::Blocking`]. End of input is reported as
/// [`Error::Closed`].
///
/// [`Stream`]: trait.Stream.html
/// [`Stream::available_read()`]: trait.Stream.html#method.available_read
/// [`ReadMode::Blocking`]: enum.ReadMode.html#variant.Blocking
/// [`Error::Closed`]: enum.Error.html#variant.Closed
#[derive(Debug)]
pub struct StdRead<R>(pub R);

impl<R: io::Read> Stream for StdRead<R> {
    fn read(&mut self, out: &mut [u8]) -> Result<usize, Error> {
        if out.is_empty() {
            return Ok(0);
        }
        match self.0.read(out) {
            Ok(0) => fail!(Error::Closed, "std::io reader hit end of input"),
            result => transfer(result),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::line::LineConfig;
    use crate::line::LineStream;
    use crate::packet::PacketConfig;
    use crate::packet::PacketStream;

    #[test]
    fn std_write() {
        let mut out = Vec::new();
        let mut packets =
            PacketStream::new(StdWrite(&mut out), PacketConfig::default());
        packets.write_packet(&[1, 2, 3]).unwrap();
        packets.write_packet(&[]).unwrap();
        drop(packets);
        assert_eq!(out, [3, 1, 2, 3, 0]);
    }

    #[test]
    fn std_read() {
        let input: &[u8] = b"first\nsecond\n";
        let mut lines =
            LineStream::new(StdRead(input), LineConfig::default()).unwrap();
        assert_eq!(lines.read_line().unwrap(), Some(&b"first"[..]));
        assert_eq!(lines.read_line().unwrap(), Some(&b"second"[..]));
        assert_eq!(lines.read_line(), Err(Error::Closed));
    }

    #[test]
    fn io_error_kinds() {
        let timeout = io::Error::new(ErrorKind::TimedOut, "slow");
        assert_eq!(Error::from(timeout), Error::Timeout);
        let other = io::Error::new(ErrorKind::Other, "boom");
        assert_eq!(Error::from(other), Error::Io);
        assert_eq!(
            transfer(Err(io::Error::new(ErrorKind::Interrupted, "signal"))),
            Ok(0)
        );
    }
}
