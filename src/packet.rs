// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Length-prefixed packet framing.
//!
//! A packet on the wire is a single length byte `L`, followed by exactly `L`
//! bytes of payload:
//!
//! ```text
//! +-----+---------------------+
//! |  L  |  payload (L bytes)  |
//! +-----+---------------------+
//! ```
//!
//! There is no checksum and no escaping; the framing relies entirely on the
//! two ends agreeing on where the first length byte is.

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

/// The largest payload a single packet can carry.
pub const MAX_PAYLOAD_LEN: usize = u8::MAX as usize;

/// Configuration for a [`PacketStream`].
///
/// [`PacketStream`]: struct.PacketStream.html
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary-derive", derive(Arbitrary))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PacketConfig {
    /// How [`PacketStream::read_packet()`] waits for input.
    ///
    /// [`PacketStream::read_packet()`]: struct.PacketStream.html#method.read_packet
    pub mode: ReadMode,
}

/// Progress of the packet currently being received.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum RxState {
    /// The next byte on the wire is a length header.
    AwaitingHeader,
    /// The header is in `buf[0]`, and `received` payload bytes have followed
    /// it.
    Payload { received: usize },
}

/// A [`Stream`] decorator that reads and writes length-prefixed packets.
///
/// Raw [`Stream`] operations on a `PacketStream` go straight to the inner
/// stream, bypassing the framing.
///
/// [`Stream`]: ../stream/trait.Stream.html
#[derive(Debug)]
pub struct PacketStream<S, R = Spin> {
    inner: S,
    retry: R,
    mode: ReadMode,
    // Header in byte 0, payload after it.
    buf: [u8; MAX_PAYLOAD_LEN + 1],
    state: RxState,
}

impl<S> PacketStream<S> {
    /// Creates a new `PacketStream` on top of `inner`, retrying with
    /// [`Spin`].
    ///
    /// [`Spin`]: ../retry/struct.Spin.html
    pub fn new(inner: S, config: PacketConfig) -> Self {
        Self {
            inner,
            retry: Spin,
            mode: config.mode,
            buf: [0; MAX_PAYLOAD_LEN + 1],
            state: RxState::AwaitingHeader,
        }
    }
}

impl<S, R> PacketStream<S, R> {
    /// Replaces the retry policy used by blocking operations.
    pub fn with_retry<R2: Retry>(self, retry: R2) -> PacketStream<S, R2> {
        PacketStream {
            inner: self.inner,
            retry,
            mode: self.mode,
            buf: self.buf,
            state: self.state,
        }
    }

    /// Returns the read mode this stream was created with.
    pub fn mode(&self) -> ReadMode {
        self.mode
    }

    /// Returns whether no packet is partially received.
    ///
    /// This is always true between calls in [`ReadMode::Blocking`].
    ///
    /// [`ReadMode::Blocking`]: ../stream/enum.ReadMode.html#variant.Blocking
    pub fn is_idle(&self) -> bool {
        self.state == RxState::AwaitingHeader
    }

    /// Returns a reference to the inner stream.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Returns a mutable reference to the inner stream.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Discards any partially-received packet and returns the inner stream.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: Stream, R: Retry> PacketStream<S, R> {
    /// Writes `payload` as a single packet.
    ///
    /// Zero-length writes are retried with the retry policy until the whole
    /// packet has been accepted; the inner stream is flushed afterwards.
    ///
    /// Fails with [`Error::InvalidParameter`] if `payload` is longer than
    /// [`MAX_PAYLOAD_LEN`], in which case nothing is written. Any failure of
    /// the inner stream to accept bytes is reported as [`Error::Io`].
    ///
    /// [`Error::InvalidParameter`]: ../stream/enum.Error.html#variant.InvalidParameter
    /// [`Error::Io`]: ../stream/enum.Error.html#variant.Io
    /// [`MAX_PAYLOAD_LEN`]: constant.MAX_PAYLOAD_LEN.html
    pub fn write_packet(&mut self, payload: &[u8]) -> Result<(), Error> {
        check!(payload.len() <= MAX_PAYLOAD_LEN, Error::InvalidParameter);

        let inner = &mut self.inner;
        let header = [payload.len() as u8];
        retry::until_progress(&mut self.retry, || {
            inner.write(&header).map_err(|_| Error::Io)
        })?;

        let mut sent = 0;
        while sent < payload.len() {
            let rest = &payload[sent..];
            let n = retry::until_progress(&mut self.retry, || {
                inner.write(rest).map_err(|_| Error::Io)
            })?;
            sent += n;
        }

        trace!("wrote {}-byte packet", payload.len());
        inner.flush()
    }

    /// Reads a packet, returning its payload.
    ///
    /// In [`ReadMode::Blocking`], this keeps reading, consulting the retry
    /// policy whenever no byte is available, until a whole packet has
    /// arrived. It never returns `Ok(None)`.
    ///
    /// In [`ReadMode::NonBlocking`], this consumes whatever input is
    /// currently available, but no more than the rest of the current packet.
    /// If that does not complete the packet, `Ok(None)` is returned and a
    /// later call resumes assembling it.
    ///
    /// In either mode, an error from the inner stream discards the partial
    /// packet and is returned as-is.
    ///
    /// The returned slice borrows this stream's packet buffer, and is valid
    /// until the next mutable call.
    ///
    /// [`ReadMode::Blocking`]: ../stream/enum.ReadMode.html#variant.Blocking
    /// [`ReadMode::NonBlocking`]: ../stream/enum.ReadMode.html#variant.NonBlocking
    pub fn read_packet(&mut self) -> Result<Option<&[u8]>, Error> {
        match self.mode {
            ReadMode::Blocking => self.read_blocking().map(Some),
            ReadMode::NonBlocking => self.read_nonblocking(),
        }
    }

    fn read_blocking(&mut self) -> Result<&[u8], Error> {
        self.state = RxState::AwaitingHeader;

        let inner = &mut self.inner;
        let buf = &mut self.buf;
        retry::until_progress(&mut self.retry, || inner.read(&mut buf[..1]))?;

        let len = buf[0] as usize;
        let mut received = 0;
        while received < len {
            let rest = &mut buf[1 + received..=len];
            let n =
                retry::until_progress(&mut self.retry, || inner.read(rest))?;
            received += n;
        }

        trace!("read {}-byte packet", len);
        Ok(&self.buf[1..=len])
    }

    fn read_nonblocking(&mut self) -> Result<Option<&[u8]>, Error> {
        loop {
            match self.state {
                RxState::AwaitingHeader => {
                    if self.inner.available_read() == 0 {
                        return Ok(None);
                    }
                    match self.inner.read(&mut self.buf[..1]) {
                        Ok(0) => return Ok(None),
                        Ok(_) => {
                            self.state = RxState::Payload { received: 0 };
                        }
                        Err(e) => return Err(e),
                    }
                }
                RxState::Payload { received } => {
                    let len = self.buf[0] as usize;
                    if received == len {
                        trace!("read {}-byte packet", len);
                        self.state = RxState::AwaitingHeader;
                        return Ok(Some(&self.buf[1..=len]));
                    }

                    let want =
                        (len - received).min(self.inner.available_read());
                    if want == 0 {
                        return Ok(None);
                    }
                    let rest = &mut self.buf[1 + received..1 + received + want];
                    match self.inner.read(rest) {
                        Ok(0) => return Ok(None),
                        Ok(n) => {
                            self.state = RxState::Payload {
                                received: received + n,
                            };
                        }
                        Err(e) => {
                            trace!(
                                "discarding packet after {} of {} bytes",
                                received,
                                len,
                            );
                            self.state = RxState::AwaitingHeader;
                            return Err(e);
                        }
                    }
                }
            }
        }
    }
}

delegate_stream!(impl<S: crate::stream::Stream, R> for PacketStream<S, R>);

#[cfg(test)]
mod test {
    use super::*;
    use crate::buffer::CircularBuffer;
    use crate::retry::SpinLimit;
    use crate::test_util::Faulty;
    use crate::test_util::Timeout;
    use crate::test_util::Trickle;
    use pretty_assertions::assert_eq;

    const NONBLOCKING: PacketConfig = PacketConfig {
        mode: ReadMode::NonBlocking,
    };

    fn payload(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 + 3) as u8).collect()
    }

    #[test]
    fn round_trip() {
        for &mode in &[ReadMode::Blocking, ReadMode::NonBlocking] {
            for &len in &[0, 1, 10, 254, 255] {
                let ring = CircularBuffer::new(512).unwrap();
                let mut packets =
                    PacketStream::new(ring, PacketConfig { mode });
                let data = payload(len);

                packets.write_packet(&data).unwrap();
                assert_eq!(packets.available_read(), len + 1);
                assert_eq!(packets.read_packet(), Ok(Some(&data[..])));
                assert!(packets.is_idle());
                assert_eq!(packets.available_read(), 0);
            }
        }
    }

    #[test]
    fn wire_format() {
        let mut ring = CircularBuffer::new(16).unwrap();
        let mut packets = PacketStream::new(&mut ring, PacketConfig::default());
        packets.write_packet(b"abc").unwrap();
        packets.write_packet(b"").unwrap();
        drop(packets);

        let mut out = [0; 16];
        let n = ring.read(&mut out).unwrap();
        assert_eq!(&out[..n], b"\x03abc\x00");
    }

    #[test]
    fn oversized() {
        let ring = CircularBuffer::new(512).unwrap();
        let mut packets = PacketStream::new(ring, PacketConfig::default());
        assert_eq!(
            packets.write_packet(&[0; MAX_PAYLOAD_LEN + 1]),
            Err(Error::InvalidParameter)
        );
        assert_eq!(packets.available_read(), 0);
    }

    #[test]
    fn byte_at_a_time() {
        let ring = CircularBuffer::new(64).unwrap();
        let mut packets = PacketStream::new(ring, NONBLOCKING);
        let first = payload(5);
        let second = payload(18);

        let mut wire = vec![5];
        wire.extend_from_slice(&first);
        wire.push(18);
        wire.extend_from_slice(&second);

        let mut received = Vec::new();
        for &byte in &wire {
            assert_eq!(packets.read_packet(), Ok(None));
            packets.write(&[byte]).unwrap();
            if let Some(packet) = packets.read_packet().unwrap() {
                received.push(packet.to_vec());
            }
        }
        assert_eq!(received, [first, second]);
        assert!(packets.is_idle());
    }

    #[test]
    fn partial_header_only() {
        let ring = CircularBuffer::new(8).unwrap();
        let mut packets = PacketStream::new(ring, NONBLOCKING);
        packets.write(&[3]).unwrap();
        assert_eq!(packets.read_packet(), Ok(None));
        assert!(!packets.is_idle());

        packets.write(b"xyz").unwrap();
        assert_eq!(packets.read_packet(), Ok(Some(&b"xyz"[..])));
    }

    #[test]
    fn empty_packet_without_more_input() {
        let ring = CircularBuffer::new(8).unwrap();
        let mut packets = PacketStream::new(ring, NONBLOCKING);
        packets.write(&[0]).unwrap();
        assert_eq!(packets.read_packet(), Ok(Some(&b""[..])));
        assert_eq!(packets.read_packet(), Ok(None));
    }

    #[test]
    fn error_resets_state() {
        let ring = CircularBuffer::new(16).unwrap();
        let mut packets = PacketStream::new(Faulty::new(ring), NONBLOCKING);

        packets.write(&[3, 1]).unwrap();
        assert_eq!(packets.read_packet(), Ok(None));
        assert!(!packets.is_idle());

        packets.write(&[2]).unwrap();
        packets.get_mut().fail_with = Some(Error::Io);
        assert_eq!(packets.read_packet(), Err(Error::Io));
        assert!(packets.is_idle());

        // The byte that was pending during the failure is now a header.
        packets.write(&[9]).unwrap();
        assert_eq!(packets.read_packet(), Ok(None));
        packets.write(&[8]).unwrap();
        assert_eq!(packets.read_packet(), Ok(Some(&[9, 8][..])));
    }

    #[test]
    fn write_failure_is_io() {
        let ring = CircularBuffer::new(16).unwrap();
        let mut packets =
            PacketStream::new(Faulty::new(ring), PacketConfig::default());
        packets.get_mut().fail_with = Some(Error::Closed);
        assert_eq!(packets.write_packet(b"abc"), Err(Error::Io));
    }

    #[test]
    fn blocking_timeout() {
        let ring = CircularBuffer::new(16).unwrap();
        let mut packets =
            PacketStream::new(Timeout(ring), PacketConfig::default());
        assert_eq!(packets.read_packet(), Err(Error::Timeout));

        packets.write(&[4, 1, 2]).unwrap();
        assert_eq!(packets.read_packet(), Err(Error::Timeout));
        assert!(packets.is_idle());
    }

    #[test]
    fn blocking_gives_up() {
        let ring = CircularBuffer::new(16).unwrap();
        let mut packets = PacketStream::new(ring, PacketConfig::default())
            .with_retry(SpinLimit { max_attempts: 5 });
        assert_eq!(packets.read_packet(), Err(Error::Timeout));

        packets.write(&[2, 0xaa]).unwrap();
        assert_eq!(packets.read_packet(), Err(Error::Timeout));
    }

    #[test]
    fn slow_stream() {
        for &mode in &[ReadMode::Blocking, ReadMode::NonBlocking] {
            let ring = CircularBuffer::new(64).unwrap();
            let mut packets =
                PacketStream::new(Trickle::new(ring), PacketConfig { mode })
                    .with_retry(SpinLimit { max_attempts: 1 });
            let data = payload(20);
            packets.write_packet(&data).unwrap();
            assert_eq!(packets.get_ref().inner.available_read(), 21);

            let mut received = None;
            for _ in 0..64 {
                if let Some(packet) = packets.read_packet().unwrap() {
                    received = Some(packet.to_vec());
                    break;
                }
            }
            assert_eq!(received, Some(data));
        }
    }

    #[cfg(feature = "serde")]
    #[test]
    fn config_serde() {
        let config: PacketConfig =
            serde_json::from_str(r#"{"mode": "non_blocking"}"#).unwrap();
        assert_eq!(config, NONBLOCKING);
        assert_eq!(
            serde_json::to_string(&PacketConfig::default()).unwrap(),
            r#"{"mode":"blocking"}"#
        );
    }
}
