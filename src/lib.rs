// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! `commstream` is a small byte-stream layer for communication endpoints,
//! such as serial links on resource-constrained devices.
//!
//! The crate is built around a single abstraction, the [`Stream`] trait,
//! which models a non-blocking byte pipe: reads and writes transfer as many
//! bytes as are currently possible, and a zero-length transfer means "try
//! again later". Code written against [`Stream`] does not care whether the
//! bytes live in an in-memory [`CircularBuffer`], a UART driver, or a socket.
//!
//! On top of that, two framing decorators turn an undifferentiated byte
//! stream into discrete messages:
//! - [`LineStream`], for `\n`-delimited text lines.
//! - [`PacketStream`], for packets carrying a one-byte length prefix.
//!
//! Both can read in *blocking* mode, retrying until a whole message has
//! arrived according to a [`Retry`] policy, or in *non-blocking* mode, where
//! each call makes as much progress as the input allows and resumes on the
//! next call.
//!
//! ```
//! use commstream::buffer::CircularBuffer;
//! use commstream::packet::{PacketConfig, PacketStream};
//! use commstream::ReadMode;
//!
//! let mut ring = CircularBuffer::new(64)?;
//! let mut packets = PacketStream::new(
//!     &mut ring,
//!     PacketConfig { mode: ReadMode::NonBlocking },
//! );
//!
//! packets.write_packet(b"ping")?;
//! assert_eq!(packets.read_packet()?, Some(&b"ping"[..]));
//! assert_eq!(packets.read_packet()?, None);
//! # Ok::<(), commstream::stream::Error>(())
//! ```
//!
//! [`Stream`]: stream/trait.Stream.html
//! [`CircularBuffer`]: buffer/struct.CircularBuffer.html
//! [`LineStream`]: line/struct.LineStream.html
//! [`PacketStream`]: packet/struct.PacketStream.html
//! [`Retry`]: retry/trait.Retry.html

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(missing_docs)]
#![deny(warnings)]
#![deny(unused)]
#![deny(unsafe_code)]

extern crate alloc;

#[macro_use]
mod debug;

#[macro_use]
pub mod stream;

pub mod buffer;
pub mod line;
pub mod packet;
pub mod retry;

#[cfg(test)]
mod test_util;

pub use stream::Error;
pub use stream::ReadMode;
pub use stream::Stream;
