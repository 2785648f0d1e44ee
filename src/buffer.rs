// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! A fixed-capacity ring buffer that implements [`Stream`].
//!
//! [`CircularBuffer`] is the in-memory end of a stream: an interrupt handler
//! can `write()` received bytes into it while the main loop `read()`s them
//! out through a framing layer, or the other way around for transmission.
//!
//! The buffer tracks a read cursor and a write cursor. When the two are
//! equal, the buffer is either empty or full; which one is determined by
//! whether the last operation that moved a cursor was a read (empty) or a
//! write (full). This lets the buffer use every byte of its storage.
//!
//! [`Stream`]: ../stream/trait.Stream.html
//! [`CircularBuffer`]: struct.CircularBuffer.html

use alloc::vec::Vec;

use crate::stream::Error;
use crate::stream::Stream;

/// Backing memory for a [`CircularBuffer`].
///
/// [`CircularBuffer`]: struct.CircularBuffer.html
#[derive(Debug)]
pub enum Storage<'a> {
    /// No storage at all; the buffer has zero capacity.
    Detached,

    /// Heap storage owned, and eventually freed, by the buffer.
    Owned(Vec<u8>),

    /// Storage owned by someone else, lent to the buffer.
    Borrowed(&'a mut [u8]),
}

impl Default for Storage<'_> {
    fn default() -> Self {
        Self::Detached
    }
}

impl Storage<'_> {
    fn as_slice(&self) -> &[u8] {
        match self {
            Self::Detached => &[],
            Self::Owned(vec) => vec,
            Self::Borrowed(slice) => slice,
        }
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        match self {
            Self::Detached => &mut [],
            Self::Owned(vec) => vec,
            Self::Borrowed(slice) => slice,
        }
    }
}

/// A ring buffer of bytes.
///
/// See the [module documentation](index.html) for more information.
///
/// ```
/// # use commstream::buffer::CircularBuffer;
/// # use commstream::Stream;
/// let mut storage = [0; 4];
/// let mut ring = CircularBuffer::with_storage(&mut storage, true);
///
/// assert_eq!(ring.write(b"abcdef")?, 4);
/// assert_eq!(ring.available_write(), 0);
///
/// let mut out = [0; 3];
/// assert_eq!(ring.read(&mut out)?, 3);
/// assert_eq!(&out, b"abc");
/// assert_eq!(ring.write(b"gh")?, 2);
/// assert_eq!(ring.available_read(), 3);
/// # Ok::<(), commstream::Error>(())
/// ```
#[derive(Debug)]
pub struct CircularBuffer<'a> {
    storage: Storage<'a>,
    // Invariant: both cursors are < capacity, or 0 if capacity is 0.
    read: usize,
    write: usize,
    // Disambiguates `read == write`: empty if set, full otherwise.
    last_read: bool,
}

impl<'a> CircularBuffer<'a> {
    /// Creates a new, empty buffer that owns `capacity` bytes of heap
    /// storage.
    ///
    /// A zero `capacity` is allowed; such a buffer can be given storage
    /// later with [`set_storage()`].
    ///
    /// [`set_storage()`]: #method.set_storage
    pub fn new(capacity: usize) -> Result<Self, Error> {
        let storage = if capacity == 0 {
            Storage::Detached
        } else {
            let mut vec = Vec::new();
            if vec.try_reserve_exact(capacity).is_err() {
                return fail!(
                    Error::OutOfMemory,
                    "could not allocate {} bytes of ring storage",
                    capacity,
                );
            }
            vec.resize(capacity, 0);
            Storage::Owned(vec)
        };

        Ok(Self::from_storage(storage, true))
    }

    /// Creates a new buffer on top of caller-provided `storage`.
    ///
    /// If `empty` is false, the buffer starts out full: every byte already in
    /// `storage` is available to be read, starting at index zero.
    pub fn with_storage(storage: &'a mut [u8], empty: bool) -> Self {
        Self::from_storage(Storage::Borrowed(storage), empty)
    }

    fn from_storage(storage: Storage<'a>, empty: bool) -> Self {
        Self {
            storage,
            read: 0,
            write: 0,
            last_read: empty,
        }
    }

    /// Returns the total number of bytes this buffer can hold.
    pub fn capacity(&self) -> usize {
        self.storage.as_slice().len()
    }

    /// Returns whether this buffer's storage is lent to it by the caller.
    pub fn is_borrowed(&self) -> bool {
        matches!(self.storage, Storage::Borrowed(_))
    }

    /// Discards all buffered bytes without touching the storage itself.
    pub fn clear(&mut self) {
        self.read = 0;
        self.write = 0;
        self.last_read = true;
    }

    /// Replaces this buffer's storage, returning the previous one.
    ///
    /// Both cursors are reset to zero. If `empty` is false, the buffer is
    /// considered full, which allows attaching storage that already holds
    /// data to be read.
    ///
    /// Owned storage that is returned can simply be dropped to free it;
    /// borrowed storage is handed back to the caller untouched.
    pub fn set_storage(
        &mut self,
        storage: Storage<'a>,
        empty: bool,
    ) -> Storage<'a> {
        trace!(
            "ring storage replaced: {} -> {} bytes",
            self.capacity(),
            storage.as_slice().len(),
        );
        let old = core::mem::replace(&mut self.storage, storage);
        self.read = 0;
        self.write = 0;
        self.last_read = empty;
        old
    }

    /// Advances a cursor by `n` positions, wrapping around the end of the
    /// storage.
    fn advance(&self, cursor: usize, n: usize) -> usize {
        let next = cursor + n;
        if next >= self.capacity() {
            next - self.capacity()
        } else {
            next
        }
    }

    /// Consumes up to `len` bytes, copying them into `out` if present.
    fn take(&mut self, len: usize, out: Option<&mut [u8]>) -> usize {
        let n = len.min(self.available_read());
        if n == 0 {
            return 0;
        }

        // At most two contiguous runs: up to the end of storage, then from
        // the beginning.
        let first = n.min(self.capacity() - self.read);
        if let Some(out) = out {
            let storage = self.storage.as_slice();
            let read = self.read;
            out[..first].copy_from_slice(&storage[read..read + first]);
            out[first..n].copy_from_slice(&storage[..n - first]);
        }

        self.read = self.advance(self.read, n);
        self.last_read = true;
        n
    }
}

impl Stream for CircularBuffer<'_> {
    fn available_read(&self) -> usize {
        if self.write < self.read {
            self.capacity() - self.read + self.write
        } else if self.write > self.read {
            self.write - self.read
        } else if self.last_read {
            0
        } else {
            self.capacity()
        }
    }

    fn read(&mut self, out: &mut [u8]) -> Result<usize, Error> {
        Ok(self.take(out.len(), Some(out)))
    }

    fn skip(&mut self, len: usize) -> Result<usize, Error> {
        Ok(self.take(len, None))
    }

    fn available_write(&self) -> usize {
        self.capacity() - self.available_read()
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        let n = buf.len().min(self.available_write());
        if n == 0 {
            return Ok(0);
        }

        let write = self.write;
        let first = n.min(self.capacity() - write);
        let storage = self.storage.as_mut_slice();
        storage[write..write + first].copy_from_slice(&buf[..first]);
        storage[..n - first].copy_from_slice(&buf[first..n]);

        self.write = self.advance(write, n);
        self.last_read = false;
        Ok(n)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn owned_storage() {
        let mut ring = CircularBuffer::new(1).unwrap();
        assert!(!ring.is_borrowed());
        assert_eq!(ring.capacity(), 1);
        assert_eq!(ring.available_read(), 0);
        assert_eq!(ring.available_write(), 1);

        let old = ring.set_storage(Storage::Detached, true);
        assert!(matches!(old, Storage::Owned(ref v) if v.len() == 1));
        assert_eq!(ring.capacity(), 0);

        let mut storage = [0; 32];
        ring.set_storage(Storage::Borrowed(&mut storage), true);
        assert!(ring.is_borrowed());
        assert_eq!(ring.capacity(), 32);
    }

    #[test]
    fn zero_capacity() {
        let mut ring = CircularBuffer::new(0).unwrap();
        let mut buf = [0; 32];
        assert!(!ring.is_borrowed());
        assert_eq!(ring.capacity(), 0);
        assert_eq!(ring.available_read(), 0);
        assert_eq!(ring.available_write(), 0);
        assert_eq!(ring.read(&mut buf), Ok(0));
        assert_eq!(ring.write(&buf), Ok(0));
        assert_eq!(ring.skip(4), Ok(0));

        let mut storage = [0; 32];
        ring.set_storage(Storage::Detached, true);
        ring.set_storage(Storage::Borrowed(&mut storage), true);
        assert!(ring.is_borrowed());
        assert_eq!(ring.capacity(), 32);
    }

    #[test]
    fn prefilled_storage() {
        let mut storage = [0; 32];
        let mut buf = [0; 32];
        let mut ring = CircularBuffer::new(0).unwrap();

        ring.set_storage(Storage::Borrowed(&mut storage), true);
        assert_eq!(ring.available_read(), 0);
        assert_eq!(ring.available_write(), 32);
        assert_eq!(ring.read(&mut buf), Ok(0));
        assert_eq!(ring.write(b"hello"), Ok(5));

        let old = ring.set_storage(Storage::Detached, true);
        let storage = match old {
            Storage::Borrowed(s) => s,
            _ => panic!("expected borrowed storage back"),
        };
        assert_eq!(&storage[..5], b"hello");

        ring.set_storage(Storage::Borrowed(storage), false);
        assert_eq!(ring.available_read(), 32);
        assert_eq!(ring.available_write(), 0);
        assert_eq!(ring.write(b"hello"), Ok(0));
        assert_eq!(ring.read(&mut buf), Ok(32));
        assert_eq!(&buf[..5], b"hello");
    }

    #[test]
    fn read_write_wraparound() {
        let mut storage = [0; 15];
        let mut buf = [0; 32];
        {
            let mut ring = CircularBuffer::with_storage(&mut storage, true);
            assert_eq!(ring.capacity(), 15);
            assert_eq!(ring.available_read(), 0);
            assert_eq!(ring.available_write(), 15);

            assert_eq!(ring.write(b"Hello world!\0"), Ok(13));
            assert_eq!(ring.available_read(), 13);
            assert_eq!(ring.available_write(), 2);

            assert_eq!(ring.read(&mut buf[..5]), Ok(5));
            assert_eq!(&buf[..5], b"Hello");
            assert_eq!(ring.available_read(), 8);
            assert_eq!(ring.available_write(), 7);

            assert_eq!(ring.read(&mut buf[..8]), Ok(8));
            assert_eq!(&buf[..8], b" world!\0");
            assert_eq!(ring.available_read(), 0);
            assert_eq!(ring.available_write(), 15);

            // Overlapping.
            assert_eq!(ring.write(b"One more"), Ok(8));

            // No more room.
            assert_eq!(ring.write(b" time!!!\0"), Ok(7));
        }
        assert_eq!(&storage, b"e more time!!On");

        let mut ring = CircularBuffer::with_storage(&mut storage, false);
        // Re-attaching as full starts reading at index zero.
        assert_eq!(ring.read(&mut buf[..4]), Ok(4));
        assert_eq!(&buf[..4], b"e mo");
    }

    #[test]
    fn read_after_wrap() {
        let mut ring = CircularBuffer::new(15).unwrap();
        let mut buf = [0; 256];
        ring.write(b"Hello world!\0").unwrap();
        ring.skip(13).unwrap();

        assert_eq!(ring.write(b"One more"), Ok(8));
        assert_eq!(ring.write(b" time!!!\0"), Ok(7));
        assert_eq!(ring.read(&mut buf[..8]), Ok(8));
        assert_eq!(&buf[..8], b"One more");
        assert_eq!(ring.read(&mut buf), Ok(7));
        assert_eq!(&buf[..7], b" time!!");
    }

    #[test]
    fn full_and_empty() {
        for capacity in 1..=9 {
            let mut ring = CircularBuffer::new(capacity).unwrap();
            let mut buf = [0; 9];
            // Shift the cursors around so that every wraparound position is
            // exercised.
            for offset in 0..capacity {
                ring.clear();
                ring.write(&[0xaa; 9][..offset]).unwrap();
                ring.skip(offset).unwrap();

                for k in 0..=capacity {
                    let data: Vec<u8> = (0..k as u8).collect();
                    assert_eq!(ring.write(&data), Ok(k));
                    assert_eq!(ring.available_read(), k);
                    assert_eq!(ring.available_write(), capacity - k);

                    assert_eq!(ring.read(&mut buf[..k]), Ok(k));
                    assert_eq!(&buf[..k], &data[..]);
                    assert_eq!(ring.available_read(), 0);
                    assert_eq!(ring.available_write(), capacity);
                }
            }
        }
    }

    #[test]
    fn fifo_order() {
        let mut ring = CircularBuffer::new(7).unwrap();
        let input: Vec<u8> = (0..=255).collect();
        let mut output = Vec::new();

        let mut written = 0;
        let mut step = 1;
        while output.len() < input.len() {
            let end = (written + step).min(input.len());
            written += ring.write(&input[written..end]).unwrap();

            let mut chunk = [0; 5];
            let want = (step % 5) + 1;
            let n = ring.read(&mut chunk[..want]).unwrap();
            output.extend_from_slice(&chunk[..n]);
            step = step % 6 + 1;
        }
        assert_eq!(output, input);
    }

    #[test]
    fn clear_discards() {
        let mut ring = CircularBuffer::new(4).unwrap();
        ring.write(b"abcd").unwrap();
        assert_eq!(ring.available_read(), 4);
        ring.clear();
        assert_eq!(ring.available_read(), 0);
        assert_eq!(ring.available_write(), 4);
    }
}
