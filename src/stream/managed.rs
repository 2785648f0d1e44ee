// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! User data and lifecycle hooks for arbitrary streams.
//!
//! Drivers frequently need to hang some context off a stream (a port number,
//! a statistics block, a handle to the interrupt controller) and to release
//! hardware resources when the stream goes away. [`Managed`] provides both
//! without every stream implementation having to carry them.
//!
//! [`Managed`]: struct.Managed.html

use alloc::boxed::Box;
use core::fmt;

use crate::stream::Error;

type Shutdown<S, D> = Box<dyn FnOnce(&mut S, &mut D)>;

/// A stream carrying user data `D` and an optional shutdown callback.
///
/// The callback is run exactly once, when the `Managed` is dropped, with
/// the stream and data still intact. All [`Stream`] operations are forwarded
/// to the inner stream.
///
/// ```
/// # use commstream::buffer::CircularBuffer;
/// # use commstream::stream::Managed;
/// let ring = CircularBuffer::new(16)?;
/// let port = Managed::new(ring, "uart0")
///     .on_shutdown(|_ring, name| println!("{} closed", name));
/// assert_eq!(*port.data(), "uart0");
/// # Ok::<(), commstream::stream::Error>(())
/// ```
///
/// [`Stream`]: trait.Stream.html
pub struct Managed<S, D = ()> {
    inner: S,
    data: D,
    on_shutdown: Option<Shutdown<S, D>>,
}

impl<S, D> Managed<S, D> {
    /// Attaches `data` to `inner`.
    pub fn new(inner: S, data: D) -> Self {
        Self {
            inner,
            data,
            on_shutdown: None,
        }
    }

    /// Attaches `data` to `inner`, then runs `init` on both.
    ///
    /// If `init` returns `false`, construction fails with
    /// [`Error::Unknown`]; the partially-built value is dropped without
    /// running any shutdown callback.
    ///
    /// [`Error::Unknown`]: enum.Error.html#variant.Unknown
    pub fn with_init(
        mut inner: S,
        mut data: D,
        init: impl FnOnce(&mut S, &mut D) -> bool,
    ) -> Result<Self, Error> {
        if !init(&mut inner, &mut data) {
            return fail!(Error::Unknown, "stream init callback failed");
        }
        Ok(Self::new(inner, data))
    }

    /// Registers `callback` to run when this value is dropped, replacing any
    /// previously registered callback.
    pub fn on_shutdown(
        mut self,
        callback: impl FnOnce(&mut S, &mut D) + 'static,
    ) -> Self {
        self.on_shutdown = Some(Box::new(callback));
        self
    }

    /// Returns the user data.
    pub fn data(&self) -> &D {
        &self.data
    }

    /// Returns the user data, mutably.
    pub fn data_mut(&mut self) -> &mut D {
        &mut self.data
    }

    /// Returns a reference to the managed stream.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Returns a mutable reference to the managed stream.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Unregisters the shutdown callback, if any, so that dropping this
    /// value runs nothing.
    pub fn cancel_shutdown(&mut self) {
        self.on_shutdown = None;
    }
}

impl<S, D> Drop for Managed<S, D> {
    fn drop(&mut self) {
        if let Some(callback) = self.on_shutdown.take() {
            trace!("running stream shutdown callback");
            callback(&mut self.inner, &mut self.data);
        }
    }
}

impl<S: fmt::Debug, D: fmt::Debug> fmt::Debug for Managed<S, D> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Managed")
            .field("inner", &self.inner)
            .field("data", &self.data)
            .field("on_shutdown", &self.on_shutdown.is_some())
            .finish()
    }
}

delegate_stream!(impl<S: crate::stream::Stream, D> for Managed<S, D>);
