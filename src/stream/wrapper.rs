// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! A pass-through stream decorator.

/// A [`Stream`] that forwards every operation to an inner stream.
///
/// `Wrapper` is the neutral element of stream decoration: on its own it
/// changes nothing, but it marks the point at which a stream has been handed
/// to some other layer. The framing layers in this crate follow the same
/// shape, forwarding the raw byte operations and adding their own message
/// operations on top.
///
/// A `Wrapper` does not need to own its inner stream; wrap a `&mut S` to keep
/// ownership with the caller.
///
/// [`Stream`]: trait.Stream.html
#[derive(Debug, Default)]
pub struct Wrapper<S> {
    inner: S,
}

impl<S> Wrapper<S> {
    /// Wraps `inner`.
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    /// Returns a reference to the wrapped stream.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Returns a mutable reference to the wrapped stream.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Unwraps this `Wrapper`, returning the inner stream.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

delegate_stream!(impl<S: crate::stream::Stream> for Wrapper<S>);
