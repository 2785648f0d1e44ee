// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

#![no_main]

use std::collections::VecDeque;

use libfuzzer_sys::fuzz_target;

use commstream::buffer::CircularBuffer;
use commstream::Stream;

// Checks the ring against a `VecDeque` over a sequence of transfers. Each op
// is `(is_write, len)`.
fuzz_target!(|input: (u8, Vec<(bool, u8)>)| {
    let (capacity, ops) = input;
    let capacity = capacity as usize;
    let mut ring = CircularBuffer::new(capacity).unwrap();
    let mut model = VecDeque::new();
    let mut counter = 0u8;

    for (is_write, len) in ops {
        let len = len as usize;
        if is_write {
            let bytes: Vec<u8> = (0..len)
                .map(|_| {
                    counter = counter.wrapping_add(1);
                    counter
                })
                .collect();
            let n = ring.write(&bytes).unwrap();
            assert_eq!(n, len.min(capacity - model.len()));
            model.extend(&bytes[..n]);
        } else {
            let mut out = vec![0; len];
            let n = ring.read(&mut out).unwrap();
            assert_eq!(n, len.min(model.len()));
            let expected: Vec<u8> = model.drain(..n).collect();
            assert_eq!(&out[..n], &expected[..]);
        }
        assert_eq!(ring.available_read(), model.len());
        assert_eq!(ring.available_write(), capacity - model.len());
    }
});
