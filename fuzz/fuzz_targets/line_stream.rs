// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

#![no_main]

use libfuzzer_sys::fuzz_target;

use commstream::buffer::CircularBuffer;
use commstream::line::LineConfig;
use commstream::line::LineStream;
use commstream::line::MAX_LINE_LEN;
use commstream::retry::SpinLimit;
use commstream::ReadMode;
use commstream::Stream;

fuzz_target!(|input: (LineConfig, u8, Vec<u8>)| {
    let (mut config, chunk, mut data) = input;
    config.max_len = config.max_len % MAX_LINE_LEN + 1;
    let terminators = data.iter().filter(|&&b| b == b'\n').count();
    let mut lines = 0;

    match config.mode {
        ReadMode::Blocking => {
            let ring = CircularBuffer::with_storage(&mut data, false);
            let mut stream = LineStream::new(ring, config)
                .unwrap()
                .with_retry(SpinLimit { max_attempts: 0 });
            while let Ok(Some(line)) = stream.read_line() {
                assert!(line.len() <= config.max_len);
                assert!(!line.contains(&b'\n'));
                lines += 1;
            }
        }
        ReadMode::NonBlocking => {
            let chunk = chunk as usize % 64 + 1;
            let ring = CircularBuffer::new(64).unwrap();
            let mut stream = LineStream::new(ring, config).unwrap();
            for bytes in data.chunks(chunk) {
                assert_eq!(stream.write(bytes), Ok(bytes.len()));
                while let Some(line) = stream.read_line().unwrap() {
                    assert!(line.len() <= config.max_len);
                    assert!(!line.contains(&b'\n'));
                    lines += 1;
                }
            }
        }
    }

    assert_eq!(lines, terminators);
});
