// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

#![no_main]

use libfuzzer_sys::fuzz_target;

use commstream::buffer::CircularBuffer;
use commstream::packet::PacketConfig;
use commstream::packet::PacketStream;
use commstream::packet::MAX_PAYLOAD_LEN;
use commstream::retry::SpinLimit;
use commstream::stream::StdWrite;
use commstream::ReadMode;
use commstream::Stream;

fuzz_target!(|input: (PacketConfig, u8, Vec<u8>)| {
    let (config, chunk, mut data) = input;
    let expected = data.clone();
    let mut decoded = Vec::new();

    match config.mode {
        ReadMode::Blocking => {
            // Everything is available up front; the first timeout marks the
            // end of the complete packets.
            let ring = CircularBuffer::with_storage(&mut data, false);
            let mut packets = PacketStream::new(ring, config)
                .with_retry(SpinLimit { max_attempts: 0 });
            while let Ok(Some(packet)) = packets.read_packet() {
                decoded.push(packet.to_vec());
            }
        }
        ReadMode::NonBlocking => {
            let chunk = chunk as usize % 64 + 1;
            let ring = CircularBuffer::new(MAX_PAYLOAD_LEN + 1 + 64).unwrap();
            let mut packets = PacketStream::new(ring, config);
            for bytes in data.chunks(chunk) {
                assert_eq!(packets.write(bytes), Ok(bytes.len()));
                while let Some(packet) = packets.read_packet().unwrap() {
                    decoded.push(packet.to_vec());
                }
            }
        }
    }

    let mut wire = Vec::new();
    let mut writer = PacketStream::new(StdWrite(&mut wire), config);
    for packet in &decoded {
        assert!(packet.len() <= MAX_PAYLOAD_LEN);
        writer.write_packet(packet).unwrap();
    }
    drop(writer);
    assert_eq!(&expected[..wire.len()], &wire[..]);
});
