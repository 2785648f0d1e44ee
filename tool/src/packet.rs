// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Framing and unframing of length-prefixed packets.

use std::io::Write as _;
use std::path::PathBuf;

use commstream::buffer::CircularBuffer;
use commstream::packet::PacketConfig;
use commstream::packet::PacketStream;
use commstream::packet::MAX_PAYLOAD_LEN;
use commstream::stream::StdWrite;
use commstream::ReadMode;

/// Converts between raw payloads and packet-framed byte streams.
#[derive(structopt::StructOpt)]
pub enum Packet {
    /// Frames input as a sequence of length-prefixed packets.
    ///
    /// Raw input is split into packets of maximum size.
    #[structopt(name = "pack")]
    Pack {
        /// Read payloads from a JSON array of byte arrays instead.
        #[structopt(long)]
        json: bool,

        /// Input file; defaults to stdin.
        #[structopt(short = "i", long, parse(from_os_str))]
        input: Option<PathBuf>,

        /// Output file; defaults to stdout.
        #[structopt(short = "o", long, parse(from_os_str))]
        output: Option<PathBuf>,
    },

    /// Decodes a sequence of length-prefixed packets.
    ///
    /// By default, the payloads are written out back-to-back.
    #[structopt(name = "unpack")]
    Unpack {
        /// Write payloads as a JSON array of byte arrays instead.
        #[structopt(long)]
        json: bool,

        /// Whether to pretty-print JSON output.
        #[structopt(long, requires = "json")]
        pretty: bool,

        /// Input file; defaults to stdin.
        #[structopt(short = "i", long, parse(from_os_str))]
        input: Option<PathBuf>,

        /// Output file; defaults to stdout.
        #[structopt(short = "o", long, parse(from_os_str))]
        output: Option<PathBuf>,
    },
}

impl Packet {
    pub fn run(self) {
        match self {
            Self::Pack {
                json,
                input,
                output,
            } => {
                let (r, w) = crate::util::stdio(input, output);
                let data = crate::util::read_all(r);

                let payloads: Vec<Vec<u8>> = if json {
                    check!(
                        serde_json::from_slice(&data),
                        "failed to parse payloads from JSON",
                    )
                } else {
                    data.chunks(MAX_PAYLOAD_LEN).map(<[u8]>::to_vec).collect()
                };

                let mut packets =
                    PacketStream::new(StdWrite(w), PacketConfig::default());
                for (i, payload) in payloads.iter().enumerate() {
                    check!(
                        packets.write_packet(payload),
                        "failed to write packet #{} ({} bytes)",
                        i,
                        payload.len(),
                    );
                }
            }
            Self::Unpack {
                json,
                pretty,
                input,
                output,
            } => {
                let (r, mut w) = crate::util::stdio(input, output);
                let mut data = crate::util::read_all(r);

                let ring = CircularBuffer::with_storage(&mut data, false);
                let mut packets = PacketStream::new(
                    ring,
                    PacketConfig {
                        mode: ReadMode::NonBlocking,
                    },
                );
                let mut payloads = Vec::new();
                while let Some(payload) =
                    check!(packets.read_packet(), "failed to read packet")
                {
                    payloads.push(payload.to_vec());
                }
                if !packets.is_idle() {
                    eprintln!("error: input ends in a truncated packet");
                    std::process::exit(2)
                }

                if json {
                    let r = match pretty {
                        true => serde_json::to_writer_pretty(w, &payloads),
                        false => serde_json::to_writer(w, &payloads),
                    };
                    check!(r, "failed to serialize payloads as JSON");
                } else {
                    for payload in &payloads {
                        check!(w.write_all(payload), "failed to write output");
                    }
                }
            }
        }
    }
}
