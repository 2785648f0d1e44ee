// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Splitting and normalizing newline-delimited text.

use std::path::PathBuf;

use commstream::buffer::CircularBuffer;
use commstream::line::LineConfig;
use commstream::line::LineStream;
use commstream::retry::SpinLimit;
use commstream::stream::StdWrite;
use commstream::Error;

/// Runs input through a line reader.
#[derive(structopt::StructOpt)]
pub enum Line {
    /// Splits input into lines, truncating each to the maximum length.
    ///
    /// By default, the lines are written back out, each with a single `\n`.
    #[structopt(name = "lines")]
    Lines {
        /// A JSON file containing a line stream configuration.
        #[structopt(long, parse(from_os_str))]
        config: Option<PathBuf>,

        /// The maximum line length; overrides the configuration file.
        #[structopt(long)]
        max_len: Option<usize>,

        /// Write lines as a JSON array of strings instead.
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

impl Line {
    pub fn run(self) {
        let Self::Lines {
            config,
            max_len,
            json,
            pretty,
            input,
            output,
        } = self;

        let mut config: LineConfig = match config {
            Some(path) => crate::util::load_json(path),
            None => LineConfig::default(),
        };
        if let Some(max_len) = max_len {
            config.max_len = max_len;
        }

        let (r, w) = crate::util::stdio(input, output);
        let mut data = crate::util::read_all(r);
        if data.last().map_or(false, |&b| b != b'\n') {
            data.push(b'\n');
        }

        // All input is already buffered, so running out of it is the end of
        // the stream rather than something to wait for.
        let ring = CircularBuffer::with_storage(&mut data, false);
        let mut reader = check!(
            LineStream::new(ring, config),
            "invalid line configuration {:?}",
            config,
        )
        .with_retry(SpinLimit { max_attempts: 0 });

        let mut lines = Vec::new();
        loop {
            match reader.read_line() {
                Ok(Some(line)) => lines.push(line.to_vec()),
                Ok(None) | Err(Error::Timeout) => break,
                Err(e) => {
                    eprintln!("error: failed to read line: {:?}", e);
                    std::process::exit(2)
                }
            }
        }

        if json {
            let lines = lines
                .iter()
                .map(|line| String::from_utf8_lossy(line))
                .collect::<Vec<_>>();
            let r = match pretty {
                true => serde_json::to_writer_pretty(w, &lines),
                false => serde_json::to_writer(w, &lines),
            };
            check!(r, "failed to serialize lines as JSON");
        } else {
            let mut writer = check!(
                LineStream::new(StdWrite(w), LineConfig::default()),
                "failed to create line writer",
            );
            for line in &lines {
                check!(writer.write_line(line), "failed to write line");
            }
        }
    }
}
