// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! `commstream-tool` is a simple command-line tool for framing and unframing
//! data with the `commstream` line and packet protocols.

#![deny(missing_docs)]
#![deny(warnings)]
#![deny(unused)]
#![deny(unsafe_code)]

use structopt::StructOpt as _;

#[macro_use]
mod util;

mod line;
mod packet;

/// A command-line tool for working with commstream framing.
#[allow(missing_docs)]
#[derive(structopt::StructOpt)]
#[structopt(author)]
enum CliCommand {
    #[structopt(flatten)]
    Packet(packet::Packet),
    #[structopt(flatten)]
    Line(line::Line),
}

fn main() {
    match CliCommand::from_args() {
        CliCommand::Packet(p) => p.run(),
        CliCommand::Line(l) => l.run(),
    }
}
