//! Reading one line at the interactive prompt.
//!
//! `BufRead::read_line` silently retries interrupted reads, which would sit
//! on a pending mode-change notification until the user completed a line.
//! This reader surfaces the interruption instead, so the loop can reprompt
//! with the notification first.

use std::io::{self, Read};

use crate::exec::was_interrupted;

pub(crate) enum ReadOutcome {
    Line(String),
    /// The user closed standard input.
    Eof,
    /// A signal arrived mid-read; partial input is discarded.
    Interrupted,
}

pub(crate) fn read_command(source: &mut impl Read) -> io::Result<ReadOutcome> {
    let mut line = Vec::new();
    let mut byte = [0u8; 1];

    loop {
        match source.read(&mut byte) {
            Ok(0) => {
                return Ok(if line.is_empty() {
                    ReadOutcome::Eof
                } else {
                    ReadOutcome::Line(String::from_utf8_lossy(&line).into_owned())
                });
            }
            Ok(_) => {
                if byte[0] == b'\n' {
                    return Ok(ReadOutcome::Line(String::from_utf8_lossy(&line).into_owned()));
                }
                line.push(byte[0]);
            }
            Err(err) if was_interrupted(&err) => return Ok(ReadOutcome::Interrupted),
            Err(err) => return Err(err),
        }
    }
}
