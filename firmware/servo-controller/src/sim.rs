//! In-memory peripherals for the host build and tests.

use std::io::{self, Write};

use crate::receiver::{ByteSource, EchoSink};
use crate::servo::DutyOutput;

/// One burst of received bytes; drained when the slice is exhausted.
pub struct BurstSource<'a> {
    bytes: core::slice::Iter<'a, u8>,
}

impl<'a> BurstSource<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes: bytes.iter(),
        }
    }
}

impl ByteSource for BurstSource<'_> {
    fn read_byte(&mut self) -> Option<u8> {
        self.bytes.next().copied()
    }
}

/// Echo sink that keeps every byte.
#[derive(Debug, Default)]
pub struct RecordingEcho {
    bytes: Vec<u8>,
}

impl RecordingEcho {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl EchoSink for RecordingEcho {
    fn echo(&mut self, byte: u8) {
        self.bytes.push(byte);
    }
}

/// Echo to the terminal.
pub struct StdoutEcho;

impl EchoSink for StdoutEcho {
    fn echo(&mut self, byte: u8) {
        io::stdout().write_all(&[byte]).ok();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteFailed;

/// PWM output that records duty writes.
#[derive(Debug, Default)]
pub struct SimOutput {
    writes: Vec<u32>,
    fail: bool,
}

impl SimOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// An output whose every write fails.
    pub fn failing() -> Self {
        Self {
            writes: Vec::new(),
            fail: true,
        }
    }

    pub fn writes(&self) -> &[u32] {
        &self.writes
    }

    pub fn duty(&self) -> Option<u32> {
        self.writes.last().copied()
    }
}

impl DutyOutput for SimOutput {
    type Error = WriteFailed;

    fn set_duty(&mut self, duty: u32) -> Result<(), Self::Error> {
        if self.fail {
            return Err(WriteFailed);
        }
        self.writes.push(duty);
        Ok(())
    }
}
