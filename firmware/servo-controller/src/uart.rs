use std::time::Duration;

use esp_idf_hal::delay::{TickType, BLOCK};
use esp_idf_hal::uart::UartDriver;
use esp_idf_sys::EspError;

use crate::receiver::{ByteSource, EchoSink};

/// Command link receiver.
///
/// A burst opens with a blocking read and closes once the link has been
/// idle for the frame gap, the same boundary the receive-timeout interrupt
/// gives.
pub struct UartByteSource<'d> {
    uart: UartDriver<'d>,
    gap_ticks: u32,
    pending: Option<u8>,
}

impl<'d> UartByteSource<'d> {
    pub fn new(uart: UartDriver<'d>, frame_gap: Duration) -> Self {
        // At least one tick, or a slow sender gets split mid-frame.
        let gap_ticks = TickType::from(frame_gap).ticks().max(1);
        Self {
            uart,
            gap_ticks,
            pending: None,
        }
    }

    /// Block until the first byte of the next burst arrives.
    pub fn wait_for_burst(&mut self) -> Result<(), EspError> {
        let mut byte = [0u8; 1];
        loop {
            if self.uart.read(&mut byte, BLOCK)? == 1 {
                self.pending = Some(byte[0]);
                return Ok(());
            }
        }
    }
}

impl ByteSource for UartByteSource<'_> {
    fn read_byte(&mut self) -> Option<u8> {
        if let Some(byte) = self.pending.take() {
            return Some(byte);
        }
        let mut byte = [0u8; 1];
        match self.uart.read(&mut byte, self.gap_ticks) {
            Ok(1) => Some(byte[0]),
            _ => None,
        }
    }
}

/// Debug link echo. Write failures are dropped.
pub struct UartEcho<'d> {
    uart: UartDriver<'d>,
}

impl<'d> UartEcho<'d> {
    pub fn new(uart: UartDriver<'d>) -> Self {
        Self { uart }
    }
}

impl EchoSink for UartEcho<'_> {
    fn echo(&mut self, byte: u8) {
        self.uart.write(&[byte]).ok();
    }
}
