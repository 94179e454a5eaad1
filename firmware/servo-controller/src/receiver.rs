use servo_protocol::{FrameBuffer, FrameError, ServoCommand};

/// Non-blocking access to the bytes of the current receive burst.
pub trait ByteSource {
    /// Next received byte, or `None` once the backlog is drained.
    fn read_byte(&mut self) -> Option<u8>;
}

/// Debug link that mirrors every received byte.
pub trait EchoSink {
    fn echo(&mut self, byte: u8);
}

/// Collects one burst from the command link and decodes it as a frame.
///
/// The frame buffer lives here and is touched by nothing else, so a frame
/// in progress cannot be reset from another context.
#[derive(Debug, Default)]
pub struct FrameReceiver {
    buffer: FrameBuffer,
}

impl FrameReceiver {
    pub fn new() -> Self {
        Self {
            buffer: FrameBuffer::new(),
        }
    }

    /// Drain the source, echoing every byte, then decode what was buffered.
    ///
    /// An overflowing burst is still drained to the end so its tail is not
    /// taken for the start of the next frame.
    pub fn receive<S, E>(&mut self, source: &mut S, echo: &mut E) -> Result<ServoCommand, FrameError>
    where
        S: ByteSource,
        E: EchoSink,
    {
        self.buffer.reset();
        let mut overflow = None;

        while let Some(byte) = source.read_byte() {
            echo.echo(byte);
            if let Err(e) = self.buffer.push(byte) {
                overflow = Some(e);
            }
        }

        if let Some(e) = overflow {
            self.buffer.reset();
            return Err(e);
        }
        self.buffer.take_frame()
    }
}
