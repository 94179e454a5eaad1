//! Command frame buffering and decoding.
//!
//! A frame is `'S'+ digit+ <sep> digit+`: one or more marker bytes, the
//! upper channel field, exactly one non-digit separator, and the lower
//! channel field. Anything after the second field is ignored.

use core::fmt;

use heapless::Vec;

use crate::ServoCommand;

/// Maximum number of bytes buffered for a single frame.
pub const FRAME_CAPACITY: usize = 50;

/// Frame start marker.
pub const FRAME_MARKER: u8 = b'S';

/// Fields carry at most three decimal digits (0-999).
const MAX_FIELD_DIGITS: usize = 3;

/// Why a frame failed to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Malformed {
    MissingMarker,
    EmptyField,
    MissingSeparator,
    FieldTooLong,
}

impl Malformed {
    pub fn as_str(&self) -> &'static str {
        match self {
            Malformed::MissingMarker => "missing marker",
            Malformed::EmptyField => "empty field",
            Malformed::MissingSeparator => "missing separator",
            Malformed::FieldTooLong => "field too long",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// More than [`FRAME_CAPACITY`] bytes arrived before the frame boundary.
    FrameOverflow,
    MalformedFrame(Malformed),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::FrameOverflow => {
                write!(f, "frame exceeds {} bytes", FRAME_CAPACITY)
            }
            FrameError::MalformedFrame(reason) => {
                write!(f, "malformed frame: {}", reason.as_str())
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FrameError {}

impl From<Malformed> for FrameError {
    fn from(reason: Malformed) -> Self {
        FrameError::MalformedFrame(reason)
    }
}

/// Fixed-capacity storage for the bytes of the frame being received.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    bytes: Vec<u8, FRAME_CAPACITY>,
}

impl FrameBuffer {
    pub const fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Drop any buffered bytes ahead of a new frame.
    pub fn reset(&mut self) {
        self.bytes.clear();
    }

    /// Append a byte. Once the buffer is full, further bytes are dropped
    /// and every push reports [`FrameError::FrameOverflow`].
    pub fn push(&mut self, byte: u8) -> Result<(), FrameError> {
        self.bytes.push(byte).map_err(|_| FrameError::FrameOverflow)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Decode the buffered frame and clear the buffer.
    pub fn take_frame(&mut self) -> Result<ServoCommand, FrameError> {
        let result = parse_frame(&self.bytes);
        self.reset();
        result
    }
}

/// Decode a complete frame into its two raw field values.
pub fn parse_frame(frame: &[u8]) -> Result<ServoCommand, FrameError> {
    let markers = frame.iter().take_while(|&&b| b == FRAME_MARKER).count();
    if markers == 0 {
        return Err(Malformed::MissingMarker.into());
    }

    let (upper, rest) = read_field(&frame[markers..])?;
    // The field run is maximal, so the next byte (if any) is the separator.
    let rest = match rest.split_first() {
        Some((_separator, rest)) => rest,
        None => return Err(Malformed::MissingSeparator.into()),
    };
    let (lower, _trailing) = read_field(rest)?;

    Ok(ServoCommand { upper, lower })
}

/// Read a maximal run of decimal digits, most significant first.
fn read_field(input: &[u8]) -> Result<(u16, &[u8]), Malformed> {
    let digits = input.iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return Err(Malformed::EmptyField);
    }
    if digits > MAX_FIELD_DIGITS {
        return Err(Malformed::FieldTooLong);
    }

    let value = input[..digits]
        .iter()
        .fold(0u16, |acc, &b| acc * 10 + u16::from(b - b'0'));
    Ok((value, &input[digits..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;

    #[test]
    fn test_parse_center_frame() {
        let cmd = parse_frame(b"S83,83").unwrap();
        assert_eq!(cmd, ServoCommand { upper: 83, lower: 83 });
    }

    #[test]
    fn test_parse_leading_zeros() {
        let cmd = parse_frame(b"S083,083").unwrap();
        assert_eq!(cmd, ServoCommand { upper: 83, lower: 83 });

        let cmd = parse_frame(b"S007,000").unwrap();
        assert_eq!(cmd, ServoCommand { upper: 7, lower: 0 });
    }

    #[test]
    fn test_parse_every_field_value() {
        for value in 0..=999u16 {
            let text = format!("S{},{}", value, 999 - value);
            let cmd = parse_frame(text.as_bytes()).unwrap();
            assert_eq!(cmd.upper, value);
            assert_eq!(cmd.lower, 999 - value);
        }
    }

    #[test]
    fn test_parse_field_pairs() {
        for upper in (0..=999u16).step_by(37) {
            for lower in (0..=999u16).step_by(41) {
                let text = format!("S{},{}", upper, lower);
                assert_eq!(
                    parse_frame(text.as_bytes()),
                    Ok(ServoCommand { upper, lower })
                );
            }
        }
    }

    #[test]
    fn test_parse_skips_repeated_markers() {
        let cmd = parse_frame(b"SSS120,40").unwrap();
        assert_eq!(cmd, ServoCommand { upper: 120, lower: 40 });
    }

    #[test]
    fn test_parse_any_separator() {
        assert_eq!(parse_frame(b"S1 2").unwrap(), ServoCommand { upper: 1, lower: 2 });
        assert_eq!(parse_frame(b"S1S2").unwrap(), ServoCommand { upper: 1, lower: 2 });
    }

    #[test]
    fn test_parse_ignores_trailing_bytes() {
        let cmd = parse_frame(b"S90,100\r\n").unwrap();
        assert_eq!(cmd, ServoCommand { upper: 90, lower: 100 });

        let cmd = parse_frame(b"S90,100,7xyz").unwrap();
        assert_eq!(cmd, ServoCommand { upper: 90, lower: 100 });
    }

    #[test]
    fn test_parse_missing_marker() {
        assert_eq!(
            parse_frame(b"XYZ"),
            Err(FrameError::MalformedFrame(Malformed::MissingMarker))
        );
        assert_eq!(
            parse_frame(b"83,83"),
            Err(FrameError::MalformedFrame(Malformed::MissingMarker))
        );
        assert_eq!(
            parse_frame(b""),
            Err(FrameError::MalformedFrame(Malformed::MissingMarker))
        );
        // Marker has to open the frame
        assert_eq!(
            parse_frame(b" S83,83"),
            Err(FrameError::MalformedFrame(Malformed::MissingMarker))
        );
    }

    #[test]
    fn test_parse_missing_separator() {
        assert_eq!(
            parse_frame(b"S83"),
            Err(FrameError::MalformedFrame(Malformed::MissingSeparator))
        );
    }

    #[test]
    fn test_parse_empty_fields() {
        assert_eq!(
            parse_frame(b"S"),
            Err(FrameError::MalformedFrame(Malformed::EmptyField))
        );
        assert_eq!(
            parse_frame(b"S,83"),
            Err(FrameError::MalformedFrame(Malformed::EmptyField))
        );
        assert_eq!(
            parse_frame(b"S83,"),
            Err(FrameError::MalformedFrame(Malformed::EmptyField))
        );
        // Two separators leave the second run empty
        assert_eq!(
            parse_frame(b"S83,,83"),
            Err(FrameError::MalformedFrame(Malformed::EmptyField))
        );
    }

    #[test]
    fn test_parse_field_too_long() {
        assert_eq!(
            parse_frame(b"S1000,83"),
            Err(FrameError::MalformedFrame(Malformed::FieldTooLong))
        );
        assert_eq!(
            parse_frame(b"S83,0083"),
            Err(FrameError::MalformedFrame(Malformed::FieldTooLong))
        );
    }

    #[test]
    fn test_buffer_overflow_at_capacity() {
        let mut buf = FrameBuffer::new();
        for _ in 0..FRAME_CAPACITY {
            assert!(buf.push(b'S').is_ok());
        }
        assert_eq!(buf.len(), FRAME_CAPACITY);
        assert_eq!(buf.push(b'1'), Err(FrameError::FrameOverflow));
        assert_eq!(buf.push(b'2'), Err(FrameError::FrameOverflow));
        assert_eq!(buf.len(), FRAME_CAPACITY);
    }

    #[test]
    fn test_take_frame_clears_buffer() {
        let mut buf = FrameBuffer::new();
        for &b in b"S100,50" {
            buf.push(b).unwrap();
        }
        assert_eq!(buf.as_bytes(), b"S100,50");
        assert_eq!(buf.take_frame(), Ok(ServoCommand { upper: 100, lower: 50 }));
        assert!(buf.is_empty());

        buf.push(b'X').unwrap();
        assert!(buf.take_frame().is_err());
        assert!(buf.is_empty());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            format!("{}", FrameError::FrameOverflow),
            "frame exceeds 50 bytes"
        );
        assert_eq!(
            format!("{}", FrameError::MalformedFrame(Malformed::EmptyField)),
            "malformed frame: empty field"
        );
    }
}
