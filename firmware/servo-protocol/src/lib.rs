#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod frame;

pub use frame::{parse_frame, FrameBuffer, FrameError, Malformed, FRAME_CAPACITY, FRAME_MARKER};

use minicbor::{Decode, Encode};

/// Lower servo (PD0 / PWM0) travel limits, in thousandths of the PWM period.
pub const LOWER_MIN: u16 = 26;
pub const LOWER_MAX: u16 = 141;

/// Upper servo (PD1 / PWM1) travel limits.
pub const UPPER_MIN: u16 = 35;
pub const UPPER_MAX: u16 = 150;

/// Power-up value for both channels.
pub const CENTER: u16 = 83;

/// The two servo outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Lower,
    Upper,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Lower, Channel::Upper];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Lower => "lower",
            Channel::Upper => "upper",
        }
    }

    pub fn min(&self) -> u16 {
        match self {
            Channel::Lower => LOWER_MIN,
            Channel::Upper => UPPER_MIN,
        }
    }

    pub fn max(&self) -> u16 {
        match self {
            Channel::Lower => LOWER_MAX,
            Channel::Upper => UPPER_MAX,
        }
    }
}

/// Clamp a raw field value into the channel's safe mechanical window.
pub fn clamp_angle(channel: Channel, value: u16) -> u16 {
    value.clamp(channel.min(), channel.max())
}

/// Raw field values decoded from one frame, before clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServoCommand {
    pub upper: u16,
    pub lower: u16,
}

impl ServoCommand {
    pub fn clamped(&self) -> ServoPosition {
        ServoPosition::new(self.upper, self.lower)
    }
}

/// A clamped pair of channel values. Also the NVS checkpoint record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct ServoPosition {
    #[n(0)]
    upper: u16,
    #[n(1)]
    lower: u16,
}

impl ServoPosition {
    pub const CENTER: ServoPosition = ServoPosition {
        upper: CENTER,
        lower: CENTER,
    };

    pub fn new(upper: u16, lower: u16) -> Self {
        Self {
            upper: clamp_angle(Channel::Upper, upper),
            lower: clamp_angle(Channel::Lower, lower),
        }
    }

    pub fn upper(&self) -> u16 {
        self.upper
    }

    pub fn lower(&self) -> u16 {
        self.lower
    }

    pub fn get(&self, channel: Channel) -> u16 {
        match channel {
            Channel::Lower => self.lower,
            Channel::Upper => self.upper,
        }
    }
}

impl Default for ServoPosition {
    fn default() -> Self {
        Self::CENTER
    }
}
