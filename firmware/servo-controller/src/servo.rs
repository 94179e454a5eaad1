use core::fmt::Debug;

use servo_protocol::{Channel, ServoPosition};

/// Channel values are expressed in thousandths of the PWM period.
const DUTY_SCALE: u64 = 1000;

/// A PWM output whose duty register can be written directly.
pub trait DutyOutput {
    type Error: Debug;

    fn set_duty(&mut self, duty: u32) -> Result<(), Self::Error>;
}

/// PWM period in counter ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PwmTiming {
    period_ticks: u32,
}

impl PwmTiming {
    pub fn new(period_ticks: u32) -> Self {
        Self { period_ticks }
    }

    /// Period of a down-counting generator: `clock / frequency - 1`.
    pub fn from_clock(pwm_clock_hz: u32, pwm_frequency_hz: u32) -> Self {
        let period_ticks = (pwm_clock_hz / pwm_frequency_hz.max(1)).saturating_sub(1);
        Self { period_ticks }
    }

    pub fn period_ticks(&self) -> u32 {
        self.period_ticks
    }

    /// Duty count for a clamped channel value.
    pub fn duty_for(&self, value: u16) -> u32 {
        (u64::from(value) * u64::from(self.period_ticks) / DUTY_SCALE) as u32
    }
}

/// Duty counts last written to the hardware, with the position they encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PwmState {
    pub position: ServoPosition,
    pub upper_duty: u32,
    pub lower_duty: u32,
}

impl PwmState {
    pub fn duty(&self, channel: Channel) -> u32 {
        match channel {
            Channel::Lower => self.lower_duty,
            Channel::Upper => self.upper_duty,
        }
    }
}

/// Both servo outputs, written together from one position.
pub struct ServoPair<D> {
    lower: D,
    upper: D,
    timing: PwmTiming,
}

impl<D: DutyOutput> ServoPair<D> {
    pub fn new(lower: D, upper: D, timing: PwmTiming) -> Self {
        Self {
            lower,
            upper,
            timing,
        }
    }

    pub fn timing(&self) -> PwmTiming {
        self.timing
    }

    /// Compute both duty counts, then write lower (PWM0) and upper (PWM1).
    pub fn commit(&mut self, position: ServoPosition) -> Result<PwmState, D::Error> {
        let state = PwmState {
            position,
            upper_duty: self.timing.duty_for(position.upper()),
            lower_duty: self.timing.duty_for(position.lower()),
        };
        self.lower.set_duty(state.lower_duty)?;
        self.upper.set_duty(state.upper_duty)?;
        Ok(state)
    }

    pub fn outputs(&self) -> (&D, &D) {
        (&self.lower, &self.upper)
    }
}

#[cfg(target_os = "espidf")]
impl DutyOutput for esp_idf_hal::ledc::LedcDriver<'_> {
    type Error = esp_idf_sys::EspError;

    fn set_duty(&mut self, duty: u32) -> Result<(), Self::Error> {
        esp_idf_hal::ledc::LedcDriver::set_duty(self, duty)
    }
}
