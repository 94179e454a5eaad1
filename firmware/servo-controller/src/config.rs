use std::time::Duration;

/// Controller configuration.
///
/// The command link must match the Bluetooth serial module (HC-05 default
/// 38400 8N1). The debug link carries the byte echo and the log output.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub control_baud: u32,
    pub debug_baud: u32,
    pub pwm_frequency_hz: u32,
    /// PWM counter clock used by the host build (40 MHz / 64).
    pub host_pwm_clock_hz: u32,
    /// Idle time on the command link that ends a frame.
    pub frame_gap: Duration,
    pub checkpoint_interval: Duration,
    pub receive_stack_size: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            control_baud: 38_400,
            debug_baud: 115_200,
            pwm_frequency_hz: 55,
            host_pwm_clock_hz: 625_000,
            frame_gap: Duration::from_millis(2),
            checkpoint_interval: Duration::from_millis(1000),
            receive_stack_size: 4096,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_links() {
        let config = ControllerConfig::default();
        assert_eq!(config.control_baud, 38_400);
        assert_eq!(config.debug_baud, 115_200);
        assert_eq!(config.pwm_frequency_hz, 55);
    }

    #[test]
    fn test_frame_gap_shorter_than_checkpoint() {
        let config = ControllerConfig::default();
        assert!(config.frame_gap < config.checkpoint_interval);
    }
}
