mod checkpoint;
mod config;
mod receiver;
mod servo;
#[cfg(not(target_os = "espidf"))]
mod sim;
mod state;
#[cfg(target_os = "espidf")]
mod uart;

use config::ControllerConfig;
use servo::{PwmTiming, ServoPair};
use state::{ServoController, SharedPwmState};

use log::{error, info};
use servo_protocol::ServoPosition;

/// Committed PWM state, written only by the receive task.
static PWM_STATE: SharedPwmState = SharedPwmState::new();

#[cfg(target_os = "espidf")]
fn main() {
    use crate::checkpoint::PositionStore;
    use esp_idf_hal::gpio::AnyIOPin;
    use esp_idf_hal::ledc::{config::TimerConfig, LedcDriver, LedcTimerDriver, Resolution};
    use esp_idf_hal::peripherals::Peripherals;
    use esp_idf_hal::prelude::*;
    use esp_idf_hal::uart::{config::Config as UartConfig, UartDriver};
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use log::{debug, warn};
    use std::thread::{self, sleep};
    use crate::uart::{UartByteSource, UartEcho};

    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init().expect("Failed to init logger");

    info!("Servo Controller v{}", env!("CARGO_PKG_VERSION"));

    let config = ControllerConfig::default();
    let peripherals = Peripherals::take().expect("Failed to take peripherals");
    let nvs_partition = EspDefaultNvsPartition::take().expect("Failed to init NVS");

    // Restore the last committed position, centre on first boot
    let mut store = PositionStore::new(nvs_partition).expect("Failed to open checkpoint store");
    let initial = match store.load() {
        Ok(Some(position)) => {
            debug!("Restored checkpoint: {:?}", position);
            position
        }
        Ok(None) => ServoPosition::CENTER,
        Err(e) => {
            warn!("Could not read checkpoint: {:?}", e);
            ServoPosition::CENTER
        }
    };

    // Both servos share one 55 Hz LEDC timer
    let timer_config = TimerConfig::default()
        .frequency(config.pwm_frequency_hz.Hz().into())
        .resolution(Resolution::Bits14);
    let timer = LedcTimerDriver::new(peripherals.ledc.timer0, &timer_config)
        .expect("Failed to init LEDC timer");
    let lower = LedcDriver::new(peripherals.ledc.channel0, &timer, peripherals.pins.gpio6)
        .expect("Failed to init lower servo channel");
    let upper = LedcDriver::new(peripherals.ledc.channel1, &timer, peripherals.pins.gpio7)
        .expect("Failed to init upper servo channel");
    let timing = PwmTiming::new(lower.get_max_duty());

    let control = UartDriver::new(
        peripherals.uart1,
        peripherals.pins.gpio4,
        peripherals.pins.gpio5,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &UartConfig::default().baudrate(Hertz(config.control_baud)),
    )
    .expect("Failed to init command UART");
    let debug_link = UartDriver::new(
        peripherals.uart0,
        peripherals.pins.gpio16,
        peripherals.pins.gpio17,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &UartConfig::default().baudrate(Hertz(config.debug_baud)),
    )
    .expect("Failed to init debug UART");

    let mut controller = ServoController::new(ServoPair::new(lower, upper, timing), &PWM_STATE);
    if let Err(e) = controller.start(initial) {
        error!("Failed to set start position: {:?}", e);
    }

    let mut source = UartByteSource::new(control, config.frame_gap);
    let mut echo = UartEcho::new(debug_link);

    thread::scope(|s| {
        let receive_task = thread::Builder::new()
            .name("servo-rx".into())
            .stack_size(config.receive_stack_size)
            .spawn_scoped(s, move || -> Result<(), esp_idf_sys::EspError> {
                loop {
                    source.wait_for_burst()?;
                    controller.on_receive(&mut source, &mut echo)?;
                }
            })
            .expect("Failed to spawn receive task");

        info!("Servo controller running. Waiting for frames...");

        // Foreground loop: reads the committed state, never writes it
        let mut saved = initial;
        while !receive_task.is_finished() {
            sleep(config.checkpoint_interval);

            if let Some(state) = PWM_STATE.snapshot() {
                if state.position != saved {
                    match store.save(state.position) {
                        Ok(()) => saved = state.position,
                        Err(e) => warn!("Checkpoint save failed: {:?}", e),
                    }
                }
            }
        }

        match receive_task.join() {
            Ok(Err(e)) => error!("Receive task failed: {:?}", e),
            _ => error!("Receive task stopped"),
        }
    });

    // PWM outputs are no longer driven by valid frames
    esp_idf_hal::reset::restart();
}

/// Host build: each line on stdin is one receive burst.
#[cfg(not(target_os = "espidf"))]
fn main() {
    use sim::{BurstSource, SimOutput, StdoutEcho};
    use std::io::{self, BufRead};

    let config = ControllerConfig::default();
    let timing = PwmTiming::from_clock(config.host_pwm_clock_hz, config.pwm_frequency_hz);
    let servos = ServoPair::new(SimOutput::new(), SimOutput::new(), timing);
    let mut controller = ServoController::new(servos, &PWM_STATE);

    info!("Servo Controller v{} (host)", env!("CARGO_PKG_VERSION"));
    if let Err(e) = controller.start(ServoPosition::CENTER) {
        error!("Failed to set start position: {:?}", e);
        return;
    }

    let mut echo = StdoutEcho;
    for line in io::stdin().lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!("stdin: {}", e);
                break;
            }
        };
        let mut source = BurstSource::new(line.as_bytes());
        match controller.on_receive(&mut source, &mut echo) {
            Ok(Some(state)) => println!(
                " -> upper {} (duty {}), lower {} (duty {})",
                state.position.upper(),
                state.upper_duty,
                state.position.lower(),
                state.lower_duty
            ),
            Ok(None) => {
                let kept = PWM_STATE.snapshot().map(|s| s.position).unwrap_or_default();
                println!(" -> discarded, holding {:?}", kept);
            }
            Err(e) => {
                error!("PWM write failed: {:?}", e);
                break;
            }
        }
    }
}
