use std::{thread, time::Duration};

use anyhow::{anyhow, Context};
use dht_sensor::dht11;
use esp_idf_hal::{
    delay::Ets,
    gpio::{AnyIOPin, AnyOutputPin, IOPin, InputOutput, Output, OutputPin, PinDriver, Pull},
};
use esp_idf_svc::{hal::prelude::Peripherals, log::EspLogger};
use log::{info, warn};

use climate_common::{
    ClimateConfig, ClimateSensor, PollOutcome, Ports, Reading, Relay, RelayError, SamplingLoop,
    SensorError,
};

use crate::lcd::{Hd44780, LcdPins};

const DHT11_PIN: i32 = 16;
const HEATER_PIN: i32 = 25;
const HUMIDIFIER_PIN: i32 = 26;

const POLL_PERIOD: Duration = Duration::from_secs(1);
const WATCHDOG_TIMEOUT_SEC: u32 = 30;

struct Dht11Sensor {
    pin: PinDriver<'static, AnyIOPin, InputOutput>,
    delay: Ets,
}

impl Dht11Sensor {
    fn new(pin: AnyIOPin) -> anyhow::Result<Self> {
        let mut pin = PinDriver::input_output_od(pin)?;
        pin.set_pull(Pull::Up)?;
        pin.set_high()?;
        Ok(Self { pin, delay: Ets })
    }
}

impl ClimateSensor for Dht11Sensor {
    fn read(&mut self) -> Result<Reading, SensorError> {
        self.pin
            .set_high()
            .map_err(|err| SensorError::Driver(format!("failed to release DHT11 line: {err}")))?;

        match dht11::blocking::read(&mut self.delay, &mut self.pin) {
            Ok(sample) => Reading::new(
                f64::from(sample.temperature),
                f64::from(sample.relative_humidity),
            ),
            Err(err) => Err(SensorError::Driver(format!(
                "DHT11 read on GPIO{DHT11_PIN} failed: {err:?}"
            ))),
        }
    }
}

struct GpioRelay {
    name: &'static str,
    pin: PinDriver<'static, AnyOutputPin, Output>,
}

impl GpioRelay {
    fn new(name: &'static str, pin: AnyOutputPin) -> anyhow::Result<Self> {
        let mut pin = PinDriver::output(pin)?;
        pin.set_low()?;
        Ok(Self { name, pin })
    }
}

impl Relay for GpioRelay {
    fn set_state(&mut self, on: bool) -> Result<(), RelayError> {
        let result = if on {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        result.map_err(|err| RelayError {
            relay: self.name,
            reason: err.to_string(),
        })
    }
}

pub fn run() -> anyhow::Result<()> {
    esp_idf_svc::sys::link_patches();
    EspLogger::initialize_default();

    let Peripherals { pins, .. } = Peripherals::take()?;

    let sensor =
        Dht11Sensor::new(pins.gpio16.downgrade()).context("failed to initialize DHT11")?;
    let display = Hd44780::new(LcdPins {
        rs: pins.gpio19.downgrade_output(),
        enable: pins.gpio23.downgrade_output(),
        d4: pins.gpio18.downgrade_output(),
        d5: pins.gpio17.downgrade_output(),
        d6: pins.gpio21.downgrade_output(),
        d7: pins.gpio22.downgrade_output(),
        backlight: pins.gpio27.downgrade_output(),
    })
    .context("failed to initialize LCD")?;
    let heater = GpioRelay::new("heater", pins.gpio25.downgrade_output())
        .with_context(|| format!("failed to initialize heater relay on GPIO{HEATER_PIN}"))?;
    let humidifier = GpioRelay::new("humidifier", pins.gpio26.downgrade_output())
        .with_context(|| format!("failed to initialize humidifier relay on GPIO{HUMIDIFIER_PIN}"))?;

    let watchdog = TaskWatchdog::subscribe(WATCHDOG_TIMEOUT_SEC)?;

    let config = ClimateConfig::default();
    info!(
        "climate controller starting: update every {}s, restart after {}s",
        config.update_interval_ms / 1000,
        config.runtime_ceiling_ms / 1000
    );

    let mut sampling = SamplingLoop::new(
        config,
        Ports {
            sensor,
            display,
            heater,
            humidifier,
        },
    );
    sampling.startup();

    loop {
        watchdog.feed();

        match sampling.poll(uptime_ms()) {
            PollOutcome::Idle | PollOutcome::Cycled(_) => {}
            PollOutcome::RestartRequired => {
                warn!("safe runtime exceeded; restarting device");
                thread::sleep(Duration::from_millis(100));
                unsafe { esp_idf_svc::sys::esp_restart() };
            }
        }

        thread::sleep(POLL_PERIOD);
    }
}

fn uptime_ms() -> u64 {
    let micros = unsafe { esp_idf_svc::sys::esp_timer_get_time() };
    u64::try_from(micros / 1000).unwrap_or(0)
}

// Subscribes the control task to the task watchdog. A repeated init or add
// returns ESP_ERR_INVALID_STATE, which means the watchdog is already set up.
struct TaskWatchdog;

impl TaskWatchdog {
    fn subscribe(timeout_sec: u32) -> anyhow::Result<Self> {
        let config = esp_idf_svc::sys::esp_task_wdt_config_t {
            timeout_ms: timeout_sec.saturating_mul(1000),
            idle_core_mask: 0,
            trigger_panic: true,
        };
        check_wdt("configure", unsafe { esp_idf_svc::sys::esp_task_wdt_init(&config) })?;
        check_wdt("subscribe control task to", unsafe {
            esp_idf_svc::sys::esp_task_wdt_add(core::ptr::null_mut())
        })?;
        Ok(Self)
    }

    fn feed(&self) {
        let rc = unsafe { esp_idf_svc::sys::esp_task_wdt_reset() };
        if rc != esp_idf_svc::sys::ESP_OK {
            warn!("task watchdog reset failed with code {rc}");
        }
    }
}

fn check_wdt(action: &str, rc: esp_idf_svc::sys::esp_err_t) -> anyhow::Result<()> {
    match rc {
        esp_idf_svc::sys::ESP_OK | esp_idf_svc::sys::ESP_ERR_INVALID_STATE => Ok(()),
        _ => Err(anyhow!("failed to {action} task watchdog (code {rc})")),
    }
}
