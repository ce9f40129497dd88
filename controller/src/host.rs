use std::{
    pin::pin,
    time::{Duration, Instant},
};

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use climate_common::{
    config::{DISPLAY_COLUMNS, DISPLAY_ROWS},
    display, CharacterDisplay, ClimateConfig, ClimateSensor, DisplayError, DisplayOp,
    PollOutcome, Ports, Reading, Relay, RelayError, SamplingLoop, SensorError,
};

const POLL_PERIOD: Duration = Duration::from_secs(1);
const GLYPH_SLOTS: u8 = 8;

type HostLoop = SamplingLoop<SimulatedSensor, ConsoleDisplay, LoggingRelay>;

enum Exit {
    Shutdown,
    Restart,
}

pub async fn run() -> anyhow::Result<()> {
    // Also installs a `log` bridge, so records from climate-common show up here.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let speedup = env_u64("SIM_SPEEDUP").unwrap_or(1).max(1);
    let fail_every = env_u64("SIM_FAIL_EVERY").unwrap_or(0);

    let config = ClimateConfig::default();
    let config_json =
        serde_json::to_string(&config).context("failed to serialize controller config")?;
    info!("climate controller config: {config_json}");
    info!("simulation speedup x{speedup}, sensor failure every {fail_every} read(s)");

    let mut ports = Ports {
        sensor: SimulatedSensor::new(fail_every),
        display: ConsoleDisplay::default(),
        heater: LoggingRelay::new("heater"),
        humidifier: LoggingRelay::new("humidifier"),
    };
    let mut boots: u32 = 0;

    loop {
        boots = boots.saturating_add(1);
        let mut sampling = SamplingLoop::new(config, ports);
        sampling.startup();
        info!("control loop started (boot #{boots})");

        match drive(&mut sampling, SimClock::start(speedup)).await {
            Exit::Shutdown => {
                info!("shutdown requested; switching relays off");
                let mut ports = sampling.into_ports();
                park_relay(&mut ports.heater);
                park_relay(&mut ports.humidifier);
                return Ok(());
            }
            Exit::Restart => {
                warn!("restarting control loop with fresh state");
                ports = sampling.into_ports();
            }
        }
    }
}

async fn drive(sampling: &mut HostLoop, clock: SimClock) -> Exit {
    let mut interval = tokio::time::interval(POLL_PERIOD);
    let mut shutdown = pin!(tokio::signal::ctrl_c());

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = &mut shutdown => return Exit::Shutdown,
        }

        match sampling.poll(clock.now_ms()) {
            PollOutcome::Idle => {}
            PollOutcome::Cycled(_) => {
                for row in sampling.ports().display.rows() {
                    info!("lcd |{row}|");
                }
            }
            PollOutcome::RestartRequired => return Exit::Restart,
        }
    }
}

fn park_relay(relay: &mut LoggingRelay) {
    if let Err(err) = relay.set_state(false) {
        warn!("{err}");
    }
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
}

struct SimClock {
    start: Instant,
    speedup: u64,
}

impl SimClock {
    fn start(speedup: u64) -> Self {
        Self {
            start: Instant::now(),
            speedup,
        }
    }

    fn now_ms(&self) -> u64 {
        let elapsed: u64 = self
            .start
            .elapsed()
            .as_millis()
            .try_into()
            .unwrap_or(u64::MAX);
        elapsed.saturating_mul(self.speedup)
    }
}

struct SimulatedSensor {
    step: u64,
    fail_every: u64,
}

impl SimulatedSensor {
    fn new(fail_every: u64) -> Self {
        Self {
            step: 0,
            fail_every,
        }
    }
}

impl ClimateSensor for SimulatedSensor {
    fn read(&mut self) -> Result<Reading, SensorError> {
        self.step = self.step.wrapping_add(1);
        if self.fail_every > 0 && self.step % self.fail_every == 0 {
            return Err(SensorError::NoReading);
        }

        let phase = self.step as f64;
        let temperature = 21.5 + 1.5 * (phase / 4.0).sin();
        let humidity = 42.5 + 5.0 * (phase / 7.0).cos();
        Reading::new(temperature, humidity)
    }
}

#[derive(Default)]
struct ConsoleDisplay {
    frame: Vec<DisplayOp>,
}

impl ConsoleDisplay {
    fn rows(&self) -> [String; 2] {
        display::preview(&self.frame)
    }
}

impl CharacterDisplay for ConsoleDisplay {
    fn clear(&mut self) -> Result<(), DisplayError> {
        self.frame.clear();
        self.frame.push(DisplayOp::Clear);
        Ok(())
    }

    fn set_cursor(&mut self, col: u8, row: u8) -> Result<(), DisplayError> {
        if col >= DISPLAY_COLUMNS || row >= DISPLAY_ROWS {
            return Err(DisplayError::Cursor { col, row });
        }
        self.frame.push(DisplayOp::SetCursor { col, row });
        Ok(())
    }

    fn write_text(&mut self, text: &str) -> Result<(), DisplayError> {
        self.frame.push(DisplayOp::Text(text.to_string()));
        Ok(())
    }

    fn write_glyph(&mut self, id: u8) -> Result<(), DisplayError> {
        if id >= GLYPH_SLOTS {
            return Err(DisplayError::GlyphSlot(id));
        }
        self.frame.push(DisplayOp::Glyph(id));
        Ok(())
    }

    fn register_glyph(&mut self, id: u8, bitmap: &[u8; 8]) -> Result<(), DisplayError> {
        if id >= GLYPH_SLOTS {
            return Err(DisplayError::GlyphSlot(id));
        }
        info!("lcd glyph {id} registered: {bitmap:02X?}");
        Ok(())
    }

    fn set_backlight(&mut self, on: bool) -> Result<(), DisplayError> {
        info!("lcd backlight {}", if on { "on" } else { "off" });
        Ok(())
    }
}

struct LoggingRelay {
    name: &'static str,
    on: Option<bool>,
}

impl LoggingRelay {
    fn new(name: &'static str) -> Self {
        Self { name, on: None }
    }
}

impl Relay for LoggingRelay {
    fn set_state(&mut self, on: bool) -> Result<(), RelayError> {
        if self.on != Some(on) {
            info!("{} relay -> {}", self.name, if on { "ON" } else { "OFF" });
        }
        self.on = Some(on);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_sensor_injects_failures() {
        let mut sensor = SimulatedSensor::new(3);
        let outcomes: Vec<bool> = (0..6).map(|_| sensor.read().is_ok()).collect();

        assert_eq!(outcomes, vec![true, true, false, true, true, false]);
    }

    #[test]
    fn simulated_room_crosses_both_bands() {
        let mut sensor = SimulatedSensor::new(0);
        let readings: Vec<Reading> = (0..64).filter_map(|_| sensor.read().ok()).collect();

        assert!(readings.iter().any(|r| r.temperature_c() <= 21.0));
        assert!(readings.iter().any(|r| r.temperature_c() >= 22.0));
        assert!(readings.iter().any(|r| r.humidity_pct() <= 40.0));
        assert!(readings.iter().any(|r| r.humidity_pct() >= 45.0));
    }

    #[test]
    fn console_display_rejects_off_screen_cursor() {
        let mut display = ConsoleDisplay::default();

        assert_eq!(
            display.set_cursor(16, 0),
            Err(DisplayError::Cursor { col: 16, row: 0 })
        );
        assert_eq!(display.write_glyph(8), Err(DisplayError::GlyphSlot(8)));
        assert!(display.set_cursor(15, 1).is_ok());
    }

    #[test]
    fn console_display_keeps_only_latest_frame() {
        let mut display = ConsoleDisplay::default();
        display.write_text("stale").unwrap();
        display.clear().unwrap();
        display.write_text("fresh").unwrap();

        assert_eq!(display.rows()[0].trim_end(), "fresh");
    }

    #[test]
    fn sampling_loop_runs_against_host_ports() {
        let mut sampling = SamplingLoop::new(
            ClimateConfig::default(),
            Ports {
                sensor: SimulatedSensor::new(0),
                display: ConsoleDisplay::default(),
                heater: LoggingRelay::new("heater"),
                humidifier: LoggingRelay::new("humidifier"),
            },
        );
        sampling.startup();

        assert!(matches!(sampling.poll(0), PollOutcome::Cycled(_)));
        assert_eq!(sampling.ports().heater.on, Some(sampling.is_heater_active()));
        assert!(sampling.ports().display.rows()[1].starts_with("T "));
        assert!(matches!(
            sampling.poll(5_000_001),
            PollOutcome::RestartRequired
        ));
    }
}
