use log::{debug, error, info, warn};

use crate::{
    config::ClimateConfig,
    display::{self, format_value, GLYPHS},
    heat_index,
    hysteresis::HysteresisController,
    ports::{CharacterDisplay, ClimateSensor, Relay},
    types::{Actuator, ActivityCounter, ActuatorTransition, CycleReport, Reading},
};

pub struct Ports<S, D, R> {
    pub sensor: S,
    pub display: D,
    pub heater: R,
    pub humidifier: R,
}

#[derive(Debug, Clone)]
pub enum PollOutcome {
    Idle,
    Cycled(CycleReport),
    // The platform must restart; this loop should not be polled again.
    RestartRequired,
}

pub struct SamplingLoop<S, D, R> {
    config: ClimateConfig,
    ports: Ports<S, D, R>,

    heater: HysteresisController,
    humidifier: HysteresisController,

    reading: Option<Reading>,
    heat_index: Option<f64>,
    heat_cycles: ActivityCounter,
    last_update_ms: Option<u64>,
}

impl<S, D, R> SamplingLoop<S, D, R>
where
    S: ClimateSensor,
    D: CharacterDisplay,
    R: Relay,
{
    pub fn new(config: ClimateConfig, ports: Ports<S, D, R>) -> Self {
        Self {
            heater: HysteresisController::new(config.heater),
            humidifier: HysteresisController::new(config.humidifier),
            config,
            ports,
            reading: None,
            heat_index: None,
            heat_cycles: ActivityCounter::default(),
            last_update_ms: None,
        }
    }

    pub fn startup(&mut self) {
        let display = &mut self.ports.display;
        for (id, bitmap) in GLYPHS {
            if let Err(err) = display.register_glyph(id, &bitmap) {
                warn!("failed to register display glyph {id}: {err}");
            }
        }
        if let Err(err) = display.set_backlight(true) {
            warn!("failed to switch display backlight on: {err}");
        }
        if let Err(err) = display.clear() {
            warn!("failed to clear display: {err}");
        }

        set_relay(&mut self.ports.heater, Actuator::Heater, false);
        set_relay(&mut self.ports.humidifier, Actuator::Humidifier, false);
    }

    pub fn poll(&mut self, now_ms: u64) -> PollOutcome {
        if now_ms > self.config.runtime_ceiling_ms {
            error!(
                "uptime {}s exceeded safe runtime of {}s; restart required",
                now_ms / 1000,
                self.config.runtime_ceiling_ms / 1000
            );
            return PollOutcome::RestartRequired;
        }

        if !self.interval_elapsed(now_ms) {
            return PollOutcome::Idle;
        }

        PollOutcome::Cycled(self.run_cycle(now_ms))
    }

    pub fn ports(&self) -> &Ports<S, D, R> {
        &self.ports
    }

    pub fn into_ports(self) -> Ports<S, D, R> {
        self.ports
    }

    pub fn reading(&self) -> Option<Reading> {
        self.reading
    }

    pub fn heat_cycles(&self) -> ActivityCounter {
        self.heat_cycles
    }

    pub fn is_heater_active(&self) -> bool {
        self.heater.is_active()
    }

    pub fn is_humidifier_active(&self) -> bool {
        self.humidifier.is_active()
    }

    pub fn last_update_ms(&self) -> Option<u64> {
        self.last_update_ms
    }

    fn interval_elapsed(&self, now_ms: u64) -> bool {
        self.last_update_ms
            .map(|last| now_ms.saturating_sub(last) >= self.config.update_interval_ms)
            .unwrap_or(true)
    }

    fn run_cycle(&mut self, now_ms: u64) -> CycleReport {
        let sensor_ok = self.acquire_reading();
        self.heat_index = heat_index::for_reading(self.reading);
        self.heat_cycles.record_cycle(self.heater.is_active());
        self.log_reading(now_ms);

        let temperature = self.reading.map_or(f64::NAN, |r| r.temperature_c());
        let humidity = self.reading.map_or(f64::NAN, |r| r.humidity_pct());

        let mut transitions = Vec::new();
        transitions.extend(drive(
            Actuator::Heater,
            &mut self.heater,
            &mut self.ports.heater,
            temperature,
        ));
        transitions.extend(drive(
            Actuator::Humidifier,
            &mut self.humidifier,
            &mut self.ports.humidifier,
            humidity,
        ));

        self.render_display();
        self.last_update_ms = Some(now_ms);

        let report = CycleReport {
            uptime_ms: now_ms,
            reading: self.reading,
            sensor_ok,
            heat_index: self.heat_index,
            heater_on: self.heater.is_active(),
            humidifier_on: self.humidifier.is_active(),
            transitions,
            heat_cycles: self.heat_cycles.count(),
        };
        match serde_json::to_string(&report) {
            Ok(json) => debug!("cycle report: {json}"),
            Err(err) => warn!("cycle report serialization failed: {err}"),
        }
        report
    }

    // On failure the previous reading stays in place.
    fn acquire_reading(&mut self) -> bool {
        match self.ports.sensor.read() {
            Ok(reading) => {
                self.reading = Some(reading);
                true
            }
            Err(err) => {
                error!("Error reading temperature and humidity: {err}");
                false
            }
        }
    }

    fn log_reading(&self, now_ms: u64) {
        let secs = now_ms as f64 / 1000.0;
        let temperature = format_value(self.reading.map_or(f64::NAN, |r| r.temperature_c()));
        let humidity = format_value(self.reading.map_or(f64::NAN, |r| r.humidity_pct()));
        let heat_index = format_value(self.heat_index.unwrap_or(f64::NAN));

        info!("[{secs:.2}] Temperature\t{temperature}°C");
        info!("[{secs:.2}] Humidity   \t{humidity}%");
        info!("[{secs:.2}] Heat index \t{heat_index}°C");
    }

    fn render_display(&mut self) {
        let ops = display::render(
            self.reading,
            self.heater.is_active(),
            self.humidifier.is_active(),
            self.heat_cycles,
        );
        if let Err(err) = self.ports.display.apply(&ops) {
            warn!("display update failed: {err}");
        }
    }
}

fn drive<R: Relay>(
    actuator: Actuator,
    controller: &mut HysteresisController,
    relay: &mut R,
    value: f64,
) -> Option<ActuatorTransition> {
    let transition = controller.update(value);
    if !transition.transitioned {
        return None;
    }

    if transition.active {
        info!("{} active", actuator.as_str());
    } else {
        info!("{} not active", actuator.as_str());
    }
    set_relay(relay, actuator, transition.active);

    Some(ActuatorTransition {
        actuator,
        active: transition.active,
    })
}

fn set_relay<R: Relay>(relay: &mut R, actuator: Actuator, on: bool) {
    if let Err(err) = relay.set_state(on) {
        warn!("failed to switch {} relay: {err}", actuator.as_str());
    }
}
