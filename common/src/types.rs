use serde::Serialize;

use crate::error::SensorError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reading {
    temperature_c: f64,
    humidity_pct: f64,
}

impl Reading {
    pub fn new(temperature_c: f64, humidity_pct: f64) -> Result<Self, SensorError> {
        if !temperature_c.is_finite() || !humidity_pct.is_finite() {
            return Err(SensorError::NonFinite {
                temperature: temperature_c,
                humidity: humidity_pct,
            });
        }
        Ok(Self {
            temperature_c,
            humidity_pct,
        })
    }

    pub fn temperature_c(&self) -> f64 {
        self.temperature_c
    }

    pub fn humidity_pct(&self) -> f64 {
        self.humidity_pct
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Actuator {
    Heater,
    Humidifier,
}

impl Actuator {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Heater => "Heat",
            Self::Humidifier => "Humidifier",
        }
    }
}

// Cycles that began with the heater on. Wraps to zero after 65535.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ActivityCounter(u16);

impl ActivityCounter {
    pub fn new(count: u16) -> Self {
        Self(count)
    }

    pub fn count(self) -> u16 {
        self.0
    }

    pub fn record_cycle(&mut self, heater_active: bool) {
        if heater_active {
            self.0 = self.0.wrapping_add(1);
        }
    }

    pub fn low_byte(self) -> u8 {
        (self.0 & 0xFF) as u8
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    #[serde(rename = "uptimeMs")]
    pub uptime_ms: u64,
    pub reading: Option<Reading>,
    #[serde(rename = "sensorOk")]
    pub sensor_ok: bool,
    #[serde(rename = "heatIndex")]
    pub heat_index: Option<f64>,
    #[serde(rename = "heaterOn")]
    pub heater_on: bool,
    #[serde(rename = "humidifierOn")]
    pub humidifier_on: bool,
    pub transitions: Vec<ActuatorTransition>,
    #[serde(rename = "heatCycles")]
    pub heat_cycles: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActuatorTransition {
    pub actuator: Actuator,
    pub active: bool,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn rejects_non_finite_samples() {
        assert!(Reading::new(f64::NAN, 40.0).is_err());
        assert!(Reading::new(21.0, f64::INFINITY).is_err());
        assert!(Reading::new(21.0, 40.0).is_ok());
    }

    #[test]
    fn counter_only_counts_heated_cycles() {
        let mut counter = ActivityCounter::default();
        for heater_active in [true, false, true, true, false] {
            counter.record_cycle(heater_active);
        }
        assert_eq!(counter.count(), 3);
    }

    #[test]
    fn counter_wraps_at_sixteen_bits() {
        let mut counter = ActivityCounter::new(u16::MAX);
        counter.record_cycle(true);
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn low_byte_is_count_mod_256() {
        assert_eq!(ActivityCounter::new(255).low_byte(), 0xFF);
        assert_eq!(ActivityCounter::new(256).low_byte(), 0x00);
        assert_eq!(ActivityCounter::new(0x1234).low_byte(), 0x34);
    }
}
