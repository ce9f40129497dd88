use serde::Serialize;

use crate::hysteresis::Thresholds;

pub const HEAT_ON_THRESHOLD_C: f64 = 21.0;
pub const HEAT_OFF_THRESHOLD_C: f64 = 22.0;

pub const HUMIDIFIER_ON_THRESHOLD_PCT: f64 = 40.0;
pub const HUMIDIFIER_OFF_THRESHOLD_PCT: f64 = 45.0;

pub const UPDATE_INTERVAL_MS: u64 = 300_000;

pub const RUNTIME_CEILING_MS: u64 = 5_000_000;

pub const DISPLAY_COLUMNS: u8 = 16;
pub const DISPLAY_ROWS: u8 = 2;

const _: () = assert!(HEAT_ON_THRESHOLD_C < HEAT_OFF_THRESHOLD_C);
const _: () = assert!(HUMIDIFIER_ON_THRESHOLD_PCT < HUMIDIFIER_OFF_THRESHOLD_PCT);

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClimateConfig {
    pub update_interval_ms: u64,
    pub runtime_ceiling_ms: u64,
    pub heater: Thresholds,
    pub humidifier: Thresholds,
}

impl Default for ClimateConfig {
    fn default() -> Self {
        Self {
            update_interval_ms: UPDATE_INTERVAL_MS,
            runtime_ceiling_ms: RUNTIME_CEILING_MS,
            heater: Thresholds::HEATER,
            humidifier: Thresholds::HUMIDIFIER,
        }
    }
}
