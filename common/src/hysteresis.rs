use std::cmp::Ordering;

use serde::Serialize;

use crate::{
    config::{
        HEAT_OFF_THRESHOLD_C, HEAT_ON_THRESHOLD_C, HUMIDIFIER_OFF_THRESHOLD_PCT,
        HUMIDIFIER_ON_THRESHOLD_PCT,
    },
    error::ConfigError,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Thresholds {
    on: f64,
    off: f64,
}

impl Thresholds {
    pub const HEATER: Self = Self {
        on: HEAT_ON_THRESHOLD_C,
        off: HEAT_OFF_THRESHOLD_C,
    };

    pub const HUMIDIFIER: Self = Self {
        on: HUMIDIFIER_ON_THRESHOLD_PCT,
        off: HUMIDIFIER_OFF_THRESHOLD_PCT,
    };

    pub fn new(on: f64, off: f64) -> Result<Self, ConfigError> {
        // NaN on either side compares as None and is rejected too.
        if on.partial_cmp(&off) != Some(Ordering::Less) {
            return Err(ConfigError::InvertedThresholds { on, off });
        }
        Ok(Self { on, off })
    }

    pub fn on(&self) -> f64 {
        self.on
    }

    pub fn off(&self) -> f64 {
        self.off
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub active: bool,
    pub transitioned: bool,
}

#[derive(Debug, Clone)]
pub struct HysteresisController {
    thresholds: Thresholds,
    active: bool,
}

impl HysteresisController {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn update(&mut self, value: f64) -> Transition {
        if !value.is_finite() {
            return self.unchanged();
        }

        let switch = if self.active {
            value >= self.thresholds.off
        } else {
            value <= self.thresholds.on
        };

        if !switch {
            return self.unchanged();
        }

        self.active = !self.active;
        Transition {
            active: self.active,
            transitioned: true,
        }
    }

    fn unchanged(&self) -> Transition {
        Transition {
            active: self.active,
            transitioned: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn run(thresholds: Thresholds, values: &[f64]) -> Vec<bool> {
        let mut controller = HysteresisController::new(thresholds);
        values
            .iter()
            .map(|value| controller.update(*value).active)
            .collect()
    }

    #[test]
    fn heater_sequence_follows_band() {
        assert_eq!(
            run(Thresholds::HEATER, &[23.0, 21.5, 20.9, 21.5, 22.5]),
            vec![false, false, true, true, false]
        );
    }

    #[test]
    fn humidifier_sequence_follows_band() {
        assert_eq!(
            run(Thresholds::HUMIDIFIER, &[50.0, 42.0, 39.0, 41.0, 46.0]),
            vec![false, false, true, true, false]
        );
    }

    #[test]
    fn thresholds_are_inclusive() {
        let mut controller = HysteresisController::new(Thresholds::HEATER);

        let on = controller.update(21.0);
        assert!(on.active && on.transitioned);

        let off = controller.update(22.0);
        assert!(!off.active && off.transitioned);
    }

    #[test]
    fn dead_band_holds_either_state() {
        let mut controller = HysteresisController::new(Thresholds::HEATER);
        assert_eq!(
            controller.update(21.5),
            Transition {
                active: false,
                transitioned: false
            }
        );

        controller.update(20.0);
        assert_eq!(
            controller.update(21.5),
            Transition {
                active: true,
                transitioned: false
            }
        );
    }

    #[test]
    fn single_update_flips_at_most_once() {
        let mut controller = HysteresisController::new(Thresholds::HEATER);

        // Far below `on` while active does not toggle back off.
        controller.update(10.0);
        let again = controller.update(10.0);
        assert!(again.active);
        assert!(!again.transitioned);

        // Far above `off` while inactive does not toggle back on.
        controller.update(30.0);
        let again = controller.update(30.0);
        assert!(!again.active);
        assert!(!again.transitioned);
    }

    #[test]
    fn non_finite_input_never_transitions() {
        let mut controller = HysteresisController::new(Thresholds::HEATER);
        for value in [f64::NAN, f64::NEG_INFINITY, f64::INFINITY] {
            let transition = controller.update(value);
            assert!(!transition.active);
            assert!(!transition.transitioned);
        }

        controller.update(20.0);
        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let transition = controller.update(value);
            assert!(transition.active);
            assert!(!transition.transitioned);
        }
    }

    #[test]
    fn rejects_inverted_or_empty_band() {
        assert!(Thresholds::new(22.0, 21.0).is_err());
        assert!(Thresholds::new(21.0, 21.0).is_err());
        assert!(Thresholds::new(f64::NAN, 21.0).is_err());
        assert_eq!(Thresholds::new(21.0, 22.0), Ok(Thresholds::HEATER));
    }
}
