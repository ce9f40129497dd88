use crate::types::Reading;

const C1: f64 = -8.784_694_755_56;
const C2: f64 = 1.611_394_11;
const C3: f64 = 2.338_548_838_89;
const C4: f64 = -0.146_116_05;
const C5: f64 = -0.012_308_094;
const C6: f64 = -0.016_424_827_777_8;
const C7: f64 = 2.211_732e-3;
const C8: f64 = 7.2546e-4;
const C9: f64 = -3.582e-6;

// No range checks; non-finite inputs give a non-finite result.
pub fn estimate(temperature_c: f64, humidity_pct: f64) -> f64 {
    let t = temperature_c;
    let h = humidity_pct;

    C1 + C2 * t
        + C3 * h
        + C4 * t * h
        + C5 * t * t
        + C6 * h * h
        + C7 * t * t * h
        + C8 * t * h * h
        + C9 * t * t * h * h
}

pub fn for_reading(reading: Option<Reading>) -> Option<f64> {
    reading.map(|reading| estimate(reading.temperature_c(), reading.humidity_pct()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_reference_point() {
        let value = estimate(25.0, 50.0);
        assert!((value - 25.888_909_244_44).abs() < 1e-9, "got {value}");
    }

    #[test]
    fn hot_and_humid_feels_hotter() {
        let value = estimate(30.0, 70.0);
        assert!((value - 35.038_017_555_52).abs() < 1e-9, "got {value}");
        assert!(value > 30.0);
    }

    #[test]
    fn repeated_calls_are_identical() {
        for (t, h) in [(18.5, 33.0), (21.0, 40.0), (-5.0, 90.0), (40.0, 10.0)] {
            assert_eq!(estimate(t, h).to_bits(), estimate(t, h).to_bits());
        }
    }

    #[test]
    fn propagates_non_finite_input() {
        assert!(estimate(f64::NAN, 50.0).is_nan());
        assert!(!estimate(25.0, f64::INFINITY).is_finite());
    }

    #[test]
    fn invalid_reading_has_no_heat_index() {
        assert_eq!(for_reading(None), None);

        let reading = Reading::new(25.0, 50.0).unwrap();
        assert_eq!(for_reading(Some(reading)), Some(estimate(25.0, 50.0)));
    }
}
