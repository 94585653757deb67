//! Small display helpers shared by the summary view.

use crate::types::MinuteSample;

/// 16-point compass, with N repeated so bearings just under 360° wrap back to N.
const CARDINAL_DIRECTIONS: [&str; 17] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW", "N",
];

/// Round to the nearest integer with halfway values going up, so `-2.5`
/// becomes `-2` and `2.5` becomes `3`.
pub fn js_round(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Round `temp` to a power-of-two fraction: `decimal_places` of 1 rounds to
/// halves, 2 to quarters, and so on.
pub fn round_temp(temp: f64, decimal_places: u32) -> f64 {
    let scalar = f64::from(1u32 << decimal_places.min(31));
    js_round(temp * scalar) / scalar
}

/// Convert a wind bearing in degrees into a 16-point compass label.
pub fn degree_to_cardinal(degree: f64) -> &'static str {
    let degree = if degree.is_finite() {
        degree.rem_euclid(360.0)
    } else {
        0.0
    };
    let index = ((degree + 11.25) / 22.5).trunc() as usize;
    CARDINAL_DIRECTIONS[index.min(CARDINAL_DIRECTIONS.len() - 1)]
}

/// True when any sample is more likely than `threshold` to see precipitation.
pub fn is_any_precipitation(samples: &[MinuteSample], threshold: f64) -> bool {
    samples.iter().any(|s| s.precip_probability > threshold)
}

/// Format a duration in seconds as `HH:MM`, clamped at zero.
pub fn hours_minutes(seconds: i64) -> String {
    let minutes = seconds.max(0) / 60;
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    fn sample(precip_probability: f64) -> MinuteSample {
        MinuteSample {
            time: None,
            precip_probability,
            precip_intensity: 0.0,
        }
    }

    #[test]
    fn test_round_temp_whole_degrees() {
        assert_eq!(round_temp(20.4, 0), 20.0);
        assert_eq!(round_temp(20.6, 0), 21.0);
        assert_eq!(round_temp(-3.5, 0), -3.0);
        assert_eq!(round_temp(-2.5, 0), -2.0);
        assert_eq!(round_temp(-2.6, 0), -3.0);
        assert_eq!(round_temp(2.5, 0), 3.0);
    }

    #[test]
    fn test_js_round_halves_go_up() {
        assert_eq!(js_round(0.5), 1.0);
        assert_eq!(js_round(-0.5), 0.0);
        assert_eq!(js_round(-1.5), -1.0);
        assert_eq!(js_round(-1.51), -2.0);
        assert_eq!(js_round(7.0), 7.0);
    }

    #[test]
    fn test_round_temp_scales_by_powers_of_two() {
        assert_eq!(round_temp(20.25, 1), 20.5);
        assert_eq!(round_temp(20.2, 1), 20.0);
        assert_eq!(round_temp(20.1, 2), 20.0);
        assert_eq!(round_temp(20.2, 2), 20.25);
        assert_eq!(round_temp(-20.25, 1), -20.0);
    }

    #[test]
    fn test_degree_to_cardinal() {
        assert_eq!(degree_to_cardinal(0.0), "N");
        assert_eq!(degree_to_cardinal(359.0), "N");
        assert_eq!(degree_to_cardinal(90.0), "E");
        assert_eq!(degree_to_cardinal(180.0), "S");
        assert_eq!(degree_to_cardinal(270.0), "W");
        assert_eq!(degree_to_cardinal(11.24), "N");
        assert_eq!(degree_to_cardinal(11.25), "NNE");
        assert_eq!(degree_to_cardinal(348.75), "N");
    }

    #[test]
    fn test_degree_to_cardinal_out_of_range() {
        assert_eq!(degree_to_cardinal(360.0), "N");
        assert_eq!(degree_to_cardinal(450.0), "E");
        assert_eq!(degree_to_cardinal(-90.0), "W");
        assert_eq!(degree_to_cardinal(f64::NAN), "N");
    }

    #[test]
    fn test_is_any_precipitation() {
        assert!(!is_any_precipitation(&[sample(0.05)], 0.1));
        assert!(is_any_precipitation(&[sample(0.05), sample(0.2)], 0.1));
        // Strictly greater than the threshold
        assert!(!is_any_precipitation(&[sample(0.1)], 0.1));
        assert!(!is_any_precipitation(&[], 0.1));
    }

    #[test]
    fn test_hours_minutes() {
        assert_eq!(hours_minutes(13 * 3600 + 25 * 60 + 59), "13:25");
        assert_eq!(hours_minutes(0), "00:00");
        assert_eq!(hours_minutes(-5), "00:00");
    }
}
