/// Highest band on the IELTS scale.
pub const MAX_BAND: f64 = 9.0;

/// Overall band ceiling applied when an essay is below the task's minimum length.
pub const PENALTY_BAND_CAP: f64 = 6.5;

/// Round to the nearest half band (ties round up, matching examiner convention).
pub fn round_to_half(score: f64) -> f64 {
    (score * 2.0).round() / 2.0
}

pub fn mean_band(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    let sum: f64 = scores.iter().sum();
    round_to_half(sum / scores.len() as f64)
}

pub fn in_range(score: f64) -> bool {
    score.is_finite() && (0.0..=MAX_BAND).contains(&score)
}

pub fn cap(score: f64, ceiling: f64) -> f64 {
    score.min(ceiling)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to_half() {
        assert_eq!(round_to_half(6.2), 6.0);
        assert_eq!(round_to_half(6.25), 6.5);
        assert_eq!(round_to_half(6.74), 6.5);
        assert_eq!(round_to_half(6.75), 7.0);
    }

    #[test]
    fn test_mean_band() {
        assert_eq!(mean_band(&[7.0, 6.5, 6.5, 6.0]), 6.5);
        assert_eq!(mean_band(&[7.0, 7.0, 6.5, 6.5]), 7.0);
        assert_eq!(mean_band(&[]), 0.0);
    }

    #[test]
    fn test_in_range() {
        assert!(in_range(0.0));
        assert!(in_range(9.0));
        assert!(!in_range(9.5));
        assert!(!in_range(-0.5));
        assert!(!in_range(f64::NAN));
    }

    #[test]
    fn test_cap() {
        assert_eq!(cap(7.5, PENALTY_BAND_CAP), 6.5);
        assert_eq!(cap(5.0, PENALTY_BAND_CAP), 5.0);
    }
}
