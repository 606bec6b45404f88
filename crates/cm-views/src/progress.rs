//! Progress bar color buckets

use serde::Serialize;

use crate::colors::ColorToken;

/// Bucket for a completion percentage.
///
/// `[0,30)` red, `[30,60)` yellow, `[60,90)` blue, `>= 90` green. Each
/// boundary belongs to the higher bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressBucket {
    Red,
    Yellow,
    Blue,
    Green,
}

impl ProgressBucket {
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 90.0 {
            ProgressBucket::Green
        } else if percentage >= 60.0 {
            ProgressBucket::Blue
        } else if percentage >= 30.0 {
            ProgressBucket::Yellow
        } else {
            // NaN lands here too
            ProgressBucket::Red
        }
    }

    pub fn color(&self) -> ColorToken {
        match self {
            ProgressBucket::Red => ColorToken::Red,
            ProgressBucket::Yellow => ColorToken::Yellow,
            ProgressBucket::Blue => ColorToken::Blue,
            ProgressBucket::Green => ColorToken::Green,
        }
    }
}

/// Percentage clamped to `0..=100` for bar widths; NaN becomes 0
pub fn bar_fill(percentage: f64) -> f64 {
    if percentage.is_nan() {
        0.0
    } else {
        percentage.clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(ProgressBucket::from_percentage(0.0), ProgressBucket::Red);
        assert_eq!(ProgressBucket::from_percentage(29.999), ProgressBucket::Red);
        assert_eq!(ProgressBucket::from_percentage(30.0), ProgressBucket::Yellow);
        assert_eq!(ProgressBucket::from_percentage(59.9), ProgressBucket::Yellow);
        assert_eq!(ProgressBucket::from_percentage(60.0), ProgressBucket::Blue);
        assert_eq!(ProgressBucket::from_percentage(89.9), ProgressBucket::Blue);
        assert_eq!(ProgressBucket::from_percentage(90.0), ProgressBucket::Green);
        assert_eq!(ProgressBucket::from_percentage(100.0), ProgressBucket::Green);
    }

    #[test]
    fn test_bucket_matches_thresholds_across_range() {
        for step in -20..=240 {
            let p = step as f64 * 0.5;
            let bucket = ProgressBucket::from_percentage(p);
            assert_eq!(bucket == ProgressBucket::Green, p >= 90.0, "p = {p}");
            assert_eq!(bucket == ProgressBucket::Blue, (60.0..90.0).contains(&p), "p = {p}");
            assert_eq!(bucket == ProgressBucket::Yellow, (30.0..60.0).contains(&p), "p = {p}");
            assert_eq!(bucket == ProgressBucket::Red, p < 30.0, "p = {p}");
        }
    }

    #[test]
    fn test_out_of_range_values() {
        assert_eq!(ProgressBucket::from_percentage(-5.0), ProgressBucket::Red);
        assert_eq!(ProgressBucket::from_percentage(f64::NAN), ProgressBucket::Red);
        assert_eq!(ProgressBucket::from_percentage(140.0), ProgressBucket::Green);
        assert_eq!(bar_fill(140.0), 100.0);
        assert_eq!(bar_fill(f64::NAN), 0.0);
    }
}
