use serde::Serialize;

/// Confidence thresholds used when reporting extraction quality
pub mod thresholds {
    /// Below this: extraction likely failed.
    pub const VERY_LOW: f32 = 0.30;

    /// Below this: significant uncertainty.
    pub const LOW: f32 = 0.50;

    /// Above this: high confidence.
    pub const HIGH: f32 = 0.85;

    /// Above this: very high confidence.
    pub const VERY_HIGH: f32 = 0.95;
}

/// Coarse quality bucket for a confidence score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBand {
    VeryLow,
    Low,
    Moderate,
    High,
    VeryHigh,
}

/// A backend confidence must be a finite number in [0, 1].
pub fn is_valid_confidence(confidence: f32) -> bool {
    confidence.is_finite() && (0.0..=1.0).contains(&confidence)
}

/// Classify a confidence score. Callers validate the range first.
pub fn band(confidence: f32) -> ConfidenceBand {
    if confidence >= thresholds::VERY_HIGH {
        ConfidenceBand::VeryHigh
    } else if confidence >= thresholds::HIGH {
        ConfidenceBand::High
    } else if confidence >= thresholds::LOW {
        ConfidenceBand::Moderate
    } else if confidence >= thresholds::VERY_LOW {
        ConfidenceBand::Low
    } else {
        ConfidenceBand::VeryLow
    }
}
