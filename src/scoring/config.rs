use serde::{Deserialize, Serialize};

use super::factors::RangeOp;
use crate::signals::types::Severity;

/// Built-in recency decay: age in days to multiplier, first match wins.
pub const DEFAULT_RECENCY: [(RangeOp, f64); 4] = [
    (RangeOp::Between(0, 7), 1.0),
    (RangeOp::Between(8, 30), 0.7),
    (RangeOp::Between(31, 90), 0.4),
    (RangeOp::GreaterThan(90), 0.2),
];

/// Built-in lateness bands: days late to severity, first match wins.
pub const DEFAULT_LATENESS: [(RangeOp, Severity); 3] = [
    (RangeOp::GreaterEqual(7), Severity::High),
    (RangeOp::GreaterEqual(3), Severity::Medium),
    (RangeOp::GreaterEqual(0), Severity::Low),
];

/// Risk scoring configuration.
///
/// Every field is optional; anything left out falls back to the built-in
/// tables returned by `ScoringConfig::default()`.
///
/// Example YAML:
/// ```yaml
/// scoring:
///   severity_weights: { critical: 25.0, high: 15.0, medium: 8.0, low: 3.0 }
///   recency:
///     - { range: "0-7", multiplier: 1.0 }
///     - { range: "8-30", multiplier: 0.7 }
///     - { range: "31-90", multiplier: 0.4 }
///     - { range: ">90", multiplier: 0.2 }
///   trend_threshold: 5.0
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    /// Points contributed by a fresh, fully-confident signal of each severity
    #[serde(default)]
    pub severity_weights: Option<SeverityWeights>,

    /// Recency bands keyed by signal age in whole days. First match wins.
    #[serde(default)]
    pub recency: Option<Vec<RecencyBand>>,

    /// Score change beyond which a site is improving or deteriorating
    #[serde(default)]
    pub trend_threshold: Option<f64>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            severity_weights: Some(SeverityWeights::default()),
            recency: Some(default_recency_bands()),
            trend_threshold: Some(DEFAULT_TREND_THRESHOLD),
        }
    }
}

pub const DEFAULT_TREND_THRESHOLD: f64 = 5.0;

/// Severity weight table. Unknown severities always weigh 0.0.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SeverityWeights {
    pub critical: f64,
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl Default for SeverityWeights {
    fn default() -> Self {
        Self {
            critical: 25.0,
            high: 15.0,
            medium: 8.0,
            low: 3.0,
        }
    }
}

impl SeverityWeights {
    pub fn weight(&self, severity: &Severity) -> f64 {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
            Severity::Unknown(_) => 0.0,
        }
    }
}

/// Recency band: signals whose age falls in `range` are scaled by `multiplier`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RecencyBand {
    /// Range expression over age in days (e.g., "0-7", ">90")
    pub range: String,
    pub multiplier: f64,
}

pub fn default_recency_bands() -> Vec<RecencyBand> {
    DEFAULT_RECENCY
        .iter()
        .map(|(range, multiplier)| RecencyBand {
            range: range.to_string(),
            multiplier: *multiplier,
        })
        .collect()
}

/// Signal detection configuration.
///
/// Example YAML:
/// ```yaml
/// detection:
///   late_work_order:
///     - { range: ">=7", severity: high }
///     - { range: ">=3", severity: medium }
///     - { range: ">=0", severity: low }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DetectionConfig {
    /// Severity bands keyed by whole days past due. First match wins.
    #[serde(default)]
    pub late_work_order: Option<Vec<LatenessBand>>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            late_work_order: Some(default_lateness_bands()),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LatenessBand {
    /// Range expression over days late (e.g., ">=7")
    pub range: String,
    pub severity: Severity,
}

pub fn default_lateness_bands() -> Vec<LatenessBand> {
    DEFAULT_LATENESS
        .iter()
        .map(|(range, severity)| LatenessBand {
            range: range.to_string(),
            severity: severity.clone(),
        })
        .collect()
}
