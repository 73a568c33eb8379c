use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::breakdown::Breakdown;
use super::config::{RecencyBand, ScoringConfig, SeverityWeights, DEFAULT_RECENCY, DEFAULT_TREND_THRESHOLD};
use super::explain::explain;
use super::factors::{first_match, RangeOp};
use crate::error::InputError;
use crate::signals::types::{ExecutionSignal, Severity, SignalType};

/// Scores never exceed this value; contributions beyond it saturate.
pub const MAX_SCORE: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Stable,
    Deteriorating,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Improving => "improving",
            Trend::Stable => "stable",
            Trend::Deteriorating => "deteriorating",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreMetadata {
    pub total_signals: usize,
    pub critical_signals: usize,
    pub high_signals: usize,
}

/// Point-in-time risk snapshot for one site. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskScore {
    pub site_id: String,
    /// 0.0-100.0, rounded to 2 decimals
    pub score: f64,
    pub calculated_date: DateTime<Utc>,
    /// IDs of the active signals, in input order
    pub contributing_signals: Vec<String>,
    /// Uncapped contribution per signal type
    pub breakdown: Breakdown,
    pub trend: Trend,
    pub explanation: String,
    #[serde(default)]
    pub metadata: ScoreMetadata,
}

/// How a single active signal contributed to a score.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalContribution {
    pub signal_id: String,
    pub signal_type: SignalType,
    pub severity: Severity,
    pub weight: f64,    // severity weight
    pub confidence: f64, // after clamping to [0, 1]
    pub age_days: i64,
    pub recency: f64,   // recency multiplier
    pub value: f64,     // weight x confidence x recency
}

/// Deterministic aggregation of execution signals into a bounded site score.
#[derive(Debug, Clone)]
pub struct RiskScorer {
    weights: SeverityWeights,
    recency: Vec<(RangeOp, f64)>,
    trend_threshold: f64,
}

impl Default for RiskScorer {
    fn default() -> Self {
        Self {
            weights: SeverityWeights::default(),
            recency: DEFAULT_RECENCY.to_vec(),
            trend_threshold: DEFAULT_TREND_THRESHOLD,
        }
    }
}

fn compile_recency(bands: &[RecencyBand]) -> Result<Vec<(RangeOp, f64)>> {
    bands
        .iter()
        .map(|band| {
            RangeOp::parse(&band.range)
                .map(|range| (range, band.multiplier))
                .with_context(|| format!("invalid recency range '{}'", band.range))
        })
        .collect()
}

impl RiskScorer {
    pub fn from_config(config: &ScoringConfig) -> Result<Self> {
        let defaults = Self::default();
        let recency = match config.recency {
            Some(ref bands) => compile_recency(bands)?,
            None => defaults.recency,
        };
        Ok(Self {
            weights: config.severity_weights.unwrap_or(defaults.weights),
            recency,
            trend_threshold: config.trend_threshold.unwrap_or(defaults.trend_threshold),
        })
    }

    /// Decay factor for a signal `age_days` old. Negative ages count as 0;
    /// an age matching no band contributes nothing.
    pub fn recency_multiplier(&self, age_days: i64) -> f64 {
        let age = age_days.max(0) as u64;
        first_match(&self.recency, age).copied().unwrap_or(0.0)
    }

    pub fn severity_weight(&self, severity: &Severity) -> f64 {
        self.weights.weight(severity)
    }

    pub fn trend_threshold(&self) -> f64 {
        self.trend_threshold
    }

    /// Contribution of one signal at `now`. Resolution status is not consulted.
    pub fn contribution(&self, signal: &ExecutionSignal, now: DateTime<Utc>) -> SignalContribution {
        if !signal.severity.is_known() {
            debug!(signal_id = %signal.signal_id, severity = %signal.severity, "unknown severity, zero weight");
        }
        if !signal.signal_type.is_known() {
            debug!(signal_id = %signal.signal_id, signal_type = %signal.signal_type, "unknown signal type");
        }

        let weight = self.severity_weight(&signal.severity);
        let confidence = clamp_confidence(signal);
        let age_days = signal.age_days(now);
        let recency = self.recency_multiplier(age_days);

        SignalContribution {
            signal_id: signal.signal_id.clone(),
            signal_type: signal.signal_type.clone(),
            severity: signal.severity.clone(),
            weight,
            confidence,
            age_days,
            recency,
            value: weight * confidence * recency,
        }
    }

    /// Per-signal contributions of the active (unresolved) signals, in input order.
    pub fn contributions(
        &self,
        signals: &[ExecutionSignal],
        now: DateTime<Utc>,
    ) -> Vec<SignalContribution> {
        signals
            .iter()
            .filter(|s| !s.resolved)
            .map(|s| self.contribution(s, now))
            .collect()
    }

    /// Score a site from its full signal set.
    ///
    /// Resolved signals are ignored. The total is capped at [`MAX_SCORE`] and
    /// rounded to 2 decimals; breakdown entries are left uncapped.
    pub fn calculate_site_risk(
        &self,
        site_id: &str,
        signals: &[ExecutionSignal],
        previous_score: Option<&RiskScore>,
        now: DateTime<Utc>,
    ) -> RiskScore {
        let active: Vec<&ExecutionSignal> = signals.iter().filter(|s| !s.resolved).collect();

        let mut total = 0.0;
        let mut breakdown = Breakdown::default();
        for signal in &active {
            let contribution = self.contribution(signal, now);
            total += contribution.value;
            breakdown.add(&contribution.signal_type, contribution.value);
        }

        let score = round2(total.min(MAX_SCORE));
        let trend = trend_for(score, previous_score.map(|p| p.score), self.trend_threshold);
        let explanation = explain(score, &active, &breakdown);

        let metadata = ScoreMetadata {
            total_signals: active.len(),
            critical_signals: active.iter().filter(|s| s.severity == Severity::Critical).count(),
            high_signals: active.iter().filter(|s| s.severity == Severity::High).count(),
        };

        debug!(site_id, score, raw_total = total, trend = trend.as_str(), "scored site");

        RiskScore {
            site_id: site_id.to_string(),
            score,
            calculated_date: now,
            contributing_signals: active.iter().map(|s| s.signal_id.clone()).collect(),
            breakdown,
            trend,
            explanation,
            metadata,
        }
    }
}

/// Score a site with the built-in tables.
pub fn calculate_site_risk(
    site_id: &str,
    signals: &[ExecutionSignal],
    previous_score: Option<&RiskScore>,
    now: DateTime<Utc>,
) -> RiskScore {
    RiskScorer::default().calculate_site_risk(site_id, signals, previous_score, now)
}

/// Classify a score change. The threshold is exclusive: a change of exactly
/// `threshold` is still stable.
pub fn trend_for(current: f64, previous: Option<f64>, threshold: f64) -> Trend {
    match previous {
        None => Trend::Stable,
        Some(prev) => {
            // scores carry 2 decimals; compare the change at that precision
            let delta = round2(current - prev);
            if delta > threshold {
                Trend::Deteriorating
            } else if delta < -threshold {
                Trend::Improving
            } else {
                Trend::Stable
            }
        }
    }
}

/// Check a signal set before scoring: every record well-formed and owned by `site_id`.
pub fn check_signals(site_id: &str, signals: &[ExecutionSignal]) -> Result<(), InputError> {
    for signal in signals {
        signal.validate()?;
        if signal.site_id != site_id {
            return Err(InputError::SiteMismatch {
                kind: "signal",
                id: signal.signal_id.clone(),
                expected: site_id.to_string(),
                actual: signal.site_id.clone(),
            });
        }
    }
    Ok(())
}

fn clamp_confidence(signal: &ExecutionSignal) -> f64 {
    let raw = signal.confidence_score;
    if raw.is_nan() {
        warn!(signal_id = %signal.signal_id, "confidence_score is NaN, treating as 0.0");
        return 0.0;
    }
    if !(0.0..=1.0).contains(&raw) {
        let clamped = raw.clamp(0.0, 1.0);
        warn!(
            signal_id = %signal.signal_id,
            confidence_score = raw,
            clamped,
            "confidence_score outside [0, 1], clamping"
        );
        return clamped;
    }
    raw
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
