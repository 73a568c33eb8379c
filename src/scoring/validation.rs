use super::config::{DetectionConfig, ScoringConfig};
use super::factors::RangeOp;

/// Validate scoring configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_scoring(config: &ScoringConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if let Some(ref weights) = config.severity_weights {
        for (name, value) in [
            ("critical", weights.critical),
            ("high", weights.high),
            ("medium", weights.medium),
            ("low", weights.low),
        ] {
            if !value.is_finite() || value < 0.0 {
                errors.push(format!(
                    "scoring.severity_weights.{}: must be a non-negative number (got {})",
                    name, value
                ));
            }
        }
    }

    if let Some(ref bands) = config.recency {
        if bands.is_empty() {
            errors.push("scoring.recency: must contain at least one band".to_string());
        }
        for (i, band) in bands.iter().enumerate() {
            if let Err(e) = RangeOp::parse(&band.range) {
                errors.push(format!(
                    "scoring.recency[{}].range: invalid '{}' - {}",
                    i, band.range, e
                ));
            }
            if !(0.0..=1.0).contains(&band.multiplier) {
                errors.push(format!(
                    "scoring.recency[{}].multiplier: must be within 0.0-1.0 (got {})",
                    i, band.multiplier
                ));
            }
        }
    }

    if let Some(threshold) = config.trend_threshold {
        if !threshold.is_finite() || threshold < 0.0 {
            errors.push(format!(
                "scoring.trend_threshold: must be a non-negative number (got {})",
                threshold
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate detection configuration at startup.
pub fn validate_detection(config: &DetectionConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if let Some(ref bands) = config.late_work_order {
        if bands.is_empty() {
            errors.push("detection.late_work_order: must contain at least one band".to_string());
        }
        for (i, band) in bands.iter().enumerate() {
            if let Err(e) = RangeOp::parse(&band.range) {
                errors.push(format!(
                    "detection.late_work_order[{}].range: invalid '{}' - {}",
                    i, band.range, e
                ));
            }
            if !band.severity.is_known() {
                errors.push(format!(
                    "detection.late_work_order[{}].severity: unknown severity '{}'",
                    i, band.severity
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
