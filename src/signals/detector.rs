use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::debug;

use super::types::{Evidence, ExecutionSignal, Severity, SignalType, SourceType};
use crate::records::WorkOrder;
use crate::scoring::config::{DetectionConfig, LatenessBand, DEFAULT_LATENESS};
use crate::scoring::factors::{first_match, RangeOp};

/// Rule-based detector for overdue, incomplete work orders.
#[derive(Debug, Clone)]
pub struct LateWorkOrderDetector {
    bands: Vec<(RangeOp, Severity)>,
}

impl Default for LateWorkOrderDetector {
    fn default() -> Self {
        Self {
            bands: DEFAULT_LATENESS.to_vec(),
        }
    }
}

impl LateWorkOrderDetector {
    pub fn from_config(config: &DetectionConfig) -> Result<Self> {
        match config.late_work_order {
            Some(ref bands) => Self::from_bands(bands),
            None => Ok(Self::default()),
        }
    }

    fn from_bands(bands: &[LatenessBand]) -> Result<Self> {
        let bands = bands
            .iter()
            .map(|band| {
                RangeOp::parse(&band.range)
                    .map(|range| (range, band.severity.clone()))
                    .with_context(|| format!("invalid lateness range '{}'", band.range))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { bands })
    }

    /// Severity for a work order `days_late` whole days past due.
    /// Falls back to `low` when no band matches.
    pub fn severity_for(&self, days_late: u64) -> Severity {
        first_match(&self.bands, days_late)
            .cloned()
            .unwrap_or(Severity::Low)
    }

    /// Emit a `late_work_order` signal when the work order is incomplete and
    /// past due at `now`. Completed or not-yet-due work orders yield nothing.
    pub fn detect(&self, work_order: &WorkOrder, now: DateTime<Utc>) -> Option<ExecutionSignal> {
        if work_order.is_completed() || now <= work_order.due_date {
            return None;
        }

        let days_late = (now - work_order.due_date).num_days().max(0);
        let severity = self.severity_for(days_late as u64);
        debug!(
            work_order_id = %work_order.work_order_id,
            days_late,
            severity = %severity,
            "work order is late"
        );

        let mut evidence = Evidence::new();
        evidence.insert("work_order_id".to_string(), json!(work_order.work_order_id));
        evidence.insert("due_date".to_string(), json!(work_order.due_date.to_rfc3339()));
        evidence.insert("days_late".to_string(), json!(days_late));

        Some(ExecutionSignal {
            signal_id: format!("{}_late", work_order.work_order_id),
            site_id: work_order.site_id.clone(),
            signal_type: SignalType::LateWorkOrder,
            severity,
            detected_date: now,
            confidence_score: 1.0,
            evidence,
            explanation: format!(
                "Work order is {} days past due date without completion",
                days_late
            ),
            source_type: Some(SourceType::WorkOrder),
            source_id: Some(work_order.work_order_id.clone()),
            resolved: false,
            resolved_date: None,
        })
    }
}
