use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{require, InputError};

/// Free-form supporting data carried through for audit. Never interpreted by scoring.
pub type Evidence = serde_json::Map<String, serde_json::Value>;

/// Four-level ordinal classification of a signal's operational impact.
///
/// Values outside the known set are kept verbatim in `Unknown` so a single
/// malformed record never aborts a scoring run; they carry zero weight.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
    Unknown(String),
}

impl Severity {
    /// Known severities from most to least severe.
    pub const DESCENDING: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
            Severity::Unknown(raw) => raw,
        }
    }

    /// Position in the risk ordering; unknown values sort below `low`.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Unknown(_) => 0,
            Severity::Low => 1,
            Severity::Medium => 2,
            Severity::High => 3,
            Severity::Critical => 4,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Severity::Unknown(_))
    }
}

impl From<String> for Severity {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Severity::Low,
            "medium" => Severity::Medium,
            "high" => Severity::High,
            "critical" => Severity::Critical,
            _ => Severity::Unknown(value),
        }
    }
}

impl From<&str> for Severity {
    fn from(value: &str) -> Self {
        Severity::from(value.to_string())
    }
}

impl From<Severity> for String {
    fn from(value: Severity) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of execution failure a signal describes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SignalType {
    MissedInspection,
    LateWorkOrder,
    IncompleteTask,
    DocGap,
    SlaBreach,
    SafetyIssue,
    Unknown(String),
}

impl SignalType {
    pub fn as_str(&self) -> &str {
        match self {
            SignalType::MissedInspection => "missed_inspection",
            SignalType::LateWorkOrder => "late_work_order",
            SignalType::IncompleteTask => "incomplete_task",
            SignalType::DocGap => "doc_gap",
            SignalType::SlaBreach => "sla_breach",
            SignalType::SafetyIssue => "safety_issue",
            SignalType::Unknown(raw) => raw,
        }
    }

    /// Human-readable name, e.g. "late work order"
    pub fn label(&self) -> String {
        self.as_str().replace('_', " ")
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, SignalType::Unknown(_))
    }
}

impl From<String> for SignalType {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "missed_inspection" => SignalType::MissedInspection,
            "late_work_order" => SignalType::LateWorkOrder,
            "incomplete_task" => SignalType::IncompleteTask,
            "doc_gap" => SignalType::DocGap,
            "sla_breach" => SignalType::SlaBreach,
            "safety_issue" => SignalType::SafetyIssue,
            _ => SignalType::Unknown(value),
        }
    }
}

impl From<&str> for SignalType {
    fn from(value: &str) -> Self {
        SignalType::from(value.to_string())
    }
}

impl From<SignalType> for String {
    fn from(value: SignalType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a signal came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Inspection,
    WorkOrder,
    Manual,
}

/// A single evidenced observation of an execution failure at a site.
///
/// Signals are immutable once produced except for [`ExecutionSignal::resolve`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSignal {
    pub signal_id: String,
    pub site_id: String,
    pub signal_type: SignalType,
    pub severity: Severity,
    /// When the signal was identified (drives recency decay)
    pub detected_date: DateTime<Utc>,
    pub confidence_score: f64,
    #[serde(default)]
    pub evidence: Evidence,
    #[serde(default)]
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<SourceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(default)]
    pub resolved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_date: Option<DateTime<Utc>>,
}

impl ExecutionSignal {
    /// Mark the signal resolved. The first resolution time is kept.
    /// Returns true if the signal was previously active.
    pub fn resolve(&mut self, now: DateTime<Utc>) -> bool {
        if self.resolved {
            return false;
        }
        self.resolved = true;
        self.resolved_date = Some(now);
        true
    }

    /// Reject signals missing the fields every consumer relies on.
    pub fn validate(&self) -> Result<(), InputError> {
        require("signal", &self.signal_id, "signal_id", &self.signal_id)?;
        require("signal", &self.signal_id, "site_id", &self.site_id)?;
        require("signal", &self.signal_id, "signal_type", self.signal_type.as_str())?;
        require("signal", &self.signal_id, "severity", self.severity.as_str())?;
        Ok(())
    }

    /// Whole days since detection, floored. Future detections count as age 0.
    pub fn age_days(&self, now: DateTime<Utc>) -> i64 {
        (now - self.detected_date).num_days().max(0)
    }
}
