use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fs::File;
use std::path::Path;

use super::types::{Evidence, ExecutionSignal, Severity, SignalType, SourceType};
use crate::records::Inspection;

/// One candidate signal returned by the text-understanding service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSignal {
    pub signal_type: SignalType,
    pub severity: Severity,
    pub confidence_score: f64,
    /// Direct quote from the source text
    pub evidence_quote: String,
    pub explanation: String,
}

/// Output envelope of the text-understanding service.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionResult {
    pub signals: Vec<CandidateSignal>,
    #[serde(default)]
    pub processing_notes: Option<String>,
}

/// Turns raw inspection notes into candidate signals.
///
/// Implementations own their own confidence policy; candidates are trusted as-is.
pub trait SignalExtractor {
    fn extract(&self, notes: &str) -> Result<Vec<CandidateSignal>>;
}

/// Replays candidates the external service already produced.
#[derive(Debug, Clone, Default)]
pub struct PrecomputedExtractor {
    candidates: Vec<CandidateSignal>,
}

impl PrecomputedExtractor {
    pub fn new(candidates: Vec<CandidateSignal>) -> Self {
        Self { candidates }
    }

    /// Load either a bare JSON array of candidates or a `{"signals": [...]}` envelope.
    pub fn from_path(path: &Path) -> Result<Self> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Payload {
            List(Vec<CandidateSignal>),
            Envelope(ExtractionResult),
        }

        let file = File::open(path)
            .with_context(|| format!("Failed to open candidate signals at {}", path.display()))?;
        let payload: Payload = serde_json::from_reader(file)
            .with_context(|| format!("Failed to parse candidate signals in {}", path.display()))?;

        let candidates = match payload {
            Payload::List(list) => list,
            Payload::Envelope(result) => {
                if let Some(notes) = result.processing_notes {
                    tracing::debug!(%notes, "extraction processing notes");
                }
                result.signals
            }
        };
        Ok(Self::new(candidates))
    }
}

impl SignalExtractor for PrecomputedExtractor {
    fn extract(&self, _notes: &str) -> Result<Vec<CandidateSignal>> {
        Ok(self.candidates.clone())
    }
}

/// Build execution signals for an inspection from extractor output.
pub fn signals_from_inspection(
    inspection: &Inspection,
    candidates: Vec<CandidateSignal>,
    now: DateTime<Utc>,
) -> Vec<ExecutionSignal> {
    candidates
        .into_iter()
        .enumerate()
        .map(|(idx, candidate)| {
            let mut evidence = Evidence::new();
            evidence.insert("quote".to_string(), json!(candidate.evidence_quote));
            evidence.insert("inspection_id".to_string(), json!(inspection.inspection_id));

            ExecutionSignal {
                signal_id: format!("{}_sig_{}", inspection.inspection_id, idx),
                site_id: inspection.site_id.clone(),
                signal_type: candidate.signal_type,
                severity: candidate.severity,
                detected_date: now,
                confidence_score: candidate.confidence_score,
                evidence,
                explanation: candidate.explanation,
                source_type: Some(SourceType::Inspection),
                source_id: Some(inspection.inspection_id.clone()),
                resolved: false,
                resolved_date: None,
            }
        })
        .collect()
}

/// Run an extractor over an inspection's notes and convert the result.
pub fn extract_from_inspection(
    extractor: &dyn SignalExtractor,
    inspection: &Inspection,
    now: DateTime<Utc>,
) -> Result<Vec<ExecutionSignal>> {
    let candidates = extractor
        .extract(&inspection.notes)
        .with_context(|| format!("Signal extraction failed for inspection {}", inspection.inspection_id))?;
    Ok(signals_from_inspection(inspection, candidates, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;

    fn inspection() -> Inspection {
        Inspection {
            inspection_id: "insp_001".to_string(),
            site_id: "site_001".to_string(),
            inspector_name: "John Smith".to_string(),
            inspection_date: Utc.with_ymd_and_hms(2026, 1, 4, 10, 0, 0).unwrap(),
            notes: "HVAC filter needs replacement. Emergency exit sign bulb out.".to_string(),
            status: "completed".to_string(),
            inspection_type: Some("routine".to_string()),
        }
    }

    fn candidate(signal_type: &str, severity: &str, quote: &str) -> CandidateSignal {
        CandidateSignal {
            signal_type: SignalType::from(signal_type),
            severity: Severity::from(severity),
            confidence_score: 0.9,
            evidence_quote: quote.to_string(),
            explanation: "needs attention".to_string(),
        }
    }

    #[test]
    fn test_signals_from_inspection_ids_and_evidence() {
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap();
        let signals = signals_from_inspection(
            &inspection(),
            vec![
                candidate("incomplete_task", "medium", "HVAC filter needs replacement"),
                candidate("safety_issue", "high", "Emergency exit sign bulb out"),
            ],
            now,
        );

        assert_eq!(signals.len(), 2);
        assert_eq!(signals[0].signal_id, "insp_001_sig_0");
        assert_eq!(signals[1].signal_id, "insp_001_sig_1");
        assert_eq!(signals[1].signal_type, SignalType::SafetyIssue);
        assert_eq!(signals[1].evidence["quote"], "Emergency exit sign bulb out");
        assert_eq!(signals[1].evidence["inspection_id"], "insp_001");
        assert_eq!(signals[0].detected_date, now);
        assert_eq!(signals[0].source_id.as_deref(), Some("insp_001"));
    }

    #[test]
    fn test_extract_from_inspection_uses_extractor() {
        let extractor = PrecomputedExtractor::new(vec![candidate("doc_gap", "low", "no log")]);
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap();
        let signals = extract_from_inspection(&extractor, &inspection(), now).unwrap();
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].signal_type, SignalType::DocGap);
    }

    #[test]
    fn test_load_envelope_and_bare_list() {
        let dir = tempfile::tempdir().unwrap();

        let envelope = dir.path().join("envelope.json");
        let mut file = File::create(&envelope).unwrap();
        write!(
            file,
            r#"{{"signals": [{{"signal_type": "sla_breach", "severity": "high", "confidence_score": 0.8, "evidence_quote": "vendor no-show", "explanation": "missed SLA"}}], "processing_notes": "ok"}}"#
        )
        .unwrap();
        let loaded = PrecomputedExtractor::from_path(&envelope).unwrap();
        assert_eq!(loaded.extract("").unwrap().len(), 1);

        let list = dir.path().join("list.json");
        std::fs::write(&list, "[]").unwrap();
        let loaded = PrecomputedExtractor::from_path(&list).unwrap();
        assert!(loaded.extract("").unwrap().is_empty());
    }

    #[test]
    fn test_load_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(PrecomputedExtractor::from_path(&dir.path().join("nope.json")).is_err());
    }
}
