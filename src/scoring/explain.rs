use super::breakdown::Breakdown;
use crate::signals::types::{ExecutionSignal, Severity};

pub const NO_ACTIVE_SIGNALS: &str = "No active execution signals. Site is performing well.";

const TOP_CONCERNS: usize = 3;

fn count_phrase(count: usize, noun: &str) -> String {
    format!("{} {}{}", count, noun, if count > 1 { "s" } else { "" })
}

fn severity_noun(severity: &Severity) -> &'static str {
    match severity {
        Severity::Critical => "critical issue",
        Severity::High => "high-severity issue",
        Severity::Medium => "medium-severity issue",
        Severity::Low => "low-severity issue",
        Severity::Unknown(_) => "unclassified issue",
    }
}

/// Human-readable summary of a score.
///
/// Severity counts are listed most severe first, zero counts omitted. Signals
/// with an unrecognized severity are counted last as "unclassified".
pub fn explain(score: f64, active: &[&ExecutionSignal], breakdown: &Breakdown) -> String {
    if active.is_empty() {
        return NO_ACTIVE_SIGNALS.to_string();
    }

    let mut parts: Vec<String> = Severity::DESCENDING
        .iter()
        .map(|severity| {
            let count = active.iter().filter(|s| s.severity == *severity).count();
            (severity, count)
        })
        .filter(|(_, count)| *count > 0)
        .map(|(severity, count)| count_phrase(count, severity_noun(severity)))
        .collect();

    let unclassified = active.iter().filter(|s| !s.severity.is_known()).count();
    if unclassified > 0 {
        parts.push(count_phrase(unclassified, severity_noun(&Severity::Unknown(String::new()))));
    }

    let concerns = breakdown
        .top(TOP_CONCERNS)
        .into_iter()
        .map(|(signal_type, _)| signal_type.label())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Site shows elevated risk (score: {:.1}) due to {}. Primary concerns: {}.",
        score,
        parts.join(", "),
        concerns
    )
}
