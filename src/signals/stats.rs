use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::types::{ExecutionSignal, Severity, SignalType};

const TOP_SITES: usize = 10;

/// Optional equality filters applied before aggregation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SignalFilter {
    pub site_id: Option<String>,
    pub signal_type: Option<SignalType>,
    pub severity: Option<Severity>,
    pub resolved: Option<bool>,
}

impl SignalFilter {
    pub fn matches(&self, signal: &ExecutionSignal) -> bool {
        self.site_id.as_ref().map_or(true, |id| *id == signal.site_id)
            && self
                .signal_type
                .as_ref()
                .map_or(true, |t| *t == signal.signal_type)
            && self.severity.as_ref().map_or(true, |s| *s == signal.severity)
            && self.resolved.map_or(true, |r| r == signal.resolved)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteSignalCount {
    pub site_id: String,
    pub signal_count: usize,
}

/// Signal counts grouped by type, severity and site. Groups keep first-seen order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalSummary {
    pub total_signals: usize,
    #[serde(serialize_with = "ordered_counts")]
    pub by_type: Vec<(SignalType, usize)>,
    #[serde(serialize_with = "ordered_counts")]
    pub by_severity: Vec<(Severity, usize)>,
    pub top_sites: Vec<SiteSignalCount>,
    pub filters_applied: SignalFilter,
}

/// Serialize `(key, count)` pairs as a JSON object, keeping their order.
fn ordered_counts<K, S>(counts: &[(K, usize)], serializer: S) -> Result<S::Ok, S::Error>
where
    K: Serialize,
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(counts.len()))?;
    for (key, count) in counts {
        map.serialize_entry(key, count)?;
    }
    map.end()
}

fn bump<K: PartialEq + Clone>(counts: &mut Vec<(K, usize)>, key: &K) {
    match counts.iter_mut().find(|(k, _)| k == key) {
        Some((_, n)) => *n += 1,
        None => counts.push((key.clone(), 1)),
    }
}

pub fn summarize(signals: &[ExecutionSignal], filter: &SignalFilter) -> SignalSummary {
    let mut total_signals = 0;
    let mut by_type = Vec::new();
    let mut by_severity = Vec::new();
    let mut by_site: Vec<(String, usize)> = Vec::new();

    for signal in signals.iter().filter(|s| filter.matches(s)) {
        total_signals += 1;
        bump(&mut by_type, &signal.signal_type);
        bump(&mut by_severity, &signal.severity);
        bump(&mut by_site, &signal.site_id);
    }

    // stable: equal counts keep first-seen order
    by_site.sort_by(|a, b| b.1.cmp(&a.1));
    let top_sites = by_site
        .into_iter()
        .take(TOP_SITES)
        .map(|(site_id, signal_count)| SiteSignalCount {
            site_id,
            signal_count,
        })
        .collect();

    SignalSummary {
        total_signals,
        by_type,
        by_severity,
        top_sites,
        filters_applied: filter.clone(),
    }
}
