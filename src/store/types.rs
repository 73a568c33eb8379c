use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::records::{Inspection, Site, Vendor, WorkOrder};
use crate::scoring::RiskScore;
use crate::signals::ExecutionSignal;

pub const STORE_VERSION: u32 = 1;

/// All persisted records. Score snapshots are append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    pub version: u32,
    #[serde(default)]
    pub sites: Vec<Site>,
    #[serde(default)]
    pub vendors: Vec<Vendor>,
    #[serde(default)]
    pub work_orders: Vec<WorkOrder>,
    #[serde(default)]
    pub inspections: Vec<Inspection>,
    #[serde(default)]
    pub signals: Vec<ExecutionSignal>,
    #[serde(default)]
    pub risk_scores: Vec<RiskScore>,
}

/// Timeline of one site, newest entries first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteHistory {
    pub site: Site,
    pub signals: Vec<ExecutionSignal>,
    pub risk_history: Vec<RiskScore>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

fn upsert<T>(items: &mut Vec<T>, item: T, same: impl Fn(&T, &T) -> bool) {
    match items.iter_mut().find(|existing| same(existing, &item)) {
        Some(existing) => *existing = item,
        None => items.push(item),
    }
}

impl Store {
    pub fn new() -> Self {
        Self {
            version: STORE_VERSION,
            sites: Vec::new(),
            vendors: Vec::new(),
            work_orders: Vec::new(),
            inspections: Vec::new(),
            signals: Vec::new(),
            risk_scores: Vec::new(),
        }
    }

    pub fn upsert_site(&mut self, site: Site) {
        upsert(&mut self.sites, site, |a, b| a.site_id == b.site_id);
    }

    pub fn upsert_vendor(&mut self, vendor: Vendor) {
        upsert(&mut self.vendors, vendor, |a, b| a.vendor_id == b.vendor_id);
    }

    pub fn upsert_work_order(&mut self, work_order: WorkOrder) {
        upsert(&mut self.work_orders, work_order, |a, b| {
            a.work_order_id == b.work_order_id
        });
    }

    pub fn upsert_inspection(&mut self, inspection: Inspection) {
        upsert(&mut self.inspections, inspection, |a, b| {
            a.inspection_id == b.inspection_id
        });
    }

    /// Record a new signal. Signals are never replaced once stored, so a
    /// re-detected signal keeps its original detection date and state.
    /// Returns false when a signal with that id already exists.
    pub fn insert_signal(&mut self, signal: ExecutionSignal) -> bool {
        if self.signals.iter().any(|s| s.signal_id == signal.signal_id) {
            return false;
        }
        self.signals.push(signal);
        true
    }

    pub fn push_score(&mut self, score: RiskScore) {
        self.risk_scores.push(score);
    }

    pub fn site(&self, site_id: &str) -> Option<&Site> {
        self.sites.iter().find(|s| s.site_id == site_id)
    }

    /// Every site id known to the store: registered sites first, then any
    /// site referenced only by signals, each once.
    pub fn site_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        let candidates = self
            .sites
            .iter()
            .map(|s| &s.site_id)
            .chain(self.signals.iter().map(|s| &s.site_id));
        for id in candidates {
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }
        ids
    }

    pub fn signals_for_site(&self, site_id: &str) -> Vec<ExecutionSignal> {
        self.signals
            .iter()
            .filter(|s| s.site_id == site_id)
            .cloned()
            .collect()
    }

    /// Most recent score snapshot for a site.
    pub fn latest_score(&self, site_id: &str) -> Option<&RiskScore> {
        self.risk_scores
            .iter()
            .filter(|s| s.site_id == site_id)
            .max_by_key(|s| s.calculated_date)
    }

    /// Site record plus its signals (newest detection first) and score
    /// history (newest first). None when the site is not registered.
    pub fn history(&self, site_id: &str) -> Option<SiteHistory> {
        let site = self.site(site_id)?.clone();

        let mut signals = self.signals_for_site(site_id);
        signals.sort_by(|a, b| b.detected_date.cmp(&a.detected_date));

        let mut risk_history: Vec<RiskScore> = self
            .risk_scores
            .iter()
            .filter(|s| s.site_id == site_id)
            .cloned()
            .collect();
        risk_history.sort_by(|a, b| b.calculated_date.cmp(&a.calculated_date));

        Some(SiteHistory {
            site,
            signals,
            risk_history,
        })
    }

    /// Mark a signal resolved at `now`.
    /// Returns false when no signal has that id.
    pub fn resolve_signal(&mut self, signal_id: &str, now: DateTime<Utc>) -> bool {
        match self.signals.iter_mut().find(|s| s.signal_id == signal_id) {
            Some(signal) => {
                signal.resolve(now);
                true
            }
            None => false,
        }
    }
}
