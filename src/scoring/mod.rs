pub mod breakdown;
pub mod config;
pub mod engine;
pub mod explain;
pub mod factors;
pub mod rank;
pub mod validation;

pub use breakdown::Breakdown;
pub use config::*;
pub use engine::{calculate_site_risk, check_signals, trend_for, RiskScore, RiskScorer, ScoreMetadata, SignalContribution, Trend};
pub use factors::RangeOp;
pub use rank::{at_risk, latest_per_site, rank_sites};
pub use validation::{validate_detection, validate_scoring};
