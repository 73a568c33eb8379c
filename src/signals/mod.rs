pub mod detector;
pub mod extraction;
pub mod stats;
pub mod types;

pub use detector::LateWorkOrderDetector;
pub use extraction::{extract_from_inspection, signals_from_inspection, CandidateSignal, PrecomputedExtractor, SignalExtractor};
pub use stats::{summarize, SignalFilter, SignalSummary};
pub use types::{Evidence, ExecutionSignal, Severity, SignalType, SourceType};
