pub mod formatter;

pub use formatter::{
    format_age, format_contributions, format_history, format_ranked_table, format_score, format_score_detail,
    format_signal_summary, format_trend, format_tsv, should_use_colors, RankedSite,
};
