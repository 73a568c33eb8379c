use chrono::{DateTime, Duration, Utc};
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::records::Site;
use crate::scoring::{RiskScore, SignalContribution, Trend};
use crate::signals::{Severity, SignalSummary};
use crate::store::SiteHistory;

/// A ranked score with its site record, when the site is registered
pub struct RankedSite<'a> {
    pub score: &'a RiskScore,
    pub site: Option<&'a Site>,
}

impl RankedSite<'_> {
    fn display_name(&self) -> &str {
        self.site
            .map(|s| s.name.as_str())
            .unwrap_or(self.score.site_id.as_str())
    }
}

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Format a score with one decimal ("25.0", "100.0")
pub fn format_score(score: f64) -> String {
    format!("{:.1}", score)
}

pub fn format_trend(trend: Trend, use_colors: bool) -> String {
    let label = trend.as_str();
    if !use_colors {
        return label.to_string();
    }
    match trend {
        Trend::Deteriorating => label.red().to_string(),
        Trend::Improving => label.green().to_string(),
        Trend::Stable => label.dimmed().to_string(),
    }
}

/// Format a duration into a human-readable age string
/// "2h" for hours, "3d" for days, "1w" for weeks
pub fn format_age(duration: Duration) -> String {
    let hours = duration.num_hours();
    let days = duration.num_days();
    let weeks = days / 7;

    if weeks >= 1 {
        format!("{}w", weeks)
    } else if days >= 1 {
        format!("{}d", days)
    } else if hours >= 1 {
        format!("{}h", hours)
    } else {
        "today".to_string()
    }
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate text to fit available width, accounting for Unicode
fn truncate_text(text: &str, max_width: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_width {
        text.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// Format ranked sites as a table with columns: Index, Score, Trend, Site
/// No headers. Site names are truncated to the terminal width.
pub fn format_ranked_table(sites: &[RankedSite], use_colors: bool) -> String {
    if sites.is_empty() {
        return "No sites at risk.".to_string();
    }

    let term_width = get_terminal_width();
    let index_width = 3;
    let score_width = 6;
    let trend_width = 13;
    let separator = "  ";
    let fixed_width = index_width + 1 + score_width + trend_width + separator.len() * 2;

    sites
        .iter()
        .enumerate()
        .map(|(idx, ranked)| {
            let index_str = format!("{:>2}.", idx + 1);
            let score_padded = format!("{:>width$}", format_score(ranked.score.score), width = score_width);
            // pad before coloring so escape codes don't skew alignment
            let trend_padded = format!("{:<width$}", ranked.score.trend.as_str(), width = trend_width);

            let label = format!("{} ({})", ranked.display_name(), ranked.score.site_id);
            let label = match term_width {
                Some(width) if width > fixed_width + 10 => truncate_text(&label, width - fixed_width),
                Some(_) => truncate_text(&label, 20),
                None => label,
            };

            if use_colors {
                let trend_colored = match ranked.score.trend {
                    Trend::Deteriorating => trend_padded.red().to_string(),
                    Trend::Improving => trend_padded.green().to_string(),
                    Trend::Stable => trend_padded.dimmed().to_string(),
                };
                format!(
                    "{} {}{}{}{}{}",
                    index_str.dimmed(),
                    score_padded.bold(),
                    separator,
                    trend_colored,
                    separator,
                    label
                )
            } else {
                format!(
                    "{} {}{}{}{}{}",
                    index_str, score_padded, separator, trend_padded, separator, label
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format ranked sites as tab-separated values for scripting
/// Columns: score, trend, site_id, name (no headers, no colors)
pub fn format_tsv(sites: &[RankedSite]) -> String {
    sites
        .iter()
        .map(|ranked| {
            format!(
                "{:.2}\t{}\t{}\t{}",
                ranked.score.score,
                ranked.score.trend.as_str(),
                ranked.score.site_id,
                ranked.display_name()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a single score with its breakdown (multi-line)
pub fn format_score_detail(ranked: &RankedSite, use_colors: bool) -> String {
    let score = ranked.score;
    let mut lines = Vec::new();

    let heading = format!("{} ({})", ranked.display_name(), score.site_id);
    lines.push(if use_colors {
        heading.bold().to_string()
    } else {
        heading
    });
    lines.push(format!(
        "  Score: {}  Trend: {}",
        format_score(score.score),
        format_trend(score.trend, use_colors)
    ));
    lines.push(format!(
        "  Signals: {} active ({} critical, {} high)",
        score.metadata.total_signals, score.metadata.critical_signals, score.metadata.high_signals
    ));

    if !score.breakdown.is_empty() {
        lines.push(format!("  Breakdown ({} signal types):", score.breakdown.len()));
        for (signal_type, value) in score.breakdown.iter() {
            lines.push(format!("    {:<20} {:>7.2}", signal_type.label(), value));
        }
    }

    lines.push(format!("  {}", score.explanation));
    lines.join("\n")
}

/// Format per-signal contributions (verbose mode)
pub fn format_contributions(contributions: &[SignalContribution]) -> String {
    contributions
        .iter()
        .map(|c| {
            format!(
                "    {} [{} / {}] {:.1} x {:.2} x {:.1} ({} old) = {:.2}",
                c.signal_id,
                c.signal_type,
                c.severity,
                c.weight,
                c.confidence,
                c.recency,
                format_age(Duration::days(c.age_days)),
                c.value
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pad a severity label, colored by how severe it is
fn severity_label(severity: &Severity, use_colors: bool) -> String {
    let padded = format!("{:<8}", severity.as_str());
    if !use_colors {
        return padded;
    }
    match severity.rank() {
        4 => padded.red().bold().to_string(),
        3 => padded.red().to_string(),
        2 => padded.yellow().to_string(),
        _ => padded.dimmed().to_string(),
    }
}

/// Format a site's signal timeline and score history (multi-line, newest first)
pub fn format_history(history: &SiteHistory, now: DateTime<Utc>, use_colors: bool) -> String {
    let heading = format!("{} ({})", history.site.name, history.site.site_id);
    let mut lines = vec![if use_colors {
        heading.bold().to_string()
    } else {
        heading
    }];

    lines.push("  Signals:".to_string());
    if history.signals.is_empty() {
        lines.push("    none".to_string());
    }
    for signal in &history.signals {
        let age = format_age(now - signal.detected_date);
        let when = if age == "today" { age } else { format!("{} ago", age) };
        let mut line = format!(
            "    {}  {}  {:<20} {} ({})",
            signal.detected_date.format("%Y-%m-%d"),
            severity_label(&signal.severity, use_colors),
            signal.signal_type.label(),
            signal.signal_id,
            when
        );
        if signal.resolved {
            line.push_str("  [resolved]");
        }
        lines.push(line);
    }

    lines.push("  Risk history:".to_string());
    if history.risk_history.is_empty() {
        lines.push("    none".to_string());
    }
    for score in &history.risk_history {
        lines.push(format!(
            "    {}  {:>6}  {}",
            score.calculated_date.format("%Y-%m-%d"),
            format_score(score.score),
            format_trend(score.trend, use_colors)
        ));
    }

    lines.join("\n")
}

/// Format signal statistics (multi-line)
pub fn format_signal_summary(summary: &SignalSummary) -> String {
    if summary.total_signals == 0 {
        return "No signals match.".to_string();
    }

    let mut lines = vec![format!("Total signals: {}", summary.total_signals)];

    lines.push("By type:".to_string());
    for (signal_type, count) in &summary.by_type {
        lines.push(format!("  {:<20} {:>5}", signal_type.label(), count));
    }

    lines.push("By severity:".to_string());
    for (severity, count) in &summary.by_severity {
        lines.push(format!("  {:<20} {:>5}", severity.as_str(), count));
    }

    lines.push("Top sites:".to_string());
    for site in &summary.top_sites {
        lines.push(format!("  {:<20} {:>5}", site.site_id, site.signal_count));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::calculate_site_risk;
    use crate::signals::{summarize, Evidence, ExecutionSignal, Severity, SignalFilter, SignalType};
    use chrono::{DateTime, TimeZone, Utc};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn signal(id: &str, signal_type: SignalType, severity: Severity) -> ExecutionSignal {
        ExecutionSignal {
            signal_id: id.to_string(),
            site_id: "site_001".to_string(),
            signal_type,
            severity,
            detected_date: now(),
            confidence_score: 1.0,
            evidence: Evidence::new(),
            explanation: String::new(),
            source_type: None,
            source_id: None,
            resolved: false,
            resolved_date: None,
        }
    }

    fn sample_site() -> Site {
        Site {
            site_id: "site_001".to_string(),
            name: "Downtown Retail Store #45".to_string(),
            location: "123 Main St, Austin, TX 78701".to_string(),
            site_type: "retail".to_string(),
            region: Some("Southwest".to_string()),
            status: "active".to_string(),
        }
    }

    fn sample_score() -> RiskScore {
        calculate_site_risk(
            "site_001",
            &[
                signal("s1", SignalType::SafetyIssue, Severity::Critical),
                signal("s2", SignalType::LateWorkOrder, Severity::High),
            ],
            None,
            now(),
        )
    }

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(25.0), "25.0");
        assert_eq!(format_score(8.44), "8.4");
        assert_eq!(format_score(100.0), "100.0");
    }

    #[test]
    fn test_format_trend_plain() {
        assert_eq!(format_trend(Trend::Deteriorating, false), "deteriorating");
        assert_eq!(format_trend(Trend::Stable, false), "stable");
    }

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(Duration::days(0)), "today");
        assert_eq!(format_age(Duration::days(3)), "3d");
        assert_eq!(format_age(Duration::days(45)), "6w");
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("Short", 20), "Short");
        assert_eq!(truncate_text("This is a very long name", 15), "This is a ve...");
        assert_eq!(truncate_text("Hello world", 3), "Hel");
    }

    #[test]
    fn test_format_ranked_table_empty() {
        assert_eq!(format_ranked_table(&[], false), "No sites at risk.");
    }

    #[test]
    fn test_format_ranked_table_rows() {
        let site = sample_site();
        let first = sample_score();
        let second = calculate_site_risk("site_002", &[], None, now());
        let ranked = vec![
            RankedSite { score: &first, site: Some(&site) },
            RankedSite { score: &second, site: None },
        ];

        let result = format_ranked_table(&ranked, false);
        let lines: Vec<&str> = result.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with(" 1."));
        assert!(lines[0].contains("40.0"));
        assert!(lines[0].contains("stable"));
        assert!(lines[1].starts_with(" 2."));
        assert!(lines[1].contains("site_002 (site_002)"));
    }

    #[test]
    fn test_format_tsv() {
        let site = sample_site();
        let score = sample_score();
        let result = format_tsv(&[RankedSite { score: &score, site: Some(&site) }]);
        assert_eq!(result, "40.00\tstable\tsite_001\tDowntown Retail Store #45");
    }

    #[test]
    fn test_format_score_detail() {
        let site = sample_site();
        let score = sample_score();
        let result = format_score_detail(&RankedSite { score: &score, site: Some(&site) }, false);
        assert!(result.contains("Downtown Retail Store #45 (site_001)"));
        assert!(result.contains("Score: 40.0  Trend: stable"));
        assert!(result.contains("2 active (1 critical, 1 high)"));
        assert!(result.contains("Breakdown (2 signal types):"));
        assert!(result.contains("safety issue"));
        assert!(result.contains("Primary concerns: safety issue, late work order."));
    }

    #[test]
    fn test_format_contributions() {
        let scorer = crate::scoring::RiskScorer::default();
        let contributions = scorer.contributions(
            &[signal("s1", SignalType::DocGap, Severity::Low)],
            now(),
        );
        assert_eq!(
            format_contributions(&contributions),
            "    s1 [doc_gap / low] 3.0 x 1.00 x 1.0 (today old) = 3.00"
        );
    }

    #[test]
    fn test_format_signal_summary() {
        let signals = vec![signal("s1", SignalType::DocGap, Severity::Low)];
        let summary = summarize(&signals, &SignalFilter::default());
        let result = format_signal_summary(&summary);
        assert!(result.starts_with("Total signals: 1"));
        assert!(result.contains("doc gap"));
        assert!(result.contains("site_001"));

        let empty = summarize(&[], &SignalFilter::default());
        assert_eq!(format_signal_summary(&empty), "No signals match.");
    }

    #[test]
    fn test_format_history() {
        let mut store = crate::store::Store::new();
        store.upsert_site(sample_site());
        let mut old = signal("s1", SignalType::DocGap, Severity::Low);
        old.detected_date = now() - Duration::days(10);
        old.resolved = true;
        store.insert_signal(old);
        store.insert_signal(signal("s2", SignalType::SafetyIssue, Severity::Critical));
        store.push_score(sample_score());

        let result = format_history(&store.history("site_001").unwrap(), now(), false);
        let lines: Vec<&str> = result.lines().collect();
        assert_eq!(lines[0], "Downtown Retail Store #45 (site_001)");
        assert_eq!(lines[1], "  Signals:");
        assert!(lines[2].contains("critical"));
        assert!(lines[2].contains("s2 (today)"));
        assert!(lines[3].contains("s1 (1w ago)"));
        assert!(lines[3].starts_with("    2026-02-19  low"));
        assert!(lines[3].ends_with("[resolved]"));
        assert_eq!(lines[4], "  Risk history:");
        assert_eq!(lines[5], "    2026-03-01    40.0  stable");
    }

    #[test]
    fn test_severity_label_plain() {
        assert_eq!(severity_label(&Severity::High, false), "high    ");
        assert_eq!(severity_label(&Severity::from("dire"), false), "dire    ");
    }
}
