use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use site_risk::scoring::{calculate_site_risk, rank_sites, trend_for, RiskScorer, Trend};
use site_risk::signals::{Evidence, ExecutionSignal, Severity, SignalType};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, 8, 0, 0).unwrap()
}

const SEVERITIES: [Severity; 4] = [Severity::Low, Severity::Medium, Severity::High, Severity::Critical];

fn signal_type(idx: usize) -> SignalType {
    [
        SignalType::MissedInspection,
        SignalType::LateWorkOrder,
        SignalType::IncompleteTask,
        SignalType::DocGap,
        SignalType::SlaBreach,
        SignalType::SafetyIssue,
    ][idx % 6]
        .clone()
}

fn arb_signal() -> impl Strategy<Value = ExecutionSignal> {
    (0usize..6, 0usize..4, 0i64..400, 0.0f64..=1.0, any::<bool>()).prop_map(
        |(type_idx, sev_idx, age, confidence, resolved)| ExecutionSignal {
            signal_id: "sig".to_string(),
            site_id: "site_001".to_string(),
            signal_type: signal_type(type_idx),
            severity: SEVERITIES[sev_idx].clone(),
            detected_date: now() - Duration::days(age),
            confidence_score: confidence,
            evidence: Evidence::new(),
            explanation: String::new(),
            source_type: None,
            source_id: None,
            resolved,
            resolved_date: None,
        },
    )
}

/// Signals with unique ids.
fn arb_signals(size: std::ops::Range<usize>) -> impl Strategy<Value = Vec<ExecutionSignal>> {
    prop::collection::vec(arb_signal(), size).prop_map(|mut signals| {
        for (i, signal) in signals.iter_mut().enumerate() {
            signal.signal_id = format!("sig_{}", i);
        }
        signals
    })
}

proptest! {
    #[test]
    fn score_is_bounded(signals in arb_signals(0..30)) {
        let risk = calculate_site_risk("site_001", &signals, None, now());
        prop_assert!(risk.score >= 0.0 && risk.score <= 100.0, "score {}", risk.score);
    }

    #[test]
    fn resolving_never_raises_score(
        signals in arb_signals(1..20),
        pick in any::<prop::sample::Index>(),
    ) {
        let before = calculate_site_risk("site_001", &signals, None, now());
        let mut resolved = signals.clone();
        let idx = pick.index(resolved.len());
        resolved[idx].resolved = true;
        let after = calculate_site_risk("site_001", &resolved, None, now());

        prop_assert!(after.score <= before.score);
        prop_assert!(!after.contributing_signals.contains(&resolved[idx].signal_id));
    }

    #[test]
    fn raising_severity_never_lowers_score(
        signals in arb_signals(1..20),
        pick in any::<prop::sample::Index>(),
    ) {
        let idx = pick.index(signals.len());
        let base_rank = SEVERITIES.iter().position(|s| *s == signals[idx].severity).unwrap_or(0);

        let mut previous = calculate_site_risk("site_001", &signals, None, now()).score;
        for severity in &SEVERITIES[base_rank..] {
            let mut raised = signals.clone();
            raised[idx].severity = severity.clone();
            let score = calculate_site_risk("site_001", &raised, None, now()).score;
            prop_assert!(score >= previous, "{} < {} at {}", score, previous, severity);
            previous = score;
        }
    }

    #[test]
    fn older_signal_never_contributes_more(
        sig in arb_signal(),
        newer_age in 0i64..400,
        extra in 0i64..400,
    ) {
        let scorer = RiskScorer::default();
        let mut newer = sig.clone();
        newer.resolved = false;
        newer.detected_date = now() - Duration::days(newer_age);
        let mut older = newer.clone();
        older.detected_date = now() - Duration::days(newer_age + extra);

        let newer_value = scorer.contribution(&newer, now()).value;
        let older_value = scorer.contribution(&older, now()).value;
        prop_assert!(older_value <= newer_value);
    }

    #[test]
    fn trend_follows_threshold(current in 0i64..=10_000, previous in 0i64..=10_000) {
        // scores in hundredths, as stored after rounding
        let trend = trend_for(current as f64 / 100.0, Some(previous as f64 / 100.0), 5.0);
        let delta = current - previous;
        let expected = if delta > 500 {
            Trend::Deteriorating
        } else if delta < -500 {
            Trend::Improving
        } else {
            Trend::Stable
        };
        prop_assert_eq!(trend, expected);
    }

    #[test]
    fn trend_is_stable_at_exact_threshold(previous in 0i64..=9_500) {
        let prev = previous as f64 / 100.0;
        let up = (previous + 500) as f64 / 100.0;
        prop_assert_eq!(trend_for(up, Some(prev), 5.0), Trend::Stable);
        prop_assert_eq!(trend_for(prev, Some(up), 5.0), Trend::Stable);
    }

    #[test]
    fn scoring_is_idempotent(
        signals in arb_signals(0..20),
        previous in prop::option::of(0.0f64..=100.0),
    ) {
        let mut prev_score = None;
        if let Some(p) = previous {
            let mut snapshot = calculate_site_risk("site_001", &[], None, now());
            snapshot.score = p;
            prev_score = Some(snapshot);
        }

        let first = calculate_site_risk("site_001", &signals, prev_score.as_ref(), now());
        let second = calculate_site_risk("site_001", &signals, prev_score.as_ref(), now());
        prop_assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn ranking_is_stable_descending(values in prop::collection::vec(0u8..=10, 0..30)) {
        let scores: Vec<_> = values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let mut s = calculate_site_risk(&format!("site_{:03}", i), &[], None, now());
                s.score = f64::from(*v) * 10.0;
                s
            })
            .collect();

        let ranked = rank_sites(scores);
        for pair in ranked.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
            if pair[0].score == pair[1].score {
                prop_assert!(pair[0].site_id < pair[1].site_id);
            }
        }
    }
}

#[test]
fn single_critical_signal_scores_25() {
    let signal = ExecutionSignal {
        signal_id: "sig_1".to_string(),
        site_id: "site_001".to_string(),
        signal_type: SignalType::SafetyIssue,
        severity: Severity::Critical,
        detected_date: now(),
        confidence_score: 1.0,
        evidence: Evidence::new(),
        explanation: String::new(),
        source_type: None,
        source_id: None,
        resolved: false,
        resolved_date: None,
    };
    let risk = calculate_site_risk("site_001", &[signal], None, now());
    assert_eq!(risk.score, 25.0);
    assert_eq!(risk.trend, Trend::Stable);
    assert!(risk.explanation.contains("1 critical issue"));
}
