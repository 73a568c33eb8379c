use std::collections::HashMap;

use super::engine::RiskScore;

/// Sort scores highest first. The sort is stable, so ties keep input order.
pub fn rank_sites(mut scores: Vec<RiskScore>) -> Vec<RiskScore> {
    scores.sort_by(|a, b| b.score.total_cmp(&a.score));
    scores
}

/// Ranked scores at or above `min_score`, truncated to `limit`.
pub fn at_risk(scores: Vec<RiskScore>, min_score: f64, limit: usize) -> Vec<RiskScore> {
    let mut ranked = rank_sites(scores.into_iter().filter(|s| s.score >= min_score).collect());
    ranked.truncate(limit);
    ranked
}

/// Keep only the newest snapshot per site, in order of each site's first appearance.
pub fn latest_per_site(scores: &[RiskScore]) -> Vec<RiskScore> {
    let mut order: Vec<&str> = Vec::new();
    let mut latest: HashMap<&str, &RiskScore> = HashMap::new();

    for score in scores {
        let site_id = score.site_id.as_str();
        let newer = match latest.get(site_id) {
            Some(existing) => score.calculated_date >= existing.calculated_date,
            None => {
                order.push(site_id);
                true
            }
        };
        if newer {
            latest.insert(site_id, score);
        }
    }

    order
        .into_iter()
        .filter_map(|site_id| latest.get(site_id).map(|s| (*s).clone()))
        .collect()
}
