use crate::config::settings::TierRules;

/// Derive the tier name for a score: first threshold (descending) the score
/// clears, falling back to the lowest tier.
pub fn tier_for_score(rules: &TierRules, score: i64) -> String {
    for rule in rules.entries() {
        if score >= rule.min_score {
            return rule.name.clone();
        }
    }
    rules.fallback().to_string()
}
