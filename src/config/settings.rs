use serde::{Deserialize, Serialize};

/// Point deltas applied to confirmed match results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRules {
    pub win: i64,
    pub loss: i64,
    pub underdog_bonus: i64,
    pub big_win_bonus: i64,
    pub big_win_margin: i64,
    pub target_games: i64,
}

impl Default for ScoreRules {
    fn default() -> Self {
        Self {
            win: 20,
            loss: 0,
            underdog_bonus: 15,
            big_win_bonus: 5,
            big_win_margin: 10,
            target_games: 4,
        }
    }
}

/// A named rank bucket and the minimum score required for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierRule {
    pub name: String,
    pub min_score: i64,
}

/// Tier thresholds, kept sorted descending so derivation is a single scan.
/// The last entry is the fallback tier for any score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierRules {
    tiers: Vec<TierRule>,
}

impl TierRules {
    pub fn new(mut tiers: Vec<TierRule>) -> Self {
        tiers.sort_by(|a, b| b.min_score.cmp(&a.min_score));
        Self { tiers }
    }

    pub fn entries(&self) -> &[TierRule] {
        &self.tiers
    }

    pub fn fallback(&self) -> &str {
        self.tiers
            .last()
            .map(|t| t.name.as_str())
            .unwrap_or("Unranked")
    }
}

impl Default for TierRules {
    fn default() -> Self {
        Self::new(vec![
            TierRule { name: "Challenger".to_string(), min_score: 1650 },
            TierRule { name: "Diamond".to_string(), min_score: 1550 },
            TierRule { name: "Platinum".to_string(), min_score: 1450 },
            TierRule { name: "Gold".to_string(), min_score: 1350 },
            TierRule { name: "Silver".to_string(), min_score: 1200 },
            TierRule { name: "Bronze".to_string(), min_score: 0 },
        ])
    }
}

/// Immutable rule set handed to the engine components per call.
/// Passed explicitly rather than read from shared mutable state, so rating
/// computations stay deterministic and testable in isolation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeagueRules {
    pub score: ScoreRules,
    pub tiers: TierRules,
}

pub const STARTING_SCORE: i64 = 1000;
