pub mod recalculate;
pub mod stats;

use log::info;

use crate::config::settings::LeagueRules;
use crate::domain::tier::tier_for_score;
use crate::errors::EngineResult;
use crate::store::{LeagueStore, with_transaction};

/// Persist a changed rule set and re-derive every player's tier against the
/// new thresholds.
pub fn apply_rule_update(
    store: &mut dyn LeagueStore,
    rules: &LeagueRules,
) -> EngineResult<()> {
    with_transaction(store, |store| {
        store.set_score_rules(&rules.score)?;
        store.set_tier_rules(&rules.tiers)?;

        for mut player in store.list_players(false)? {
            player.tier = tier_for_score(&rules.tiers, player.score);
            store.upsert_player(&player)?;
        }

        info!("Rule set updated, tiers re-derived");
        Ok(())
    })
}
