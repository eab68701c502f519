use chrono::{NaiveDate, NaiveDateTime};

use crate::config::settings::LeagueRules;
use crate::domain::models::{MatchRecord, MatchStatus, PlayerId};
use crate::errors::{EngineError, EngineResult};
use crate::rating::RatingLedger;
use crate::store::{LeagueStore, require_match, require_player, with_transaction};

/// State machine over a match record's lifecycle:
/// unscored → awaiting-approval → confirmed, with dispute and correction
/// edges. No state is terminal. Illegal transitions are rejected as state
/// errors, never reinterpreted. Every public operation runs in one storage
/// transaction.
pub struct ApprovalWorkflow<'a> {
    rules: &'a LeagueRules,
}

impl<'a> ApprovalWorkflow<'a> {
    pub fn new(rules: &'a LeagueRules) -> Self {
        Self { rules }
    }

    /// Manually added match, outside bracket generation. Starts unscored.
    pub fn create_manual(
        &self,
        store: &mut dyn LeagueStore,
        date: NaiveDate,
        team1: &[PlayerId],
        team2: &[PlayerId],
        group_name: Option<&str>,
    ) -> EngineResult<i64> {
        with_transaction(store, |store| {
            for team in [team1, team2] {
                if team.is_empty() || team.len() > 2 {
                    return Err(EngineError::validation(
                        "each team needs one or two players",
                    ));
                }
                for id in team {
                    require_player(store, id)?;
                }
            }
            Ok(store.insert_match(date, team1, team2, group_name)?)
        })
    }

    /// Record a result for peer approval. Does not touch ratings.
    pub fn submit(
        &self,
        store: &mut dyn LeagueStore,
        match_id: i64,
        score1: i64,
        score2: i64,
        by: &str,
        now: NaiveDateTime,
    ) -> EngineResult<MatchRecord> {
        with_transaction(store, |store| {
            let mut record = require_match(store, match_id)?;
            expect_status(&record, MatchStatus::Unscored, "submit")?;
            if score1 == score2 {
                return Err(EngineError::validation(format!(
                    "tied score {score1}:{score2} cannot be submitted"
                )));
            }

            record.score1 = score1;
            record.score2 = score2;
            record.status = MatchStatus::AwaitingApproval;
            record.submitted_by = Some(by.to_string());
            record.submitted_at = Some(now);
            store.update_match(&record)?;
            Ok(record)
        })
    }

    /// Opposing-side approval: applies the submitted scores to the ledger.
    pub fn approve(
        &self,
        store: &mut dyn LeagueStore,
        match_id: i64,
        by: &str,
        now: NaiveDateTime,
    ) -> EngineResult<MatchRecord> {
        with_transaction(store, |store| {
            let record = require_match(store, match_id)?;
            expect_status(&record, MatchStatus::AwaitingApproval, "approve")?;

            let ledger = RatingLedger::new(self.rules);
            let mut confirmed = ledger.apply(
                store,
                match_id,
                record.score1,
                record.score2,
                record.submitted_by.as_deref(),
                now,
            )?;
            confirmed.approved_by = Some(by.to_string());
            confirmed.approved_at = Some(now);
            store.update_match(&confirmed)?;
            Ok(confirmed)
        })
    }

    /// Opposing-side dispute. Nothing was applied, so nothing is reverted.
    pub fn reject(
        &self,
        store: &mut dyn LeagueStore,
        match_id: i64,
        reason: &str,
    ) -> EngineResult<MatchRecord> {
        with_transaction(store, |store| {
            let mut record = require_match(store, match_id)?;
            expect_status(&record, MatchStatus::AwaitingApproval, "reject")?;

            record.status = MatchStatus::Disputed;
            record.score1 = 0;
            record.score2 = 0;
            record.dispute_reason = Some(reason.to_string());
            store.update_match(&record)?;
            Ok(record)
        })
    }

    /// Admin override: confirm the given scores from any state. A live
    /// confirmation is rolled back inside `RatingLedger::apply`.
    pub fn admin_force_confirm(
        &self,
        store: &mut dyn LeagueStore,
        match_id: i64,
        score1: i64,
        score2: i64,
        admin_id: &str,
        now: NaiveDateTime,
    ) -> EngineResult<MatchRecord> {
        with_transaction(store, |store| {
            let ledger = RatingLedger::new(self.rules);
            let mut confirmed =
                ledger.apply(store, match_id, score1, score2, Some(admin_id), now)?;
            confirmed.approved_by = Some(admin_id.to_string());
            confirmed.approved_at = Some(now);
            store.update_match(&confirmed)?;
            Ok(confirmed)
        })
    }

    /// In-place correction: back out any confirmed deltas and leave the row
    /// unscored with its team/group metadata intact.
    pub fn reset_to_unscored(
        &self,
        store: &mut dyn LeagueStore,
        match_id: i64,
        today: NaiveDate,
    ) -> EngineResult<MatchRecord> {
        with_transaction(store, |store| {
            let mut record = require_match(store, match_id)?;
            if record.status == MatchStatus::Confirmed {
                record = RatingLedger::new(self.rules).rollback(store, match_id, today)?;
            }

            record.status = MatchStatus::Unscored;
            record.score1 = 0;
            record.score2 = 0;
            record.change1 = 0;
            record.change2 = 0;
            record.dispute_reason = None;
            store.update_match(&record)?;
            Ok(record)
        })
    }

    /// Remove a match. With `keep_row` the row survives as unscored.
    pub fn delete(
        &self,
        store: &mut dyn LeagueStore,
        match_id: i64,
        keep_row: bool,
        today: NaiveDate,
    ) -> EngineResult<()> {
        with_transaction(store, |store| {
            let record = require_match(store, match_id)?;
            if record.status == MatchStatus::Confirmed {
                RatingLedger::new(self.rules).rollback(store, match_id, today)?;
            }

            if keep_row {
                let mut kept = require_match(store, match_id)?;
                kept.status = MatchStatus::Unscored;
                kept.score1 = 0;
                kept.score2 = 0;
                kept.change1 = 0;
                kept.change2 = 0;
                store.update_match(&kept)?;
            } else {
                store.delete_match(match_id)?;
            }
            Ok(())
        })
    }
}

fn expect_status(
    record: &MatchRecord,
    expected: MatchStatus,
    action: &'static str,
) -> EngineResult<()> {
    if record.status != expected {
        return Err(EngineError::State {
            match_id: record.id,
            action,
            status: record.status,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::SqliteStore;
    use crate::domain::models::Player;
    use crate::domain::tier::tier_for_score;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(d: NaiveDate) -> NaiveDateTime {
        d.and_hms_opt(20, 30, 0).unwrap()
    }

    // Prior-year session so the catch-up multiplier stays out of the way.
    fn session() -> NaiveDate {
        date(2024, 6, 1)
    }

    fn now() -> NaiveDateTime {
        at(date(2025, 1, 10))
    }

    fn seeded_store(rules: &LeagueRules) -> (SqliteStore, i64) {
        let mut store = SqliteStore::open_in_memory().unwrap();
        for id in ["p1", "p2", "p3", "p4"] {
            let mut p = Player::new(id, id.to_uppercase());
            p.tier = tier_for_score(&rules.tiers, p.score);
            store.upsert_player(&p).unwrap();
        }
        let match_id = store
            .insert_match(
                session(),
                &["p1".to_string(), "p2".to_string()],
                &["p3".to_string(), "p4".to_string()],
                Some("A"),
            )
            .unwrap();
        (store, match_id)
    }

    fn score_of(store: &mut SqliteStore, id: &str) -> i64 {
        store.get_player(id).unwrap().unwrap().score
    }

    #[test]
    fn submit_then_approve_confirms_and_applies() {
        let rules = LeagueRules::default();
        let (mut store, match_id) = seeded_store(&rules);
        let flow = ApprovalWorkflow::new(&rules);

        let submitted = flow
            .submit(&mut store, match_id, 21, 15, "p1", now())
            .unwrap();
        assert_eq!(submitted.status, MatchStatus::AwaitingApproval);
        assert_eq!(score_of(&mut store, "p1"), 1000); // no rating effect yet

        let confirmed = flow.approve(&mut store, match_id, "p3", now()).unwrap();
        assert_eq!(confirmed.status, MatchStatus::Confirmed);
        assert_eq!(confirmed.submitted_by.as_deref(), Some("p1"));
        assert_eq!(confirmed.approved_by.as_deref(), Some("p3"));
        assert_eq!(confirmed.change1, 20);
        assert_eq!(score_of(&mut store, "p1"), 1020);
    }

    #[test]
    fn submit_is_only_legal_from_unscored() {
        let rules = LeagueRules::default();
        let (mut store, match_id) = seeded_store(&rules);
        let flow = ApprovalWorkflow::new(&rules);

        flow.submit(&mut store, match_id, 21, 15, "p1", now()).unwrap();
        let err = flow
            .submit(&mut store, match_id, 15, 21, "p3", now())
            .unwrap_err();
        assert!(matches!(err, EngineError::State { action: "submit", .. }));

        // First submission untouched.
        let record = store.get_match(match_id).unwrap().unwrap();
        assert_eq!((record.score1, record.score2), (21, 15));
    }

    #[test]
    fn approve_requires_awaiting_approval() {
        let rules = LeagueRules::default();
        let (mut store, match_id) = seeded_store(&rules);
        let flow = ApprovalWorkflow::new(&rules);

        let err = flow.approve(&mut store, match_id, "p3", now()).unwrap_err();
        assert!(matches!(err, EngineError::State { action: "approve", .. }));
        assert_eq!(score_of(&mut store, "p1"), 1000);
    }

    #[test]
    fn tied_submission_is_a_validation_error() {
        let rules = LeagueRules::default();
        let (mut store, match_id) = seeded_store(&rules);
        let flow = ApprovalWorkflow::new(&rules);

        let err = flow
            .submit(&mut store, match_id, 11, 11, "p1", now())
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));

        let record = store.get_match(match_id).unwrap().unwrap();
        assert_eq!(record.status, MatchStatus::Unscored);
        assert!(record.submitted_by.is_none());
    }

    #[test]
    fn reject_stores_the_reason_and_leaves_scores_alone() {
        let rules = LeagueRules::default();
        let (mut store, match_id) = seeded_store(&rules);
        let flow = ApprovalWorkflow::new(&rules);

        flow.submit(&mut store, match_id, 21, 15, "p1", now()).unwrap();
        let disputed = flow
            .reject(&mut store, match_id, "score was 19:21, not 21:15")
            .unwrap();

        assert_eq!(disputed.status, MatchStatus::Disputed);
        assert_eq!(
            disputed.dispute_reason.as_deref(),
            Some("score was 19:21, not 21:15")
        );
        assert_eq!((disputed.score1, disputed.score2), (0, 0));
        for id in ["p1", "p2", "p3", "p4"] {
            assert_eq!(score_of(&mut store, id), 1000);
        }
    }

    #[test]
    fn reject_is_illegal_once_confirmed() {
        let rules = LeagueRules::default();
        let (mut store, match_id) = seeded_store(&rules);
        let flow = ApprovalWorkflow::new(&rules);

        flow.submit(&mut store, match_id, 21, 15, "p1", now()).unwrap();
        flow.approve(&mut store, match_id, "p3", now()).unwrap();

        let err = flow.reject(&mut store, match_id, "too late").unwrap_err();
        assert!(matches!(err, EngineError::State { action: "reject", .. }));
    }

    #[test]
    fn admin_force_confirm_overrides_a_dispute() {
        let rules = LeagueRules::default();
        let (mut store, match_id) = seeded_store(&rules);
        let flow = ApprovalWorkflow::new(&rules);

        flow.submit(&mut store, match_id, 21, 15, "p1", now()).unwrap();
        flow.reject(&mut store, match_id, "disagreed").unwrap();

        let confirmed = flow
            .admin_force_confirm(&mut store, match_id, 19, 21, "admin7", now())
            .unwrap();

        assert_eq!(confirmed.status, MatchStatus::Confirmed);
        assert_eq!(confirmed.submitted_by.as_deref(), Some("admin7"));
        assert_eq!(confirmed.approved_by.as_deref(), Some("admin7"));
        assert_eq!(score_of(&mut store, "p3"), 1020);
        assert_eq!(score_of(&mut store, "p1"), 1000);
    }

    #[test]
    fn admin_force_confirm_corrects_a_confirmed_result() {
        let rules = LeagueRules::default();
        let (mut store, match_id) = seeded_store(&rules);
        let flow = ApprovalWorkflow::new(&rules);

        flow.submit(&mut store, match_id, 21, 15, "p1", now()).unwrap();
        flow.approve(&mut store, match_id, "p3", now()).unwrap();
        assert_eq!(score_of(&mut store, "p1"), 1020);

        // Flip the winner; the old deltas must be rolled back exactly once.
        flow.admin_force_confirm(&mut store, match_id, 15, 21, "admin7", now())
            .unwrap();

        assert_eq!(score_of(&mut store, "p1"), 1000);
        assert_eq!(score_of(&mut store, "p3"), 1020);
        let p1 = store.get_player("p1").unwrap().unwrap();
        assert_eq!((p1.match_count, p1.win_count), (1, 0));
    }

    #[test]
    fn tied_force_confirm_is_rejected_without_mutation() {
        let rules = LeagueRules::default();
        let (mut store, match_id) = seeded_store(&rules);
        let flow = ApprovalWorkflow::new(&rules);

        flow.submit(&mut store, match_id, 21, 15, "p1", now()).unwrap();
        flow.approve(&mut store, match_id, "p3", now()).unwrap();

        let err = flow
            .admin_force_confirm(&mut store, match_id, 9, 9, "admin7", now())
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));

        // Transaction aborted: the earlier confirmation is still live.
        assert_eq!(score_of(&mut store, "p1"), 1020);
        let record = store.get_match(match_id).unwrap().unwrap();
        assert_eq!(record.status, MatchStatus::Confirmed);
    }

    #[test]
    fn reset_to_unscored_backs_out_a_confirmation() {
        let rules = LeagueRules::default();
        let (mut store, match_id) = seeded_store(&rules);
        let flow = ApprovalWorkflow::new(&rules);

        flow.submit(&mut store, match_id, 21, 15, "p1", now()).unwrap();
        flow.approve(&mut store, match_id, "p3", now()).unwrap();

        let reset = flow
            .reset_to_unscored(&mut store, match_id, now().date())
            .unwrap();

        assert_eq!(reset.status, MatchStatus::Unscored);
        assert_eq!(reset.team1, vec!["p1", "p2"]);
        assert_eq!(reset.group_name.as_deref(), Some("A"));
        assert_eq!(score_of(&mut store, "p1"), 1000);
    }

    #[test]
    fn delete_keeping_the_row_leaves_an_unscored_shell() {
        let rules = LeagueRules::default();
        let (mut store, match_id) = seeded_store(&rules);
        let flow = ApprovalWorkflow::new(&rules);

        flow.submit(&mut store, match_id, 21, 15, "p1", now()).unwrap();
        flow.approve(&mut store, match_id, "p3", now()).unwrap();

        flow.delete(&mut store, match_id, true, now().date()).unwrap();
        let record = store.get_match(match_id).unwrap().unwrap();
        assert_eq!(record.status, MatchStatus::Unscored);
        assert_eq!(score_of(&mut store, "p1"), 1000);

        flow.delete(&mut store, match_id, false, now().date()).unwrap();
        assert!(store.get_match(match_id).unwrap().is_none());
    }

    #[test]
    fn create_manual_validates_roster_and_team_sizes() {
        let rules = LeagueRules::default();
        let (mut store, _) = seeded_store(&rules);
        let flow = ApprovalWorkflow::new(&rules);

        let id = flow
            .create_manual(
                &mut store,
                session(),
                &["p1".to_string()],
                &["p3".to_string(), "p4".to_string()],
                None,
            )
            .unwrap();
        assert_eq!(
            store.get_match(id).unwrap().unwrap().status,
            MatchStatus::Unscored
        );

        let err = flow
            .create_manual(
                &mut store,
                session(),
                &["p1".to_string(), "ghost".to_string()],
                &["p3".to_string()],
                None,
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[test]
    fn unknown_match_id_is_not_found() {
        let rules = LeagueRules::default();
        let (mut store, _) = seeded_store(&rules);
        let flow = ApprovalWorkflow::new(&rules);

        let err = flow.submit(&mut store, 9999, 21, 15, "p1", now()).unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }
}
