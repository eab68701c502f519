pub mod groups;
pub mod pairings;

use std::collections::HashSet;

use chrono::NaiveDate;
use log::info;
use rand::RngCore;

use crate::config::settings::LeagueRules;
use crate::domain::models::{Player, PlayerId};
use crate::errors::{EngineError, EngineResult};
use crate::rating::attendance;
use crate::store::{LeagueStore, with_transaction};
use groups::split_groups;
use pairings::{balanced_matches_of_four, filled_matches};

/// How a group's match list is built. Only exactly-four groups honour
/// `Balanced`; fives and sixes always take the canonical-plus-filler path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingMode {
    Balanced,
    Random,
}

impl PairingMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "balanced" => Some(PairingMode::Balanced),
            "random" => Some(PairingMode::Random),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScheduledGroup {
    pub label: String,
    pub members: Vec<PlayerId>,
    pub match_ids: Vec<i64>,
}

/// Builds a session bracket: seeds attendees, awards attendance, partitions
/// into groups and emits unscored match skeletons for the approval workflow.
pub struct BracketScheduler<'a> {
    rules: &'a LeagueRules,
}

impl<'a> BracketScheduler<'a> {
    pub fn new(rules: &'a LeagueRules) -> Self {
        Self { rules }
    }

    pub fn generate(
        &self,
        store: &mut dyn LeagueStore,
        date: NaiveDate,
        attendees: &[PlayerId],
        mode: PairingMode,
        rng: &mut dyn RngCore,
    ) -> EngineResult<Vec<ScheduledGroup>> {
        with_transaction(store, |store| {
            self.generate_inner(store, date, attendees, mode, rng)
        })
    }

    fn generate_inner(
        &self,
        store: &mut dyn LeagueStore,
        date: NaiveDate,
        attendees: &[PlayerId],
        mode: PairingMode,
        rng: &mut dyn RngCore,
    ) -> EngineResult<Vec<ScheduledGroup>> {
        if attendees.len() < 4 {
            return Err(EngineError::validation(format!(
                "at least 4 attendees required, got {}",
                attendees.len()
            )));
        }

        let mut seen = HashSet::new();
        for id in attendees {
            if !seen.insert(id.as_str()) {
                return Err(EngineError::validation(format!(
                    "attendee '{id}' listed twice"
                )));
            }
        }

        let mut roster = Vec::with_capacity(attendees.len());
        for id in attendees {
            let player = store.get_player(id)?.ok_or_else(|| {
                EngineError::validation(format!("unknown attendee '{id}'"))
            })?;
            roster.push(player);
        }
        // Seeding: strongest first; stable sort keeps roster order on ties.
        roster.sort_by(|a, b| b.score.cmp(&a.score));

        attendance::award_session(store, date, attendees)?;

        let sizes = split_groups(attendees.len()).ok_or_else(|| {
            EngineError::validation(format!(
                "no valid 4/5/6 group partition for {} attendees",
                attendees.len()
            ))
        })?;

        let target = self.rules.score.target_games;
        let mut scheduled = Vec::with_capacity(sizes.len());
        let mut offset = 0;

        for (group_idx, size) in sizes.iter().copied().enumerate() {
            let members: Vec<PlayerId> = roster[offset..offset + size]
                .iter()
                .map(|p: &Player| p.id.clone())
                .collect();
            offset += size;
            let label = group_label(group_idx);

            let match_plan = match (size, mode) {
                (4, PairingMode::Balanced) => balanced_matches_of_four(target),
                _ => filled_matches(size, target, rng),
            };

            let mut match_ids = Vec::with_capacity(match_plan.len());
            for (t1, t2) in match_plan {
                let team1 = vec![members[t1[0]].clone(), members[t1[1]].clone()];
                let team2 = vec![members[t2[0]].clone(), members[t2[1]].clone()];
                match_ids.push(store.insert_match(date, &team1, &team2, Some(&label))?);
            }

            scheduled.push(ScheduledGroup {
                label,
                members,
                match_ids,
            });
        }

        info!(
            "Generated bracket for {}: {} attendees in {} groups",
            date,
            attendees.len(),
            scheduled.len()
        );
        Ok(scheduled)
    }
}

fn group_label(index: usize) -> String {
    debug_assert!(index < 26);
    char::from(b'A' + index as u8).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::SqliteStore;
    use crate::domain::models::MatchStatus;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn seed_players(store: &mut SqliteStore, count: usize) -> Vec<PlayerId> {
        // Distinct descending scores so seeding order equals insertion order.
        (0..count)
            .map(|i| {
                let id = format!("p{i:02}");
                let mut p = Player::new(id.clone(), format!("Player {i}"));
                p.score = 1600 - (i as i64) * 25;
                store.upsert_player(&p).unwrap();
                id
            })
            .collect()
    }

    #[test]
    fn rejects_fewer_than_four_attendees() {
        let rules = LeagueRules::default();
        let mut store = SqliteStore::open_in_memory().unwrap();
        let ids = seed_players(&mut store, 3);
        let scheduler = BracketScheduler::new(&rules);

        let err = scheduler
            .generate(
                &mut store,
                date(2025, 3, 8),
                &ids,
                PairingMode::Balanced,
                &mut StdRng::seed_from_u64(1),
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn rejects_unknown_and_duplicate_attendees() {
        let rules = LeagueRules::default();
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut ids = seed_players(&mut store, 4);
        let scheduler = BracketScheduler::new(&rules);
        let mut rng = StdRng::seed_from_u64(1);

        ids.push("ghost".to_string());
        let err = scheduler
            .generate(&mut store, date(2025, 3, 8), &ids, PairingMode::Random, &mut rng)
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));

        let dupes = vec![ids[0].clone(), ids[0].clone(), ids[1].clone(), ids[2].clone()];
        let err = scheduler
            .generate(&mut store, date(2025, 3, 8), &dupes, PairingMode::Random, &mut rng)
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn infeasible_partition_aborts_the_whole_generation() {
        let rules = LeagueRules::default();
        let mut store = SqliteStore::open_in_memory().unwrap();
        let ids = seed_players(&mut store, 7); // 7 has no 4/5/6 partition
        let scheduler = BracketScheduler::new(&rules);

        let err = scheduler
            .generate(
                &mut store,
                date(2025, 3, 8),
                &ids,
                PairingMode::Balanced,
                &mut StdRng::seed_from_u64(1),
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));

        // Attendance XP was awarded before the partition check; the aborted
        // transaction must take it back out.
        for id in &ids {
            assert_eq!(store.get_player(id).unwrap().unwrap().xp, 0);
        }
        assert!(store.list_match_dates().unwrap().is_empty());
    }

    #[test]
    fn thirteen_attendees_get_three_seeded_groups() {
        let rules = LeagueRules::default();
        let mut store = SqliteStore::open_in_memory().unwrap();
        let ids = seed_players(&mut store, 13);
        let scheduler = BracketScheduler::new(&rules);

        let groups = scheduler
            .generate(
                &mut store,
                date(2025, 3, 8),
                &ids,
                PairingMode::Balanced,
                &mut StdRng::seed_from_u64(1),
            )
            .unwrap();

        let sizes: Vec<usize> = groups.iter().map(|g| g.members.len()).collect();
        assert_eq!(sizes, vec![5, 4, 4]);
        let labels: Vec<&str> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["A", "B", "C"]);
        // Top seeds land in group A in score order.
        assert_eq!(groups[0].members, ids[..5].to_vec());

        // Five-player group: canonical 5 matches; four-player balanced
        // groups: target 4 matches each.
        assert_eq!(groups[0].match_ids.len(), 5);
        assert_eq!(groups[1].match_ids.len(), 4);
        assert_eq!(groups[2].match_ids.len(), 4);

        for group in &groups {
            for match_id in &group.match_ids {
                let m = store.get_match(*match_id).unwrap().unwrap();
                assert_eq!(m.status, MatchStatus::Unscored);
                assert_eq!(m.group_name.as_deref(), Some(group.label.as_str()));
                assert_eq!((m.score1, m.score2, m.change1, m.change2), (0, 0, 0, 0));
            }
        }

        // Every attendee got this month's attendance XP exactly once.
        for id in &ids {
            assert_eq!(store.get_player(id).unwrap().unwrap().xp, 100);
        }
    }

    #[test]
    fn balanced_four_group_cycles_the_canonical_rotation() {
        let rules = LeagueRules::default();
        let mut store = SqliteStore::open_in_memory().unwrap();
        let ids = seed_players(&mut store, 4);
        let scheduler = BracketScheduler::new(&rules);

        let groups = scheduler
            .generate(
                &mut store,
                date(2025, 3, 8),
                &ids,
                PairingMode::Balanced,
                &mut StdRng::seed_from_u64(1),
            )
            .unwrap();

        let group = &groups[0];
        assert_eq!(group.match_ids.len(), 4);

        let expected_team1: [[usize; 2]; 4] = [[0, 3], [0, 2], [0, 1], [0, 3]];
        let expected_team2: [[usize; 2]; 4] = [[1, 2], [1, 3], [2, 3], [1, 2]];
        for (i, match_id) in group.match_ids.iter().enumerate() {
            let m = store.get_match(*match_id).unwrap().unwrap();
            let t1: Vec<PlayerId> = expected_team1[i].iter().map(|x| ids[*x].clone()).collect();
            let t2: Vec<PlayerId> = expected_team2[i].iter().map(|x| ids[*x].clone()).collect();
            assert_eq!(m.team1, t1, "match {i} team1");
            assert_eq!(m.team2, t2, "match {i} team2");
        }
    }

    #[test]
    fn random_mode_four_group_meets_the_games_target() {
        let rules = LeagueRules::default();
        let mut store = SqliteStore::open_in_memory().unwrap();
        let ids = seed_players(&mut store, 4);
        let scheduler = BracketScheduler::new(&rules);

        let groups = scheduler
            .generate(
                &mut store,
                date(2025, 3, 8),
                &ids,
                PairingMode::Random,
                &mut StdRng::seed_from_u64(5),
            )
            .unwrap();

        // 3 canonical + 1 filler reaches the 4-game average.
        assert_eq!(groups[0].match_ids.len(), 4);
    }
}
