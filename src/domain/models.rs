use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::config::settings::STARTING_SCORE;

/// Opaque player identifier stamped by the external auth collaborator.
pub type PlayerId = String;

/// League member with all numeric state owned by the rating engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub score: i64,
    /// Derived from `score` against the tier thresholds; recomputed on every
    /// score mutation, never edited independently.
    pub tier: String,
    pub xp: i64,
    pub is_active: bool,
    pub join_date: Option<NaiveDate>,
    pub match_count: i64,
    pub win_count: i64,
    /// Consecutive wins; resets to 0 on any loss.
    pub streak: i64,
    /// Wins that received the catch-up multiplier.
    pub boost_games: i64,
    /// Month key ("YYYY-MM") of the last awarded attendance.
    pub last_attendance: Option<String>,
    pub attendance_count: i64,
    pub consecutive_months: i64,
    pub role: Role,
}

impl Player {
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            score: STARTING_SCORE,
            tier: String::new(),
            xp: 0,
            is_active: true,
            join_date: None,
            match_count: 0,
            win_count: 0,
            streak: 0,
            boost_games: 0,
            last_attendance: None,
            attendance_count: 0,
            consecutive_months: 0,
            role: Role::Player,
        }
    }
}

/// Authorization role, owned by an external collaborator and opaque here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Player,
    Admin,
    SuperAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Player => "player",
            Role::Admin => "admin",
            Role::SuperAdmin => "super_admin",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "admin" => Role::Admin,
            "super_admin" => Role::SuperAdmin,
            _ => Role::Player,
        }
    }
}

/// Lifecycle of a match record through the approval workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStatus {
    Unscored,
    AwaitingApproval,
    Confirmed,
    Disputed,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Unscored => "unscored",
            MatchStatus::AwaitingApproval => "awaiting_approval",
            MatchStatus::Confirmed => "confirmed",
            MatchStatus::Disputed => "disputed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unscored" => Some(MatchStatus::Unscored),
            "awaiting_approval" => Some(MatchStatus::AwaitingApproval),
            "confirmed" => Some(MatchStatus::Confirmed),
            "disputed" => Some(MatchStatus::Disputed),
            _ => None,
        }
    }
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One doubles (or singles) match within a session.
///
/// Invariant: `change1`/`change2` are non-zero only while `status` is
/// `Confirmed`, and always equal exactly what the rating ledger last applied
/// for this match. They are the record's memory for rollback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: i64,
    pub date: NaiveDate,
    pub group_name: Option<String>,
    pub team1: Vec<PlayerId>,
    pub team2: Vec<PlayerId>,
    pub score1: i64,
    pub score2: i64,
    pub change1: i64,
    pub change2: i64,
    pub status: MatchStatus,
    pub submitted_by: Option<PlayerId>,
    pub submitted_at: Option<NaiveDateTime>,
    pub approved_by: Option<PlayerId>,
    pub approved_at: Option<NaiveDateTime>,
    pub dispute_reason: Option<String>,
}

impl MatchRecord {
    pub fn involves(&self, player_id: &str) -> bool {
        self.team1.iter().any(|p| p == player_id) || self.team2.iter().any(|p| p == player_id)
    }

    pub fn team1_won(&self) -> bool {
        self.score1 > self.score2
    }
}
