pub mod models;
pub mod tier;

pub use models::{MatchRecord, MatchStatus, Player, PlayerId, Role};
