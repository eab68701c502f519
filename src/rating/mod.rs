pub mod attendance;
pub mod boost;
pub mod ledger;

pub use ledger::{MatchDeltas, RatingLedger, compute_deltas};
