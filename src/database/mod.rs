pub mod connection;
pub mod matches;
pub mod players;
pub mod rules;
pub mod setup;
pub mod sqlite_store;

pub use connection::{DbConn, DbPool, create_pool, get_connection};
pub use sqlite_store::SqliteStore;
