pub mod connection;
pub mod migrations;
pub mod repositories;

pub use connection::{connect, connect_with_settings, probe, DbPool};
pub use repositories::{RepositoryError, SqlMemberRepository};
