pub mod leaderboard;
pub mod memory;
pub mod reconcile;
pub mod store;
