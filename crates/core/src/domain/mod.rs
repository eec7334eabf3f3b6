pub mod leaderboard;
pub mod member;
pub mod period;
pub mod reaction;
