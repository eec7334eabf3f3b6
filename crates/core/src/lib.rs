//! Member statistics engine for Slack reaction counters.
//!
//! Members are partitioned by [`MonthPeriod`]; reactions are folded into
//! per-month counters by the [`ReconciliationEngine`] and summarised by the
//! [`AggregationEngine`]. Persistence sits behind the [`MemberStore`] trait.

pub mod clock;
pub mod config;
pub mod domain;
pub mod errors;
pub mod stats;

pub use chrono;

pub use clock::{Clock, FixedClock, SystemClock};
pub use domain::leaderboard::Leaderboard;
pub use domain::member::{CounterKind, Member, MemberCounters, MemberId, NewMember};
pub use domain::period::MonthPeriod;
pub use domain::reaction::{ReactionDelta, ReactionDirection, ReactionEvent, ReactionPolarity};
pub use errors::{ApplicationError, DomainError, InterfaceError, StoreError};
pub use stats::leaderboard::{AggregationEngine, EmptyPeriod};
pub use stats::memory::InMemoryMemberStore;
pub use stats::reconcile::{ReconcileOutcome, ReconciliationEngine, SkipReason};
pub use stats::store::{Lookup, MemberStore};
