use async_trait::async_trait;

use crate::domain::member::{CounterKind, Member, MemberCounters, MemberId, NewMember};
use crate::domain::period::MonthPeriod;
use crate::domain::reaction::ReactionDelta;
use crate::errors::StoreError;

/// Durable CRUD over member records keyed by id or by `(slack_uid, period)`.
///
/// Implementations run every mutation in a single transaction and report
/// failures with the [`StoreError`] kinds unchanged.
#[async_trait]
pub trait MemberStore: Send + Sync {
    async fn find_by_id(&self, id: MemberId) -> Result<Member, StoreError>;

    async fn find_by_identity(
        &self,
        slack_uid: &str,
        period: &MonthPeriod,
    ) -> Result<Member, StoreError>;

    /// Inserts a zero-counter record. Returns `Conflict` when the pair exists.
    async fn create(&self, member: NewMember) -> Result<Member, StoreError>;

    /// Replaces the counters wholesale and advances `updated_at`.
    async fn update(&self, id: MemberId, counters: MemberCounters) -> Result<Member, StoreError>;

    /// Reads the stored counters, applies `delta` and writes the result back
    /// as one atomic read-modify-write. Concurrent deltas for the same id
    /// never overwrite each other.
    async fn apply_delta(&self, id: MemberId, delta: ReactionDelta) -> Result<Member, StoreError>;

    /// Every member of `period` holding the maximum value of `counter`,
    /// ordered by id. Empty when the period has no members.
    async fn max_by_counter(
        &self,
        period: &MonthPeriod,
        counter: CounterKind,
    ) -> Result<Vec<Member>, StoreError>;

    async fn delete(&self, id: MemberId) -> Result<(), StoreError>;
}

/// Result of an identity lookup where absence is an expected outcome.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Lookup {
    Found(Member),
    Absent,
}

impl Lookup {
    pub async fn by_identity<S>(
        store: &S,
        slack_uid: &str,
        period: &MonthPeriod,
    ) -> Result<Self, StoreError>
    where
        S: MemberStore + ?Sized,
    {
        match store.find_by_identity(slack_uid, period).await {
            Ok(member) => Ok(Self::Found(member)),
            Err(error) if error.is_not_found() => Ok(Self::Absent),
            Err(error) => Err(error),
        }
    }
}
