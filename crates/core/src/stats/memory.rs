use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::clock::{Clock, SystemClock};
use crate::domain::member::{CounterKind, Member, MemberCounters, MemberId, NewMember};
use crate::domain::period::MonthPeriod;
use crate::domain::reaction::ReactionDelta;
use crate::errors::StoreError;
use crate::stats::store::MemberStore;

/// Process-local member store used by tests and single-process dry runs.
pub struct InMemoryMemberStore {
    clock: Arc<dyn Clock>,
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    last_id: i64,
    members: BTreeMap<MemberId, Member>,
}

impl Default for InMemoryMemberStore {
    fn default() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }
}

impl InMemoryMemberStore {
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { clock, state: Mutex::new(MemoryState::default()) }
    }

    pub fn members(&self) -> Vec<Member> {
        self.lock().members.values().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl MemberStore for InMemoryMemberStore {
    async fn find_by_id(&self, id: MemberId) -> Result<Member, StoreError> {
        self.lock()
            .members
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("member id {}", id.0)))
    }

    async fn find_by_identity(
        &self,
        slack_uid: &str,
        period: &MonthPeriod,
    ) -> Result<Member, StoreError> {
        self.lock()
            .members
            .values()
            .find(|member| member.slack_uid == slack_uid && member.period == *period)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("member {slack_uid} in {period}")))
    }

    async fn create(&self, member: NewMember) -> Result<Member, StoreError> {
        member.validate().map_err(|error| StoreError::Invalid(error.to_string()))?;

        let mut state = self.lock();
        let exists = state
            .members
            .values()
            .any(|existing| existing.slack_uid == member.slack_uid && existing.period == member.period);
        if exists {
            return Err(StoreError::Conflict(format!(
                "member {} in {} already exists",
                member.slack_uid, member.period
            )));
        }

        state.last_id += 1;
        let now = self.clock.now();
        let created = Member {
            id: MemberId(state.last_id),
            slack_uid: member.slack_uid,
            period: member.period,
            received_likes: 0,
            received_dislikes: 0,
            created_at: now,
            updated_at: now,
        };
        state.members.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(&self, id: MemberId, counters: MemberCounters) -> Result<Member, StoreError> {
        let now = self.clock.now();
        let mut state = self.lock();
        let member = state
            .members
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("member id {}", id.0)))?;

        member.received_likes = counters.received_likes;
        member.received_dislikes = counters.received_dislikes;
        member.updated_at = now;
        Ok(member.clone())
    }

    async fn apply_delta(&self, id: MemberId, delta: ReactionDelta) -> Result<Member, StoreError> {
        let now = self.clock.now();
        let mut state = self.lock();
        let member = state
            .members
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("member id {}", id.0)))?;

        let counters = delta.apply(member.counters());
        member.received_likes = counters.received_likes;
        member.received_dislikes = counters.received_dislikes;
        member.updated_at = now;
        Ok(member.clone())
    }

    async fn max_by_counter(
        &self,
        period: &MonthPeriod,
        counter: CounterKind,
    ) -> Result<Vec<Member>, StoreError> {
        let state = self.lock();
        let in_period: Vec<&Member> =
            state.members.values().filter(|member| member.period == *period).collect();
        let Some(max) = in_period.iter().map(|member| member.counter(counter)).max() else {
            return Ok(Vec::new());
        };

        Ok(in_period
            .into_iter()
            .filter(|member| member.counter(counter) == max)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: MemberId) -> Result<(), StoreError> {
        self.lock()
            .members
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("member id {}", id.0)))
    }
}
