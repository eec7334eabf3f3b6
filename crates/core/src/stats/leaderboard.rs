use std::sync::Arc;

use tracing::debug;

use crate::domain::leaderboard::Leaderboard;
use crate::domain::member::CounterKind;
use crate::domain::period::MonthPeriod;
use crate::errors::StoreError;
use crate::stats::store::MemberStore;

/// How a period without any member records is reported.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EmptyPeriod {
    /// Return a leaderboard with empty leader lists.
    #[default]
    Allow,
    /// Fail with `StoreError::NotFound`.
    NotFound,
}

/// Read-only leaderboard queries over a [`MemberStore`].
#[derive(Clone)]
pub struct AggregationEngine {
    store: Arc<dyn MemberStore>,
}

impl AggregationEngine {
    pub fn new(store: Arc<dyn MemberStore>) -> Self {
        Self { store }
    }

    pub async fn leaderboard(&self, period: &MonthPeriod) -> Result<Leaderboard, StoreError> {
        self.leaderboard_with(period, EmptyPeriod::Allow).await
    }

    /// Like [`Self::leaderboard`], but a period with no members is `NotFound`.
    pub async fn require_leaderboard(
        &self,
        period: &MonthPeriod,
    ) -> Result<Leaderboard, StoreError> {
        self.leaderboard_with(period, EmptyPeriod::NotFound).await
    }

    pub async fn leaderboard_with(
        &self,
        period: &MonthPeriod,
        policy: EmptyPeriod,
    ) -> Result<Leaderboard, StoreError> {
        let most_liked = self.store.max_by_counter(period, CounterKind::ReceivedLikes).await?;
        let most_disliked =
            self.store.max_by_counter(period, CounterKind::ReceivedDislikes).await?;
        let leaderboard = Leaderboard { period: *period, most_liked, most_disliked };

        if leaderboard.is_empty() && policy == EmptyPeriod::NotFound {
            return Err(StoreError::NotFound(format!("no members recorded for {period}")));
        }

        debug!(
            event_name = "stats.leaderboard.computed",
            period = %period,
            most_liked = leaderboard.most_liked.len(),
            most_disliked = leaderboard.most_disliked.len(),
            "leaderboard computed"
        );
        Ok(leaderboard)
    }
}
