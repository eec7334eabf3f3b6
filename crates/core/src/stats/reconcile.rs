use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::domain::member::{Member, NewMember};
use crate::domain::period::MonthPeriod;
use crate::domain::reaction::ReactionEvent;
use crate::errors::StoreError;
use crate::stats::store::{Lookup, MemberStore};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Empty target or an automated account such as `USLACKBOT`.
    NoHumanTarget,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Applied { member: Member, created: bool },
    Skipped { reason: SkipReason },
}

/// Folds reaction events into the counters of the month they are handled in.
#[derive(Clone)]
pub struct ReconciliationEngine {
    store: Arc<dyn MemberStore>,
    clock: Arc<dyn Clock>,
}

impl ReconciliationEngine {
    pub fn new(store: Arc<dyn MemberStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn reconcile(&self, event: &ReactionEvent) -> Result<ReconcileOutcome, StoreError> {
        if !event.has_human_target() {
            debug!(
                event_name = "stats.reconcile.skipped",
                target_uid = %event.target_uid,
                "reaction target is not a human member"
            );
            return Ok(ReconcileOutcome::Skipped { reason: SkipReason::NoHumanTarget });
        }

        let slack_uid = event.target_uid.trim();
        let period = MonthPeriod::containing(self.clock.now());
        let (current, created) = self.load_or_create(slack_uid, &period).await?;
        let member = self.store.apply_delta(current.id, event.delta()).await?;

        info!(
            event_name = "stats.reconcile.applied",
            slack_uid = %member.slack_uid,
            period = %member.period,
            polarity = event.polarity.as_str(),
            direction = event.direction.as_str(),
            received_likes = member.received_likes,
            received_dislikes = member.received_dislikes,
            created,
            "reaction reconciled"
        );

        Ok(ReconcileOutcome::Applied { member, created })
    }

    async fn load_or_create(
        &self,
        slack_uid: &str,
        period: &MonthPeriod,
    ) -> Result<(Member, bool), StoreError> {
        if let Lookup::Found(member) = Lookup::by_identity(self.store.as_ref(), slack_uid, period).await? {
            return Ok((member, false));
        }

        match self.store.create(NewMember::new(slack_uid, *period)).await {
            Ok(member) => Ok((member, true)),
            Err(error) if error.is_conflict() => {
                warn!(
                    event_name = "stats.reconcile.create_conflict",
                    slack_uid,
                    period = %period,
                    reason = %error,
                    "member created concurrently, re-reading"
                );
                let member = self.store.find_by_identity(slack_uid, period).await?;
                Ok((member, false))
            }
            Err(error) => Err(error),
        }
    }
}
