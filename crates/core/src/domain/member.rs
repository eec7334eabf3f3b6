use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::period::MonthPeriod;
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MemberId(pub i64);

/// Counters tracked for a member within one period.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberCounters {
    pub received_likes: u32,
    pub received_dislikes: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterKind {
    ReceivedLikes,
    ReceivedDislikes,
}

impl CounterKind {
    pub const ALL: [CounterKind; 2] = [CounterKind::ReceivedLikes, CounterKind::ReceivedDislikes];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReceivedLikes => "received_likes",
            Self::ReceivedDislikes => "received_dislikes",
        }
    }

    pub fn value(&self, counters: &MemberCounters) -> u32 {
        match self {
            Self::ReceivedLikes => counters.received_likes,
            Self::ReceivedDislikes => counters.received_dislikes,
        }
    }
}

/// Snapshot of one member's counters for one period.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub slack_uid: String,
    pub period: MonthPeriod,
    pub received_likes: u32,
    pub received_dislikes: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Member {
    pub fn counters(&self) -> MemberCounters {
        MemberCounters {
            received_likes: self.received_likes,
            received_dislikes: self.received_dislikes,
        }
    }

    pub fn counter(&self, kind: CounterKind) -> u32 {
        kind.value(&self.counters())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewMember {
    pub slack_uid: String,
    pub period: MonthPeriod,
}

impl NewMember {
    pub fn new(slack_uid: impl Into<String>, period: MonthPeriod) -> Self {
        Self { slack_uid: slack_uid.into(), period }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.slack_uid.trim().is_empty() {
            return Err(DomainError::InvariantViolation(
                "member slack_uid must not be empty".to_owned(),
            ));
        }
        Ok(())
    }
}
