use serde::{Deserialize, Serialize};

use crate::domain::member::MemberCounters;

/// Identities that never receive counters (automated posts).
pub const SYSTEM_IDENTITIES: &[&str] = &["USLACKBOT"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionPolarity {
    Positive,
    Negative,
}

impl ReactionPolarity {
    /// Maps a Slack reaction name to a tracked polarity. Untracked reactions
    /// return `None`.
    pub fn from_reaction(reaction: &str) -> Option<Self> {
        match normalize_reaction_token(reaction).as_str() {
            "+1" | "thumbsup" | "👍" => Some(Self::Positive),
            "-1" | "thumbsdown" | "👎" => Some(Self::Negative),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionDirection {
    Added,
    Removed,
}

impl ReactionDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Removed => "removed",
        }
    }
}

/// Normalized reaction event, post-verification and post-decoding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionEvent {
    pub target_uid: String,
    pub polarity: ReactionPolarity,
    pub direction: ReactionDirection,
}

impl ReactionEvent {
    pub fn new(
        target_uid: impl Into<String>,
        polarity: ReactionPolarity,
        direction: ReactionDirection,
    ) -> Self {
        Self { target_uid: target_uid.into(), polarity, direction }
    }

    pub fn added(target_uid: impl Into<String>, polarity: ReactionPolarity) -> Self {
        Self::new(target_uid, polarity, ReactionDirection::Added)
    }

    pub fn removed(target_uid: impl Into<String>, polarity: ReactionPolarity) -> Self {
        Self::new(target_uid, polarity, ReactionDirection::Removed)
    }

    /// False for empty targets and automated accounts.
    pub fn has_human_target(&self) -> bool {
        let target = self.target_uid.trim();
        !target.is_empty() && !SYSTEM_IDENTITIES.contains(&target)
    }

    pub fn delta(&self) -> ReactionDelta {
        ReactionDelta { polarity: self.polarity, direction: self.direction }
    }
}

/// Counter change described by one reaction event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReactionDelta {
    pub polarity: ReactionPolarity,
    pub direction: ReactionDirection,
}

impl ReactionDelta {
    /// Returns the counters after this delta. Removals clamp at zero.
    pub fn apply(&self, counters: MemberCounters) -> MemberCounters {
        let step = |value: u32| match self.direction {
            ReactionDirection::Added => value.saturating_add(1),
            ReactionDirection::Removed => value.saturating_sub(1),
        };

        match self.polarity {
            ReactionPolarity::Positive => {
                MemberCounters { received_likes: step(counters.received_likes), ..counters }
            }
            ReactionPolarity::Negative => {
                MemberCounters { received_dislikes: step(counters.received_dislikes), ..counters }
            }
        }
    }
}

fn normalize_reaction_token(reaction: &str) -> String {
    let trimmed = reaction.trim().trim_matches(':');
    let base = trimmed.split("::").next().unwrap_or(trimmed);
    base.to_ascii_lowercase()
}
