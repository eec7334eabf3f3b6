use serde::{Deserialize, Serialize};

use crate::domain::member::{CounterKind, Member};
use crate::domain::period::MonthPeriod;

/// Leaders of each counter for one period. Derived on demand, never stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub period: MonthPeriod,
    pub most_liked: Vec<Member>,
    pub most_disliked: Vec<Member>,
}

impl Leaderboard {
    pub fn empty(period: MonthPeriod) -> Self {
        Self { period, most_liked: Vec::new(), most_disliked: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.most_liked.is_empty() && self.most_disliked.is_empty()
    }

    pub fn leaders(&self, kind: CounterKind) -> &[Member] {
        match kind {
            CounterKind::ReceivedLikes => &self.most_liked,
            CounterKind::ReceivedDislikes => &self.most_disliked,
        }
    }

    /// Shared leading value of a counter, if anyone leads it.
    pub fn leading_value(&self, kind: CounterKind) -> Option<u32> {
        self.leaders(kind).first().map(|member| member.counter(kind))
    }
}
