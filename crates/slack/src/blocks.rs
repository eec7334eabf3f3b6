use serde::Serialize;

use tally_core::domain::leaderboard::Leaderboard;
use tally_core::domain::member::CounterKind;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextObject {
    #[serde(rename = "plain_text")]
    Plain { text: String },
    Mrkdwn { text: String },
}

impl TextObject {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::Plain { text: text.into() }
    }

    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self::Mrkdwn { text: text.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Section { block_id: String, text: TextObject },
    Divider { block_id: String },
    Context { block_id: String, elements: Vec<TextObject> },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MessageTemplate {
    pub fallback_text: String,
    pub blocks: Vec<Block>,
}

pub struct MessageBuilder {
    fallback_text: String,
    blocks: Vec<Block>,
}

impl MessageBuilder {
    pub fn new(fallback_text: impl Into<String>) -> Self {
        Self { fallback_text: fallback_text.into(), blocks: Vec::new() }
    }

    pub fn section<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut SectionBuilder),
    {
        let mut builder = SectionBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Section { block_id: block_id.into(), text: builder.build() });
        self
    }

    pub fn divider(mut self, block_id: impl Into<String>) -> Self {
        self.blocks.push(Block::Divider { block_id: block_id.into() });
        self
    }

    pub fn context<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut ContextBuilder),
    {
        let mut builder = ContextBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Context { block_id: block_id.into(), elements: builder.build() });
        self
    }

    pub fn build(self) -> MessageTemplate {
        MessageTemplate { fallback_text: self.fallback_text, blocks: self.blocks }
    }
}

#[derive(Default)]
pub struct SectionBuilder {
    text: Option<TextObject>,
}

impl SectionBuilder {
    pub fn mrkdwn(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(TextObject::mrkdwn(text));
        self
    }

    fn build(self) -> TextObject {
        self.text.unwrap_or_else(|| TextObject::plain(""))
    }
}

#[derive(Default)]
pub struct ContextBuilder {
    elements: Vec<TextObject>,
}

impl ContextBuilder {
    pub fn plain(&mut self, text: impl Into<String>) -> &mut Self {
        self.elements.push(TextObject::plain(text));
        self
    }

    fn build(self) -> Vec<TextObject> {
        self.elements
    }
}

/// Monthly summary posted to a channel: one section per counter, every
/// tied leader mentioned.
pub fn leaderboard_message(leaderboard: &Leaderboard) -> MessageTemplate {
    let headline = format!("Slack member activity for the month of {}", leaderboard.period.label());

    let mut builder = MessageBuilder::new(headline.clone())
        .section("tally.leaderboard.summary.v1", |section| {
            section.mrkdwn(headline);
        })
        .divider("tally.leaderboard.divider.v1");

    for kind in CounterKind::ALL {
        let (block_id, lead_in, unit) = match kind {
            CounterKind::ReceivedLikes => {
                ("tally.leaderboard.likes.v1", "most likes received", "like")
            }
            CounterKind::ReceivedDislikes => (
                "tally.leaderboard.dislikes.v1",
                "hottest takes (most dislikes received)",
                "dislike",
            ),
        };

        builder = match leaderboard.leading_value(kind).filter(|value| *value > 0) {
            Some(value) => {
                let mentions = leaderboard
                    .leaders(kind)
                    .iter()
                    .map(|member| format!("<@{}>", member.slack_uid))
                    .collect::<Vec<_>>()
                    .join(", ");
                let plural = if value == 1 { "" } else { "s" };
                builder.section(block_id, |section| {
                    section.mrkdwn(format!("- {lead_in}: {mentions} with {value} {unit}{plural}"));
                })
            }
            None => builder.context(block_id, |context| {
                context.plain(format!("No {unit}s were received this month."));
            }),
        };
    }

    builder.build()
}
