//! Slack integration for tally - Events API webhooks and leaderboard publishing
//!
//! - **Signing** (`signature`) - `X-Slack-Signature` v0 verification
//! - **Events** (`events`) - Events API payload parsing and reaction dispatch
//! - **Block Kit** (`blocks`) - leaderboard summary messages
//! - **Publisher** (`publisher`) - `chat.postMessage` delivery
//!
//! # Architecture
//!
//! ```text
//! POST /slack/events → verify → parse_payload → EventDispatcher → ReactionHandler
//!                                                                      ↓
//!                                                           ReconciliationEngine
//!
//! POST /slack/monthly-update → AggregationEngine → leaderboard_message → SlackWebPublisher
//! ```
//!
//! # Getting Started
//!
//! 1. Create a Slack app at https://api.slack.com/apps
//! 2. Subscribe to `reaction_added` and `reaction_removed` bot events with the
//!    request URL pointing at `/slack/events`
//! 3. Grant the `chat:write` and `reactions:read` scopes
//! 4. Set env vars: `TALLY_SLACK_SIGNING_SECRET`, `TALLY_SLACK_BOT_TOKEN`

pub mod blocks;
pub mod events;
pub mod publisher;
pub mod signature;
