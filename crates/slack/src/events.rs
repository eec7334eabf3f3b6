use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use tally_core::domain::reaction::{ReactionDirection, ReactionEvent, ReactionPolarity};
use tally_core::errors::StoreError;
use tally_core::stats::reconcile::{ReconcileOutcome, ReconciliationEngine};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlackEnvelope {
    pub event_id: Option<String>,
    pub event: SlackEvent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlackEvent {
    UrlVerification { challenge: String },
    ReactionAdded(ReactionNotice),
    ReactionRemoved(ReactionNotice),
    Unsupported { event_type: String },
}

impl SlackEvent {
    pub fn event_type(&self) -> SlackEventType {
        match self {
            Self::UrlVerification { .. } => SlackEventType::UrlVerification,
            Self::ReactionAdded(_) => SlackEventType::ReactionAdded,
            Self::ReactionRemoved(_) => SlackEventType::ReactionRemoved,
            Self::Unsupported { .. } => SlackEventType::Unsupported,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SlackEventType {
    UrlVerification,
    ReactionAdded,
    ReactionRemoved,
    Unsupported,
}

/// A `reaction_added` / `reaction_removed` inner event as Slack sends it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReactionNotice {
    pub reactor_user_id: String,
    pub reaction: String,
    /// Author of the reacted-to item. Absent for files and some bot posts.
    pub item_user: Option<String>,
    pub event_ts: String,
}

impl ReactionNotice {
    /// Normalizes into a counter event. `None` for reactions that are not tracked.
    pub fn to_reaction_event(&self, direction: ReactionDirection) -> Option<ReactionEvent> {
        let polarity = ReactionPolarity::from_reaction(&self.reaction)?;
        let target = self.item_user.clone().unwrap_or_default();
        Some(ReactionEvent::new(target, polarity, direction))
    }
}

#[derive(Debug, Error)]
pub enum EventParseError {
    #[error("payload is not valid Events API JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("`{event_type}` payload is missing `{field}`")]
    MissingField { event_type: String, field: &'static str },
}

#[derive(Deserialize)]
struct RawPayload {
    #[serde(rename = "type")]
    kind: String,
    challenge: Option<String>,
    event_id: Option<String>,
    event: Option<RawInnerEvent>,
}

#[derive(Deserialize)]
struct RawInnerEvent {
    #[serde(rename = "type")]
    kind: String,
    user: Option<String>,
    reaction: Option<String>,
    item_user: Option<String>,
    event_ts: Option<String>,
}

/// Decodes an Events API request body into a [`SlackEnvelope`].
pub fn parse_payload(body: &[u8]) -> Result<SlackEnvelope, EventParseError> {
    let raw: RawPayload = serde_json::from_slice(body)?;
    let missing = |event_type: &str, field| EventParseError::MissingField {
        event_type: event_type.to_owned(),
        field,
    };

    let event = match raw.kind.as_str() {
        "url_verification" => SlackEvent::UrlVerification {
            challenge: raw.challenge.ok_or_else(|| missing("url_verification", "challenge"))?,
        },
        "event_callback" => {
            let inner = raw.event.ok_or_else(|| missing("event_callback", "event"))?;
            match inner.kind.as_str() {
                "reaction_added" | "reaction_removed" => {
                    let notice = ReactionNotice {
                        reactor_user_id: inner.user.unwrap_or_default(),
                        reaction: inner.reaction.ok_or_else(|| missing(&inner.kind, "reaction"))?,
                        item_user: inner.item_user.filter(|user| !user.trim().is_empty()),
                        event_ts: inner.event_ts.unwrap_or_default(),
                    };
                    if inner.kind == "reaction_added" {
                        SlackEvent::ReactionAdded(notice)
                    } else {
                        SlackEvent::ReactionRemoved(notice)
                    }
                }
                _ => SlackEvent::Unsupported { event_type: inner.kind },
            }
        }
        _ => SlackEvent::Unsupported { event_type: raw.kind },
    };

    Ok(SlackEnvelope { event_id: raw.event_id, event })
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerResult {
    /// Body to echo back for a `url_verification` handshake.
    Challenge(String),
    Processed,
    Ignored,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventHandlerError {
    #[error("reaction could not be reconciled: {0}")]
    Reconcile(#[from] StoreError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error(transparent)]
    Handler(#[from] EventHandlerError),
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn event_type(&self) -> SlackEventType;
    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError>;
}

#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<SlackEventType, Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.handlers.insert(handler.event_type(), Arc::new(handler));
    }

    pub async fn dispatch(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, DispatchError> {
        let Some(handler) = self.handlers.get(&envelope.event.event_type()) else {
            debug!(
                event_name = "slack.event.unhandled",
                correlation_id = %ctx.correlation_id,
                event_type = ?envelope.event.event_type(),
                "no handler registered"
            );
            return Ok(HandlerResult::Ignored);
        };

        handler.handle(envelope, ctx).await.map_err(DispatchError::from)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

/// Dispatcher wired for the URL handshake and both reaction directions.
pub fn reaction_dispatcher<S>(service: Arc<S>) -> EventDispatcher
where
    S: ReactionService + 'static,
{
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(UrlVerificationHandler);
    dispatcher.register(ReactionHandler::new(service.clone(), ReactionDirection::Added));
    dispatcher.register(ReactionHandler::new(service, ReactionDirection::Removed));
    dispatcher
}

pub struct UrlVerificationHandler;

#[async_trait]
impl EventHandler for UrlVerificationHandler {
    fn event_type(&self) -> SlackEventType {
        SlackEventType::UrlVerification
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        _ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::UrlVerification { challenge } = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };
        Ok(HandlerResult::Challenge(challenge.clone()))
    }
}

#[async_trait]
pub trait ReactionService: Send + Sync {
    async fn record_reaction(
        &self,
        event: &ReactionEvent,
        ctx: &EventContext,
    ) -> Result<ReconcileOutcome, EventHandlerError>;
}

#[async_trait]
impl ReactionService for ReconciliationEngine {
    async fn record_reaction(
        &self,
        event: &ReactionEvent,
        _ctx: &EventContext,
    ) -> Result<ReconcileOutcome, EventHandlerError> {
        self.reconcile(event).await.map_err(EventHandlerError::from)
    }
}

pub struct ReactionHandler<S> {
    service: Arc<S>,
    direction: ReactionDirection,
}

impl<S> ReactionHandler<S>
where
    S: ReactionService,
{
    pub fn new(service: Arc<S>, direction: ReactionDirection) -> Self {
        Self { service, direction }
    }
}

#[async_trait]
impl<S> EventHandler for ReactionHandler<S>
where
    S: ReactionService + 'static,
{
    fn event_type(&self) -> SlackEventType {
        match self.direction {
            ReactionDirection::Added => SlackEventType::ReactionAdded,
            ReactionDirection::Removed => SlackEventType::ReactionRemoved,
        }
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let notice = match (&envelope.event, self.direction) {
            (SlackEvent::ReactionAdded(notice), ReactionDirection::Added)
            | (SlackEvent::ReactionRemoved(notice), ReactionDirection::Removed) => notice,
            _ => return Ok(HandlerResult::Ignored),
        };

        let Some(event) = notice.to_reaction_event(self.direction) else {
            debug!(
                event_name = "slack.reaction.untracked",
                correlation_id = %ctx.correlation_id,
                reaction = %notice.reaction,
                "reaction is not counted"
            );
            return Ok(HandlerResult::Ignored);
        };

        match self.service.record_reaction(&event, ctx).await {
            Ok(ReconcileOutcome::Applied { .. }) => Ok(HandlerResult::Processed),
            Ok(ReconcileOutcome::Skipped { reason }) => {
                debug!(
                    event_name = "slack.reaction.skipped",
                    correlation_id = %ctx.correlation_id,
                    reason = ?reason,
                    "reaction skipped"
                );
                Ok(HandlerResult::Ignored)
            }
            Err(error) => {
                warn!(
                    event_name = "slack.reaction.failed",
                    correlation_id = %ctx.correlation_id,
                    event_ts = %notice.event_ts,
                    reactor_user_id = %notice.reactor_user_id,
                    error = %error,
                    "reaction reconciliation failed"
                );
                Err(error)
            }
        }
    }
}
