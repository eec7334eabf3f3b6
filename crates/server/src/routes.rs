//! Slack-facing HTTP routes.
//!
//! - `POST /slack/events` (alias `/events`): signed Events API callbacks
//! - `POST /slack/monthly-update`: publish a month's leaderboard
//!
//! Anything else falls through to a plain-text 404.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use tally_core::clock::Clock;
use tally_core::domain::period::MonthPeriod;
use tally_core::errors::{ApplicationError, DomainError, InterfaceError};
use tally_core::stats::leaderboard::AggregationEngine;
use tally_slack::events::{parse_payload, EventContext, EventDispatcher, HandlerResult};
use tally_slack::publisher::{LeaderboardPublisher, PublishError};
use tally_slack::signature::{SignatureVerifier, SIGNATURE_HEADER, TIMESTAMP_HEADER};

#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<SignatureVerifier>,
    pub dispatcher: Arc<EventDispatcher>,
    pub aggregation: AggregationEngine,
    pub publisher: Arc<dyn LeaderboardPublisher>,
    pub clock: Arc<dyn Clock>,
    pub default_channel_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MonthlyUpdateForm {
    pub channel: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MonthlyUpdateResponse {
    pub status: &'static str,
    pub channel: String,
    pub period: MonthPeriod,
    pub ts: Option<String>,
    pub correlation_id: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub detail: String,
    pub correlation_id: String,
}

/// [`InterfaceError`] rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub InterfaceError);

impl From<InterfaceError> for ApiError {
    fn from(value: InterfaceError) -> Self {
        Self(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self.0 {
            InterfaceError::BadRequest { message, .. } => (StatusCode::BAD_REQUEST, message),
            InterfaceError::NotFound { message, .. } => (StatusCode::NOT_FOUND, message),
            InterfaceError::ServiceUnavailable { message, .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, message)
            }
            InterfaceError::Internal { message, .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        };
        let body = ErrorBody {
            error: self.0.user_message(),
            detail: detail.clone(),
            correlation_id: self.0.correlation_id().to_owned(),
        };
        (status, Json(body)).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/slack/events", post(slack_events))
        .route("/events", post(slack_events))
        .route("/slack/monthly-update", post(monthly_update))
        .with_state(state)
}

pub async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "not found\n")
}

pub async fn slack_events(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let now_unix = state.clock.now().timestamp();

    if let Err(rejection) = state.verifier.verify(
        header_str(&headers, TIMESTAMP_HEADER),
        header_str(&headers, SIGNATURE_HEADER),
        &body,
        now_unix,
    ) {
        warn!(
            event_name = "slack.events.rejected",
            reason = %rejection,
            "slack request failed signature verification"
        );
        let status =
            if rejection.is_malformed() { StatusCode::BAD_REQUEST } else { StatusCode::UNAUTHORIZED };
        return (status, rejection.to_string()).into_response();
    }

    let envelope = match parse_payload(&body) {
        Ok(envelope) => envelope,
        Err(parse_error) => {
            warn!(
                event_name = "slack.events.unparseable",
                error = %parse_error,
                "slack payload could not be parsed"
            );
            return (StatusCode::BAD_REQUEST, parse_error.to_string()).into_response();
        }
    };

    let ctx = EventContext {
        correlation_id: envelope
            .event_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
    };

    match state.dispatcher.dispatch(&envelope, &ctx).await {
        Ok(HandlerResult::Challenge(challenge)) => {
            (StatusCode::OK, [(header::CONTENT_TYPE, "text/plain")], challenge).into_response()
        }
        Ok(HandlerResult::Processed | HandlerResult::Ignored) => StatusCode::OK.into_response(),
        Err(dispatch_error) => {
            // Slack retries anything but 2xx; a failed reconcile is logged, not replayed.
            error!(
                event_name = "slack.events.dispatch_failed",
                correlation_id = %ctx.correlation_id,
                error = %dispatch_error,
                "slack event could not be processed"
            );
            StatusCode::OK.into_response()
        }
    }
}

pub async fn monthly_update(
    State(state): State<AppState>,
    Form(form): Form<MonthlyUpdateForm>,
) -> Result<Json<MonthlyUpdateResponse>, ApiError> {
    let correlation_id = Uuid::new_v4().to_string();

    let period = match non_blank(form.date.as_deref()) {
        Some(raw) => raw
            .parse::<MonthPeriod>()
            .map_err(|error| ApplicationError::from(error).into_interface(&correlation_id))?,
        None => MonthPeriod::containing(state.clock.now()),
    };

    let channel = non_blank(form.channel.as_deref())
        .or_else(|| non_blank(state.default_channel_id.as_deref()))
        .map(str::to_owned)
        .ok_or_else(|| InterfaceError::BadRequest {
            message: "no `channel` given and slack.default_channel_id is not configured"
                .to_owned(),
            correlation_id: correlation_id.clone(),
        })?;

    let leaderboard = state
        .aggregation
        .require_leaderboard(&period)
        .await
        .map_err(|error| ApplicationError::from(error).into_interface(&correlation_id))?;

    let receipt = state.publisher.publish(&channel, &leaderboard).await.map_err(|error| {
        warn!(
            event_name = "slack.monthly_update.publish_failed",
            correlation_id = %correlation_id,
            channel_id = %channel,
            error = %error,
            "leaderboard could not be published"
        );
        publish_failure(error).into_interface(&correlation_id)
    })?;

    info!(
        event_name = "slack.monthly_update.published",
        correlation_id = %correlation_id,
        channel_id = %receipt.channel,
        period = %period,
        "published monthly update"
    );

    Ok(Json(MonthlyUpdateResponse {
        status: "published",
        channel: receipt.channel,
        period,
        ts: receipt.ts,
        correlation_id,
    }))
}

fn publish_failure(error: PublishError) -> ApplicationError {
    match error {
        PublishError::InvalidRequest(message) => {
            ApplicationError::Domain(DomainError::InvariantViolation(message))
        }
        other if other.is_credential_failure() => ApplicationError::Configuration(format!(
            "slack.bot_token was refused: {other}"
        )),
        other => ApplicationError::Integration(other.to_string()),
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
