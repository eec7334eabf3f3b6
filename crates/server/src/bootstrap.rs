use std::sync::Arc;

use axum::Router;
use tally_core::clock::{Clock, SystemClock};
use tally_core::config::AppConfig;
use tally_core::stats::leaderboard::AggregationEngine;
use tally_core::stats::reconcile::ReconciliationEngine;
use tally_db::{connect_with_settings, migrations, DbPool, SqlMemberRepository};
use tally_slack::events::reaction_dispatcher;
use tally_slack::publisher::{PublishError, SlackWebPublisher};
use tally_slack::signature::SignatureVerifier;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::health;
use crate::routes::{self, AppState};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("slack client setup failed: {0}")]
    Publisher(#[source] PublishError),
}

impl Application {
    /// Every route the server answers, with request tracing and a 404 fallback.
    pub fn router(&self) -> Router {
        routes::router(self.state.clone())
            .merge(health::router(self.db_pool.clone()))
            .fallback(routes::not_found)
            .layer(TraceLayer::new_for_http())
    }
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = Arc::new(SqlMemberRepository::with_clock(db_pool.clone(), clock.clone()));
    let reconciliation = ReconciliationEngine::new(store.clone(), clock.clone());
    let publisher =
        SlackWebPublisher::new(config.slack.api_base_url.clone(), config.slack.bot_token.clone())
            .map_err(BootstrapError::Publisher)?;

    let state = AppState {
        verifier: Arc::new(SignatureVerifier::new(config.slack.signing_secret.clone())),
        dispatcher: Arc::new(reaction_dispatcher(Arc::new(reconciliation))),
        aggregation: AggregationEngine::new(store),
        publisher: Arc::new(publisher),
        clock,
        default_channel_id: config.slack.default_channel_id.clone(),
    };

    Ok(Application { config, db_pool, state })
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tally_core::config::{AppConfig, ConfigOverrides, LoadOptions};
    use tower::ServiceExt;

    use crate::bootstrap::{bootstrap_with_config, BootstrapError};

    fn config(database_url: &str) -> AppConfig {
        AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(database_url.to_string()),
                slack_signing_secret: Some("signing-secret".to_string()),
                slack_bot_token: Some("xoxb-test".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .expect("config should load from overrides")
    }

    #[tokio::test]
    async fn bootstrap_reports_an_unopenable_database() {
        let result = bootstrap_with_config(config("sqlite:///nonexistent/tally/tally.db")).await;

        assert!(matches!(result, Err(BootstrapError::DatabaseConnect(_))));
    }

    #[tokio::test]
    async fn bootstrap_migrates_and_serves_health() {
        let app = bootstrap_with_config(config("sqlite::memory:?cache=shared"))
            .await
            .expect("bootstrap should succeed with valid overrides");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'member'",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("member table query");
        assert_eq!(table_count, 1);

        let request = Request::builder().uri("/health").body(Body::empty()).expect("request");
        let response = app.router().oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let request = Request::builder().uri("/missing").body(Body::empty()).expect("request");
        let response = app.router().oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        app.db_pool.close().await;
    }
}
