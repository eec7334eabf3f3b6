use std::sync::Arc;

use tally_core::clock::{Clock, SystemClock};
use tally_core::domain::leaderboard::Leaderboard;
use tally_core::domain::member::CounterKind;
use tally_core::domain::period::MonthPeriod;
use tally_core::stats::leaderboard::AggregationEngine;
use tally_db::{migrations, SqlMemberRepository};

use crate::commands::{
    load_config, open_pool, runtime, CommandResult, Failure, EXIT_MIGRATION, EXIT_STORE,
};

pub fn run(date: Option<MonthPeriod>) -> CommandResult {
    let config = match load_config("leaderboard") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match runtime("leaderboard") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };
    let period = date.unwrap_or_else(|| MonthPeriod::containing(SystemClock.now()));

    let result = runtime.block_on(async {
        let pool = open_pool(&config).await?;
        let migrated = migrations::schema_present(&pool)
            .await
            .map_err(|error| ("store", error.to_string(), EXIT_STORE))?;
        if !migrated {
            pool.close().await;
            return Err((
                "migration",
                "member table missing; run `tally migrate` first".to_string(),
                EXIT_MIGRATION,
            ));
        }

        let engine = AggregationEngine::new(Arc::new(SqlMemberRepository::new(pool.clone())));
        let leaderboard = engine
            .leaderboard(&period)
            .await
            .map_err(|error| ("store", error.to_string(), EXIT_STORE))?;
        pool.close().await;
        Ok::<Leaderboard, Failure>(leaderboard)
    });

    match result {
        Ok(leaderboard) => CommandResult::success_with_data(
            "leaderboard",
            summarize(&leaderboard),
            serde_json::to_value(&leaderboard).ok(),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("leaderboard", error_class, message, exit_code)
        }
    }
}

fn summarize(leaderboard: &Leaderboard) -> String {
    if leaderboard.is_empty() {
        return format!("no members recorded for {}", leaderboard.period.label());
    }

    let parts: Vec<String> = CounterKind::ALL
        .iter()
        .map(|kind| {
            let leaders: Vec<&str> = leaderboard
                .leaders(*kind)
                .iter()
                .map(|member| member.slack_uid.as_str())
                .collect();
            let value = leaderboard.leading_value(*kind).unwrap_or_default();
            format!("{}: {} ({value})", kind.as_str(), leaders.join(", "))
        })
        .collect();

    format!("{}: {}", leaderboard.period.label(), parts.join("; "))
}
