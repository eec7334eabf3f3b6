use std::time::Duration;

use serde_json::Value;
use tally_core::domain::period::MonthPeriod;

use crate::commands::{runtime, CommandResult, Failure, EXIT_NOT_FOUND, EXIT_REMOTE};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub fn run(address: &str, channel: Option<&str>, date: Option<MonthPeriod>) -> CommandResult {
    let runtime = match runtime("monthly-update") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let url = format!("{}/slack/monthly-update", address.trim_end_matches('/'));
    let mut form: Vec<(&str, String)> = Vec::new();
    if let Some(channel) = channel {
        form.push(("channel", channel.to_string()));
    }
    if let Some(date) = date {
        form.push(("date", date.to_string()));
    }

    let result = runtime.block_on(async {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|error| ("http_client", error.to_string(), EXIT_REMOTE))?;
        let response = client
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|error| ("server_unreachable", error.to_string(), EXIT_REMOTE))?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        if status.is_success() {
            return Ok::<Value, Failure>(body);
        }

        let detail = body["detail"].as_str().unwrap_or("no detail").to_string();
        let exit_code =
            if status == reqwest::StatusCode::NOT_FOUND { EXIT_NOT_FOUND } else { EXIT_REMOTE };
        Err(("server_rejected", format!("server answered {status}: {detail}"), exit_code))
    });

    match result {
        Ok(body) => {
            let channel = body["channel"].as_str().unwrap_or("<unknown>").to_string();
            CommandResult::success_with_data(
                "monthly-update",
                format!("published monthly update to {channel}"),
                Some(body),
            )
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("monthly-update", error_class, message, exit_code)
        }
    }
}
