use std::time::Duration;

use crate::commands::{runtime, CommandResult, Failure, EXIT_REMOTE};

pub fn run(address: &str) -> CommandResult {
    let runtime = match runtime("ping") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };
    let url = format!("{}/ping", address.trim_end_matches('/'));

    let result = runtime.block_on(async {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .map_err(|error| ("http_client", error.to_string(), EXIT_REMOTE))?;
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|error| ("server_unreachable", error.to_string(), EXIT_REMOTE))?;

        let status = response.status();
        if !status.is_success() {
            return Err(("unexpected_status", format!("unexpected status code: {status}"), EXIT_REMOTE));
        }
        let body = response.text().await.unwrap_or_default();
        Ok::<String, Failure>(body.trim().to_string())
    });

    match result {
        Ok(body) => CommandResult::success("ping", body),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("ping", error_class, message, exit_code)
        }
    }
}
