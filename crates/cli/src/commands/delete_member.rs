use tally_core::domain::member::MemberId;
use tally_core::errors::StoreError;
use tally_core::stats::store::MemberStore;
use tally_db::SqlMemberRepository;

use crate::commands::{
    load_config, open_pool, runtime, CommandResult, Failure, EXIT_NOT_FOUND, EXIT_STORE,
};

pub fn run(id: i64) -> CommandResult {
    let config = match load_config("delete-member") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match runtime("delete-member") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = open_pool(&config).await?;
        let repository = SqlMemberRepository::new(pool.clone());
        let deleted = repository.delete(MemberId(id)).await;
        pool.close().await;

        deleted.map_err(|error| match error {
            StoreError::NotFound(message) => ("not_found", message, EXIT_NOT_FOUND),
            other => ("store", other.to_string(), EXIT_STORE),
        })?;
        Ok::<(), Failure>(())
    });

    match result {
        Ok(()) => CommandResult::success("delete-member", format!("deleted member {id}")),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("delete-member", error_class, message, exit_code)
        }
    }
}
