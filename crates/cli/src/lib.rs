pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tally_core::domain::period::MonthPeriod;

#[derive(Debug, Parser)]
#[command(
    name = "tally",
    about = "Tally operator CLI",
    long_about = "Operate the tally reaction statistics service: migrations, config inspection, readiness checks, leaderboards, and monthly updates.",
    after_help = "Examples:\n  tally doctor --json\n  tally leaderboard --date 10-2023\n  tally monthly-update http://localhost:8080 --channel C0123456789\n  tally ping http://localhost:8080"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, Slack credentials, DB connectivity, and schema")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Print the most liked and most disliked members of a month")]
    Leaderboard {
        #[arg(long, value_name = "MM-YYYY", help = "Month to report (defaults to the current month)")]
        date: Option<MonthPeriod>,
    },
    #[command(about = "Delete one member record by id")]
    DeleteMember {
        #[arg(long)]
        id: i64,
    },
    #[command(about = "Ask a running server to publish a monthly leaderboard to Slack")]
    MonthlyUpdate {
        #[arg(help = "Base URL of the server, e.g. http://localhost:8080")]
        address: String,
        #[arg(long, help = "Slack channel id (defaults to slack.default_channel_id)")]
        channel: Option<String>,
        #[arg(long, value_name = "MM-YYYY", help = "Month to publish (defaults to the current month)")]
        date: Option<MonthPeriod>,
    },
    #[command(about = "Check that a server answers /ping")]
    Ping {
        #[arg(help = "Base URL of the server, e.g. http://localhost:8080")]
        address: String,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Leaderboard { date } => commands::leaderboard::run(date),
        Command::DeleteMember { id } => commands::delete_member::run(id),
        Command::MonthlyUpdate { address, channel, date } => {
            commands::monthly_update::run(&address, channel.as_deref(), date)
        }
        Command::Ping { address } => commands::ping::run(&address),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
