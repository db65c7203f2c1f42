pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "punchclock",
    about = "Punchclock operator CLI",
    long_about = "Inspect punchclock configuration, readiness, and the persisted attendance ledger.",
    after_help = "Examples:\n  punchclock doctor --json\n  punchclock config\n  punchclock ranking\n  punchclock total C0123456789"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, Slack token readiness, and ledger document readability")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Render the leaderboard from the persisted ledger document")]
    Ranking,
    #[command(about = "Show one worker's accumulated total and session state")]
    Total {
        #[arg(help = "Worker channel id")]
        channel: String,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Ranking => commands::ranking::run(),
        Command::Total { channel } => commands::total::run(&channel),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
