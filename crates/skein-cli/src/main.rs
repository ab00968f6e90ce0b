use clap::Parser;
use skein_artifact::CancellationToken;
use skein_cli::commands::{self, RunStatus};
use skein_cli::{logging, Cli, Command, SkeinConfig};
use std::process::ExitCode;

/// Exit code for a run stopped by Ctrl-C
const EXIT_CANCELLED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut config = SkeinConfig::discover(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.logging.json |= cli.log_json;
    logging::init(&config.logging);

    match cli.command {
        Command::Generate(args) => {
            let cancel = CancellationToken::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("interrupt received, cancelling");
                    on_signal.cancel();
                }
            });

            let summary = commands::generate(&args, &config, &cancel).await?;
            println!("{summary}");
            Ok(match summary.status {
                RunStatus::Completed => ExitCode::SUCCESS,
                RunStatus::Cancelled => ExitCode::from(EXIT_CANCELLED),
            })
        }
        Command::Inspect(args) => {
            println!("{}", commands::inspect(&args).await?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Validate(args) => {
            println!("{}", commands::validate(&args).await?);
            Ok(ExitCode::SUCCESS)
        }
    }
}
