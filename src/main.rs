use clap::Parser;
use pockit::args::{Args, BudgetCommand, Command};
use pockit::{commands, Config, Mode, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().pockit_home().path();

    // This allows for running the program without a backend. When POCKIT_IN_TEST_MODE is set and
    // non-zero in length, then the mode will be Mode::Test, otherwise it will be Mode::Http.
    let mode = Mode::from_env();

    // Route to appropriate command handler
    let _: () = match args.command() {
        Command::Init(init_args) => commands::init(home, init_args.api_url()).await?.print(),

        Command::Login(login_args) => {
            let config = Config::load(home).await?;
            commands::login(
                &config,
                login_args.id(),
                login_args.email(),
                login_args.token(),
            )
            .await?
            .print()
        }

        Command::Logout => commands::logout(&Config::load(home).await?).await?.print(),

        Command::Dashboard(dashboard_args) => {
            let config = Config::load(home).await?;
            commands::dashboard(config, mode, dashboard_args.month())
                .await?
                .print()
        }

        Command::Budget(budget_args) => {
            let config = Config::load(home).await?;
            match budget_args.command() {
                BudgetCommand::Set(set_args) => {
                    commands::budget_set(config, mode, set_args.amount())
                        .await?
                        .print()
                }
            }
        }

        Command::Transactions(list_args) => {
            let config = Config::load(home).await?;
            commands::transactions(config, mode, list_args.clone())
                .await?
                .print()
        }

        Command::Export(export_args) => {
            let config = Config::load(home).await?;
            commands::export(config, mode, export_args.clone())
                .await?
                .print()
        }
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_CRATE_NAME"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
