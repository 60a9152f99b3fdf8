use attendance_report::args::{Args, Command};
use attendance_report::{commands, Config, ErrorType, IntoResult, Mode, Result};
use clap::Parser;
use std::path::Path;
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
    let home = args.common().attendance_home().path();

    // This allows for running the program without an analyzer server. When
    // ATTENDANCE_IN_TEST_MODE is set and non-empty, the mode will be Mode::Test, otherwise it
    // will be Mode::Http.
    let mode = Mode::from_env();

    let _: () = match args.command() {
        Command::Init(init_args) => commands::init(home, init_args.api_url()).await?.print(),

        Command::Records(records_args) => {
            let config = load_config(home).await?;
            commands::records(&config, mode, records_args).await?.print()
        }

        Command::Export(export_args) => {
            let config = load_config(home).await?;
            commands::export(&config, mode, export_args).await?.print()
        }

        Command::Upload(upload_args) => {
            let config = load_config(home).await?;
            commands::upload(&config, mode, upload_args).await?.print()
        }

        Command::Hierarchy => {
            let config = load_config(home).await?;
            commands::hierarchy(&config, mode).await?.print()
        }

        Command::Dashboard(dashboard_args) => {
            let config = load_config(home).await?;
            commands::dashboard(&config, mode, dashboard_args).await?.print()
        }
    };
    Ok(())
}

async fn load_config(home: &Path) -> Result<Config> {
    Config::load(home).await.pub_result(ErrorType::Config)
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use the given level for the library and this binary only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
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
