use clap::Parser;
use minder_cli::cli::{Cli, Command, collect_config_overrides};
use minder_cli::runtime::{self, normalize_parse_error};
use minder_cli::session::AppSession;
use minder_core::config::{Config, load_config_with_fallback, merge_overrides};
use minder_core::error::AppError;
use minder_core::reminder::SystemClock;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

const LOG_ENV_VAR: &str = "MINDER_LOG";

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn effective_config(cli: &Cli) -> Result<Config, AppError> {
    let loaded = load_config_with_fallback();
    if let Some(err) = loaded.error {
        warn!(error = %err, "using default configuration");
    }
    let overrides =
        collect_config_overrides(&cli.config_override).map_err(AppError::invalid_input)?;
    merge_overrides(&loaded.config, &overrides)
}

fn run(cli: Cli, clock: SystemClock) -> Result<(), AppError> {
    let config = effective_config(&cli)?;
    let mut session = AppSession::open(config, clock)?;

    match cli.command {
        None => block_on(runtime::run_interactive(&mut session)),
        Some(Command::Watch {
            rescan_secs,
            exit_when_idle,
        }) => block_on(runtime::run_watch(
            &mut session,
            (rescan_secs > 0).then(|| Duration::from_secs(rescan_secs)),
            exit_when_idle,
        )),
        Some(_) => runtime::run_command(&mut session, cli),
    }
}

fn block_on<F>(future: F) -> Result<(), AppError>
where
    F: std::future::Future<Output = Result<(), AppError>>,
{
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = rt.block_on(future);
    // A pending stdin read would otherwise keep the process alive.
    rt.shutdown_background();
    result
}

fn main() {
    // The local offset can only be read while the process is single-threaded.
    let clock = SystemClock::local();
    init_tracing();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            if !err.use_stderr() {
                let _ = err.print();
                return;
            }
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    if let Err(err) = run(cli, clock) {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
