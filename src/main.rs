use clap::Parser;
use nu_ansi_term::Color;
use pgsh::cli::Args;
use pgsh::db::{ConnectionHandle, Session};
use pgsh::{logging, repl, Config};
use std::error::Error as StdError;
use std::process::ExitCode;
use tracing::debug;

async fn async_main() -> Result<(), Box<dyn StdError>> {
    let args = Args::parse();
    let config = Config::load();
    let _log_guard = logging::init();
    debug!(?args, "pgsh started");

    let params = args.connection_params()?;
    let database = params.database.clone();

    // Initial connection failure is fatal; the loop is never entered.
    let handle = ConnectionHandle::open(params).await?;

    let session = Session::new(handle, config.expanded_display_default);

    if !args.command.is_empty() {
        return repl::run_batch(session, &args.command).await;
    }

    if config.show_banner {
        println!("pgsh: connected to database \"{database}\".");
        println!("Type \\h for help, \\q to quit.");
    }

    repl::run(session, &config).await
}

fn main() -> ExitCode {
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(async_main());
    runtime.shutdown_timeout(std::time::Duration::from_secs(2));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", Color::Red.paint(format!("pgsh: {e}")));
            ExitCode::FAILURE
        }
    }
}
