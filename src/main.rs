use std::process::ExitCode;

use quire::cli::{self, Cli};
use quire::engine::QuireError;
use quire::ui::output::{self, Verbosity};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    let verbosity = Verbosity::from_flags(cli.quiet, cli.debug);
    let json = cli.json;

    // RUST_LOG overrides the flag-derived level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.log_filter()));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err, json);
            ExitCode::FAILURE
        }
    }
}

fn report_error(err: &anyhow::Error, json: bool) {
    let quire_err = err.downcast_ref::<QuireError>();
    if json {
        let body = serde_json::json!({
            "error": {
                "kind": quire_err.map_or("internal", QuireError::kind),
                "message": err.to_string(),
                "conflicts": quire_err.and_then(QuireError::conflicts),
            }
        });
        if output::json(&body).is_ok() {
            return;
        }
    }
    output::error(format!("{err:#}"));
}
