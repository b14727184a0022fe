use anyhow::Result;
use clap::Parser;
use tracing::debug;

use contrastverify_core::{
    render_summary_markdown, resolve_config, verify_application, AppResolver, EnvSource,
    OutputHelper, TeamServerApi, TeamServerClient,
};

#[derive(Parser)]
#[command(name = "contrastverify")]
#[command(about = "Verify an application against Contrast policy and vulnerability thresholds", long_about = None)]
struct Cli {
    /// Enable verbose (info-level) logging to stderr.
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Enable debug-level logging to stderr.
    #[arg(long, global = true)]
    debug: bool,
}

fn main() -> std::process::ExitCode {
    match run_with_args(std::env::args_os()) {
        Ok(code) => std::process::ExitCode::from(code),
        Err(err) => {
            eprintln!("{err:?}");
            std::process::ExitCode::from(1)
        }
    }
}

fn run_with_args<I, T>(args: I) -> Result<u8>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    init_logging(cli.verbose, cli.debug);

    let out = OutputHelper::from_env();
    let github_actions = OutputHelper::is_github_actions();

    let config = match resolve_config(&EnvSource) {
        Ok(config) => config,
        Err(err) => {
            out.error(&err.to_string());
            return Ok(1);
        }
    };
    out.debug(&format!("Base URL: {}", config.base_url));

    let client = match TeamServerClient::new(&config, github_actions, &out) {
        Ok(client) => client,
        Err(err) => {
            out.error(&err.to_string());
            return Ok(1);
        }
    };

    if let Err(err) = client.profile() {
        out.error(&format!(
            "Connection test failed, please verify credentials \
             (agent credentials will not work) - {err}"
        ));
        return Ok(1);
    }
    if let Err(err) = client.organizations() {
        out.error(&format!(
            "Organization test failed, please verify organization ID and credentials \
             (agent credentials will not work) - {err}"
        ));
        return Ok(1);
    }

    let mut resolver = AppResolver::new(&client, &config);
    let app_id = match resolver.resolve(&out) {
        Ok(app_id) => app_id,
        Err(err) => {
            out.error(&err.to_string());
            return Ok(1);
        }
    };

    let decision = match verify_application(&client, &config, &out, &app_id, client.origin()) {
        Ok(decision) => decision,
        Err(err) => {
            out.error(&err.to_string());
            return Ok(1);
        }
    };

    out.write_summary(&render_summary_markdown(&decision));

    if decision.passed() {
        out.info(&decision.message());
        Ok(0)
    } else {
        out.error(&decision.message());
        Ok(1)
    }
}

fn init_logging(verbose: bool, debug: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    debug!("Logging initialized at level: {}", level);
}
