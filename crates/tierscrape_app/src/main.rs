use std::io::Write;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use engine_logging::{engine_error, engine_info};
use tierscrape_app::{render_handoff, Cli};
use tierscrape_core::{FatalError, RunReport, ScrapeConfig, GRACE_DELAY};
use tierscrape_engine::{run_blocking, ScrapeEngine};

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = engine_logging::initialize(cli.verbosity()) {
        eprintln!("tierscrape: cannot initialize logging: {err}");
    }

    let config = match cli.scrape_config() {
        Ok(config) => config,
        Err(err) => return fail(FatalError::Input(err)),
    };

    engine_info!("scraping {} as {}", config.url(), config.browser());
    let engine = ScrapeEngine::new(cli.fetch_settings(), cli.render_settings());
    let report = match run_blocking(engine, config.clone()) {
        Ok(report) => report,
        Err(fatal) => return fail(fatal),
    };

    match print_handoff(&report, &config, cli.json) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            engine_error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn print_handoff(report: &RunReport, config: &ScrapeConfig, json: bool) -> anyhow::Result<()> {
    let out = render_handoff(report, config, json).context("encoding result")?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{out}").context("writing result to stdout")?;
    stdout.flush().context("flushing stdout")?;
    Ok(())
}

/// Logs the fatal error and gives diagnostics a moment to flush before exiting.
fn fail(fatal: FatalError) -> ExitCode {
    engine_error!("{fatal}");
    if !matches!(fatal, FatalError::Input(_)) {
        std::thread::sleep(GRACE_DELAY);
    }
    log::logger().flush();
    ExitCode::from(u8::try_from(fatal.exit_code()).unwrap_or(1))
}
