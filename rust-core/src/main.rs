use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use sonic_analyzer::audio::{self, AudioError};
use sonic_analyzer::config::{AnalysisConfig, Cli, Command};
use sonic_analyzer::pipeline::{self, PipelineError};

/// Primary recording missing: nothing to analyze
const EXIT_PRIMARY_MISSING: u8 = 2;
/// Invalid analysis parameters: rejected before loading
const EXIT_BAD_CONFIG: u8 = 3;
/// A stage failed; produced figures were still written
const EXIT_FAILURE: u8 = 1;

fn banner() {
    log::info!(
        "{} {} ({}-{})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    );
    log::info!("Log level: {}", log::max_level());
}

fn probe(paths: &[PathBuf]) -> ExitCode {
    let mut failed = false;

    for path in paths {
        println!("{} exists: {}", path.display(), path.exists());
        let info = match audio::probe(path) {
            Ok(info) => info,
            Err(AudioError::FileMissing(_)) => continue,
            Err(err) => {
                let err = anyhow::Error::new(err).context(format!("Error reading {}", path.display()));
                log::error!("{:#}", err);
                failed = true;
                continue;
            }
        };

        println!("Successfully read {}:", path.display());
        println!("  Sample rate: {} Hz", info.sample_rate);
        println!("  Samples: {}", info.frames);
        println!("  Duration: {:.2} seconds", info.duration_secs());
        println!("  Channels: {}", info.channels);
        println!("  Data type: {}", info.format_name());
    }

    if failed {
        ExitCode::from(EXIT_FAILURE)
    } else {
        ExitCode::SUCCESS
    }
}

fn compare(config: &AnalysisConfig) -> ExitCode {
    log::info!("Checking for audio files:");
    log::info!("  {} exists: {}", config.primary.display(), config.primary.exists());
    log::info!("  {} exists: {}", config.secondary.display(), config.secondary.exists());

    let outcome = match pipeline::run(config) {
        Ok(outcome) => outcome,
        Err(err @ PipelineError::PrimaryMissing(_)) => {
            log::error!("{}", err);
            log::error!(
                "Please make sure {} is present, or pass --primary <PATH>.",
                config.primary.display()
            );
            return ExitCode::from(EXIT_PRIMARY_MISSING);
        }
        Err(err @ PipelineError::Config(_)) => {
            log::error!("{}", err);
            return ExitCode::from(EXIT_BAD_CONFIG);
        }
        Err(err) => {
            log::error!("{:#}", anyhow::Error::new(err).context("Analysis aborted"));
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    if outcome.secondary_substituted {
        log::warn!(
            "{} was replaced by silence; its curves are flat",
            outcome.secondary.label()
        );
    }
    for path in &outcome.report.written {
        log::info!("  {}", path.display());
    }

    if outcome.is_clean() {
        log::info!("Comparison completed successfully!");
        ExitCode::SUCCESS
    } else {
        log::error!(
            "Comparison finished with {} failed stage(s); produced figures were still rendered",
            outcome.failures.len()
        );
        for err in outcome.failures {
            log::error!("{:#}", anyhow::Error::new(err));
        }
        ExitCode::from(EXIT_FAILURE)
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    banner();

    let cli = Cli::parse();
    let code = match cli.into_command() {
        Command::Compare(config) => compare(&config),
        Command::Probe { paths } => probe(&paths),
    };

    log::info!("End of execution.");
    code
}

