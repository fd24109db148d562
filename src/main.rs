use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use onepass::cli::Cli;
use onepass::config::Config;
use onepass::keychain::sealed::SealedKeychain;
use onepass::output::{self, Status};
use onepass::unlock::{PasswordSource, Terminal};

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version land here too and are not failures.
            let _ = err.print();
            return if err.use_stderr() {
                Status::Usage.into()
            } else {
                Status::Success.into()
            };
        }
    };

    let filter =
        EnvFilter::try_from_env("ONEPASS_LOG").unwrap_or_else(|_| EnvFilter::new("onepass=warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .without_time(),
        )
        .init();

    let config = Config::from(cli);
    match execute(&config) {
        Ok(status) => status.into(),
        Err(err) => {
            output::error(&mut io::stderr(), &format!("{:#}", err));
            Status::Failure.into()
        }
    }
}

fn execute(config: &Config) -> Result<Status> {
    debug!(path = %config.store_path.display(), "opening keychain");
    let keychain = SealedKeychain::open(&config.store_path).context("Failed to open keychain")?;

    let source = if config.no_prompt {
        PasswordSource::Stdin(io::stdin().lock())
    } else {
        PasswordSource::Prompt(Terminal)
    };

    let stdout = io::stdout();
    let stderr = io::stderr();
    onepass::run(config, keychain, source, &mut stdout.lock(), &mut stderr.lock())
}
