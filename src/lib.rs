//! Command-line lookup of passwords in an encrypted keychain.
//!
//! A run is one straight pipeline: resolve the [`config::Config`], unlock the
//! keychain ([`unlock`]), send a single query ([`dispatch`]) and render the
//! [`output::Outcome`] with its exit status.

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod interrupt;
pub mod keychain;
pub mod output;
pub mod unlock;

use std::io::{Read, Write};

use anyhow::{Context, Result};
use tracing::info;

use config::Config;
use keychain::Keychain;
use output::{Outcome, Status};
use unlock::{PasswordSource, Prompter, UnlockState};

/// Unlock `keychain`, run the configured query and write the result.
pub fn run<K, R, P>(
    config: &Config,
    keychain: K,
    source: PasswordSource<R, P>,
    out: &mut impl Write,
    err: &mut impl Write,
) -> Result<Status>
where
    K: Keychain,
    R: Read,
    P: Prompter,
{
    let outcome = match unlock::unlock(keychain, source)? {
        UnlockState::Unlocked(open) => dispatch::dispatch(&open, config.query())?,
        UnlockState::Failed => Outcome::AuthFailed,
        UnlockState::Cancelled => Outcome::Interrupted,
    };

    let status = output::render(&outcome, out, err).context("Failed to write output")?;
    info!(status = status.code(), "run finished");
    Ok(status)
}
