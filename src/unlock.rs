//! Getting from a locked keychain to an unlocked one.
//!
//! Both input paths feed the same loop: a password source yields candidate
//! passwords and the keychain accepts or rejects each one. Standard input
//! yields exactly one candidate, so a rejection there is final. The terminal
//! prompt yields candidates until one is accepted or the user cancels; there
//! is deliberately no attempt limit, and no failure message on that path.

use std::io::{self, Read};

use anyhow::{Context, Result};
use secrecy::SecretString;
use tracing::{debug, info};
use zeroize::Zeroize;

use crate::interrupt::InterruptGuard;
use crate::keychain::{Keychain, Unlock};

pub const PROMPT: &str = "Master password: ";

/// Reads a password without echoing it.
pub trait Prompter {
    fn prompt_password(&mut self, prompt: &str) -> io::Result<String>;
}

impl<P: Prompter + ?Sized> Prompter for &mut P {
    fn prompt_password(&mut self, prompt: &str) -> io::Result<String> {
        (**self).prompt_password(prompt)
    }
}

/// The controlling terminal. The prompt is written to the tty, not stdout.
pub struct Terminal;

impl Prompter for Terminal {
    fn prompt_password(&mut self, prompt: &str) -> io::Result<String> {
        let _guard = InterruptGuard::arm();
        rpassword::prompt_password(prompt)
    }
}

/// Where candidate master passwords come from. Chosen once per run.
pub enum PasswordSource<R, P> {
    /// The whole stream, trimmed, tried once.
    Stdin(R),
    /// Interactive prompt, repeated until the keychain unlocks.
    Prompt(P),
}

/// Where unlocking ended up. The keychain stays `Locked` only inside
/// [`unlock`], so every value here is terminal.
pub enum UnlockState<U> {
    Unlocked(U),
    Failed,
    Cancelled,
}

enum Candidate {
    Password(SecretString),
    Exhausted,
    Cancelled,
}

enum Candidates<R, P> {
    Stdin(Option<R>),
    Prompt(P),
}

impl<R, P> From<PasswordSource<R, P>> for Candidates<R, P> {
    fn from(source: PasswordSource<R, P>) -> Self {
        match source {
            PasswordSource::Stdin(reader) => Candidates::Stdin(Some(reader)),
            PasswordSource::Prompt(prompter) => Candidates::Prompt(prompter),
        }
    }
}

impl<R: Read, P: Prompter> Candidates<R, P> {
    fn next(&mut self) -> Result<Candidate> {
        match self {
            Candidates::Stdin(reader) => {
                let Some(mut reader) = reader.take() else {
                    return Ok(Candidate::Exhausted);
                };
                let mut raw = String::new();
                reader
                    .read_to_string(&mut raw)
                    .context("Failed to read master password from standard input")?;
                let password = SecretString::new(raw.trim().to_string());
                raw.zeroize();
                Ok(Candidate::Password(password))
            }
            Candidates::Prompt(prompter) => match prompter.prompt_password(PROMPT) {
                Ok(password) => Ok(Candidate::Password(SecretString::new(password))),
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::Interrupted | io::ErrorKind::UnexpectedEof
                    ) =>
                {
                    Ok(Candidate::Cancelled)
                }
                Err(e) => Err(e).context("Failed to read master password"),
            },
        }
    }
}

/// Drive `keychain` from locked to a terminal state.
pub fn unlock<K, R, P>(
    keychain: K,
    source: PasswordSource<R, P>,
) -> Result<UnlockState<K::Unlocked>>
where
    K: Keychain,
    R: Read,
    P: Prompter,
{
    let mut candidates = Candidates::from(source);
    let mut keychain = keychain;
    let mut attempts = 0usize;

    loop {
        let password = match candidates.next()? {
            Candidate::Password(password) => password,
            Candidate::Exhausted => return Ok(UnlockState::Failed),
            Candidate::Cancelled => {
                debug!(attempts, "password prompt cancelled");
                return Ok(UnlockState::Cancelled);
            }
        };

        attempts += 1;
        keychain = match keychain
            .unlock(&password)
            .context("Failed to unlock keychain")?
        {
            Unlock::Unlocked(open) => {
                debug!(attempts, "keychain unlocked");
                return Ok(UnlockState::Unlocked(open));
            }
            Unlock::Locked(keychain) => {
                info!(attempts, "master password rejected");
                keychain
            }
        };
    }
}
