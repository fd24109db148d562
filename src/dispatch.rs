use anyhow::{Context, Result};
use tracing::debug;

use crate::config::Config;
use crate::keychain::UnlockedKeychain;
use crate::output::Outcome;

/// Similarity cutoff for `--fuzzy` lookups.
pub const FUZZY_THRESHOLD: u8 = 70;
/// Cutoff that only accepts an exact name.
pub const EXACT_THRESHOLD: u8 = 100;

/// The one query a run sends to the keychain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query<'a> {
    Find(&'a str),
    Item { name: &'a str, fuzzy_threshold: u8 },
}

pub fn fuzzy_threshold(fuzzy: bool) -> u8 {
    if fuzzy {
        FUZZY_THRESHOLD
    } else {
        EXACT_THRESHOLD
    }
}

impl Config {
    pub fn query(&self) -> Query<'_> {
        if self.find_mode {
            Query::Find(&self.item_query)
        } else {
            Query::Item {
                name: &self.item_query,
                fuzzy_threshold: fuzzy_threshold(self.fuzzy),
            }
        }
    }
}

/// Send `query` to the unlocked keychain and turn the answer into an outcome.
pub fn dispatch<U: UnlockedKeychain>(keychain: &U, query: Query<'_>) -> Result<Outcome> {
    match query {
        Query::Find(text) => {
            let entries = keychain.find(text).context("Failed to search keychain")?;
            debug!(matches = entries.len(), "find finished");
            Ok(Outcome::SuccessListing(entries))
        }
        Query::Item {
            name,
            fuzzy_threshold,
        } => {
            debug!(fuzzy_threshold, "looking up single item");
            let item = keychain
                .item(name, fuzzy_threshold)
                .context("Failed to look up item")?;
            Ok(match item {
                Some(entry) => Outcome::Success(entry.password),
                None => Outcome::NotFound(name.to_string()),
            })
        }
    }
}
