use std::path::PathBuf;

use crate::cli::Cli;

/// Run configuration, resolved once from the command line and never changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub item_query: String,
    pub store_path: PathBuf,
    pub fuzzy: bool,
    pub no_prompt: bool,
    pub find_mode: bool,
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Self {
            item_query: cli.item,
            store_path: expand_path(&cli.path),
            fuzzy: cli.fuzzy,
            no_prompt: cli.no_prompt,
            find_mode: cli.find,
        }
    }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).into_owned())
}
