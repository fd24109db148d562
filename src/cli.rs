use clap::Parser;

/// Keychain location used when neither `--path` nor the environment names one.
pub const DEFAULT_KEYCHAIN_PATH: &str = "~/.onepass/keychain";

/// Environment variable that overrides the default keychain location.
pub const KEYCHAIN_ENV: &str = "ONEPASSWORD_KEYCHAIN";

#[derive(Parser, Debug)]
#[command(
    name = "onepass",
    about = "Print the password of a keychain item, or list the items matching a query.",
    version
)]
pub struct Cli {
    /// The name of the item to look up.
    pub item: String,

    /// Path to the keychain directory.
    #[arg(long, env = KEYCHAIN_ENV, default_value = DEFAULT_KEYCHAIN_PATH)]
    pub path: String,

    /// Accept close but inexact item names.
    #[arg(long)]
    pub fuzzy: bool,

    /// Read the master password from standard input instead of prompting.
    #[arg(long)]
    pub no_prompt: bool,

    /// List every item matching the query along with its details.
    #[arg(long)]
    pub find: bool,
}
