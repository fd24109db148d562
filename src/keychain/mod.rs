pub mod matching;
pub mod sealed;

use std::collections::BTreeMap;
use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::error::KeychainError;

pub type Result<T> = std::result::Result<T, KeychainError>;

/// Result of an unlock attempt. A rejected password hands the locked
/// keychain back so the caller can try again.
pub enum Unlock<L, U> {
    Unlocked(U),
    Locked(L),
}

/// A locked credential store. Commands only ever see it through this trait.
pub trait Keychain: Sized {
    type Unlocked: UnlockedKeychain;

    /// Consume the locked handle and try `password`. `Err` means the store
    /// itself could not be read; a wrong password is `Ok(Unlock::Locked(_))`.
    fn unlock(self, password: &SecretString) -> Result<Unlock<Self, Self::Unlocked>>;
}

/// Query surface of an unlocked store. Only reachable through [`Keychain::unlock`].
pub trait UnlockedKeychain {
    /// All entries whose name or detail values contain `query`, in store order.
    fn find(&self, query: &str) -> Result<Vec<Entry>>;

    /// Best entry whose name scores at least `fuzzy_threshold` (0-100) against
    /// `query`. 100 means exact match only.
    fn item(&self, query: &str, fuzzy_threshold: u8) -> Result<Option<Entry>>;
}

/// A single credential record.
#[derive(Deserialize)]
pub struct Entry {
    pub name: String,
    #[serde(default)]
    pub details: BTreeMap<String, String>,
    pub password: SecretString,
}

impl Entry {
    pub fn new(name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            details: BTreeMap::new(),
            password: SecretString::new(password.into()),
        }
    }

    pub fn with_detail(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(field.into(), value.into());
        self
    }
}

impl Clone for Entry {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            details: self.details.clone(),
            password: SecretString::new(self.password.expose_secret().clone()),
        }
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("name", &self.name)
            .field("details", &self.details)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// In-memory collaborator that accepts one password after a fixed number of
/// rejections and records every call made against it.
#[cfg(test)]
pub(crate) mod scripted {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[derive(Default, Debug)]
    pub struct Calls {
        pub unlocks: Vec<String>,
        pub finds: Vec<String>,
        pub items: Vec<(String, u8)>,
    }

    pub struct ScriptedKeychain {
        /// Number of attempts rejected before the next one is accepted.
        /// `None` rejects every attempt.
        pub reject: Option<usize>,
        pub entries: Vec<Entry>,
        pub calls: Rc<RefCell<Calls>>,
    }

    impl ScriptedKeychain {
        pub fn accepting_after(reject: usize, entries: Vec<Entry>) -> Self {
            Self {
                reject: Some(reject),
                entries,
                calls: Rc::default(),
            }
        }

        pub fn rejecting() -> Self {
            Self {
                reject: None,
                entries: Vec::new(),
                calls: Rc::default(),
            }
        }
    }

    pub struct ScriptedUnlocked {
        entries: Vec<Entry>,
        calls: Rc<RefCell<Calls>>,
    }

    impl Keychain for ScriptedKeychain {
        type Unlocked = ScriptedUnlocked;

        fn unlock(mut self, password: &SecretString) -> Result<Unlock<Self, ScriptedUnlocked>> {
            self.calls
                .borrow_mut()
                .unlocks
                .push(password.expose_secret().clone());
            match self.reject {
                Some(0) => Ok(Unlock::Unlocked(ScriptedUnlocked {
                    entries: self.entries,
                    calls: self.calls,
                })),
                Some(n) => {
                    self.reject = Some(n - 1);
                    Ok(Unlock::Locked(self))
                }
                None => Ok(Unlock::Locked(self)),
            }
        }
    }

    impl UnlockedKeychain for ScriptedUnlocked {
        fn find(&self, query: &str) -> Result<Vec<Entry>> {
            self.calls.borrow_mut().finds.push(query.to_string());
            Ok(self
                .entries
                .iter()
                .filter(|e| matching::matches(query, e))
                .cloned()
                .collect())
        }

        fn item(&self, query: &str, fuzzy_threshold: u8) -> Result<Option<Entry>> {
            self.calls
                .borrow_mut()
                .items
                .push((query.to_string(), fuzzy_threshold));
            Ok(matching::best_match(query, &self.entries, fuzzy_threshold)
                .map(|idx| self.entries[idx].clone()))
        }
    }
}
