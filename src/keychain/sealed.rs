use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::Zeroize;

use super::{matching, Entry, Keychain, Result, Unlock, UnlockedKeychain};
use crate::error::KeychainError;

const HEADER_FILE: &str = "keychain.toml";
const ENTRIES_FILE: &str = "entries";
const FORMAT_VERSION: u32 = 1;
const KDF_NAME: &str = "argon2id";
const SALT_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

/// Plaintext header stored next to the encrypted entries.
#[derive(Debug, Serialize, Deserialize)]
pub struct Header {
    pub version: u32,
    pub kdf: String,
    pub m_cost: u32,
    pub t_cost: u32,
    pub p_cost: u32,
    /// Hex-encoded 32-byte salt for Argon2id.
    pub salt: String,
}

impl Header {
    fn new(salt_hex: String, kdf: &KdfParams) -> Self {
        Self {
            version: FORMAT_VERSION,
            kdf: KDF_NAME.into(),
            m_cost: kdf.m_cost,
            t_cost: kdf.t_cost,
            p_cost: kdf.p_cost,
            salt: salt_hex,
        }
    }

    pub fn kdf_params(&self) -> KdfParams {
        KdfParams {
            m_cost: self.m_cost,
            t_cost: self.t_cost,
            p_cost: self.p_cost,
        }
    }

    pub fn salt_bytes(&self) -> Result<Vec<u8>> {
        hex::decode(&self.salt)
            .map_err(|_| KeychainError::Config(format!("Invalid salt hex in {}", HEADER_FILE)))
    }
}

#[derive(Clone, Debug)]
pub struct KdfParams {
    pub m_cost: u32,
    pub t_cost: u32,
    pub p_cost: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            m_cost: 65536, // 64 MB
            t_cost: 3,
            p_cost: 4,
        }
    }
}

/// A keychain directory on disk: `keychain.toml` plus the AES-256-GCM
/// sealed `entries` file. This is the locked handle.
#[derive(Debug)]
pub struct SealedKeychain {
    path: PathBuf,
    header: Header,
}

/// Decrypted entries, in the order they were sealed.
pub struct OpenKeychain {
    entries: Vec<Entry>,
}

#[derive(Serialize)]
struct SealedRecord<'a> {
    name: &'a str,
    details: &'a BTreeMap<String, String>,
    password: &'a str,
}

impl SealedKeychain {
    /// Read the header of the keychain at `path`. Nothing is decrypted yet.
    pub fn open(path: &Path) -> Result<Self> {
        let header_path = path.join(HEADER_FILE);
        if !header_path.exists() {
            return Err(KeychainError::NotFound(path.to_path_buf()));
        }
        let raw = std::fs::read_to_string(&header_path)?;
        let header: Header =
            toml::from_str(&raw).map_err(|e| KeychainError::Config(e.to_string()))?;

        if header.version != FORMAT_VERSION {
            return Err(KeychainError::Config(format!(
                "Unsupported keychain version {}",
                header.version
            )));
        }
        if header.kdf != KDF_NAME {
            return Err(KeychainError::Config(format!(
                "Unsupported key derivation '{}'",
                header.kdf
            )));
        }

        debug!(path = %path.display(), "opened keychain header");
        Ok(Self {
            path: path.to_path_buf(),
            header,
        })
    }

    /// Create a new keychain directory at `path` holding `entries`, sealed
    /// with `password`. Fails if a keychain already exists there.
    pub fn create(
        path: &Path,
        password: &SecretString,
        kdf: KdfParams,
        entries: &[Entry],
    ) -> Result<Self> {
        if path.join(HEADER_FILE).exists() {
            return Err(KeychainError::Config(format!(
                "A keychain already exists at {}",
                path.display()
            )));
        }

        let mut salt = vec![0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        let header = Header::new(hex::encode(&salt), &kdf);

        std::fs::create_dir_all(path)?;
        let raw = toml::to_string(&header).map_err(|e| KeychainError::Config(e.to_string()))?;
        std::fs::write(path.join(HEADER_FILE), raw)?;

        let keychain = Self {
            path: path.to_path_buf(),
            header,
        };
        keychain.seal(password, entries)?;
        Ok(keychain)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Encrypt `entries` and write them atomically to the entries file.
    fn seal(&self, password: &SecretString, entries: &[Entry]) -> Result<()> {
        let records: Vec<SealedRecord<'_>> = entries
            .iter()
            .map(|e| SealedRecord {
                name: &e.name,
                details: &e.details,
                password: e.password.expose_secret(),
            })
            .collect();
        let mut json_bytes = serde_json::to_vec(&records)
            .map_err(|e| KeychainError::Serialization(e.to_string()))?;

        let mut key = derive_key(
            password.expose_secret().as_bytes(),
            &self.header.salt_bytes()?,
            &self.header.kdf_params(),
        )?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext_result = {
            let cipher = Aes256Gcm::new_from_slice(&key)
                .map_err(|_| KeychainError::CorruptStore("Invalid key length.".into()))?;
            cipher
                .encrypt(nonce, json_bytes.as_ref())
                .map_err(|_| KeychainError::CorruptStore("Encryption failed.".into()))
        };

        key.zeroize();
        json_bytes.zeroize();

        let ciphertext = ciphertext_result?;

        // Atomic write: temp file, fsync, rename
        let tmp_path = self
            .path
            .join(format!(".entries.tmp.{}", rand::random::<u64>()));
        {
            let mut tmp = std::fs::File::create(&tmp_path)?;
            tmp.write_all(&nonce_bytes)?;
            tmp.write_all(&ciphertext)?;
            tmp.sync_all()?;
        }
        std::fs::rename(&tmp_path, self.path.join(ENTRIES_FILE))?;
        Ok(())
    }
}

impl Keychain for SealedKeychain {
    type Unlocked = OpenKeychain;

    fn unlock(self, password: &SecretString) -> Result<Unlock<Self, OpenKeychain>> {
        let entries_path = self.path.join(ENTRIES_FILE);
        if !entries_path.exists() {
            return Err(KeychainError::CorruptStore(format!(
                "Missing {} file in {}",
                ENTRIES_FILE,
                self.path.display()
            )));
        }

        let sealed = std::fs::read(&entries_path)?;
        if sealed.len() < NONCE_LEN {
            return Err(KeychainError::CorruptStore(
                "Entries file too short to contain a nonce.".into(),
            ));
        }
        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);

        let mut key = derive_key(
            password.expose_secret().as_bytes(),
            &self.header.salt_bytes()?,
            &self.header.kdf_params(),
        )?;

        let plaintext_result = {
            let cipher = Aes256Gcm::new_from_slice(&key)
                .map_err(|_| KeychainError::CorruptStore("Invalid key length.".into()))?;
            cipher.decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        };

        key.zeroize();

        let mut plaintext = match plaintext_result {
            Ok(plaintext) => plaintext,
            Err(_) => {
                debug!("master password rejected");
                return Ok(Unlock::Locked(self));
            }
        };

        let parsed = serde_json::from_slice::<Vec<Entry>>(&plaintext);
        plaintext.zeroize();
        let entries = parsed.map_err(|e| KeychainError::CorruptStore(e.to_string()))?;

        debug!(entries = entries.len(), "keychain unlocked");
        Ok(Unlock::Unlocked(OpenKeychain { entries }))
    }
}

impl UnlockedKeychain for OpenKeychain {
    fn find(&self, query: &str) -> Result<Vec<Entry>> {
        Ok(self
            .entries
            .iter()
            .filter(|entry| matching::matches(query, entry))
            .cloned()
            .collect())
    }

    fn item(&self, query: &str, fuzzy_threshold: u8) -> Result<Option<Entry>> {
        Ok(matching::best_match(query, &self.entries, fuzzy_threshold)
            .map(|idx| self.entries[idx].clone()))
    }
}

/// Derive a 32-byte AES key from the given password and salt using Argon2id.
/// The caller is responsible for zeroizing the returned array after use.
fn derive_key(password: &[u8], salt: &[u8], params: &KdfParams) -> Result<[u8; KEY_LEN]> {
    let argon2_params = Params::new(params.m_cost, params.t_cost, params.p_cost, Some(KEY_LEN))
        .map_err(|e| KeychainError::Config(e.to_string()))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut key = [0u8; KEY_LEN];
    argon2
        .hash_password_into(password, salt, &mut key)
        .map_err(|e| KeychainError::Config(e.to_string()))?;

    Ok(key)
}
