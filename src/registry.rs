use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use harsh::Harsh;
use once_cell::sync::Lazy;

use crate::{Config, ConfigError};

static GLOBAL_REGISTRY: Lazy<Mutex<Option<Arc<Registry>>>> = Lazy::new(|| Mutex::new(None));

/// Error returned for registry and lookup operations.
#[derive(Debug, PartialEq)]
pub enum Error {
    Config(ConfigError),
    NotFound,
    SaltConflict { hash_key: String },
    UnsupportedKey(i64),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Config(e) => {
                write!(f, "Invalid codec configuration: {}", e)
            }
            Error::NotFound => {
                write!(f, "No record matched the given identifier")
            }
            Error::SaltConflict { hash_key } => {
                write!(
                    f,
                    "Hash key {:?} is already configured with a different salt",
                    hash_key
                )
            }
            Error::UnsupportedKey(key) => {
                write!(f, "Key {} cannot be encoded, only non-negative integer keys are supported", key)
            }
        }
    }
}

impl std::error::Error for Error {}

struct Entry {
    codec: Harsh,
    salt: String,
}

/// Process-wide registry of codec configurations, keyed by hash key.
///
/// Each hash key gets its own hashids codec, built lazily on first use from
/// the registry's default alphabet and minimum length plus either the
/// default salt or an explicitly registered per-key salt. Entries live for
/// the lifetime of the registry; encode and decode are pure once an entry
/// exists.
///
/// The first registration for a hash key wins. Requesting an existing key
/// with a *different* explicit salt is a [`Error::SaltConflict`], not a
/// silent replacement.
pub struct Registry {
    defaults: Config,
    entries: Mutex<HashMap<String, Arc<Entry>>>,
}

impl Registry {
    /// Creates a new, empty registry using `defaults` for every hash key
    /// that has no explicit salt override.
    pub fn new(defaults: Config) -> Registry {
        Registry {
            defaults,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Sets the process-wide registry used by the [`Field`](crate::Field)
    /// serialization glue. This should be called once at startup before any
    /// `Field` values are serialized.
    pub fn set_global(registry: Arc<Registry>) {
        let mut global = GLOBAL_REGISTRY.lock().unwrap();
        *global = Some(registry);
    }

    /// Accesses the process-wide registry, if set.
    pub fn global() -> Option<Arc<Registry>> {
        GLOBAL_REGISTRY.lock().unwrap().clone()
    }

    /// The configured minimum token length. Object identifier decoding
    /// treats the trailing `min_length` characters as the hash token.
    pub fn min_length(&self) -> usize {
        self.defaults.min_length
    }

    /// Ensures a codec configuration exists for `hash_key`.
    ///
    /// With `salt == None` the entry is created from the default salt, or
    /// reused as-is if one already exists. With an explicit salt, an
    /// existing entry is reused only if its salt matches; a differing salt
    /// is a [`Error::SaltConflict`].
    pub fn configure(&self, hash_key: &str, salt: Option<&str>) -> Result<(), Error> {
        self.entry(hash_key, salt).map(|_| ())
    }

    fn entry(&self, hash_key: &str, salt: Option<&str>) -> Result<Arc<Entry>, Error> {
        let mut entries = self.entries.lock().unwrap();
        if let Some(entry) = entries.get(hash_key) {
            match salt {
                Some(salt) if salt != entry.salt => Err(Error::SaltConflict {
                    hash_key: hash_key.to_string(),
                }),
                _ => Ok(entry.clone()),
            }
        } else {
            let salt = salt.unwrap_or(&self.defaults.salt);
            let codec = Harsh::builder()
                .salt(salt)
                .alphabet(self.defaults.alphabet.as_str())
                .length(self.defaults.min_length)
                .build()
                .map_err(|e| Error::Config(ConfigError::Rejected(e.to_string())))?;
            let entry = Arc::new(Entry {
                codec,
                salt: salt.to_string(),
            });
            entries.insert(hash_key.to_string(), entry.clone());
            Ok(entry)
        }
    }

    /// Encodes `key` under the configuration for `hash_key`, creating the
    /// configuration if this is the first use of the key.
    ///
    /// Deterministic: the same `(key, hash_key)` pair always yields the same
    /// token for as long as the configuration is unchanged. Negative keys
    /// are rejected with [`Error::UnsupportedKey`].
    pub fn id_to_hash(&self, key: i64, hash_key: &str) -> Result<String, Error> {
        if key < 0 {
            return Err(Error::UnsupportedKey(key));
        }
        let entry = self.entry(hash_key, None)?;
        Ok(entry.codec.encode(&[key as u64]))
    }

    /// Decodes `token` under the configuration for `hash_key`.
    ///
    /// Returns `None` if the token is empty, malformed, or does not decode
    /// to exactly one representable integer. A token minted under a
    /// different salt usually misses, but may by algorithmic coincidence
    /// decode to an unrelated key; the codec is obfuscation, not
    /// authentication.
    pub fn hash_to_id(&self, token: &str, hash_key: &str) -> Option<i64> {
        let entry = self.entry(hash_key, None).ok()?;
        let values = entry.codec.decode(token).ok()?;
        match values.as_slice() {
            [value] => i64::try_from(*value).ok(),
            _ => None,
        }
    }
}
