use std::collections::HashSet;
use std::fmt;

/// The default hashids alphabet.
pub const DEFAULT_ALPHABET: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ1234567890";

/// The default minimum token length.
pub const DEFAULT_MIN_LENGTH: usize = 8;

/// Codec configuration defaults: the salt, minimum token length and alphabet
/// used for every hash key that has no explicit override.
#[derive(Clone, Debug)]
pub struct Config {
    pub(crate) alphabet: String,
    pub(crate) min_length: usize,
    pub(crate) salt: String,
}

#[derive(Debug, PartialEq)]
pub enum ConfigError {
    AlphabetTooShort,
    DuplicateAlphabetChar(char),
    IllegalAlphabetChar(char),
    Rejected(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::AlphabetTooShort => {
                write!(f, "Alphabet must contain at least 16 unique characters")
            }
            ConfigError::DuplicateAlphabetChar(c) => {
                write!(f, "Alphabet contains duplicate character {:?}", c)
            }
            ConfigError::IllegalAlphabetChar(c) => {
                write!(f, "Alphabet contains illegal character {:?}", c)
            }
            ConfigError::Rejected(reason) => {
                write!(f, "Configuration rejected by the codec: {}", reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Creates a new configuration with the given default `salt` and other
    /// settings in default values.
    /// - `min_length` defaults to 8, which keeps tokens from leaking the
    ///   magnitude of small keys while still keeping them short.
    /// - `alphabet` defaults to the standard hashids alphabet
    ///   (alphanumerics, both cases).
    ///
    /// The salt is what scopes tokens to a deployment: rotating it
    /// invalidates every previously issued token for keys using it.
    pub fn new(salt: &str) -> Self {
        Config {
            alphabet: DEFAULT_ALPHABET.to_string(),
            min_length: DEFAULT_MIN_LENGTH,
            salt: salt.to_string(),
        }
    }

    /// Sets the minimum length of encoded tokens. Tokens for small keys are
    /// padded up to exactly this length; tokens for large keys may be longer.
    pub fn min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length;
        self
    }

    /// Sets the alphabet used for encoding. The alphabet must contain at
    /// least 16 unique characters and no spaces.
    pub fn alphabet(mut self, alphabet: &str) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        for c in alphabet.chars() {
            if c.is_whitespace() {
                return Err(ConfigError::IllegalAlphabetChar(c));
            }
            if !seen.insert(c) {
                return Err(ConfigError::DuplicateAlphabetChar(c));
            }
        }
        if seen.len() < 16 {
            return Err(ConfigError::AlphabetTooShort);
        }
        self.alphabet = alphabet.to_string();
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::new("salt");
        assert_eq!(config.alphabet, DEFAULT_ALPHABET);
        assert_eq!(config.min_length, DEFAULT_MIN_LENGTH);
        assert_eq!(config.salt, "salt");
    }

    #[test]
    fn test_alphabet_validation() {
        assert_eq!(
            Config::new("salt").alphabet("abc").unwrap_err(),
            ConfigError::AlphabetTooShort
        );
        assert_eq!(
            Config::new("salt").alphabet("abcdefghijklmnopa").unwrap_err(),
            ConfigError::DuplicateAlphabetChar('a')
        );
        assert_eq!(
            Config::new("salt").alphabet("abcdefgh ijklmnop").unwrap_err(),
            ConfigError::IllegalAlphabetChar(' ')
        );
        let config = Config::new("salt").alphabet("0123456789abcdef").unwrap();
        assert_eq!(config.alphabet, "0123456789abcdef");
    }
}
