use std::error::Error;
use std::fmt;

use keyring::Entry;
use tracing::debug;

use crate::core::session::CredentialStore;

pub const KEYRING_SERVICE: &str = "threadline";

/// Failure while talking to the platform keyring.
///
/// Recoverable errors mean the backend was temporarily unavailable (a locked
/// keychain, a missing secret-service daemon); permanent ones carry the
/// underlying cause for the user.
#[derive(Debug)]
pub enum KeyringAccessError {
    Recoverable(keyring::Error),
    Permanent(keyring::Error),
}

impl KeyringAccessError {
    fn inner(&self) -> &keyring::Error {
        match self {
            KeyringAccessError::Recoverable(err) | KeyringAccessError::Permanent(err) => err,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(self, KeyringAccessError::Recoverable(_))
    }
}

impl From<keyring::Error> for KeyringAccessError {
    fn from(err: keyring::Error) -> Self {
        match err {
            keyring::Error::PlatformFailure(_) | keyring::Error::NoStorageAccess(_) => {
                KeyringAccessError::Recoverable(err)
            }
            other => KeyringAccessError::Permanent(other),
        }
    }
}

impl fmt::Display for KeyringAccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_recoverable() {
            write!(
                f,
                "system keyring unavailable ({}); set use_keyring = false to store the session in a file",
                self.inner()
            )
        } else {
            write!(f, "{}", self.inner())
        }
    }
}

impl Error for KeyringAccessError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.inner())
    }
}

/// Session values stored as keyring entries under [`KEYRING_SERVICE`].
#[derive(Debug, Clone)]
pub struct KeyringCredentialStore {
    service: String,
}

impl KeyringCredentialStore {
    pub fn new() -> Self {
        Self {
            service: KEYRING_SERVICE.to_string(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry, KeyringAccessError> {
        Entry::new(&self.service, key).map_err(KeyringAccessError::from)
    }
}

impl Default for KeyringCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn get(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        match self.entry(key)?.get_password() {
            Ok(value) => {
                debug!(key, "keyring lookup hit");
                Ok(Some(value))
            }
            Err(keyring::Error::NoEntry) => {
                debug!(key, "keyring lookup miss");
                Ok(None)
            }
            Err(err) => Err(Box::new(KeyringAccessError::from(err))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        self.entry(key)?
            .set_password(value)
            .map_err(|err| Box::new(KeyringAccessError::from(err)) as Box<dyn Error>)
    }

    fn delete(&self, key: &str) -> Result<(), Box<dyn Error>> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(err) => Err(Box::new(KeyringAccessError::from(err))),
        }
    }
}
