//! Login session persistence.
//!
//! A [`SessionStore`] is restored synchronously at startup, before the first
//! frame is drawn, so protected views never render for a logged-out user. It
//! is passed explicitly to whoever needs it; the chat view-model only
//! receives a copy of the credential.

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tempfile::NamedTempFile;
use tracing::info;

use crate::core::config::Config;
use crate::core::keyring::KeyringCredentialStore;

pub const TOKEN_KEY: &str = "token";
pub const USER_ID_KEY: &str = "user_id";

/// Key-value storage for the persisted session.
pub trait CredentialStore {
    fn get(&self, key: &str) -> Result<Option<String>, Box<dyn Error>>;
    fn set(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>>;
    /// Removing a key that is not present succeeds.
    fn delete(&self, key: &str) -> Result<(), Box<dyn Error>>;
}

impl<T: CredentialStore + ?Sized> CredentialStore for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> Result<(), Box<dyn Error>> {
        (**self).delete(key)
    }
}

/// In-process store; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values<'a>(values: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let store = Self::new();
        if let Ok(mut map) = store.values.lock() {
            map.extend(values.into_iter().map(|(k, v)| (k.to_string(), v.to_string())));
        }
        store
    }

    fn lock_values(&self) -> Result<MutexGuard<'_, BTreeMap<String, String>>, Box<dyn Error>> {
        self.values
            .lock()
            .map_err(|_| "credential store lock poisoned".into())
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        Ok(self.lock_values()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        self.lock_values()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), Box<dyn Error>> {
        self.lock_values()?.remove(key);
        Ok(())
    }
}

/// Plain TOML table on disk, for machines without a usable keyring.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<BTreeMap<String, String>, Box<dyn Error>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = fs::read_to_string(&self.path)?;
        Ok(toml::from_str(&contents)?)
    }

    fn write(&self, values: &BTreeMap<String, String>) -> Result<(), Box<dyn Error>> {
        let parent = self.path.parent().filter(|dir| !dir.as_os_str().is_empty());
        if let Some(dir) = parent {
            fs::create_dir_all(dir)?;
        }
        let contents = toml::to_string(values)?;
        let mut temp_file = match parent {
            Some(dir) => NamedTempFile::new_in(dir)?,
            None => NamedTempFile::new()?,
        };
        temp_file.write_all(contents.as_bytes())?;
        temp_file.as_file_mut().sync_all()?;
        temp_file
            .persist(&self.path)
            .map_err(|err| -> Box<dyn Error> { Box::new(err) })?;
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        Ok(self.read()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let mut values = self.read()?;
        values.insert(key.to_string(), value.to_string());
        self.write(&values)
    }

    fn delete(&self, key: &str) -> Result<(), Box<dyn Error>> {
        let mut values = self.read()?;
        if values.remove(key).is_some() {
            self.write(&values)?;
        }
        Ok(())
    }
}

/// Pick the credential backend the configuration asks for.
pub fn open_credential_store(config: &Config) -> Box<dyn CredentialStore> {
    if config.use_keyring() {
        Box::new(KeyringCredentialStore::new())
    } else {
        Box::new(FileCredentialStore::new(Config::session_file_path()))
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user_id: String,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("user_id", &self.user_id)
            .finish()
    }
}

pub struct SessionStore<S> {
    store: S,
    session: Option<Session>,
}

impl<S: CredentialStore> SessionStore<S> {
    /// Read the persisted session. Both the token and the user id must be
    /// present for the session to count as active.
    pub fn restore(store: S) -> Result<Self, Box<dyn Error>> {
        let token = store.get(TOKEN_KEY)?.filter(|t| !t.is_empty());
        let user_id = store.get(USER_ID_KEY)?.filter(|u| !u.is_empty());
        let session = match (token, user_id) {
            (Some(token), Some(user_id)) => Some(Session { token, user_id }),
            _ => None,
        };
        Ok(Self { store, session })
    }

    pub fn login(&mut self, token: &str, user_id: &str) -> Result<(), Box<dyn Error>> {
        self.store.set(TOKEN_KEY, token)?;
        self.store.set(USER_ID_KEY, user_id)?;
        info!(user_id, "session stored");
        self.session = Some(Session {
            token: token.to_string(),
            user_id: user_id.to_string(),
        });
        Ok(())
    }

    pub fn logout(&mut self) -> Result<(), Box<dyn Error>> {
        self.session = None;
        self.store.delete(TOKEN_KEY)?;
        self.store.delete(USER_ID_KEY)?;
        info!("session cleared");
        Ok(())
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.token.as_str())
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn restore_requires_both_values() {
        let store = MemoryCredentialStore::with_values([(TOKEN_KEY, "tok")]);
        let sessions = SessionStore::restore(store).expect("restore");
        assert!(!sessions.is_active());

        let store = MemoryCredentialStore::with_values([(TOKEN_KEY, "tok"), (USER_ID_KEY, "u1")]);
        let sessions = SessionStore::restore(store).expect("restore");
        assert_eq!(
            sessions.session(),
            Some(&Session {
                token: "tok".into(),
                user_id: "u1".into()
            })
        );
    }

    #[test]
    fn login_persists_and_logout_clears() {
        let mut sessions = SessionStore::restore(MemoryCredentialStore::new()).expect("restore");
        assert!(!sessions.is_active());

        sessions.login("tok", "u1").expect("login");
        assert_eq!(sessions.token(), Some("tok"));
        assert_eq!(
            sessions.store.get(TOKEN_KEY).expect("get"),
            Some("tok".to_string())
        );

        sessions.logout().expect("logout");
        assert!(!sessions.is_active());
        assert_eq!(sessions.store.get(TOKEN_KEY).expect("get"), None);
        assert_eq!(sessions.store.get(USER_ID_KEY).expect("get"), None);
    }

    #[test]
    fn logout_without_session_succeeds() {
        let mut sessions = SessionStore::restore(MemoryCredentialStore::new()).expect("restore");
        sessions.logout().expect("logout");
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("state").join("session.toml");

        let mut sessions = SessionStore::restore(FileCredentialStore::new(&path)).expect("restore");
        sessions.login("tok", "u1").expect("login");

        let reopened = SessionStore::restore(FileCredentialStore::new(&path)).expect("restore");
        assert_eq!(reopened.token(), Some("tok"));

        let mut reopened = reopened;
        reopened.logout().expect("logout");
        let after = SessionStore::restore(FileCredentialStore::new(&path)).expect("restore");
        assert!(!after.is_active());
    }

    #[test]
    fn debug_output_redacts_token() {
        let session = Session {
            token: "secret-token".into(),
            user_id: "u1".into(),
        };
        let rendered = format!("{session:?}");
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("u1"));
    }
}
