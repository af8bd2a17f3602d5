//! Locally persisted auth proof: one bearer token and one cached display
//! name, the client-side counterpart of the browser's key-value store. The
//! in-memory slot is authoritative; file persistence is best-effort so a
//! storage hiccup can never fail an otherwise successful login.

use crate::error::Error;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};

/// Auth proof written on successful login/register, cleared on logout or any
/// authentication failure.
#[derive(Clone, Debug)]
pub struct Credential {
    pub token: SecretString,
    pub display_name: String,
}

#[derive(Deserialize, Serialize)]
struct StoredCredential {
    token: String,
    display_name: String,
}

#[derive(Debug)]
pub struct CredentialStore {
    slot: Mutex<Option<Credential>>,
    path: Option<PathBuf>,
}

impl CredentialStore {
    /// Store with no file backing; state lives for the process only.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            slot: Mutex::new(None),
            path: None,
        }
    }

    /// Opens a file-backed store, loading a previously persisted credential
    /// if one exists.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let path = path.into();
        let slot = match fs::read_to_string(&path) {
            Ok(contents) => {
                let stored: StoredCredential = serde_json::from_str(&contents)
                    .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
                debug!("loaded credential for {}", stored.display_name);
                Some(Credential {
                    token: SecretString::from(stored.token),
                    display_name: stored.display_name,
                })
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => return Err(Error::Persist(err)),
        };

        Ok(Self {
            slot: Mutex::new(slot),
            path: Some(path),
        })
    }

    #[must_use]
    pub fn get(&self) -> Option<Credential> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.get().map(|credential| credential.token)
    }

    #[must_use]
    pub fn display_name(&self) -> Option<String> {
        self.get().map(|credential| credential.display_name)
    }

    #[must_use]
    pub fn is_present(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn set(&self, token: SecretString, display_name: impl Into<String>) {
        let credential = Credential {
            token,
            display_name: display_name.into(),
        };
        self.persist(Some(&credential));
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(credential);
    }

    /// Clears the credential, reporting whether one was present. The first
    /// caller wins; concurrent callers see `false` and skip their side
    /// effects, which keeps the 401 notice-and-redirect a single event.
    pub fn clear(&self) -> bool {
        let taken = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if taken.is_some() {
            self.persist(None);
            true
        } else {
            false
        }
    }

    fn persist(&self, credential: Option<&Credential>) {
        let Some(path) = &self.path else {
            return;
        };
        let result = match credential {
            Some(credential) => {
                let stored = StoredCredential {
                    token: credential.token.expose_secret().to_string(),
                    display_name: credential.display_name.clone(),
                };
                serde_json::to_string(&stored)
                    .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))
                    .and_then(|contents| fs::write(path, contents))
            }
            None => match fs::remove_file(path) {
                Err(err) if err.kind() != std::io::ErrorKind::NotFound => Err(err),
                _ => Ok(()),
            },
        };
        if let Err(err) = result {
            warn!("credential persistence failed: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::env;

    fn temp_store_path(name: &str) -> PathBuf {
        env::temp_dir().join(format!("kantaro-credentials-{}-{}.json", std::process::id(), name))
    }

    #[test]
    fn set_get_clear_roundtrip() {
        let store = CredentialStore::in_memory();
        assert!(!store.is_present());

        store.set(SecretString::from("token-abc".to_string()), "alice");
        assert_eq!(store.display_name().as_deref(), Some("alice"));
        let token = store.token().map(|token| token.expose_secret().to_string());
        assert_eq!(token.as_deref(), Some("token-abc"));

        assert!(store.clear());
        assert!(!store.is_present());
    }

    #[test]
    fn clear_reports_first_caller_only() {
        let store = CredentialStore::in_memory();
        store.set(SecretString::from("token-abc".to_string()), "alice");

        assert!(store.clear());
        assert!(!store.clear());
    }

    #[test]
    fn file_backed_store_survives_reopen() -> Result<()> {
        let path = temp_store_path("reopen");
        let _ = fs::remove_file(&path);

        let store = CredentialStore::open(&path)?;
        store.set(SecretString::from("token-abc".to_string()), "alice");
        drop(store);

        let reopened = CredentialStore::open(&path)?;
        assert_eq!(reopened.display_name().as_deref(), Some("alice"));

        assert!(reopened.clear());
        drop(reopened);
        let emptied = CredentialStore::open(&path)?;
        assert!(!emptied.is_present());

        let _ = fs::remove_file(&path);
        Ok(())
    }

    #[test]
    fn open_rejects_corrupt_file() -> Result<()> {
        let path = temp_store_path("corrupt");
        fs::write(&path, "not json")?;

        let result = CredentialStore::open(&path);
        assert!(result.is_err());

        let _ = fs::remove_file(&path);
        Ok(())
    }
}
