//! Signed-in user credential, stored as a single opaque blob.
//!
//! The sign-in flow ends with a deep link carrying the user profile as a
//! percent-encoded JSON `user` query parameter. That profile is stored as-is;
//! the only field this crate reads is the primary email.

use crate::{Error, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{Read, Write};
use std::path::PathBuf;
use tempfile::NamedTempFile;

/// One address from the identity provider profile
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EmailAddress {
    pub value: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Identity provider profile. Unknown fields are kept verbatim.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserCredential {
    #[serde(default)]
    pub emails: Vec<EmailAddress>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserCredential {
    pub fn with_email(email: impl Into<String>) -> Self {
        Self {
            emails: vec![EmailAddress {
                value: email.into(),
                extra: Map::new(),
            }],
            extra: Map::new(),
        }
    }

    /// The address the backend keys workouts on
    pub fn primary_email(&self) -> Result<&str> {
        self.emails
            .first()
            .map(|e| e.value.as_str())
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| Error::Credentials("credential has no email address".into()))
    }
}

/// Storage for the one credential blob
pub trait CredentialStore {
    fn load(&self) -> Result<Option<UserCredential>>;
    fn save(&self, credential: &UserCredential) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// JSON file with advisory locking and atomic replacement
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CredentialStore for FileCredentialStore {
    /// Returns `None` when no one is signed in. A corrupt file is treated the
    /// same way (with a warning) so the user can simply sign in again.
    fn load(&self) -> Result<Option<UserCredential>> {
        if !self.path.exists() {
            tracing::debug!("No credential at {:?}", self.path);
            return Ok(None);
        }

        let file = File::open(&self.path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        read?;

        match serde_json::from_str::<UserCredential>(&contents) {
            Ok(credential) => Ok(Some(credential)),
            Err(e) => {
                tracing::warn!(
                    "Failed to parse credential {:?}: {}. Treating as signed out.",
                    self.path,
                    e
                );
                Ok(None)
            }
        }
    }

    fn save(&self, credential: &UserCredential) -> Result<()> {
        let parent = self.path.parent().ok_or_else(|| {
            Error::Credentials(format!("credential path {:?} has no parent", self.path))
        })?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(credential)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;
        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved credential to {:?}", self.path);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Extract the user profile from a sign-in deep link.
///
/// Returns `Ok(None)` when the link has no `user` parameter.
pub fn credential_from_deep_link(url: &str) -> Result<Option<UserCredential>> {
    let Some((_, query)) = url.split_once('?') else {
        return Ok(None);
    };
    let query = query.split('#').next().unwrap_or_default();

    let Some(raw) = query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "user")
        .map(|(_, value)| value)
    else {
        return Ok(None);
    };

    // Query strings are form-encoded: '+' is a space.
    let raw = raw.replace('+', " ");
    let mut decoded = urlencoding::decode(&raw)
        .map_err(|e| Error::Credentials(format!("deep link user is not valid UTF-8: {}", e)))?
        .into_owned();
    // Some link builders encode the profile twice.
    if !decoded.trim_start().starts_with('{') {
        decoded = urlencoding::decode(&decoded)
            .map_err(|e| Error::Credentials(format!("deep link user is not valid UTF-8: {}", e)))?
            .into_owned();
    }

    let credential: UserCredential = serde_json::from_str(&decoded)
        .map_err(|e| Error::Credentials(format!("deep link user is not valid JSON: {}", e)))?;
    credential.primary_email()?;
    Ok(Some(credential))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILE: &str = r#"{"id":"1177","displayName":"Nick","emails":[{"value":"nick@example.com","verified":true}]}"#;

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(temp_dir.path().join("nlw/credential.json"));

        let credential: UserCredential = serde_json::from_str(PROFILE).unwrap();
        store.save(&credential).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, credential);
        assert_eq!(loaded.primary_email().unwrap(), "nick@example.com");
        assert_eq!(loaded.extra["displayName"], "Nick");
    }

    #[test]
    fn test_load_missing_is_none() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(temp_dir.path().join("credential.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_is_signed_out() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("credential.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = FileCredentialStore::new(&path);
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_clear() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(temp_dir.path().join("credential.json"));
        store.save(&UserCredential::with_email("a@b.c")).unwrap();

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        // Clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_primary_email_required() {
        let credential: UserCredential = serde_json::from_str(r#"{"id":"1"}"#).unwrap();
        assert!(matches!(
            credential.primary_email(),
            Err(Error::Credentials(_))
        ));
    }

    #[test]
    fn test_deep_link() {
        let link = format!("nlw://login?user={}", urlencoding::encode(PROFILE));
        let credential = credential_from_deep_link(&link).unwrap().unwrap();
        assert_eq!(credential.primary_email().unwrap(), "nick@example.com");
    }

    #[test]
    fn test_deep_link_double_encoded() {
        let once = urlencoding::encode(PROFILE).into_owned();
        let link = format!("nlw://login?from=web&user={}#done", urlencoding::encode(&once));
        let credential = credential_from_deep_link(&link).unwrap().unwrap();
        assert_eq!(credential.primary_email().unwrap(), "nick@example.com");
    }

    #[test]
    fn test_deep_link_form_encoded_spaces() {
        let link = "nlw://login?user=%7B%22displayName%22%3A%22Nick+H%22%2C%22emails%22%3A%5B%7B%22value%22%3A%22nick%40example.com%22%7D%5D%7D";
        let credential = credential_from_deep_link(link).unwrap().unwrap();
        assert_eq!(credential.extra["displayName"], "Nick H");
        assert_eq!(credential.primary_email().unwrap(), "nick@example.com");
    }

    #[test]
    fn test_deep_link_keeps_encoded_plus() {
        let profile = r#"{"emails":[{"value":"nick+gym@example.com"}]}"#;
        let link = format!("nlw://login?user={}", urlencoding::encode(profile));
        let credential = credential_from_deep_link(&link).unwrap().unwrap();
        assert_eq!(credential.primary_email().unwrap(), "nick+gym@example.com");
    }

    #[test]
    fn test_deep_link_without_user() {
        assert!(credential_from_deep_link("nlw://login").unwrap().is_none());
        assert!(credential_from_deep_link("nlw://login?x=1").unwrap().is_none());
    }

    #[test]
    fn test_deep_link_bad_json() {
        let link = format!("nlw://login?user={}", urlencoding::encode("{oops"));
        assert!(matches!(
            credential_from_deep_link(&link),
            Err(Error::Credentials(_))
        ));
    }
}
