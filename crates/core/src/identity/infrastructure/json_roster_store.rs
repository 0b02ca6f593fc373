use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identity::domain::contact::Contact;
use crate::identity::domain::identity_registry::{IdentityRegistry, RegistryError};
use crate::shared::constants::ENCODING_DIMENSIONS;

const ROSTER_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("failed to read roster {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse roster {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to write roster {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("unsupported roster version {0}")]
    Version(u32),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[derive(Serialize, Deserialize)]
struct RosterFile {
    version: u32,
    contacts: Vec<Contact>,
}

/// JSON file backing for the contact roster.
///
/// The registry never writes back by itself; callers decide when to save.
pub struct JsonRosterStore {
    path: PathBuf,
}

impl JsonRosterStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads all contacts. A missing file is an empty roster.
    pub fn load(&self) -> Result<Vec<Contact>, RosterError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let json = fs::read_to_string(&self.path).map_err(|source| RosterError::Read {
            path: self.path.clone(),
            source,
        })?;
        let file: RosterFile = serde_json::from_str(&json).map_err(|source| RosterError::Parse {
            path: self.path.clone(),
            source,
        })?;
        if file.version != ROSTER_VERSION {
            return Err(RosterError::Version(file.version));
        }
        Ok(file.contacts)
    }

    /// Restores every stored contact into `registry`, returning how many were added.
    pub fn load_into(&self, registry: &mut IdentityRegistry) -> Result<usize, RosterError> {
        let contacts = self.load()?;
        let count = contacts.len();
        for contact in contacts {
            if let Some(encoding) = &contact.enrollment_encoding {
                if !encoding.is_native_length() {
                    log::warn!(
                        "Contact {} has a {}-value encoding, expected {ENCODING_DIMENSIONS}; it will never match",
                        contact.contact_id,
                        encoding.len()
                    );
                }
            }
            registry.restore(contact)?;
        }
        log::info!("Loaded {count} contacts from {}", self.path.display());
        Ok(count)
    }

    pub fn save<'a>(
        &self,
        contacts: impl IntoIterator<Item = &'a Contact>,
    ) -> Result<(), RosterError> {
        let write_err = |source| RosterError::Write {
            path: self.path.clone(),
            source,
        };
        let file = RosterFile {
            version: ROSTER_VERSION,
            contacts: contacts.into_iter().cloned().collect(),
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(&file).map_err(|source| RosterError::Parse {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, json).map_err(write_err)
    }

    pub fn save_registry(&self, registry: &IdentityRegistry) -> Result<(), RosterError> {
        self.save(registry.contacts())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::infrastructure::distance_matcher::DistanceMatcher;
    use crate::shared::encoding::FaceEncoding;
    use crate::shared::ids::ContactId;
    use std::time::{Duration, SystemTime};

    fn registry() -> IdentityRegistry {
        IdentityRegistry::new(Box::new(DistanceMatcher::default()))
    }

    #[test]
    fn test_missing_file_is_empty_roster() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonRosterStore::new(dir.path().join("contacts.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load_preserves_contacts() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonRosterStore::new(dir.path().join("roster").join("contacts.json"));

        let mut reg = registry();
        let mut ada = Contact::new(ContactId(1), "Ada", Some(FaceEncoding::new(vec![0.1; 128])));
        ada.mark_seen(SystemTime::UNIX_EPOCH + Duration::from_secs(1_000));
        reg.insert(ada).unwrap();
        reg.provisional_insert("Sam", None).unwrap();
        store.save_registry(&reg).unwrap();

        let mut restored = registry();
        assert_eq!(store.load_into(&mut restored).unwrap(), 2);
        assert_eq!(
            restored.contacts().collect::<Vec<_>>(),
            reg.contacts().collect::<Vec<_>>()
        );
        // Provisional allocation continues past the restored ids.
        assert_eq!(
            restored.provisional_insert("Kim", None).unwrap(),
            ContactId(-2)
        );
    }

    #[test]
    fn test_load_into_reports_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonRosterStore::new(dir.path().join("contacts.json"));
        store
            .save(&[Contact::new(ContactId(1), "Ada", None)])
            .unwrap();

        let mut reg = registry();
        reg.insert(Contact::new(ContactId(1), "Existing", None))
            .unwrap();
        let err = store.load_into(&mut reg).unwrap_err();
        assert!(matches!(
            err,
            RosterError::Registry(RegistryError::Conflict(ContactId(1)))
        ));
        assert_eq!(reg.get(ContactId(1)).unwrap().display_name, "Existing");
    }

    #[test]
    fn test_short_encodings_are_kept_but_never_match() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonRosterStore::new(dir.path().join("contacts.json"));
        let short = FaceEncoding::new(vec![0.1; 4]);
        store
            .save(&[Contact::new(ContactId(1), "Ada", Some(short.clone()))])
            .unwrap();

        let mut reg = registry();
        assert_eq!(store.load_into(&mut reg).unwrap(), 1);
        assert!(reg.contains(ContactId(1)));
        assert_eq!(reg.lookup_by_encoding(&FaceEncoding::new(vec![0.1; 128])), None);
    }

    #[test]
    fn test_rejects_unknown_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contacts.json");
        fs::write(&path, r#"{ "version": 9, "contacts": [] }"#).unwrap();
        assert!(matches!(
            JsonRosterStore::new(&path).load(),
            Err(RosterError::Version(9))
        ));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contacts.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            JsonRosterStore::new(&path).load(),
            Err(RosterError::Parse { .. })
        ));
    }
}
