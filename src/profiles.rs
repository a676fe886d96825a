//! Contact and style profile persistence.
//!
//! Contacts and the current style profile live in one JSON file,
//! `{data_dir}/profiles.json`. The reply pipeline only reads from it;
//! the `contact` and `style` commands write to it.

use crate::entitlement::StoreError;
use crate::llm::ContactProfile;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const PROFILES_FILE: &str = "profiles.json";

/// Model-written description of how the user texts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleProfile {
    pub description: String,
    pub sample_count: usize,
    pub updated_on: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileBook {
    #[serde(default)]
    contacts: BTreeMap<String, ContactProfile>,
    #[serde(default)]
    style: Option<StyleProfile>,
}

impl ProfileBook {
    pub fn contact(&self, id: &str) -> Option<&ContactProfile> {
        self.contacts.get(id)
    }

    /// All contacts, sorted by id.
    pub fn contacts(&self) -> impl Iterator<Item = (&str, &ContactProfile)> {
        self.contacts.iter().map(|(id, c)| (id.as_str(), c))
    }

    /// Insert or replace. Returns the previous profile for this id.
    pub fn upsert_contact(
        &mut self,
        id: impl Into<String>,
        profile: ContactProfile,
    ) -> Option<ContactProfile> {
        self.contacts.insert(id.into(), profile)
    }

    pub fn remove_contact(&mut self, id: &str) -> Option<ContactProfile> {
        self.contacts.remove(id)
    }

    pub fn style(&self) -> Option<&StyleProfile> {
        self.style.as_ref()
    }

    pub fn set_style(&mut self, style: StyleProfile) {
        self.style = Some(style);
    }

    pub fn clear_style(&mut self) -> Option<StyleProfile> {
        self.style.take()
    }
}

#[derive(Debug, Clone)]
pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(PROFILES_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the profile book. Missing or unreadable files yield an empty book.
    pub fn load(&self) -> ProfileBook {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                log::warn!("[PROFILES] Ignoring invalid {}: {}", self.path.display(), e);
                ProfileBook::default()
            }),
            Err(_) => ProfileBook::default(),
        }
    }

    pub fn save(&self, book: &ProfileBook) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(book)?;
        std::fs::write(&self.path, json).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        log::info!(
            "[PROFILES] Saved {} contacts (style profile: {})",
            book.contacts.len(),
            book.style.is_some()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(name: &str) -> ProfileStore {
        let dir = std::env::temp_dir().join(format!(
            "reply-coach-profiles-{}-{}",
            name,
            std::process::id()
        ));
        ProfileStore::in_dir(&dir)
    }

    fn cleanup(store: &ProfileStore) {
        if let Some(dir) = store.path().parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    fn contact(relationship: &str) -> ContactProfile {
        ContactProfile {
            name: "Alex".to_string(),
            relationship: relationship.to_string(),
            preferred_tone: None,
            notes: String::new(),
        }
    }

    #[test]
    fn load_missing_returns_empty() {
        let book = temp_store("missing").load();
        assert_eq!(book, ProfileBook::default());
    }

    #[test]
    fn save_and_load() {
        let store = temp_store("roundtrip");
        let mut book = ProfileBook::default();
        book.upsert_contact("alex", contact("Friend"));
        book.set_style(StyleProfile {
            description: "Short, lowercase, lots of haha".to_string(),
            sample_count: 4,
            updated_on: NaiveDate::from_ymd_opt(2026, 1, 2).unwrap(),
        });

        store.save(&book).unwrap();
        let loaded = store.load();
        assert_eq!(loaded, book);
        assert_eq!(loaded.contact("alex").unwrap().relationship, "Friend");

        cleanup(&store);
    }

    #[test]
    fn invalid_file_loads_empty() {
        let store = temp_store("invalid");
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "[]").unwrap();
        assert_eq!(store.load(), ProfileBook::default());
        cleanup(&store);
    }

    #[test]
    fn upsert_replaces_and_remove_deletes() {
        let mut book = ProfileBook::default();
        assert!(book.upsert_contact("alex", contact("Friend")).is_none());
        let previous = book.upsert_contact("alex", contact("Boss")).unwrap();
        assert_eq!(previous.relationship, "Friend");
        assert_eq!(book.contacts().count(), 1);

        assert!(book.remove_contact("alex").is_some());
        assert!(book.remove_contact("alex").is_none());
    }
}
