use std::sync::Arc;

use thiserror::Error;

use crate::{
    data::storage::{KeyValueStore, StorageError},
    domain::messages::{MSG_CITY_ALREADY_FAVORITE, MSG_TYPE_CITY_FIRST},
};

pub const FAVORITES_KEY: &str = "savedCities";
pub const CHART_EXPANDED_KEY: &str = "chartExpanded";

#[derive(Debug, Error)]
pub enum FavoriteError {
    #[error("{}", MSG_TYPE_CITY_FIRST)]
    TypeCityFirst,
    #[error("{}", MSG_CITY_ALREADY_FAVORITE)]
    AlreadyFavorite,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Saved city names, persisted as a JSON string array.
#[derive(Debug, Clone)]
pub struct Favorites {
    store: Arc<dyn KeyValueStore>,
}

impl Favorites {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Stored order. A missing or unreadable list reads as empty.
    pub fn list(&self) -> Vec<String> {
        let raw = match self.store.get(FAVORITES_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                tracing::warn!(error = %err, "failed to read favorites");
                return Vec::new();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "favorites list is corrupt, starting over");
            Vec::new()
        })
    }

    /// Returns the trimmed name that was saved.
    pub fn add(&self, city: &str) -> Result<String, FavoriteError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(FavoriteError::TypeCityFirst);
        }
        let mut saved = self.list();
        if saved.iter().any(|c| c.to_lowercase() == city.to_lowercase()) {
            return Err(FavoriteError::AlreadyFavorite);
        }
        saved.push(city.to_string());
        self.save(&saved)?;
        Ok(city.to_string())
    }

    /// Drops every case-insensitive match; returns whether anything went.
    pub fn remove(&self, city: &str) -> Result<bool, FavoriteError> {
        let needle = city.trim().to_lowercase();
        let mut saved = self.list();
        let before = saved.len();
        saved.retain(|c| c.to_lowercase() != needle);
        if saved.len() == before {
            return Ok(false);
        }
        self.save(&saved)?;
        Ok(true)
    }

    fn save(&self, saved: &[String]) -> Result<(), FavoriteError> {
        let payload = serde_json::to_string(saved).map_err(StorageError::from)?;
        self.store.set(FAVORITES_KEY, &payload)?;
        Ok(())
    }
}

/// Persisted expanded/collapsed state of the chart panel.
#[derive(Debug, Clone)]
pub struct ChartPreference {
    store: Arc<dyn KeyValueStore>,
}

impl ChartPreference {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn expanded(&self) -> bool {
        matches!(self.store.get(CHART_EXPANDED_KEY), Ok(Some(v)) if v == "true")
    }

    pub fn set_expanded(&self, expanded: bool) {
        let value = if expanded { "true" } else { "false" };
        if let Err(err) = self.store.set(CHART_EXPANDED_KEY, value) {
            tracing::warn!(error = %err, "failed to persist chart preference");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::storage::{FileStore, MemoryStore};

    fn favorites() -> (Favorites, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (Favorites::new(store.clone()), store)
    }

    #[test]
    fn add_trims_and_keeps_insertion_order() {
        let (favorites, store) = favorites();
        assert_eq!(favorites.add("  Cluj ").unwrap(), "Cluj");
        favorites.add("Paris").unwrap();

        assert_eq!(favorites.list(), vec!["Cluj", "Paris"]);
        assert_eq!(
            store.get(FAVORITES_KEY).unwrap().as_deref(),
            Some("[\"Cluj\",\"Paris\"]")
        );
    }

    #[test]
    fn blank_input_asks_for_a_city() {
        let (favorites, _) = favorites();
        let err = favorites.add("   ").unwrap_err();
        assert!(matches!(err, FavoriteError::TypeCityFirst));
        assert_eq!(err.to_string(), MSG_TYPE_CITY_FIRST);
    }

    #[test]
    fn duplicates_are_rejected_ignoring_case() {
        let (favorites, _) = favorites();
        favorites.add("Paris").unwrap();
        let err = favorites.add("PARIS").unwrap_err();
        assert!(matches!(err, FavoriteError::AlreadyFavorite));
        assert_eq!(favorites.list(), vec!["Paris"]);
    }

    #[test]
    fn remove_matches_ignoring_case() {
        let (favorites, _) = favorites();
        favorites.add("Paris").unwrap();
        favorites.add("Cluj").unwrap();

        assert!(favorites.remove("paris").unwrap());
        assert!(!favorites.remove("Berlin").unwrap());
        assert_eq!(favorites.list(), vec!["Cluj"]);
    }

    #[test]
    fn corrupt_list_reads_as_empty() {
        let (favorites, store) = favorites();
        store.set(FAVORITES_KEY, "not-json").unwrap();
        assert!(favorites.list().is_empty());
        favorites.add("Oslo").unwrap();
        assert_eq!(favorites.list(), vec!["Oslo"]);
    }

    #[test]
    fn torn_store_file_still_accepts_favorites() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("store.json");
        std::fs::write(&path, "{\"savedCi").expect("write torn file");
        let favorites = Favorites::new(Arc::new(FileStore::new(&path)));

        assert!(favorites.list().is_empty());
        favorites.add("Oslo").unwrap();

        let reopened = Favorites::new(Arc::new(FileStore::new(&path)));
        assert_eq!(reopened.list(), vec!["Oslo"]);
    }

    #[test]
    fn chart_preference_round_trips_as_text() {
        let store = Arc::new(MemoryStore::new());
        let pref = ChartPreference::new(store.clone());
        assert!(!pref.expanded());

        pref.set_expanded(true);
        assert_eq!(store.get(CHART_EXPANDED_KEY).unwrap().as_deref(), Some("true"));
        assert!(pref.expanded());

        pref.set_expanded(false);
        assert!(!pref.expanded());
    }
}
