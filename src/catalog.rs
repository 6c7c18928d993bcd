use std::collections::HashSet;

use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

static CONTENT_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/content");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// A single practice text
#[derive(Debug, Clone, Deserialize)]
pub struct Entry {
    pub id: String,
    pub title: String,
    pub difficulty: Difficulty,
    pub text: String,
    /// Entry to offer after this one, within the same category
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Category {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub entries: Vec<Entry>,
}

impl Category {
    pub fn entry(&self, id: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id == id)
    }
}

/// Immutable practice content, looked up by `(category, item)`
#[derive(Debug, Clone)]
pub struct Catalog {
    categories: Vec<Category>,
}

impl Catalog {
    /// Content compiled into the binary, one JSON file per category
    pub fn builtin() -> Result<Self> {
        let mut files: Vec<_> = CONTENT_DIR
            .files()
            .filter(|f| f.path().extension().is_some_and(|ext| ext == "json"))
            .collect();
        files.sort_by(|a, b| a.path().cmp(b.path()));

        let mut categories = Vec::with_capacity(files.len());
        for file in files {
            let name = file.path().display().to_string();
            let json = file.contents_utf8().ok_or_else(|| Error::InvalidCatalog {
                file: name.clone(),
                reason: "not valid UTF-8".to_string(),
            })?;
            categories.push(parse_category(&name, json)?);
        }

        let catalog = Self::from_categories(categories)?;
        debug!(categories = catalog.categories.len(), "loaded builtin catalog");
        Ok(catalog)
    }

    /// Validates ids are unique and every `next` points at a sibling entry
    pub fn from_categories(categories: Vec<Category>) -> Result<Self> {
        let mut seen_categories = HashSet::new();
        for category in &categories {
            if !seen_categories.insert(category.id.as_str()) {
                return Err(invalid(&category.id, "duplicate category id"));
            }
            if category.entries.is_empty() {
                return Err(invalid(&category.id, "category has no entries"));
            }

            let ids: HashSet<&str> = category.entries.iter().map(|e| e.id.as_str()).collect();
            if ids.len() != category.entries.len() {
                return Err(invalid(&category.id, "duplicate entry id"));
            }
            for entry in &category.entries {
                if entry.text.is_empty() {
                    return Err(invalid(&category.id, &format!("entry '{}' has no text", entry.id)));
                }
                if let Some(next) = &entry.next {
                    if !ids.contains(next.as_str()) {
                        return Err(invalid(
                            &category.id,
                            &format!("entry '{}' points at missing '{next}'", entry.id),
                        ));
                    }
                }
            }
        }
        Ok(Self { categories })
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, id: &str) -> Result<&Category> {
        self.categories
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| Error::UnknownCategory(id.to_string()))
    }

    pub fn lookup(&self, category: &str, item: &str) -> Result<&Entry> {
        self.category(category)?
            .entry(item)
            .ok_or_else(|| Error::UnknownItem {
                category: category.to_string(),
                item: item.to_string(),
            })
    }

    pub fn first_in(&self, category: &str) -> Result<&Entry> {
        let category = self.category(category)?;
        // from_categories rejects empty categories
        Ok(&category.entries[0])
    }

    pub fn random_in(&self, category: &str) -> Result<&Entry> {
        let category = self.category(category)?;
        category
            .entries
            .choose(&mut rand::thread_rng())
            .ok_or_else(|| Error::UnknownCategory(category.id.clone()))
    }

    /// The entry that follows `item`, if it declares one
    pub fn next_after(&self, category: &str, item: &str) -> Result<Option<&Entry>> {
        let current = self.lookup(category, item)?;
        match &current.next {
            Some(next) => self.lookup(category, next).map(Some),
            None => Ok(None),
        }
    }
}

fn parse_category(name: &str, json: &str) -> Result<Category> {
    serde_json::from_str(json).map_err(|e| invalid(name, &e.to_string()))
}

fn invalid(file: &str, reason: &str) -> Error {
    Error::InvalidCatalog {
        file: file.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn entry(id: &str, next: Option<&str>) -> Entry {
        Entry {
            id: id.to_string(),
            title: id.to_uppercase(),
            difficulty: Difficulty::Easy,
            text: format!("text for {id}"),
            next: next.map(str::to_string),
        }
    }

    fn category(id: &str, entries: Vec<Entry>) -> Category {
        Category {
            id: id.to_string(),
            title: id.to_string(),
            description: String::new(),
            entries,
        }
    }

    #[test]
    fn test_builtin_catalog_loads() {
        let catalog = Catalog::builtin().unwrap();

        assert!(!catalog.categories().is_empty());
        for category in catalog.categories() {
            assert!(!category.entries.is_empty());
        }
    }

    #[test]
    fn test_builtin_tutor_levels_chain() {
        let catalog = Catalog::builtin().unwrap();

        let first = catalog.first_in("tutor").unwrap();
        let second = catalog.next_after("tutor", &first.id).unwrap().unwrap();
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_builtin_code_keeps_newlines() {
        let catalog = Catalog::builtin().unwrap();
        let rust = catalog.category("rust").unwrap();

        assert!(rust.entries.iter().any(|e| e.text.contains('\n')));
    }

    #[test]
    fn test_lookup_errors() {
        let catalog = Catalog::from_categories(vec![category("a", vec![entry("x", None)])]).unwrap();

        assert_eq!(catalog.lookup("a", "x").unwrap().id, "x");
        assert_matches!(catalog.lookup("b", "x"), Err(Error::UnknownCategory(c)) if c == "b");
        assert_matches!(
            catalog.lookup("a", "y"),
            Err(Error::UnknownItem { category, item }) if category == "a" && item == "y"
        );
    }

    #[test]
    fn test_next_after() {
        let catalog = Catalog::from_categories(vec![category(
            "levels",
            vec![entry("one", Some("two")), entry("two", None)],
        )])
        .unwrap();

        assert_eq!(catalog.next_after("levels", "one").unwrap().unwrap().id, "two");
        assert!(catalog.next_after("levels", "two").unwrap().is_none());
    }

    #[test]
    fn test_rejects_dangling_next() {
        let result = Catalog::from_categories(vec![category("a", vec![entry("x", Some("nope"))])]);
        assert_matches!(result, Err(Error::InvalidCatalog { .. }));
    }

    #[test]
    fn test_rejects_duplicates_and_empty() {
        let dup_entries = vec![category("a", vec![entry("x", None), entry("x", None)])];
        assert_matches!(
            Catalog::from_categories(dup_entries),
            Err(Error::InvalidCatalog { .. })
        );

        let dup_categories = vec![
            category("a", vec![entry("x", None)]),
            category("a", vec![entry("y", None)]),
        ];
        assert_matches!(
            Catalog::from_categories(dup_categories),
            Err(Error::InvalidCatalog { .. })
        );

        assert_matches!(
            Catalog::from_categories(vec![category("a", vec![])]),
            Err(Error::InvalidCatalog { .. })
        );
    }

    #[test]
    fn test_random_in_stays_in_category() {
        let catalog = Catalog::from_categories(vec![category(
            "a",
            vec![entry("x", None), entry("y", None)],
        )])
        .unwrap();

        for _ in 0..10 {
            let picked = catalog.random_in("a").unwrap();
            assert!(picked.id == "x" || picked.id == "y");
        }
    }

    #[test]
    fn test_parse_category_reports_file() {
        let err = parse_category("broken.json", "{").unwrap_err();
        assert_matches!(err, Error::InvalidCatalog { file, .. } if file == "broken.json");
    }

    #[test]
    fn test_difficulty_labels() {
        assert_eq!(Difficulty::Medium.to_string(), "medium");
        let parsed: Difficulty = serde_json::from_str("\"hard\"").unwrap();
        assert_eq!(parsed, Difficulty::Hard);
    }
}
