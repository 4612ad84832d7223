//! Category catalog: which listing page belongs to which category key

use crate::config::types::CategoryEntry;
use std::collections::BTreeMap;

/// Categories crawled first when south-first ordering is enabled
pub const SOUTH_PRIORITY_CATEGORIES: [&str; 4] = ["tamil", "telugu", "malayalam", "kannada"];

/// Category keys crawled when none are configured, in their default order
pub const DEFAULT_CATEGORIES: [&str; 13] = [
    "tamil",
    "telugu",
    "malayalam",
    "kannada",
    "indian",
    "hindi",
    "bengali",
    "marathi",
    "punjabi",
    "gujarati",
    "odia",
    "assamese",
    "bhojpuri",
];

const BUILTIN_TEMPLATES: [(&str, &str); 13] = [
    ("indian", "Category:{year}_Indian_films"),
    ("tamil", "Category:{year}_Tamil-language_films"),
    ("telugu", "Category:{year}_Telugu-language_films"),
    ("malayalam", "Category:{year}_Malayalam-language_films"),
    ("kannada", "Category:{year}_Kannada-language_films"),
    ("hindi", "Category:{year}_Hindi-language_films"),
    ("bengali", "Category:{year}_Bengali-language_films"),
    ("marathi", "Category:{year}_Marathi-language_films"),
    ("punjabi", "Category:{year}_Punjabi-language_films"),
    ("gujarati", "Category:{year}_Gujarati-language_films"),
    ("odia", "Category:{year}_Odia-language_films"),
    ("assamese", "Category:{year}_Assamese-language_films"),
    ("bhojpuri", "Category:{year}_Bhojpuri-language_films"),
];

/// Maps category keys to wiki page title templates
///
/// A template is a page title in which `{year}` is substituted with the task
/// year. Templates without `{year}` address the same page for every year.
#[derive(Debug, Clone)]
pub struct CategoryCatalog {
    templates: BTreeMap<String, String>,
}

impl CategoryCatalog {
    /// Catalog with only the built-in categories
    pub fn builtin() -> Self {
        let templates = BUILTIN_TEMPLATES
            .iter()
            .map(|(key, template)| (key.to_string(), template.to_string()))
            .collect();
        Self { templates }
    }

    /// Built-in catalog extended (or overridden) by configured entries
    pub fn with_entries(entries: &[CategoryEntry]) -> Self {
        let mut catalog = Self::builtin();
        for entry in entries {
            catalog
                .templates
                .insert(entry.key.clone(), entry.template.clone());
        }
        catalog
    }

    /// Returns the page title template for a key
    pub fn template(&self, key: &str) -> Option<&str> {
        self.templates.get(key).map(String::as_str)
    }

    /// Returns true if the key is known
    pub fn contains(&self, key: &str) -> bool {
        self.templates.contains_key(key)
    }

    /// All known keys, sorted
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    /// Builds the listing URL of a category for one year
    ///
    /// Returns None for unknown keys.
    pub fn source_url(&self, base_url: &str, key: &str, year: i32) -> Option<String> {
        let template = self.template(key)?;
        let title = template.replace("{year}", &year.to_string());
        Some(format!("{}/wiki/{}", base_url.trim_end_matches('/'), title))
    }
}

impl Default for CategoryCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
