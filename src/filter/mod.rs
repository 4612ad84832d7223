//! Genre filtering
//!
//! Decides whether a title belongs to the target genre from three signals:
//!
//! | Signal | Source | Match |
//! |--------|--------|-------|
//! | (a) listing label | category page heading and item labels | genre token as a whole word |
//! | (b) page genres | infobox "Genre" row and page categories | genre token as a whole word |
//! | (c) description | first substantial paragraph | any curated keyword or phrase |
//!
//! A title is in scope if any signal matches. Missing data never counts as a
//! match, so a title whose page could not be fetched is only kept when its
//! listing already confirmed it.

use crate::checkpoint::DetailInfo;
use crate::config::FilterConfig;
use crate::crawler::CandidateEntity;
use crate::ConfigError;
use regex::{Regex, RegexBuilder};

/// Outcome of the listing-only check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDecision {
    /// The listing labels already place the title in the genre
    Confirmed,

    /// The film page must be inspected before deciding
    NeedsDetail,
}

/// Compiled genre and keyword matchers
#[derive(Debug, Clone)]
pub struct GenreFilter {
    genre: String,
    genre_pattern: Regex,
    keyword_pattern: Option<Regex>,
}

impl GenreFilter {
    /// Compiles a filter for `genre` with the given description keywords
    ///
    /// Keywords may be phrases; whitespace inside a phrase matches any run of
    /// whitespace. Blank keywords are ignored.
    pub fn new(genre: &str, keywords: &[String]) -> Result<Self, ConfigError> {
        let genre = genre.trim();
        if genre.is_empty() {
            return Err(ConfigError::Validation(
                "filter genre must not be empty".to_string(),
            ));
        }

        let genre_pattern = whole_word(&phrase_pattern(genre))?;

        let alternatives: Vec<String> = keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(phrase_pattern)
            .collect();
        let keyword_pattern = if alternatives.is_empty() {
            None
        } else {
            Some(whole_word(&format!("(?:{})", alternatives.join("|")))?)
        };

        Ok(Self {
            genre: genre.to_string(),
            genre_pattern,
            keyword_pattern,
        })
    }

    pub fn from_config(config: &FilterConfig) -> Result<Self, ConfigError> {
        Self::new(&config.genre, &config.keywords)
    }

    pub fn genre(&self) -> &str {
        &self.genre
    }

    /// Checks the listing labels only (signal a)
    pub fn pre_filter(&self, entity: &CandidateEntity) -> FilterDecision {
        if self.matches_labels(&entity.labels) {
            FilterDecision::Confirmed
        } else {
            FilterDecision::NeedsDetail
        }
    }

    /// Checks the page genres and description (signals b and c)
    ///
    /// `None` means the page could not be resolved; the title is excluded.
    pub fn post_filter(&self, detail: Option<&DetailInfo>) -> bool {
        let Some(detail) = detail else {
            return false;
        };

        detail.genres.iter().any(|g| self.genre_pattern.is_match(g))
            || detail
                .description
                .as_deref()
                .is_some_and(|d| self.matches_description(d))
    }

    pub fn matches_labels(&self, labels: &[String]) -> bool {
        labels.iter().any(|label| self.genre_pattern.is_match(label))
    }

    pub fn matches_description(&self, description: &str) -> bool {
        self.keyword_pattern
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(description))
    }
}

fn phrase_pattern(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+")
}

fn whole_word(pattern: &str) -> Result<Regex, ConfigError> {
    RegexBuilder::new(&format!(r"\b{}\b", pattern))
        .case_insensitive(true)
        .build()
        .map_err(|e| ConfigError::Validation(format!("invalid filter pattern: {}", e)))
}
