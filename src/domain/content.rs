//! Content items shown on the gallery and blog listings, and the filter
//! state the visitor selects.

use serde::{Deserialize, Serialize};
use time::Date;

use super::normalize::normalize_key;

/// Which listing a collection feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Gallery,
    Blog,
}

impl ContentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentKind::Gallery => "gallery",
            ContentKind::Blog => "blog",
        }
    }
}

/// A tagged content entry. The filter engine only reads `category` and
/// `secondary_tags`; the remaining fields are display data passed through
/// to the frontend untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    pub title: String,
    /// Normalized on load; one of the collection's known categories.
    pub category: String,
    /// Normalized on load. Materials for gallery pieces, topic tags for
    /// blog posts.
    #[serde(default)]
    pub secondary_tags: Vec<String>,
    pub published_at: Date,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub link: String,
}

/// One filter dimension: everything, or a single selected value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    All,
    Value(String),
}

impl Selection {
    /// Parse a query-parameter value. Missing, empty, and the literal
    /// `all` all mean "no filter on this dimension".
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            None => Selection::All,
            Some(value) => {
                let key = normalize_key(value);
                if key.is_empty() || key == "all" {
                    Selection::All
                } else {
                    Selection::Value(key)
                }
            }
        }
    }

    pub fn matches(&self, candidate: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Value(wanted) => normalize_key(candidate) == *wanted,
        }
    }
}

/// Active filter state for one listing request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterState {
    pub category: Selection,
    pub secondary: Selection,
}

impl FilterState {
    pub fn new(category: Selection, secondary: Selection) -> Self {
        Self {
            category,
            secondary,
        }
    }

    pub fn is_unfiltered(&self) -> bool {
        self.category == Selection::All && self.secondary == Selection::All
    }
}
