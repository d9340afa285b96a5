//! Content listing: the filter engine shared by the gallery and blog.
//!
//! The collections are loaded once at startup (see
//! `infra::content_store`); filtering is a pure, order-preserving pass
//! over the in-memory slice and costs O(n) per request.

use std::sync::Arc;

use crate::domain::content::{ContentItem, ContentKind, FilterState, Selection};

/// Visible subset of `items` under `state`.
///
/// Stable: output preserves the relative order of the input. An empty
/// result is an ordinary outcome rendered as "no results" upstream, not
/// an error. The input is never mutated, so repeated calls with different
/// states are free beyond the pass itself.
pub fn filter_items<'a>(items: &'a [ContentItem], state: &FilterState) -> Vec<&'a ContentItem> {
    items
        .iter()
        .filter(|item| {
            state.category.matches(&item.category)
                && match &state.secondary {
                    Selection::All => true,
                    Selection::Value(_) => item
                        .secondary_tags
                        .iter()
                        .any(|tag| state.secondary.matches(tag)),
                }
        })
        .collect()
}

/// One loaded collection plus the distinct filter values it offers.
#[derive(Debug, Clone)]
pub struct ContentCollection {
    pub kind: ContentKind,
    pub items: Vec<ContentItem>,
    /// Distinct normalized categories, in first-seen order.
    pub categories: Vec<String>,
    /// Distinct normalized secondary tags, in first-seen order.
    pub secondary_tags: Vec<String>,
}

impl ContentCollection {
    pub fn new(kind: ContentKind, items: Vec<ContentItem>) -> Self {
        let mut categories: Vec<String> = Vec::new();
        let mut secondary_tags: Vec<String> = Vec::new();
        for item in &items {
            if !categories.contains(&item.category) {
                categories.push(item.category.clone());
            }
            for tag in &item.secondary_tags {
                if !secondary_tags.contains(tag) {
                    secondary_tags.push(tag.clone());
                }
            }
        }
        Self {
            kind,
            items,
            categories,
            secondary_tags,
        }
    }
}

/// Read access to the gallery and blog collections.
#[derive(Clone)]
pub struct ContentService {
    gallery: Arc<ContentCollection>,
    blog: Arc<ContentCollection>,
}

impl ContentService {
    pub fn new(gallery: ContentCollection, blog: ContentCollection) -> Self {
        Self {
            gallery: Arc::new(gallery),
            blog: Arc::new(blog),
        }
    }

    pub fn collection(&self, kind: ContentKind) -> &ContentCollection {
        match kind {
            ContentKind::Gallery => &self.gallery,
            ContentKind::Blog => &self.blog,
        }
    }

    /// Filtered view of one collection.
    pub fn list(&self, kind: ContentKind, state: &FilterState) -> Vec<&ContentItem> {
        filter_items(&self.collection(kind).items, state)
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;
    use crate::domain::content::Selection;

    fn item(id: &str, category: &str, tags: &[&str]) -> ContentItem {
        ContentItem {
            id: id.to_string(),
            title: format!("Piece {id}"),
            category: category.to_string(),
            secondary_tags: tags.iter().map(|t| t.to_string()).collect(),
            published_at: date!(2026 - 01 - 15),
            summary: String::new(),
            image_url: String::new(),
            link: String::new(),
        }
    }

    fn sample() -> Vec<ContentItem> {
        vec![
            item("1", "prototyping", &["pla"]),
            item("2", "cosplay", &["resin"]),
            item("3", "prototyping", &["petg", "pla"]),
        ]
    }

    fn state(category: Option<&str>, secondary: Option<&str>) -> FilterState {
        FilterState::new(Selection::parse(category), Selection::parse(secondary))
    }

    #[test]
    fn category_filter_is_stable() {
        let items = sample();
        let visible = filter_items(&items, &state(Some("prototyping"), None));
        let ids: Vec<_> = visible.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["1", "3"]);
    }

    #[test]
    fn unfiltered_returns_everything_in_order() {
        let items = sample();
        let visible = filter_items(&items, &state(None, None));
        assert_eq!(visible.len(), 3);
        let ids: Vec<_> = visible.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["1", "2", "3"]);
    }

    #[test]
    fn secondary_filter_matches_tag_membership() {
        let items = sample();
        let visible = filter_items(&items, &state(None, Some("pla")));
        let ids: Vec<_> = visible.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["1", "3"]);
    }

    #[test]
    fn both_dimensions_combine_with_and() {
        let items = sample();
        let visible = filter_items(&items, &state(Some("prototyping"), Some("petg")));
        let ids: Vec<_> = visible.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["3"]);
    }

    #[test]
    fn invisible_characters_do_not_break_matching() {
        let mut items = sample();
        items[0].category = "prototyping\u{200B}".to_string();
        let visible = filter_items(&items, &state(Some("prototyping"), None));
        let ids: Vec<_> = visible.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["1", "3"]);
    }

    #[test]
    fn unknown_values_yield_empty_not_error() {
        let items = sample();
        assert!(filter_items(&items, &state(Some("jewellery"), None)).is_empty());
        assert!(filter_items(&items, &state(None, Some("nylon"))).is_empty());
    }

    #[test]
    fn filtering_is_idempotent_and_non_mutating() {
        let items = sample();
        let snapshot = items.clone();
        let st = state(Some("prototyping"), None);
        let first: Vec<String> = filter_items(&items, &st)
            .iter()
            .map(|i| i.id.clone())
            .collect();
        let second: Vec<String> = filter_items(&items, &st)
            .iter()
            .map(|i| i.id.clone())
            .collect();
        assert_eq!(first, second);
        assert_eq!(items, snapshot);
    }

    #[test]
    fn collection_exposes_distinct_filter_values() {
        let collection = ContentCollection::new(ContentKind::Gallery, sample());
        assert_eq!(collection.categories, ["prototyping", "cosplay"]);
        assert_eq!(collection.secondary_tags, ["pla", "resin", "petg"]);
    }
}
