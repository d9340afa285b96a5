//! File-backed content collections.
//!
//! Gallery and blog entries live in versioned TOML files under the
//! configured content directory. Collections are read once at startup;
//! category and tag values are sanitized on load so every later
//! comparison runs on clean data.

use std::path::Path;

use serde::Deserialize;
use time::{Date, macros::format_description};
use tracing::info;

use crate::application::content::ContentCollection;
use crate::domain::content::{ContentItem, ContentKind};
use crate::domain::normalize::normalize;
use crate::infra::error::InfraError;

const GALLERY_FILE: &str = "gallery.toml";
const BLOG_FILE: &str = "blog.toml";

/// Load both collections from `directory`.
pub async fn load(directory: &Path) -> Result<(ContentCollection, ContentCollection), InfraError> {
    let gallery = load_collection(ContentKind::Gallery, &directory.join(GALLERY_FILE)).await?;
    let blog = load_collection(ContentKind::Blog, &directory.join(BLOG_FILE)).await?;
    Ok((gallery, blog))
}

async fn load_collection(
    kind: ContentKind,
    path: &Path,
) -> Result<ContentCollection, InfraError> {
    let raw = tokio::fs::read_to_string(path).await.map_err(|err| {
        InfraError::content_store(format!(
            "failed to read {} collection `{}`: {err}",
            kind.as_str(),
            path.display()
        ))
    })?;

    let collection = parse_collection(kind, &raw)?;
    info!(
        target = "printworks::content",
        kind = kind.as_str(),
        items = collection.items.len(),
        categories = collection.categories.len(),
        "loaded content collection"
    );
    Ok(collection)
}

fn parse_collection(kind: ContentKind, raw: &str) -> Result<ContentCollection, InfraError> {
    let file: CollectionFile = toml::from_str(raw).map_err(|err| {
        InfraError::content_store(format!("malformed {} collection: {err}", kind.as_str()))
    })?;

    let mut items = Vec::with_capacity(file.items.len());
    for entry in file.items {
        items.push(entry.into_item(kind)?);
    }
    Ok(ContentCollection::new(kind, items))
}

#[derive(Debug, Deserialize)]
struct CollectionFile {
    #[serde(default)]
    items: Vec<RawItem>,
}

#[derive(Debug, Deserialize)]
struct RawItem {
    id: String,
    title: String,
    category: String,
    #[serde(default)]
    tags: Vec<String>,
    /// ISO date, e.g. `2026-03-10`.
    published_at: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    image_url: String,
    #[serde(default)]
    link: String,
}

impl RawItem {
    fn into_item(self, kind: ContentKind) -> Result<ContentItem, InfraError> {
        let format = format_description!("[year]-[month]-[day]");
        let published_at = Date::parse(&self.published_at, &format).map_err(|err| {
            InfraError::content_store(format!(
                "{} item `{}` has invalid published_at `{}`: {err}",
                kind.as_str(),
                self.id,
                self.published_at
            ))
        })?;

        let category = normalize(&self.category);
        if category.is_empty() {
            return Err(InfraError::content_store(format!(
                "{} item `{}` has an empty category",
                kind.as_str(),
                self.id
            )));
        }

        Ok(ContentItem {
            id: self.id,
            title: self.title,
            category,
            secondary_tags: self
                .tags
                .iter()
                .map(|tag| normalize(tag))
                .filter(|tag| !tag.is_empty())
                .collect(),
            published_at,
            summary: self.summary,
            image_url: self.image_url,
            link: self.link,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [[items]]
        id = "voronoi-lamp"
        title = "Voronoi table lamp"
        category = " Home-Decor "
        tags = ["PLA ", " lighting"]
        published_at = "2026-03-10"
        summary = "Printed in matte white PLA."
        image_url = "/static/gallery/voronoi-lamp.jpg"

        [[items]]
        id = "drone-arm"
        title = "Drone arm replacement"
        category = "functional-parts"
        tags = ["petg"]
        published_at = "2025-11-02"
    "#;

    #[test]
    fn parses_and_sanitizes_entries() {
        let collection =
            parse_collection(ContentKind::Gallery, SAMPLE).expect("collection parses");

        assert_eq!(collection.items.len(), 2);
        assert_eq!(collection.items[0].category, "Home-Decor");
        assert_eq!(collection.items[0].secondary_tags, ["PLA", "lighting"]);
        assert_eq!(collection.items[1].published_at.to_string(), "2025-11-02");
    }

    #[test]
    fn strips_invisible_artifacts_on_load() {
        let raw = "[[items]]\n\
             id = \"x\"\n\
             title = \"X\"\n\
             category = \"resin\u{200B}\"\n\
             tags = [\"\u{FEFF}clear\"]\n\
             published_at = \"2026-01-01\"\n";
        let collection = parse_collection(ContentKind::Gallery, raw).expect("parses");
        assert_eq!(collection.items[0].category, "resin");
        assert_eq!(collection.items[0].secondary_tags, ["clear"]);
    }

    #[test]
    fn rejects_bad_dates() {
        let raw = r#"
            [[items]]
            id = "x"
            title = "X"
            category = "misc"
            published_at = "March 2026"
        "#;
        assert!(parse_collection(ContentKind::Blog, raw).is_err());
    }

    #[test]
    fn rejects_empty_category() {
        let raw = r#"
            [[items]]
            id = "x"
            title = "X"
            category = "   "
            published_at = "2026-01-01"
        "#;
        assert!(parse_collection(ContentKind::Blog, raw).is_err());
    }

    #[test]
    fn empty_file_yields_empty_collection() {
        let collection = parse_collection(ContentKind::Blog, "").expect("parses");
        assert!(collection.items.is_empty());
    }
}
