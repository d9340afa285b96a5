//! Public JSON API consumed by the site frontend.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::application::{
    contact::{AttachmentUpload, ContactService},
    content::ContentService,
    error::AppError,
    reviews::ReviewService,
};
use crate::domain::{
    contact::QuoteRequestDraft,
    content::{ContentItem, ContentKind, FilterState, Selection},
    reviews::{Provenance, ReviewFeed, ReviewItem},
};

use super::middleware::{log_responses, set_request_context};

#[derive(Clone)]
pub struct HttpState {
    pub reviews: Arc<ReviewService>,
    pub content: ContentService,
    pub contact: Arc<ContactService>,
    pub contact_body_limit: usize,
}

pub fn build_router(state: HttpState) -> Router {
    let contact_body_limit = state.contact_body_limit;

    Router::new()
        .route("/api/reviews", get(reviews))
        .route("/api/gallery", get(gallery))
        .route("/api/gallery/filters", get(gallery_filters))
        .route("/api/blog", get(blog))
        .route(
            "/api/contact",
            post(contact).layer(DefaultBodyLimit::max(contact_body_limit)),
        )
        .route("/_health", get(health))
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Wire shape of the reviews endpoint. Always a 200: degraded feeds are
/// ordinary payloads distinguished by `source`/`reason`, never an error
/// status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReviewsResponse {
    success: bool,
    reviews: Vec<ReviewItem>,
    source: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    google_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fallback_count: Option<usize>,
}

impl From<ReviewFeed> for ReviewsResponse {
    fn from(feed: ReviewFeed) -> Self {
        let google_count = match feed.provenance {
            Provenance::Fallback => None,
            Provenance::Cache | Provenance::Live => Some(feed.live_count),
        };
        Self {
            success: true,
            reviews: feed.items,
            source: feed.provenance.wire_name(),
            reason: feed.reason.map(|reason| reason.as_str()),
            google_count,
            fallback_count: Some(feed.fallback_count),
        }
    }
}

async fn reviews(State(state): State<HttpState>) -> Json<ReviewsResponse> {
    let feed = state.reviews.load().await;
    Json(ReviewsResponse::from(feed))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GalleryQuery {
    category: Option<String>,
    material: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BlogQuery {
    category: Option<String>,
    tag: Option<String>,
}

#[derive(Debug, Serialize)]
struct ListResponse {
    items: Vec<ContentItem>,
    total: usize,
}

fn list_response(items: Vec<&ContentItem>) -> Json<ListResponse> {
    let items: Vec<ContentItem> = items.into_iter().cloned().collect();
    let total = items.len();
    Json(ListResponse { items, total })
}

async fn gallery(
    State(state): State<HttpState>,
    Query(query): Query<GalleryQuery>,
) -> Json<ListResponse> {
    let filter = FilterState::new(
        Selection::parse(query.category.as_deref()),
        Selection::parse(query.material.as_deref()),
    );
    list_response(state.content.list(ContentKind::Gallery, &filter))
}

async fn blog(
    State(state): State<HttpState>,
    Query(query): Query<BlogQuery>,
) -> Json<ListResponse> {
    let filter = FilterState::new(
        Selection::parse(query.category.as_deref()),
        Selection::parse(query.tag.as_deref()),
    );
    list_response(state.content.list(ContentKind::Blog, &filter))
}

#[derive(Debug, Serialize)]
struct GalleryFiltersResponse {
    categories: Vec<String>,
    materials: Vec<String>,
}

async fn gallery_filters(State(state): State<HttpState>) -> Json<GalleryFiltersResponse> {
    let collection = state.content.collection(ContentKind::Gallery);
    Json(GalleryFiltersResponse {
        categories: collection.categories.clone(),
        materials: collection.secondary_tags.clone(),
    })
}

#[derive(Debug, Serialize)]
struct ContactResponse {
    success: bool,
    reference: String,
}

async fn contact(
    State(state): State<HttpState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let (draft, attachment) = read_contact_form(multipart).await?;
    let receipt = state.contact.submit(draft, attachment).await?;
    Ok(Json(ContactResponse {
        success: true,
        reference: receipt.reference,
    }))
}

async fn read_contact_form(
    mut multipart: Multipart,
) -> Result<(QuoteRequestDraft, Option<AttachmentUpload>), AppError> {
    let mut draft = QuoteRequestDraft::default();
    let mut attachment = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::validation(format!("malformed form data: {err}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            "attachment" => {
                let file_name = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| AppError::validation("attachment is missing a file name"))?;
                let data: Bytes = field
                    .bytes()
                    .await
                    .map_err(|err| AppError::validation(format!("attachment upload failed: {err}")))?;
                if !data.is_empty() {
                    attachment = Some(AttachmentUpload { file_name, data });
                }
            }
            _ => {
                let value = field
                    .text()
                    .await
                    .map_err(|err| AppError::validation(format!("malformed field `{name}`: {err}")))?;
                match name.as_str() {
                    "name" => draft.name = Some(value),
                    "email" => draft.email = Some(value),
                    "phone" => draft.phone = Some(value),
                    "service" => draft.service = Some(value),
                    "message" => draft.message = Some(value),
                    // Unknown fields (honeypots, tracking params) are ignored.
                    _ => {}
                }
            }
        }
    }

    Ok((draft, attachment))
}
