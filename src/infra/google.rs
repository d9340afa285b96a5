//! Google Places review source.
//!
//! Thin client over the Places Details endpoint, mapping provider JSON
//! into domain [`ReviewItem`]s. All failure modes surface as
//! [`InfraError::Upstream`]; the review orchestrator decides what to do
//! with them.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::debug;

use crate::application::reviews::ReviewSource;
use crate::domain::reviews::{Rating, ReviewItem};
use crate::infra::error::InfraError;

const SERVICE: &str = "google_places";

/// Client configuration; endpoint is overridable so tests (and future
/// proxies) can point it elsewhere.
#[derive(Debug, Clone)]
pub struct GooglePlacesConfig {
    pub endpoint: Url,
    pub api_key: String,
    pub timeout: Duration,
}

pub struct GooglePlacesClient {
    client: Client,
    config: GooglePlacesConfig,
}

impl GooglePlacesClient {
    pub fn new(config: GooglePlacesConfig) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(concat!("printworks/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()
            .map_err(|err| InfraError::upstream(SERVICE, err.to_string()))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl ReviewSource for GooglePlacesClient {
    async fn fetch(&self, place_id: &str) -> Result<Vec<ReviewItem>, InfraError> {
        let mut url = self.config.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("place_id", place_id)
            .append_pair("fields", "reviews,rating")
            .append_pair("key", &self.config.api_key);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| InfraError::upstream(SERVICE, err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(InfraError::upstream(
                SERVICE,
                format!("unexpected status {status}"),
            ));
        }

        let body: DetailsResponse = response
            .json()
            .await
            .map_err(|err| InfraError::upstream(SERVICE, format!("malformed body: {err}")))?;

        // The Places API reports application-level errors with HTTP 200.
        if body.status != "OK" {
            return Err(InfraError::upstream(
                SERVICE,
                format!("provider status `{}`", body.status),
            ));
        }

        let reviews = body
            .result
            .map(|result| result.reviews)
            .unwrap_or_default();
        debug!(
            target = "printworks::google",
            count = reviews.len(),
            "fetched live reviews"
        );

        Ok(reviews.into_iter().map(ProviderReview::into_item).collect())
    }
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    status: String,
    result: Option<DetailsResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DetailsResult {
    reviews: Vec<ProviderReview>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProviderReview {
    author_name: String,
    rating: i64,
    text: String,
    relative_time_description: String,
    /// Unix seconds of the review; combined with the author it gives a
    /// stable id across refetches.
    time: i64,
}

impl ProviderReview {
    fn into_item(self) -> ReviewItem {
        let id = format!(
            "google-{}-{}",
            self.time,
            slug::slugify(&self.author_name)
        );
        ReviewItem {
            id,
            author_name: self.author_name,
            role: "Google review".to_string(),
            body: self.text,
            rating: Rating::clamped(self.rating),
            display_date: self.relative_time_description,
            verified: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_review_maps_to_item() {
        let review = ProviderReview {
            author_name: "Mara Voss".to_string(),
            rating: 5,
            text: "Fantastic prints.".to_string(),
            relative_time_description: "a month ago".to_string(),
            time: 1_760_000_000,
        };

        let item = review.into_item();
        assert_eq!(item.id, "google-1760000000-mara-voss");
        assert_eq!(item.rating.get(), 5);
        assert!(item.verified);
        assert_eq!(item.display_date, "a month ago");
    }

    #[test]
    fn zero_rating_clamps_instead_of_failing() {
        let review = ProviderReview {
            author_name: "Anon".to_string(),
            rating: 0,
            ..Default::default()
        };
        assert_eq!(review.into_item().rating.get(), 1);
    }

    #[test]
    fn details_response_parses_without_result() {
        let body = r#"{"status":"ZERO_RESULTS"}"#;
        let parsed: DetailsResponse = serde_json::from_str(body).expect("parse");
        assert_eq!(parsed.status, "ZERO_RESULTS");
        assert!(parsed.result.is_none());
    }

    #[test]
    fn details_response_parses_reviews() {
        let body = r#"{
            "status": "OK",
            "result": {
                "rating": 4.8,
                "reviews": [
                    {"author_name": "A", "rating": 5, "text": "Great",
                     "relative_time_description": "a week ago", "time": 100}
                ]
            }
        }"#;
        let parsed: DetailsResponse = serde_json::from_str(body).expect("parse");
        let result = parsed.result.expect("result");
        assert_eq!(result.reviews.len(), 1);
        assert_eq!(result.reviews[0].author_name, "A");
    }
}
