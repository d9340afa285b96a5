//! Review feed types shared by the orchestrator and the HTTP surface.

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Star rating, guaranteed to sit within 1..=5. The serde round-trip
/// goes through [`Rating::new`], so deserialized data cannot dodge the
/// range check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl TryFrom<u8> for Rating {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Build a rating, rejecting out-of-range values.
    pub fn new(value: u8) -> Result<Self, DomainError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(DomainError::invariant(format!(
                "rating {value} outside {}..={}",
                Self::MIN,
                Self::MAX
            )))
        }
    }

    /// Build a rating from untrusted upstream data by clamping into range.
    ///
    /// Upstream providers occasionally report 0 for reviews without a star
    /// value; those render as one star rather than breaking the feed.
    pub fn clamped(value: i64) -> Self {
        Self(value.clamp(Self::MIN as i64, Self::MAX as i64) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

/// A single displayable review, identical in shape for live and fallback
/// provenance. Where an item came from is carried by [`ReviewFeed`], not
/// by the item itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewItem {
    /// Stable across refetches, used for de-duplication on the client.
    pub id: String,
    pub author_name: String,
    /// Short descriptor shown under the author, e.g. "Prop maker".
    pub role: String,
    pub body: String,
    pub rating: Rating,
    /// Already formatted for display; opaque to this crate.
    pub display_date: String,
    pub verified: bool,
}

/// Where a served feed actually came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Cache,
    Live,
    Fallback,
}

impl Provenance {
    /// Wire value used by the public API. Live data is labelled by the
    /// provider name the frontend historically keyed on.
    pub fn wire_name(self) -> &'static str {
        match self {
            Provenance::Cache => "cache",
            Provenance::Live => "google",
            Provenance::Fallback => "fallback",
        }
    }
}

/// Why a feed degraded. Informational only; callers never branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    MissingSourceId,
    UpstreamError,
    NoLiveItems,
}

impl FallbackReason {
    pub fn as_str(self) -> &'static str {
        match self {
            FallbackReason::MissingSourceId => "missing_source_id",
            FallbackReason::UpstreamError => "upstream_error",
            FallbackReason::NoLiveItems => "no_live_items",
        }
    }
}

/// The orchestrator's always-renderable output. There is deliberately no
/// error variant: degraded paths are ordinary values of this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewFeed {
    pub items: Vec<ReviewItem>,
    pub provenance: Provenance,
    pub reason: Option<FallbackReason>,
    /// How many of `items` came from the live upstream.
    pub live_count: usize,
    /// How many of `items` came from the bundled fallback list.
    pub fallback_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_accepts_range_bounds() {
        assert_eq!(Rating::new(1).expect("min").get(), 1);
        assert_eq!(Rating::new(5).expect("max").get(), 5);
    }

    #[test]
    fn rating_rejects_out_of_range() {
        assert!(Rating::new(0).is_err());
        assert!(Rating::new(6).is_err());
    }

    #[test]
    fn clamped_rating_stays_in_range() {
        assert_eq!(Rating::clamped(0).get(), 1);
        assert_eq!(Rating::clamped(7).get(), 5);
        assert_eq!(Rating::clamped(4).get(), 4);
    }

    #[test]
    fn rating_deserialization_enforces_range() {
        assert!(serde_json::from_str::<Rating>("0").is_err());
        assert!(serde_json::from_str::<Rating>("6").is_err());
        let rating: Rating = serde_json::from_str("4").expect("in-range value");
        assert_eq!(rating.get(), 4);
        assert_eq!(serde_json::to_string(&rating).expect("serialize"), "4");
    }

    #[test]
    fn provenance_wire_names() {
        assert_eq!(Provenance::Cache.wire_name(), "cache");
        assert_eq!(Provenance::Live.wire_name(), "google");
        assert_eq!(Provenance::Fallback.wire_name(), "fallback");
    }
}
