use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "printworks_reviews_cache_hit_total",
            Unit::Count,
            "Review feeds served from the TTL cache."
        );
        describe_counter!(
            "printworks_reviews_cache_miss_total",
            Unit::Count,
            "Review requests that missed the TTL cache."
        );
        describe_counter!(
            "printworks_reviews_live_total",
            Unit::Count,
            "Review feeds served from a successful upstream fetch."
        );
        describe_counter!(
            "printworks_reviews_fallback_total",
            Unit::Count,
            "Review feeds served from the bundled fallback list, by reason."
        );
        describe_counter!(
            "printworks_contact_submitted_total",
            Unit::Count,
            "Quote requests accepted and mailed out."
        );
        describe_counter!(
            "printworks_contact_mail_failed_total",
            Unit::Count,
            "Quote requests whose notification mail failed."
        );
    });
}
