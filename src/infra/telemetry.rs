use std::io;
use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
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
///
/// Logs are written to stderr; stdout carries rendered fragments.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(io::stderr)
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_writer(io::stderr)
            .with_target(true)
            .boxed(),
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

pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "site_counts_render_total",
            Unit::Count,
            "Total number of fragment renders, labelled by cache result."
        );
        describe_histogram!(
            "site_counts_render_ms",
            Unit::Milliseconds,
            "Fragment computation latency on cache miss in milliseconds."
        );
        describe_counter!(
            "site_counts_cache_error_total",
            Unit::Count,
            "Total number of cache operations that failed and were bypassed."
        );
        describe_counter!(
            "site_counts_cache_hit_total",
            Unit::Count,
            "Total number of fragment cache hits."
        );
        describe_counter!(
            "site_counts_cache_miss_total",
            Unit::Count,
            "Total number of fragment cache misses."
        );
        describe_counter!(
            "site_counts_cache_expired_total",
            Unit::Count,
            "Total number of fragments dropped after their TTL elapsed."
        );
        describe_counter!(
            "site_counts_cache_evict_total",
            Unit::Count,
            "Total number of fragments evicted due to capacity."
        );
    });
}
