use std::{io, sync::Once};

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

/// Counters emitted by the host, with their descriptions.
const COUNTERS: &[(&str, &str)] = &[
    (
        "markview_load_total",
        "Loads issued to a content surface, labelled by strategy.",
    ),
    (
        "markview_staging_copy_total",
        "Copies of the template bundle into a staging directory.",
    ),
    (
        "markview_external_open_total",
        "Link activations handed to the external opener.",
    ),
    (
        "markview_stale_completion_total",
        "Load completions ignored because a newer load superseded them.",
    ),
];

/// Install the global tracing subscriber described by `logging`.
///
/// Events go to stderr so stdout stays free for rendered output.
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
        .map_err(|err| InfraError::telemetry(format!("tracing subscriber already set: {err}")))
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        for &(name, description) in COUNTERS {
            describe_counter!(name, Unit::Count, description);
        }
    });
}
