//! Tracing setup.
//!
//! Production output is one JSON object per line. Auth gate rejections and
//! account events carry `role` and `username` fields; secrets are never logged.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "course_market=info,tower_http=info";

/// Install the global JSON subscriber.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let json = tracing_subscriber::fmt::layer()
        .json()
        .flatten_event(true)
        .with_current_span(false)
        .with_span_list(false)
        .with_target(true)
        .with_line_number(true);

    tracing_subscriber::registry().with(filter).with(json).init();
}

/// Plain-text subscriber routed through the test harness. Safe to call repeatedly.
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("course_market=debug")
        .try_init();
}
