//! Process-wide `tracing` subscriber setup.

use std::str::FromStr;

use tracing::metadata::LevelFilter;
use tracing_subscriber::{
    Layer, filter::FilterFn, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt,
};

const DEFAULT_LEVEL: LevelFilter = if cfg!(debug_assertions) {
    LevelFilter::TRACE
} else {
    LevelFilter::INFO
};

/// Resolve the level filter from a `LOG_LEVEL`-style value.
fn level_filter(value: Option<&str>) -> LevelFilter {
    value.map_or(DEFAULT_LEVEL, |level| {
        LevelFilter::from_str(level).unwrap_or_else(|_| {
            eprintln!("Invalid log level specified {level}, defaulting to {DEFAULT_LEVEL}");
            DEFAULT_LEVEL
        })
    })
}

/// Install a compact stdout subscriber for this crate's events.
///
/// The level comes from `LOG_LEVEL`. Applications that already installed a
/// global subscriber keep theirs.
pub fn init() {
    let level = level_filter(std::env::var("LOG_LEVEL").ok().as_deref());

    let result = tracing_subscriber::Registry::default()
        .with(
            tracing_subscriber::fmt::layer()
                .with_file(false)
                .with_line_number(false)
                .compact()
                .with_ansi(true)
                .with_timer(tracing_subscriber::fmt::time::ChronoUtc::rfc_3339())
                .with_filter(level)
                .with_filter(FilterFn::new(|metadata| {
                    metadata.target().starts_with(env!("CARGO_CRATE_NAME"))
                })),
        )
        .try_init();

    if let Err(e) = result {
        eprintln!("Logging not initialised: {e}");
    }
}
