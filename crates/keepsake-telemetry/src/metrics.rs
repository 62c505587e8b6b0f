//! Metric name constants and recording helpers

use std::time::Instant;

use opentelemetry::{
    global,
    metrics::{Histogram, Meter},
};

/// Meter shared by every Keepsake instrument
///
/// Resolves to a no-op meter until [`crate::init`] installs an exporter.
pub fn meter() -> Meter {
    global::meter("keepsake")
}

/// Record a duration measurement on a histogram
pub fn record_duration(
    histogram: &Histogram<f64>,
    start: Instant,
    attributes: &[opentelemetry::KeyValue],
) {
    let duration = start.elapsed().as_secs_f64();
    histogram.record(duration, attributes);
}

// Generation metric names
pub const GENERATION_DURATION: &str = "keepsake.generation.duration";
pub const GENERATION_COUNT: &str = "keepsake.generation.count";

// Upload metric names
pub const UPLOAD_IMAGES: &str = "keepsake.upload.images";
pub const UPLOAD_COMPRESSED_BYTES: &str = "keepsake.upload.compressed_bytes";
