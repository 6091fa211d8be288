//! Structured metric events.
//!
//! Metrics are emitted as `tracing` events under the `machine_view::metrics`
//! target so they can be aggregated from logs.
//!
//! ## Metrics Exposed
//!
//! - `mode_change` - every transition between human and machine mode
//! - `document_rendered` - slice count, byte size and latency per render
//! - `copy` - clipboard copy attempts and their outcome

use tracing::info;

use crate::types::Mode;

/// Record a mode transition.
pub fn record_mode_change(from: Mode, to: Mode) {
    info!(
        target: "machine_view::metrics",
        metric_type = "mode_change",
        from = %from,
        to = %to,
        "mode_change_metric"
    );
}

/// Record a serializer run.
pub fn record_document_rendered(slice_count: usize, bytes: usize, latency_us: u64) {
    info!(
        target: "machine_view::metrics",
        metric_type = "document_rendered",
        slice_count = slice_count,
        bytes = bytes,
        latency_us = latency_us,
        "document_rendered_metric"
    );
}

/// Record a clipboard copy attempt.
pub fn record_copy(success: bool) {
    let result = if success { "copied" } else { "failed" };
    info!(
        target: "machine_view::metrics",
        metric_type = "copy",
        result = result,
        "copy_metric"
    );
}
