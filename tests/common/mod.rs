//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod plugins;

use flowproc::pipeline::{Datum, DatumStatus, Edge, EdgeDatum, MemoryEdge, Stamp};
use std::sync::Once;

/// Route `tracing` output through the test harness. Honors `RUST_LOG`.
pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Push ordinary `i64` datums with consecutive stamps starting at `first`.
pub fn feed(edge: &MemoryEdge, first: u64, values: &[i64]) {
    for (i, v) in values.iter().enumerate() {
        edge.push(EdgeDatum::new(Datum::new(*v), Stamp(first + i as u64)));
    }
}

/// Push a bare status datum.
pub fn feed_status(edge: &MemoryEdge, stamp: u64, status: DatumStatus) {
    edge.push(EdgeDatum::new(Datum::marker(status), Stamp(stamp)));
}

/// Remove everything currently queued on `edge`.
pub fn drain(edge: &MemoryEdge) -> Vec<EdgeDatum> {
    std::iter::from_fn(|| edge.try_pop()).collect()
}

/// Statuses of everything queued on `edge`, removing them.
pub fn drain_statuses(edge: &MemoryEdge) -> Vec<DatumStatus> {
    drain(edge).iter().map(EdgeDatum::status).collect()
}

/// `i64` payloads of everything queued on `edge`, removing them. Non-data
/// datums are skipped.
pub fn drain_values(edge: &MemoryEdge) -> Vec<i64> {
    drain(edge)
        .iter()
        .filter_map(|ed| ed.datum.get::<i64>().copied())
        .collect()
}
