//! Observability setup for panelbus binaries.

pub mod tracing_setup;
