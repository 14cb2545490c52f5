//! Observability for the wya? service.

pub mod metrics;
