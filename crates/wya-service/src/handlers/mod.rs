//! HTTP request handlers for the wya? service.

pub mod feed;
pub mod health;
pub mod metrics;
pub mod whoami;

pub use feed::get_feed;
pub use health::{health_check, root};
pub use metrics::metrics_handler;
pub use whoami::whoami;
