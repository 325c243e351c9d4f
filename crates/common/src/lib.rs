//! Shared building blocks used by every crate in the workspace:
//! response types, locale negotiation, logging setup and Prometheus metrics.

pub mod i18n;
pub mod metrics;
pub mod types;
pub mod utils;
