//! Listing ("anketa") module: filter building, store-backed queries and the
//! guarded mutations owners and admins perform on listings.

pub mod domain;
pub mod filters;
pub mod repository;
pub mod repo;
pub mod service;

pub use filters::{build_anketa_filters, AnketaQueryParams};
pub use service::ListingService;
