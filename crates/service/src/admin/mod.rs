//! Admin panels: role-gated reads annotated with related-record counts, plus
//! catalog maintenance.

pub mod domain;
pub mod filters;
pub mod repository;
pub mod repo;
pub mod service;

pub use service::AdminService;
