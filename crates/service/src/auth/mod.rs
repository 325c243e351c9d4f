//! Auth module: three-layer architecture (domain, repository, service).
//!
//! Registration, password login into a server-held session, logout and
//! "who am I" all live here; the HTTP layer only moves cookies around.

pub mod domain;
pub mod repository;
pub mod service;
pub mod repo;

pub use service::{AuthConfig, AuthService};
