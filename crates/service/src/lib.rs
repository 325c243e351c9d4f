//! Service layer providing the marketplace's business operations on top of models.
//! - Separates business logic from data access (repository traits + SeaORM / in-memory impls).
//! - Reuses validation and entity definitions in `models` crate.
//! - Every guarded operation takes an explicit [`session::RequestContext`].

pub mod errors;
pub mod pagination;
pub mod contact;
pub mod session;
pub mod listing;
pub mod auth;
pub mod admin;
pub mod storage;
#[cfg(test)]
pub mod test_support;
