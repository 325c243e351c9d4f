use async_trait::async_trait;

use super::domain::{AdminAnketa, AdminCategory, AdminCity, AdminUser};
use super::filters::{AdminAnketaFilter, AdminUserFilter, NameFilter};
use crate::errors::ServiceError;
use crate::listing::domain::{Category, City};
use crate::pagination::Pagination;

/// Admin reads. Every row carries the counts of its related records.
#[async_trait]
pub trait AdminRepository: Send + Sync {
    /// Newest first.
    async fn users(&self, filter: &AdminUserFilter) -> Result<Vec<AdminUser>, ServiceError>;
    /// All statuses unless the filter narrows them; newest first, `id` last.
    async fn anketas(&self, filter: &AdminAnketaFilter, paging: &Pagination) -> Result<Vec<AdminAnketa>, ServiceError>;
    /// By name.
    async fn categories(&self, filter: &NameFilter) -> Result<Vec<AdminCategory>, ServiceError>;
    /// By name.
    async fn cities(&self, filter: &NameFilter) -> Result<Vec<AdminCity>, ServiceError>;

    /// Fails with `Conflict` when the slug is taken.
    async fn create_category(&self, name: &str, slug: &str) -> Result<Category, ServiceError>;
    /// Fails with `Conflict` when the name is taken.
    async fn create_city(&self, name: &str) -> Result<City, ServiceError>;
}
