use async_trait::async_trait;
use uuid::Uuid;

use super::domain::{Anketa, AnketaFilter, Category, City, NewAnketa, NewReview, QueryOptions, Review};
use crate::errors::ServiceError;

/// Persistence for listings, their reviews and the catalog they reference.
///
/// Implementations must order every listing page with `id` as the final
/// tie-breaker so consecutive pages never overlap.
#[async_trait]
pub trait ListingRepository: Send + Sync {
    /// Active listings only.
    async fn count(&self, filter: &AnketaFilter) -> Result<u64, ServiceError>;
    /// Active listings only.
    async fn list(&self, filter: &AnketaFilter, opts: &QueryOptions) -> Result<Vec<Anketa>, ServiceError>;
    async fn get(&self, id: Uuid) -> Result<Option<Anketa>, ServiceError>;

    async fn count_active_by_owner(&self, owner_id: Uuid) -> Result<u64, ServiceError>;
    /// Input is already validated; the new listing starts active with no reviews.
    async fn insert(&self, owner_id: Uuid, input: &NewAnketa) -> Result<Anketa, ServiceError>;
    async fn set_active(&self, id: Uuid, active: bool) -> Result<Option<Anketa>, ServiceError>;
    async fn delete(&self, id: Uuid) -> Result<bool, ServiceError>;
    /// Store the review and refresh the listing's rating aggregates atomically.
    async fn add_review(&self, anketa_id: Uuid, author_id: Uuid, input: &NewReview) -> Result<Review, ServiceError>;

    async fn categories(&self) -> Result<Vec<Category>, ServiceError>;
    async fn cities(&self) -> Result<Vec<City>, ServiceError>;
    async fn find_category(&self, id: Uuid) -> Result<Option<Category>, ServiceError>;
    async fn find_city(&self, id: Uuid) -> Result<Option<City>, ServiceError>;
}
