use std::sync::Arc;

use tracing::{info, instrument};

use super::domain::{AdminAnketa, AdminCategory, AdminCity, AdminUser, NewCategory, NewCity};
use super::filters::{AdminAnketaParams, AdminUserParams, NameParams};
use super::repository::AdminRepository;
use crate::errors::ServiceError;
use crate::listing::domain::{Category, City};
use crate::pagination::{Pagination, PaginationPolicy};
use crate::session::RequestContext;
use common::metrics::LISTING_QUERIES_TOTAL;

/// Admin panel operations; each one checks the admin guard before touching the store.
pub struct AdminService<R: AdminRepository + ?Sized> {
    repo: Arc<R>,
    policy: PaginationPolicy,
}

impl<R: AdminRepository + ?Sized> AdminService<R> {
    pub fn new(repo: Arc<R>, policy: PaginationPolicy) -> Self { Self { repo, policy } }

    #[instrument(skip(self, ctx))]
    pub async fn users(&self, ctx: &RequestContext, params: &AdminUserParams) -> Result<Vec<AdminUser>, ServiceError> {
        ctx.require_admin()?;
        let rows = self.repo.users(&params.to_filter()).await?;
        info!(count = rows.len(), "admin_users_listed");
        Ok(rows)
    }

    /// One page of listings of any status; `page`/`limit` follow the public listing rules.
    #[instrument(skip(self, ctx))]
    pub async fn anketas(&self, ctx: &RequestContext, params: &AdminAnketaParams) -> Result<Vec<AdminAnketa>, ServiceError> {
        ctx.require_admin()?;
        LISTING_QUERIES_TOTAL.with_label_values(&["admin"]).inc();
        let paging = Pagination::from_params(params.page.as_deref(), params.limit.as_deref(), self.policy);
        let rows = self.repo.anketas(&params.to_filter(), &paging).await?;
        info!(count = rows.len(), page = paging.page, "admin_anketas_listed");
        Ok(rows)
    }

    pub async fn categories(&self, ctx: &RequestContext, params: &NameParams) -> Result<Vec<AdminCategory>, ServiceError> {
        ctx.require_admin()?;
        self.repo.categories(&params.to_filter()).await
    }

    pub async fn cities(&self, ctx: &RequestContext, params: &NameParams) -> Result<Vec<AdminCity>, ServiceError> {
        ctx.require_admin()?;
        self.repo.cities(&params.to_filter()).await
    }

    #[instrument(skip(self, ctx, input), fields(slug = %input.slug))]
    pub async fn create_category(&self, ctx: &RequestContext, input: NewCategory) -> Result<Category, ServiceError> {
        let admin = ctx.require_admin()?;
        let name = input.name.trim();
        if name.is_empty() {
            return Err(ServiceError::Validation("name required".into()));
        }
        let slug = input.slug.trim();
        models::category::validate_slug(slug)?;
        let created = self.repo.create_category(name, slug).await?;
        info!(category_id = %created.id, admin_id = %admin.user_id(), "category_created");
        Ok(created)
    }

    #[instrument(skip(self, ctx, input), fields(name = %input.name))]
    pub async fn create_city(&self, ctx: &RequestContext, input: NewCity) -> Result<City, ServiceError> {
        let admin = ctx.require_admin()?;
        let name = input.name.trim();
        if name.is_empty() {
            return Err(ServiceError::Validation("name required".into()));
        }
        let created = self.repo.create_city(name).await?;
        info!(city_id = %created.id, admin_id = %admin.user_id(), "city_created");
        Ok(created)
    }
}
