use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, JoinType, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait,
};
use uuid::Uuid;

use models::{anketa, category, city, review, user};

use crate::admin::domain::{
    AdminAnketa, AdminCategory, AdminCity, AdminUser, AnketaCount, ReviewCount, UserCounts,
};
use crate::admin::filters::{AdminAnketaFilter, AdminUserFilter, NameFilter};
use crate::admin::repository::AdminRepository;
use crate::auth::domain::AuthUser;
use crate::errors::ServiceError;
use crate::listing::domain::{Anketa, Category, City};
use crate::listing::repo::seaorm::{anketa_condition, icontains};
use crate::pagination::Pagination;

pub struct SeaOrmAdminRepository {
    pub db: DatabaseConnection,
}

fn db_err(e: sea_orm::DbErr) -> ServiceError {
    common::metrics::STORE_ERRORS_TOTAL.inc();
    ServiceError::Db(e.to_string())
}

fn to_map(rows: Vec<(Uuid, i64)>) -> HashMap<Uuid, u64> {
    rows.into_iter().map(|(id, n)| (id, n.max(0) as u64)).collect()
}

impl SeaOrmAdminRepository {
    /// Listing counts grouped by `col` (owner, category or city) for `ids`.
    async fn anketa_counts_by(&self, col: anketa::Column, ids: Vec<Uuid>) -> Result<HashMap<Uuid, u64>, ServiceError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows: Vec<(Uuid, i64)> = anketa::Entity::find()
            .select_only()
            .column(col)
            .column_as(anketa::Column::Id.count(), "count")
            .filter(col.is_in(ids))
            .group_by(col)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(to_map(rows))
    }

    async fn received_comment_counts(&self, owner_ids: Vec<Uuid>) -> Result<HashMap<Uuid, u64>, ServiceError> {
        if owner_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows: Vec<(Uuid, i64)> = review::Entity::find()
            .select_only()
            .column(anketa::Column::OwnerId)
            .column_as(review::Column::Id.count(), "count")
            .join(JoinType::InnerJoin, review::Relation::Anketa.def())
            .filter(anketa::Column::OwnerId.is_in(owner_ids))
            .group_by(anketa::Column::OwnerId)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(to_map(rows))
    }

    async fn review_counts(&self, anketa_ids: Vec<Uuid>) -> Result<HashMap<Uuid, u64>, ServiceError> {
        if anketa_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows: Vec<(Uuid, i64)> = review::Entity::find()
            .select_only()
            .column(review::Column::AnketaId)
            .column_as(review::Column::Id.count(), "count")
            .filter(review::Column::AnketaId.is_in(anketa_ids))
            .group_by(review::Column::AnketaId)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(to_map(rows))
    }
}

#[async_trait]
impl AdminRepository for SeaOrmAdminRepository {
    async fn users(&self, filter: &AdminUserFilter) -> Result<Vec<AdminUser>, ServiceError> {
        let cond = Condition::all()
            .add_option(filter.search.as_ref().map(|needle| {
                Condition::any()
                    .add(icontains(user::Column::Email, needle))
                    .add(icontains(user::Column::Name, needle))
            }))
            .add_option(filter.role.map(|r| user::Column::Role.eq(r.as_str())));
        let rows = user::Entity::find()
            .filter(cond)
            .order_by_desc(user::Column::CreatedAt)
            .order_by_asc(user::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let ids: Vec<Uuid> = rows.iter().map(|u| u.id).collect();
        let (anketas, comments) = tokio::try_join!(
            self.anketa_counts_by(anketa::Column::OwnerId, ids.clone()),
            self.received_comment_counts(ids),
        )?;
        Ok(rows
            .into_iter()
            .map(AuthUser::from)
            .map(|u| AdminUser {
                count: UserCounts {
                    anketas: anketas.get(&u.id).copied().unwrap_or(0),
                    received_comments: comments.get(&u.id).copied().unwrap_or(0),
                },
                id: u.id,
                email: u.email,
                name: u.name,
                role: u.role,
                created_at: u.created_at,
            })
            .collect())
    }

    async fn anketas(&self, filter: &AdminAnketaFilter, paging: &Pagination) -> Result<Vec<AdminAnketa>, ServiceError> {
        let cond = anketa_condition(&filter.base).add_option(filter.active.map(|a| anketa::Column::IsActive.eq(a)));
        let rows = anketa::Entity::find()
            .filter(cond)
            .order_by_desc(anketa::Column::CreatedAt)
            .order_by_asc(anketa::Column::Id)
            .offset(paging.skip())
            .limit(paging.limit)
            .find_also_related(category::Entity)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        let counts = self.review_counts(rows.iter().map(|(a, _)| a.id).collect()).await?;
        Ok(rows
            .into_iter()
            .map(Anketa::from)
            .map(|anketa| AdminAnketa { count: ReviewCount { reviews: counts.get(&anketa.id).copied().unwrap_or(0) }, anketa })
            .collect())
    }

    async fn categories(&self, filter: &NameFilter) -> Result<Vec<AdminCategory>, ServiceError> {
        let rows = category::Entity::find()
            .filter(Condition::all().add_option(filter.search.as_ref().map(|n| icontains(category::Column::Name, n))))
            .order_by_asc(category::Column::Name)
            .order_by_asc(category::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        let counts = self.anketa_counts_by(anketa::Column::CategoryId, rows.iter().map(|c| c.id).collect()).await?;
        Ok(rows
            .into_iter()
            .map(Category::from)
            .map(|category| AdminCategory { count: AnketaCount { anketas: counts.get(&category.id).copied().unwrap_or(0) }, category })
            .collect())
    }

    async fn cities(&self, filter: &NameFilter) -> Result<Vec<AdminCity>, ServiceError> {
        let rows = city::Entity::find()
            .filter(Condition::all().add_option(filter.search.as_ref().map(|n| icontains(city::Column::Name, n))))
            .order_by_asc(city::Column::Name)
            .order_by_asc(city::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        let counts = self.anketa_counts_by(anketa::Column::CityId, rows.iter().map(|c| c.id).collect()).await?;
        Ok(rows
            .into_iter()
            .map(City::from)
            .map(|city| AdminCity { count: AnketaCount { anketas: counts.get(&city.id).copied().unwrap_or(0) }, city })
            .collect())
    }

    async fn create_category(&self, name: &str, slug: &str) -> Result<Category, ServiceError> {
        Ok(Category::from(category::create(&self.db, name, slug).await?))
    }

    async fn create_city(&self, name: &str) -> Result<City, ServiceError> {
        Ok(City::from(city::create(&self.db, name).await?))
    }
}
