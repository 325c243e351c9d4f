use async_trait::async_trait;
use sea_orm::sea_query::{Expr, Func, LikeExpr, Query};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Select,
};
use uuid::Uuid;

use models::{anketa, category, city};

use crate::errors::ServiceError;
use crate::listing::domain::{
    Anketa, AnketaFilter, Category, City, NewAnketa, NewReview, QueryOptions, Review, SortKey,
};
use crate::listing::repository::ListingRepository;

pub struct SeaOrmListingRepository {
    pub db: DatabaseConnection,
}

fn db_err(e: impl std::fmt::Display) -> ServiceError {
    common::metrics::STORE_ERRORS_TOTAL.inc();
    ServiceError::Db(e.to_string())
}

/// `%needle%` with LIKE wildcards in the needle escaped.
pub(crate) fn like_pattern(needle: &str) -> LikeExpr {
    let escaped = needle.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    LikeExpr::new(format!("%{escaped}%")).escape('\\')
}

/// Case-insensitive substring match of an already lowercased needle on `col`.
pub(crate) fn icontains<C: ColumnTrait>(col: C, needle: &str) -> sea_orm::sea_query::SimpleExpr {
    Expr::expr(Func::lower(Expr::col((col.entity_name(), col)))).like(like_pattern(needle))
}

/// Listing filter as a SQL condition over `anketa`.
pub(crate) fn anketa_condition(filter: &AnketaFilter) -> Condition {
    Condition::all()
        .add_option(filter.city_id.map(|id| anketa::Column::CityId.eq(id)))
        .add_option(filter.category.as_ref().map(|slug| {
            anketa::Column::CategoryId.in_subquery(
                Query::select()
                    .column(category::Column::Id)
                    .from(category::Entity)
                    .and_where(category::Column::Slug.eq(slug.as_str()))
                    .to_owned(),
            )
        }))
        .add_option(filter.search.as_ref().map(|needle| {
            Condition::any()
                .add(icontains(anketa::Column::Title, needle))
                .add(icontains(anketa::Column::Description, needle))
        }))
        .add_option(filter.min_rating.map(|min| anketa::Column::Rating.gte(min)))
        .add_option(filter.only_with_reviews.then(|| anketa::Column::ReviewCount.gt(0)))
}

fn active(filter: &AnketaFilter) -> Condition {
    anketa_condition(filter).add(anketa::Column::IsActive.eq(true))
}

pub(crate) fn apply_sort(select: Select<anketa::Entity>, sort: SortKey) -> Select<anketa::Entity> {
    let select = match sort {
        SortKey::Rating => select
            .order_by(anketa::Column::Rating, Order::Desc)
            .order_by(anketa::Column::CreatedAt, Order::Desc),
        SortKey::Newest => select.order_by(anketa::Column::CreatedAt, Order::Desc),
        SortKey::Alphabetical => select.order_by(anketa::Column::Title, Order::Asc),
    };
    select.order_by(anketa::Column::Id, Order::Asc)
}

#[async_trait]
impl ListingRepository for SeaOrmListingRepository {
    async fn count(&self, filter: &AnketaFilter) -> Result<u64, ServiceError> {
        anketa::Entity::find()
            .filter(active(filter))
            .count(&self.db)
            .await
            .map_err(db_err)
    }

    async fn list(&self, filter: &AnketaFilter, opts: &QueryOptions) -> Result<Vec<Anketa>, ServiceError> {
        let select = anketa::Entity::find().filter(active(filter));
        let rows = apply_sort(select, opts.sort)
            // the store binds OFFSET as i64
            .offset(opts.skip.min(i64::MAX as u64))
            .limit(opts.take)
            .find_also_related(category::Entity)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(rows.into_iter().map(Anketa::from).collect())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Anketa>, ServiceError> {
        let row = anketa::Entity::find_by_id(id)
            .find_also_related(category::Entity)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(row.map(Anketa::from))
    }

    async fn count_active_by_owner(&self, owner_id: Uuid) -> Result<u64, ServiceError> {
        Ok(anketa::count_active_by_owner(&self.db, owner_id).await?)
    }

    async fn insert(&self, owner_id: Uuid, input: &NewAnketa) -> Result<Anketa, ServiceError> {
        let created = anketa::create(
            &self.db,
            anketa::NewAnketa {
                title: &input.title,
                description: &input.description,
                category_id: input.category_id,
                city_id: input.city_id,
                owner_id,
                latitude: input.latitude,
                longitude: input.longitude,
                telegram: input.telegram.clone(),
                whatsapp: input.whatsapp.clone(),
            },
        )
        .await?;
        let cat = category::Entity::find_by_id(created.category_id).one(&self.db).await.map_err(db_err)?;
        Ok(Anketa::from((created, cat)))
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<Option<Anketa>, ServiceError> {
        if anketa::set_active(&self.db, id, active).await?.is_none() {
            return Ok(None);
        }
        self.get(id).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ServiceError> {
        let res = anketa::Entity::delete_by_id(id).exec(&self.db).await.map_err(db_err)?;
        Ok(res.rows_affected > 0)
    }

    async fn add_review(&self, anketa_id: Uuid, author_id: Uuid, input: &NewReview) -> Result<Review, ServiceError> {
        let (created, _) = anketa::add_review(&self.db, anketa_id, author_id, input.rating, &input.body).await?;
        Ok(Review::from(created))
    }

    async fn categories(&self) -> Result<Vec<Category>, ServiceError> {
        let rows = category::Entity::find()
            .order_by_asc(category::Column::Name)
            .order_by_asc(category::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn cities(&self) -> Result<Vec<City>, ServiceError> {
        let rows = city::Entity::find()
            .order_by_asc(city::Column::Name)
            .order_by_asc(city::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(rows.into_iter().map(City::from).collect())
    }

    async fn find_category(&self, id: Uuid) -> Result<Option<Category>, ServiceError> {
        let row = category::Entity::find_by_id(id).one(&self.db).await.map_err(db_err)?;
        Ok(row.map(Category::from))
    }

    async fn find_city(&self, id: Uuid) -> Result<Option<City>, ServiceError> {
        let row = city::Entity::find_by_id(id).one(&self.db).await.map_err(db_err)?;
        Ok(row.map(City::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use sea_orm::{DbBackend, QueryTrait};

    use crate::listing::{build_anketa_filters, AnketaQueryParams};
    use crate::pagination::PaginationPolicy;
    use crate::test_support::get_db;
    use models::user;

    fn sql(cond: Condition, sort: SortKey) -> String {
        apply_sort(anketa::Entity::find().filter(cond), sort)
            .build(DbBackend::Postgres)
            .to_string()
    }

    #[test]
    fn empty_filter_only_adds_active_scope() {
        let s = sql(active(&AnketaFilter::default()), SortKey::Newest);
        assert!(s.contains(r#""anketa"."is_active" = TRUE"#), "{s}");
        assert!(s.ends_with(r#"ORDER BY "anketa"."created_at" DESC, "anketa"."id" ASC"#), "{s}");
        let s = sql(anketa_condition(&AnketaFilter::default()), SortKey::Alphabetical);
        assert!(!s.contains(r#""anketa"."is_active" = "#), "{s}");
        assert!(s.ends_with(r#"ORDER BY "anketa"."title" ASC, "anketa"."id" ASC"#), "{s}");
    }

    #[test]
    fn every_constraint_is_translated() {
        let f = AnketaFilter {
            city_id: Some(Uuid::nil()),
            category: Some("plumbing".into()),
            search: Some("pipe".into()),
            min_rating: Some(4.5),
            only_with_reviews: true,
        };
        let s = sql(anketa_condition(&f), SortKey::Rating);
        assert!(s.contains(r#""anketa"."city_id" = '00000000-0000-0000-0000-000000000000'"#), "{s}");
        assert!(s.contains(r#""category"."slug" = 'plumbing'"#), "{s}");
        assert!(s.contains(r#"LOWER("anketa"."title") LIKE '%pipe%'"#), "{s}");
        assert!(s.contains(r#"LOWER("anketa"."description") LIKE '%pipe%'"#), "{s}");
        assert!(s.contains(r#""anketa"."rating" >= 4.5"#), "{s}");
        assert!(s.contains(r#""anketa"."review_count" > 0"#), "{s}");
        assert!(s.contains(r#"ORDER BY "anketa"."rating" DESC, "anketa"."created_at" DESC, "anketa"."id" ASC"#), "{s}");
    }

    #[tokio::test]
    async fn list_and_count_against_postgres() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let Some(db) = get_db().await? else { return Ok(()) };
        let repo = SeaOrmListingRepository { db: db.clone() };

        let tag = Uuid::new_v4().simple().to_string();
        let owner = user::create(&db, &format!("lister_{tag}@example.com"), "Lister", user::ROLE_USER).await?;
        let reviewer = user::create(&db, &format!("critic_{tag}@example.com"), "Critic", user::ROLE_USER).await?;
        let cat = category::create(&db, "Moving", &format!("moving-{tag}")).await?;
        let town = city::create(&db, &format!("Town {tag}")).await?;

        let mut ids = Vec::new();
        for _ in 0..5 {
            // identical titles so ordering has to fall back to id
            let input = NewAnketa {
                title: "Same title".into(),
                description: format!("Movers {tag}"),
                category_id: cat.id,
                city_id: town.id,
                latitude: None,
                longitude: None,
                telegram: None,
                whatsapp: None,
            };
            ids.push(repo.insert(owner.id, &input).await?.id);
        }
        let in_town = AnketaFilter { city_id: Some(town.id), ..Default::default() };

        for sort in [SortKey::Newest, SortKey::Rating, SortKey::Alphabetical] {
            assert_eq!(repo.count(&in_town).await?, 5);
            let opts = |page: u64| QueryOptions { page, limit: 3, skip: (page - 1) * 3, take: 3, sort };
            let p1 = repo.list(&in_town, &opts(1)).await?;
            let p2 = repo.list(&in_town, &opts(2)).await?;
            assert_eq!((p1.len(), p2.len()), (3, 2));
            let seen: HashSet<Uuid> = p1.iter().chain(p2.iter()).map(|a| a.id).collect();
            assert_eq!(seen, ids.iter().copied().collect::<HashSet<_>>(), "{sort:?}");
        }

        let by_slug_and_text = AnketaFilter {
            category: Some(format!("moving-{tag}")),
            search: Some(format!("movers {tag}")),
            ..Default::default()
        };
        assert_eq!(repo.count(&by_slug_and_text).await?, 5);

        repo.set_active(ids[0], false).await?;
        assert_eq!(repo.count(&in_town).await?, 4);

        repo.add_review(ids[1], reviewer.id, &NewReview { rating: 5, body: String::new() }).await?;
        let reviewed = AnketaFilter { only_with_reviews: true, min_rating: Some(4.5), ..in_town.clone() };
        let rows = repo.list(&reviewed, &QueryOptions { page: 1, limit: 10, skip: 0, take: 10, sort: SortKey::Rating }).await?;
        assert_eq!(rows.iter().map(|a| a.id).collect::<Vec<_>>(), vec![ids[1]]);
        assert_eq!(rows[0].review_count, 1);

        // absurd page numbers resolve to an empty page instead of a bind failure
        let params = AnketaQueryParams {
            city_id: Some(town.id.to_string()),
            page: Some("1000000000000000000".into()),
            ..Default::default()
        };
        let (filter, opts) = build_anketa_filters(&params, PaginationPolicy::default());
        assert!(repo.list(&filter, &opts).await?.is_empty());

        user::Entity::delete_by_id(owner.id).exec(&db).await?;
        user::Entity::delete_by_id(reviewer.id).exec(&db).await?;
        category::Entity::delete_by_id(cat.id).exec(&db).await?;
        city::Entity::delete_by_id(town.id).exec(&db).await?;
        Ok(())
    }
}
