//! Process-local store implementing every repository trait.
//!
//! Backs the `memory` storage backend and the store-free service and HTTP
//! tests. Listing filters are evaluated with [`AnketaFilter::matches`], the
//! in-process twin of the SQL condition.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::admin::domain::{AdminAnketa, AdminCategory, AdminCity, AdminUser, AnketaCount, ReviewCount, UserCounts};
use crate::admin::filters::{AdminAnketaFilter, AdminUserFilter, NameFilter};
use crate::admin::repository::AdminRepository;
use crate::auth::domain::{AuthUser, Credentials};
use crate::auth::repository::AuthRepository;
use crate::errors::ServiceError;
use crate::listing::domain::{
    Anketa, AnketaFilter, Category, City, NewAnketa, NewReview, QueryOptions, Review, SortKey,
};
use crate::listing::repository::ListingRepository;
use crate::pagination::Pagination;
use crate::session::Role;

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, AuthUser>,
    credentials: HashMap<Uuid, Credentials>,
    categories: HashMap<Uuid, Category>,
    cities: HashMap<Uuid, City>,
    anketas: HashMap<Uuid, Anketa>,
    reviews: Vec<Review>,
}

#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
    unavailable: AtomicBool,
}

/// Alphabetical order here is case-insensitive by Unicode lowercase code points.
/// Postgres orders `title` by the database collation, so mixed-case or
/// non-ASCII titles may come back in a different order there.
fn compare(sort: SortKey, a: &Anketa, b: &Anketa) -> Ordering {
    let primary = match sort {
        SortKey::Rating => b
            .rating
            .partial_cmp(&a.rating)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.created_at.cmp(&a.created_at)),
        SortKey::Newest => b.created_at.cmp(&a.created_at),
        SortKey::Alphabetical => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

fn by_name_then_id(a_name: &str, a_id: &Uuid, b_name: &str, b_id: &Uuid) -> Ordering {
    a_name.cmp(b_name).then_with(|| a_id.cmp(b_id))
}

impl InMemoryStore {
    pub fn new() -> Self { Self::default() }

    /// Make every subsequent call fail with a store error (or recover).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, AtomicOrdering::SeqCst);
    }

    fn check(&self) -> Result<(), ServiceError> {
        if self.unavailable.load(AtomicOrdering::SeqCst) {
            common::metrics::STORE_ERRORS_TOTAL.inc();
            return Err(ServiceError::Db("in-memory store unavailable".into()));
        }
        Ok(())
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn seed_category(&self, name: &str, slug: &str) -> Category {
        let category = Category { id: Uuid::new_v4(), name: name.into(), slug: slug.into(), created_at: Utc::now() };
        self.write().categories.insert(category.id, category.clone());
        category
    }

    pub fn seed_city(&self, name: &str) -> City {
        let city = City { id: Uuid::new_v4(), name: name.into(), created_at: Utc::now() };
        self.write().cities.insert(city.id, city.clone());
        city
    }

    /// A small catalog so a fresh in-memory instance is usable right away.
    pub fn seed_default_catalog(&self) {
        for (name, slug) in [("Ремонт", "repair"), ("Уборка", "cleaning"), ("Репетиторы", "tutors"), ("Красота", "beauty")] {
            self.seed_category(name, slug);
        }
        for name in ["Москва", "Санкт-Петербург", "Казань"] {
            self.seed_city(name);
        }
    }
}

#[async_trait]
impl ListingRepository for InMemoryStore {
    async fn count(&self, filter: &AnketaFilter) -> Result<u64, ServiceError> {
        self.check()?;
        let inner = self.read();
        Ok(inner.anketas.values().filter(|a| a.is_active && filter.matches(a)).count() as u64)
    }

    async fn list(&self, filter: &AnketaFilter, opts: &QueryOptions) -> Result<Vec<Anketa>, ServiceError> {
        self.check()?;
        let inner = self.read();
        let mut rows: Vec<&Anketa> = inner.anketas.values().filter(|a| a.is_active && filter.matches(a)).collect();
        rows.sort_by(|a, b| compare(opts.sort, a, b));
        Ok(rows
            .into_iter()
            .skip(usize::try_from(opts.skip).unwrap_or(usize::MAX))
            .take(usize::try_from(opts.take).unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Anketa>, ServiceError> {
        self.check()?;
        Ok(self.read().anketas.get(&id).cloned())
    }

    async fn count_active_by_owner(&self, owner_id: Uuid) -> Result<u64, ServiceError> {
        self.check()?;
        Ok(self.read().anketas.values().filter(|a| a.owner_id == owner_id && a.is_active).count() as u64)
    }

    async fn insert(&self, owner_id: Uuid, input: &NewAnketa) -> Result<Anketa, ServiceError> {
        self.check()?;
        let mut inner = self.write();
        let slug = inner
            .categories
            .get(&input.category_id)
            .map(|c| c.slug.clone())
            .ok_or_else(|| ServiceError::Validation("unknown category".into()))?;
        let now = Utc::now();
        let anketa = Anketa {
            id: Uuid::new_v4(),
            title: input.title.clone(),
            description: input.description.clone(),
            category_id: input.category_id,
            category_slug: slug,
            city_id: input.city_id,
            owner_id,
            is_active: true,
            latitude: input.latitude,
            longitude: input.longitude,
            telegram: input.telegram.clone(),
            whatsapp: input.whatsapp.clone(),
            rating: 0.0,
            review_count: 0,
            created_at: now,
            updated_at: now,
        };
        inner.anketas.insert(anketa.id, anketa.clone());
        Ok(anketa)
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<Option<Anketa>, ServiceError> {
        self.check()?;
        let mut inner = self.write();
        Ok(inner.anketas.get_mut(&id).map(|a| {
            a.is_active = active;
            a.updated_at = Utc::now();
            a.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ServiceError> {
        self.check()?;
        let mut inner = self.write();
        let existed = inner.anketas.remove(&id).is_some();
        inner.reviews.retain(|r| r.anketa_id != id);
        Ok(existed)
    }

    async fn add_review(&self, anketa_id: Uuid, author_id: Uuid, input: &NewReview) -> Result<Review, ServiceError> {
        self.check()?;
        let mut inner = self.write();
        if !inner.anketas.contains_key(&anketa_id) {
            return Err(ServiceError::not_found("anketa"));
        }
        let review = Review {
            id: Uuid::new_v4(),
            anketa_id,
            author_id,
            rating: input.rating,
            body: input.body.clone(),
            created_at: Utc::now(),
        };
        inner.reviews.push(review.clone());
        let ratings: Vec<i16> = inner.reviews.iter().filter(|r| r.anketa_id == anketa_id).map(|r| r.rating).collect();
        if let Some(a) = inner.anketas.get_mut(&anketa_id) {
            a.rating = models::anketa::average_rating(&ratings);
            a.review_count = ratings.len() as u32;
            a.updated_at = Utc::now();
        }
        Ok(review)
    }

    async fn categories(&self) -> Result<Vec<Category>, ServiceError> {
        self.check()?;
        let mut rows: Vec<Category> = self.read().categories.values().cloned().collect();
        rows.sort_by(|a, b| by_name_then_id(&a.name, &a.id, &b.name, &b.id));
        Ok(rows)
    }

    async fn cities(&self) -> Result<Vec<City>, ServiceError> {
        self.check()?;
        let mut rows: Vec<City> = self.read().cities.values().cloned().collect();
        rows.sort_by(|a, b| by_name_then_id(&a.name, &a.id, &b.name, &b.id));
        Ok(rows)
    }

    async fn find_category(&self, id: Uuid) -> Result<Option<Category>, ServiceError> {
        self.check()?;
        Ok(self.read().categories.get(&id).cloned())
    }

    async fn find_city(&self, id: Uuid) -> Result<Option<City>, ServiceError> {
        self.check()?;
        Ok(self.read().cities.get(&id).cloned())
    }
}

#[async_trait]
impl AdminRepository for InMemoryStore {
    async fn users(&self, filter: &AdminUserFilter) -> Result<Vec<AdminUser>, ServiceError> {
        self.check()?;
        let inner = self.read();
        let mut rows: Vec<AdminUser> = inner
            .users
            .values()
            .filter(|u| filter.matches(&u.email, &u.name, u.role))
            .map(|u| {
                let owned: Vec<Uuid> = inner.anketas.values().filter(|a| a.owner_id == u.id).map(|a| a.id).collect();
                let received = inner.reviews.iter().filter(|r| owned.contains(&r.anketa_id)).count() as u64;
                AdminUser {
                    id: u.id,
                    email: u.email.clone(),
                    name: u.name.clone(),
                    role: u.role,
                    created_at: u.created_at,
                    count: UserCounts { anketas: owned.len() as u64, received_comments: received },
                }
            })
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn anketas(&self, filter: &AdminAnketaFilter, paging: &Pagination) -> Result<Vec<AdminAnketa>, ServiceError> {
        self.check()?;
        let inner = self.read();
        let mut rows: Vec<&Anketa> = inner
            .anketas
            .values()
            .filter(|a| filter.base.matches(a) && filter.active.map_or(true, |active| a.is_active == active))
            .collect();
        rows.sort_by(|a, b| compare(SortKey::Newest, a, b));
        Ok(rows
            .into_iter()
            .skip(usize::try_from(paging.skip()).unwrap_or(usize::MAX))
            .take(usize::try_from(paging.limit).unwrap_or(usize::MAX))
            .map(|a| AdminAnketa {
                anketa: a.clone(),
                count: ReviewCount { reviews: inner.reviews.iter().filter(|r| r.anketa_id == a.id).count() as u64 },
            })
            .collect())
    }

    async fn categories(&self, filter: &NameFilter) -> Result<Vec<AdminCategory>, ServiceError> {
        self.check()?;
        let inner = self.read();
        let mut rows: Vec<AdminCategory> = inner
            .categories
            .values()
            .filter(|c| filter.matches(&c.name))
            .map(|c| AdminCategory {
                category: c.clone(),
                count: AnketaCount { anketas: inner.anketas.values().filter(|a| a.category_id == c.id).count() as u64 },
            })
            .collect();
        rows.sort_by(|a, b| by_name_then_id(&a.category.name, &a.category.id, &b.category.name, &b.category.id));
        Ok(rows)
    }

    async fn cities(&self, filter: &NameFilter) -> Result<Vec<AdminCity>, ServiceError> {
        self.check()?;
        let inner = self.read();
        let mut rows: Vec<AdminCity> = inner
            .cities
            .values()
            .filter(|c| filter.matches(&c.name))
            .map(|c| AdminCity {
                city: c.clone(),
                count: AnketaCount { anketas: inner.anketas.values().filter(|a| a.city_id == c.id).count() as u64 },
            })
            .collect();
        rows.sort_by(|a, b| by_name_then_id(&a.city.name, &a.city.id, &b.city.name, &b.city.id));
        Ok(rows)
    }

    async fn create_category(&self, name: &str, slug: &str) -> Result<Category, ServiceError> {
        self.check()?;
        let mut inner = self.write();
        if inner.categories.values().any(|c| c.slug == slug) {
            return Err(ServiceError::Conflict(format!("category slug {slug} exists")));
        }
        let category = Category { id: Uuid::new_v4(), name: name.into(), slug: slug.into(), created_at: Utc::now() };
        inner.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn create_city(&self, name: &str) -> Result<City, ServiceError> {
        self.check()?;
        let mut inner = self.write();
        if inner.cities.values().any(|c| c.name == name) {
            return Err(ServiceError::Conflict(format!("city {name} exists")));
        }
        let city = City { id: Uuid::new_v4(), name: name.into(), created_at: Utc::now() };
        inner.cities.insert(city.id, city.clone());
        Ok(city)
    }
}

#[async_trait]
impl AuthRepository for InMemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, ServiceError> {
        self.check()?;
        Ok(self.read().users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<AuthUser>, ServiceError> {
        self.check()?;
        Ok(self.read().users.get(&id).cloned())
    }

    async fn create_user(&self, email: &str, name: &str, role: Role) -> Result<AuthUser, ServiceError> {
        self.check()?;
        let mut inner = self.write();
        if inner.users.values().any(|u| u.email == email) {
            return Err(ServiceError::Conflict("email already registered".into()));
        }
        let user = AuthUser { id: Uuid::new_v4(), email: email.into(), name: name.into(), role, created_at: Utc::now() };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn create_user_with_password(
        &self,
        email: &str,
        name: &str,
        role: Role,
        password_hash: String,
        password_algorithm: String,
    ) -> Result<AuthUser, ServiceError> {
        self.check()?;
        if password_hash.trim().is_empty() {
            return Err(ServiceError::Validation("password hash required".into()));
        }
        let mut inner = self.write();
        if inner.users.values().any(|u| u.email == email) {
            return Err(ServiceError::Conflict("email already registered".into()));
        }
        let user = AuthUser { id: Uuid::new_v4(), email: email.into(), name: name.into(), role, created_at: Utc::now() };
        inner.credentials.insert(user.id, Credentials { user_id: user.id, password_hash, password_algorithm });
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, ServiceError> {
        self.check()?;
        Ok(self.read().credentials.get(&user_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVERYTHING: Pagination = Pagination { page: 1, limit: 100 };

    fn new_anketa(category_id: Uuid, city_id: Uuid, title: &str) -> NewAnketa {
        NewAnketa {
            title: title.into(),
            description: String::new(),
            category_id,
            city_id,
            latitude: None,
            longitude: None,
            telegram: None,
            whatsapp: None,
        }
    }

    #[tokio::test]
    async fn received_comments_count_reviews_on_owned_listings() {
        let store = InMemoryStore::new();
        let cat = store.seed_category("Repair", "repair");
        let city = store.seed_city("Kazan");
        let owner = store.create_user("owner@example.com", "Owner", Role::User).await.unwrap();
        let critic = store.create_user("critic@example.com", "Critic", Role::User).await.unwrap();

        let a = store.insert(owner.id, &new_anketa(cat.id, city.id, "Roofing")).await.unwrap();
        let b = store.insert(owner.id, &new_anketa(cat.id, city.id, "Walls")).await.unwrap();
        for (id, rating) in [(a.id, 5), (a.id, 3), (b.id, 4)] {
            store.add_review(id, critic.id, &NewReview { rating, body: String::new() }).await.unwrap();
        }

        let users = AdminRepository::users(&store, &AdminUserFilter::default()).await.unwrap();
        let owner_row = users.iter().find(|u| u.id == owner.id).unwrap();
        assert_eq!(owner_row.count, UserCounts { anketas: 2, received_comments: 3 });
        let critic_row = users.iter().find(|u| u.id == critic.id).unwrap();
        assert_eq!(critic_row.count, UserCounts { anketas: 0, received_comments: 0 });

        let updated = store.get(a.id).await.unwrap().unwrap();
        assert_eq!((updated.rating, updated.review_count), (4.0, 2));
    }

    #[tokio::test]
    async fn admin_anketa_status_filter() {
        let store = InMemoryStore::new();
        let cat = store.seed_category("Repair", "repair");
        let city = store.seed_city("Kazan");
        let owner = Uuid::new_v4();
        let on = store.insert(owner, &new_anketa(cat.id, city.id, "On")).await.unwrap();
        let off = store.insert(owner, &new_anketa(cat.id, city.id, "Off")).await.unwrap();
        store.set_active(off.id, false).await.unwrap();

        let all = AdminRepository::anketas(&store, &AdminAnketaFilter::default(), &EVERYTHING).await.unwrap();
        assert_eq!(all.len(), 2);
        let inactive = AdminRepository::anketas(&store, &AdminAnketaFilter { active: Some(false), ..Default::default() }, &EVERYTHING).await.unwrap();
        assert_eq!(inactive.iter().map(|r| r.anketa.id).collect::<Vec<_>>(), vec![off.id]);
        let active = AdminRepository::anketas(&store, &AdminAnketaFilter { active: Some(true), ..Default::default() }, &EVERYTHING).await.unwrap();
        assert_eq!(active.iter().map(|r| r.anketa.id).collect::<Vec<_>>(), vec![on.id]);
    }

    #[tokio::test]
    async fn alphabetical_order_ignores_case() {
        let store = InMemoryStore::new();
        let cat = store.seed_category("Repair", "repair");
        let city = store.seed_city("Kazan");
        let owner = Uuid::new_v4();
        for title in ["banana", "Cherry", "apple", "Banana"] {
            store.insert(owner, &new_anketa(cat.id, city.id, title)).await.unwrap();
        }
        let opts = QueryOptions { page: 1, limit: 10, skip: 0, take: 10, sort: SortKey::Alphabetical };
        let titles: Vec<String> =
            store.list(&AnketaFilter::default(), &opts).await.unwrap().into_iter().map(|a| a.title).collect();
        assert_eq!(titles[0], "apple");
        assert_eq!(titles[3], "Cherry");
        let mut middle = vec![titles[1].clone(), titles[2].clone()];
        middle.sort();
        assert_eq!(middle, vec!["Banana".to_string(), "banana".to_string()]);
    }

    #[tokio::test]
    async fn deleting_a_listing_drops_its_reviews() {
        let store = InMemoryStore::new();
        let cat = store.seed_category("Repair", "repair");
        let city = store.seed_city("Kazan");
        let a = store.insert(Uuid::new_v4(), &new_anketa(cat.id, city.id, "Gone")).await.unwrap();
        store.add_review(a.id, Uuid::new_v4(), &NewReview { rating: 5, body: String::new() }).await.unwrap();
        assert!(store.delete(a.id).await.unwrap());
        assert!(!store.delete(a.id).await.unwrap());
        let cats = AdminRepository::categories(&store, &NameFilter::default()).await.unwrap();
        assert_eq!(cats[0].count.anketas, 0);
    }
}
