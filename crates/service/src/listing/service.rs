use std::sync::Arc;

use common::metrics::LISTING_QUERIES_TOTAL;
use tracing::{info, instrument};
use uuid::Uuid;

use models::anketa::{validate_coordinates, validate_description, validate_title, MAX_ACTIVE_PER_OWNER};
use models::review::{validate_body, validate_rating};

use super::domain::{
    Anketa, AnketaDetail, AnketaFilter, Category, City, ListingPage, NewAnketa, NewReview, QueryOptions,
    Review,
};
use super::filters::{build_anketa_filters, AnketaQueryParams};
use super::repository::ListingRepository;
use crate::contact::contact_links;
use crate::errors::ServiceError;
use crate::pagination::PaginationPolicy;
use crate::session::RequestContext;

const TELEGRAM_MAX: usize = 64;
const WHATSAPP_MAX: usize = 32;

/// Listing queries and the guarded listing mutations.
pub struct ListingService<R: ListingRepository + ?Sized> {
    repo: Arc<R>,
    policy: PaginationPolicy,
}

impl<R: ListingRepository + ?Sized> ListingService<R> {
    pub fn new(repo: Arc<R>, policy: PaginationPolicy) -> Self { Self { repo, policy } }

    pub fn policy(&self) -> PaginationPolicy { self.policy }

    /// Active listings matching `filter`, one page of them.
    pub async fn list(&self, filter: &AnketaFilter, opts: &QueryOptions) -> Result<Vec<Anketa>, ServiceError> {
        self.repo.list(filter, opts).await
    }

    /// Number of active listings matching `filter`; independent of sort and paging.
    pub async fn count(&self, filter: &AnketaFilter) -> Result<u64, ServiceError> {
        self.repo.count(filter).await
    }

    /// Count and page fetch issued concurrently.
    ///
    /// `has_more` is `true` whenever the page came back full, so a final page
    /// that is exactly `limit` long still reports more.
    #[instrument(skip(self, filter, opts), fields(page = opts.page, limit = opts.limit))]
    pub async fn page(&self, filter: &AnketaFilter, opts: &QueryOptions) -> Result<ListingPage, ServiceError> {
        LISTING_QUERIES_TOTAL.with_label_values(&["public"]).inc();

        let (total, data) = tokio::try_join!(self.repo.count(filter), self.repo.list(filter, opts))?;
        let has_more = data.len() as u64 == opts.limit;
        info!(total, returned = data.len(), has_more, "listing_page");
        Ok(ListingPage { data, has_more, total, page: opts.page })
    }

    /// Build filters from raw query parameters and fetch the public page.
    pub async fn search(&self, params: &AnketaQueryParams) -> Result<ListingPage, ServiceError> {
        let (filter, opts) = build_anketa_filters(params, self.policy);
        self.page(&filter, &opts).await
    }

    pub async fn get(&self, id: Uuid) -> Result<AnketaDetail, ServiceError> {
        let anketa = self
            .repo
            .get(id)
            .await?
            .filter(|a| a.is_active)
            .ok_or_else(|| ServiceError::not_found("anketa"))?;
        let contacts = contact_links(anketa.telegram.as_deref(), anketa.whatsapp.as_deref());
        Ok(AnketaDetail { anketa, contacts })
    }

    #[instrument(skip(self, ctx, input), fields(title = %input.title))]
    pub async fn create(&self, ctx: &RequestContext, input: NewAnketa) -> Result<Anketa, ServiceError> {
        let owner_id = ctx.require_session()?.user_id();
        let input = normalize_new_anketa(input)?;

        if self.repo.find_category(input.category_id).await?.is_none() {
            return Err(ServiceError::Validation("unknown category".into()));
        }
        if self.repo.find_city(input.city_id).await?.is_none() {
            return Err(ServiceError::Validation("unknown city".into()));
        }
        self.ensure_below_active_limit(owner_id).await?;

        let created = self.repo.insert(owner_id, &input).await?;
        info!(anketa_id = %created.id, owner_id = %owner_id, "anketa_created");
        Ok(created)
    }

    /// Owners toggle their own listings; admins toggle any.
    #[instrument(skip(self, ctx))]
    pub async fn set_active(&self, ctx: &RequestContext, id: Uuid, active: bool) -> Result<Anketa, ServiceError> {
        let session = ctx.require_session()?;
        let current = self.repo.get(id).await?.ok_or_else(|| ServiceError::not_found("anketa"))?;
        if current.owner_id != session.user_id() && !session.is_admin() {
            return Err(ServiceError::Forbidden);
        }
        if active && !current.is_active {
            self.ensure_below_active_limit(current.owner_id).await?;
        }
        let updated = self
            .repo
            .set_active(id, active)
            .await?
            .ok_or_else(|| ServiceError::not_found("anketa"))?;
        info!(anketa_id = %id, active, by = %session.user_id(), "anketa_active_changed");
        Ok(updated)
    }

    #[instrument(skip(self, ctx))]
    pub async fn delete(&self, ctx: &RequestContext, id: Uuid) -> Result<(), ServiceError> {
        let admin = ctx.require_admin()?;
        if !self.repo.delete(id).await? {
            return Err(ServiceError::not_found("anketa"));
        }
        info!(anketa_id = %id, admin_id = %admin.user_id(), "anketa_deleted");
        Ok(())
    }

    #[instrument(skip(self, ctx, input), fields(rating = input.rating))]
    pub async fn add_review(&self, ctx: &RequestContext, anketa_id: Uuid, input: NewReview) -> Result<Review, ServiceError> {
        let author_id = ctx.require_session()?.user_id();
        validate_rating(input.rating)?;
        validate_body(&input.body)?;
        let target = self
            .repo
            .get(anketa_id)
            .await?
            .filter(|a| a.is_active)
            .ok_or_else(|| ServiceError::not_found("anketa"))?;
        if target.owner_id == author_id {
            return Err(ServiceError::Forbidden);
        }
        let input = NewReview { rating: input.rating, body: input.body.trim().to_string() };
        let review = self.repo.add_review(anketa_id, author_id, &input).await?;
        info!(anketa_id = %anketa_id, author_id = %author_id, review_id = %review.id, "review_added");
        Ok(review)
    }

    pub async fn categories(&self) -> Result<Vec<Category>, ServiceError> { self.repo.categories().await }

    pub async fn cities(&self) -> Result<Vec<City>, ServiceError> { self.repo.cities().await }

    async fn ensure_below_active_limit(&self, owner_id: Uuid) -> Result<(), ServiceError> {
        let active = self.repo.count_active_by_owner(owner_id).await?;
        if active >= MAX_ACTIVE_PER_OWNER {
            return Err(ServiceError::Validation(format!(
                "at most {MAX_ACTIVE_PER_OWNER} active listings per owner"
            )));
        }
        Ok(())
    }
}

fn normalize_new_anketa(input: NewAnketa) -> Result<NewAnketa, ServiceError> {
    validate_title(&input.title)?;
    validate_description(&input.description)?;
    validate_coordinates(input.latitude, input.longitude)?;
    let telegram = normalize_handle(input.telegram, TELEGRAM_MAX, "telegram")?;
    let whatsapp = normalize_handle(input.whatsapp, WHATSAPP_MAX, "whatsapp")?;
    Ok(NewAnketa {
        title: input.title.trim().to_string(),
        description: input.description.trim().to_string(),
        telegram,
        whatsapp,
        ..input
    })
}

fn normalize_handle(raw: Option<String>, max: usize, field: &str) -> Result<Option<String>, ServiceError> {
    let Some(value) = raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) else { return Ok(None) };
    if value.chars().count() > max {
        return Err(ServiceError::Validation(format!("{field} too long (<={max})")));
    }
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::listing::domain::SortKey;
    use crate::session::{Role, Session, SessionUser};
    use crate::storage::memory::InMemoryStore;
    use chrono::Utc;
    use common::i18n::Locale;

    struct World {
        store: Arc<InMemoryStore>,
        svc: ListingService<InMemoryStore>,
        category: Uuid,
        city: Uuid,
    }

    fn world() -> World {
        let store = Arc::new(InMemoryStore::new());
        let category = store.seed_category("Plumbing", "plumbing").id;
        let city = store.seed_city("Moscow").id;
        let svc = ListingService::new(store.clone(), PaginationPolicy::default());
        World { store, svc, category, city }
    }

    fn ctx(id: Uuid, role: Role) -> RequestContext {
        let now = Utc::now();
        let user = SessionUser { id, email: format!("{id}@example.com"), name: "T".into(), role };
        RequestContext::new(
            Some(Session { token: "t".into(), user, created_at: now, expires_at: now + chrono::Duration::hours(1) }),
            Locale::Ru,
        )
    }

    fn input(w: &World, title: &str) -> NewAnketa {
        NewAnketa {
            title: title.into(),
            description: "desc".into(),
            category_id: w.category,
            city_id: w.city,
            latitude: None,
            longitude: None,
            telegram: Some(" @pipe_master ".into()),
            whatsapp: None,
        }
    }

    fn opts(page: u64, limit: u64, sort: SortKey) -> QueryOptions {
        QueryOptions { page, limit, skip: (page - 1) * limit, take: limit, sort }
    }

    #[tokio::test]
    async fn full_page_reports_has_more_even_when_nothing_follows() {
        let w = world();
        let owner_ids: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        for n in 0..10 {
            let owner = ctx(owner_ids[n / 3], Role::User);
            w.svc.create(&owner, input(&w, &format!("listing {n}"))).await.unwrap();
        }
        let page = w.svc.page(&AnketaFilter::default(), &opts(1, 10, SortKey::Newest)).await.unwrap();
        assert_eq!(page.total, 10);
        assert_eq!(page.data.len(), 10);
        assert!(page.has_more);
    }

    #[tokio::test]
    async fn no_matches_means_empty_page() {
        let w = world();
        w.svc.create(&ctx(Uuid::new_v4(), Role::User), input(&w, "no reviews yet")).await.unwrap();
        let filter = AnketaFilter { only_with_reviews: true, ..Default::default() };
        let page = w.svc.page(&filter, &opts(1, 12, SortKey::Newest)).await.unwrap();
        assert_eq!(page.total, 0);
        assert!(page.data.is_empty());
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn consecutive_pages_have_no_gaps_or_duplicates() {
        let w = world();
        for _ in 0..7 {
            w.svc.create(&ctx(Uuid::new_v4(), Role::User), input(&w, "same title")).await.unwrap();
        }
        for sort in [SortKey::Newest, SortKey::Rating, SortKey::Alphabetical] {
            let p1 = w.svc.list(&AnketaFilter::default(), &opts(1, 4, sort)).await.unwrap();
            let p2 = w.svc.list(&AnketaFilter::default(), &opts(2, 4, sort)).await.unwrap();
            let mut ids: Vec<Uuid> = p1.iter().chain(p2.iter()).map(|a| a.id).collect();
            assert_eq!(ids.len(), 7);
            ids.sort();
            ids.dedup();
            assert_eq!(ids.len(), 7);
            assert_eq!(w.svc.count(&AnketaFilter::default()).await.unwrap(), 7);
        }
    }

    #[tokio::test]
    async fn fourth_active_listing_is_rejected() {
        let w = world();
        let owner = ctx(Uuid::new_v4(), Role::User);
        let mut created = Vec::new();
        for i in 0..3 {
            created.push(w.svc.create(&owner, input(&w, &format!("listing {i}"))).await.unwrap());
        }
        let err = w.svc.create(&owner, input(&w, "one too many")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        // deactivate one, then the slot is free again, but re-activating is not
        w.svc.set_active(&owner, created[0].id, false).await.unwrap();
        w.svc.create(&owner, input(&w, "replacement")).await.unwrap();
        let err = w.svc.set_active(&owner, created[0].id, true).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn create_validates_and_normalizes_input() {
        let w = world();
        let owner = ctx(Uuid::new_v4(), Role::User);
        assert!(w.svc.create(&RequestContext::anonymous(), input(&w, "valid title")).await.is_err());

        let err = w.svc.create(&owner, input(&w, "ab")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let mut bad_city = input(&w, "valid title");
        bad_city.city_id = Uuid::new_v4();
        assert_eq!(w.svc.create(&owner, bad_city).await.unwrap_err().kind(), ErrorKind::Validation);

        let ok = w.svc.create(&owner, input(&w, "  valid title  ")).await.unwrap();
        assert_eq!(ok.title, "valid title");
        assert_eq!(ok.telegram.as_deref(), Some("@pipe_master"));
        assert_eq!(ok.category_slug, "plumbing");
        assert!(ok.is_active);
    }

    #[tokio::test]
    async fn only_owner_or_admin_toggles() {
        let w = world();
        let owner_id = Uuid::new_v4();
        let a = w.svc.create(&ctx(owner_id, Role::User), input(&w, "mine")).await.unwrap();

        let err = w.svc.set_active(&ctx(Uuid::new_v4(), Role::User), a.id, false).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let off = w.svc.set_active(&ctx(Uuid::new_v4(), Role::Admin), a.id, false).await.unwrap();
        assert!(!off.is_active);
        assert_eq!(w.svc.get(a.id).await.unwrap_err().kind(), ErrorKind::NotFound);

        let err = w.svc.set_active(&ctx(owner_id, Role::User), Uuid::new_v4(), true).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn reviews_update_rating_and_respect_rules() {
        let w = world();
        let owner_id = Uuid::new_v4();
        let a = w.svc.create(&ctx(owner_id, Role::User), input(&w, "reviewed")).await.unwrap();

        let own = w.svc.add_review(&ctx(owner_id, Role::User), a.id, NewReview { rating: 5, body: "me".into() }).await;
        assert_eq!(own.unwrap_err().kind(), ErrorKind::Forbidden);

        let bad = w.svc.add_review(&ctx(Uuid::new_v4(), Role::User), a.id, NewReview { rating: 6, body: "".into() }).await;
        assert_eq!(bad.unwrap_err().kind(), ErrorKind::Validation);

        w.svc.add_review(&ctx(Uuid::new_v4(), Role::User), a.id, NewReview { rating: 5, body: "great".into() }).await.unwrap();
        w.svc.add_review(&ctx(Uuid::new_v4(), Role::User), a.id, NewReview { rating: 4, body: " ok ".into() }).await.unwrap();

        let detail = w.svc.get(a.id).await.unwrap();
        assert_eq!(detail.anketa.review_count, 2);
        assert_eq!(detail.anketa.rating, 4.5);
        assert_eq!(detail.contacts.telegram.as_deref(), Some("https://t.me/pipe_master"));

        let filter = AnketaFilter { only_with_reviews: true, min_rating: Some(4.5), ..Default::default() };
        assert_eq!(w.svc.count(&filter).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn inactive_listings_leave_the_public_page() {
        let w = world();
        let owner = ctx(Uuid::new_v4(), Role::User);
        let a = w.svc.create(&owner, input(&w, "hidden")).await.unwrap();
        let o = opts(1, 12, SortKey::Newest);
        assert_eq!(w.svc.page(&AnketaFilter::default(), &o).await.unwrap().total, 1);
        w.svc.set_active(&owner, a.id, false).await.unwrap();
        assert_eq!(w.svc.page(&AnketaFilter::default(), &o).await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn delete_is_admin_only() {
        let w = world();
        let owner = ctx(Uuid::new_v4(), Role::User);
        let a = w.svc.create(&owner, input(&w, "to delete")).await.unwrap();
        assert_eq!(w.svc.delete(&owner, a.id).await.unwrap_err().kind(), ErrorKind::Forbidden);
        let admin = ctx(Uuid::new_v4(), Role::Admin);
        w.svc.delete(&admin, a.id).await.unwrap();
        assert_eq!(w.svc.delete(&admin, a.id).await.unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn store_failure_is_internal() {
        let w = world();
        w.store.set_unavailable(true);
        let err = w.svc.page(&AnketaFilter::default(), &opts(1, 12, SortKey::Newest)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
