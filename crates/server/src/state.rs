use std::sync::Arc;
use std::time::Duration;

use common::i18n::Locale;
use configs::AppConfig;
use sea_orm::DatabaseConnection;

use service::admin::repo::seaorm::SeaOrmAdminRepository;
use service::admin::repository::AdminRepository;
use service::admin::AdminService;
use service::auth::repo::seaorm::SeaOrmAuthRepository;
use service::auth::repository::AuthRepository;
use service::auth::{AuthConfig, AuthService};
use service::listing::repo::seaorm::SeaOrmListingRepository;
use service::listing::repository::ListingRepository;
use service::listing::ListingService;
use service::pagination::PaginationPolicy;
use service::session::{MokaSessionStore, SessionStore};
use service::storage::memory::InMemoryStore;

/// HTTP-level knobs derived from config.
#[derive(Clone, Debug)]
pub struct HttpSettings {
    pub cookie_name: String,
    pub secure_cookie: bool,
    pub locales: Vec<Locale>,
    pub default_locale: Locale,
}

impl HttpSettings {
    pub fn from_config(cfg: &AppConfig) -> Self {
        let mut locales: Vec<Locale> = cfg.i18n.locales.iter().filter_map(|l| Locale::parse(l)).collect();
        if locales.is_empty() {
            locales = vec![Locale::Ru, Locale::En];
        }
        let default_locale = Locale::parse(&cfg.i18n.default_locale)
            .filter(|l| locales.contains(l))
            .unwrap_or(locales[0]);
        Self {
            cookie_name: cfg.session.cookie_name.clone(),
            secure_cookie: cfg.session.secure_cookie,
            locales,
            default_locale,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub listings: Arc<ListingService<dyn ListingRepository>>,
    pub admin: Arc<AdminService<dyn AdminRepository>>,
    pub auth: Arc<AuthService<dyn AuthRepository>>,
    pub settings: Arc<HttpSettings>,
}

impl AppState {
    /// State backed by Postgres repositories sharing one pool.
    pub fn postgres(db: DatabaseConnection, cfg: &AppConfig) -> Self {
        Self::assemble(
            Arc::new(SeaOrmListingRepository { db: db.clone() }),
            Arc::new(SeaOrmAdminRepository { db: db.clone() }),
            Arc::new(SeaOrmAuthRepository { db }),
            cfg,
        )
    }

    /// State backed by a single process-local store.
    pub fn in_memory(store: Arc<InMemoryStore>, cfg: &AppConfig) -> Self {
        Self::assemble(store.clone(), store.clone(), store, cfg)
    }

    fn assemble(
        listings: Arc<dyn ListingRepository>,
        admin: Arc<dyn AdminRepository>,
        auth: Arc<dyn AuthRepository>,
        cfg: &AppConfig,
    ) -> Self {
        let sessions: Arc<dyn SessionStore> = Arc::new(MokaSessionStore::new(
            Duration::from_secs(cfg.session.ttl_secs),
            cfg.session.max_sessions,
        ));
        let policy = PaginationPolicy { default_limit: cfg.listing.default_limit, max_limit: cfg.listing.max_limit };
        let auth_cfg = AuthConfig {
            password_algorithm: "argon2".into(),
            min_password_len: cfg.auth.min_password_len,
            admin_emails: cfg.auth.admin_emails.clone(),
        };
        Self {
            listings: Arc::new(ListingService::new(listings, policy)),
            admin: Arc::new(AdminService::new(admin, policy)),
            auth: Arc::new(AuthService::new(auth, sessions, auth_cfg)),
            settings: Arc::new(HttpSettings::from_config(cfg)),
        }
    }
}
