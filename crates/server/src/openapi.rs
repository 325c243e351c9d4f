use utoipa::OpenApi;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct RegisterRequest { pub email: String, pub name: String, pub password: String }

#[derive(ToSchema)]
pub struct LoginRequest { pub email: String, pub password: String }

#[derive(ToSchema)]
#[allow(non_snake_case)]
pub struct NewAnketaDoc {
    pub title: String,
    pub description: Option<String>,
    pub categoryId: Uuid,
    pub cityId: Uuid,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub telegram: Option<String>,
    pub whatsapp: Option<String>,
}

#[derive(ToSchema)]
pub struct ActiveDoc { pub active: bool }

#[derive(ToSchema)]
pub struct NewReviewDoc { pub rating: i16, pub body: Option<String> }

#[derive(ToSchema)]
pub struct NewCategoryDoc { pub name: String, pub slug: String }

#[derive(ToSchema)]
pub struct NewCityDoc { pub name: String }

#[derive(ToSchema)]
#[allow(non_snake_case)]
pub struct AnketaDoc {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub categoryId: Uuid,
    pub categorySlug: String,
    pub cityId: Uuid,
    pub ownerId: Uuid,
    pub isActive: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub telegram: Option<String>,
    pub whatsapp: Option<String>,
    pub rating: f64,
    pub reviewCount: u32,
    pub createdAt: String,
    pub updatedAt: String,
}

#[derive(ToSchema)]
#[allow(non_snake_case)]
pub struct ListingPageDoc {
    pub data: Vec<AnketaDoc>,
    pub hasMore: bool,
    pub total: u64,
    pub page: u64,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::me,
        crate::routes::anketas::list,
        crate::routes::anketas::get,
        crate::routes::anketas::create,
        crate::routes::anketas::set_active,
        crate::routes::anketas::add_review,
        crate::routes::catalog::categories,
        crate::routes::catalog::cities,
        crate::routes::admin::users,
        crate::routes::admin::anketas,
        crate::routes::admin::delete_anketa,
        crate::routes::admin::categories,
        crate::routes::admin::create_category,
        crate::routes::admin::cities,
        crate::routes::admin::create_city,
    ),
    components(
        schemas(
            HealthResponse,
            RegisterRequest,
            LoginRequest,
            NewAnketaDoc,
            ActiveDoc,
            NewReviewDoc,
            NewCategoryDoc,
            NewCityDoc,
            AnketaDoc,
            ListingPageDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "anketas"),
        (name = "catalog"),
        (name = "admin")
    )
)]
pub struct ApiDoc;
