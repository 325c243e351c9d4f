use sea_orm::{entity::prelude::*, ConnectionTrait, PaginatorTrait, QuerySelect, Set, TransactionTrait};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{category, city, errors, review, user};

/// An owner may keep at most this many listings active at once.
pub const MAX_ACTIVE_PER_OWNER: u64 = 3;

pub const TITLE_MIN: usize = 3;
pub const TITLE_MAX: usize = 120;
pub const DESCRIPTION_MAX: usize = 5000;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "anketa")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub category_id: Uuid,
    pub city_id: Uuid,
    pub owner_id: Uuid,
    pub is_active: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub telegram: Option<String>,
    pub whatsapp: Option<String>,
    pub rating: f64,
    pub review_count: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Owner,
    Category,
    City,
    Review,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Owner => Entity::belongs_to(user::Entity)
                .from(Column::OwnerId)
                .to(user::Column::Id)
                .into(),
            Relation::Category => Entity::belongs_to(category::Entity)
                .from(Column::CategoryId)
                .to(category::Column::Id)
                .into(),
            Relation::City => Entity::belongs_to(city::Entity)
                .from(Column::CityId)
                .to(city::Column::Id)
                .into(),
            Relation::Review => Entity::has_many(review::Entity).into(),
        }
    }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef { Relation::Owner.def() }
}

impl Related<category::Entity> for Entity {
    fn to() -> RelationDef { Relation::Category.def() }
}

impl Related<city::Entity> for Entity {
    fn to() -> RelationDef { Relation::City.def() }
}

impl Related<review::Entity> for Entity {
    fn to() -> RelationDef { Relation::Review.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_title(title: &str) -> Result<(), errors::ModelError> {
    let n = title.trim().chars().count();
    if !(TITLE_MIN..=TITLE_MAX).contains(&n) {
        return Err(errors::ModelError::Validation(format!("title length must be {TITLE_MIN}..={TITLE_MAX}")));
    }
    Ok(())
}

pub fn validate_description(description: &str) -> Result<(), errors::ModelError> {
    if description.chars().count() > DESCRIPTION_MAX {
        return Err(errors::ModelError::Validation(format!("description too long (<={DESCRIPTION_MAX})")));
    }
    Ok(())
}

pub fn validate_coordinates(lat: Option<f64>, lon: Option<f64>) -> Result<(), errors::ModelError> {
    match (lat, lon) {
        (None, None) => Ok(()),
        (Some(lat), Some(lon)) if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon) => Ok(()),
        (Some(_), Some(_)) => Err(errors::ModelError::Validation("coordinates out of range".into())),
        _ => Err(errors::ModelError::Validation("latitude and longitude go together".into())),
    }
}

pub struct NewAnketa<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub category_id: Uuid,
    pub city_id: Uuid,
    pub owner_id: Uuid,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub telegram: Option<String>,
    pub whatsapp: Option<String>,
}

pub async fn create<C: ConnectionTrait>(db: &C, new: NewAnketa<'_>) -> Result<Model, errors::ModelError> {
    validate_title(new.title)?;
    validate_description(new.description)?;
    validate_coordinates(new.latitude, new.longitude)?;
    let now: DateTimeWithTimeZone = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(new.title.trim().to_string()),
        description: Set(new.description.to_string()),
        category_id: Set(new.category_id),
        city_id: Set(new.city_id),
        owner_id: Set(new.owner_id),
        is_active: Set(true),
        latitude: Set(new.latitude),
        longitude: Set(new.longitude),
        telegram: Set(new.telegram),
        whatsapp: Set(new.whatsapp),
        rating: Set(0.0),
        review_count: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(am.insert(db).await?)
}

pub async fn count_active_by_owner<C: ConnectionTrait>(db: &C, owner_id: Uuid) -> Result<u64, errors::ModelError> {
    Ok(Entity::find()
        .filter(Column::OwnerId.eq(owner_id))
        .filter(Column::IsActive.eq(true))
        .count(db)
        .await?)
}

pub async fn set_active<C: ConnectionTrait>(db: &C, id: Uuid, active: bool) -> Result<Option<Model>, errors::ModelError> {
    let Some(found) = Entity::find_by_id(id).one(db).await? else { return Ok(None) };
    let mut am: ActiveModel = found.into();
    am.is_active = Set(active);
    am.updated_at = Set(Utc::now().into());
    Ok(Some(am.update(db).await?))
}

/// Mean of `ratings` rounded to one decimal, or 0 when empty.
pub fn average_rating(ratings: &[i16]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let sum: i64 = ratings.iter().map(|r| *r as i64).sum();
    let avg = sum as f64 / ratings.len() as f64;
    (avg * 10.0).round() / 10.0
}

/// Recompute `rating` and `review_count` from the review table.
pub async fn refresh_rating<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Model, errors::ModelError> {
    let ratings: Vec<i16> = review::Entity::find()
        .select_only()
        .column(review::Column::Rating)
        .filter(review::Column::AnketaId.eq(id))
        .into_tuple()
        .all(db)
        .await?;
    let Some(found) = Entity::find_by_id(id).one(db).await? else {
        return Err(errors::ModelError::Validation("anketa not found".into()));
    };
    let mut am: ActiveModel = found.into();
    am.rating = Set(average_rating(&ratings));
    am.review_count = Set(ratings.len() as i32);
    am.updated_at = Set(Utc::now().into());
    Ok(am.update(db).await?)
}

/// Insert a review and refresh the aggregates in one transaction.
pub async fn add_review<C: TransactionTrait>(
    db: &C,
    anketa_id: Uuid,
    author_id: Uuid,
    rating: i16,
    body: &str,
) -> Result<(review::Model, Model), errors::ModelError> {
    let txn = db.begin().await?;
    let created = review::create(&txn, anketa_id, author_id, rating, body).await?;
    let updated = refresh_rating(&txn, anketa_id).await?;
    txn.commit().await?;
    Ok((created, updated))
}
