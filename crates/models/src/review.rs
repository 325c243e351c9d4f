use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{anketa, errors, user};

pub const BODY_MAX: usize = 2000;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "review")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub anketa_id: Uuid,
    pub author_id: Uuid,
    pub rating: i16,
    #[sea_orm(column_type = "Text")]
    pub body: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Anketa,
    Author,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Anketa => Entity::belongs_to(anketa::Entity)
                .from(Column::AnketaId)
                .to(anketa::Column::Id)
                .into(),
            Relation::Author => Entity::belongs_to(user::Entity)
                .from(Column::AuthorId)
                .to(user::Column::Id)
                .into(),
        }
    }
}

impl Related<anketa::Entity> for Entity {
    fn to() -> RelationDef { Relation::Anketa.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_rating(rating: i16) -> Result<(), errors::ModelError> {
    if !(1..=5).contains(&rating) {
        return Err(errors::ModelError::Validation("rating must be 1..=5".into()));
    }
    Ok(())
}

pub fn validate_body(body: &str) -> Result<(), errors::ModelError> {
    if body.chars().count() > BODY_MAX {
        return Err(errors::ModelError::Validation(format!("review too long (<={BODY_MAX})")));
    }
    Ok(())
}

pub async fn create<C: ConnectionTrait>(
    db: &C,
    anketa_id: Uuid,
    author_id: Uuid,
    rating: i16,
    body: &str,
) -> Result<Model, errors::ModelError> {
    validate_rating(rating)?;
    validate_body(body)?;
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        anketa_id: Set(anketa_id),
        author_id: Set(author_id),
        rating: Set(rating),
        body: Set(body.trim().to_string()),
        created_at: Set(Utc::now().into()),
    };
    Ok(am.insert(db).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_range() {
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(1).is_ok());
        assert!(validate_rating(5).is_ok());
        assert!(validate_rating(6).is_err());
    }
}
