use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{anketa, errors};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "category")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub slug: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Anketa }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self { Relation::Anketa => Entity::has_many(anketa::Entity).into() }
    }
}

impl Related<anketa::Entity> for Entity {
    fn to() -> RelationDef { Relation::Anketa.def() }
}

impl ActiveModelBehavior for ActiveModel {}

/// Slugs are the tags used in listing URLs: lowercase ascii, digits and `-`.
pub fn validate_slug(slug: &str) -> Result<(), errors::ModelError> {
    let ok = !slug.is_empty()
        && slug.len() <= 64
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-');
    if !ok {
        return Err(errors::ModelError::Validation("slug must match [a-z0-9-]{1,64}".into()));
    }
    Ok(())
}

pub async fn create<C: ConnectionTrait>(db: &C, name: &str, slug: &str) -> Result<Model, errors::ModelError> {
    if name.trim().is_empty() { return Err(errors::ModelError::Validation("name required".into())); }
    validate_slug(slug)?;
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.trim().to_string()),
        slug: Set(slug.to_string()),
        created_at: Set(Utc::now().into()),
    };
    Ok(am.insert(db).await?)
}

#[cfg(test)]
mod tests {
    use super::validate_slug;

    #[test]
    fn slug_rules() {
        assert!(validate_slug("plumbing").is_ok());
        assert!(validate_slug("it-services-2").is_ok());
        assert!(validate_slug("").is_err());
        assert!(validate_slug("Plumbing").is_err());
        assert!(validate_slug("-lead").is_err());
        assert!(validate_slug("with space").is_err());
    }
}
