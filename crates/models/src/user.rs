use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors;
use crate::anketa;

pub const ROLE_USER: &str = "USER";
pub const ROLE_ADMIN: &str = "ADMIN";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub name: String,
    pub role: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Anketa,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self { Relation::Anketa => Entity::has_many(anketa::Entity).into() }
    }
}

impl Related<anketa::Entity> for Entity {
    fn to() -> RelationDef { Relation::Anketa.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_email(email: &str) -> Result<(), errors::ModelError> {
    let email = email.trim();
    if email.len() > 255 || !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
        return Err(errors::ModelError::Validation("invalid email".into()));
    }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<(), errors::ModelError> {
    if name.trim().is_empty() { return Err(errors::ModelError::Validation("name required".into())); }
    if name.chars().count() > 128 { return Err(errors::ModelError::Validation("name too long (<=128)".into())); }
    Ok(())
}

pub fn validate_role(role: &str) -> Result<(), errors::ModelError> {
    if role != ROLE_USER && role != ROLE_ADMIN {
        return Err(errors::ModelError::Validation("unknown role".into()));
    }
    Ok(())
}

pub async fn create<C: ConnectionTrait>(db: &C, email: &str, name: &str, role: &str) -> Result<Model, errors::ModelError> {
    validate_email(email)?;
    validate_name(name)?;
    validate_role(role)?;
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email.trim().to_lowercase()),
        name: Set(name.trim().to_string()),
        role: Set(role.to_string()),
        created_at: Set(Utc::now().into()),
    };
    Ok(am.insert(db).await?)
}
