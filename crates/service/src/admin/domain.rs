use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::listing::domain::{Anketa, Category, City};
use crate::session::Role;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCounts {
    pub anketas: u64,
    /// Reviews left on listings this user owns.
    pub received_comments: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "_count")]
    pub count: UserCounts,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewCount {
    pub reviews: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminAnketa {
    #[serde(flatten)]
    pub anketa: Anketa,
    #[serde(rename = "_count")]
    pub count: ReviewCount,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnketaCount {
    pub anketas: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminCategory {
    #[serde(flatten)]
    pub category: Category,
    #[serde(rename = "_count")]
    pub count: AnketaCount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminCity {
    #[serde(flatten)]
    pub city: City,
    #[serde(rename = "_count")]
    pub count: AnketaCount,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCity {
    pub name: String,
}
