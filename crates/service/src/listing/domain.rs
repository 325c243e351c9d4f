use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::contact::ContactLinks;

/// Listing as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anketa {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category_id: Uuid,
    pub category_slug: String,
    pub city_id: Uuid,
    pub owner_id: Uuid,
    pub is_active: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub telegram: Option<String>,
    pub whatsapp: Option<String>,
    pub rating: f64,
    pub review_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public listing detail: the listing plus ready-to-use messenger links.
#[derive(Debug, Clone, Serialize)]
pub struct AnketaDetail {
    #[serde(flatten)]
    pub anketa: Anketa,
    pub contacts: ContactLinks,
}

/// Constraints produced by the filter builder. `None` means unconstrained.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnketaFilter {
    pub city_id: Option<Uuid>,
    /// Category slug.
    pub category: Option<String>,
    /// Lowercased search needle, matched against title or description.
    pub search: Option<String>,
    pub min_rating: Option<f64>,
    pub only_with_reviews: bool,
}

impl AnketaFilter {
    /// In-process evaluation of the same constraints the SQL condition expresses.
    pub fn matches(&self, a: &Anketa) -> bool {
        if let Some(city) = self.city_id {
            if a.city_id != city {
                return false;
            }
        }
        if let Some(slug) = &self.category {
            if &a.category_slug != slug {
                return false;
            }
        }
        if let Some(needle) = &self.search {
            if !a.title.to_lowercase().contains(needle) && !a.description.to_lowercase().contains(needle) {
                return false;
            }
        }
        if let Some(min) = self.min_rating {
            if a.rating < min {
                return false;
            }
        }
        !(self.only_with_reviews && a.review_count == 0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Highest rating first, newer listings first among equal ratings.
    Rating,
    #[default]
    Newest,
    /// Title ascending.
    Alphabetical,
}

impl SortKey {
    /// Unknown or absent keys mean `Newest`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("rating") => SortKey::Rating,
            Some("alphabetical") => SortKey::Alphabetical,
            _ => SortKey::Newest,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    pub page: u64,
    pub limit: u64,
    pub skip: u64,
    pub take: u64,
    pub sort: SortKey,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingPage {
    pub data: Vec<Anketa>,
    pub has_more: bool,
    pub total: u64,
    pub page: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAnketa {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category_id: Uuid,
    pub city_id: Uuid,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub telegram: Option<String>,
    #[serde(default)]
    pub whatsapp: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewReview {
    pub rating: i16,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub anketa_id: Uuid,
    pub author_id: Uuid,
    pub rating: i16,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct City {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<(models::anketa::Model, Option<models::category::Model>)> for Anketa {
    fn from((m, category): (models::anketa::Model, Option<models::category::Model>)) -> Self {
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            category_id: m.category_id,
            category_slug: category.map(|c| c.slug).unwrap_or_default(),
            city_id: m.city_id,
            owner_id: m.owner_id,
            is_active: m.is_active,
            latitude: m.latitude,
            longitude: m.longitude,
            telegram: m.telegram,
            whatsapp: m.whatsapp,
            rating: m.rating,
            review_count: m.review_count.max(0) as u32,
            created_at: m.created_at.with_timezone(&Utc),
            updated_at: m.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<models::review::Model> for Review {
    fn from(m: models::review::Model) -> Self {
        Self {
            id: m.id,
            anketa_id: m.anketa_id,
            author_id: m.author_id,
            rating: m.rating,
            body: m.body,
            created_at: m.created_at.with_timezone(&Utc),
        }
    }
}

impl From<models::category::Model> for Category {
    fn from(m: models::category::Model) -> Self {
        Self { id: m.id, name: m.name, slug: m.slug, created_at: m.created_at.with_timezone(&Utc) }
    }
}

impl From<models::city::Model> for City {
    fn from(m: models::city::Model) -> Self {
        Self { id: m.id, name: m.name, created_at: m.created_at.with_timezone(&Utc) }
    }
}
