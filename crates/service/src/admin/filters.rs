//! Admin query parameters → filters. Unknown enum values mean "all".

use serde::Deserialize;

use crate::listing::domain::AnketaFilter;
use crate::listing::filters::{non_empty, parse_search, parse_uuid};
use crate::session::Role;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminUserParams {
    pub search: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminAnketaParams {
    pub search: Option<String>,
    pub city_id: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NameParams {
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminUserFilter {
    /// Lowercased; matched against email or name.
    pub search: Option<String>,
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdminAnketaFilter {
    pub base: AnketaFilter,
    /// `Some(true)` active only, `Some(false)` inactive only.
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameFilter {
    pub search: Option<String>,
}

impl AdminUserParams {
    pub fn to_filter(&self) -> AdminUserFilter {
        AdminUserFilter {
            search: parse_search(self.search.as_deref()),
            role: self.role.as_deref().and_then(Role::parse),
        }
    }
}

impl AdminAnketaParams {
    pub fn to_filter(&self) -> AdminAnketaFilter {
        let active = match non_empty(self.status.as_deref()).map(str::to_ascii_lowercase).as_deref() {
            Some("active") => Some(true),
            Some("inactive") => Some(false),
            _ => None,
        };
        AdminAnketaFilter {
            base: AnketaFilter {
                city_id: parse_uuid(self.city_id.as_deref()),
                category: non_empty(self.category.as_deref()).map(str::to_string),
                search: parse_search(self.search.as_deref()),
                ..AnketaFilter::default()
            },
            active,
        }
    }
}

impl NameParams {
    pub fn to_filter(&self) -> NameFilter {
        NameFilter { search: parse_search(self.search.as_deref()) }
    }
}

impl AdminUserFilter {
    pub fn matches(&self, email: &str, name: &str, role: Role) -> bool {
        if let Some(r) = self.role {
            if r != role {
                return false;
            }
        }
        match &self.search {
            Some(needle) => email.to_lowercase().contains(needle) || name.to_lowercase().contains(needle),
            None => true,
        }
    }
}

impl NameFilter {
    pub fn matches(&self, name: &str) -> bool {
        self.search.as_ref().map_or(true, |needle| name.to_lowercase().contains(needle))
    }
}
