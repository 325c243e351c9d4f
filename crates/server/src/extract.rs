use std::convert::Infallible;

use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Query-string extractor that never rejects.
///
/// A repeated key keeps its first value, so `page=1&page=2` still leaves every
/// other parameter in effect. Unparsable query strings yield `T::default()`.
pub struct FirstValueQuery<T>(pub T);

pub fn first_values(pairs: Vec<(String, String)>) -> Map<String, Value> {
    let mut map = Map::new();
    for (key, value) in pairs {
        map.entry(key).or_insert(Value::String(value));
    }
    map
}

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for FirstValueQuery<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let pairs = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri)
            .map(|Query(p)| p)
            .unwrap_or_default();
        let value = serde_json::from_value(Value::Object(first_values(pairs))).unwrap_or_default();
        Ok(FirstValueQuery(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use service::listing::AnketaQueryParams;

    fn parse(uri: &str) -> AnketaQueryParams {
        let uri: axum::http::Uri = uri.parse().unwrap();
        let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(&uri).unwrap();
        serde_json::from_value(Value::Object(first_values(pairs))).unwrap()
    }

    #[test]
    fn repeated_key_keeps_first_value_and_other_fields() {
        let p = parse("/api/anketas?cityId=abc&page=1&page=2&sortBy=rating");
        assert_eq!(p.city_id.as_deref(), Some("abc"));
        assert_eq!(p.page.as_deref(), Some("1"));
        assert_eq!(p.sort_by.as_deref(), Some("rating"));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let p = parse("/api/anketas?foo=bar&search=pipe");
        assert_eq!(p.search.as_deref(), Some("pipe"));
    }
}
