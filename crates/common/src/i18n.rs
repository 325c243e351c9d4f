//! Locale negotiation and the small catalog of user-facing failure messages.
//!
//! Internal error details never go through here; callers pick a [`MessageKey`]
//! and get back a localized, generic sentence.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Ru,
    En,
}

impl Locale {
    pub fn code(self) -> &'static str {
        match self {
            Locale::Ru => "ru",
            Locale::En => "en",
        }
    }

    /// Parse a language tag such as `ru`, `en-US` or `EN_gb`; only the
    /// primary subtag is considered.
    pub fn parse(tag: &str) -> Option<Self> {
        let primary = tag.trim().split(['-', '_']).next()?.to_ascii_lowercase();
        match primary.as_str() {
            "ru" => Some(Locale::Ru),
            "en" => Some(Locale::En),
            _ => None,
        }
    }

    /// Resolve the request locale: explicit cookie first, then the
    /// highest-weighted supported `Accept-Language` entry, then `default`.
    pub fn negotiate(
        cookie: Option<&str>,
        accept_language: Option<&str>,
        supported: &[Locale],
        default: Locale,
    ) -> Locale {
        let is_supported = |l: &Locale| supported.contains(l);

        if let Some(l) = cookie.and_then(Locale::parse).filter(is_supported) {
            return l;
        }

        let Some(header) = accept_language else { return default };
        let mut ranked: Vec<(f32, Locale)> = header
            .split(',')
            .filter_map(|entry| {
                let mut parts = entry.split(';');
                let locale = Locale::parse(parts.next()?)?;
                let q = parts
                    .find_map(|p| p.trim().strip_prefix("q="))
                    .and_then(|q| q.parse::<f32>().ok())
                    .unwrap_or(1.0);
                Some((q, locale))
            })
            .filter(|(q, l)| *q > 0.0 && is_supported(l))
            .collect();
        // stable sort keeps header order between equal weights
        ranked.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        ranked.first().map(|(_, l)| *l).unwrap_or(default)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageKey {
    Unauthenticated,
    InvalidCredentials,
    Forbidden,
    NotFound,
    Conflict,
    Validation,
    Internal,
}

pub fn message(key: MessageKey, locale: Locale) -> &'static str {
    use MessageKey::*;
    match (locale, key) {
        (Locale::Ru, Unauthenticated) => "Необходимо войти в систему",
        (Locale::Ru, InvalidCredentials) => "Неверный email или пароль",
        (Locale::Ru, Forbidden) => "Недостаточно прав",
        (Locale::Ru, NotFound) => "Не найдено",
        (Locale::Ru, Conflict) => "Запись уже существует",
        (Locale::Ru, Validation) => "Некорректные данные",
        (Locale::Ru, Internal) => "Что-то пошло не так, попробуйте позже",
        (Locale::En, Unauthenticated) => "Authentication required",
        (Locale::En, InvalidCredentials) => "Invalid email or password",
        (Locale::En, Forbidden) => "Not allowed",
        (Locale::En, NotFound) => "Not found",
        (Locale::En, Conflict) => "Already exists",
        (Locale::En, Validation) => "Invalid input",
        (Locale::En, Internal) => "Something went wrong, please try again later",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOTH: [Locale; 2] = [Locale::Ru, Locale::En];

    #[test]
    fn parse_uses_primary_subtag() {
        assert_eq!(Locale::parse("en-US"), Some(Locale::En));
        assert_eq!(Locale::parse("RU_ru"), Some(Locale::Ru));
        assert_eq!(Locale::parse("de"), None);
        assert_eq!(Locale::parse(""), None);
    }

    #[test]
    fn cookie_wins_over_header() {
        let l = Locale::negotiate(Some("en"), Some("ru-RU,ru;q=0.9"), &BOTH, Locale::Ru);
        assert_eq!(l, Locale::En);
    }

    #[test]
    fn header_weights_are_respected() {
        let l = Locale::negotiate(None, Some("de-DE,ru;q=0.5,en;q=0.8"), &BOTH, Locale::Ru);
        assert_eq!(l, Locale::En);
    }

    #[test]
    fn unsupported_cookie_falls_through_to_default() {
        let l = Locale::negotiate(Some("de"), None, &BOTH, Locale::Ru);
        assert_eq!(l, Locale::Ru);
        let only_ru = [Locale::Ru];
        let l = Locale::negotiate(Some("en"), Some("en"), &only_ru, Locale::Ru);
        assert_eq!(l, Locale::Ru);
    }

    #[test]
    fn every_key_has_a_message_in_every_locale() {
        use MessageKey::*;
        for locale in BOTH {
            for key in [Unauthenticated, InvalidCredentials, Forbidden, NotFound, Conflict, Validation, Internal] {
                assert!(!message(key, locale).is_empty());
            }
        }
    }
}
