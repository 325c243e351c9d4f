//! Messenger deep links built from the raw handles stored on a listing.

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContactLinks {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telegram: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whatsapp: Option<String>,
}

pub fn contact_links(telegram: Option<&str>, whatsapp: Option<&str>) -> ContactLinks {
    ContactLinks {
        telegram: telegram.and_then(telegram_link),
        whatsapp: whatsapp.and_then(whatsapp_link),
    }
}

/// `https://t.me/<username>`; the username is 5..=32 of `[A-Za-z0-9_]`.
pub fn telegram_link(handle: &str) -> Option<String> {
    let username = handle.trim().trim_start_matches('@');
    let valid = (5..=32).contains(&username.len())
        && username.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_');
    valid.then(|| format!("https://t.me/{username}"))
}

/// `https://wa.me/<digits>`; formatting characters are dropped, 7..=15 digits remain.
pub fn whatsapp_link(phone: &str) -> Option<String> {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    (7..=15).contains(&digits.len()).then(|| format!("https://wa.me/{digits}"))
}
