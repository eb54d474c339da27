pub mod auth;
pub mod bookings;
pub mod brokers;
pub mod invoices;
pub mod plots;
pub mod records;

use serde::{de, Deserialize, Deserializer, Serialize};
use std::{fmt::Display, str::FromStr};

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// One uploaded file, fully buffered.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// `?layout=` filter shared by the list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct LayoutQuery {
    pub layout: Option<String>,
}

/// Forms post empty strings for untouched optional inputs.
pub(crate) fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.and_then(|s| {
        let trimmed = s.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }))
}

/// Patch field that can be cleared: absent is `None`, `null` or blank is
/// `Some(None)`, anything else is parsed into `Some(Some(value))`.
/// Needs `#[serde(default)]` so an absent key stays `None`.
pub(crate) fn clearable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let value = Option::<String>::deserialize(deserializer)?;
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(Some(None)),
        Some(s) => s.parse().map(|v| Some(Some(v))).map_err(de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct ContactForm {
        #[serde(default, deserialize_with = "empty_as_none")]
        email: Option<String>,
    }

    #[test]
    fn blank_optional_strings_become_none() {
        let p: ContactForm = serde_json::from_str(r#"{"email": "  "}"#).unwrap();
        assert_eq!(p.email, None);
        let p: ContactForm = serde_json::from_str(r#"{"email": null}"#).unwrap();
        assert_eq!(p.email, None);
        let p: ContactForm = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(p.email, None);
        let p: ContactForm = serde_json::from_str(r#"{"email": "a@b.co"}"#).unwrap();
        assert_eq!(p.email.as_deref(), Some("a@b.co"));
    }

    #[derive(Deserialize)]
    struct BuyerPatch {
        #[serde(default, deserialize_with = "clearable")]
        dob: Option<Option<chrono::NaiveDate>>,
    }

    #[test]
    fn clearable_fields_distinguish_absent_from_cleared() {
        let p: BuyerPatch = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(p.dob, None);
        let p: BuyerPatch = serde_json::from_str(r#"{"dob": ""}"#).unwrap();
        assert_eq!(p.dob, Some(None));
        let p: BuyerPatch = serde_json::from_str(r#"{"dob": null}"#).unwrap();
        assert_eq!(p.dob, Some(None));
        let p: BuyerPatch = serde_json::from_str(r#"{"dob": "1990-05-17"}"#).unwrap();
        assert_eq!(p.dob, Some(chrono::NaiveDate::from_ymd_opt(1990, 5, 17)));
        assert!(serde_json::from_str::<BuyerPatch>(r#"{"dob": "17/05/1990"}"#).is_err());
    }
}
