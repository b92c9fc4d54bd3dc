//! Wire types shared by the ticket issuer and the uploader

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Maximum number of characters kept from the `notes` field
pub const MAX_NOTES_CHARS: usize = 500;
/// Maximum number of characters kept from the `photographer` field
pub const MAX_PHOTOGRAPHER_CHARS: usize = 120;

/// Calendar month a photo is filed under
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    JsonSchema,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    /// All twelve months in calendar order
    pub fn all() -> impl Iterator<Item = Self> {
        Self::iter()
    }
}

/// Request for an upload ticket (client -> issuer)
///
/// Every field defaults so that a missing `month` is reported as an invalid
/// month rather than a malformed payload. The text fields also read `null`
/// as missing and accept numbers or booleans as their string form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadRequest {
    /// Month the upload is filed under
    #[serde(deserialize_with = "lenient_string")]
    #[schemars(with = "String")]
    pub month: String,
    /// Original file name as selected by the user
    #[serde(deserialize_with = "lenient_string")]
    #[schemars(with = "String")]
    pub filename: String,
    /// MIME type of the file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Declared size in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Free-form notes, truncated to 500 characters
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_opt_string"
    )]
    #[schemars(with = "Option<String>")]
    pub notes: Option<String>,
    /// Photographer credit, truncated to 120 characters
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_opt_string"
    )]
    #[schemars(with = "Option<String>")]
    pub photographer: Option<String>,
    /// Opaque token forwarded to the confirmation endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_token: Option<String>,
}

/// JSON scalar accepted where a string is expected
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Str(String),
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
}

impl From<Scalar> for String {
    fn from(scalar: Scalar) -> Self {
        match scalar {
            Scalar::Str(value) => value,
            Scalar::Bool(value) => value.to_string(),
            Scalar::Int(value) => value.to_string(),
            Scalar::UInt(value) => value.to_string(),
            Scalar::Float(value) => value.to_string(),
        }
    }
}

fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(String::from))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_opt_string(deserializer)?.unwrap_or_default())
}

/// Metadata echoed back with a ticket
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TicketMetadata {
    pub notes: String,
    pub photographer: String,
    pub month: String,
}

/// Presigned write credentials for a single object (issuer -> client)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadTicket {
    /// Form POST target
    pub upload_url: String,
    /// Form fields that must be replayed verbatim before the file part
    pub fields: BTreeMap<String, String>,
    /// Public URL the object will be reachable at
    pub file_url: String,
    /// Object key chosen by the issuer
    pub key: String,
    pub metadata: TicketMetadata,
}

/// Confirmation sent after a successful storage write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmRequest {
    pub filename: String,
    pub key: String,
    pub content_type: String,
    pub size: u64,
    pub month: String,
    pub upload_token: Option<String>,
    pub file_url: String,
}

/// Error body returned by the issuer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Truncates `value` to at most `max_chars` characters
#[must_use]
pub fn truncate_chars(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_parses_case_insensitively() {
        assert_eq!("March".parse::<Month>().unwrap(), Month::March);
        assert_eq!("DECEMBER".parse::<Month>().unwrap(), Month::December);
        assert!("smarch".parse::<Month>().is_err());
        assert_eq!(Month::September.to_string(), "september");
        assert_eq!(Month::all().count(), 12);
    }

    #[test]
    fn test_upload_request_missing_fields_default() {
        let request: UploadRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request, UploadRequest::default());

        let request: UploadRequest = serde_json::from_str(
            r#"{"month":"march","filename":"a.jpg","contentType":"image/jpeg","size":10,"uploadToken":"t"}"#,
        )
        .unwrap();
        assert_eq!(request.content_type.as_deref(), Some("image/jpeg"));
        assert_eq!(request.size, Some(10));
        assert_eq!(request.upload_token.as_deref(), Some("t"));
    }

    #[test]
    fn test_upload_request_null_fields_are_missing() {
        let request: UploadRequest = serde_json::from_str(
            r#"{"month":null,"filename":null,"notes":null,"photographer":null}"#,
        )
        .unwrap();
        assert_eq!(request, UploadRequest::default());
    }

    #[test]
    fn test_upload_request_scalars_become_strings() {
        let request: UploadRequest = serde_json::from_str(
            r#"{"month":"march","filename":2024,"notes":42,"photographer":false}"#,
        )
        .unwrap();
        assert_eq!(request.filename, "2024");
        assert_eq!(request.notes.as_deref(), Some("42"));
        assert_eq!(request.photographer.as_deref(), Some("false"));

        let request: UploadRequest = serde_json::from_str(r#"{"notes":-1.5}"#).unwrap();
        assert_eq!(request.notes.as_deref(), Some("-1.5"));

        assert!(serde_json::from_str::<UploadRequest>(r#"{"notes":["a"]}"#).is_err());
        assert!(serde_json::from_str::<UploadRequest>(r#"{"month":{"name":"march"}}"#).is_err());
    }

    #[test]
    fn test_ticket_uses_camel_case() {
        let ticket = UploadTicket {
            upload_url: "https://bucket.s3.us-east-1.amazonaws.com/".to_string(),
            fields: BTreeMap::from([("key".to_string(), "march/1-a.jpg".to_string())]),
            file_url: "https://cdn.example.com/march/1-a.jpg".to_string(),
            key: "march/1-a.jpg".to_string(),
            metadata: TicketMetadata::default(),
        };
        let value = serde_json::to_value(&ticket).unwrap();
        assert!(value["uploadUrl"].is_string());
        assert!(value["fileUrl"].is_string());
        assert_eq!(value["fields"]["key"], "march/1-a.jpg");
    }

    #[test]
    fn test_truncate_chars_counts_characters() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
