//! Wire shapes of the content backend's search API.
//!
//! Every field is optional: the backend may omit fields that were not
//! requested via `fetch`, and editors may leave fields blank. Values of an
//! unexpected JSON type are treated as missing rather than failing the
//! whole response.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// `GET {endpoint}` repository description
#[derive(Debug, Default, Deserialize)]
pub struct RawApi {
    #[serde(default)]
    pub refs: Vec<RawRef>,
}

#[derive(Debug, Deserialize)]
pub struct RawRef {
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default, rename = "isMasterRef")]
    pub is_master_ref: bool,
}

impl RawApi {
    pub fn master_ref(&self) -> Option<&str> {
        self.refs
            .iter()
            .find(|r| r.is_master_ref)
            .map(|r| r.reference.as_str())
    }
}

/// `GET {endpoint}/documents/search` response
#[derive(Debug, Default, Deserialize)]
pub struct RawSearchResponse {
    #[serde(default, deserialize_with = "lenient")]
    pub next_page: Option<String>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub results: Vec<RawPost>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawPost {
    #[serde(default, deserialize_with = "lenient")]
    pub uid: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub first_publication_date: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub data: Option<RawPostData>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawPostData {
    #[serde(default, deserialize_with = "text_field")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "text_field")]
    pub subtitle: Option<String>,
    #[serde(default, deserialize_with = "text_field")]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub banner: Option<RawImage>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub content: Vec<RawContentBlock>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawImage {
    #[serde(default, deserialize_with = "lenient")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub alt: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawContentBlock {
    #[serde(default, deserialize_with = "text_field")]
    pub heading: Option<String>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub body: Vec<RawRichText>,
}

/// One structured-text block
#[derive(Debug, Default, Deserialize)]
pub struct RawRichText {
    #[serde(default, rename = "type", deserialize_with = "lenient")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub spans: Vec<RawSpan>,
    #[serde(default, deserialize_with = "lenient")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub alt: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub oembed: Option<RawEmbed>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawEmbed {
    #[serde(default, deserialize_with = "lenient")]
    pub embed_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawSpan {
    #[serde(default, deserialize_with = "lenient")]
    pub start: Option<usize>,
    #[serde(default, deserialize_with = "lenient")]
    pub end: Option<usize>,
    #[serde(default, rename = "type", deserialize_with = "lenient")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub data: Option<RawSpanData>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawSpanData {
    #[serde(default, deserialize_with = "lenient")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub target: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub label: Option<String>,
}

/// Deserialize `T`, or `None` if the value is null or has the wrong shape
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Deserialize a list, skipping elements that fail to parse
fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// A plain text field. Title-type rich text fields (arrays of blocks) are
/// flattened by joining their block texts with a space.
fn text_field<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => Some(s),
        Value::Array(blocks) => {
            let texts: Vec<&str> = blocks
                .iter()
                .filter_map(|b| b.get("text").and_then(Value::as_str))
                .collect();
            (!texts.is_empty()).then(|| texts.join(" "))
        }
        _ => None,
    })
}
