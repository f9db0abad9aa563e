//! Remote gallery payloads.
//!
//! The wire structs mirror the JSON envelopes returned by the gallery
//! service; the public types are what the rest of the crate works with.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One post as observed on a listing page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListingEntry {
    /// Remote post identifier (opaque)
    pub id: String,

    /// Cover image URL, when the listing carries one
    pub cover_url: Option<String>,
}

impl ListingEntry {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            cover_url: None,
        }
    }
}

/// A decoded listing page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    pub entries: Vec<ListingEntry>,
    /// Whether a following page may exist
    pub has_more: bool,
}

impl ListingPage {
    pub fn new(entries: Vec<ListingEntry>) -> Self {
        let has_more = !entries.is_empty();
        Self { entries, has_more }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Full post record from the detail endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostDetail {
    #[serde(rename = "postId", default, deserialize_with = "string_or_number")]
    pub id: String,

    #[serde(rename = "postTitle", default, deserialize_with = "null_as_default")]
    pub title: String,

    #[serde(rename = "postDesc", default, deserialize_with = "null_as_default")]
    pub description: String,

    #[serde(rename = "userNick", default, deserialize_with = "null_as_default")]
    pub user_nick: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub signature: String,

    #[serde(default, deserialize_with = "image_urls")]
    pub images: Vec<String>,
}

// --- Wire envelopes ---

#[derive(Debug, Deserialize)]
pub(crate) struct ListingResponse {
    #[serde(default)]
    pub data: Option<ListingData>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListingData {
    #[serde(default)]
    pub posts: Option<Vec<ListingPost>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListingPost {
    #[serde(rename = "postId", default, deserialize_with = "string_or_number")]
    pub id: String,

    #[serde(default)]
    pub image: Option<ListingImage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListingImage {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DetailResponse {
    #[serde(default)]
    pub data: Option<DetailData>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DetailData {
    #[serde(default)]
    pub post: Option<PostDetail>,
}

impl From<ListingPost> for ListingEntry {
    fn from(post: ListingPost) -> Self {
        Self {
            id: post.id,
            cover_url: post
                .image
                .and_then(|image| image.url)
                .filter(|url| !url.is_empty()),
        }
    }
}

/// Accept identifiers encoded either as JSON strings or numbers.
///
/// Strings are kept exactly as sent. Numbers must be integral; a float
/// spelling such as `1e3` is rendered as the integer `1000`.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => integral_id(&n).ok_or_else(|| {
            de::Error::custom(format!("expected integral numeric identifier, got {n}"))
        }),
        Value::Null => Ok(String::new()),
        other => Err(de::Error::custom(format!(
            "expected string or number identifier, got {other}"
        ))),
    }
}

fn integral_id(n: &serde_json::Number) -> Option<String> {
    if let Some(v) = n.as_u64() {
        return Some(v.to_string());
    }
    if let Some(v) = n.as_i64() {
        return Some(v.to_string());
    }
    let v = n.as_f64()?;
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 9_007_199_254_740_992.0 {
        return Some(format!("{}", v as i64));
    }
    None
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Image lists may be null or contain null/empty slots; keep only real URLs.
fn image_urls<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<Option<String>>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .flatten()
        .filter(|url| !url.trim().is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_id_accepts_number_and_string() {
        let numeric: ListingPost = serde_json::from_str(r#"{"postId": 1234567890123}"#).unwrap();
        assert_eq!(numeric.id, "1234567890123");

        let text: ListingPost = serde_json::from_str(r#"{"postId": "abc-1"}"#).unwrap();
        assert_eq!(text.id, "abc-1");
    }

    #[test]
    fn test_post_id_string_is_kept_verbatim() {
        let padded: ListingPost = serde_json::from_str(r#"{"postId": " 7 "}"#).unwrap();
        assert_eq!(padded.id, " 7 ");
    }

    #[test]
    fn test_post_id_float_spelling_renders_as_integer() {
        let exponent: ListingPost = serde_json::from_str(r#"{"postId": 1e3}"#).unwrap();
        assert_eq!(exponent.id, "1000");

        let fraction: Result<ListingPost, _> = serde_json::from_str(r#"{"postId": 1.5}"#);
        assert!(fraction.is_err());
    }

    #[test]
    fn test_post_id_rejects_objects() {
        let result: Result<ListingPost, _> = serde_json::from_str(r#"{"postId": {"x": 1}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_detail_tolerates_nulls() {
        let detail: PostDetail = serde_json::from_str(
            r#"{"postId": 5, "postTitle": null, "userNick": "lens", "images": ["a", null, ""]}"#,
        )
        .unwrap();

        assert_eq!(detail.id, "5");
        assert_eq!(detail.title, "");
        assert_eq!(detail.description, "");
        assert_eq!(detail.user_nick, "lens");
        assert_eq!(detail.images, vec!["a".to_string()]);
    }

    #[test]
    fn test_listing_entry_cover_url() {
        let post: ListingPost =
            serde_json::from_str(r#"{"postId": "7", "image": {"url": "https://c/7.jpg"}}"#)
                .unwrap();
        let entry = ListingEntry::from(post);
        assert_eq!(entry.cover_url.as_deref(), Some("https://c/7.jpg"));
    }

    #[test]
    fn test_listing_page_has_more_follows_entries() {
        assert!(!ListingPage::new(Vec::new()).has_more);
        assert!(ListingPage::new(vec![ListingEntry::new("1")]).has_more);
    }
}
