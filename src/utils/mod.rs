//! Utility functions and helpers.

pub mod http;
pub mod report;

use chrono::Utc;
use url::Url;

use crate::error::Result;

/// Join an endpoint path onto a base URL.
///
/// The base is treated as a directory, so a base of
/// `https://host/prefix` keeps its `prefix` segment.
pub fn endpoint(base_url: &str, path: &str) -> Result<Url> {
    let mut base = Url::parse(base_url)?;
    if !base.path().ends_with('/') {
        let dir = format!("{}/", base.path());
        base.set_path(&dir);
    }
    Ok(base.join(path.trim_start_matches('/'))?)
}

/// Current Unix time in milliseconds.
pub fn unix_millis() -> i64 {
    Utc::now().timestamp_millis()
}
