//! Optional URL normalization for duplicate matching.

use std::borrow::Cow;

use url::Url;

/// Normalize a URL for comparison.
///
/// Parsing already lowercases the scheme and host and drops default ports;
/// on top of that a trailing slash is trimmed from non-root paths. Text
/// that does not parse as a URL is returned unchanged.
pub fn normalize_url(raw: &str) -> Cow<'_, str> {
    let Ok(mut url) = Url::parse(raw) else {
        return Cow::Borrowed(raw);
    };

    if url.path().len() > 1 && url.path().ends_with('/') {
        let trimmed = url.path().trim_end_matches('/').to_string();
        url.set_path(&trimmed);
    }

    let normalized: String = url.into();
    if normalized == raw {
        Cow::Borrowed(raw)
    } else {
        Cow::Owned(normalized)
    }
}
