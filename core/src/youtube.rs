//! Recognizing and normalizing YouTube watch page URLs.
//!
//! Only youtube.com URLs are accepted; scheme and `www.` are optional. The
//! supported path shapes are `watch?v=`, `shorts/`, `embed/`, `/v/` and a
//! generic `?v=` query, all followed by an 11 character video id.

use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref WATCH_URL: Regex = Regex::new(
        r"^(https?://)?(www\.)?(youtube\.com/)(shorts/|watch\?v=|embed/|v/|.+\?v=)?([^&=%\?]{11})"
    )
    .expect("pattern is valid");
}

/// Path marker of short-form URLs, rewritten by [`canonicalize_watch_url`].
const SHORTS_MARKER: &str = "shorts/";

pub fn is_watch_url(url: &str) -> bool {
    WATCH_URL.is_match(url)
}

/// Rewrites a shorts URL to the long watch form
/// `https://www.youtube.com/watch?v=<id>`, dropping any query parameters
/// after the id. URLs without a shorts marker come back unchanged, so
/// canonicalizing twice is a no-op.
pub fn canonicalize_watch_url(url: &str) -> Cow<'_, str> {
    match url.rfind(SHORTS_MARKER) {
        Some(index) => {
            let rest = &url[index + SHORTS_MARKER.len()..];
            let video_id = rest.split('?').next().unwrap_or(rest);
            Cow::Owned(format!("https://www.youtube.com/watch?v={}", video_id))
        }
        None => Cow::Borrowed(url),
    }
}
