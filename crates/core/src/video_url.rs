//! Video page URL helpers.
//!
//! Extracts the video identifier from a watch-page location, strips the
//! volatile query parameters (playlist position, timestamps, tracking) that
//! should not be persisted, and builds the time-offset URLs used when no
//! player is available to seek.

use crate::time_format::seek_seconds;
use crate::types::VideoId;

/// Query parameter carrying the video identifier.
pub const VIDEO_ID_PARAM: &str = "v";

/// Query parameter carrying the start offset.
pub const TIME_PARAM: &str = "t";

/// Split `url` into the part before `?` and the raw query (fragment removed).
fn split_query(url: &str) -> (&str, Option<&str>) {
    let without_fragment = url.split('#').next().unwrap_or(url);
    match without_fragment.split_once('?') {
        Some((base, query)) => (base, Some(query)),
        None => (without_fragment, None),
    }
}

/// Return the value of query parameter `name`, if present and non-empty.
pub fn query_param<'a>(url: &'a str, name: &str) -> Option<&'a str> {
    let (_, query) = split_query(url);
    query?
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

/// Extract the video identifier from a page location.
///
/// Returns `None` for pages that are not addressing a single video.
pub fn video_id_from_url(url: &str) -> Option<VideoId> {
    query_param(url, VIDEO_ID_PARAM).map(str::to_string)
}

/// Canonical form of a watch URL: the path plus the video identifier only.
///
/// Locations without a video identifier fall back to everything before the
/// first `&`.
pub fn canonical_url(url: &str) -> String {
    match video_id_from_url(url) {
        Some(id) => {
            let (base, _) = split_query(url);
            format!("{base}?{VIDEO_ID_PARAM}={id}")
        }
        None => url.split('&').next().unwrap_or(url).to_string(),
    }
}

/// Append a whole-second start offset to `url`.
pub fn seek_url(url: &str, seconds: f64) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{TIME_PARAM}={}s", seek_seconds(seconds))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_video_id() {
        assert_eq!(
            video_id_from_url("https://www.youtube.com/watch?v=abc123").as_deref(),
            Some("abc123")
        );
        assert_eq!(
            video_id_from_url("https://www.youtube.com/watch?list=PL1&v=xyz&index=3").as_deref(),
            Some("xyz")
        );
    }

    #[test]
    fn missing_or_empty_id_is_none() {
        assert!(video_id_from_url("https://www.youtube.com/").is_none());
        assert!(video_id_from_url("https://www.youtube.com/watch?v=").is_none());
        assert!(video_id_from_url("https://www.youtube.com/results?search_query=v").is_none());
    }

    #[test]
    fn fragment_is_ignored() {
        assert_eq!(
            video_id_from_url("https://www.youtube.com/watch?v=abc#comments").as_deref(),
            Some("abc")
        );
    }

    #[test]
    fn canonical_url_drops_volatile_params() {
        assert_eq!(
            canonical_url("https://www.youtube.com/watch?v=abc&t=42s&list=PL9"),
            "https://www.youtube.com/watch?v=abc"
        );
        assert_eq!(
            canonical_url("https://www.youtube.com/watch?list=PL9&v=abc"),
            "https://www.youtube.com/watch?v=abc"
        );
    }

    #[test]
    fn canonical_url_without_id_keeps_prefix() {
        assert_eq!(
            canonical_url("https://example.com/page?a=1&b=2"),
            "https://example.com/page?a=1"
        );
    }

    #[test]
    fn seek_url_picks_separator() {
        assert_eq!(
            seek_url("https://www.youtube.com/watch?v=abc", 65.4),
            "https://www.youtube.com/watch?v=abc&t=65s"
        );
        assert_eq!(seek_url("https://youtu.be/abc", 3.0), "https://youtu.be/abc?t=3s");
    }
}
