use url::Url;

use super::ResolveError;

const TRACK_HOST: &str = "open.spotify.com";

/// Extract the track ID from a direct track link.
///
/// Accepts `https://open.spotify.com/track/<id>` with an optional
/// `intl-xx` locale segment in front of `track`. Query strings are ignored.
pub fn track_id_from_url(raw: &str) -> Result<String, ResolveError> {
    let unsupported = || ResolveError::UnsupportedUrl(raw.to_string());

    let url = Url::parse(raw.trim()).map_err(|_| unsupported())?;
    if url.host_str() != Some(TRACK_HOST) {
        return Err(unsupported());
    }

    let mut segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|segment| !segment.is_empty()).collect())
        .unwrap_or_default();

    if segments.first().is_some_and(|s| s.starts_with("intl-")) {
        segments.remove(0);
    }

    match segments.as_slice() {
        ["track", id] if id.chars().all(|c| c.is_ascii_alphanumeric()) => Ok(id.to_string()),
        _ => Err(unsupported()),
    }
}
