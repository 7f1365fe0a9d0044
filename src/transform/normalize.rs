use url::{ParseError, Url};

/// Base used to resolve path-only inputs such as GA4 page paths.
const PLACEHOLDER_BASE: &str = "http://localhost/";

/// Reduces a URL to the path used as join key between content and traffic.
///
/// Scheme, host, query and fragment are discarded and a single trailing
/// slash is stripped, so `https://Example.com/a/` and `/a` agree. Blank
/// or unparseable input yields `None`.
///
/// The path comes back in `url`'s serialized form: non-ASCII characters are
/// percent-encoded (`/caffè` becomes `/caff%C3%A8`) and dot segments are
/// resolved. Both join sides go through here, so keys still match.
pub fn normalize_url_path(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let url = match Url::parse(raw) {
        Ok(url) => url,
        Err(ParseError::RelativeUrlWithoutBase) => Url::parse(PLACEHOLDER_BASE).ok()?.join(raw).ok()?,
        Err(_) => return None,
    };

    let path = url.path();
    Some(path.strip_suffix('/').unwrap_or(path).to_string())
}
