/// Turns a stored image reference into a URL the client can load. Absolute
/// and data URLs pass through; relative paths are joined onto `base`.
/// Empty references resolve to `None` so callers draw a placeholder.
pub fn resolve_image_url(base: &str, stored: &str) -> Option<String> {
    let stored = stored.trim();
    if stored.is_empty() {
        return None;
    }
    if stored.starts_with("http://") || stored.starts_with("https://") || stored.starts_with("data:") {
        return Some(stored.to_string());
    }
    if base.is_empty() {
        return Some(stored.to_string());
    }
    Some(format!(
        "{}/{}",
        base.trim_end_matches('/'),
        stored.trim_start_matches('/')
    ))
}

/// Inverse of `resolve_image_url` for uploads under our own base URL.
pub fn to_stored_path(base: &str, url: &str) -> String {
    let base = base.trim_end_matches('/');
    if !base.is_empty() {
        if let Some(rest) = url.strip_prefix(base) {
            if rest.is_empty() || rest.starts_with('/') {
                return rest.trim_start_matches('/').to_string();
            }
        }
    }
    url.to_string()
}
