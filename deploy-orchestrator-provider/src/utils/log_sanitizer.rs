//! Keeps response bodies and secrets out of logs in full.
//!
//! Upload responses can echo whole file manifests and deploy proxies sometimes echo
//! credentials back, so both are clipped before they reach `log`.

/// Byte budget for a logged response body.
const BODY_LOG_LIMIT: usize = 256;

/// Number of leading characters of a secret that remain visible.
const SECRET_VISIBLE_PREFIX: usize = 4;

/// Largest char boundary not past `index`.
fn char_boundary_at_or_before(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    (0..=index).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0)
}

/// Clip a response body for logging, noting the original size when clipped.
pub fn truncate_for_log(s: &str) -> String {
    if s.len() <= BODY_LOG_LIMIT {
        return s.to_string();
    }
    let end = char_boundary_at_or_before(s, BODY_LOG_LIMIT);
    format!("{}... [truncated, total {} bytes]", &s[..end], s.len())
}

/// Render a token or key as its first few characters followed by `***`.
pub fn mask_secret(secret: &str) -> String {
    if secret.chars().count() <= SECRET_VISIBLE_PREFIX * 2 {
        return "***".to_string();
    }
    let prefix: String = secret.chars().take(SECRET_VISIBLE_PREFIX).collect();
    format!("{prefix}***")
}
