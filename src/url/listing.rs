use crate::{UrlError, UrlResult};
use url::Url;

/// Normalizes a state code: trimmed, lower-cased, ASCII letters only
///
/// # Examples
///
/// ```
/// use tradeline::url::normalize_state_code;
///
/// assert_eq!(normalize_state_code(" CA ").unwrap(), "ca");
/// assert!(normalize_state_code("c/a").is_err());
/// ```
pub fn normalize_state_code(state_code: &str) -> UrlResult<String> {
    let code = state_code.trim().to_ascii_lowercase();

    if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(UrlError::InvalidStateCode(state_code.to_string()));
    }

    Ok(code)
}

/// Builds the URL of listing page `page` for a state
///
/// The result has the shape `{base}/{state}?page={n}`. Trailing slashes on
/// the base are tolerated.
///
/// # Examples
///
/// ```
/// use tradeline::url::listing_url;
/// use url::Url;
///
/// let base = Url::parse("https://network.example.com/us/").unwrap();
/// let url = listing_url(&base, "ca", 3).unwrap();
/// assert_eq!(url.as_str(), "https://network.example.com/us/ca?page=3");
/// ```
pub fn listing_url(base: &Url, state_code: &str, page: u32) -> UrlResult<Url> {
    if page == 0 {
        return Err(UrlError::Malformed("listing pages start at 1".to_string()));
    }

    let code = normalize_state_code(state_code)?;

    let mut url = base.clone();
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| UrlError::Malformed(format!("cannot be a base URL: {}", base)))?;
        segments.pop_if_empty().push(&code);
    }
    url.set_query(Some(&format!("page={}", page)));

    Ok(url)
}

/// Resolves a detail-page href against the listing page it was found on
///
/// Returns `None` for hrefs that cannot lead to a detail page: empty values,
/// fragment-only anchors, `javascript:`/`mailto:`/`tel:`/`data:` targets and
/// anything that does not resolve to HTTP(S).
pub fn resolve_link(href: &str, page_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match page_url.join(href) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Some(url),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://network.example.com/us").unwrap()
    }

    #[test]
    fn test_state_code_lowercased() {
        assert_eq!(normalize_state_code("NY").unwrap(), "ny");
        assert_eq!(normalize_state_code("Mi").unwrap(), "mi");
    }

    #[test]
    fn test_state_code_rejects_garbage() {
        assert!(normalize_state_code("").is_err());
        assert!(normalize_state_code("   ").is_err());
        assert!(normalize_state_code("c4").is_err());
        assert!(normalize_state_code("../etc").is_err());
    }

    #[test]
    fn test_listing_url_first_page() {
        let url = listing_url(&base(), "CA", 1).unwrap();
        assert_eq!(url.as_str(), "https://network.example.com/us/ca?page=1");
    }

    #[test]
    fn test_listing_url_trailing_slash_base() {
        let base = Url::parse("https://network.example.com/us/").unwrap();
        let url = listing_url(&base, "tx", 12).unwrap();
        assert_eq!(url.as_str(), "https://network.example.com/us/tx?page=12");
    }

    #[test]
    fn test_listing_url_root_base() {
        let base = Url::parse("http://127.0.0.1:8080").unwrap();
        let url = listing_url(&base, "ca", 2).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/ca?page=2");
    }

    #[test]
    fn test_listing_url_page_zero() {
        assert!(listing_url(&base(), "ca", 0).is_err());
    }

    #[test]
    fn test_resolve_relative_link() {
        let page = listing_url(&base(), "ca", 1).unwrap();
        let url = resolve_link("/p/acme-builders", &page).unwrap();
        assert_eq!(url.as_str(), "https://network.example.com/p/acme-builders");
    }

    #[test]
    fn test_resolve_absolute_link() {
        let page = listing_url(&base(), "ca", 1).unwrap();
        let url = resolve_link("https://other.example.com/p/x", &page).unwrap();
        assert_eq!(url.as_str(), "https://other.example.com/p/x");
    }

    #[test]
    fn test_resolve_skips_special_targets() {
        let page = listing_url(&base(), "ca", 1).unwrap();
        assert!(resolve_link("", &page).is_none());
        assert!(resolve_link("#top", &page).is_none());
        assert!(resolve_link("javascript:void(0)", &page).is_none());
        assert!(resolve_link("mailto:a@b.c", &page).is_none());
        assert!(resolve_link("tel:+15550102000", &page).is_none());
    }
}
