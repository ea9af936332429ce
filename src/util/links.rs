use thiserror::Error;
use url::Url;

/// Errors raised while vetting a provider base URL or a URL to open.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// Plain HTTP would leak the API key, so it is only tolerated for loopback test servers.
    #[error("Insecure base URL: HTTPS required (except localhost for testing)")]
    InsecureBaseUrl,
}

fn is_loopback(url: &Url) -> bool {
    matches!(url.host_str(), Some("localhost") | Some("127.0.0.1") | Some("[::1]"))
}

/// Validates a metadata provider base URL.
///
/// The trailing slash is trimmed so callers can append `/path` segments.
///
/// ```
/// use marquee::util::validate_base_url;
///
/// assert!(validate_base_url("https://api.themoviedb.org/3").is_ok());
/// assert!(validate_base_url("http://127.0.0.1:8080").is_ok());
/// assert!(validate_base_url("http://tmdb-proxy.example.com").is_err());
/// ```
pub fn validate_base_url(base: &str) -> Result<String, UrlValidationError> {
    let url = Url::parse(base)?;
    match url.scheme() {
        "https" => {}
        "http" if is_loopback(&url) => {
            tracing::warn!(base_url = %base, "Using non-HTTPS provider base URL (localhost only)");
        }
        "http" => return Err(UrlValidationError::InsecureBaseUrl),
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }
    Ok(base.trim_end_matches('/').to_string())
}

/// Validates a URL before handing it to the system browser.
///
/// Only `http`/`https` URLs are opened; anything else could launch an
/// arbitrary handler on the user's machine.
pub fn validate_url_for_open(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_https_base_accepted_and_trimmed() {
        let base = validate_base_url("https://api.themoviedb.org/3/").unwrap();
        assert_eq!(base, "https://api.themoviedb.org/3");
    }

    #[test]
    fn test_http_base_only_for_loopback() {
        assert!(validate_base_url("http://localhost:9000").is_ok());
        assert!(validate_base_url("http://127.0.0.1:9000/").is_ok());
        assert!(matches!(
            validate_base_url("http://evil.example.com"),
            Err(UrlValidationError::InsecureBaseUrl)
        ));
    }

    #[test]
    fn test_base_rejects_other_schemes() {
        assert!(matches!(
            validate_base_url("ftp://api.example.com"),
            Err(UrlValidationError::UnsupportedScheme(_))
        ));
        assert!(validate_base_url("not a url").is_err());
    }

    #[test]
    fn test_open_rejects_non_web_schemes() {
        assert!(validate_url_for_open("https://www.youtube.com/watch?v=abc").is_ok());
        assert!(validate_url_for_open("file:///etc/passwd").is_err());
        assert!(validate_url_for_open("javascript:alert(1)").is_err());
    }
}
