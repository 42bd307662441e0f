//! Poster URL construction and best-effort image fetching.
//!
//! Poster paths come from the catalog as path fragments; fetch failures
//! of any sort degrade to the placeholder image and never fail a page.

use std::time::Duration;

use tracing::debug;

pub const DEFAULT_IMAGE_BASE: &str = "https://image.tmdb.org/t/p/w500";

pub const PLACEHOLDER_URL: &str =
    "https://upload.wikimedia.org/wikipedia/commons/1/14/No_Image_Available.jpg";

pub const FETCH_TIMEOUT: Duration = Duration::from_secs(4);

/// Build the full poster URL for a stored path fragment. Absent or
/// garbage fragments resolve to the placeholder.
pub fn poster_url(base: &str, path: Option<&str>) -> String {
    let Some(raw) = path else {
        return PLACEHOLDER_URL.to_string();
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") || trimmed.eq_ignore_ascii_case("nan")
    {
        return PLACEHOLDER_URL.to_string();
    }
    if trimmed.starts_with('/') {
        format!("{base}{trimmed}")
    } else {
        format!("{base}/{trimmed}")
    }
}

/// Fetched image bytes plus their content type.
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Fetch an image with a short timeout. Any failure (network error,
/// timeout, non-success status) yields `None`; the caller substitutes
/// the placeholder.
pub async fn fetch_image(client: &reqwest::Client, url: &str) -> Option<FetchedImage> {
    let resp = match client.get(url).timeout(FETCH_TIMEOUT).send().await {
        Ok(resp) => resp,
        Err(e) => {
            debug!(url = %url, error = %e, "poster fetch failed");
            return None;
        }
    };

    if !resp.status().is_success() {
        debug!(url = %url, status = %resp.status(), "poster fetch returned non-success");
        return None;
    }

    let content_type = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("image/jpeg")
        .to_string();

    match resp.bytes().await {
        Ok(bytes) => Some(FetchedImage {
            bytes: bytes.to_vec(),
            content_type,
        }),
        Err(e) => {
            debug!(url = %url, error = %e, "poster body read failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_url_and_normalizes_leading_slash() {
        assert_eq!(
            poster_url(DEFAULT_IMAGE_BASE, Some("/abc.jpg")),
            "https://image.tmdb.org/t/p/w500/abc.jpg"
        );
        assert_eq!(
            poster_url(DEFAULT_IMAGE_BASE, Some("abc.jpg")),
            "https://image.tmdb.org/t/p/w500/abc.jpg"
        );
    }

    #[test]
    fn garbage_paths_fall_back_to_placeholder() {
        assert_eq!(poster_url(DEFAULT_IMAGE_BASE, None), PLACEHOLDER_URL);
        assert_eq!(poster_url(DEFAULT_IMAGE_BASE, Some("")), PLACEHOLDER_URL);
        assert_eq!(poster_url(DEFAULT_IMAGE_BASE, Some("   ")), PLACEHOLDER_URL);
        assert_eq!(poster_url(DEFAULT_IMAGE_BASE, Some("None")), PLACEHOLDER_URL);
        assert_eq!(poster_url(DEFAULT_IMAGE_BASE, Some("nan")), PLACEHOLDER_URL);
    }

    #[tokio::test]
    async fn fetch_against_unreachable_host_yields_none() {
        let client = reqwest::Client::new();
        // Nothing listens on the discard port.
        let fetched = fetch_image(&client, "http://127.0.0.1:9/poster.jpg").await;
        assert!(fetched.is_none());
    }
}
