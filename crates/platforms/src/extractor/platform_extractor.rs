use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response};
use tracing::debug;

use super::error::ExtractorError;

pub(crate) const DEFAULT_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/142.0.0.0 Safari/537.36";

/// Base extractor shared by platform clients.
///
/// Holds the HTTP client together with the headers every request to the
/// platform must carry.
#[derive(Debug, Clone)]
pub struct Extractor {
    // name of the platform, e.g., "CeskaTelevize"
    platform_name: String,
    client: Client,
    platform_headers: HeaderMap,
}

impl Extractor {
    pub fn new<S: Into<String>>(platform_name: S, client: Client) -> Self {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            reqwest::header::USER_AGENT,
            HeaderValue::from_static(DEFAULT_UA),
        );
        default_headers.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        default_headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("cs-CZ,cs;q=0.9,en;q=0.5"),
        );

        Self {
            platform_name: platform_name.into(),
            client,
            platform_headers: default_headers,
        }
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.request(Method::GET, url)
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.request(Method::POST, url)
    }

    /// Create an HTTP request carrying the platform headers.
    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .headers(self.platform_headers.clone())
    }

    /// Sends a request and rejects non-success statuses.
    pub async fn send_checked(&self, request: RequestBuilder) -> Result<Response, ExtractorError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let url = response.url().to_string();
            debug!(platform = %self.platform_name, %url, %status, "Request rejected");
            return Err(ExtractorError::http_status(status, url));
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_headers_apply_to_requests() {
        let extractor = Extractor::new("Test", Client::new());
        let request = extractor
            .post("http://example.cz/client-playlist/?key=abc")
            .header("x-addr", "127.0.0.1")
            .build()
            .unwrap();

        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.headers().get("x-addr").unwrap(), "127.0.0.1");
        assert_eq!(
            request.headers().get(reqwest::header::USER_AGENT).unwrap(),
            DEFAULT_UA
        );
        assert_eq!(
            request.url().as_str(),
            "http://example.cz/client-playlist/?key=abc"
        );
    }
}
