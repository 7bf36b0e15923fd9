use std::time::Duration;

use hls::ParseMode;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue};

use crate::LiveError;
use crate::stream::DEFAULT_HISTORY_CAPACITY;

/// Poll interval when nothing else suggests one.
pub const DEFAULT_FALLBACK_INTERVAL: Duration = Duration::from_secs(2);

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/142.0.0.0 Safari/537.36";

/// Options for the HTTP client shared by manifest and segment requests.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Overall timeout for one request; zero disables it.
    pub timeout: Duration,

    /// Time allowed to establish a connection; zero disables it.
    pub connect_timeout: Duration,

    /// Whether to follow redirects
    pub follow_redirects: bool,

    pub user_agent: String,

    /// Headers sent with every request
    pub headers: HeaderMap,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            follow_redirects: true,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            headers: HttpConfig::get_default_headers(),
        }
    }
}

impl HttpConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Adds a header on top of the defaults, replacing a header of the same name.
    pub fn with_header(mut self, name: reqwest::header::HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn get_default_headers() -> HeaderMap {
        let mut default_headers = HeaderMap::new();

        default_headers.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static("*/*"),
        );

        default_headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("cs-CZ,cs;q=0.9,en;q=0.5"),
        );

        default_headers.insert(
            reqwest::header::CONNECTION,
            HeaderValue::from_static("keep-alive"),
        );
        default_headers
    }
}

/// Create a reqwest Client with the provided configuration
pub fn create_client(config: &HttpConfig) -> Result<Client, LiveError> {
    let mut client_builder = Client::builder()
        .user_agent(&config.user_agent)
        .default_headers(config.headers.clone())
        .redirect(if config.follow_redirects {
            reqwest::redirect::Policy::limited(10)
        } else {
            reqwest::redirect::Policy::none()
        });

    if !config.timeout.is_zero() {
        client_builder = client_builder.timeout(config.timeout);
    }

    if !config.connect_timeout.is_zero() {
        client_builder = client_builder.connect_timeout(config.connect_timeout);
    }

    client_builder.build().map_err(LiveError::from)
}

/// Tuning of the polling loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FollowerConfig {
    /// How manifests with unknown directives are treated.
    pub parse_mode: ParseMode,

    /// Poll interval used when neither a delivered segment nor the manifest suggests one.
    pub fallback_interval: Duration,

    /// Number of delivered segments remembered for boundary detection.
    pub history_capacity: usize,
}

impl Default for FollowerConfig {
    fn default() -> Self {
        Self {
            parse_mode: ParseMode::Lenient,
            fallback_interval: DEFAULT_FALLBACK_INTERVAL,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl FollowerConfig {
    pub fn with_parse_mode(mut self, parse_mode: ParseMode) -> Self {
        self.parse_mode = parse_mode;
        self
    }

    pub fn with_fallback_interval(mut self, fallback_interval: Duration) -> Self {
        self.fallback_interval = fallback_interval;
        self
    }

    pub fn with_history_capacity(mut self, history_capacity: usize) -> Self {
        self.history_capacity = history_capacity;
        self
    }
}
