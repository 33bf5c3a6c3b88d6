//! reddit api stuff
use {
    crate::{
        error::{ExportError, Result},
        getopt,
        models::{Comment, ListingPage, Post},
    },
    async_trait::async_trait,
    reqwest::{Client, StatusCode},
    serde::de::DeserializeOwned,
    std::{sync::Arc, time::Duration},
    tracing::{debug, info, instrument, warn},
    url::Url,
};

pub mod auth;
pub mod comments;
pub mod listing;

pub use auth::Credentials;

/// The forum operations the exporter needs.
#[async_trait]
pub trait ForumSource: Send + Sync {
    /// one page of the forum's newest-first listing
    async fn newest_page(&self, forum: &str, after: Option<&str>, count: usize) -> Result<ListingPage>;

    /// every real comment on a post, with all collapsed branches expanded
    async fn expand_comments(&self, post: &Post) -> Result<Vec<Comment>>;
}

/// Connection and retry settings for [`RedditClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// base url for token requests
    pub auth_url: String,
    /// base url for api requests
    pub api_url: String,
    /// request timeout
    pub timeout: Duration,
    /// connect timeout
    pub connect_timeout: Duration,
    /// idle connections kept per host
    pub pool_max_idle_per_host: usize,
    /// how long idle connections are kept
    pub pool_idle_timeout: Duration,
    /// retries for transient failures
    pub max_retries: u32,
    /// base delay between retries
    pub retry_base: Duration,
    /// collapsed comment ids per `morechildren` request
    pub more_batch_size: usize,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            auth_url: "https://www.reddit.com".to_string(),
            api_url: "https://oauth.reddit.com".to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_max_idle_per_host: 8,
            pool_idle_timeout: Duration::from_secs(90),
            max_retries: 3,
            retry_base: Duration::from_millis(200),
            more_batch_size: 100,
        }
    }
}

impl ClientOptions {
    /// read the options from the loaded configuration
    pub fn from_config() -> Self {
        Self {
            auth_url: getopt!(reddit.auth_url),
            api_url: getopt!(reddit.api_url),
            timeout: Duration::from_secs(getopt!(http.timeout)),
            connect_timeout: Duration::from_secs(getopt!(http.connect_timeout)),
            pool_max_idle_per_host: getopt!(http.pool_max_idle_per_host),
            pool_idle_timeout: Duration::from_secs(getopt!(http.pool_idle_timeout)),
            max_retries: getopt!(http.max_retries),
            retry_base: Duration::from_millis(getopt!(http.retry_base_ms)),
            more_batch_size: getopt!(fetch.more_batch_size),
        }
    }
}

/// delay before retry number `attempt` (1-based), doubling up to 16x the base
fn backoff(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(1 << (attempt.clamp(1, 5) - 1))
}

/// the client
#[derive(Clone, Debug)]
pub struct RedditClient {
    /// the http client
    pub client: Client,
    /// the base url for api requests
    pub api_url: Url,
    /// bearer token cache
    tokens: Arc<auth::TokenStore>,
    /// connection and retry settings
    options: ClientOptions,
}

impl RedditClient {
    /// build a client and authenticate right away, so bad credentials fail before any fetch
    ///
    /// # Errors
    ///
    /// returns [`ExportError::Auth`] if the credentials are missing or rejected
    #[instrument(skip_all, fields(api = %options.api_url))]
    pub async fn connect(credentials: Credentials, options: ClientOptions) -> Result<Self> {
        credentials.ensure_present()?;

        let client = Self::build_http_client(&credentials.user_agent, &options)?;
        let api_url = Url::parse(&options.api_url)?;
        let tokens = Arc::new(auth::TokenStore::new(
            Url::parse(&options.auth_url)?,
            credentials,
        ));

        tokens.bearer(&client).await?;
        info!(
            "authenticated with reddit ({} idle connections per host)",
            options.pool_max_idle_per_host
        );

        Ok(Self {
            client,
            api_url,
            tokens,
            options,
        })
    }

    /// build an http client based on the given options
    fn build_http_client(user_agent: &str, options: &ClientOptions) -> Result<Client> {
        Client::builder()
            .user_agent(user_agent)
            .timeout(options.timeout)
            .connect_timeout(options.connect_timeout)
            .pool_max_idle_per_host(options.pool_max_idle_per_host)
            .pool_idle_timeout(options.pool_idle_timeout)
            .build()
            .map_err(ExportError::from)
    }

    /// the configured options
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// an api url made of the base url plus path segments
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| ExportError::Other(format!("{} can't be a base url", self.api_url)))?
            .pop_if_empty()
            .extend(segments);

        url.query_pairs_mut().append_pair("raw_json", "1");
        Ok(url)
    }

    /// run an operation, retrying transient failures up to `max_retries` times
    pub async fn execute_with_retry<T, F, Fut>(&self, op: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let max_retries = self.options.max_retries;
        let mut attempts = 0;

        loop {
            match op().await {
                Ok(res) => return Ok(res),
                Err(e) if e.is_transient() && attempts < max_retries => {
                    attempts += 1;
                    let delay = backoff(self.options.retry_base, attempts);
                    debug!(attempts, ?delay, error = %e, "retrying after transient failure");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// one authenticated GET, decoded as json
    async fn get_json_once<T: DeserializeOwned>(&self, url: &Url) -> Result<T> {
        let token = self.tokens.bearer(&self.client).await?;
        let response = self
            .client
            .get(url.clone())
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            self.tokens.invalidate().await;
        }

        if !status.is_success() {
            warn!(%status, %url, "api returned error status");
            return Err(ExportError::Status {
                status,
                url: url.to_string(),
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// an authenticated GET with retries; anything but an auth failure becomes a fetch failure
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!(%url, "GET");

        let result = match self.execute_with_retry(|| self.get_json_once(&url)).await {
            Err(ExportError::Status { status, .. }) if status == StatusCode::UNAUTHORIZED => {
                debug!(%url, "token rejected, retrying once with a fresh one");
                self.execute_with_retry(|| self.get_json_once(&url)).await
            }
            other => other,
        };

        result.map_err(|e| match e {
                ExportError::Auth(_) => e,
                other => ExportError::Fetch(format!("{}: {}", url.path(), other)),
            })
    }
}

#[async_trait]
impl ForumSource for RedditClient {
    async fn newest_page(&self, forum: &str, after: Option<&str>, count: usize) -> Result<ListingPage> {
        self.fetch_newest(forum, after, count).await
    }

    async fn expand_comments(&self, post: &Post) -> Result<Vec<Comment>> {
        self.fetch_comments(&post.id).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use {
        super::*,
        wiremock::{
            Mock, MockServer, ResponseTemplate,
            matchers::{header, method, path},
        },
    };

    /// a mock server that hands out tokens, plus options pointing at it
    pub(crate) async fn mock_reddit() -> (MockServer, ClientOptions) {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/access_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "tok",
                "token_type": "bearer",
                "expires_in": 86400,
                "scope": "*"
            })))
            .mount(&server)
            .await;

        let options = ClientOptions {
            auth_url: server.uri(),
            api_url: server.uri(),
            max_retries: 2,
            retry_base: Duration::from_millis(1),
            ..ClientOptions::default()
        };

        (server, options)
    }

    pub(crate) fn credentials() -> Credentials {
        Credentials::new("id", "secret", "rust:subexport-tests:v0.1.0 (by /u/tester)")
    }

    #[tokio::test]
    async fn test_connect_fails_on_rejected_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/access_token"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let options = ClientOptions {
            auth_url: server.uri(),
            api_url: server.uri(),
            ..ClientOptions::default()
        };

        let err = RedditClient::connect(credentials(), options).await.unwrap_err();
        assert!(matches!(err, ExportError::Auth(_)));
    }

    #[tokio::test]
    async fn test_connect_rejects_blank_credentials() {
        let err = RedditClient::connect(Credentials::new("", "", "ua"), ClientOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ExportError::Auth(_)));
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let (server, options) = mock_reddit().await;

        Mock::given(method("GET"))
            .and(path("/r/rust/new"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/r/rust/new"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "kind": "Listing",
                "data": { "after": null, "children": [] }
            })))
            .mount(&server)
            .await;

        let client = RedditClient::connect(credentials(), options).await.unwrap();
        let page = client.newest_page("rust", None, 10).await.unwrap();

        assert!(page.posts.is_empty());
        assert!(page.after.is_none());
    }

    #[tokio::test]
    async fn test_permanent_errors_become_fetch_failures() {
        let (server, options) = mock_reddit().await;

        Mock::given(method("GET"))
            .and(path("/r/gone/new"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let client = RedditClient::connect(credentials(), options).await.unwrap();
        let err = client.newest_page("gone", None, 10).await.unwrap_err();

        assert!(matches!(err, ExportError::Fetch(msg) if msg.contains("/r/gone/new")));
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let (server, options) = mock_reddit().await;

        Mock::given(method("GET"))
            .and(path("/r/flaky/new"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let client = RedditClient::connect(credentials(), options).await.unwrap();
        assert!(client.newest_page("flaky", None, 10).await.is_err());
    }

    #[test]
    fn test_backoff_doubles_and_saturates() {
        let base = Duration::from_millis(100);

        assert_eq!(backoff(base, 1), Duration::from_millis(100));
        assert_eq!(backoff(base, 3), Duration::from_millis(400));
        assert_eq!(backoff(base, 10), Duration::from_millis(1600));
        assert_eq!(backoff(Duration::MAX, 4), Duration::MAX);
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/access_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "tok",
                "token_type": "bearer",
                "expires_in": 86400
            })))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/r/rust/new"))
            .respond_with(ResponseTemplate::new(401))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/r/rust/new"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "kind": "Listing",
                "data": { "after": null, "children": [] }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let options = ClientOptions {
            auth_url: server.uri(),
            api_url: server.uri(),
            retry_base: Duration::from_millis(1),
            ..ClientOptions::default()
        };
        let client = RedditClient::connect(credentials(), options).await.unwrap();

        assert!(client.newest_page("rust", None, 10).await.is_ok());
    }

    #[tokio::test]
    async fn test_repeated_401_is_a_fetch_failure() {
        let (server, options) = mock_reddit().await;
        Mock::given(method("GET"))
            .and(path("/r/locked/new"))
            .respond_with(ResponseTemplate::new(401))
            .expect(2)
            .mount(&server)
            .await;

        let client = RedditClient::connect(credentials(), options).await.unwrap();
        let err = client.newest_page("locked", None, 10).await.unwrap_err();

        assert!(matches!(err, ExportError::Fetch(msg) if msg.contains("401")));
    }
}
