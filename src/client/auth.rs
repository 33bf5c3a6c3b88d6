//! application-only oauth for the reddit api
use {
    crate::{
        error::{ExportError, Result},
        getopt,
        models::TokenResponse,
        utils::create_auth_header,
    },
    reqwest::{Client, header::CONTENT_TYPE},
    std::{
        fmt,
        time::{Duration, Instant},
    },
    tokio::sync::RwLock,
    tracing::{debug, instrument},
    url::Url,
};

/// refresh tokens this long before reddit says they expire
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// The three strings reddit needs to hand out an app-only token.
#[derive(Clone)]
pub struct Credentials {
    /// the app's client id
    pub client_id: String,
    /// the app's secret
    pub client_secret: String,
    /// a descriptive user agent
    pub user_agent: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl Credentials {
    /// make a new set of credentials
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            user_agent: user_agent.into(),
        }
    }

    /// read the credentials from the loaded configuration
    pub fn from_config() -> Self {
        Self::new(
            getopt!(reddit.client_id),
            getopt!(reddit.client_secret),
            getopt!(reddit.user_agent),
        )
    }

    /// fail early when a credential is blank
    pub fn ensure_present(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("user_agent", &self.user_agent),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ExportError::Auth(format!(
                "missing reddit credentials: {}",
                missing.join(", ")
            )))
        }
    }
}

/// A bearer token and when to stop using it.
#[derive(Debug, Clone)]
struct AccessToken {
    /// the token
    value: String,
    /// refresh after this instant
    refresh_at: Instant,
}

/// Hands out bearer tokens, fetching a fresh one when the cached one is about to expire.
#[derive(Debug)]
pub(crate) struct TokenStore {
    /// `.../api/v1/access_token`
    token_url: Url,
    /// the app credentials
    credentials: Credentials,
    /// the cached token
    token: RwLock<Option<AccessToken>>,
}

impl TokenStore {
    /// make a store for the given auth base url
    pub(crate) fn new(auth_url: Url, credentials: Credentials) -> Self {
        let mut token_url = auth_url;
        if let Ok(mut segments) = token_url.path_segments_mut() {
            segments.pop_if_empty().extend(["api", "v1", "access_token"]);
        }

        Self {
            token_url,
            credentials,
            token: RwLock::new(None),
        }
    }

    /// a valid bearer token, fetching one if needed
    pub(crate) async fn bearer(&self, client: &Client) -> Result<String> {
        if let Some(token) = self.token.read().await.as_ref()
            && Instant::now() < token.refresh_at
        {
            return Ok(token.value.clone());
        }

        let mut guard = self.token.write().await;
        if let Some(token) = guard.as_ref()
            && Instant::now() < token.refresh_at
        {
            return Ok(token.value.clone());
        }

        let fresh = self.request(client).await?;
        let value = fresh.value.clone();
        *guard = Some(fresh);

        Ok(value)
    }

    /// forget the cached token so the next request fetches a new one
    pub(crate) async fn invalidate(&self) {
        *self.token.write().await = None;
    }

    /// ask reddit for a token
    #[instrument(skip_all, fields(url = %self.token_url))]
    async fn request(&self, client: &Client) -> Result<AccessToken> {
        let headers =
            create_auth_header(&self.credentials.client_id, &self.credentials.client_secret)?;
        let response = client
            .post(self.token_url.clone())
            .headers(headers)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body("grant_type=client_credentials")
            .send()
            .await
            .map_err(|e| ExportError::Auth(format!("token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExportError::Auth(format!(
                "reddit refused the credentials (http {})",
                status
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| ExportError::Auth(format!("unreadable token response: {}", e)))?;

        if let Some(error) = body.error {
            return Err(ExportError::Auth(format!("reddit refused the credentials: {}", error)));
        }

        let value = body
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ExportError::Auth("token response had no access_token".to_string()))?;
        let lifetime = Duration::from_secs(body.expires_in.unwrap_or(3600));

        debug!(?lifetime, "got access token");

        Ok(AccessToken {
            value,
            refresh_at: Instant::now() + lifetime.saturating_sub(EXPIRY_MARGIN),
        })
    }
}
