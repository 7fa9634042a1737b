//! Koku HTTP client.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::config::KokuConfig;
use crate::error::ClientError;
use crate::types::{LoginRequest, ServerStatus, TokenResponse, User};

/// Endpoint exchanging credentials for an API token.
pub const TOKEN_PATH: &str = "token-auth/";

/// Endpoint describing the logged in user.
pub const CURRENT_USER_PATH: &str = "users/current/";

/// Endpoint reporting server version information.
pub const STATUS_PATH: &str = "status/";

/// Koku API client.
///
/// Requests are made relative to the API root (`.../api/v1/`). Once
/// [`login`](Self::login) succeeds every request carries the token in an
/// `Authorization: Token <token>` header.
#[derive(Debug, Clone)]
pub struct KokuClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl KokuClient {
    /// Create a client for the API root at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_options(base_url, ClientOptions::default())
    }

    /// Create a client with custom options.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_options(
        base_url: impl Into<String>,
        options: ClientOptions,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .danger_accept_invalid_certs(!options.verify_tls)
            .build()?;

        let base_url = base_url.into();
        if base_url.trim().is_empty() {
            return Err(ClientError::Configuration("base URL is empty".into()));
        }

        Ok(Self {
            client,
            base_url: format!("{}/", base_url.trim_end_matches('/')),
            token: None,
        })
    }

    /// Create an unauthenticated client for the server described by the
    /// `koku` config section.
    ///
    /// # Errors
    ///
    /// Returns an error if the section has no hostname.
    pub fn from_config(config: &KokuConfig) -> Result<Self, ClientError> {
        let options = ClientOptions {
            verify_tls: config.ssl_verify,
            ..ClientOptions::default()
        };
        Self::with_options(config.base_url()?, options)
    }

    /// API root, always ending in `/`.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL of an endpoint. Absolute inputs, such as pagination
    /// links, are returned unchanged.
    #[must_use]
    pub fn url(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            return endpoint.to_string();
        }
        format!("{}{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    /// Current API token.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Whether a token is held.
    #[must_use]
    pub fn logged_in(&self) -> bool {
        self.token.is_some()
    }

    /// Replace the token, returning the previous one.
    pub fn set_token(&mut self, token: Option<String>) -> Option<String> {
        std::mem::replace(&mut self.token, token)
    }

    /// Drop the token. Later requests are unauthenticated.
    pub fn logout(&mut self) {
        if self.token.take().is_some() {
            debug!("Logged out of Koku");
        }
    }

    /// Exchange credentials for a token and keep it for later requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the credentials or sends no
    /// token.
    #[instrument(skip(self, password))]
    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), ClientError> {
        let request = self
            .client
            .post(self.url(TOKEN_PATH))
            .json(&LoginRequest { username, password });

        let response: TokenResponse = Self::decode(self.execute(request).await?).await?;
        let token = response
            .token
            .filter(|t| !t.is_empty())
            .ok_or(ClientError::MissingToken)?;

        info!("Logged in to Koku");
        self.token = Some(token);
        Ok(())
    }

    /// A copy of this client logged in as another user. `self` keeps its
    /// own token.
    ///
    /// # Errors
    ///
    /// Returns an error if the login fails.
    pub async fn login_as(&self, username: &str, password: &str) -> Result<Self, ClientError> {
        let mut client = Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: None,
        };
        client.login(username, password).await?;
        Ok(client)
    }

    /// The logged in user.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn current_user(&self) -> Result<User, ClientError> {
        self.get_json(CURRENT_USER_PATH, &[]).await
    }

    /// Server version information.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn server_status(&self) -> Result<ServerStatus, ClientError> {
        self.get_json(STATUS_PATH, &[]).await
    }

    /// `GET` an endpoint and decode the JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the server answers with an
    /// error status or the body does not decode as `T`.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(String, String)],
    ) -> Result<T, ClientError> {
        let mut request = self.request(Method::GET, endpoint);
        if !query.is_empty() {
            request = request.query(query);
        }
        Self::decode(self.execute(request).await?).await
    }

    /// `POST` a JSON body and decode the JSON response.
    ///
    /// # Errors
    ///
    /// See [`get_json`](Self::get_json).
    pub async fn post_json<B, T>(&self, endpoint: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let request = self.request(Method::POST, endpoint).json(body);
        Self::decode(self.execute(request).await?).await
    }

    /// `PUT` a JSON body and decode the JSON response.
    ///
    /// # Errors
    ///
    /// See [`get_json`](Self::get_json).
    pub async fn put_json<B, T>(&self, endpoint: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let request = self.request(Method::PUT, endpoint).json(body);
        Self::decode(self.execute(request).await?).await
    }

    /// `DELETE` an endpoint, discarding any body.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server answers with an
    /// error status.
    pub async fn delete(&self, endpoint: &str) -> Result<(), ClientError> {
        let request = self.request(Method::DELETE, endpoint);
        self.execute(request).await?;
        Ok(())
    }

    fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        let request = self.client.request(method, self.url(endpoint));
        match &self.token {
            Some(token) => request.header(reqwest::header::AUTHORIZATION, format!("Token {token}")),
            None => request,
        }
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let request = request.build()?;
        let method = request.method().to_string();
        let path = match request.url().query() {
            Some(query) => format!("{}?{query}", request.url().path()),
            None => request.url().path().to_string(),
        };

        debug!(%method, %path, "Sending Koku request");
        let response = self.client.execute(request).await?;
        let status = response.status();

        if status.is_client_error() || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                method,
                path,
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Pretty-print a JSON error body; other bodies are returned as is.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| serde_json::to_string_pretty(&json).ok())
        .unwrap_or_else(|| body.to_string())
}

/// Client options for customization.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Request timeout in seconds (default: 30).
    pub timeout_seconds: u64,
    /// Verify the server's TLS certificate (default: true).
    pub verify_tls: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            verify_tls: true,
        }
    }
}
