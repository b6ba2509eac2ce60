//! Remote configuration documents fetched over HTTP(S).

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use url::Url;

use crate::domain::AppError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Basic auth credentials given as `user:password`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    user: String,
    password: Option<String>,
}

impl Credentials {
    pub fn parse(auth: &str) -> Self {
        match auth.split_once(':') {
            Some((user, password)) => {
                Self { user: user.to_string(), password: Some(password.to_string()) }
            }
            None => Self { user: auth.to_string(), password: None },
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// HTTP transport for configuration documents and the hosted index page.
#[derive(Debug, Clone)]
pub struct HttpConfigSource {
    client: Client,
}

impl HttpConfigSource {
    pub fn new() -> Result<Self, AppError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build().map_err(|err| {
            AppError::http("client", format!("failed to create HTTP client: {}", err))
        })?;
        Ok(Self { client })
    }

    /// GET `url` and return the body. Status >= 400 fails with `ConfigUnreachable`.
    pub async fn fetch_text(
        &self,
        url: &Url,
        credentials: Option<&Credentials>,
    ) -> Result<String, AppError> {
        let mut request = self.client.get(url.clone());
        if let Some(credentials) = credentials {
            request = request.basic_auth(&credentials.user, credentials.password.as_ref());
        }

        let response = request.send().await.map_err(|err| AppError::http(url.as_str(), err))?;
        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(AppError::ConfigUnreachable {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        response.text().await.map_err(|err| AppError::http(url.as_str(), err))
    }

    /// GET `url` and parse the body as JSON.
    pub async fn fetch_json(
        &self,
        url: &Url,
        credentials: Option<&Credentials>,
    ) -> Result<Value, AppError> {
        let body = self.fetch_text(url, credentials).await?;
        serde_json::from_str(&body).map_err(|err| AppError::config_parse(url.as_str(), err))
    }
}
