//! OAuth credentials for the Google APIs.
//!
//! The token file uses Google's authorized-user layout, so a token produced by
//! other Google tooling can be reused as-is.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tiny_http::{Response, Server};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::ProviderError;
use crate::pkce;

/// Access to files created or opened by this app only.
pub const DRIVE_FILE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Tokens this close to expiry are refreshed before use.
const EXPIRY_MARGIN_SECS: i64 = 60;

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// Supplies a bearer token for each API call.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> anyhow::Result<String>;
}

/// Fixed token, for tests and for tokens minted elsewhere.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> anyhow::Result<String> {
        Ok(self.0.clone())
    }
}

/// OAuth client of an installed (desktop) app.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

#[derive(Deserialize)]
struct SecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    /// Read a `credentials.json` downloaded from the Google Cloud console.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read client secrets {}", path.display()))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        let file: SecretsFile =
            serde_json::from_str(content).map_err(|e| ProviderError::Secrets(e.to_string()))?;
        file.installed
            .or(file.web)
            .ok_or_else(|| ProviderError::Secrets("expected an 'installed' or 'web' client".into()))
            .map_err(Into::into)
    }

    /// Authorization request carrying `state` and an S256 code challenge.
    pub fn consent_url(
        &self,
        redirect_uri: &str,
        state: &str,
        code_challenge: &str,
    ) -> anyhow::Result<url::Url> {
        let url = url::Url::parse_with_params(
            &self.auth_uri,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("response_type", "code"),
                ("scope", DRIVE_FILE_SCOPE),
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("state", state),
                ("code_challenge", code_challenge),
                ("code_challenge_method", "S256"),
            ],
        )?;
        Ok(url)
    }
}

/// Stored credentials of the authorized user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizedUser {
    #[serde(default)]
    pub token: Option<String>,
    pub refresh_token: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl AuthorizedUser {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Err(ProviderError::NotAuthorized(path.to_path_buf()).into());
        }
        let content = std::fs::read_to_string(path)?;
        let user = serde_json::from_str(&content)
            .with_context(|| format!("Invalid token file {}", path.display()))?;
        Ok(user)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        debug!("Token saved to {}", path.display());
        Ok(())
    }

    /// The cached access token, if it stays valid past the refresh margin.
    #[must_use]
    pub fn fresh_token(&self, now: DateTime<Utc>) -> Option<&str> {
        let token = self.token.as_deref()?;
        let expiry = self.expiry?;
        (expiry - now > Duration::seconds(EXPIRY_MARGIN_SECS)).then_some(token)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

impl TokenResponse {
    fn expiry(&self) -> Option<DateTime<Utc>> {
        self.expires_in.map(|secs| Utc::now() + Duration::seconds(secs))
    }
}

async fn post_token_form(
    client: &Client,
    token_uri: &str,
    form: &[(&str, &str)],
) -> anyhow::Result<TokenResponse> {
    let response = client.post(token_uri).form(form).send().await?;
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(ProviderError::Api {
            status: status.as_u16(),
            message,
        }
        .into());
    }
    Ok(response.json::<TokenResponse>().await?)
}

/// Token file backed [`TokenSource`] that refreshes expired tokens.
pub struct TokenProvider {
    client: Client,
    token_path: PathBuf,
    user: Mutex<AuthorizedUser>,
}

impl TokenProvider {
    pub fn load(client: Client, token_path: PathBuf) -> anyhow::Result<Self> {
        let user = AuthorizedUser::load(&token_path)?;
        info!("Using existing token from {}", token_path.display());
        Ok(Self {
            client,
            token_path,
            user: Mutex::new(user),
        })
    }

    async fn refresh(&self, user: &mut AuthorizedUser) -> anyhow::Result<()> {
        info!("Token expired. Refreshing...");
        let response = post_token_form(
            &self.client,
            &user.token_uri,
            &[
                ("client_id", user.client_id.as_str()),
                ("client_secret", user.client_secret.as_str()),
                ("refresh_token", user.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ],
        )
        .await
        .context("Failed to refresh access token")?;

        user.expiry = response.expiry();
        user.token = Some(response.access_token);
        if let Some(refresh_token) = response.refresh_token {
            user.refresh_token = refresh_token;
        }
        user.save(&self.token_path)?;
        Ok(())
    }
}

#[async_trait]
impl TokenSource for TokenProvider {
    async fn access_token(&self) -> anyhow::Result<String> {
        let mut user = self.user.lock().await;
        if let Some(token) = user.fresh_token(Utc::now()) {
            return Ok(token.to_string());
        }
        self.refresh(&mut user).await?;
        user.token
            .clone()
            .ok_or_else(|| ProviderError::MissingField("access_token").into())
    }
}

/// Loopback authorization: the browser redirects to a local listener that
/// accepts only the redirect carrying this flow's `state`.
pub struct LoginFlow {
    secrets: ClientSecrets,
    server: Arc<Server>,
    redirect_uri: String,
    state: String,
    code_verifier: String,
}

impl LoginFlow {
    pub fn start(secrets: ClientSecrets) -> anyhow::Result<Self> {
        let server = Server::http("127.0.0.1:0")
            .map_err(|e| anyhow::anyhow!("Failed to start redirect listener: {e}"))?;
        let port = server
            .server_addr()
            .to_ip()
            .map(|addr| addr.port())
            .context("Redirect listener has no TCP address")?;
        Ok(Self {
            secrets,
            server: Arc::new(server),
            redirect_uri: format!("http://127.0.0.1:{port}/"),
            state: pkce::state(),
            code_verifier: pkce::code_verifier(),
        })
    }

    pub fn consent_url(&self) -> anyhow::Result<url::Url> {
        self.secrets.consent_url(
            &self.redirect_uri,
            &self.state,
            &pkce::code_challenge(&self.code_verifier),
        )
    }

    /// Wait for the redirect, then trade the code for tokens.
    pub async fn complete(self, client: &Client) -> anyhow::Result<AuthorizedUser> {
        let server = Arc::clone(&self.server);
        let state = self.state.clone();
        let code = tokio::task::spawn_blocking(move || serve_redirect(&server, &state)).await??;
        info!("Authorization code received, exchanging for tokens");

        let response = post_token_form(
            client,
            &self.secrets.token_uri,
            &[
                ("code", code.as_str()),
                ("client_id", self.secrets.client_id.as_str()),
                ("client_secret", self.secrets.client_secret.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("code_verifier", self.code_verifier.as_str()),
                ("grant_type", "authorization_code"),
            ],
        )
        .await
        .context("Failed to exchange authorization code")?;

        let refresh_token = response
            .refresh_token
            .clone()
            .ok_or(ProviderError::MissingField("refresh_token"))?;
        Ok(AuthorizedUser {
            expiry: response.expiry(),
            token: Some(response.access_token),
            refresh_token,
            client_id: self.secrets.client_id,
            client_secret: self.secrets.client_secret,
            token_uri: self.secrets.token_uri,
            scopes: vec![DRIVE_FILE_SCOPE.to_string()],
        })
    }
}

fn serve_redirect(server: &Server, expected_state: &str) -> anyhow::Result<String> {
    loop {
        let request = server.recv()?;
        let outcome = parse_redirect(request.url(), expected_state);
        let (status, body): (u16, &str) = match outcome {
            Redirect::Code(_) => (200, "Authorization complete. You can close this window."),
            Redirect::Denied(_) => (200, "Authorization failed. Check the terminal for details."),
            Redirect::StateMismatch => (400, "This response does not belong to the pending login."),
            Redirect::Unrelated => (404, "Not found"),
        };
        if let Err(e) = request.respond(Response::from_string(body).with_status_code(status)) {
            debug!("Failed to answer redirect request: {e}");
        }

        match outcome {
            Redirect::Code(code) => return Ok(code),
            Redirect::Denied(reason) => {
                return Err(ProviderError::AuthorizationDenied(reason).into());
            }
            Redirect::StateMismatch => warn!("Ignoring redirect with missing or mismatched state"),
            Redirect::Unrelated => debug!("Ignoring unrelated request on the redirect listener"),
        }
    }
}

/// What a request to the redirect listener carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redirect {
    Code(String),
    Denied(String),
    /// `code` or `error` arrived without this flow's `state`
    StateMismatch,
    /// Neither `code` nor `error`, e.g. a favicon fetch
    Unrelated,
}

/// Classify the request target (path and query) of a redirect.
#[must_use]
pub fn parse_redirect(target: &str, expected_state: &str) -> Redirect {
    let Ok(url) = url::Url::parse(&format!("http://127.0.0.1{target}")) else {
        return Redirect::Unrelated;
    };

    let mut code = None;
    let mut error = None;
    let mut state = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            _ => {}
        }
    }

    if code.is_none() && error.is_none() {
        return Redirect::Unrelated;
    }
    if state.as_deref() != Some(expected_state) {
        return Redirect::StateMismatch;
    }
    match (error, code) {
        (Some(reason), _) => Redirect::Denied(reason),
        (None, Some(code)) => Redirect::Code(code),
        (None, None) => Redirect::Unrelated,
    }
}
