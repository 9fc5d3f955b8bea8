//! Authenticated session and the providers that supply it.
//!
//! Stages never look up auth state on their own. The run asks the provider
//! once and passes the [`Session`] down explicitly.

use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::AuthError;
use crate::sanitize::truncate_error_body;

/// The signed-in tailor. Its id scopes every row the pipeline writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Bearer credential plus the actor it belongs to.
#[derive(Debug)]
pub struct Session {
    pub access_token: SecretString,
    pub user: Actor,
}

impl Session {
    pub fn new(access_token: impl Into<String>, user: Actor) -> Self {
        Self {
            access_token: SecretString::from(access_token.into()),
            user,
        }
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token.expose_secret())
    }
}

impl Clone for Session {
    fn clone(&self) -> Self {
        Self {
            access_token: SecretString::from(self.access_token.expose_secret().to_string()),
            user: self.user.clone(),
        }
    }
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// The current session, if signed in.
    async fn session(&self) -> Option<Session>;

    /// The current actor, if signed in.
    async fn user(&self) -> Option<Actor> {
        self.session().await.map(|s| s.user)
    }
}

/// A fixed session, or none.
#[derive(Debug, Clone, Default)]
pub struct StaticAuth {
    session: Option<Session>,
}

impl StaticAuth {
    pub fn signed_in(session: Session) -> Self {
        Self {
            session: Some(session),
        }
    }

    pub fn signed_out() -> Self {
        Self { session: None }
    }
}

#[async_trait]
impl AuthProvider for StaticAuth {
    async fn session(&self) -> Option<Session> {
        self.session.clone()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: Actor,
}

/// Password sign-in against the hosted backend's auth API.
pub struct SupabaseAuth {
    client: Client,
    base_url: String,
    anon_key: SecretString,
    session: RwLock<Option<Session>>,
}

impl SupabaseAuth {
    pub fn new(client: Client, base_url: &str, anon_key: SecretString) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
            session: RwLock::new(None),
        }
    }

    fn token_url(&self) -> Result<reqwest::Url, AuthError> {
        let raw = format!("{}/auth/v1/token", self.base_url);
        let mut url = reqwest::Url::parse(&raw).map_err(|e| AuthError::InvalidEndpoint {
            url: raw.clone(),
            reason: e.to_string(),
        })?;
        url.query_pairs_mut().append_pair("grant_type", "password");
        Ok(url)
    }

    /// Signs in and keeps the session for later [`AuthProvider::session`]
    /// calls.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Session, AuthError> {
        let url = self.token_url()?;
        debug!("Signing in {} at {}", email, self.base_url);

        let response = self
            .client
            .post(url)
            .header("apikey", self.anon_key.expose_secret())
            .json(&serde_json::json!({
                "email": email,
                "password": password.expose_secret(),
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Rejected {
                status,
                body: truncate_error_body(&body),
            });
        }

        let body = response.text().await?;
        let token = parse_token_response(&body)?;
        let session = Session::new(token.access_token, token.user);

        info!("Signed in as {}", session.user.id);
        *self.session.write().await = Some(session.clone());
        Ok(session)
    }

    pub async fn sign_out(&self) {
        *self.session.write().await = None;
    }
}

#[async_trait]
impl AuthProvider for SupabaseAuth {
    async fn session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }
}

fn parse_token_response(body: &str) -> Result<TokenResponse, AuthError> {
    serde_json::from_str(body).map_err(|e| AuthError::Decode(e.to_string()))
}
