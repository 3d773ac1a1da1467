//! Generic OAuth2 client collaborator: the capability trait, PKCE support,
//! and the default `reqwest`-backed implementation.

use crate::error::{OAuth2Error, OAuth2Result};
use crate::types::{AuthorizationRequest, FetchedResponse, TokenRequest, TokenResponse};
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error};
use url::Url;

/// PKCE code challenge and verifier
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    pub code_verifier: String,
    pub code_challenge: String,
    pub code_challenge_method: String,
}

impl PkceChallenge {
    /// Generate a new S256 challenge from 64 random bytes.
    pub fn new() -> Self {
        let mut bytes = [0u8; 64];
        rand::thread_rng().fill_bytes(&mut bytes);
        let code_verifier = URL_SAFE_NO_PAD.encode(bytes);
        let code_challenge = Self::challenge_for(&code_verifier);

        Self {
            code_verifier,
            code_challenge,
            code_challenge_method: "S256".to_string(),
        }
    }

    fn challenge_for(verifier: &str) -> String {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        hasher.update(verifier.as_bytes());
        URL_SAFE_NO_PAD.encode(hasher.finalize())
    }
}

impl Default for PkceChallenge {
    fn default() -> Self {
        Self::new()
    }
}

/// The generic OAuth2 capability the strategy is layered over.
#[async_trait]
pub trait OAuth2Client: Send + Sync {
    /// Build the authorization redirect URL, merging the strategy's
    /// provider-specific parameters.
    fn build_redirect_url(&self, request: &AuthorizationRequest) -> OAuth2Result<Url>;

    /// Exchange an authorization code for tokens.
    async fn exchange_code(&self, request: &TokenRequest) -> OAuth2Result<TokenResponse>;

    /// Bearer-authenticated GET. Returns the body and status without
    /// interpreting non-success statuses.
    async fn authenticated_get(
        &self,
        url: &str,
        access_token: &str,
    ) -> OAuth2Result<FetchedResponse>;
}

/// `reqwest`-backed implementation of [`OAuth2Client`].
#[derive(Debug, Clone)]
pub struct HttpOAuth2Client {
    http: Client,
}

impl HttpOAuth2Client {
    pub fn new(timeout_seconds: u64) -> OAuth2Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl OAuth2Client for HttpOAuth2Client {
    fn build_redirect_url(&self, request: &AuthorizationRequest) -> OAuth2Result<Url> {
        let mut url = Url::parse(&request.endpoint)?;

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("response_type", "code");
            pairs.append_pair("client_id", &request.client_id);

            if let Some(redirect_uri) = &request.redirect_uri {
                pairs.append_pair("redirect_uri", redirect_uri);
            }
            if !request.scope.is_empty() {
                pairs.append_pair("scope", &request.scope);
            }
            if let Some(state) = &request.state {
                pairs.append_pair("state", state);
            }
            if let Some(challenge) = &request.code_challenge {
                pairs.append_pair("code_challenge", challenge);
                if let Some(method) = &request.code_challenge_method {
                    pairs.append_pair("code_challenge_method", method);
                }
            }
            for (key, value) in &request.params {
                pairs.append_pair(key, value);
            }
        }

        debug!("built authorization redirect for client {}", request.client_id);
        Ok(url)
    }

    async fn exchange_code(&self, request: &TokenRequest) -> OAuth2Result<TokenResponse> {
        let mut form: Vec<(&str, String)> = vec![
            ("grant_type", "authorization_code".to_string()),
            ("code", request.code.clone()),
            ("client_id", request.client_id.clone()),
        ];

        if let Some(secret) = &request.client_secret {
            form.push(("client_secret", secret.clone()));
        }
        if let Some(redirect_uri) = &request.redirect_uri {
            form.push(("redirect_uri", redirect_uri.clone()));
        }
        if let Some(verifier) = &request.code_verifier {
            form.push(("code_verifier", verifier.clone()));
        }
        for (key, value) in &request.params {
            form.push((key.as_str(), value.clone()));
        }

        let response = self
            .http
            .post(&request.endpoint)
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("token exchange failed: {}", body);
            return Err(OAuth2Error::TokenExchange {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| OAuth2Error::InvalidTokenResponse(e.to_string()))
    }

    async fn authenticated_get(
        &self,
        url: &str,
        access_token: &str,
    ) -> OAuth2Result<FetchedResponse> {
        let response = self.http.get(url).bearer_auth(access_token).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(FetchedResponse { status, body })
    }
}
