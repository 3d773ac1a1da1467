//! The VK ID profile strategy: normalized configuration plus the
//! provider-specific hooks layered over a generic OAuth2 client.

use crate::client::{HttpOAuth2Client, OAuth2Client, PkceChallenge};
use crate::config::{LangId, StrategyConfig, StrategyOptions};
use crate::error::{OAuth2Error, OAuth2Result};
use crate::profile::parse_profile;
use crate::types::{
    AuthorizationRequest, AuthorizeOverrides, AuthorizeTransaction, CallbackContext,
    TokenRequest, TokenResponse,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;
use vkid_identity_core::{CallbackRequest, CanonicalProfile, Verifier};

const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 30;

/// Outcome of [`VkIdStrategy::authenticate`].
#[derive(Debug)]
pub enum AuthOutcome {
    /// No authorization code yet: send the user agent to `url` and hold on
    /// to the transaction until the callback arrives.
    Redirect {
        url: Url,
        transaction: AuthorizeTransaction,
    },
    /// The verify callback accepted the profile and produced a user record.
    Authenticated {
        user: serde_json::Value,
        profile: CanonicalProfile,
    },
    /// The verify callback declined without raising an error.
    Unauthorized,
}

/// Per-request options for [`VkIdStrategy::authenticate`].
#[derive(Debug, Clone, Default)]
pub struct AuthenticateOptions {
    pub overrides: AuthorizeOverrides,
    /// Correlation data returned by the redirect phase of this request's
    /// flow, passed back by the host at callback time.
    pub transaction: Option<AuthorizeTransaction>,
}

pub struct VkIdStrategy {
    config: StrategyConfig,
    client: Arc<dyn OAuth2Client>,
    verifier: Verifier,
}

impl VkIdStrategy {
    /// Build a strategy with the default HTTP-backed OAuth2 client.
    pub fn new(options: StrategyOptions, verifier: Verifier) -> OAuth2Result<Self> {
        let client = Arc::new(HttpOAuth2Client::new(DEFAULT_HTTP_TIMEOUT_SECONDS)?);
        Self::with_client(options, verifier, client)
    }

    /// Build a strategy over an injected OAuth2 client collaborator.
    pub fn with_client(
        options: StrategyOptions,
        verifier: Verifier,
        client: Arc<dyn OAuth2Client>,
    ) -> OAuth2Result<Self> {
        let config = options.into_config()?;

        // An explicit passReqToCallback must agree with the verifier shape.
        if config.pass_req_to_callback == Some(true) && !verifier.wants_request() {
            return Err(OAuth2Error::config(
                "passReqToCallback requires a request-aware verifier",
            ));
        }
        if config.pass_req_to_callback == Some(false) && verifier.wants_request() {
            return Err(OAuth2Error::config(
                "a request-aware verifier requires passReqToCallback",
            ));
        }

        Ok(Self {
            config,
            client,
            verifier,
        })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    /// Query parameters appended to the authorization redirect. Per-call
    /// overrides win over configuration defaults; unresolved parameters are
    /// left out entirely.
    pub fn authorization_params(&self, overrides: &AuthorizeOverrides) -> HashMap<String, String> {
        let mut params = HashMap::new();

        let provider = overrides
            .provider
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(&self.config.provider);
        if !provider.is_empty() {
            params.insert("provider".to_string(), provider.to_string());
        }

        // An override that is set but unresolvable suppresses the default.
        let lang_id = match &overrides.lang_id {
            Some(lang) => lang.as_param(),
            None => self.config.lang_id.clone(),
        };
        if let Some(lang_id) = lang_id {
            params.insert("lang_id".to_string(), lang_id);
        }

        let scheme = overrides
            .scheme
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.config.scheme.as_deref());
        if let Some(scheme) = scheme {
            params.insert("scheme".to_string(), scheme.to_string());
        }

        if let Some(prompt) = overrides.prompt.as_deref().filter(|p| !p.is_empty()) {
            params.insert("prompt".to_string(), prompt.to_string());
        }
        if let Some(hint) = overrides.login_hint.as_deref().filter(|h| !h.is_empty()) {
            params.insert("login_hint".to_string(), hint.to_string());
        }

        params
    }

    /// Extra parameters merged into the token-exchange request body. The
    /// device id and state carried by the callback must round-trip into the
    /// exchange; their absence is not an error.
    pub fn token_params(&self, context: &CallbackContext) -> HashMap<String, String> {
        let mut params = HashMap::new();
        if let Some(device_id) = &context.device_id {
            params.insert("device_id".to_string(), device_id.clone());
        }
        if let Some(state) = &context.state {
            params.insert("state".to_string(), state.clone());
        }
        params
    }

    /// Build the authorization redirect and the correlation data the host
    /// must pass back at callback time.
    pub fn authorize_redirect(
        &self,
        overrides: &AuthorizeOverrides,
    ) -> OAuth2Result<(Url, AuthorizeTransaction)> {
        let state = self.config.state.then(|| Uuid::new_v4().to_string());
        let pkce = self.config.pkce.then(PkceChallenge::new);

        let request = AuthorizationRequest {
            endpoint: self.config.authorization_url.clone(),
            client_id: self.config.client_id.clone(),
            redirect_uri: self.config.callback_url.clone(),
            scope: self.config.scope.clone(),
            state: state.clone(),
            code_challenge: pkce.as_ref().map(|p| p.code_challenge.clone()),
            code_challenge_method: pkce.as_ref().map(|p| p.code_challenge_method.clone()),
            params: self.authorization_params(overrides),
        };

        let url = self.client.build_redirect_url(&request)?;
        debug!(strategy = self.config.name.as_str(), "built authorization redirect");

        let transaction = AuthorizeTransaction {
            state,
            code_verifier: pkce.map(|p| p.code_verifier),
        };
        Ok((url, transaction))
    }

    /// Exchange a callback's authorization code for tokens, augmenting the
    /// request with the device id and state the callback carried.
    pub async fn exchange_code(
        &self,
        request: &CallbackRequest,
        transaction: Option<&AuthorizeTransaction>,
    ) -> OAuth2Result<TokenResponse> {
        let code = request
            .code()
            .ok_or(OAuth2Error::MissingAuthorizationCode)?;
        let context = CallbackContext::from_request(request);

        if let (Some(expected), Some(received)) = (
            transaction.and_then(|txn| txn.state.as_deref()),
            context.state.as_deref(),
        ) {
            if expected != received {
                return Err(OAuth2Error::InvalidState);
            }
        }

        let token_request = TokenRequest {
            endpoint: self.config.token_url.clone(),
            client_id: self.config.client_id.clone(),
            client_secret: self.config.client_secret.clone(),
            code: code.to_string(),
            redirect_uri: self.config.callback_url.clone(),
            code_verifier: transaction.and_then(|txn| txn.code_verifier.clone()),
            params: self.token_params(&context),
        };

        let tokens = self.client.exchange_code(&token_request).await?;
        info!(
            strategy = self.config.name.as_str(),
            "exchanged authorization code for tokens"
        );
        Ok(tokens)
    }

    /// Fetch and normalize the user profile for an access token.
    pub async fn user_profile(&self, access_token: &str) -> OAuth2Result<CanonicalProfile> {
        let response = self
            .client
            .authenticated_get(&self.config.user_profile_url, access_token)
            .await
            .map_err(|err| match err {
                OAuth2Error::Http(source) => OAuth2Error::profile_fetch_transport(source),
                other => other,
            })?;

        if response.status != 200 {
            return Err(OAuth2Error::profile_fetch_status(
                response.status,
                response.body,
            ));
        }

        parse_profile(&self.config.provider, &response.body)
    }

    /// Run one step of the authentication flow for an inbound request:
    /// issue a redirect when no code is present, otherwise complete the
    /// exchange and hand the profile to the verify callback.
    pub async fn authenticate(
        &self,
        request: &CallbackRequest,
        options: &AuthenticateOptions,
    ) -> OAuth2Result<AuthOutcome> {
        if let Some(error) = request.param("error") {
            return Err(OAuth2Error::Callback {
                error: error.to_string(),
                description: request.param("error_description").map(str::to_string),
            });
        }

        if request.code().is_none() {
            let (url, transaction) = self.authorize_redirect(&options.overrides)?;
            return Ok(AuthOutcome::Redirect { url, transaction });
        }

        let tokens = self
            .exchange_code(request, options.transaction.as_ref())
            .await?;
        let profile = self.user_profile(&tokens.access_token).await?;

        let user = self
            .verifier
            .call(
                request,
                &tokens.access_token,
                tokens.refresh_token.as_deref(),
                &profile,
            )
            .await?;

        match user {
            Some(user) => {
                info!(
                    strategy = self.config.name.as_str(),
                    user_id = profile.id.as_str(),
                    "authentication verified"
                );
                Ok(AuthOutcome::Authenticated { user, profile })
            }
            None => Ok(AuthOutcome::Unauthorized),
        }
    }
}
