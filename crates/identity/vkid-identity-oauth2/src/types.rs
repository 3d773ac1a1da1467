//! Request and response shapes exchanged with the OAuth2 client collaborator.

use crate::config::LangId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use vkid_identity_core::CallbackRequest;

/// Per-call overrides for the authorization redirect.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthorizeOverrides {
    pub provider: Option<String>,
    #[serde(alias = "langId")]
    pub lang_id: Option<LangId>,
    pub scheme: Option<String>,
    pub prompt: Option<String>,
    pub login_hint: Option<String>,
}

/// Device binding and anti-CSRF state extracted from a callback request.
/// Round-trips from the provider redirect into the token exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackContext {
    pub device_id: Option<String>,
    pub state: Option<String>,
}

impl CallbackContext {
    /// Extract the context from an inbound callback. Only a request that
    /// actually carries an authorization code contributes values.
    pub fn from_request(request: &CallbackRequest) -> Self {
        if request.code().is_none() {
            return Self::default();
        }

        Self {
            device_id: request
                .first_param(&["device_id", "deviceId"])
                .map(str::to_string),
            state: request.param("state").map(str::to_string),
        }
    }
}

/// Correlation data handed to the host at redirect time and passed back at
/// callback time. Replaces any server-side state storage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthorizeTransaction {
    pub state: Option<String>,
    pub code_verifier: Option<String>,
}

/// Input to the collaborator's redirect-URL builder.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub endpoint: String,
    pub client_id: String,
    pub redirect_uri: Option<String>,
    pub scope: String,
    pub state: Option<String>,
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<String>,
    /// Provider-specific additions (provider, lang_id, scheme, ...).
    pub params: HashMap<String, String>,
}

/// Input to the collaborator's code-for-token exchange.
#[derive(Debug, Clone)]
pub struct TokenRequest {
    pub endpoint: String,
    pub client_id: String,
    pub client_secret: Option<String>,
    pub code: String,
    pub redirect_uri: Option<String>,
    pub code_verifier: Option<String>,
    /// Provider-specific additions (device_id, state).
    pub params: HashMap<String, String>,
}

/// Token endpoint response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    /// Provider-specific extras (VK ID returns `user_id` here).
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Body and status returned by the authenticated GET primitive.
#[derive(Debug, Clone)]
pub struct FetchedResponse {
    pub status: u16,
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(query: &[(&str, &str)], body: &[(&str, &str)]) -> CallbackRequest {
        CallbackRequest {
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: body
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn context_requires_an_authorization_code() {
        let req = request(&[("device_id", "d1"), ("state", "s1")], &[]);
        assert_eq!(CallbackContext::from_request(&req), CallbackContext::default());
    }

    #[test]
    fn context_reads_both_device_id_spellings() {
        let req = request(&[("code", "c"), ("deviceId", "d1")], &[]);
        let context = CallbackContext::from_request(&req);
        assert_eq!(context.device_id.as_deref(), Some("d1"));
    }

    #[test]
    fn context_reads_values_from_the_body() {
        let req = request(&[], &[("code", "c"), ("device_id", "d2"), ("state", "s2")]);
        let context = CallbackContext::from_request(&req);
        assert_eq!(context.device_id.as_deref(), Some("d2"));
        assert_eq!(context.state.as_deref(), Some("s2"));
    }

    #[test]
    fn token_response_keeps_provider_extras() {
        let tokens: TokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": "tok",
            "token_type": "Bearer",
            "expires_in": 3600,
            "user_id": 221486,
        }))
        .unwrap();

        assert_eq!(tokens.access_token, "tok");
        assert_eq!(tokens.expires_in, Some(3600));
        assert_eq!(tokens.extra["user_id"], 221486);
    }
}
