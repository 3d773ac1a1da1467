//! Host-facing contracts for VK ID authentication.
//!
//! Holds the canonical profile shape the OAuth2 strategy produces, the
//! inbound callback request shape it consumes, and the verify-callback seam
//! the embedding application plugs into.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Error raised by an application verify callback.
#[derive(Debug, Error)]
#[error("verify callback failed: {0}")]
pub struct VerifyError(pub String);

/// Completion contract of a verify callback: `Ok(Some(user))` on success,
/// `Ok(None)` when the application declines the identity, `Err` on failure.
pub type VerifyResult = Result<Option<serde_json::Value>, VerifyError>;

/// Structured name portion of a canonical profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileName {
    pub given_name: String,
    pub family_name: String,
}

/// Normalized user identity produced after a successful code exchange.
///
/// A profile always carries a non-empty `id`; parsing fails rather than
/// yielding a profile without one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalProfile {
    /// Identity provider tag ("vkid", "ok_ru", "mail_ru").
    pub provider: String,
    /// Stable user id.
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub name: ProfileName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_verified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    /// Response body exactly as received, kept for downstream auditing.
    pub raw: String,
    /// Parsed `user` payload the profile was built from.
    pub parsed: serde_json::Value,
}

/// Inbound callback request data: the query and body parameter maps the
/// host extracts from the provider redirect.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallbackRequest {
    #[serde(default)]
    pub query: HashMap<String, String>,
    #[serde(default)]
    pub body: HashMap<String, String>,
}

impl CallbackRequest {
    /// Look a parameter up in the query map first, then the body map.
    /// Empty values count as absent.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.first_param(&[key])
    }

    /// First non-empty value among `keys`, checking every spelling in the
    /// query before falling back to the body.
    pub fn first_param(&self, keys: &[&str]) -> Option<&str> {
        for source in [&self.query, &self.body] {
            for key in keys {
                if let Some(value) = source.get(*key) {
                    if !value.is_empty() {
                        return Some(value.as_str());
                    }
                }
            }
        }
        None
    }

    /// The authorization code, when this request is a provider callback.
    pub fn code(&self) -> Option<&str> {
        self.param("code")
    }
}

/// Application verify callback.
#[async_trait]
pub trait ProfileVerifier: Send + Sync {
    async fn verify(
        &self,
        access_token: &str,
        refresh_token: Option<&str>,
        profile: &CanonicalProfile,
    ) -> VerifyResult;
}

/// Application verify callback that also receives the callback request
/// (the `passReqToCallback` shape).
#[async_trait]
pub trait RequestProfileVerifier: Send + Sync {
    async fn verify(
        &self,
        request: &CallbackRequest,
        access_token: &str,
        refresh_token: Option<&str>,
        profile: &CanonicalProfile,
    ) -> VerifyResult;
}

/// The two verify-callback shapes, chosen at strategy construction.
#[derive(Clone)]
pub enum Verifier {
    Plain(Arc<dyn ProfileVerifier>),
    WithRequest(Arc<dyn RequestProfileVerifier>),
}

impl Verifier {
    /// Whether this verifier expects the callback request forwarded to it.
    pub fn wants_request(&self) -> bool {
        matches!(self, Verifier::WithRequest(_))
    }

    /// Dispatch to whichever callback shape was configured.
    pub async fn call(
        &self,
        request: &CallbackRequest,
        access_token: &str,
        refresh_token: Option<&str>,
        profile: &CanonicalProfile,
    ) -> VerifyResult {
        match self {
            Verifier::Plain(verify) => verify.verify(access_token, refresh_token, profile).await,
            Verifier::WithRequest(verify) => {
                verify
                    .verify(request, access_token, refresh_token, profile)
                    .await
            }
        }
    }
}
