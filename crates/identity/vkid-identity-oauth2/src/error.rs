//! Strategy error types.

use thiserror::Error;

pub type OAuth2Result<T> = Result<T, OAuth2Error>;

#[derive(Debug, Error)]
pub enum OAuth2Error {
    /// Fatal at construction time, never recovered.
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("authorization callback returned an error: {error}")]
    Callback {
        error: String,
        description: Option<String>,
    },

    #[error("missing authorization code")]
    MissingAuthorizationCode,

    #[error("state parameter does not match the authorize transaction")]
    InvalidState,

    #[error("token exchange failed (status {status}): {body}")]
    TokenExchange { status: u16, body: String },

    #[error("invalid token response: {0}")]
    InvalidTokenResponse(String),

    #[error("failed to fetch user profile")]
    ProfileFetch {
        status: Option<u16>,
        body: Option<String>,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("failed to parse user profile: {reason}")]
    ProfileParse {
        reason: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    #[error(transparent)]
    Verify(#[from] vkid_identity_core::VerifyError),
}

impl OAuth2Error {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub(crate) fn profile_fetch_transport(source: reqwest::Error) -> Self {
        Self::ProfileFetch {
            status: None,
            body: None,
            source: Some(source),
        }
    }

    pub(crate) fn profile_fetch_status(status: u16, body: String) -> Self {
        Self::ProfileFetch {
            status: Some(status),
            body: Some(body),
            source: None,
        }
    }

    pub(crate) fn profile_parse(reason: impl Into<String>) -> Self {
        Self::ProfileParse {
            reason: reason.into(),
            source: None,
        }
    }

    pub(crate) fn profile_parse_json(source: serde_json::Error) -> Self {
        Self::ProfileParse {
            reason: "malformed JSON".to_string(),
            source: Some(source),
        }
    }
}
