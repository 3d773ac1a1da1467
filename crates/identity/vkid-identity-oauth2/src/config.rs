//! Strategy configuration: loosely-typed options and their normalized form.

use crate::error::{OAuth2Error, OAuth2Result};
use serde::Deserialize;

pub const DEFAULT_AUTHORIZATION_URL: &str = "https://id.vk.ru/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://id.vk.ru/oauth2/auth";
pub const DEFAULT_USER_PROFILE_URL: &str = "https://id.vk.ru/oauth2/user_info";
pub const DEFAULT_SCOPE: &str = "vkid.personal_info";
pub const DEFAULT_PROVIDER: &str = "vkid";
pub const DEFAULT_NAME: &str = "vkid";

/// Interface language, accepted as either the VK numeric code or a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LangId {
    Code(i64),
    Tag(String),
}

impl LangId {
    /// String form used as the `lang_id` query parameter. An empty string
    /// counts as unresolved; the numeric code 0 (Russian) is valid.
    pub fn as_param(&self) -> Option<String> {
        match self {
            LangId::Code(code) => Some(code.to_string()),
            LangId::Tag(tag) if !tag.is_empty() => Some(tag.clone()),
            LangId::Tag(_) => None,
        }
    }
}

/// Constructor options as supplied by the embedding application.
///
/// Field aliases mirror the key spellings accepted by existing VK ID
/// integrations (`clientID`, `authorizationURL`, `profileURL`, ...), so the
/// whole record can be deserialized from an existing configuration blob.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StrategyOptions {
    #[serde(alias = "clientID", alias = "clientId")]
    pub client_id: Option<String>,
    #[serde(alias = "clientSecret")]
    pub client_secret: Option<String>,
    #[serde(alias = "authorizationURL")]
    pub authorization_url: Option<String>,
    #[serde(alias = "tokenURL")]
    pub token_url: Option<String>,
    #[serde(alias = "callbackURL")]
    pub callback_url: Option<String>,
    /// A string or a list of strings; any other shape fails construction.
    pub scope: Option<serde_json::Value>,
    pub state: Option<bool>,
    pub pkce: Option<bool>,
    pub provider: Option<String>,
    #[serde(alias = "langId")]
    pub lang_id: Option<LangId>,
    pub scheme: Option<String>,
    #[serde(alias = "userProfileURL", alias = "profileURL")]
    pub user_profile_url: Option<String>,
    pub name: Option<String>,
    #[serde(alias = "passReqToCallback")]
    pub pass_req_to_callback: Option<bool>,
}

impl StrategyOptions {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: Some(client_id.into()),
            ..Self::default()
        }
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    pub fn with_callback_url(mut self, url: impl Into<String>) -> Self {
        self.callback_url = Some(url.into());
        self
    }

    pub fn with_scopes(mut self, scopes: &[&str]) -> Self {
        self.scope = Some(serde_json::json!(scopes));
        self
    }

    /// Validate and default every field. Fails on a missing client id or a
    /// malformed scope.
    pub fn into_config(self) -> OAuth2Result<StrategyConfig> {
        let client_id = self
            .client_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| OAuth2Error::config("client id is required"))?;

        let scope = match self.scope {
            None => DEFAULT_SCOPE.to_string(),
            Some(value) => normalize_scope(&value)?,
        };

        Ok(StrategyConfig {
            client_id,
            client_secret: self.client_secret.filter(|s| !s.is_empty()),
            authorization_url: self
                .authorization_url
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| DEFAULT_AUTHORIZATION_URL.to_string()),
            token_url: self
                .token_url
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
            callback_url: self.callback_url.filter(|u| !u.is_empty()),
            scope,
            state: self.state.unwrap_or(true),
            pkce: self.pkce.unwrap_or(true),
            provider: self
                .provider
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
            lang_id: self.lang_id.as_ref().and_then(LangId::as_param),
            scheme: self.scheme.filter(|s| !s.is_empty()),
            user_profile_url: self
                .user_profile_url
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| DEFAULT_USER_PROFILE_URL.to_string()),
            name: self
                .name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| DEFAULT_NAME.to_string()),
            pass_req_to_callback: self.pass_req_to_callback,
        })
    }
}

/// Fully-defaulted strategy configuration, immutable after construction.
#[derive(Debug, Clone)]
pub struct StrategyConfig {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub authorization_url: String,
    pub token_url: String,
    pub callback_url: Option<String>,
    /// Non-empty, single-space-joined scope string.
    pub scope: String,
    pub state: bool,
    pub pkce: bool,
    pub provider: String,
    pub lang_id: Option<String>,
    pub scheme: Option<String>,
    pub user_profile_url: String,
    pub name: String,
    pub pass_req_to_callback: Option<bool>,
}

fn normalize_scope(value: &serde_json::Value) -> OAuth2Result<String> {
    let joined = match value {
        serde_json::Value::String(scope) => scope.trim().to_string(),
        serde_json::Value::Array(entries) => {
            let mut parts = Vec::with_capacity(entries.len());
            for entry in entries {
                match entry {
                    serde_json::Value::String(part) if !part.is_empty() => {
                        parts.push(part.as_str())
                    }
                    serde_json::Value::String(_) | serde_json::Value::Null => {}
                    other => {
                        return Err(OAuth2Error::config(format!(
                            "scope entries must be strings, got {other}"
                        )));
                    }
                }
            }
            parts.join(" ")
        }
        other => {
            return Err(OAuth2Error::config(format!(
                "scope must be a string or a list of strings, got {other}"
            )));
        }
    };

    if joined.is_empty() {
        Ok(DEFAULT_SCOPE.to_string())
    } else {
        Ok(joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_applied_for_minimal_options() {
        let config = StrategyOptions::new("client-1").into_config().unwrap();

        assert_eq!(config.client_id, "client-1");
        assert_eq!(config.authorization_url, DEFAULT_AUTHORIZATION_URL);
        assert_eq!(config.token_url, DEFAULT_TOKEN_URL);
        assert_eq!(config.user_profile_url, DEFAULT_USER_PROFILE_URL);
        assert_eq!(config.scope, DEFAULT_SCOPE);
        assert_eq!(config.provider, "vkid");
        assert_eq!(config.name, "vkid");
        assert!(config.state);
        assert!(config.pkce);
        assert_eq!(config.lang_id, None);
        assert_eq!(config.scheme, None);
    }

    #[test]
    fn missing_client_id_is_fatal() {
        let result = StrategyOptions::default().into_config();
        assert!(matches!(result, Err(OAuth2Error::Config(_))));
    }

    #[test]
    fn aliased_keys_are_recognized() {
        let options: StrategyOptions = serde_json::from_value(json!({
            "clientID": "abc",
            "clientSecret": "shh",
            "authorizationURL": "https://example.com/auth",
            "tokenURL": "https://example.com/token",
            "profileURL": "https://example.com/me",
            "langId": 3,
            "passReqToCallback": true,
        }))
        .unwrap();

        let config = options.into_config().unwrap();
        assert_eq!(config.client_id, "abc");
        assert_eq!(config.client_secret.as_deref(), Some("shh"));
        assert_eq!(config.authorization_url, "https://example.com/auth");
        assert_eq!(config.token_url, "https://example.com/token");
        assert_eq!(config.user_profile_url, "https://example.com/me");
        assert_eq!(config.lang_id.as_deref(), Some("3"));
        assert_eq!(config.pass_req_to_callback, Some(true));
    }

    #[test]
    fn scope_string_is_trimmed() {
        let mut options = StrategyOptions::new("c");
        options.scope = Some(json!("  email phone  "));
        let config = options.into_config().unwrap();
        assert_eq!(config.scope, "email phone");
    }

    #[test]
    fn scope_list_is_filtered_and_space_joined() {
        let mut options = StrategyOptions::new("c");
        options.scope = Some(json!(["vkid.personal_info", "", "email", null, "phone"]));
        let config = options.into_config().unwrap();
        assert_eq!(config.scope, "vkid.personal_info email phone");
    }

    #[test]
    fn empty_scope_falls_back_to_default() {
        for empty in [json!(""), json!("   "), json!([]), json!(["", null])] {
            let mut options = StrategyOptions::new("c");
            options.scope = Some(empty);
            let config = options.into_config().unwrap();
            assert_eq!(config.scope, DEFAULT_SCOPE);
        }
    }

    #[test]
    fn non_string_scope_is_a_configuration_error() {
        for invalid in [json!(42), json!(true), json!({"scope": "email"})] {
            let mut options = StrategyOptions::new("c");
            options.scope = Some(invalid);
            assert!(matches!(
                options.into_config(),
                Err(OAuth2Error::Config(_))
            ));
        }
    }

    #[test]
    fn non_string_scope_entry_is_a_configuration_error() {
        let mut options = StrategyOptions::new("c");
        options.scope = Some(json!(["email", 7]));
        assert!(matches!(options.into_config(), Err(OAuth2Error::Config(_))));
    }

    #[test]
    fn explicit_false_flags_are_kept() {
        let options: StrategyOptions = serde_json::from_value(json!({
            "client_id": "abc",
            "state": false,
            "pkce": false,
        }))
        .unwrap();

        let config = options.into_config().unwrap();
        assert!(!config.state);
        assert!(!config.pkce);
    }

    #[test]
    fn lang_id_accepts_numeric_zero() {
        let lang = LangId::Code(0);
        assert_eq!(lang.as_param().as_deref(), Some("0"));
    }

    #[test]
    fn empty_lang_tag_is_unresolved() {
        assert_eq!(LangId::Tag(String::new()).as_param(), None);
    }
}
