//! Example showing how to wire up VK ID authentication
//!
//! This example demonstrates:
//! 1. Normalizing strategy options
//! 2. Building the authorization redirect
//! 3. Handling the provider callback and verifying the profile

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use vkid_identity_core::{CallbackRequest, CanonicalProfile, ProfileVerifier, Verifier, VerifyResult};
use vkid_identity_oauth2::{
    AuthOutcome, AuthenticateOptions, AuthorizeOverrides, StrategyOptions, VkIdStrategy,
};

struct LookupUser;

#[async_trait]
impl ProfileVerifier for LookupUser {
    async fn verify(
        &self,
        _access_token: &str,
        _refresh_token: Option<&str>,
        profile: &CanonicalProfile,
    ) -> VerifyResult {
        // A real application would look the user up (or create one) here.
        Ok(Some(serde_json::json!({
            "id": profile.id,
            "name": profile.display_name,
        })))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let options = StrategyOptions::new(
        std::env::var("VKID_CLIENT_ID").unwrap_or_else(|_| "your-vkid-client-id".to_string()),
    )
    .with_secret(
        std::env::var("VKID_CLIENT_SECRET").unwrap_or_else(|_| "your-vkid-secret".to_string()),
    )
    .with_callback_url("http://localhost:3000/auth/vkid/callback")
    .with_scopes(&["vkid.personal_info", "email"]);

    let strategy = VkIdStrategy::new(options, Verifier::Plain(Arc::new(LookupUser)))?;

    println!("VK ID Example - OAuth2 Authentication");
    println!("=====================================");

    // Step 1: build the authorization redirect.
    let (url, transaction) = strategy.authorize_redirect(&AuthorizeOverrides::default())?;
    println!("\n1. Redirect the user to:\n   {url}");
    println!("\n   Keep the transaction until the callback arrives:");
    println!("   state = {:?}", transaction.state);

    // Step 2: the provider redirects back with a code. With real
    // credentials the callback would carry a live code, a device id, and
    // the state generated above.
    let callback = CallbackRequest {
        query: HashMap::from([
            ("code".to_string(), "paste-a-real-code-here".to_string()),
            ("device_id".to_string(), "device-from-callback".to_string()),
            ("state".to_string(), transaction.state.clone().unwrap_or_default()),
        ]),
        body: HashMap::new(),
    };

    let options = AuthenticateOptions {
        overrides: AuthorizeOverrides::default(),
        transaction: Some(transaction),
    };

    println!("\n2. Completing the callback (fails without real credentials)...");
    match strategy.authenticate(&callback, &options).await {
        Ok(AuthOutcome::Authenticated { user, profile }) => {
            println!("   Authenticated {} as {user}", profile.id);
        }
        Ok(AuthOutcome::Unauthorized) => println!("   Verify callback declined the identity"),
        Ok(AuthOutcome::Redirect { .. }) => println!("   Unexpected redirect"),
        Err(err) => println!("   Flow failed as expected without credentials: {err}"),
    }

    Ok(())
}
