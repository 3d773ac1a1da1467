//! VK ID OAuth2 strategy.
//!
//! Exchanges an authorization code for an access token against VK ID,
//! fetches the authenticated user's profile, and normalizes it into the
//! canonical shape defined by `vkid-identity-core`. The OAuth2 handshake
//! itself lives behind the [`OAuth2Client`] trait; the strategy contributes
//! only the provider-specific pieces: authorization parameters, token
//! parameter augmentation, and profile parsing.

pub mod client;
pub mod config;
pub mod error;
pub mod profile;
pub mod strategy;
pub mod types;


pub use client::{HttpOAuth2Client, OAuth2Client, PkceChallenge};
pub use config::{LangId, StrategyConfig, StrategyOptions};
pub use error::{OAuth2Error, OAuth2Result};
pub use profile::parse_profile;
pub use strategy::{AuthOutcome, AuthenticateOptions, VkIdStrategy};
pub use types::{
    AuthorizationRequest, AuthorizeOverrides, AuthorizeTransaction, CallbackContext,
    FetchedResponse, TokenRequest, TokenResponse,
};
