pub mod api;
pub mod auth;
pub mod config;

pub use api::{ConnectionCache, SharePointClient, SiteIdentity};
pub use auth::{AccessToken, CredentialResolver, CredentialStrategy, TokenCredential};
pub use config::Config;
