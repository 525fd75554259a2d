//! SharePoint site connections
//!
//! This module hands out [`SharePointClient`]s bound to a single site. Clients
//! are created on first use by the [`ConnectionCache`] and reused for the rest
//! of the process; each one sends its requests through the fixed behavior
//! [`Pipeline`] (headers, bearer token, error parsing, transport retry).

pub mod client;
pub mod constants;
pub mod manager;
pub mod models;
pub mod pipeline;
pub mod resilience;

pub use client::SharePointClient;
pub use manager::ConnectionCache;
pub use models::{SiteConnection, SiteIdentity};
pub use pipeline::{Behavior, Next, Pipeline, SharePointError};
pub use resilience::{RetryConfig, RetryPolicy, RetryableError};
