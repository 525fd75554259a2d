//! Transport retry for SharePoint calls

pub mod retry;

pub use retry::{RetryConfig, RetryPolicy, RetryableError};
