use async_trait::async_trait;
use thiserror::Error;

use super::types::{AuthRequest, Identity};

/// Why the refresh gate refused a request, or could not be built.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Neither `x-refresh-token` nor a bearer token was sent.
    #[error("refresh secret missing")]
    MissingSecret,

    #[error("refresh secret rejected")]
    SecretRejected,

    #[error("auth misconfigured: {0}")]
    Misconfigured(String),
}

/// Gate in front of the routes that change the catalog.
///
/// Reads never pass through it.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError>;

    /// Config value that selects this gate (`auth.method`).
    fn method_name(&self) -> &'static str;
}
