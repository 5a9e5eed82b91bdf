//! Shared-secret gate for the refresh trigger.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::{AuthError, AuthRequest, Authenticator, Identity};

/// Header carrying the secret directly.
pub const REFRESH_TOKEN_HEADER: &str = "x-refresh-token";

/// Authenticator that admits requests presenting the configured secret.
///
/// Accepts the secret in either:
/// - `X-Refresh-Token: <secret>` header
/// - `Authorization: Bearer <secret>` header
pub struct SharedSecretAuthenticator {
    expected_digest: [u8; 32],
}

impl SharedSecretAuthenticator {
    pub fn new(secret: &str) -> Self {
        Self {
            expected_digest: digest(secret),
        }
    }

    fn extract_secret<'a>(&self, request: &'a AuthRequest) -> Option<&'a str> {
        if let Some(token) = request.headers.get(REFRESH_TOKEN_HEADER) {
            return Some(token.trim());
        }

        let authorization = request.headers.get("authorization")?;
        let (scheme, token) = authorization.trim().split_once(' ')?;
        scheme
            .eq_ignore_ascii_case("bearer")
            .then(|| token.trim())
    }
}

#[async_trait]
impl Authenticator for SharedSecretAuthenticator {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError> {
        let provided = self
            .extract_secret(request)
            .filter(|s| !s.is_empty())
            .ok_or(AuthError::MissingSecret)?;

        // Digests always have equal length.
        if constant_time_eq(&digest(provided), &self.expected_digest) {
            Ok(Identity::new("refresh-operator", self.method_name()))
        } else {
            Err(AuthError::SecretRejected)
        }
    }

    fn method_name(&self) -> &'static str {
        "shared_secret"
    }
}

fn digest(value: &str) -> [u8; 32] {
    Sha256::digest(value.as_bytes()).into()
}

/// Constant-time byte comparison.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
