use async_trait::async_trait;

use super::{AuthError, AuthRequest, Authenticator, Identity};

/// Open gate: every refresh request runs as the anonymous identity.
///
/// Only selected by an explicit `method = "none"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoneAuthenticator;

#[async_trait]
impl Authenticator for NoneAuthenticator {
    async fn authenticate(&self, _request: &AuthRequest) -> Result<Identity, AuthError> {
        Ok(Identity::anonymous())
    }

    fn method_name(&self) -> &'static str {
        "none"
    }
}
