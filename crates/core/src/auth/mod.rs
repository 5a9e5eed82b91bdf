//! Authentication for the refresh trigger.
//!
//! Catalog reads are public; only the refresh routes consult an
//! [`Authenticator`].

mod none;
mod shared_secret;
mod traits;
mod types;

pub use none::*;
pub use shared_secret::*;
pub use traits::*;
pub use types::*;

use crate::config::{AuthConfig, AuthMethod};

/// Factory function to create authenticator from config
pub fn create_authenticator(config: &AuthConfig) -> Result<Box<dyn Authenticator>, AuthError> {
    match config.method {
        AuthMethod::None => Ok(Box::new(NoneAuthenticator)),
        AuthMethod::SharedSecret => {
            let secret = config
                .secret
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .ok_or_else(|| {
                    AuthError::Misconfigured(
                        "secret must be set when using shared_secret auth method".to_string(),
                    )
                })?;
            Ok(Box::new(SharedSecretAuthenticator::new(secret)))
        }
    }
}
