//! Token provider trait definition.

use secrecy::SecretString;

/// Source of the GitHub token used for authenticated requests.
///
/// Returns `None` when no token is configured; callers treat that as an
/// authentication failure rather than an error to propagate.
pub trait TokenProvider: Send + Sync {
    fn get_token(&self) -> impl std::future::Future<Output = Option<SecretString>> + Send;
}

impl<T: TokenProvider> TokenProvider for std::sync::Arc<T> {
    fn get_token(&self) -> impl std::future::Future<Output = Option<SecretString>> + Send {
        (**self).get_token()
    }
}
