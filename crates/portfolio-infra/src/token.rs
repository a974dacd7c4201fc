//! Environment variable token provider.
//!
//! Checks `GITHUB_TOKEN`, then `GH_TOKEN` (the variable the `gh` CLI uses).
//! Empty values are treated as unset.

use secrecy::SecretString;

use portfolio_core::repository::token::TokenProvider;

/// Variables consulted, in order.
pub const TOKEN_VARS: [&str; 2] = ["GITHUB_TOKEN", "GH_TOKEN"];

/// Read-only token provider backed by environment variables.
pub struct EnvTokenProvider {
    vars: Vec<String>,
}

impl EnvTokenProvider {
    pub fn new() -> Self {
        Self::with_vars(TOKEN_VARS)
    }

    /// Consult `vars` instead of the default names.
    pub fn with_vars<I, S>(vars: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            vars: vars.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether any variable currently holds a token.
    pub fn is_configured(&self) -> bool {
        self.lookup().is_some()
    }

    fn lookup(&self) -> Option<String> {
        self.vars.iter().find_map(|name| match std::env::var(name) {
            Ok(val) if !val.trim().is_empty() => Some(val.trim().to_string()),
            // Non-unicode values cannot be valid tokens.
            _ => None,
        })
    }
}

impl Default for EnvTokenProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenProvider for EnvTokenProvider {
    async fn get_token(&self) -> Option<SecretString> {
        self.lookup().map(SecretString::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[tokio::test]
    async fn test_first_non_empty_variable_wins() {
        // SAFETY: these variable names are unique to this test.
        unsafe {
            std::env::set_var("PFOLIO_TEST_TOKEN_A", "  ");
            std::env::set_var("PFOLIO_TEST_TOKEN_B", "ghp_second");
        }
        let provider = EnvTokenProvider::with_vars(["PFOLIO_TEST_TOKEN_A", "PFOLIO_TEST_TOKEN_B"]);
        let token = provider.get_token().await.unwrap();
        assert_eq!(token.expose_secret(), "ghp_second");
        assert!(provider.is_configured());
        unsafe {
            std::env::remove_var("PFOLIO_TEST_TOKEN_A");
            std::env::remove_var("PFOLIO_TEST_TOKEN_B");
        }
    }

    #[tokio::test]
    async fn test_unset_variables_yield_none() {
        let provider = EnvTokenProvider::with_vars(["PFOLIO_TEST_TOKEN_NEVER_SET"]);
        assert!(provider.get_token().await.is_none());
        assert!(!provider.is_configured());
    }

    #[test]
    fn test_debug_output_never_contains_token() {
        let secret = SecretString::from("ghp_visible".to_string());
        assert!(!format!("{secret:?}").contains("ghp_visible"));
    }
}
