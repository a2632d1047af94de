//! API token loading
//!
//! Tokens are obtained out-of-band and handed to the process through the
//! environment (a `.env` file in the working directory is loaded by `main`).
//! All three must be present before any request is made.

use std::env;
use std::fmt;

use crate::constants::env as env_constants;
use crate::errors::{AuthError, AuthResult};

/// The three API tokens a run needs
#[derive(Clone)]
pub struct Tokens {
    /// Direct reports API (sent as `Bearer`)
    pub direct: String,
    /// Metrica stat API (sent as `OAuth`)
    pub metrica: String,
    /// AppMetrica stat API (sent as `OAuth`)
    pub appmetrica: String,
}

impl fmt::Debug for Tokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tokens")
            .field("direct", &"<redacted>")
            .field("metrica", &"<redacted>")
            .field("appmetrica", &"<redacted>")
            .finish()
    }
}

impl Tokens {
    /// Load all tokens from the process environment
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingToken` for the first unset variable and
    /// `AuthError::EmptyToken` for a blank one.
    pub fn from_env() -> AuthResult<Self> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Load all tokens through an arbitrary lookup function
    pub fn from_lookup<F>(lookup: F) -> AuthResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |var: &'static str| -> AuthResult<String> {
            let value = lookup(var).ok_or(AuthError::MissingToken { var })?;
            let value = value.trim().to_string();
            if value.is_empty() {
                return Err(AuthError::EmptyToken { var });
            }
            Ok(value)
        };

        Ok(Self {
            direct: read(env_constants::DIRECT_TOKEN)?,
            metrica: read(env_constants::METRICA_TOKEN)?,
            appmetrica: read(env_constants::APPMETRICA_TOKEN)?,
        })
    }
}

/// Presence of each token, without the values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenStatus {
    /// Variable name and whether it holds a non-blank value
    pub entries: Vec<(&'static str, bool)>,
}

impl TokenStatus {
    /// Whether every token is available
    pub fn is_complete(&self) -> bool {
        self.entries.iter().all(|(_, present)| *present)
    }

    /// Names of the missing variables
    pub fn missing(&self) -> Vec<&'static str> {
        self.entries
            .iter()
            .filter(|(_, present)| !present)
            .map(|(var, _)| *var)
            .collect()
    }
}

/// Check which tokens are set in the environment
pub fn get_token_status() -> TokenStatus {
    token_status_with(|var| env::var(var).ok())
}

fn token_status_with<F>(lookup: F) -> TokenStatus
where
    F: Fn(&str) -> Option<String>,
{
    let entries = [
        env_constants::DIRECT_TOKEN,
        env_constants::METRICA_TOKEN,
        env_constants::APPMETRICA_TOKEN,
    ]
    .into_iter()
    .map(|var| {
        let present = lookup(var).is_some_and(|value| !value.trim().is_empty());
        (var, present)
    })
    .collect();

    TokenStatus { entries }
}
