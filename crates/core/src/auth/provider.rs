//! Token-to-user resolution.

use std::collections::HashMap;

use async_trait::async_trait;
use tally_shared::types::UserId;

use crate::error::{LedgerError, LedgerResult};

/// Turns a request credential into a user ID.
///
/// Token issuance and verification live outside the core; implementations
/// only need to report who the caller is.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Resolves `token`, failing with [`LedgerError::Unauthenticated`] when it
    /// is unknown, expired, or malformed.
    async fn authenticate(&self, token: &str) -> LedgerResult<UserId>;
}

/// A fixed token table, for tests and local tooling.
#[derive(Debug, Clone, Default)]
pub struct StaticAuthProvider {
    tokens: HashMap<String, UserId>,
}

impl StaticAuthProvider {
    /// Creates an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `token` for `user_id`.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>, user_id: UserId) -> Self {
        self.tokens.insert(token.into(), user_id);
        self
    }
}

#[async_trait]
impl AuthProvider for StaticAuthProvider {
    async fn authenticate(&self, token: &str) -> LedgerResult<UserId> {
        self.tokens
            .get(token)
            .copied()
            .ok_or(LedgerError::Unauthenticated)
    }
}
