//! Token registry: credential lookup, IP allow-lists, permission checks.

use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::Arc;

use pricewatch_core::{Permission, TokenConfig, TokenRateLimit};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::AuthError;

/// A configured API token as seen by request handling. Never mutated after
/// the registry is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRecord {
    pub id: String,
    pub name: String,
    pub permissions: HashSet<Permission>,
    /// Empty means unrestricted.
    pub allowed_ips: HashSet<IpAddr>,
    pub rate_limit: TokenRateLimit,
}

impl TokenRecord {
    /// Pure set membership: `admin` grants nothing beyond itself.
    #[must_use]
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }
}

#[derive(Debug)]
struct StoredToken {
    digest: String,
    record: Arc<TokenRecord>,
}

#[derive(Debug, Default)]
pub struct TokenRegistry {
    salt: Option<String>,
    tokens: Vec<StoredToken>,
}

impl TokenRegistry {
    #[must_use]
    pub fn from_configs(configs: &[TokenConfig], salt: Option<&str>) -> Self {
        let tokens = configs
            .iter()
            .map(|c| StoredToken {
                digest: c.credential_sha256.to_ascii_lowercase(),
                record: Arc::new(TokenRecord {
                    id: c.id.clone(),
                    name: c.name.clone(),
                    permissions: c.permissions.iter().copied().collect(),
                    allowed_ips: c.allowed_ips.iter().copied().collect(),
                    rate_limit: c.rate_limit,
                }),
            })
            .collect();
        Self {
            salt: salt.map(str::to_string),
            tokens,
        }
    }

    /// Lowercase hex SHA-256 of `salt || credential`, the form stored in
    /// `tokens.yaml`.
    #[must_use]
    pub fn hash_credential(salt: Option<&str>, credential: &str) -> String {
        let mut hasher = Sha256::new();
        if let Some(salt) = salt {
            hasher.update(salt.as_bytes());
        }
        hasher.update(credential.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Resolves a presented credential to its token.
    ///
    /// Every stored digest is compared in constant time, with no early exit,
    /// so lookup time does not depend on which token matched.
    ///
    /// # Errors
    ///
    /// - [`AuthError::MissingCredential`] for an absent or blank credential
    /// - [`AuthError::InvalidCredential`] when no token matches
    /// - [`AuthError::IpNotAuthorized`] when the token has an allow-list and
    ///   `caller_ip` is unknown or not on it
    pub fn validate_token(
        &self,
        credential: Option<&str>,
        caller_ip: Option<IpAddr>,
    ) -> Result<Arc<TokenRecord>, AuthError> {
        let credential = credential
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(AuthError::MissingCredential)?;

        let presented = Self::hash_credential(self.salt.as_deref(), credential);
        let mut matched: Option<&Arc<TokenRecord>> = None;
        for token in &self.tokens {
            let equal: bool = token.digest.as_bytes().ct_eq(presented.as_bytes()).into();
            if equal && matched.is_none() {
                matched = Some(&token.record);
            }
        }
        let record = matched.ok_or(AuthError::InvalidCredential)?;

        if !record.allowed_ips.is_empty()
            && !caller_ip.is_some_and(|ip| record.allowed_ips.contains(&ip))
        {
            return Err(AuthError::IpNotAuthorized);
        }

        Ok(Arc::clone(record))
    }

    /// See [`TokenRecord::has_permission`].
    #[must_use]
    pub fn check_permission(record: &TokenRecord, permission: Permission) -> bool {
        record.has_permission(permission)
    }
}
