use std::collections::HashSet;
use std::net::IpAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Capability granted to an API token.
///
/// Permissions are independent: `Admin` does not imply the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Read,
    Write,
    Scrape,
    Admin,
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Permission::Read => write!(f, "read"),
            Permission::Write => write!(f, "write"),
            Permission::Scrape => write!(f, "scrape"),
            Permission::Admin => write!(f, "admin"),
        }
    }
}

/// Per-token request budget applied by the sliding-window limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRateLimit {
    pub requests: usize,
    pub window_secs: u64,
}

impl Default for TokenRateLimit {
    fn default() -> Self {
        Self {
            requests: 100,
            window_secs: 60,
        }
    }
}

/// One token entry from `tokens.yaml`.
///
/// The credential itself is never stored; only its salted SHA-256 digest
/// (lowercase hex) is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    pub id: String,
    pub name: String,
    pub credential_sha256: String,
    pub permissions: Vec<Permission>,
    /// Empty means any caller IP is accepted.
    #[serde(default)]
    pub allowed_ips: Vec<IpAddr>,
    #[serde(default)]
    pub rate_limit: TokenRateLimit,
}

#[derive(Debug, Deserialize)]
pub struct TokensFile {
    pub tokens: Vec<TokenConfig>,
}

/// Load and validate API token definitions from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_tokens(path: &Path) -> Result<TokensFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_tokens(&content, &path.display().to_string())
}

fn parse_tokens(content: &str, origin: &str) -> Result<TokensFile, ConfigError> {
    let file: TokensFile = serde_yaml::from_str(content).map_err(|e| ConfigError::FileParse {
        path: origin.to_string(),
        source: e,
    })?;
    validate_tokens(&file)?;
    Ok(file)
}

fn validate_tokens(file: &TokensFile) -> Result<(), ConfigError> {
    let mut seen_ids = HashSet::new();
    let mut seen_digests = HashSet::new();

    for token in &file.tokens {
        if token.id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "token id must be non-empty".to_string(),
            ));
        }
        if !seen_ids.insert(token.id.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate token id: '{}'",
                token.id
            )));
        }

        let digest = token.credential_sha256.to_ascii_lowercase();
        if digest.len() != 64 || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ConfigError::Validation(format!(
                "token '{}' credential_sha256 must be 64 hex characters",
                token.id
            )));
        }
        if !seen_digests.insert(digest) {
            return Err(ConfigError::Validation(format!(
                "token '{}' reuses another token's credential",
                token.id
            )));
        }

        if token.rate_limit.requests == 0 || token.rate_limit.window_secs == 0 {
            return Err(ConfigError::Validation(format!(
                "token '{}' rate_limit values must be positive",
                token.id
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIGEST_A: &str = "a665a45920422f9d417e4867efdc4fb8a04a1f3fff1fa07e998e86f7f7a27ae3";
    const DIGEST_B: &str = "b3a8e0e1f9ab1bfe3a36f231f676f78bb30a519d2b21e6c530c0eee8ebb4a5d0";

    #[test]
    fn parses_permissions_and_defaults() {
        let yaml = format!(
            r"
tokens:
  - id: ops
    name: Operations
    credential_sha256: {DIGEST_A}
    permissions: [read, scrape]
"
        );
        let file = parse_tokens(&yaml, "inline").unwrap();
        let token = &file.tokens[0];
        assert_eq!(token.permissions, vec![Permission::Read, Permission::Scrape]);
        assert!(token.allowed_ips.is_empty());
        assert_eq!(token.rate_limit, TokenRateLimit::default());
    }

    #[test]
    fn parses_ip_allow_list() {
        let yaml = format!(
            r"
tokens:
  - id: cron
    name: Cron runner
    credential_sha256: {DIGEST_A}
    permissions: [scrape]
    allowed_ips: ['10.0.0.5', '::1']
    rate_limit: {{ requests: 5, window_secs: 30 }}
"
        );
        let file = parse_tokens(&yaml, "inline").unwrap();
        assert_eq!(file.tokens[0].allowed_ips.len(), 2);
        assert_eq!(file.tokens[0].rate_limit.requests, 5);
    }

    #[test]
    fn rejects_unknown_permission() {
        let yaml = format!(
            r"
tokens:
  - id: x
    name: X
    credential_sha256: {DIGEST_A}
    permissions: [superuser]
"
        );
        assert!(matches!(
            parse_tokens(&yaml, "inline"),
            Err(ConfigError::FileParse { .. })
        ));
    }

    #[test]
    fn rejects_short_digest() {
        let yaml = r"
tokens:
  - id: x
    name: X
    credential_sha256: abc123
    permissions: [read]
";
        assert!(matches!(
            parse_tokens(yaml, "inline"),
            Err(ConfigError::Validation(ref m)) if m.contains("64 hex")
        ));
    }

    #[test]
    fn rejects_duplicate_ids_and_reused_digests() {
        let dup_id = format!(
            r"
tokens:
  - {{ id: x, name: X, credential_sha256: {DIGEST_A}, permissions: [read] }}
  - {{ id: x, name: Y, credential_sha256: {DIGEST_B}, permissions: [read] }}
"
        );
        assert!(matches!(
            parse_tokens(&dup_id, "inline"),
            Err(ConfigError::Validation(ref m)) if m.contains("duplicate")
        ));

        let dup_digest = format!(
            r"
tokens:
  - {{ id: x, name: X, credential_sha256: {DIGEST_A}, permissions: [read] }}
  - {{ id: y, name: Y, credential_sha256: {DIGEST_A}, permissions: [read] }}
"
        );
        assert!(matches!(
            parse_tokens(&dup_digest, "inline"),
            Err(ConfigError::Validation(ref m)) if m.contains("reuses")
        ));
    }

    #[test]
    fn rejects_zero_rate_limit() {
        let yaml = format!(
            r"
tokens:
  - id: x
    name: X
    credential_sha256: {DIGEST_A}
    permissions: [read]
    rate_limit: {{ requests: 0, window_secs: 60 }}
"
        );
        assert!(matches!(
            parse_tokens(&yaml, "inline"),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn permission_display_matches_serde_name() {
        assert_eq!(Permission::Scrape.to_string(), "scrape");
        assert_eq!(
            serde_json::to_string(&Permission::Admin).unwrap(),
            "\"admin\""
        );
    }
}
