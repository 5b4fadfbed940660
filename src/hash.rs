use sha2::{Digest, Sha256};
use std::fmt;

/// Hex digits of the SHA-256 digest kept in a token.
const TOKEN_LEN: usize = 8;

/// Short stable identifier derived from a file's identity.
///
/// Only lowercase hex digits, so it can be embedded as-is in a virtual
/// address, a JS string literal, or a CSS class selector.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeToken(String);

impl ScopeToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Explicit scope handed to the generator: the token as a class selector.
    pub fn selector(&self) -> String {
        format!(".{}", self.0)
    }

    /// Rebuild a token from text recovered from a virtual address.
    /// Anything that could not have come out of [`scope_token`] is rejected.
    pub(crate) fn parse(raw: &str) -> Option<Self> {
        let valid = raw.len() == TOKEN_LEN
            && raw
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        valid.then(|| ScopeToken(raw.to_string()))
    }
}

impl fmt::Display for ScopeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn scope_token(identity: &str) -> ScopeToken {
    let mut hasher = Sha256::new();
    hasher.update(identity.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    ScopeToken(digest[..TOKEN_LEN].to_string())
}
