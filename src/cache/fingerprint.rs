//! Deterministic cache keys.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::types::Operation;

/// Cache key derived from an operation kind and the exact code text.
///
/// Rendered as `"{operation}:{sha256(code) as hex}"`. The digest covers
/// the code byte for byte, whitespace included, and is stable across
/// processes, so a shared backend can use the same keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint `code` for `operation`.
    pub fn new(operation: Operation, code: &str) -> Self {
        let digest = Sha256::digest(code.as_bytes());
        Self(format!("{}:{}", operation.as_str(), hex::encode(digest)))
    }

    pub fn analysis(code: &str) -> Self {
        Self::new(Operation::Analysis, code)
    }

    pub fn refactor(code: &str) -> Self {
        Self::new(Operation::Refactor, code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form for log fields: operation plus the first 12 hex digits.
    pub fn short(&self) -> &str {
        let end = self
            .0
            .find(':')
            .map(|i| (i + 13).min(self.0.len()))
            .unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let a = Fingerprint::analysis("fn main() {}");
        let b = Fingerprint::analysis("fn main() {}");
        assert_eq!(a, b);
    }

    #[test]
    fn differs_on_operation() {
        let a = Fingerprint::analysis("fn main() {}");
        let r = Fingerprint::refactor("fn main() {}");
        assert_ne!(a, r);
    }

    #[test]
    fn whitespace_is_significant() {
        let a = Fingerprint::analysis("fn main() {}");
        let b = Fingerprint::analysis("fn main() {} ");
        let c = Fingerprint::analysis("fn main()  {}");
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn prefixed_with_operation() {
        let key = Fingerprint::refactor("x");
        assert!(key.as_str().starts_with("refactor:"));
        // operation + ':' + 64 hex digits
        assert_eq!(key.as_str().len(), "refactor:".len() + 64);
    }

    #[test]
    fn short_form_truncates_digest() {
        let key = Fingerprint::analysis("x");
        assert_eq!(key.short().len(), "analysis:".len() + 12);
        assert!(key.as_str().starts_with(key.short()));
    }

    #[test]
    fn empty_code_is_valid() {
        let key = Fingerprint::analysis("");
        assert!(key.as_str().starts_with("analysis:"));
        assert_ne!(key, Fingerprint::analysis(" "));
    }
}
