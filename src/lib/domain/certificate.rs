use alloy::primitives::Bytes;
use serde::{Deserialize, Serialize};

/// A certificate hash as submitted by a client.
///
/// Treated as opaque: the only requirement is that it is non-empty. Duplicates
/// are allowed and each occurrence becomes its own leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CertificateHash(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing certificate hash")]
    MissingCertificateHash,
}

impl CertificateHash {
    /// Validate a raw request value. `None` and the empty string are rejected.
    pub fn parse(raw: Option<&str>) -> Result<Self, ValidationError> {
        match raw {
            Some(s) if !s.is_empty() => Ok(Self(s.to_owned())),
            _ => Err(ValidationError::MissingCertificateHash),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Bytes used as the Merkle leaf.
    ///
    /// Even-length hex (with or without `0x`) is decoded; anything else is
    /// taken as its UTF-8 bytes. The result is not hashed again.
    pub fn leaf_bytes(&self) -> Bytes {
        let digits = self.0.strip_prefix("0x").unwrap_or(&self.0);
        match hex::decode(digits) {
            Ok(decoded) => Bytes::from(decoded),
            Err(_) => Bytes::copy_from_slice(self.0.as_bytes()),
        }
    }
}

impl std::fmt::Display for CertificateHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_and_empty_rejected() {
        assert_eq!(
            CertificateHash::parse(None),
            Err(ValidationError::MissingCertificateHash)
        );
        assert_eq!(
            CertificateHash::parse(Some("")),
            Err(ValidationError::MissingCertificateHash)
        );
    }

    #[test]
    fn test_prefixed_hex_decoded() {
        let hash = CertificateHash::parse(Some("0xdeadbeef")).unwrap();
        assert_eq!(hash.leaf_bytes().as_ref(), &[0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn test_bare_hex_decoded() {
        let hash = CertificateHash::parse(Some("0102")).unwrap();
        assert_eq!(hash.leaf_bytes().as_ref(), &[0x01, 0x02]);
    }

    #[test]
    fn test_non_hex_uses_utf8() {
        let hash = CertificateHash::parse(Some("cert-42")).unwrap();
        assert_eq!(hash.leaf_bytes().as_ref(), b"cert-42");
    }

    #[test]
    fn test_odd_length_hex_uses_utf8() {
        let hash = CertificateHash::parse(Some("0xabc")).unwrap();
        assert_eq!(hash.leaf_bytes().as_ref(), b"0xabc");
    }

    #[test]
    fn test_value_kept_verbatim() {
        let hash = CertificateHash::parse(Some("0xABCD")).unwrap();
        assert_eq!(hash.as_str(), "0xABCD");
        assert_eq!(hash.to_string(), "0xABCD");
    }
}
