use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// Length of an oid in hex characters.
pub const OID_HEX_LEN: usize = 64;

/// Content-addressed identifier for a stored object.
///
/// An `Oid` is the SHA-256 digest of an object's content. Identical content
/// always produces the same `Oid`, so an object is stored once no matter how
/// many repositories reference it.
///
/// On the wire (URLs, JSON) an oid is always 64 lowercase hex characters.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Oid([u8; 32]);

impl Oid {
    /// Create an `Oid` from a pre-computed digest.
    pub fn from_digest(digest: [u8; 32]) -> Self {
        Self(digest)
    }

    /// Compute the `Oid` of in-memory content.
    pub fn of(data: &[u8]) -> Self {
        let mut hasher = crate::OidHasher::new();
        hasher.update(data);
        hasher.finalize()
    }

    /// The raw 32-byte digest.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a 64-character lowercase hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        if s.len() != OID_HEX_LEN {
            return Err(TypeError::InvalidLength {
                expected: OID_HEX_LEN,
                actual: s.len(),
            });
        }
        if s.bytes().any(|b| b.is_ascii_uppercase()) {
            return Err(TypeError::NotLowercase(s.to_string()));
        }
        let mut arr = [0u8; 32];
        hex::decode_to_slice(s, &mut arr).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        Ok(Self(arr))
    }

    /// Relative storage path for this oid: `ab/cd/abcd...`.
    pub fn shard_path(&self) -> String {
        let hex = self.to_hex();
        format!("{}/{}/{}", &hex[0..2], &hex[2..4], hex)
    }
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oid({})", self.short_hex())
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Oid {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; 32]> for Oid {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Oid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Oid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // SHA-256 of the empty string.
    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn of_empty_matches_known_digest() {
        assert_eq!(Oid::of(b"").to_hex(), EMPTY_SHA256);
    }

    #[test]
    fn of_is_deterministic() {
        assert_eq!(Oid::of(b"hello world"), Oid::of(b"hello world"));
        assert_ne!(Oid::of(b"hello"), Oid::of(b"world"));
    }

    #[test]
    fn parse_valid_hex() {
        let oid: Oid = EMPTY_SHA256.parse().unwrap();
        assert_eq!(oid, Oid::of(b""));
    }

    #[test]
    fn reject_wrong_length() {
        let err = Oid::from_hex("abcd").unwrap_err();
        assert_eq!(
            err,
            TypeError::InvalidLength {
                expected: 64,
                actual: 4
            }
        );
    }

    #[test]
    fn reject_uppercase() {
        let upper = EMPTY_SHA256.to_uppercase();
        assert!(matches!(
            Oid::from_hex(&upper),
            Err(TypeError::NotLowercase(_))
        ));
    }

    #[test]
    fn reject_non_hex() {
        let bad = "z".repeat(64);
        assert!(matches!(Oid::from_hex(&bad), Err(TypeError::InvalidHex(_))));
    }

    #[test]
    fn shard_path_layout() {
        let oid: Oid = EMPTY_SHA256.parse().unwrap();
        assert_eq!(oid.shard_path(), format!("e3/b0/{EMPTY_SHA256}"));
    }

    #[test]
    fn serde_uses_hex_string() {
        let oid = Oid::of(b"serde test");
        let json = serde_json::to_string(&oid).unwrap();
        assert_eq!(json, format!("\"{}\"", oid.to_hex()));
        let parsed: Oid = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, oid);
    }

    #[test]
    fn serde_rejects_invalid() {
        assert!(serde_json::from_str::<Oid>("\"not-an-oid\"").is_err());
    }

    #[test]
    fn debug_is_short() {
        let oid = Oid::of(b"x");
        assert_eq!(format!("{oid:?}"), format!("Oid({})", oid.short_hex()));
    }

    proptest! {
        #[test]
        fn display_parses_back(digest in any::<[u8; 32]>()) {
            let oid = Oid::from_digest(digest);
            let parsed: Oid = oid.to_string().parse().unwrap();
            prop_assert_eq!(parsed, oid);
        }
    }
}
