use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("cannot read fixture")]
    Io(#[from] std::io::Error),
    #[error("fixture is not a valid fixture document")]
    Parse(#[from] toml::de::Error),
    #[error("fixture is missing required key `{0}`")]
    MissingKey(&'static str),
    #[error("fixture origin {0} does not fit in 16 bits")]
    OriginOutOfRange(i64),
    #[error("fixture payload is not valid base64")]
    InvalidPayload(#[from] base64::DecodeError),
    #[error("fixture payload is {0} byte(s), not a whole number of words")]
    UnalignedPayload(usize),
}

/// Expected result for one object file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixture {
    pub origin: u16,
    pub payload: Vec<u8>,
    pub has_symbols: bool,
    pub has_linking: bool,
}

/// Parsed fixture text whose keys have not been checked yet.
#[derive(Debug, Clone, Deserialize)]
pub struct FixtureDocument {
    #[serde(rename = "Origin")]
    origin: Option<i64>,
    #[serde(rename = "Payload")]
    payload: Option<String>,
    #[serde(rename = "Symbols")]
    symbols: Option<toml::Value>,
    #[serde(rename = "Linking")]
    linking: Option<toml::Value>,
}

impl FixtureDocument {
    /// Parses fixture text without looking at its keys.
    ///
    /// # Errors
    /// Returns `FixtureError::Parse` when the text is not TOML or a known key
    /// has the wrong type.
    pub fn from_toml_str(text: &str) -> Result<Self, FixtureError> {
        Ok(toml::from_str(text)?)
    }

    /// Checks the required keys and decodes the payload.
    ///
    /// # Errors
    /// Returns `FixtureError` when a required key is absent, the origin does not
    /// fit in 16 bits, or the payload does not decode to whole words.
    pub fn resolve(self) -> Result<Fixture, FixtureError> {
        let origin = self.origin.ok_or(FixtureError::MissingKey("Origin"))?;
        let origin = u16::try_from(origin).map_err(|_| FixtureError::OriginOutOfRange(origin))?;
        let encoded = self.payload.ok_or(FixtureError::MissingKey("Payload"))?;
        let payload = decode_payload(&encoded)?;
        if !payload.len().is_multiple_of(2) {
            return Err(FixtureError::UnalignedPayload(payload.len()));
        }
        Ok(Fixture {
            origin,
            payload,
            has_symbols: self.symbols.is_some(),
            has_linking: self.linking.is_some(),
        })
    }
}

impl Fixture {
    /// Parses fixture text and decodes its payload.
    ///
    /// # Errors
    /// As `FixtureDocument::from_toml_str` followed by `FixtureDocument::resolve`.
    pub fn from_toml_str(text: &str) -> Result<Self, FixtureError> {
        FixtureDocument::from_toml_str(text)?.resolve()
    }

    #[must_use]
    pub fn encode_payload(bytes: &[u8]) -> String {
        STANDARD.encode(bytes)
    }
}

/// Decodes a base64 `Payload` value. The text must be exact base64; surrounding
/// whitespace is rejected.
///
/// # Errors
/// Returns `FixtureError::InvalidPayload` on malformed base64.
pub fn decode_payload(encoded: &str) -> Result<Vec<u8>, FixtureError> {
    Ok(STANDARD.decode(encoded)?)
}

/// Reads the fixture at `path` whole and parses it as TOML. Key checks wait
/// for `FixtureDocument::resolve`.
///
/// # Errors
/// Returns `FixtureError::Io` when the file cannot be read and
/// `FixtureError::Parse` when it is not a fixture document.
pub fn load_fixture(path: &Path) -> Result<FixtureDocument, FixtureError> {
    let text = std::fs::read_to_string(path)?;
    FixtureDocument::from_toml_str(&text)
}

#[cfg(test)]
mod tests {
    use super::{decode_payload, Fixture, FixtureDocument, FixtureError};

    #[test]
    fn loads_origin_and_payload() {
        let fixture = Fixture::from_toml_str("Origin = 0x3000\nPayload = \"AAAA\"\n")
            .expect("fixture should load");
        assert_eq!(fixture.origin, 0x3000);
        assert_eq!(fixture.payload, vec![0x00, 0x00]);
        assert!(!fixture.has_symbols);
        assert!(!fixture.has_linking);
    }

    #[test]
    fn accepts_decimal_origin_and_extension_keys() {
        let text = "Origin = 12288\nPayload = \"8CU=\"\nSymbols = { START = 12288 }\nLinking = []\n";
        let fixture = Fixture::from_toml_str(text).expect("fixture should load");
        assert_eq!(fixture.origin, 0x3000);
        assert_eq!(fixture.payload, vec![0xf0, 0x25]);
        assert!(fixture.has_symbols);
        assert!(fixture.has_linking);
    }

    #[test]
    fn reports_missing_keys() {
        let err = Fixture::from_toml_str("Payload = \"AAAA\"").expect_err("no origin");
        assert!(matches!(err, FixtureError::MissingKey("Origin")));
        let err = Fixture::from_toml_str("Origin = 1").expect_err("no payload");
        assert!(matches!(err, FixtureError::MissingKey("Payload")));
    }

    #[test]
    fn rejects_out_of_range_origin() {
        let err = Fixture::from_toml_str("Origin = 65536\nPayload = \"\"").expect_err("too big");
        assert!(matches!(err, FixtureError::OriginOutOfRange(65536)));
        let err = Fixture::from_toml_str("Origin = -1\nPayload = \"\"").expect_err("negative");
        assert!(matches!(err, FixtureError::OriginOutOfRange(-1)));
    }

    #[test]
    fn rejects_wrong_types_and_bad_payloads() {
        let err = Fixture::from_toml_str("Origin = \"x3000\"\nPayload = \"AAAA\"")
            .expect_err("string origin");
        assert!(matches!(err, FixtureError::Parse(_)));
        let err = Fixture::from_toml_str("Origin = 1\nPayload = \"!!!!\"").expect_err("bad base64");
        assert!(matches!(err, FixtureError::InvalidPayload(_)));
        let err = Fixture::from_toml_str("Origin = 1\nPayload = \"AA==\"").expect_err("one byte");
        assert!(matches!(err, FixtureError::UnalignedPayload(1)));
    }

    #[test]
    fn payload_encoding_round_trips() {
        for text in ["", "AAAA", "8CXwJQ==", "EjRWeJq8", "/+7dzLuqmYh3ZlVEMyIRAA=="] {
            let bytes = decode_payload(text).expect("decode");
            assert_eq!(Fixture::encode_payload(&bytes), text);
        }
    }

    #[test]
    fn surrounding_whitespace_is_not_base64() {
        let err = decode_payload(" AAAA").expect_err("leading space");
        assert!(matches!(err, FixtureError::InvalidPayload(_)));
        assert_eq!(decode_payload("AAAA").expect("decode"), vec![0x00, 0x00]);
    }

    #[test]
    fn document_defers_key_checks_to_resolve() {
        let document = FixtureDocument::from_toml_str("Payload = \"AA==\"\n")
            .expect("valid TOML without Origin still parses");
        let err = document.resolve().expect_err("origin is required");
        assert!(matches!(err, FixtureError::MissingKey("Origin")));

        let err = FixtureDocument::from_toml_str("Origin = \"x3000\"").expect_err("type error");
        assert_eq!(err.to_string(), "fixture is not a valid fixture document");
    }
}
