//! HTTP Basic credential extraction.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use http::header::AUTHORIZATION;
use http::HeaderMap;
use std::fmt;

// Some clients strip the trailing `=`.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A name and secret pair taken from an `Authorization: Basic` header.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    /// The login name (an email address).
    pub name: String,
    /// The plaintext secret.
    pub secret: String,
}

impl BasicCredentials {
    /// Creates a credential pair.
    pub fn new(name: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            secret: secret.into(),
        }
    }

    /// Parses a raw `Authorization` header value.
    ///
    /// The scheme token is matched case-insensitively. The decoded payload is
    /// split on its first colon, so secrets may contain colons. Padding is
    /// optional. Returns `None`
    /// for any other scheme, invalid base64, non-UTF-8 payloads and payloads
    /// without a colon.
    #[must_use]
    pub fn from_header_value(value: &str) -> Option<Self> {
        let (scheme, payload) = value.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return None;
        }

        let decoded = LENIENT.decode(payload.trim()).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (name, secret) = decoded.split_once(':')?;

        Some(Self {
            name: name.to_string(),
            secret: secret.to_string(),
        })
    }

    /// Extracts credentials from the `Authorization` header of a request.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(Self::from_header_value)
    }

    /// Encodes the pair as an `Authorization` header value.
    #[must_use]
    pub fn to_header_value(&self) -> String {
        format!(
            "Basic {}",
            STANDARD.encode(format!("{}:{}", self.name, self.secret))
        )
    }
}

impl fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("name", &self.name)
            .field("secret", &"<redacted>")
            .finish()
    }
}
