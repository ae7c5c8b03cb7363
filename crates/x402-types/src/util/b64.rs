//! Base64 encoding and decoding of header values.
//!
//! Payment headers and settlement receipts travel as standard (padded) Base64 of
//! a JSON document. [`Base64Bytes`] holds the encoded form.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as b64;
use std::borrow::Cow;
use std::fmt::Display;

/// Base64-encoded bytes, borrowed from a header or owned after encoding.
///
/// ```rust
/// use x402_types::util::Base64Bytes;
///
/// let encoded = Base64Bytes::encode(b"{\"x402Version\":1}");
/// assert_eq!(encoded.to_string(), "eyJ4NDAyVmVyc2lvbiI6MX0=");
///
/// let text = encoded.to_string();
/// let decoded = Base64Bytes::from(text.as_str()).decode().unwrap();
/// assert_eq!(decoded, b"{\"x402Version\":1}");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Base64Bytes<'a>(pub Cow<'a, [u8]>);

impl Base64Bytes<'_> {
    /// Decodes the base64 string bytes to raw binary data.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is not valid standard Base64.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        b64.decode(&self.0)
    }

    /// Encodes raw binary data into base64 string bytes.
    pub fn encode<T: AsRef<[u8]>>(input: T) -> Base64Bytes<'static> {
        let encoded = b64.encode(input.as_ref());
        Base64Bytes(Cow::Owned(encoded.into_bytes()))
    }

    /// Returns the encoded text. Base64 output is always ASCII.
    pub fn into_string(self) -> String {
        String::from_utf8_lossy(self.0.as_ref()).into_owned()
    }
}

impl AsRef<[u8]> for Base64Bytes<'_> {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl<'a> From<&'a [u8]> for Base64Bytes<'a> {
    fn from(slice: &'a [u8]) -> Self {
        Base64Bytes(Cow::Borrowed(slice))
    }
}

impl<'a> From<&'a str> for Base64Bytes<'a> {
    fn from(s: &'a str) -> Self {
        Base64Bytes(Cow::Borrowed(s.as_bytes()))
    }
}

impl Display for Base64Bytes<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(self.0.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_url_safe_alphabet() {
        // '-' and '_' belong to the URL-safe alphabet only
        assert!(Base64Bytes::from("ab-_").decode().is_err());
    }

    #[test]
    fn test_into_string() {
        assert_eq!(Base64Bytes::encode("hello").into_string(), "aGVsbG8=");
    }
}
