//! host::codec
//!
//! Base64 transport encoding for file contents.
//!
//! The contents API ships file bodies as standard base64 wrapped at 60
//! columns. Decoding strips all ASCII whitespace first; encoding produces a
//! single unwrapped line, which the API accepts.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use thiserror::Error;

/// Errors from decoding a transport payload.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("invalid base64 payload: {0}")]
    InvalidBase64(String),
}

/// Encode text for upload.
pub fn encode_text(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

/// Decode a payload to raw bytes.
pub fn decode_bytes(payload: &str) -> Result<Vec<u8>, CodecError> {
    let compact: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| CodecError::InvalidBase64(e.to_string()))
}

/// Decode a payload to text.
///
/// Invalid UTF-8 sequences are replaced with U+FFFD rather than failing,
/// so binary files still open (lossily) in the editor.
pub fn decode_text(payload: &str) -> Result<String, CodecError> {
    let bytes = decode_bytes(payload)?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}
