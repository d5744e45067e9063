//! Base64 text helpers used for share codes and mirror payloads.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Standard padded base64 of the UTF-8 bytes of `text`.
pub fn encode_string_to_base64(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

/// Decodes standard base64 into UTF-8 text.
///
/// Returns an empty string for anything that isn't valid base64 of valid
/// UTF-8. Callers treat `""` as "no value".
pub fn decode_base64_to_string(encoded: &str) -> String {
    STANDARD
        .decode(encoded.trim())
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_default()
}
