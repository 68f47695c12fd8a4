//! Value encoding for obfuscation-style placeholders
//!
//! Some templates carry placeholders whose chosen value is encoded before
//! substitution (e.g. a base64 payload a prompt asks the model to decode).

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// Supported value encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum EncodingMethod {
    #[default]
    Base64,
    Rot13,
    UnicodeEscape,
}

/// Encode a value with the given method
pub fn encode_value(content: &str, method: EncodingMethod) -> String {
    match method {
        EncodingMethod::Base64 => STANDARD.encode(content.as_bytes()),
        EncodingMethod::Rot13 => content.chars().map(rot13_char).collect(),
        EncodingMethod::UnicodeEscape => content
            .chars()
            .map(|c| format!("\\u{:04x}", c as u32))
            .collect(),
    }
}

fn rot13_char(c: char) -> char {
    match c {
        'a'..='z' => (((c as u8 - b'a' + 13) % 26) + b'a') as char,
        'A'..='Z' => (((c as u8 - b'A' + 13) % 26) + b'A') as char,
        _ => c,
    }
}
