use crate::error::{NyzoError, Result};
use data_encoding::HEXLOWER_PERMISSIVE;
use serde::Serializer;

/// Lowercase hex split into dash-separated groups of 8 characters,
/// the format key files and identifiers are shown in
pub fn bytes_as_string_with_dashes(bytes: &[u8]) -> String {
    let hex = data_encoding::HEXLOWER.encode(bytes);
    hex.as_bytes()
        .chunks(8)
        .map(|group| String::from_utf8_lossy(group).into_owned())
        .collect::<Vec<_>>()
        .join("-")
}

/// Inverse of [`bytes_as_string_with_dashes`]; dashes and whitespace are ignored
pub fn bytes_from_string_with_dashes(text: &str) -> Result<Vec<u8>> {
    let cleaned: String = text
        .chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .collect();
    HEXLOWER_PERMISSIVE
        .decode(cleaned.as_bytes())
        .map_err(|e| NyzoError::KeyFile(format!("Invalid hex: {e}")))
}

/// serde helper for byte fields rendered as lowercase hex in JSON views
pub fn serialize_hex<S>(bytes: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&data_encoding::HEXLOWER.encode(bytes))
}
