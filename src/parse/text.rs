//! Plain text decoding

/// Decoded text plus the encoding that produced it
#[derive(Debug, Clone)]
pub struct DecodedText {
    pub text: String,
    pub encoding: &'static str,
}

/// Decode TXT bytes as UTF-8, falling back to Latin-1.
///
/// Latin-1 maps every byte to a char, so the fallback always succeeds; a
/// text file can only fail upstream of this function.
pub fn decode_text(bytes: &[u8]) -> DecodedText {
    match std::str::from_utf8(bytes) {
        Ok(s) => DecodedText {
            text: s.to_string(),
            encoding: "utf-8",
        },
        Err(_) => DecodedText {
            text: bytes.iter().map(|&b| b as char).collect(),
            encoding: "latin-1",
        },
    }
}
