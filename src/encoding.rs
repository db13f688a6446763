//! Wire Encodings
//!
//! Base64, quoted-printable, and hex, in the lenient flavors mail-derived
//! protocols require. MIME tooling folds base64 bodies at 76 columns and
//! pads or not on a whim, so the decoder ignores embedded whitespace and
//! accepts either padding style. Strict validation belongs to callers that
//! know their input; header and body decoding does not get that luxury.

use base64::Engine as _;
use base64::alphabet;
use base64::engine::DecodePaddingMode;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};

use crate::error::{Error, Result};

// ============================================================================
// Base64
// ============================================================================

const PAD_INDIFFERENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);

/// Standard alphabet, padding optional on decode.
const LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, PAD_INDIFFERENT);

/// URL-safe alphabet, padding optional on decode.
const LENIENT_URL: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, PAD_INDIFFERENT);

#[inline]
pub(crate) fn is_transport_whitespace(b: u8) -> bool {
    matches!(b, b'\r' | b'\n' | b' ' | b'\t')
}

fn decode_with(engine: &GeneralPurpose, input: &[u8]) -> Result<Vec<u8>> {
    if input.iter().copied().any(is_transport_whitespace) {
        let filtered: Vec<u8> = input
            .iter()
            .copied()
            .filter(|&b| !is_transport_whitespace(b))
            .collect();
        Ok(engine.decode(filtered)?)
    } else {
        Ok(engine.decode(input)?)
    }
}

/// Decode standard-alphabet base64, tolerating embedded line breaks and
/// missing padding.
#[inline]
pub fn decode_base64(input: impl AsRef<[u8]>) -> Result<Vec<u8>> {
    decode_with(&LENIENT, input.as_ref())
}

/// Decode URL-safe base64 with the same tolerance.
#[inline]
pub fn decode_base64_url(input: impl AsRef<[u8]>) -> Result<Vec<u8>> {
    decode_with(&LENIENT_URL, input.as_ref())
}

/// Encode as standard base64 with padding.
#[inline]
pub fn encode_base64(data: impl AsRef<[u8]>) -> String {
    base64::engine::general_purpose::STANDARD.encode(data)
}

/// Encode as URL-safe base64 without padding, the token-friendly form.
#[inline]
pub fn encode_base64_url(data: impl AsRef<[u8]>) -> String {
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(data)
}

/// Encode as MIME base64: padded, folded at 76 columns with CRLF.
pub fn encode_base64_mime(data: impl AsRef<[u8]>) -> String {
    let encoded = encode_base64(data);
    let mut out = String::with_capacity(encoded.len() + encoded.len() / 38);
    let mut rest = encoded.as_str();
    while rest.len() > 76 {
        let (line, tail) = rest.split_at(76);
        out.push_str(line);
        out.push_str("\r\n");
        rest = tail;
    }
    out.push_str(rest);
    out
}

// ============================================================================
// Quoted-Printable
// ============================================================================

/// Decode quoted-printable content leniently.
///
/// `=XX` escapes become bytes, `=` before a line break is a soft break
/// and disappears, and a stray `=` that fits neither form passes through
/// untouched instead of failing the body.
pub fn decode_quoted_printable(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut pos = 0;

    while pos < input.len() {
        let b = input[pos];
        if b != b'=' {
            out.push(b);
            pos += 1;
            continue;
        }
        match (input.get(pos + 1), input.get(pos + 2)) {
            (Some(b'\r'), Some(b'\n')) => pos += 3,
            (Some(b'\n'), _) => pos += 2,
            (Some(&hi), Some(&lo)) => match (hex_value(hi), hex_value(lo)) {
                (Some(hi), Some(lo)) => {
                    out.push((hi << 4) | lo);
                    pos += 3;
                }
                _ => {
                    out.push(b'=');
                    pos += 1;
                }
            },
            _ => {
                out.push(b'=');
                pos += 1;
            }
        }
    }
    out
}

// ============================================================================
// Hex
// ============================================================================

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Render bytes as lowercase hex.
pub fn encode_hex(data: impl AsRef<[u8]>) -> String {
    let data = data.as_ref();
    let mut out = String::with_capacity(data.len() * 2);
    for &b in data {
        out.push(HEX_DIGITS[(b >> 4) as usize] as char);
        out.push(HEX_DIGITS[(b & 0x0f) as usize] as char);
    }
    out
}

/// Decode a hex string, either case. Odd length or a non-hex digit is an
/// error.
pub fn decode_hex(input: &str) -> Result<Vec<u8>> {
    let bytes = input.as_bytes();
    if bytes.len() % 2 != 0 {
        return Err(Error::InvalidHex(format!(
            "odd number of digits: {}",
            bytes.len()
        )));
    }
    let mut out = Vec::with_capacity(bytes.len() / 2);
    for pair in bytes.chunks_exact(2) {
        match (hex_value(pair[0]), hex_value(pair[1])) {
            (Some(hi), Some(lo)) => out.push((hi << 4) | lo),
            _ => {
                return Err(Error::InvalidHex(format!(
                    "not a hex digit: {:?}",
                    pair.iter().map(|&b| b as char).collect::<String>()
                )));
            }
        }
    }
    Ok(out)
}

#[inline]
fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
