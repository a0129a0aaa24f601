//! URI percent-decoding.

use crate::{Error, Result};

/// Characters whose escapes survive decoding: decoding them could change
/// how the URI splits into components.
const URI_RESERVED: &[u8] = b";/?:@&=+$,#";

/// Decode `%XX` escapes in a whole URI.
///
/// Escapes of reserved characters are kept as written. Multi-byte escapes
/// must form one valid UTF-8 character. A `%` that does not start a valid
/// escape is an error.
pub fn decode_uri(input: &str) -> Result<String> {
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'%' {
            let next = bytes[i..]
                .iter()
                .position(|&b| b == b'%')
                .map_or(bytes.len(), |p| i + p);
            out.push_str(&input[i..next]);
            i = next;
            continue;
        }

        let lead = escaped_byte(bytes, i).ok_or_else(|| malformed(input, i, "bad escape"))?;

        if lead < 0x80 {
            if URI_RESERVED.contains(&lead) {
                out.push_str(&input[i..i + 3]);
            } else {
                out.push(lead as char);
            }
            i += 3;
            continue;
        }

        let width = match lead {
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => return Err(malformed(input, i, "invalid UTF-8 lead byte")),
        };

        let mut buf = [0u8; 4];
        buf[0] = lead;
        for (k, slot) in buf.iter_mut().enumerate().take(width).skip(1) {
            let at = i + 3 * k;
            *slot = escaped_byte(bytes, at)
                .filter(|b| b & 0xC0 == 0x80)
                .ok_or_else(|| malformed(input, at, "truncated UTF-8 sequence"))?;
        }

        let decoded = std::str::from_utf8(&buf[..width])
            .map_err(|_| malformed(input, i, "invalid UTF-8 sequence"))?;
        out.push_str(decoded);
        i += 3 * width;
    }

    Ok(out)
}

/// The byte encoded by a `%XX` escape starting at `at`.
fn escaped_byte(bytes: &[u8], at: usize) -> Option<u8> {
    if bytes.get(at) != Some(&b'%') {
        return None;
    }
    let hi = (*bytes.get(at + 1)? as char).to_digit(16)?;
    let lo = (*bytes.get(at + 2)? as char).to_digit(16)?;
    Some((hi * 16 + lo) as u8)
}

fn malformed(input: &str, at: usize, what: &str) -> Error {
    Error::Decode {
        value: input.to_string(),
        reason: format!("{} at byte {}", what, at),
    }
}
