//! Order-preserving binary encoding of key paths.
//!
//! Each segment is a type tag followed by its payload:
//!
//! - string: `0x02`, UTF-8 bytes with `0x00` escaped as `0x00 0xFF`, then `0x00`
//! - integer: `0x21`, 8 big-endian bytes of the value with the sign bit flipped
//!
//! Comparing encodings bytewise gives the same order as comparing key paths,
//! so prefix scans become range scans on the encoded column.

use crate::key::{KeyPath, KeySegment};
use crate::{Error, Result};

const STRING: u8 = 0x02;
const INT: u8 = 0x21;
const ESCAPE: u8 = 0xFF;

/// Encode a key path.
pub fn encode(path: &KeyPath) -> Vec<u8> {
    let mut out = Vec::new();
    for segment in path.segments() {
        match segment {
            KeySegment::Str(s) => {
                out.push(STRING);
                for &b in s.as_bytes() {
                    out.push(b);
                    if b == 0x00 {
                        out.push(ESCAPE);
                    }
                }
                out.push(0x00);
            }
            KeySegment::Int(n) => {
                out.push(INT);
                out.extend_from_slice(&((*n as u64) ^ (1 << 63)).to_be_bytes());
            }
        }
    }
    out
}

/// Decode a key path produced by [`encode`].
pub fn decode(bytes: &[u8]) -> Result<KeyPath> {
    let mut path = KeyPath::default();
    let mut i = 0;

    while i < bytes.len() {
        let tag = bytes[i];
        i += 1;
        match tag {
            STRING => {
                let mut raw = Vec::new();
                loop {
                    match (bytes.get(i), bytes.get(i + 1)) {
                        (Some(0x00), Some(&ESCAPE)) => {
                            raw.push(0x00);
                            i += 2;
                        }
                        (Some(0x00), _) => {
                            i += 1;
                            break;
                        }
                        (Some(&b), _) => {
                            raw.push(b);
                            i += 1;
                        }
                        (None, _) => return Err(invalid(bytes, "unterminated string")),
                    }
                }
                let s = String::from_utf8(raw).map_err(|_| invalid(bytes, "string is not UTF-8"))?;
                path.push(s);
            }
            INT => {
                let raw: [u8; 8] = bytes
                    .get(i..i + 8)
                    .and_then(|b| b.try_into().ok())
                    .ok_or_else(|| invalid(bytes, "truncated integer"))?;
                path.push((u64::from_be_bytes(raw) ^ (1 << 63)) as i64);
                i += 8;
            }
            other => return Err(invalid(bytes, &format!("unknown tag 0x{:02x}", other))),
        }
    }

    Ok(path)
}

/// Half-open byte range `[start, end)` covering every key strictly under
/// `prefix`. The prefix key itself is outside the range.
pub fn prefix_range(prefix: &KeyPath) -> (Vec<u8>, Vec<u8>) {
    let base = encode(prefix);
    let mut start = base.clone();
    start.push(0x00);
    let mut end = base;
    end.push(0xFF);
    (start, end)
}

fn invalid(bytes: &[u8], what: &str) -> Error {
    let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    Error::InvalidKey(format!("{} in {}", what, hex))
}
