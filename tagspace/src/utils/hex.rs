// tagspace-rs/tagspace/src/utils/hex.rs
//! Hex helpers for UIDs, keys and unit traces in log output.

use std::fmt::Write;

fn join_hex(bytes: &[u8], sep: Option<char>, upper: bool) -> String {
    let mut s = String::with_capacity(bytes.len() * 3);
    for (i, b) in bytes.iter().enumerate() {
        if let (Some(c), true) = (sep, i != 0) {
            s.push(c);
        }
        // writing to a String cannot fail
        let _ = if upper {
            write!(s, "{:02X}", b)
        } else {
            write!(s, "{:02x}", b)
        };
    }
    s
}

/// `&[0xde, 0xad]` -> `"dead"`
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    join_hex(bytes, None, false)
}

/// `&[0xde, 0xad]` -> `"de ad"`, the form used by `trace!` unit dumps.
pub fn bytes_to_hex_spaced(bytes: &[u8]) -> String {
    join_hex(bytes, Some(' '), false)
}

/// `&[0x04, 0xa1]` -> `"04:A1"`, the usual UID notation.
pub fn bytes_to_hex_colon(bytes: &[u8]) -> String {
    join_hex(bytes, Some(':'), true)
}

/// Parse hex digits into bytes. Whitespace and `:` separators are skipped.
pub fn parse_hex(s: &str) -> Result<Vec<u8>, String> {
    let digits: Vec<u8> = s
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .map(|c| {
            c.to_digit(16)
                .map(|d| d as u8)
                .ok_or_else(|| format!("invalid hex digit '{}'", c))
        })
        .collect::<Result<_, _>>()?;
    if digits.len() % 2 != 0 {
        return Err(format!("odd number of hex digits ({})", digits.len()));
    }
    Ok(digits.chunks_exact(2).map(|p| p[0] << 4 | p[1]).collect())
}
