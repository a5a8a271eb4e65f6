/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    Hex string utilities shared by the TFLX provisioning tools. All routines
    operate on textual hex; byte-level conversions go through the `hex` crate.

--*/

use anyhow::{anyhow, bail};

/// Characters stripped by [`unprettify`] in addition to the `0x`/`0X` prefixes.
const SEPARATORS: &[char] = &[' ', '\n', '\r', '\t', ','];

/// Strip separators and `0x` prefixes from a hex string and uppercase it.
///
/// Accepts the free-form hex users paste into slot data fields (bytes
/// separated by spaces, commas, line breaks or `0x` prefixes) and reduces it
/// to a bare `[0-9A-F]*` string. The input is not validated; pair with
/// [`is_hex`] before interpreting the result as bytes.
pub fn unprettify(input: &str) -> String {
    // Separators are stripped before the prefixes, so a prefix split across
    // lines is still removed.
    let stripped: String = input.chars().filter(|c| !SEPARATORS.contains(c)).collect();
    stripped.replace("0x", "").replace("0X", "").to_uppercase()
}

/// Check that a string is non-empty and contains only hex digits.
pub fn is_hex(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_hexdigit())
}

/// Re-flow a normalized hex string into human-readable columns.
///
/// Lines hold `sep_dist` hex chars (`sep_dist / 2` bytes); bytes within a
/// line are single-space separated with a double space after every 8th byte.
/// Every completed byte is followed by its separator, so the output carries a
/// trailing space or newline; [`unprettify`] round-trips it to the input.
pub fn pretty_print(hex: &str, sep_dist: usize) -> String {
    let mut out = String::with_capacity(hex.len() * 2);
    for (i, c) in hex.chars().enumerate() {
        out.push(c);
        if i % 2 == 1 {
            if (i + 1) % sep_dist == 0 {
                out.push('\n');
            } else if (i + 1) % 16 == 0 {
                out.push_str("  ");
            } else {
                out.push(' ');
            }
        }
    }
    out
}

/// Render a hex string as a C array initializer body.
///
/// Input is normalized first. Bytes become `0xNN` separated by `", "`, with
/// a line break every `sep_dist` hex chars and no separator after the final
/// byte.
pub fn to_c_array(hex: &str, sep_dist: usize) -> String {
    let raw = unprettify(hex);
    let mut out = String::with_capacity(raw.len() * 3);
    let last = raw.len();
    for (i, c) in raw.chars().enumerate() {
        if i % 2 == 0 {
            out.push_str("0x");
            out.push(c);
        } else {
            out.push(c);
            if i + 1 != last {
                if (i + 1) % sep_dist == 0 {
                    out.push_str(",\n");
                } else {
                    out.push_str(", ");
                }
            }
        }
    }
    out
}

/// Encode an ASCII string as uppercase hex.
pub fn ascii_to_hex(s: &str) -> String {
    hex::encode_upper(s.as_bytes())
}

/// Decode a hex string to its ASCII representation.
pub fn hex_to_ascii(hex: &str) -> anyhow::Result<String> {
    if hex.len() % 2 != 0 {
        bail!("hex string has odd length {}", hex.len());
    }
    let bytes = hex::decode(hex).map_err(|e| anyhow!("invalid hex string: {e}"))?;
    Ok(bytes.iter().map(|&b| b as char).collect())
}

/// Pad a string with trailing spaces to `len` characters.
///
/// Errors when the input is already longer than `len`; certificate name
/// fields have fixed widths and cannot be truncated.
pub fn pad_string(s: &str, len: usize) -> anyhow::Result<String> {
    if s.len() > len {
        bail!("string {:?} exceeds fixed field width {}", s, len);
    }
    let mut out = String::with_capacity(len);
    out.push_str(s);
    while out.len() < len {
        out.push(' ');
    }
    Ok(out)
}
