//! # Multibase
//!
//! Self-describing base58btc encoding. The leading `z` marks the Bitcoin
//! alphabet; the remainder is the input read as a big-endian unsigned integer
//! and rendered in base 58.
//!
//! See <https://datatracker.ietf.org/doc/html/draft-multiformats-multibase>

use num_bigint::BigUint;

use crate::error::Error;

/// Multibase prefix for base58btc.
pub const BASE58BTC: char = 'z';

/// The Bitcoin/IPFS base58 alphabet (no `0`, `O`, `I` or `l`).
const ALPHABET: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Encode bytes as a base58btc multibase string.
///
/// Each leading zero byte becomes a leading `1` so the byte length survives
/// the integer conversion.
#[must_use]
pub fn encode(bytes: &[u8]) -> String {
    let num = BigUint::from_bytes_be(bytes);
    let zeros = bytes.iter().take_while(|b| **b == 0).count();

    let mut encoded = String::with_capacity(1 + zeros + bytes.len() * 138 / 100 + 1);
    encoded.push(BASE58BTC);
    encoded.extend(std::iter::repeat('1').take(zeros));

    // `to_radix_be` renders zero as a single digit, which must not be emitted
    if num.bits() > 0 {
        encoded.extend(num.to_radix_be(58).into_iter().map(|d| char::from(ALPHABET[usize::from(d)])));
    }
    encoded
}

/// Decode a base58btc multibase string.
///
/// # Errors
///
/// Returns [`Error::UnsupportedEncoding`] if the prefix is not `z` and
/// [`Error::InvalidCharacter`] if the body contains a character outside the
/// base58 alphabet.
pub fn decode(encoded: &str) -> crate::Result<Vec<u8>> {
    let mut chars = encoded.chars();
    match chars.next() {
        Some(BASE58BTC) => {}
        Some(prefix) => return Err(Error::UnsupportedEncoding(format!("prefix {prefix:?}"))),
        None => return Err(Error::UnsupportedEncoding("empty input".into())),
    }
    let body = chars.as_str();

    let mut acc = BigUint::default();
    for c in body.chars() {
        let index = alphabet_index(c).ok_or(Error::InvalidCharacter(c))?;
        acc = acc * 58u32 + BigUint::from(index);
    }

    let zeros = body.chars().take_while(|c| *c == '1').count();
    let mut bytes = vec![0; zeros];
    if acc.bits() > 0 {
        bytes.extend(acc.to_bytes_be());
    }
    Ok(bytes)
}

fn alphabet_index(c: char) -> Option<u8> {
    let byte = u8::try_from(c).ok()?;
    ALPHABET.iter().position(|a| *a == byte).and_then(|i| u8::try_from(i).ok())
}
