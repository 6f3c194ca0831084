//! Text and byte encodings of packed ids.
//!
//! Supported encodings:
//! - `base32`: z-base-32 style alphabet, lowercase, no padding
//! - `base58`: Bitcoin-style alphabet without `0`, `O`, `I`, `l`
//! - `base36`, `base2`: signed, `[0-9a-z]` / `[01]`
//! - `base64`: standard base64 of the *decimal digits*, not of the raw
//!   integer bytes
//! - `int_bytes`: 8-byte big-endian
//!
//! The custom alphabets treat the id as an unsigned 64-bit value, so any
//! `i64` survives a round trip.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::error::{Error, Result};

/// Base32 alphabet.
pub const BASE32: &[u8; 32] = b"ybndrfg8ejkmcpqxot1uwisza345h769";
/// Base58 alphabet; note lowercase sorts before uppercase.
pub const BASE58: &[u8; 58] = b"123456789abcdefghijkmnopqrstuvwxyzABCDEFGHJKLMNPQRSTUVWXYZ";
/// Base36 alphabet (0-9, a-z).
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Marks bytes that are not part of an alphabet.
const INVALID: u8 = 0xFF;

const fn decode_table<const N: usize>(alphabet: &[u8; N]) -> [u8; 256] {
    let mut table = [INVALID; 256];
    let mut i = 0;
    while i < N {
        table[alphabet[i] as usize] = i as u8;
        i += 1;
    }
    table
}

static DECODE_BASE32: [u8; 256] = decode_table(BASE32);
static DECODE_BASE58: [u8; 256] = decode_table(BASE58);

/// Convert a number to a string in the radix of `alphabet`.
///
/// Values below the radix map straight to one symbol.
fn to_base<const N: usize>(n: u64, alphabet: &[u8; N]) -> String {
    let base = N as u64;
    if n < base {
        return char::from(alphabet[n as usize]).to_string();
    }

    // wide enough for any radix >= 2
    let mut buf = [0u8; 64];
    let mut i = buf.len();
    let mut v = n;
    while v >= base {
        i -= 1;
        buf[i] = alphabet[(v % base) as usize];
        v /= base;
    }
    i -= 1;
    buf[i] = alphabet[v as usize];

    buf[i..].iter().copied().map(char::from).collect()
}

/// Inverse of [`to_base`] through a 256-entry lookup table.
fn from_base(s: &[u8], table: &[u8; 256], base: u64, invalid: Error) -> Result<u64> {
    if s.is_empty() {
        return Err(invalid);
    }
    let mut n: u64 = 0;
    for &b in s {
        let digit = table[b as usize];
        if digit == INVALID {
            return Err(invalid);
        }
        n = n
            .checked_mul(base)
            .and_then(|n| n.checked_add(digit as u64))
            .ok_or(Error::Overflow)?;
    }
    Ok(n)
}

/// Encode `n` with the [`BASE32`] alphabet.
///
/// # Arguments
/// * `n` - The value to encode; ids are passed as their unsigned bit pattern.
///
/// # Returns
/// At least one symbol, no padding. Zero encodes as `"y"`.
///
/// # Example
/// ```
/// use xid::encode::{base32, parse_base32};
/// assert_eq!(base32(32), "by");
/// assert_eq!(parse_base32(b"by").unwrap(), 32);
/// ```
pub fn base32(n: u64) -> String {
    to_base(n, BASE32)
}

/// Decode [`BASE32`] symbols back into a value.
///
/// # Arguments
/// * `s` - Lowercase symbols only; anything else is rejected.
///
/// # Returns
/// [`Error::InvalidBase32`] for empty input or a foreign byte,
/// [`Error::Overflow`] when the value exceeds 64 bits.
pub fn parse_base32(s: &[u8]) -> Result<u64> {
    from_base(s, &DECODE_BASE32, 32, Error::InvalidBase32)
}

/// Encode `n` with the [`BASE58`] alphabet. Zero encodes as `"1"`.
pub fn base58(n: u64) -> String {
    to_base(n, BASE58)
}

/// Decode [`BASE58`] symbols, failing with [`Error::InvalidBase58`] or
/// [`Error::Overflow`].
pub fn parse_base58(s: &[u8]) -> Result<u64> {
    from_base(s, &DECODE_BASE58, 58, Error::InvalidBase58)
}

/// Signed base36, with a leading `-` for negative values.
pub fn base36(n: i64) -> String {
    let digits = to_base(n.unsigned_abs(), BASE36);
    if n < 0 { format!("-{digits}") } else { digits }
}

/// Signed base2, with a leading `-` for negative values.
pub fn base2(n: i64) -> String {
    if n < 0 {
        format!("-{:b}", n.unsigned_abs())
    } else {
        format!("{n:b}")
    }
}

/// Parse signed digits in `radix` (2..=36, either letter case).
pub fn parse_radix(s: &str, radix: u32) -> Result<i64> {
    i64::from_str_radix(s, radix).map_err(|e| Error::InvalidDigits {
        base: radix,
        reason: e.to_string(),
    })
}

/// Standard base64 of the ASCII decimal rendering of `n`.
pub fn base64(n: i64) -> String {
    STANDARD.encode(n.to_string())
}

/// Decode standard base64 and parse the result as decimal digits.
pub fn parse_base64(s: &str) -> Result<i64> {
    let digits = STANDARD
        .decode(s)
        .map_err(|e| Error::InvalidBase64(e.to_string()))?;
    let digits = std::str::from_utf8(&digits).map_err(|e| Error::InvalidDigits {
        base: 10,
        reason: e.to_string(),
    })?;
    parse_radix(digits, 10)
}

/// Big-endian two's complement bytes.
pub fn int_bytes(n: i64) -> [u8; 8] {
    n.to_be_bytes()
}

pub fn parse_int_bytes(bytes: [u8; 8]) -> i64 {
    i64::from_be_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case(0, "y" ; "zero")]
    #[test_case(31, "9" ; "last single symbol")]
    #[test_case(32, "by" ; "first two symbols")]
    #[test_case(1023, "99" ; "two full digits")]
    fn test_base32_known(n: u64, want: &str) {
        assert_eq!(base32(n), want);
        assert_eq!(parse_base32(want.as_bytes()).unwrap(), n);
    }

    #[test_case(0, "1" ; "zero")]
    #[test_case(57, "Z" ; "last single symbol")]
    #[test_case(58, "21" ; "first two symbols")]
    #[test_case(3363, "ZZ" ; "two full digits")]
    fn test_base58_known(n: u64, want: &str) {
        assert_eq!(base58(n), want);
        assert_eq!(parse_base58(want.as_bytes()).unwrap(), n);
    }

    #[test]
    fn test_round_trip_small_range() {
        for n in 0..100_000u64 {
            assert_eq!(parse_base32(base32(n).as_bytes()).unwrap(), n);
            assert_eq!(parse_base58(base58(n).as_bytes()).unwrap(), n);
        }
    }

    /// Full sweep of `[0, 10_000_000]`.
    #[test]
    #[ignore] // This test is long-running and should be run manually.
    fn test_round_trip_ten_million() {
        for n in 0..=10_000_000u64 {
            assert_eq!(parse_base32(base32(n).as_bytes()).unwrap(), n);
            assert_eq!(parse_base58(base58(n).as_bytes()).unwrap(), n);
        }
    }

    #[test]
    fn test_round_trip_large() {
        let samples = [
            (1u64 << 62) - 1,
            i64::MAX as u64,
            1_462_713_862_318_587_904,
            u64::MAX,
            0x5555_5555_5555_5555,
        ];
        for n in samples {
            assert_eq!(parse_base32(base32(n).as_bytes()).unwrap(), n);
            assert_eq!(parse_base58(base58(n).as_bytes()).unwrap(), n);
        }
    }

    #[test_case(b"0" ; "zero is not base58")]
    #[test_case(b"O" ; "capital o")]
    #[test_case(b"abl" ; "lowercase l")]
    #[test_case(b"" ; "empty")]
    fn test_base58_rejects(input: &[u8]) {
        assert_eq!(parse_base58(input), Err(Error::InvalidBase58));
    }

    #[test_case(b"l" ; "not in alphabet")]
    #[test_case(b"y y" ; "space")]
    #[test_case(b"Y" ; "uppercase")]
    #[test_case(b"" ; "empty")]
    fn test_base32_rejects(input: &[u8]) {
        assert_eq!(parse_base32(input), Err(Error::InvalidBase32));
    }

    #[test]
    fn test_overflow() {
        let too_long = base32(u64::MAX) + "9";
        assert_eq!(parse_base32(too_long.as_bytes()), Err(Error::Overflow));
    }

    #[test]
    fn test_decode_table_sentinel() {
        assert_eq!(DECODE_BASE32[b'y' as usize], 0);
        assert_eq!(DECODE_BASE32[b'9' as usize], 31);
        assert_eq!(DECODE_BASE32[b'0' as usize], INVALID);
        assert_eq!(DECODE_BASE58[b'Z' as usize], 57);
        assert_eq!(DECODE_BASE58[0xFF], INVALID);
    }

    #[test]
    fn test_base64_encodes_decimal_digits() {
        // "12345" rather than the binary integer
        assert_eq!(base64(12345), "MTIzNDU=");
        assert_eq!(parse_base64("MTIzNDU=").unwrap(), 12345);
        assert!(matches!(parse_base64("!!"), Err(Error::InvalidBase64(_))));
        assert!(matches!(
            parse_base64(&STANDARD.encode("12a")),
            Err(Error::InvalidDigits { base: 10, .. })
        ));
    }

    #[test]
    fn test_signed_radix() {
        assert_eq!(base36(0), "0");
        assert_eq!(base36(35), "z");
        assert_eq!(base36(36), "10");
        assert_eq!(base36(-36), "-10");
        assert_eq!(base36(i64::MIN), format!("-{}", "1y2p0ij32e8e8"));
        assert_eq!(parse_radix(&base36(i64::MIN), 36).unwrap(), i64::MIN);
        assert_eq!(base2(5), "101");
        assert_eq!(base2(-5), "-101");
        assert_eq!(parse_radix("-101", 2).unwrap(), -5);
        assert!(parse_radix("102", 2).is_err());
    }

    #[test]
    fn test_int_bytes() {
        let id = 0x0102_0304_0506_0708;
        assert_eq!(int_bytes(id), [1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(parse_int_bytes(int_bytes(id)), id);
        assert_eq!(parse_int_bytes(int_bytes(-1)), -1);
    }
}
