use std::fmt;
use std::str::FromStr;

use crate::encode;
use crate::error::{Error, Result};
use crate::layout;

/// A packed snowflake id.
///
/// Field accessors ([`Id::time`], [`Id::node`], [`Id::step`]) use the
/// layout of the most recently constructed [`crate::Node`]; use
/// [`crate::Node::decompose`] when several layouts coexist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Id(pub(crate) i64);

impl Id {
    /// Wrap a raw integer, e.g. one read back from storage.
    pub const fn from_i64(v: i64) -> Self {
        Id(v)
    }

    pub const fn as_i64(self) -> i64 {
        self.0
    }

    /// Unix milliseconds at which the id was generated.
    ///
    /// Reads the active layout from one atomic word, no locking.
    pub fn time(self) -> i64 {
        layout::active().time(self.0)
    }

    /// Identity of the generating node.
    pub fn node(self) -> i64 {
        layout::active().node(self.0)
    }

    /// Sequence number within the id's millisecond.
    pub fn step(self) -> i64 {
        layout::active().step(self.0)
    }

    /// Signed binary digits.
    ///
    /// # Example
    /// ```
    /// use xid::Id;
    /// assert_eq!(Id::from_i64(5).base2(), "101");
    /// assert_eq!(Id::from_i64(-5).base2(), "-101");
    /// ```
    pub fn base2(self) -> String {
        encode::base2(self.0)
    }

    /// Lowercase base32 over the unsigned bit pattern, no padding.
    ///
    /// # Example
    /// ```
    /// use xid::Id;
    /// let id = Id::from_i64(1024);
    /// assert_eq!(id.base32(), "byy");
    /// assert_eq!(Id::parse_base32(id.base32().as_bytes()).unwrap(), id);
    /// ```
    pub fn base32(self) -> String {
        encode::base32(self.0 as u64)
    }

    /// Signed base36, `[0-9a-z]`.
    pub fn base36(self) -> String {
        encode::base36(self.0)
    }

    /// Base58 over the unsigned bit pattern.
    ///
    /// # Example
    /// ```
    /// use xid::Id;
    /// let id = Id::from_i64(-42);
    /// assert_eq!(Id::parse_base58(id.base58().as_bytes()).unwrap(), id);
    /// ```
    pub fn base58(self) -> String {
        encode::base58(self.0 as u64)
    }

    /// Base64 of the decimal digits, see [`crate::encode`].
    pub fn base64(self) -> String {
        encode::base64(self.0)
    }

    /// ASCII decimal digits.
    pub fn bytes(self) -> Vec<u8> {
        self.0.to_string().into_bytes()
    }

    /// 8-byte big-endian form.
    pub fn int_bytes(self) -> [u8; 8] {
        encode::int_bytes(self.0)
    }

    /// Parse signed decimal digits.
    ///
    /// # Arguments
    /// * `s` - Decimal text with an optional sign, no whitespace.
    ///
    /// # Returns
    /// The id, or [`Error::InvalidDigits`] when `s` is not an `i64`.
    ///
    /// # Example
    /// ```
    /// use xid::Id;
    /// assert_eq!(Id::parse_str("1024").unwrap().as_i64(), 1024);
    /// assert!(Id::parse_str("10 24").is_err());
    /// ```
    pub fn parse_str(s: &str) -> Result<Self> {
        encode::parse_radix(s, 10).map(Id)
    }

    /// Inverse of [`Id::base2`].
    pub fn parse_base2(s: &str) -> Result<Self> {
        encode::parse_radix(s, 2).map(Id)
    }

    /// Inverse of [`Id::base32`].
    ///
    /// # Returns
    /// [`Error::InvalidBase32`] on a symbol outside the alphabet (including
    /// uppercase) or empty input, [`Error::Overflow`] past 64 bits.
    pub fn parse_base32(s: &[u8]) -> Result<Self> {
        encode::parse_base32(s).map(|v| Id(v as i64))
    }

    /// Inverse of [`Id::base36`]; either letter case is accepted.
    pub fn parse_base36(s: &str) -> Result<Self> {
        encode::parse_radix(s, 36).map(Id)
    }

    /// Inverse of [`Id::base58`].
    ///
    /// # Returns
    /// [`Error::InvalidBase58`] on `0`, `O`, `I`, `l`, any other foreign
    /// byte or empty input, [`Error::Overflow`] past 64 bits.
    pub fn parse_base58(s: &[u8]) -> Result<Self> {
        encode::parse_base58(s).map(|v| Id(v as i64))
    }

    /// Inverse of [`Id::base64`]: decode, then read the decimal digits.
    ///
    /// # Example
    /// ```
    /// use xid::Id;
    /// assert_eq!(Id::parse_base64("MTIzNDU=").unwrap().as_i64(), 12345);
    /// ```
    pub fn parse_base64(s: &str) -> Result<Self> {
        encode::parse_base64(s).map(Id)
    }

    /// Parse the ASCII decimal digits produced by [`Id::bytes`].
    pub fn parse_bytes(b: &[u8]) -> Result<Self> {
        let s = std::str::from_utf8(b).map_err(|e| Error::InvalidDigits {
            base: 10,
            reason: e.to_string(),
        })?;
        Self::parse_str(s)
    }

    /// Inverse of [`Id::int_bytes`]. Every 8-byte value is a valid id.
    pub fn parse_int_bytes(b: [u8; 8]) -> Self {
        Id(encode::parse_int_bytes(b))
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for Id {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_str(s)
    }
}

impl From<i64> for Id {
    fn from(v: i64) -> Self {
        Id(v)
    }
}

impl From<Id> for i64 {
    fn from(id: Id) -> i64 {
        id.0
    }
}
