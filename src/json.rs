//! JSON wire format: ids travel as quoted decimal strings so 64-bit
//! values survive consumers that parse numbers as doubles.

use std::io::Write as _;

use crate::error::{Error, Result};
use crate::id::Id;

/// Quote, optional sign, 19 digits, quote, with one byte to spare.
pub const MAX_JSON_SIZE: usize = 22;

impl Id {
    /// Render as a JSON string literal, e.g. `"1462713862318587904"`.
    pub fn marshal_json(self) -> Result<Vec<u8>> {
        let mut buf = [0u8; MAX_JSON_SIZE];
        let mut cursor = &mut buf[..];
        write!(cursor, "\"{}\"", self.0).map_err(|_| Error::JsonTooLarge { max: MAX_JSON_SIZE })?;
        let written = MAX_JSON_SIZE - cursor.len();
        Ok(buf[..written].to_vec())
    }

    /// Parse a JSON string literal holding a base-10 signed integer.
    ///
    /// Fails with [`Error::JsonSyntax`] when the quoting is wrong and with
    /// [`Error::JsonParse`] when the quoted text is not an integer.
    pub fn unmarshal_json(b: &[u8]) -> Result<Self> {
        if b.len() < 3 || b[0] != b'"' || b[b.len() - 1] != b'"' {
            return Err(Error::JsonSyntax(b.to_vec()));
        }
        // invalid UTF-8 becomes U+FFFD, which then fails as a digit
        let inner = String::from_utf8_lossy(&b[1..b.len() - 1]);
        Ok(Id(inner.parse::<i64>()?))
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    use std::fmt;

    use serde::de::{self, Visitor};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::id::Id;

    impl Serialize for Id {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.collect_str(self)
        }
    }

    struct IdVisitor;

    impl Visitor<'_> for IdVisitor {
        type Value = Id;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a string holding a base-10 64-bit integer")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Id, E> {
            v.parse::<i64>().map(Id).map_err(E::custom)
        }
    }

    impl<'de> Deserialize<'de> for Id {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            deserializer.deserialize_str(IdVisitor)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marshal() {
        assert_eq!(Id(0).marshal_json().unwrap(), b"\"0\"");
        assert_eq!(
            Id(13587).marshal_json().unwrap(),
            b"\"13587\"".to_vec()
        );
        assert_eq!(
            Id(i64::MAX).marshal_json().unwrap(),
            b"\"9223372036854775807\"".to_vec()
        );
        let min = Id(i64::MIN).marshal_json().unwrap();
        assert_eq!(min, b"\"-9223372036854775808\"".to_vec());
        assert_eq!(min.len(), MAX_JSON_SIZE);
    }

    #[test]
    fn test_unmarshal() {
        assert_eq!(Id::unmarshal_json(b"\"13587\"").unwrap(), Id(13587));
        assert_eq!(Id::unmarshal_json(b"\"-1\"").unwrap(), Id(-1));
    }

    #[test]
    fn test_round_trip() {
        for v in [0, 1, 4096, 1_462_713_862_318_587_904, i64::MAX, i64::MIN] {
            let id = Id(v);
            assert_eq!(Id::unmarshal_json(&id.marshal_json().unwrap()).unwrap(), id);
        }
    }

    #[test]
    fn test_unmarshal_syntax_errors() {
        for raw in [&b"123"[..], b"\"123", b"123\"", b"\"\"", b"\"", b"", b"'12'"] {
            assert_eq!(
                Id::unmarshal_json(raw),
                Err(Error::JsonSyntax(raw.to_vec())),
                "input {:?}",
                String::from_utf8_lossy(raw)
            );
        }
    }

    #[test]
    fn test_syntax_error_carries_input() {
        let err = Id::unmarshal_json(b"123").unwrap_err();
        assert_eq!(err.to_string(), "invalid snowflake ID \"123\"");
    }

    #[test]
    fn test_unmarshal_parse_errors() {
        assert!(matches!(
            Id::unmarshal_json(b"\"abc\""),
            Err(Error::JsonParse(_))
        ));
        assert!(matches!(
            Id::unmarshal_json(b"\"9223372036854775808\""),
            Err(Error::JsonParse(_))
        ));
        assert!(matches!(
            Id::unmarshal_json(b"\" 1\""),
            Err(Error::JsonParse(_))
        ));
        // quoting is fine, the content just is not digits
        assert!(matches!(
            Id::unmarshal_json(b"\"\xff1\""),
            Err(Error::JsonParse(_))
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_json() {
        #[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug)]
        struct Message {
            id: Id,
        }

        let msg = Message {
            id: Id(1_462_713_862_318_587_904),
        };
        let text = serde_json::to_string(&msg).unwrap();
        assert_eq!(text, r#"{"id":"1462713862318587904"}"#);
        assert_eq!(serde_json::from_str::<Message>(&text).unwrap(), msg);

        assert!(serde_json::from_str::<Id>("123").is_err());
        assert!(serde_json::from_str::<Id>(r#""abc""#).is_err());
        assert_eq!(serde_json::from_str::<Id>(r#""-7""#).unwrap(), Id(-7));
    }
}
