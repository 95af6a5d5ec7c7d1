use crate::errors::{ErrorKind, MongoKitError, MongoKitResult};
use crate::ID_GENERATOR;
use chrono::{DateTime, TimeZone, Utc};
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

/// A 12 byte globally unique identifier.
///
/// Layout: 4 byte big endian creation time in seconds, 5 byte process
/// discriminator, 3 byte big endian counter. The textual form is 24
/// lowercase hex characters.
///
/// # Examples
///
/// ```rust,ignore
/// use mongokit::collection::Identifier;
///
/// let id = Identifier::new();
/// let hex = id.to_hex();
/// assert_eq!(hex.len(), 24);
/// assert_eq!(Identifier::parse_hex(&hex)?, id);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Identifier {
    bytes: [u8; 12],
}

impl Identifier {
    /// Generates a fresh identifier from the process wide generator.
    pub fn new() -> Self {
        ID_GENERATOR.next_identifier()
    }

    pub fn from_bytes(bytes: [u8; 12]) -> Self {
        Identifier { bytes }
    }

    pub fn bytes(&self) -> &[u8; 12] {
        &self.bytes
    }

    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Parses the 24 character hex form. Upper case digits are accepted.
    pub fn parse_hex(hex: &str) -> MongoKitResult<Identifier> {
        if !Identifier::is_valid_hex(hex) {
            log::error!("Invalid identifier {:?}", hex);
            return Err(MongoKitError::new(
                &format!("Invalid identifier {:?}, expected 24 hex characters", hex),
                ErrorKind::InvalidArgument,
            ));
        }

        let mut bytes = [0u8; 12];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)?;
        }
        Ok(Identifier { bytes })
    }

    pub fn is_valid_hex(hex: &str) -> bool {
        hex.len() == 24 && hex.chars().all(|c| c.is_ascii_hexdigit())
    }

    /// Creation time, to second precision.
    pub fn timestamp(&self) -> DateTime<Utc> {
        let seconds = u32::from_be_bytes([self.bytes[0], self.bytes[1], self.bytes[2], self.bytes[3]]);
        Utc.timestamp_opt(seconds as i64, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }
}

impl Default for Identifier {
    fn default() -> Self {
        Identifier::new()
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Debug for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Identifier({})", self.to_hex())
    }
}

impl FromStr for Identifier {
    type Err = MongoKitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Identifier::parse_hex(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_form_is_24_lowercase_chars() {
        let hex = Identifier::new().to_hex();
        assert_eq!(hex.len(), 24);
        assert!(hex.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn parse_round_trips() {
        let id = Identifier::new();
        assert_eq!(Identifier::parse_hex(&id.to_hex()).unwrap(), id);
        assert_eq!(id.to_hex().to_uppercase().parse::<Identifier>().unwrap(), id);
    }

    #[test]
    fn parse_rejects_malformed() {
        for bad in ["", "1234", "zzzzzzzzzzzzzzzzzzzzzzzz", "0123456789abcdef012345678"] {
            let err = Identifier::parse_hex(bad).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidArgument);
        }
    }

    #[test]
    fn timestamp_reads_leading_bytes() {
        let id = Identifier::parse_hex("5f5e1000aabbccddee000001").unwrap();
        assert_eq!(id.timestamp().timestamp(), 0x5f5e1000);
    }

    #[test]
    fn identifiers_order_by_time() {
        let early = Identifier::parse_hex("000000010000000000000000").unwrap();
        let late = Identifier::parse_hex("000000020000000000000000").unwrap();
        assert!(early < late);
    }
}
