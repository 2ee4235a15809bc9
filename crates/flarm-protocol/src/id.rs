//! FLARM device identifiers
//!
//! Traffic sentences carry the target ID as six hex digits, optionally
//! followed by `!` and a display name (`DD8F12!D-KXYZ`). Some trackers
//! prepend an address-type nibble (`2DD8F12`), so only the last six
//! digits are significant.

use std::fmt;

use crate::error::ParseError;

/// Number of hex digits in a 24-bit address
const ADDRESS_DIGITS: usize = 6;

/// A parsed device identifier
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlarmId {
    /// Normalized hex ID (at most six digits, as received)
    pub id: String,
    /// 24-bit address decoded from `id`
    pub address: u32,
    /// Display name from the `ID!TAIL` syntax
    pub tail: Option<String>,
}

impl FlarmId {
    /// Create an ID for a known 24-bit address
    pub fn new(address: u32, tail: Option<String>) -> Self {
        let address = address & 0xFF_FFFF;
        Self {
            id: format!("{:06X}", address),
            address,
            tail: tail.filter(|t| !t.is_empty()),
        }
    }

    /// Parse an ID field
    ///
    /// Tails of the form `XXX_...` (e.g. `OGN_AAAAAA`, `FLR_BBBBBB`) are
    /// device-ID echoes rather than registrations and are dropped.
    pub fn parse(field: &str) -> Result<Self, ParseError> {
        let mut parts = field.trim().splitn(2, '!');
        let raw_id = parts.next().unwrap_or("");
        let tail = parts.next();

        if raw_id.is_empty() || !raw_id.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ParseError::InvalidId(field.to_string()));
        }
        let id = &raw_id[raw_id.len().saturating_sub(ADDRESS_DIGITS)..];
        let address = u32::from_str_radix(id, 16)
            .map_err(|_| ParseError::InvalidId(field.to_string()))?;

        let tail = tail
            .filter(|t| !t.is_empty())
            .filter(|t| !(t.len() > 4 && t.as_bytes()[3] == b'_'))
            .map(str::to_string);

        Ok(Self {
            id: id.to_uppercase(),
            address,
            tail,
        })
    }
}

/// The all-zero address, `000000` with no tail
impl Default for FlarmId {
    fn default() -> Self {
        Self::new(0, None)
    }
}

impl fmt::Display for FlarmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:06X}", self.address & 0xFF_FFFF)?;
        if let Some(tail) = &self.tail {
            write!(f, "!{}", tail)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_zero_address() {
        let id = FlarmId::default();
        assert_eq!(id.address, 0);
        assert_eq!(id.id, "000000");
        assert_eq!(id.tail, None);
        assert_eq!(id, FlarmId::parse("000000").unwrap());
    }

    #[test]
    fn test_plain_id() {
        let id = FlarmId::parse("A4F2EE").unwrap();
        assert_eq!(id.address, 0xA4F2EE);
        assert_eq!(id.id, "A4F2EE");
        assert_eq!(id.tail, None);
    }

    #[test]
    fn test_id_with_tail() {
        let id = FlarmId::parse("DD8F12!D-KXYZ").unwrap();
        assert_eq!(id.address, 0xDD8F12);
        assert_eq!(id.tail.as_deref(), Some("D-KXYZ"));
        assert_eq!(id.to_string(), "DD8F12!D-KXYZ");
    }

    #[test]
    fn test_type_nibble_is_stripped() {
        let id = FlarmId::parse("2DD8F12").unwrap();
        assert_eq!(id.id, "DD8F12");
        assert_eq!(id.address, 0xDD8F12);
    }

    #[test]
    fn test_device_echo_tail_is_dropped() {
        let id = FlarmId::parse("DD8F12!FLR_DD8F12").unwrap();
        assert_eq!(id.tail, None);
        // Short tails with an underscore are real names
        let id = FlarmId::parse("DD8F12!AB_C").unwrap();
        assert_eq!(id.tail.as_deref(), Some("AB_C"));
    }

    #[test]
    fn test_short_and_lowercase_ids() {
        let id = FlarmId::parse("abc").unwrap();
        assert_eq!(id.address, 0xABC);
        assert_eq!(id.id, "ABC");
        assert_eq!(id.to_string(), "000ABC");
    }

    #[test]
    fn test_invalid_ids() {
        assert!(FlarmId::parse("").is_err());
        assert!(FlarmId::parse("!TAIL").is_err());
        assert!(FlarmId::parse("XYZ123").is_err());
    }

    #[test]
    fn test_new_masks_address() {
        let id = FlarmId::new(0x1A4F2EE, Some(String::new()));
        assert_eq!(id.address, 0xA4F2EE);
        assert_eq!(id.tail, None);
        assert_eq!(id.to_string(), "A4F2EE");
    }
}
