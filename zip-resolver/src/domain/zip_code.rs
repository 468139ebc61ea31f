//! Swiss postal code type.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an invalid zip code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid zip code: {reason}")]
pub struct InvalidZipCode {
    reason: &'static str,
}

/// A Swiss postal code (PLZ): four decimal digits, 1000 to 9999.
///
/// Any `ZipCode` value is valid by construction.
///
/// # Examples
///
/// ```
/// use zip_resolver::domain::ZipCode;
///
/// let zurich = ZipCode::parse("8001").unwrap();
/// assert_eq!(zurich.get(), 8001);
///
/// // Leading zeros are not part of the Swiss numbering scheme
/// assert!(ZipCode::parse("0800").is_err());
///
/// // Wrong length is rejected
/// assert!(ZipCode::parse("800").is_err());
/// assert!(ZipCode::parse("80011").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct ZipCode(u16);

impl ZipCode {
    /// Parse a zip code from its textual form.
    ///
    /// Surrounding whitespace is ignored; the rest must be exactly four
    /// ASCII digits without a leading zero.
    pub fn parse(s: &str) -> Result<Self, InvalidZipCode> {
        let s = s.trim();

        if s.len() != 4 {
            return Err(InvalidZipCode {
                reason: "must be exactly 4 digits",
            });
        }

        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidZipCode {
                reason: "must contain only digits 0-9",
            });
        }

        // Four ASCII digits always fit into u32.
        let value: u32 = s.parse().map_err(|_| InvalidZipCode {
            reason: "must contain only digits 0-9",
        })?;
        Self::try_from(value)
    }

    /// Returns the numeric value.
    pub fn get(self) -> u16 {
        self.0
    }
}

impl TryFrom<u32> for ZipCode {
    type Error = InvalidZipCode;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if !(1000..=9999).contains(&value) {
            return Err(InvalidZipCode {
                reason: "must be between 1000 and 9999",
            });
        }
        Ok(ZipCode(value as u16))
    }
}

impl From<ZipCode> for u32 {
    fn from(zip: ZipCode) -> Self {
        u32::from(zip.0)
    }
}

impl fmt::Debug for ZipCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ZipCode({})", self.0)
    }
}

impl fmt::Display for ZipCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_zip_codes() {
        assert!(ZipCode::parse("1000").is_ok());
        assert!(ZipCode::parse("3000").is_ok());
        assert!(ZipCode::parse("8001").is_ok());
        assert!(ZipCode::parse("9999").is_ok());
    }

    #[test]
    fn parse_trims_whitespace() {
        assert_eq!(ZipCode::parse(" 8001 ").unwrap().get(), 8001);
    }

    #[test]
    fn reject_wrong_length() {
        assert!(ZipCode::parse("").is_err());
        assert!(ZipCode::parse("800").is_err());
        assert!(ZipCode::parse("80011").is_err());
    }

    #[test]
    fn reject_non_digits() {
        assert!(ZipCode::parse("80a1").is_err());
        assert!(ZipCode::parse("-800").is_err());
        assert!(ZipCode::parse("8 01").is_err());
    }

    #[test]
    fn reject_leading_zero() {
        assert!(ZipCode::parse("0999").is_err());
        assert!(ZipCode::try_from(999).is_err());
    }

    #[test]
    fn try_from_bounds() {
        assert!(ZipCode::try_from(1000).is_ok());
        assert!(ZipCode::try_from(9999).is_ok());
        assert!(ZipCode::try_from(10000).is_err());
        assert!(ZipCode::try_from(0).is_err());
    }

    #[test]
    fn display_and_debug() {
        let zip = ZipCode::parse("3011").unwrap();
        assert_eq!(format!("{}", zip), "3011");
        assert_eq!(format!("{:?}", zip), "ZipCode(3011)");
    }

    #[test]
    fn serde_as_number() {
        let zip = ZipCode::parse("8001").unwrap();
        assert_eq!(serde_json::to_string(&zip).unwrap(), "8001");
        let back: ZipCode = serde_json::from_str("8001").unwrap();
        assert_eq!(back, zip);
        assert!(serde_json::from_str::<ZipCode>("12").is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Every number in range parses back to itself
        #[test]
        fn in_range_roundtrip(n in 1000u32..=9999) {
            let zip = ZipCode::parse(&n.to_string()).unwrap();
            prop_assert_eq!(u32::from(zip), n);
        }

        /// Numbers outside the range are always rejected
        #[test]
        fn out_of_range_rejected(n in prop_oneof![0u32..1000, 10000u32..1_000_000]) {
            prop_assert!(ZipCode::try_from(n).is_err());
        }

        /// Strings containing a non-digit are rejected
        #[test]
        fn non_digit_rejected(s in "[0-9A-Za-z]{4}".prop_filter("has non-digit", |s| s.chars().any(|c| !c.is_ascii_digit()))) {
            prop_assert!(ZipCode::parse(&s).is_err());
        }
    }
}
