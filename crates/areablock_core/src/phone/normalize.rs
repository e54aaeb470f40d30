//! Phone number normalizer.
//!
//! # Responsibility
//! - Strip formatting characters and recognize NANP national numbers.
//! - Provide area-code and E.164 integer projections.
//!
//! # Invariants
//! - A `NationalNumber` always holds exactly 10 ASCII digits.
//! - `e164()` is `country_code * 10^10 + national`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Country calling code shared by the United States and Canada.
pub const NANP_COUNTRY_CODE: u64 = 1;
/// Multiplier that shifts a country code in front of a national number.
pub const NATIONAL_NUMBER_SPAN: u64 = 10_000_000_000;
/// Count of subscriber numbers that share one area code.
pub const AREA_CODE_SPAN: u64 = 10_000_000;

const NATIONAL_NUMBER_DIGITS: usize = 10;
const AREA_CODE_DIGITS: usize = 3;

static NON_DIGIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^0-9]+").expect("valid non-digit regex"));

/// E.164-style phone number represented as an ordered integer.
pub type E164Number = u64;

/// Phone parsing errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// Input does not reduce to a 10-digit or `1`-prefixed 11-digit number.
    NotRecognized(String),
    /// Value is not a 10-digit national number.
    InvalidNumber(String),
}

impl Display for PhoneError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotRecognized(value) => {
                write!(f, "not a recognized north-american number: `{value}`")
            }
            Self::InvalidNumber(value) => {
                write!(f, "national number must have exactly 10 digits, got `{value}`")
            }
        }
    }
}

impl Error for PhoneError {}

/// Canonical 10-digit national number (no country code).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NationalNumber(String);

impl NationalNumber {
    /// Wraps an already-stripped 10-digit string.
    ///
    /// # Errors
    /// - Returns `InvalidNumber` when `digits` is not exactly 10 ASCII digits.
    pub fn from_digits(digits: impl Into<String>) -> Result<Self, PhoneError> {
        let digits = digits.into();
        if is_national_digits(&digits) {
            Ok(Self(digits))
        } else {
            Err(PhoneError::InvalidNumber(digits))
        }
    }

    /// Returns the 10 digits.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the leading 3-digit area code.
    pub fn area_code(&self) -> &str {
        &self.0[..AREA_CODE_DIGITS]
    }

    /// Returns the E.164-style integer with the NANP country code.
    pub fn e164(&self) -> E164Number {
        self.e164_with_country(NANP_COUNTRY_CODE)
    }

    /// Returns the E.164-style integer for an explicit country code.
    pub fn e164_with_country(&self, country_code: u64) -> E164Number {
        // Digits are validated on construction, so the fold cannot overflow.
        let national = self
            .0
            .bytes()
            .fold(0_u64, |acc, byte| acc * 10 + u64::from(byte - b'0'));
        country_code * NATIONAL_NUMBER_SPAN + national
    }

    /// Human-readable `(NPA) NXX-XXXX` rendering for list display.
    pub fn formatted(&self) -> String {
        format!("({}) {}-{}", &self.0[..3], &self.0[3..6], &self.0[6..])
    }
}

impl Display for NationalNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for NationalNumber {
    type Error = PhoneError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_digits(value)
    }
}

impl From<NationalNumber> for String {
    fn from(value: NationalNumber) -> Self {
        value.0
    }
}

/// Normalizes an arbitrary sender string into a national number.
///
/// - Every non-digit character is dropped.
/// - 11 digits with a leading `1` lose the country code.
/// - Exactly 10 digits are taken as-is.
///
/// # Errors
/// - Returns `NotRecognized` for every other digit count.
pub fn normalize(raw: &str) -> Result<NationalNumber, PhoneError> {
    let digits = strip_non_digits(raw);
    match digits.len() {
        11 if digits.starts_with('1') => Ok(NationalNumber(digits[1..].to_string())),
        NATIONAL_NUMBER_DIGITS => Ok(NationalNumber(digits)),
        _ => Err(PhoneError::NotRecognized(raw.to_string())),
    }
}

/// Returns the area code of a normalized national number string.
///
/// # Errors
/// - Returns `InvalidNumber` when `national` is not exactly 10 digits.
pub fn area_code_of(national: &str) -> Result<&str, PhoneError> {
    if is_national_digits(national) {
        Ok(&national[..AREA_CODE_DIGITS])
    } else {
        Err(PhoneError::InvalidNumber(national.to_string()))
    }
}

/// Converts a national number string to its E.164-style integer.
///
/// # Errors
/// - Returns `InvalidNumber` when `national` is not exactly 10 digits.
pub fn e164_of(national: &str) -> Result<E164Number, PhoneError> {
    NationalNumber::from_digits(national.to_string()).map(|number| number.e164())
}

/// First E.164 integer of the contiguous block owned by `area_code`.
pub fn area_code_base(country_code: u64, area_code: u16) -> E164Number {
    country_code * NATIONAL_NUMBER_SPAN + u64::from(area_code) * AREA_CODE_SPAN
}

fn strip_non_digits(raw: &str) -> String {
    NON_DIGIT_RE.replace_all(raw, "").into_owned()
}

fn is_national_digits(value: &str) -> bool {
    value.len() == NATIONAL_NUMBER_DIGITS && value.bytes().all(|byte| byte.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::{area_code_base, area_code_of, e164_of, normalize, NationalNumber, PhoneError};

    #[test]
    fn strips_formatting_characters() {
        let number = normalize("+1 (206) 555-1234").expect("formatted number should parse");
        assert_eq!(number.as_str(), "2065551234");
        assert_eq!(number.area_code(), "206");
    }

    #[test]
    fn eleven_digits_without_leading_one_are_rejected() {
        let err = normalize("22065551234").expect_err("wrong country prefix must fail");
        assert_eq!(err, PhoneError::NotRecognized("22065551234".to_string()));
    }

    #[test]
    fn e164_prefixes_country_code() {
        assert_eq!(e164_of("2065551234").unwrap(), 12_065_551_234);
        assert!(matches!(e164_of("206555"), Err(PhoneError::InvalidNumber(_))));
    }

    #[test]
    fn area_code_of_requires_national_number() {
        assert_eq!(area_code_of("4155550000").unwrap(), "415");
        assert!(area_code_of("41555").is_err());
    }

    #[test]
    fn area_code_base_matches_first_number_of_block() {
        let first = NationalNumber::from_digits("2060000000").unwrap();
        assert_eq!(area_code_base(1, 206), first.e164());
    }

    #[test]
    fn formatted_uses_nanp_layout() {
        let number = NationalNumber::from_digits("2065551234").unwrap();
        assert_eq!(number.formatted(), "(206) 555-1234");
    }

    #[test]
    fn unicode_digits_are_not_treated_as_digits() {
        assert!(normalize("２０６５５５１２３４").is_err());
    }
}
