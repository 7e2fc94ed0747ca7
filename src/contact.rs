// ☎️ Contact Fields - phone numbers and business registration numbers
//
// Normalizes free-form input as the user types it ("0212345678" → "02-1234-5678")
// and checks the final dashed shape before a document is issued.

use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum digits kept for a phone number
const PHONE_MAX_DIGITS: usize = 11;

/// Business registration numbers are always 10 digits (000-00-00000)
const BUSINESS_NUMBER_DIGITS: usize = 10;

/// Seoul area code uses two digits instead of three
const SEOUL_PREFIX: &str = "02";

fn digits_only(input: &str, limit: usize) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(limit)
        .collect()
}

/// Dash a phone number progressively.
///
/// - up to 3 digits: unchanged
/// - up to 7 digits: `010-1234`
/// - longer: `02-1234-5678` for Seoul, `010-1234-5678` otherwise
///
/// Digits beyond the 11th are dropped.
pub fn format_phone(input: &str) -> String {
    let digits = digits_only(input, PHONE_MAX_DIGITS);
    let len = digits.len();

    if len <= 3 {
        digits
    } else if len <= 7 {
        format!("{}-{}", &digits[..3], &digits[3..])
    } else if digits.starts_with(SEOUL_PREFIX) {
        format!("{}-{}-{}", &digits[..2], &digits[2..6], &digits[6..])
    } else {
        format!("{}-{}-{}", &digits[..3], &digits[3..7], &digits[7..])
    }
}

/// Dash a business registration number progressively: `123-45-67890`.
pub fn format_business_number(input: &str) -> String {
    let digits = digits_only(input, BUSINESS_NUMBER_DIGITS);
    let len = digits.len();

    if len <= 3 {
        digits
    } else if len <= 5 {
        format!("{}-{}", &digits[..3], &digits[3..])
    } else {
        format!("{}-{}-{}", &digits[..3], &digits[3..5], &digits[5..])
    }
}

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{2,3}-[0-9]{3,4}-[0-9]{4}$").expect("valid phone pattern"));

static BUSINESS_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{3}-[0-9]{2}-[0-9]{5}$").expect("valid business number pattern"));

/// `00-000-0000` through `000-0000-0000`
pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

/// Exactly `000-00-00000`
pub fn is_valid_business_number(number: &str) -> bool {
    BUSINESS_NUMBER_RE.is_match(number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_phone_progressive() {
        assert_eq!(format_phone(""), "");
        assert_eq!(format_phone("010"), "010");
        assert_eq!(format_phone("0101"), "010-1");
        assert_eq!(format_phone("0101234"), "010-1234");
        assert_eq!(format_phone("01012345678"), "010-1234-5678");
    }

    #[test]
    fn test_format_phone_seoul() {
        assert_eq!(format_phone("0212345678"), "02-1234-5678");
        assert_eq!(format_phone("02-123-4567"), "02-1234-567");
    }

    #[test]
    fn test_format_phone_truncates_and_strips() {
        assert_eq!(format_phone("010-1234-5678-99"), "010-1234-5678");
        assert_eq!(format_phone("(031) 123 4567"), "031-1234-567");
    }

    #[test]
    fn test_format_business_number() {
        assert_eq!(format_business_number("123"), "123");
        assert_eq!(format_business_number("12345"), "123-45");
        assert_eq!(format_business_number("1234567890"), "123-45-67890");
        assert_eq!(format_business_number("123-45-678901"), "123-45-67890");
    }

    #[test]
    fn test_phone_validation() {
        assert!(is_valid_phone("010-1234-5678"));
        assert!(is_valid_phone("02-123-4567"));
        assert!(is_valid_phone("031-1234-5678"));
        assert!(!is_valid_phone("01012345678"));
        assert!(!is_valid_phone("010-12-5678"));
        assert!(!is_valid_phone("010-1234-567a"));
        assert!(!is_valid_phone("010-1234-5678-1"));
    }

    #[test]
    fn test_business_number_validation() {
        assert!(is_valid_business_number("123-45-67890"));
        assert!(!is_valid_business_number("123-456-7890"));
        assert!(!is_valid_business_number("1234567890"));
        assert!(!is_valid_business_number(""));
        assert!(!is_valid_business_number(" 123-45-67890"));
    }

    #[test]
    fn test_validation_is_ascii_digits_only() {
        // Fullwidth and Arabic-Indic digits are not accepted
        assert!(!is_valid_phone("０１０-1234-5678"));
        assert!(!is_valid_business_number("١٢٣-45-67890"));
    }
}
