// 💰 Amount Formatter - grouped digits + Korean numeral words
//
// Two renderings of the same won amount:
//   1234567   → "1,234,567"
//   1234567   → "백이십삼만사천오백육십칠원 正"
//
// Pure functions, no state. Safe to call from any thread.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Rendering of a zero amount in words
pub const ZERO_WON_WORDS: &str = "영원 正";

/// Trailing legal suffix for every non-zero amount in words
pub const LEGAL_SUFFIX: &str = "원 正";

/// Currency unit appended to grouped amounts on documents
pub const WON: &str = "원";

const DIGIT_WORDS: [&str; 10] = ["", "일", "이", "삼", "사", "오", "육", "칠", "팔", "구"];

/// Power-of-10,000 tiers, largest first.
/// 경 is only reachable above 10^16 and keeps the function total over u64.
const TIERS: [(u64, &str); 4] = [
    (10_000_000_000_000_000, "경"),
    (1_000_000_000_000, "조"),
    (100_000_000, "억"),
    (10_000, "만"),
];

/// Place markers inside one tier (values below 10,000)
const PLACES: [(u64, &str); 3] = [(1_000, "천"), (100, "백"), (10, "십")];

// ============================================================================
// AMOUNT
// ============================================================================

/// Whole-won amount. Non-negative by construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub fn new(won: u64) -> Self {
        Amount(won)
    }

    /// Round an intermediate product (quantity × price, tax) to whole won.
    ///
    /// Negative and non-finite inputs collapse to zero.
    pub fn from_rounded(value: f64) -> Self {
        // `as` saturates, and NaN.max(0.0) is 0.0
        Amount(value.round().max(0.0) as u64)
    }

    pub fn value(self) -> u64 {
        self.0
    }

    /// "1,234,567"
    pub fn grouped(self) -> String {
        group_digits(&self.0.to_string())
    }

    /// "1,234,567원"
    pub fn won(self) -> String {
        format!("{}{}", self.grouped(), WON)
    }

    /// "백이십삼만사천오백육십칠원 正"
    pub fn korean_words(self) -> String {
        format_korean_words(self.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.grouped())
    }
}

impl From<u64> for Amount {
    fn from(won: u64) -> Self {
        Amount(won)
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Amount) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        iter.fold(Amount::ZERO, |acc, a| acc + a)
    }
}

// ============================================================================
// GROUPED DECIMAL FORMAT
// ============================================================================

/// Round to the nearest integer and insert a comma every three digits.
///
/// Negative values keep a leading minus sign; NaN and infinities render "0".
pub fn format_grouped(amount: f64) -> String {
    if !amount.is_finite() {
        return "0".to_string();
    }

    let rounded = amount.round();
    let grouped = group_digits(&format!("{:.0}", rounded.abs()));

    if rounded < 0.0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Grouped amount with the won unit: "1,234,567원"
pub fn format_won(amount: f64) -> String {
    format!("{}{}", format_grouped(amount), WON)
}

fn group_digits(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    out
}

/// Parse a grouped amount back from display text ("1,234,567원", " 5000 ").
///
/// Returns None when nothing numeric is left.
pub fn parse_grouped(text: &str) -> Option<u64> {
    let cleaned: String = text
        .trim()
        .trim_end_matches(WON)
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    cleaned.parse().ok()
}

// ============================================================================
// KOREAN NUMERAL WORDS
// ============================================================================

/// Render a won amount as Korean numeral words with the legal suffix.
///
/// Each tier count goes through the same sub-10,000 routine, so a tier
/// count of exactly one keeps its "일" (units position): 100,000,000 →
/// "일억원 正". Inside a tier, a 1 in the 천/백/십 place is elided.
pub fn format_korean_words(amount: u64) -> String {
    if amount == 0 {
        return ZERO_WON_WORDS.to_string();
    }

    let mut result = String::new();
    let mut rest = amount;

    for (unit, marker) in TIERS {
        let count = rest / unit;
        rest %= unit;

        if count > 0 {
            result.push_str(&below_ten_thousand(count));
            result.push_str(marker);
        }
    }

    if rest > 0 {
        result.push_str(&below_ten_thousand(rest));
    }

    result.push_str(LEGAL_SUFFIX);
    result
}

/// Words for 1..=9999
fn below_ten_thousand(number: u64) -> String {
    debug_assert!(number < 10_000);

    let mut out = String::new();

    for (place, marker) in PLACES {
        let digit = (number / place % 10) as usize;
        if digit > 0 {
            if digit > 1 {
                out.push_str(DIGIT_WORDS[digit]);
            }
            out.push_str(marker);
        }
    }

    let units = (number % 10) as usize;
    if units > 0 {
        out.push_str(DIGIT_WORDS[units]);
    }

    out
}

// ============================================================================
// DATES
// ============================================================================

/// ko-KR long date: "2024년 3월 5일"
pub fn format_date_ko(date: NaiveDate) -> String {
    format!("{}년 {}월 {}일", date.year(), date.month(), date.day())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_renders_fixed_string() {
        assert_eq!(format_korean_words(0), "영원 正");
        assert_eq!(Amount::ZERO.korean_words(), ZERO_WON_WORDS);
    }

    #[test]
    fn test_place_elision_inside_tier() {
        assert_eq!(format_korean_words(1000), "천원 正");
        assert_eq!(format_korean_words(1100), "천백원 正");
        assert_eq!(format_korean_words(2100), "이천백원 正");
        assert_eq!(format_korean_words(1110), "천백십원 正");
        assert_eq!(format_korean_words(10), "십원 正");
    }

    #[test]
    fn test_units_digit_one_is_not_elided() {
        assert_eq!(format_korean_words(1), "일원 正");
        assert_eq!(format_korean_words(11), "십일원 正");
        assert_eq!(format_korean_words(1111), "천백십일원 正");
    }

    #[test]
    fn test_tier_count_of_one_keeps_il() {
        assert_eq!(format_korean_words(100_000_000), "일억원 正");
        assert_eq!(format_korean_words(10_000), "일만원 正");
        assert_eq!(format_korean_words(1_000_000_000_000), "일조원 正");
        // tier count 1000 → 천, not 일천
        assert_eq!(format_korean_words(10_000_000), "천만원 正");
    }

    #[test]
    fn test_mixed_tiers() {
        assert_eq!(
            format_korean_words(1_234_567),
            "백이십삼만사천오백육십칠원 正"
        );
        assert_eq!(
            format_korean_words(35_200_000),
            "삼천오백이십만원 正"
        );
        assert_eq!(
            format_korean_words(2_000_000_300_005),
            "이조삼십만오원 正"
        );
    }

    #[test]
    fn test_zero_tiers_are_omitted() {
        let words = format_korean_words(500_000_000_007);
        assert_eq!(words, "오천억칠원 正");
        assert!(!words.contains('만'));
        assert!(!words.contains('조'));
        assert!(!words.contains('영'));

        for n in [1u64, 9_999, 10_001, 100_000_001, 1_000_000_000_001, 987_654_321] {
            let words = format_korean_words(n);
            if (n / 10_000) % 10_000 == 0 {
                assert!(!words.contains('만'), "{} → {}", n, words);
            }
            if (n / 100_000_000) % 10_000 == 0 {
                assert!(!words.contains('억'), "{} → {}", n, words);
            }
            if n / 1_000_000_000_000 == 0 {
                assert!(!words.contains('조'), "{} → {}", n, words);
            }
        }
    }

    #[test]
    fn test_gyeong_tier_covers_u64() {
        assert_eq!(format_korean_words(10_000_000_000_000_000), "일경원 正");
        let max = format_korean_words(u64::MAX);
        assert!(max.starts_with("천팔백사십사경"));
        assert!(max.ends_with(LEGAL_SUFFIX));
    }

    #[test]
    fn test_format_is_pure() {
        assert_eq!(format_korean_words(4_560_000), format_korean_words(4_560_000));
        assert_eq!(format_grouped(4_560_000.0), format_grouped(4_560_000.0));
    }

    #[test]
    fn test_grouped_format() {
        assert_eq!(format_grouped(1_234_567.0), "1,234,567");
        assert_eq!(format_grouped(0.0), "0");
        assert_eq!(format_grouped(999.0), "999");
        assert_eq!(format_grouped(1000.0), "1,000");
        assert_eq!(format_grouped(100_000.0), "100,000");
    }

    #[test]
    fn test_grouped_rounds_first() {
        assert_eq!(format_grouped(1234.5), "1,235");
        assert_eq!(format_grouped(1234.49), "1,234");
        // 3 × 33,333.33
        assert_eq!(format_grouped(3.0 * 33_333.33), "100,000");
    }

    #[test]
    fn test_grouped_negative_and_non_finite() {
        assert_eq!(format_grouped(-1_500.0), "-1,500");
        assert_eq!(format_grouped(f64::NAN), "0");
        assert_eq!(format_grouped(f64::INFINITY), "0");
    }

    #[test]
    fn test_format_won() {
        assert_eq!(format_won(550_000.0), "550,000원");
        assert_eq!(Amount::new(550_000).won(), "550,000원");
    }

    #[test]
    fn test_amount_from_rounded() {
        assert_eq!(Amount::from_rounded(99.5).value(), 100);
        assert_eq!(Amount::from_rounded(-3.0), Amount::ZERO);
        assert_eq!(Amount::from_rounded(f64::NAN), Amount::ZERO);
        assert_eq!(Amount::new(1_234_567).to_string(), "1,234,567");
    }

    #[test]
    fn test_amount_sum() {
        let total: Amount = [100u64, 250, 650].into_iter().map(Amount::new).sum();
        assert_eq!(total, Amount::new(1_000));
    }

    #[test]
    fn test_parse_grouped() {
        assert_eq!(parse_grouped("1,234,567원"), Some(1_234_567));
        assert_eq!(parse_grouped(" 5000 "), Some(5000));
        assert_eq!(parse_grouped("원"), None);
        assert_eq!(parse_grouped("abc"), None);
    }

    #[test]
    fn test_format_date_ko() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(format_date_ko(date), "2024년 3월 5일");
    }
}
