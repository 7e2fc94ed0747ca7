// 🧾 Daily Receipt Record (일일 영수증 기록) - what a site spent on one day
//
// Each line is a single receipt: a category, what it was for and the amount paid.
// The day total is the sum of the filled lines.

use crate::estimate::optional_date;
use crate::format::Amount;
use crate::schema::{self, ValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Categories offered by the receipt form
pub const CATEGORIES: [&str; 5] = ["자재비", "인건비", "장비비", "식대", "기타"];

// ============================================================================
// LINE ITEM
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyItem {
    pub category: String,

    /// 사용내역
    pub content: String,

    /// 단가 (원)
    pub rate: f64,

    /// 비고
    pub note: String,
}

impl DailyItem {
    pub fn new(category: &str, content: &str, rate: f64) -> Self {
        DailyItem {
            category: category.to_string(),
            content: content.to_string(),
            rate,
            note: String::new(),
        }
    }

    pub fn with_note(mut self, note: &str) -> Self {
        self.note = note.to_string();
        self
    }

    /// 금액: one receipt is paid once, so the amount is the rate itself
    pub fn amount(&self) -> Amount {
        Amount::from_rounded(self.rate)
    }

    pub fn is_filled(&self) -> bool {
        !self.content.trim().is_empty() && self.rate > 0.0
    }
}

// ============================================================================
// DRAFT (form DTO)
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyRecordDraft {
    /// 시공일자
    #[serde(alias = "daily_date", with = "optional_date")]
    pub date: Option<NaiveDate>,

    /// 현장명
    pub site_name: String,

    pub items: Vec<DailyItem>,
}

impl DailyRecordDraft {
    pub fn filled_items(&self) -> Vec<DailyItem> {
        self.items.iter().filter(|i| i.is_filled()).cloned().collect()
    }

    /// 당일 총 사용비
    pub fn total(&self) -> Amount {
        self.items
            .iter()
            .filter(|i| i.is_filled())
            .map(DailyItem::amount)
            .sum()
    }

    pub fn into_sheet(self) -> Result<DailySheet, Vec<ValidationError>> {
        schema::validate_daily(&self)?;

        let date = self.date.ok_or_else(|| {
            vec![ValidationError::new("date", "시공일자를 선택해주세요.", "DailyRecord")]
        })?;
        let items = self.filled_items();
        let total = items.iter().map(DailyItem::amount).sum();

        Ok(DailySheet {
            date,
            site_name: self.site_name.trim().to_string(),
            items,
            total,
        })
    }
}

// ============================================================================
// SHEET (validated) & STORED RECORD
// ============================================================================

/// JSON keys match the list rows (`daily_date`, `total_amount`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySheet {
    #[serde(rename = "daily_date", alias = "date")]
    pub date: NaiveDate,

    pub site_name: String,
    pub items: Vec<DailyItem>,

    #[serde(rename = "total_amount", alias = "total")]
    pub total: Amount,
}

impl DailySheet {
    pub fn total_in_words(&self) -> String {
        self.total.korean_words()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub id: i64,

    #[serde(flatten)]
    pub sheet: DailySheet,

    pub created_at: String,
}

/// Row of the daily records list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub id: i64,

    #[serde(rename = "daily_date")]
    pub date: String,

    pub site_name: String,

    #[serde(rename = "total_amount")]
    pub total: Amount,

    pub item_count: usize,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DailyRecordDraft {
        DailyRecordDraft {
            date: NaiveDate::from_ymd_opt(2024, 3, 5),
            site_name: " 강남 아파트 301호 ".to_string(),
            items: vec![
                DailyItem::new("자재비", "타일 본드", 35_000.0),
                DailyItem::new("식대", "점심 (4인)", 36_000.0).with_note("현장 인부"),
                DailyItem::new("기타", "", 5_000.0),
                DailyItem::new("장비비", "사다리 대여", 0.0),
            ],
        }
    }

    #[test]
    fn test_amount_is_rate() {
        assert_eq!(DailyItem::new("자재비", "못", 1_234.6).amount(), Amount::new(1_235));
    }

    #[test]
    fn test_total_skips_unfilled_lines() {
        assert_eq!(sample().total(), Amount::new(71_000));
    }

    #[test]
    fn test_into_sheet() {
        let sheet = sample().into_sheet().unwrap();

        assert_eq!(sheet.site_name, "강남 아파트 301호");
        assert_eq!(sheet.items.len(), 2);
        assert_eq!(sheet.total, Amount::new(71_000));
        assert_eq!(sheet.total_in_words(), "칠만천원 正");
    }

    #[test]
    fn test_into_sheet_requires_site() {
        let mut draft = sample();
        draft.site_name = "  ".to_string();

        let errors = draft.into_sheet().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "site_name");
    }

    #[test]
    fn test_draft_accepts_daily_date_alias() {
        let json = r#"{"daily_date":"2024-03-05","site_name":"현장","items":[{"content":"장갑","rate":3000}]}"#;
        let draft: DailyRecordDraft = serde_json::from_str(json).unwrap();

        assert_eq!(draft.date, NaiveDate::from_ymd_opt(2024, 3, 5));
        assert_eq!(draft.items[0].category, "");
        assert_eq!(draft.total(), Amount::new(3_000));
    }

    #[test]
    fn test_record_json_uses_list_keys() {
        let record = DailyRecord {
            id: 7,
            sheet: sample().into_sheet().unwrap(),
            created_at: "2024-03-05 09:00:00".to_string(),
        };
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["daily_date"], "2024-03-05");
        assert_eq!(value["total_amount"], 71_000);
        assert!(value.get("date").is_none());
        assert!(value.get("total").is_none());

        let back: DailyRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }
}
