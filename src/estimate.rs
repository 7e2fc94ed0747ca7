// 📄 Estimate (견적서) - line items, totals and document assembly
//
// Flow:
//   EstimateDraft (form DTO) → validate → EstimateDocument (render/export/store)
//
// Totals are a single pass over the filled lines:
//   subtotal = Σ quantity × price
//   tax      = subtotal × 10% (VAT)
//   total    = subtotal + tax
// computed unrounded, then each rounded once to whole won.

use crate::entities::{BankAccountInfo, ClientInfo, CompanyInfo};
use crate::format::Amount;
use crate::schema::{self, ValidationError};
use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Korean VAT (부가가치세)
pub const VAT_RATE: f64 = 0.1;

/// Unit used when the spec field carries none
pub const DEFAULT_UNIT: &str = "EA";

/// Default validity period for a new estimate
pub const DEFAULT_VALIDITY_MONTHS: u32 = 1;

// ============================================================================
// LINE ITEM
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimateItem {
    /// 공종 (trade, e.g. 도배, 전기)
    pub category: String,

    /// 품목
    pub name: String,

    /// 규격
    pub spec: String,

    /// 단위
    pub unit: String,

    pub quantity: f64,

    /// 단가
    pub price: f64,

    /// 비고
    pub note: String,
}

impl Default for EstimateItem {
    fn default() -> Self {
        EstimateItem {
            category: String::new(),
            name: String::new(),
            spec: String::new(),
            unit: DEFAULT_UNIT.to_string(),
            quantity: 1.0,
            price: 0.0,
            note: String::new(),
        }
    }
}

impl EstimateItem {
    pub fn new(category: &str, name: &str, quantity: f64, price: f64) -> Self {
        EstimateItem {
            category: category.to_string(),
            name: name.to_string(),
            quantity,
            price,
            ..Default::default()
        }
    }

    /// Builder: set spec and unit from the combined "규격/단위" form field
    pub fn with_spec_field(mut self, field: &str) -> Self {
        let (spec, unit) = split_spec_field(field);
        self.spec = spec;
        self.unit = unit;
        self
    }

    /// Builder: add note
    pub fn with_note(mut self, note: &str) -> Self {
        self.note = note.to_string();
        self
    }

    /// quantity × price, unrounded
    pub fn line_total(&self) -> f64 {
        self.quantity * self.price
    }

    /// 공급가액 of this line in whole won
    pub fn line_amount(&self) -> Amount {
        Amount::from_rounded(self.line_total())
    }

    /// A row counts when it names something and has a positive quantity and price.
    /// Blank template rows are skipped everywhere.
    pub fn is_filled(&self) -> bool {
        !self.name.trim().is_empty() && self.quantity > 0.0 && self.price > 0.0
    }

    pub fn unit_or_default(&self) -> &str {
        if self.unit.trim().is_empty() {
            DEFAULT_UNIT
        } else {
            &self.unit
        }
    }
}

/// Split "1200x600/장" into ("1200x600", "장"); the unit defaults to EA.
pub fn split_spec_field(field: &str) -> (String, String) {
    let mut parts = field.splitn(2, '/');
    let spec = parts.next().unwrap_or("").trim().to_string();
    let unit = parts
        .next()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .unwrap_or(DEFAULT_UNIT)
        .to_string();

    (spec, unit)
}

// ============================================================================
// TOTALS
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimateTotals {
    /// 공급가액
    pub subtotal: Amount,

    /// 세액
    pub tax: Amount,

    /// 합계금액
    pub total: Amount,
}

impl EstimateTotals {
    pub fn compute(items: &[EstimateItem]) -> Self {
        Self::compute_with_rate(items, VAT_RATE)
    }

    /// Sum the filled lines; each figure is rounded once from the unrounded sum,
    /// so 합계금액 (and the 금액 words) is `round(subtotal + tax)`.
    pub fn compute_with_rate(items: &[EstimateItem], tax_rate: f64) -> Self {
        let raw_subtotal: f64 = items
            .iter()
            .filter(|item| item.is_filled())
            .map(EstimateItem::line_total)
            .sum();
        let raw_tax = raw_subtotal * tax_rate;

        EstimateTotals {
            subtotal: Amount::from_rounded(raw_subtotal),
            tax: Amount::from_rounded(raw_tax),
            total: Amount::from_rounded(raw_subtotal + raw_tax),
        }
    }
}

// ============================================================================
// NUMBERING & VALIDITY
// ============================================================================

/// `YYMMDD-NNN`: one more than the highest sequence already issued under the
/// date's prefix. Gaps left by deleted estimates are never reused.
pub fn next_estimate_number<S: AsRef<str>>(date: NaiveDate, existing: &[S]) -> String {
    let prefix = format!("{}-", date_prefix(date));
    let highest = existing
        .iter()
        .filter_map(|number| number.as_ref().strip_prefix(prefix.as_str()))
        .filter_map(|sequence| sequence.trim().parse::<u32>().ok())
        .max()
        .unwrap_or(0);

    format!("{}{:03}", prefix, highest + 1)
}

fn date_prefix(date: NaiveDate) -> String {
    format!(
        "{:02}{:02}{:02}",
        date.year().rem_euclid(100),
        date.month(),
        date.day()
    )
}

/// Estimate date plus whole months; Jan 31 + 1 month lands on the last day of February.
pub fn default_valid_until(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_add_months(Months::new(months)).unwrap_or(date)
}

/// ■ 견적조건 lines printed under every estimate
pub fn estimate_conditions(valid_until: &str) -> Vec<String> {
    vec![
        "상기 견적금액은 부가가치세가 포함된 금액입니다.".to_string(),
        format!("견적유효기간: {} 까지", valid_until),
        "납기: 계약체결 후 별도 협의".to_string(),
        "하자보수: 준공 후 1년간".to_string(),
        "기타 조건은 별도 협의합니다.".to_string(),
    ]
}

// ============================================================================
// DRAFT (form DTO)
// ============================================================================

/// Everything the estimate form collects. Dates may be blank until validated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimateDraft {
    pub estimate_number: String,

    #[serde(with = "optional_date")]
    pub estimate_date: Option<NaiveDate>,

    #[serde(with = "optional_date")]
    pub valid_until: Option<NaiveDate>,

    pub company: CompanyInfo,
    pub client: ClientInfo,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_account: Option<BankAccountInfo>,

    pub items: Vec<EstimateItem>,
}

impl EstimateDraft {
    pub fn normalized(mut self) -> Self {
        self.estimate_number = self.estimate_number.trim().to_string();
        self.company = self.company.normalized();
        self.client = self.client.normalized();
        self.bank_account = self.bank_account.filter(BankAccountInfo::is_complete);
        self
    }

    pub fn filled_items(&self) -> Vec<EstimateItem> {
        self.items.iter().filter(|i| i.is_filled()).cloned().collect()
    }

    pub fn totals(&self) -> EstimateTotals {
        EstimateTotals::compute(&self.items)
    }

    /// Validate and assemble the printable document.
    ///
    /// A blank number stays blank here; storage assigns one on save.
    pub fn into_document(self, validity_months: u32) -> Result<EstimateDocument, Vec<ValidationError>> {
        schema::validate_estimate(&self)?;

        let estimate_date = self.estimate_date.ok_or_else(|| {
            vec![ValidationError::new("estimate_date", "견적일자를 선택해주세요.", "Estimate")]
        })?;
        let valid_until = self
            .valid_until
            .unwrap_or_else(|| default_valid_until(estimate_date, validity_months));
        let items = self.filled_items();
        let totals = EstimateTotals::compute(&items);

        Ok(EstimateDocument {
            estimate_number: self.estimate_number,
            estimate_date,
            valid_until,
            company: self.company,
            client: self.client,
            bank_account: self.bank_account,
            items,
            totals,
        })
    }
}

// ============================================================================
// DOCUMENT
// ============================================================================

/// A complete, validated estimate: what gets previewed, exported and stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateDocument {
    pub estimate_number: String,
    pub estimate_date: NaiveDate,
    pub valid_until: NaiveDate,
    pub company: CompanyInfo,
    pub client: ClientInfo,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_account: Option<BankAccountInfo>,

    pub items: Vec<EstimateItem>,

    #[serde(flatten)]
    pub totals: EstimateTotals,
}

impl EstimateDocument {
    /// 금액: line with the grand total in words
    pub fn total_in_words(&self) -> String {
        self.totals.total.korean_words()
    }

    /// Number to print; documents saved without one get a date-based placeholder
    pub fn display_number(&self) -> String {
        if self.estimate_number.is_empty() {
            format!("EST-{}", date_prefix(self.estimate_date))
        } else {
            self.estimate_number.clone()
        }
    }
}

/// Stored estimate: the document plus its row identity and references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    pub id: i64,
    pub company_id: Option<i64>,
    pub client_id: Option<i64>,
    pub bank_id: Option<i64>,

    #[serde(flatten)]
    pub document: EstimateDocument,

    pub created_at: String,
}

/// Row of the estimates list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateSummary {
    pub id: i64,
    pub estimate_number: String,
    pub estimate_date: String,
    pub company_name: String,
    pub client_name: String,
    pub total_amount: Amount,
    pub created_at: String,
}

// ============================================================================
// SERDE HELPERS
// ============================================================================

/// `YYYY-MM-DD`, with "" meaning not yet chosen (form inputs send empty strings)
pub(crate) mod optional_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => s.serialize_str(&d.format(FORMAT).to_string()),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => NaiveDate::parse_from_str(s, FORMAT)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}
