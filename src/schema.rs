// 📐 Shape Layer - Draft Validation
// Checks form drafts before a document is issued or stored

use crate::contact::{is_valid_business_number, is_valid_phone};
use crate::daily::DailyRecordDraft;
use crate::entities::{BankAccountInfo, ClientInfo, ClientKind, CompanyInfo};
use crate::estimate::EstimateDraft;
use serde::Serialize;

// ============================================================================
// VALIDATION RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub context: String,
}

impl ValidationError {
    pub fn new(field: &str, message: &str, context: &str) -> Self {
        ValidationError {
            field: field.to_string(),
            message: message.to_string(),
            context: context.to_string(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.context, self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Joins messages for a single user-facing line
pub fn describe(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// COLLECTOR
// ============================================================================

struct Checks {
    context: &'static str,
    errors: Vec<ValidationError>,
}

impl Checks {
    fn new(context: &'static str) -> Self {
        Checks {
            context,
            errors: Vec::new(),
        }
    }

    fn require(&mut self, field: &str, value: &str, message: &str) {
        if value.trim().is_empty() {
            self.fail(field, message);
        }
    }

    /// Format check only applies to fields that were filled in
    fn format_if_present(&mut self, field: &str, value: &str, valid: fn(&str) -> bool, message: &str) {
        if !value.is_empty() && !valid(value) {
            self.fail(field, message);
        }
    }

    fn fail(&mut self, field: &str, message: &str) {
        self.errors
            .push(ValidationError::new(field, message, self.context));
    }

    fn finish(self) -> ValidationResult {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

// ============================================================================
// DOCUMENTS
// ============================================================================

pub fn validate_estimate(draft: &EstimateDraft) -> ValidationResult {
    let mut checks = Checks::new("Estimate");

    checks.require("company.name", &draft.company.name, "공급업체 상호명을 입력해주세요.");
    checks.require("client.name", &draft.client.name, "고객명을 입력해주세요.");
    checks.require("client.phone", &draft.client.phone, "고객 전화번호를 입력해주세요.");

    if draft.estimate_date.is_none() {
        checks.fail("estimate_date", "견적일자를 선택해주세요.");
    }

    checks.format_if_present(
        "company.business_number",
        &draft.company.business_number,
        is_valid_business_number,
        "공급업체 등록번호 형식이 올바르지 않습니다. (000-00-00000)",
    );

    if draft.client.kind == ClientKind::Business {
        checks.format_if_present(
            "client.business_number",
            &draft.client.business_number,
            is_valid_business_number,
            "수요업체 등록번호 형식이 올바르지 않습니다. (000-00-00000)",
        );
    }

    checks.format_if_present(
        "company.phone",
        &draft.company.phone,
        is_valid_phone,
        "공급업체 전화번호 형식이 올바르지 않습니다. (000-0000-0000)",
    );
    checks.format_if_present(
        "client.phone",
        &draft.client.phone,
        is_valid_phone,
        "고객 전화번호 형식이 올바르지 않습니다. (000-0000-0000)",
    );

    if !draft.items.iter().any(|item| item.is_filled()) {
        checks.fail("items", "견적 항목을 하나 이상 입력해주세요.");
    }

    checks.finish()
}

pub fn validate_daily(draft: &DailyRecordDraft) -> ValidationResult {
    let mut checks = Checks::new("DailyRecord");

    if draft.date.is_none() {
        checks.fail("date", "시공일자를 선택해주세요.");
    }

    checks.require("site_name", &draft.site_name, "현장명을 입력해주세요.");

    if !draft.items.iter().any(|item| item.is_filled()) {
        checks.fail("items", "사용 내역을 하나 이상 입력해주세요.");
    }

    checks.finish()
}

// ============================================================================
// DIRECTORY ENTRIES
// ============================================================================

pub fn validate_company(company: &CompanyInfo) -> ValidationResult {
    let mut checks = Checks::new("Company");

    checks.require("name", &company.name, "상호명을 입력해주세요.");
    checks.format_if_present(
        "business_number",
        &company.business_number,
        is_valid_business_number,
        "등록번호 형식이 올바르지 않습니다. (000-00-00000)",
    );
    checks.format_if_present(
        "phone",
        &company.phone,
        is_valid_phone,
        "전화번호 형식이 올바르지 않습니다. (000-0000-0000)",
    );

    checks.finish()
}

pub fn validate_client(client: &ClientInfo) -> ValidationResult {
    let mut checks = Checks::new("Client");

    checks.require("name", &client.name, "고객명을 입력해주세요.");
    if client.kind == ClientKind::Business {
        checks.format_if_present(
            "business_number",
            &client.business_number,
            is_valid_business_number,
            "등록번호 형식이 올바르지 않습니다. (000-00-00000)",
        );
    }
    checks.format_if_present(
        "phone",
        &client.phone,
        is_valid_phone,
        "전화번호 형식이 올바르지 않습니다. (000-0000-0000)",
    );

    checks.finish()
}

pub fn validate_bank_account(account: &BankAccountInfo) -> ValidationResult {
    let mut checks = Checks::new("BankAccount");

    if !account.is_complete() {
        checks.fail("bank_account", "은행명, 계좌번호, 예금주를 모두 입력해주세요.");
    }

    checks.finish()
}
