// 🏦 Bank Account Entity - where the client pays (입금계좌)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BankAccountInfo {
    pub bank_name: String,
    pub account_number: String,
    pub account_holder: String,
}

impl BankAccountInfo {
    pub fn new(
        bank_name: impl Into<String>,
        account_number: impl Into<String>,
        account_holder: impl Into<String>,
    ) -> Self {
        BankAccountInfo {
            bank_name: bank_name.into(),
            account_number: account_number.into(),
            account_holder: account_holder.into(),
        }
    }

    /// All three fields are required for a stored account
    pub fn is_complete(&self) -> bool {
        !self.bank_name.trim().is_empty()
            && !self.account_number.trim().is_empty()
            && !self.account_holder.trim().is_empty()
    }

    /// One-line payment instruction for documents
    pub fn summary(&self) -> String {
        format!(
            "은행: {} / 계좌: {} / 예금주: {}",
            self.bank_name, self.account_number, self.account_holder
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankAccount {
    pub id: i64,

    #[serde(flatten)]
    pub info: BankAccountInfo,

    pub created_at: String,
}
