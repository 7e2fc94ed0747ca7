// Interior Estimate - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod format;       // Korean currency formatting (₩ grouping, 금액 in words)
pub mod contact;      // Phone / 사업자등록번호 formatting
pub mod entities;     // Companies, clients, bank accounts
pub mod estimate;     // 견적서 items, totals, numbering
pub mod daily;        // 일일 영수증 (daily receipt)
pub mod schema;       // Form validation
pub mod db;           // SQLite persistence
pub mod preview;      // Printable HTML documents
pub mod export;       // CSV sheets + JSON backup/restore
pub mod config;
pub mod logging;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use format::{
    format_grouped, format_korean_words, format_won, parse_grouped, Amount,
};
pub use entities::{
    BankAccount, BankAccountInfo, Client, ClientInfo, ClientKind, Company, CompanyInfo,
};
pub use estimate::{
    Estimate, EstimateDocument, EstimateDraft, EstimateItem, EstimateSummary, EstimateTotals,
};
pub use daily::{DailyItem, DailyRecord, DailyRecordDraft, DailySheet, DailySummary};
pub use schema::{ValidationError, ValidationResult};
pub use db::{open_database, setup_database, RecordKind};
pub use config::{Environment, Settings};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
