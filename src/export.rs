// 📤 Export Layer - spreadsheet sheets (CSV) and whole-database backups
//
// Sheets are UTF-8 CSV with a byte-order mark so spreadsheet apps pick up the
// Korean text. Backups are JSON with a SHA-256 checksum over the payload.

use crate::daily::{DailyRecord, DailySheet};
use crate::db;
use crate::entities::{BankAccount, Client, Company};
use crate::estimate::{Estimate, EstimateDocument};
use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use tracing::info;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Bumped when the backup layout changes
pub const BACKUP_FORMAT_VERSION: u32 = 1;

pub const ESTIMATE_SHEET_HEADERS: [&str; 8] =
    ["공종", "품목", "규격", "단위", "수량", "단가", "공급가액", "비고"];

pub const DAILY_SHEET_HEADERS: [&str; 5] = ["카테고리", "사용내역", "단가(원)", "금액(원)", "비고"];

// ============================================================================
// FILE NAMES
// ============================================================================

/// `{date}_{name}.csv`, falling back when the name is blank
fn sheet_file_name(date: &str, name: &str, fallback: &str) -> String {
    let name = name.trim();
    let name = if name.is_empty() { fallback } else { name };
    let safe: String = name
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
        .collect();

    format!("{}_{}.csv", date, safe)
}

pub fn estimate_file_name(doc: &EstimateDocument) -> String {
    sheet_file_name(
        &doc.estimate_date.format("%Y-%m-%d").to_string(),
        &doc.client.name,
        "견적서",
    )
}

pub fn daily_file_name(sheet: &DailySheet) -> String {
    sheet_file_name(
        &sheet.date.format("%Y-%m-%d").to_string(),
        &sheet.site_name,
        "영수증기록",
    )
}

// ============================================================================
// SHEETS
// ============================================================================

fn sheet_writer() -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(UTF8_BOM.to_vec())
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| anyhow!("Failed to finish CSV sheet: {}", e))
}

/// 견적서 sheet: header block, parties, amount in words, lines, totals
pub fn estimate_sheet_csv(doc: &EstimateDocument) -> Result<Vec<u8>> {
    let mut wtr = sheet_writer();
    let company = &doc.company;
    let client = &doc.client;

    wtr.write_record(["견 적 서"])?;
    wtr.write_record([""])?;
    wtr.write_record([
        "견적번호:".to_string(),
        doc.display_number(),
        String::new(),
        String::new(),
        "견적일자:".to_string(),
        doc.estimate_date.format("%Y-%m-%d").to_string(),
    ])?;
    wtr.write_record([
        "유효기간:".to_string(),
        doc.valid_until.format("%Y-%m-%d").to_string(),
    ])?;
    wtr.write_record([""])?;

    let parties = [
        ("공급업체".to_string(), "수요업체".to_string()),
        (format!("상호: {}", company.name), format!("상호: {}", client.name)),
        (
            format!("사업자등록번호: {}", company.business_number),
            format!("사업자등록번호: {}", client.registration_label()),
        ),
        (format!("주소: {}", company.address), format!("주소: {}", client.address)),
        (format!("대표자: {}", company.ceo), format!("대표자: {}", client.display_ceo())),
        (format!("전화번호: {}", company.phone), format!("전화번호: {}", client.phone)),
    ];
    for (supplier, customer) in parties {
        wtr.write_record([supplier, String::new(), String::new(), String::new(), customer])?;
    }

    wtr.write_record([""])?;
    wtr.write_record([format!("금액: {}", doc.total_in_words())])?;
    wtr.write_record([""])?;

    wtr.write_record(ESTIMATE_SHEET_HEADERS)?;
    for item in doc.items.iter().filter(|i| i.is_filled()) {
        wtr.write_record([
            item.category.clone(),
            item.name.clone(),
            item.spec.clone(),
            item.unit_or_default().to_string(),
            item.quantity.to_string(),
            item.price.to_string(),
            item.line_amount().value().to_string(),
            item.note.clone(),
        ])?;
    }

    wtr.write_record([""])?;
    wtr.write_record(["합계"])?;
    wtr.write_record([
        "공급가액".to_string(),
        doc.totals.subtotal.value().to_string(),
        "세액".to_string(),
        doc.totals.tax.value().to_string(),
        "합계금액".to_string(),
        doc.totals.total.value().to_string(),
    ])?;

    finish(wtr)
}

/// 일일 영수증 기록 sheet
pub fn daily_sheet_csv(sheet: &DailySheet) -> Result<Vec<u8>> {
    let mut wtr = sheet_writer();

    wtr.write_record(["일일 영수증 기록 내역서"])?;
    wtr.write_record([""])?;
    wtr.write_record([
        "현장명:".to_string(),
        sheet.site_name.clone(),
        String::new(),
        "기록일자:".to_string(),
        sheet.date.format("%Y-%m-%d").to_string(),
    ])?;
    wtr.write_record([""])?;

    wtr.write_record(DAILY_SHEET_HEADERS)?;
    for item in sheet.items.iter().filter(|i| i.is_filled()) {
        wtr.write_record([
            item.category.clone(),
            item.content.clone(),
            item.rate.to_string(),
            item.amount().value().to_string(),
            item.note.clone(),
        ])?;
    }

    wtr.write_record([""])?;
    wtr.write_record([
        String::new(),
        String::new(),
        "합계".to_string(),
        sheet.total.value().to_string(),
    ])?;

    finish(wtr)
}

pub fn write_sheet(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}

// ============================================================================
// BACKUP
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackupData {
    pub companies: Vec<Company>,
    pub clients: Vec<Client>,
    pub bank_accounts: Vec<BankAccount>,
    pub estimates: Vec<Estimate>,
    pub daily_records: Vec<DailyRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Backup {
    pub format_version: u32,
    pub created_at: String,

    /// Hex SHA-256 of the canonical JSON of `data`
    pub checksum: String,

    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RestoreSummary {
    pub companies: usize,
    pub clients: usize,
    pub bank_accounts: usize,
    pub estimates: usize,
    pub daily_records: usize,
}

/// Checksum over the JSON value; object keys are sorted so it is stable
fn checksum(data: &serde_json::Value) -> Result<String> {
    let bytes = serde_json::to_vec(data)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

pub fn create_backup(conn: &Connection) -> Result<Backup> {
    let data = BackupData {
        companies: db::list_companies(conn)?,
        clients: db::list_clients(conn)?,
        bank_accounts: db::list_bank_accounts(conn)?,
        estimates: db::all_estimates(conn)?,
        daily_records: db::all_daily_records(conn)?,
    };

    let data = serde_json::to_value(&data)?;
    Ok(Backup {
        format_version: BACKUP_FORMAT_VERSION,
        created_at: Utc::now().to_rfc3339(),
        checksum: checksum(&data)?,
        data,
    })
}

pub fn write_backup(conn: &Connection, path: &Path) -> Result<Backup> {
    let backup = create_backup(conn)?;
    let json = serde_json::to_string_pretty(&backup)?;
    fs::write(path, json).with_context(|| format!("Failed to write backup {}", path.display()))?;

    info!(path = %path.display(), checksum = %backup.checksum, "backup written");
    Ok(backup)
}

pub fn read_backup(path: &Path) -> Result<Backup> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read backup {}", path.display()))?;
    serde_json::from_str(&json).context("Backup file is not valid JSON")
}

/// Replace the whole database with the backup contents, all or nothing
pub fn restore_backup(conn: &mut Connection, backup: &Backup) -> Result<RestoreSummary> {
    if backup.format_version != BACKUP_FORMAT_VERSION {
        bail!("Unsupported backup format version {}", backup.format_version);
    }

    let actual = checksum(&backup.data)?;
    if actual != backup.checksum {
        bail!("Backup checksum mismatch: expected {}, got {}", backup.checksum, actual);
    }

    let data: BackupData =
        serde_json::from_value(backup.data.clone()).context("Backup payload has the wrong shape")?;

    let tx = conn.transaction()?;
    db::clear_all(&tx)?;

    for company in &data.companies {
        db::restore_company(&tx, company)?;
    }
    for client in &data.clients {
        db::restore_client(&tx, client)?;
    }
    for account in &data.bank_accounts {
        db::restore_bank_account(&tx, account)?;
    }
    for estimate in &data.estimates {
        db::restore_estimate(&tx, estimate)?;
    }
    for record in &data.daily_records {
        db::restore_daily_record(&tx, record)?;
    }

    tx.commit()?;

    let summary = RestoreSummary {
        companies: data.companies.len(),
        clients: data.clients.len(),
        bank_accounts: data.bank_accounts.len(),
        estimates: data.estimates.len(),
        daily_records: data.daily_records.len(),
    };
    info!(?summary, "backup restored");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daily::{DailyItem, DailyRecordDraft};
    use crate::entities::{ClientInfo, CompanyInfo};
    use crate::estimate::{EstimateDraft, EstimateItem};
    use chrono::NaiveDate;

    fn document(client_name: &str) -> EstimateDocument {
        EstimateDraft {
            estimate_number: "240305-001".to_string(),
            estimate_date: NaiveDate::from_ymd_opt(2024, 3, 5),
            company: CompanyInfo::new("한빛인테리어"),
            client: ClientInfo::individual(client_name, "010-1234-5678"),
            items: vec![
                EstimateItem::new("도배", "실크벽지", 30.0, 15_000.0).with_spec_field("LG/롤"),
                EstimateItem::new("바닥", "강마루", 20.0, 45_000.0),
            ],
            ..Default::default()
        }
        .into_document(1)
        .unwrap()
    }

    fn sheet() -> DailySheet {
        DailyRecordDraft {
            date: NaiveDate::from_ymd_opt(2024, 3, 5),
            site_name: "강남/아파트".to_string(),
            items: vec![
                DailyItem::new("자재비", "타일 본드", 35_000.0),
                DailyItem::new("식대", "점심", 36_000.0).with_note("4인"),
            ],
        }
        .into_sheet()
        .unwrap()
    }

    fn read_rows(bytes: &[u8]) -> Vec<Vec<String>> {
        assert!(bytes.starts_with(UTF8_BOM));
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(&bytes[UTF8_BOM.len()..]);

        rdr.records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn test_file_names() {
        assert_eq!(estimate_file_name(&document("김철수")), "2024-03-05_김철수.csv");
        assert_eq!(daily_file_name(&sheet()), "2024-03-05_강남아파트.csv");
        assert_eq!(sheet_file_name("2024-03-05", " ", "견적서"), "2024-03-05_견적서.csv");
    }

    #[test]
    fn test_estimate_sheet_layout() {
        let rows = read_rows(&estimate_sheet_csv(&document("김철수")).unwrap());

        assert_eq!(rows[0], vec!["견 적 서"]);
        assert_eq!(rows[2][1], "240305-001");
        assert!(rows.iter().any(|r| r[0] == "금액: 백사십팔만오천원 正"));

        let header = rows
            .iter()
            .position(|r| r.len() == 8 && r[0] == "공종")
            .unwrap();
        assert_eq!(rows[header + 1], vec!["도배", "실크벽지", "LG", "롤", "30", "15000", "450000", ""]);

        let last = rows.last().unwrap();
        assert_eq!(last, &vec!["공급가액", "1350000", "세액", "135000", "합계금액", "1485000"]);
    }

    #[test]
    fn test_daily_sheet_layout() {
        let rows = read_rows(&daily_sheet_csv(&sheet()).unwrap());

        assert_eq!(rows[0], vec!["일일 영수증 기록 내역서"]);
        let header = rows.iter().position(|r| r[0] == "카테고리").unwrap();
        assert_eq!(rows[header + 2], vec!["식대", "점심", "36000", "36000", "4인"]);
        assert_eq!(rows.last().unwrap(), &vec!["", "", "합계", "71000"]);
    }

    #[test]
    fn test_backup_round_trip() {
        let mut conn = Connection::open_in_memory().unwrap();
        db::setup_database(&conn).unwrap();
        db::save_estimate(&mut conn, &document("김철수")).unwrap();
        db::save_daily_record(&conn, &sheet()).unwrap();

        let backup = create_backup(&conn).unwrap();
        assert_eq!(backup.checksum.len(), 64);

        let mut restored = Connection::open_in_memory().unwrap();
        db::setup_database(&restored).unwrap();
        let summary = restore_backup(&mut restored, &backup).unwrap();

        assert_eq!(summary.estimates, 1);
        assert_eq!(summary.daily_records, 1);
        assert_eq!(summary.companies, 1);

        let original = db::all_estimates(&conn).unwrap();
        let copy = db::all_estimates(&restored).unwrap();
        assert_eq!(original, copy);
    }

    #[test]
    fn test_restore_rejects_tampered_backup() {
        let mut conn = Connection::open_in_memory().unwrap();
        db::setup_database(&conn).unwrap();
        db::save_daily_record(&conn, &sheet()).unwrap();

        let mut backup = create_backup(&conn).unwrap();
        backup.data["daily_records"][0]["site_name"] = serde_json::json!("조작됨");

        let err = restore_backup(&mut conn, &backup).unwrap_err();
        assert!(err.to_string().contains("checksum mismatch"));

        // Nothing was touched
        assert_eq!(db::list_daily_records(&conn).unwrap()[0].site_name, "강남/아파트");
    }
}
