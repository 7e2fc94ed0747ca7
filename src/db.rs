// 🗄️ Storage Layer - SQLite persistence for the directory, estimates and receipts
//
// Tables:
//   companies, clients, bank_accounts   reference directory
//   estimates                           header + totals + JSON snapshots
//   estimate_items                      one row per line, cascades with its estimate
//   daily_records                       receipts, items kept as JSON

use crate::daily::{DailyItem, DailyRecord, DailySheet, DailySummary};
use crate::entities::{
    BankAccount, BankAccountInfo, Client, ClientInfo, ClientKind, Company, CompanyInfo,
};
use crate::estimate::{
    next_estimate_number, Estimate, EstimateDocument, EstimateItem, EstimateSummary,
    EstimateTotals,
};
use crate::format::Amount;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Open (or create) the database file and make sure the schema exists
pub fn open_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database at {}", path.display()))?;
    setup_database(&conn)?;
    info!(path = %path.display(), "database ready");
    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    // ==========================================================================
    // Directory tables
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS companies (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            business_number TEXT NOT NULL DEFAULT '',
            address TEXT NOT NULL DEFAULT '',
            ceo TEXT NOT NULL DEFAULT '',
            business_type TEXT NOT NULL DEFAULT '',
            business_item TEXT NOT NULL DEFAULT '',
            phone TEXT NOT NULL DEFAULT '',
            fax TEXT NOT NULL DEFAULT '',
            manager TEXT NOT NULL DEFAULT '',
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS clients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            kind TEXT NOT NULL DEFAULT 'business',
            name TEXT NOT NULL,
            business_number TEXT NOT NULL DEFAULT '',
            address TEXT NOT NULL DEFAULT '',
            ceo TEXT NOT NULL DEFAULT '',
            phone TEXT NOT NULL DEFAULT '',
            manager TEXT NOT NULL DEFAULT '',
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS bank_accounts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            bank_name TEXT NOT NULL,
            account_number TEXT NOT NULL,
            account_holder TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // ==========================================================================
    // Documents
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS estimates (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            estimate_number TEXT NOT NULL,
            estimate_date TEXT NOT NULL,
            valid_until TEXT NOT NULL,
            company_id INTEGER REFERENCES companies(id) ON DELETE SET NULL,
            client_id INTEGER REFERENCES clients(id) ON DELETE SET NULL,
            bank_id INTEGER REFERENCES bank_accounts(id) ON DELETE SET NULL,
            subtotal INTEGER NOT NULL,
            tax INTEGER NOT NULL,
            total INTEGER NOT NULL,
            parties TEXT NOT NULL,
            items TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS estimate_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            estimate_id INTEGER NOT NULL REFERENCES estimates(id) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            category TEXT NOT NULL DEFAULT '',
            name TEXT NOT NULL,
            spec TEXT NOT NULL DEFAULT '',
            unit TEXT NOT NULL DEFAULT 'EA',
            quantity REAL NOT NULL,
            price REAL NOT NULL,
            amount INTEGER NOT NULL,
            note TEXT NOT NULL DEFAULT ''
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS daily_records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            daily_date TEXT NOT NULL,
            site_name TEXT NOT NULL,
            items TEXT NOT NULL,
            total INTEGER NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_estimates_number ON estimates(estimate_number)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_estimate_items_estimate ON estimate_items(estimate_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_daily_records_date ON daily_records(daily_date)",
        [],
    )?;

    Ok(())
}

/// Amounts are stored as INTEGER; realistic won values fit i64 comfortably
fn to_sql_amount(amount: Amount) -> i64 {
    i64::try_from(amount.value()).unwrap_or(i64::MAX)
}

fn from_sql_amount(value: i64) -> Amount {
    Amount::new(value.max(0) as u64)
}

fn parse_date(value: &str, column: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .with_context(|| format!("Invalid {} in database: {:?}", column, value))
}

// ============================================================================
// COMPANIES
// ============================================================================

const COMPANY_COLUMNS: &str = "id, name, business_number, address, ceo, business_type,
                               business_item, phone, fax, manager, created_at";

fn company_from_row(row: &Row) -> rusqlite::Result<Company> {
    Ok(Company {
        id: row.get(0)?,
        info: CompanyInfo {
            name: row.get(1)?,
            business_number: row.get(2)?,
            address: row.get(3)?,
            ceo: row.get(4)?,
            business_type: row.get(5)?,
            business_item: row.get(6)?,
            phone: row.get(7)?,
            fax: row.get(8)?,
            manager: row.get(9)?,
        },
        created_at: row.get(10)?,
    })
}

pub fn insert_company(conn: &Connection, info: &CompanyInfo) -> Result<i64> {
    conn.execute(
        "INSERT INTO companies (name, business_number, address, ceo, business_type,
                                business_item, phone, fax, manager)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            info.name,
            info.business_number,
            info.address,
            info.ceo,
            info.business_type,
            info.business_item,
            info.phone,
            info.fax,
            info.manager,
        ],
    )
    .context("Failed to insert company")?;

    let id = conn.last_insert_rowid();
    debug!(id, name = %info.name, "company inserted");
    Ok(id)
}

/// Suppliers are reused when the name and registration number match
pub fn find_or_insert_company(conn: &Connection, info: &CompanyInfo) -> Result<i64> {
    let existing = conn
        .query_row(
            "SELECT id FROM companies WHERE name = ?1 AND business_number = ?2
             ORDER BY id DESC LIMIT 1",
            params![info.name, info.business_number],
            |row| row.get(0),
        )
        .optional()?;

    match existing {
        Some(id) => Ok(id),
        None => insert_company(conn, info),
    }
}

pub fn list_companies(conn: &Connection) -> Result<Vec<Company>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM companies ORDER BY created_at DESC, id DESC",
        COMPANY_COLUMNS
    ))?;

    let companies = stmt
        .query_map([], company_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(companies)
}

pub fn get_company(conn: &Connection, id: i64) -> Result<Option<Company>> {
    let company = conn
        .query_row(
            &format!("SELECT {} FROM companies WHERE id = ?1", COMPANY_COLUMNS),
            [id],
            company_from_row,
        )
        .optional()?;

    Ok(company)
}

pub fn delete_company(conn: &Connection, id: i64) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM companies WHERE id = ?1", [id])?;
    Ok(deleted > 0)
}

// ============================================================================
// CLIENTS
// ============================================================================

const CLIENT_COLUMNS: &str = "id, kind, name, business_number, address, ceo, phone, manager, created_at";

fn client_from_row(row: &Row) -> rusqlite::Result<Client> {
    let kind: String = row.get(1)?;

    Ok(Client {
        id: row.get(0)?,
        info: ClientInfo {
            kind: ClientKind::parse(&kind),
            name: row.get(2)?,
            business_number: row.get(3)?,
            address: row.get(4)?,
            ceo: row.get(5)?,
            phone: row.get(6)?,
            manager: row.get(7)?,
        },
        created_at: row.get(8)?,
    })
}

pub fn insert_client(conn: &Connection, info: &ClientInfo) -> Result<i64> {
    conn.execute(
        "INSERT INTO clients (kind, name, business_number, address, ceo, phone, manager)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            info.kind.as_str(),
            info.name,
            info.business_number,
            info.address,
            info.ceo,
            info.phone,
            info.manager,
        ],
    )
    .context("Failed to insert client")?;

    let id = conn.last_insert_rowid();
    debug!(id, name = %info.name, kind = info.kind.as_str(), "client inserted");
    Ok(id)
}

/// Customers are reused when kind, name and phone match
pub fn find_or_insert_client(conn: &Connection, info: &ClientInfo) -> Result<i64> {
    let existing = conn
        .query_row(
            "SELECT id FROM clients WHERE kind = ?1 AND name = ?2 AND phone = ?3
             ORDER BY id DESC LIMIT 1",
            params![info.kind.as_str(), info.name, info.phone],
            |row| row.get(0),
        )
        .optional()?;

    match existing {
        Some(id) => Ok(id),
        None => insert_client(conn, info),
    }
}

pub fn list_clients(conn: &Connection) -> Result<Vec<Client>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM clients ORDER BY created_at DESC, id DESC",
        CLIENT_COLUMNS
    ))?;

    let clients = stmt
        .query_map([], client_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(clients)
}

pub fn get_client(conn: &Connection, id: i64) -> Result<Option<Client>> {
    let client = conn
        .query_row(
            &format!("SELECT {} FROM clients WHERE id = ?1", CLIENT_COLUMNS),
            [id],
            client_from_row,
        )
        .optional()?;

    Ok(client)
}

pub fn delete_client(conn: &Connection, id: i64) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM clients WHERE id = ?1", [id])?;
    Ok(deleted > 0)
}

// ============================================================================
// BANK ACCOUNTS
// ============================================================================

const BANK_COLUMNS: &str = "id, bank_name, account_number, account_holder, created_at";

fn bank_account_from_row(row: &Row) -> rusqlite::Result<BankAccount> {
    Ok(BankAccount {
        id: row.get(0)?,
        info: BankAccountInfo {
            bank_name: row.get(1)?,
            account_number: row.get(2)?,
            account_holder: row.get(3)?,
        },
        created_at: row.get(4)?,
    })
}

pub fn insert_bank_account(conn: &Connection, info: &BankAccountInfo) -> Result<i64> {
    conn.execute(
        "INSERT INTO bank_accounts (bank_name, account_number, account_holder)
         VALUES (?1, ?2, ?3)",
        params![info.bank_name, info.account_number, info.account_holder],
    )
    .context("Failed to insert bank account")?;

    Ok(conn.last_insert_rowid())
}

pub fn find_or_insert_bank_account(conn: &Connection, info: &BankAccountInfo) -> Result<i64> {
    let existing = conn
        .query_row(
            "SELECT id FROM bank_accounts
             WHERE bank_name = ?1 AND account_number = ?2 AND account_holder = ?3
             ORDER BY id DESC LIMIT 1",
            params![info.bank_name, info.account_number, info.account_holder],
            |row| row.get(0),
        )
        .optional()?;

    match existing {
        Some(id) => Ok(id),
        None => insert_bank_account(conn, info),
    }
}

pub fn list_bank_accounts(conn: &Connection) -> Result<Vec<BankAccount>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM bank_accounts ORDER BY created_at DESC, id DESC",
        BANK_COLUMNS
    ))?;

    let accounts = stmt
        .query_map([], bank_account_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(accounts)
}

pub fn get_bank_account(conn: &Connection, id: i64) -> Result<Option<BankAccount>> {
    let account = conn
        .query_row(
            &format!("SELECT {} FROM bank_accounts WHERE id = ?1", BANK_COLUMNS),
            [id],
            bank_account_from_row,
        )
        .optional()?;

    Ok(account)
}

pub fn delete_bank_account(conn: &Connection, id: i64) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM bank_accounts WHERE id = ?1", [id])?;
    Ok(deleted > 0)
}

// ============================================================================
// ESTIMATES
// ============================================================================

/// Parties as they were when the estimate was issued.
/// Directory rows may change or disappear later; the document must not.
#[derive(Debug, Serialize, Deserialize)]
struct Parties {
    company: CompanyInfo,
    client: ClientInfo,

    #[serde(default)]
    bank_account: Option<BankAccountInfo>,
}

/// Issued numbers, used to pick the next `YYMMDD-NNN`
pub fn estimate_numbers(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT estimate_number FROM estimates")?;
    let numbers = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;

    Ok(numbers)
}

pub fn next_number_for(conn: &Connection, date: NaiveDate) -> Result<String> {
    let numbers = estimate_numbers(conn)?;
    Ok(next_estimate_number(date, &numbers))
}

/// Store a validated estimate in one transaction.
///
/// The supplier and customer are found or added to the directory, totals are
/// recomputed from the lines and a blank number is assigned from the date.
pub fn save_estimate(conn: &mut Connection, document: &EstimateDocument) -> Result<i64> {
    let tx = conn.transaction()?;

    let company_id = find_or_insert_company(&tx, &document.company)?;
    let client_id = find_or_insert_client(&tx, &document.client)?;
    let bank_id = match &document.bank_account {
        Some(account) if account.is_complete() => Some(find_or_insert_bank_account(&tx, account)?),
        _ => None,
    };

    let estimate_number = if document.estimate_number.is_empty() {
        next_number_for(&tx, document.estimate_date)?
    } else {
        document.estimate_number.clone()
    };

    let totals = EstimateTotals::compute(&document.items);
    let parties = serde_json::to_string(&Parties {
        company: document.company.clone(),
        client: document.client.clone(),
        bank_account: document.bank_account.clone(),
    })?;
    let items_json = serde_json::to_string(&document.items)?;

    tx.execute(
        "INSERT INTO estimates (estimate_number, estimate_date, valid_until, company_id,
                                client_id, bank_id, subtotal, tax, total, parties, items)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            estimate_number,
            document.estimate_date.format(DATE_FORMAT).to_string(),
            document.valid_until.format(DATE_FORMAT).to_string(),
            company_id,
            client_id,
            bank_id,
            to_sql_amount(totals.subtotal),
            to_sql_amount(totals.tax),
            to_sql_amount(totals.total),
            parties,
            items_json,
        ],
    )
    .context("Failed to insert estimate")?;
    let estimate_id = tx.last_insert_rowid();

    insert_estimate_items(&tx, estimate_id, &document.items)?;

    tx.commit()?;

    info!(
        id = estimate_id,
        number = %estimate_number,
        total = totals.total.value(),
        "estimate saved"
    );
    Ok(estimate_id)
}

fn insert_estimate_items(conn: &Connection, estimate_id: i64, items: &[EstimateItem]) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO estimate_items (estimate_id, position, category, name, spec, unit,
                                     quantity, price, amount, note)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    )?;

    for (position, item) in items.iter().enumerate() {
        stmt.execute(params![
            estimate_id,
            position as i64,
            item.category,
            item.name,
            item.spec,
            item.unit_or_default(),
            item.quantity,
            item.price,
            to_sql_amount(item.line_amount()),
            item.note,
        ])?;
    }

    Ok(())
}

pub fn list_estimates(conn: &Connection) -> Result<Vec<EstimateSummary>> {
    let mut stmt = conn.prepare(
        "SELECT e.id, e.estimate_number, e.estimate_date,
                COALESCE(co.name, json_extract(e.parties, '$.company.name'), ''),
                COALESCE(cl.name, json_extract(e.parties, '$.client.name'), ''),
                e.total, e.created_at
         FROM estimates e
         LEFT JOIN companies co ON e.company_id = co.id
         LEFT JOIN clients cl ON e.client_id = cl.id
         ORDER BY e.created_at DESC, e.id DESC",
    )?;

    let estimates = stmt
        .query_map([], |row| {
            Ok(EstimateSummary {
                id: row.get(0)?,
                estimate_number: row.get(1)?,
                estimate_date: row.get(2)?,
                company_name: row.get(3)?,
                client_name: row.get(4)?,
                total_amount: from_sql_amount(row.get(5)?),
                created_at: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(estimates)
}

/// Raw header row; dates and JSON are decoded outside the row closure
struct EstimateRow {
    id: i64,
    estimate_number: String,
    estimate_date: String,
    valid_until: String,
    company_id: Option<i64>,
    client_id: Option<i64>,
    bank_id: Option<i64>,
    subtotal: i64,
    tax: i64,
    total: i64,
    parties: String,
    items: String,
    created_at: String,
}

pub fn get_estimate(conn: &Connection, id: i64) -> Result<Option<Estimate>> {
    let row = conn
        .query_row(
            "SELECT id, estimate_number, estimate_date, valid_until, company_id, client_id,
                    bank_id, subtotal, tax, total, parties, items, created_at
             FROM estimates WHERE id = ?1",
            [id],
            |row| {
                Ok(EstimateRow {
                    id: row.get(0)?,
                    estimate_number: row.get(1)?,
                    estimate_date: row.get(2)?,
                    valid_until: row.get(3)?,
                    company_id: row.get(4)?,
                    client_id: row.get(5)?,
                    bank_id: row.get(6)?,
                    subtotal: row.get(7)?,
                    tax: row.get(8)?,
                    total: row.get(9)?,
                    parties: row.get(10)?,
                    items: row.get(11)?,
                    created_at: row.get(12)?,
                })
            },
        )
        .optional()?;

    let Some(row) = row else {
        return Ok(None);
    };

    let parties: Parties =
        serde_json::from_str(&row.parties).context("Failed to decode estimate parties")?;

    // Line rows are authoritative; the JSON snapshot covers rows saved without them
    let mut items = estimate_item_rows(conn, row.id)?;
    if items.is_empty() && !row.items.is_empty() {
        items = serde_json::from_str(&row.items).context("Failed to decode estimate items")?;
    }

    Ok(Some(Estimate {
        id: row.id,
        company_id: row.company_id,
        client_id: row.client_id,
        bank_id: row.bank_id,
        document: EstimateDocument {
            estimate_number: row.estimate_number,
            estimate_date: parse_date(&row.estimate_date, "estimate_date")?,
            valid_until: parse_date(&row.valid_until, "valid_until")?,
            company: parties.company,
            client: parties.client,
            bank_account: parties.bank_account,
            items,
            totals: EstimateTotals {
                subtotal: from_sql_amount(row.subtotal),
                tax: from_sql_amount(row.tax),
                total: from_sql_amount(row.total),
            },
        },
        created_at: row.created_at,
    }))
}

fn estimate_item_rows(conn: &Connection, estimate_id: i64) -> Result<Vec<EstimateItem>> {
    let mut stmt = conn.prepare(
        "SELECT category, name, spec, unit, quantity, price, note
         FROM estimate_items WHERE estimate_id = ?1 ORDER BY position, id",
    )?;

    let items = stmt
        .query_map([estimate_id], |row| {
            Ok(EstimateItem {
                category: row.get(0)?,
                name: row.get(1)?,
                spec: row.get(2)?,
                unit: row.get(3)?,
                quantity: row.get(4)?,
                price: row.get(5)?,
                note: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(items)
}

/// Every stored estimate, oldest first
pub fn all_estimates(conn: &Connection) -> Result<Vec<Estimate>> {
    let mut stmt = conn.prepare("SELECT id FROM estimates ORDER BY id")?;
    let ids = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<i64>, _>>()?;

    let mut estimates = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(estimate) = get_estimate(conn, id)? {
            estimates.push(estimate);
        }
    }

    Ok(estimates)
}

pub fn delete_estimate(conn: &Connection, id: i64) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM estimates WHERE id = ?1", [id])?;
    if deleted > 0 {
        info!(id, "estimate deleted");
    }
    Ok(deleted > 0)
}

// ============================================================================
// DAILY RECORDS
// ============================================================================

pub fn save_daily_record(conn: &Connection, sheet: &DailySheet) -> Result<i64> {
    let items_json = serde_json::to_string(&sheet.items)?;
    let total: Amount = sheet.items.iter().map(DailyItem::amount).sum();

    conn.execute(
        "INSERT INTO daily_records (daily_date, site_name, items, total)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            sheet.date.format(DATE_FORMAT).to_string(),
            sheet.site_name,
            items_json,
            to_sql_amount(total),
        ],
    )
    .context("Failed to insert daily record")?;

    let id = conn.last_insert_rowid();
    info!(id, site = %sheet.site_name, total = total.value(), "daily record saved");
    Ok(id)
}

pub fn list_daily_records(conn: &Connection) -> Result<Vec<DailySummary>> {
    let mut stmt = conn.prepare(
        "SELECT id, daily_date, site_name, total, json_array_length(items), created_at
         FROM daily_records ORDER BY created_at DESC, id DESC",
    )?;

    let records = stmt
        .query_map([], |row| {
            let item_count: Option<i64> = row.get(4)?;
            Ok(DailySummary {
                id: row.get(0)?,
                date: row.get(1)?,
                site_name: row.get(2)?,
                total: from_sql_amount(row.get(3)?),
                item_count: item_count.unwrap_or(0).max(0) as usize,
                created_at: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(records)
}

pub fn get_daily_record(conn: &Connection, id: i64) -> Result<Option<DailyRecord>> {
    let row = conn
        .query_row(
            "SELECT id, daily_date, site_name, items, total, created_at
             FROM daily_records WHERE id = ?1",
            [id],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, String>(5)?,
                ))
            },
        )
        .optional()?;

    let Some((id, date, site_name, items_json, total, created_at)) = row else {
        return Ok(None);
    };

    let items: Vec<DailyItem> =
        serde_json::from_str(&items_json).context("Failed to decode daily items")?;

    Ok(Some(DailyRecord {
        id,
        sheet: DailySheet {
            date: parse_date(&date, "daily_date")?,
            site_name,
            items,
            total: from_sql_amount(total),
        },
        created_at,
    }))
}

pub fn all_daily_records(conn: &Connection) -> Result<Vec<DailyRecord>> {
    let mut stmt = conn.prepare("SELECT id FROM daily_records ORDER BY id")?;
    let ids = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<i64>, _>>()?;

    let mut records = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(record) = get_daily_record(conn, id)? {
            records.push(record);
        }
    }

    Ok(records)
}

pub fn delete_daily_record(conn: &Connection, id: i64) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM daily_records WHERE id = ?1", [id])?;
    Ok(deleted > 0)
}

// ============================================================================
// BULK OPERATIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Estimate,
    Daily,
}

impl RecordKind {
    fn table(&self) -> &'static str {
        match self {
            RecordKind::Estimate => "estimates",
            RecordKind::Daily => "daily_records",
        }
    }
}

/// Delete several records of one kind at once; returns how many existed
pub fn delete_records(conn: &mut Connection, kind: RecordKind, ids: &[i64]) -> Result<usize> {
    let tx = conn.transaction()?;
    let mut deleted = 0;

    {
        let mut stmt = tx.prepare(&format!("DELETE FROM {} WHERE id = ?1", kind.table()))?;
        for id in ids {
            deleted += stmt.execute([id])?;
        }
    }

    tx.commit()?;
    info!(table = kind.table(), requested = ids.len(), deleted, "bulk delete");
    Ok(deleted)
}

// ============================================================================
// RESTORE (explicit ids)
// ============================================================================

pub(crate) fn restore_company(conn: &Connection, company: &Company) -> Result<()> {
    let info = &company.info;
    conn.execute(
        "INSERT INTO companies (id, name, business_number, address, ceo, business_type,
                                business_item, phone, fax, manager, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            company.id,
            info.name,
            info.business_number,
            info.address,
            info.ceo,
            info.business_type,
            info.business_item,
            info.phone,
            info.fax,
            info.manager,
            company.created_at,
        ],
    )?;
    Ok(())
}

pub(crate) fn restore_client(conn: &Connection, client: &Client) -> Result<()> {
    let info = &client.info;
    conn.execute(
        "INSERT INTO clients (id, kind, name, business_number, address, ceo, phone, manager,
                              created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            client.id,
            info.kind.as_str(),
            info.name,
            info.business_number,
            info.address,
            info.ceo,
            info.phone,
            info.manager,
            client.created_at,
        ],
    )?;
    Ok(())
}

pub(crate) fn restore_bank_account(conn: &Connection, account: &BankAccount) -> Result<()> {
    conn.execute(
        "INSERT INTO bank_accounts (id, bank_name, account_number, account_holder, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            account.id,
            account.info.bank_name,
            account.info.account_number,
            account.info.account_holder,
            account.created_at,
        ],
    )?;
    Ok(())
}

pub(crate) fn restore_estimate(conn: &Connection, estimate: &Estimate) -> Result<()> {
    let document = &estimate.document;
    let parties = serde_json::to_string(&Parties {
        company: document.company.clone(),
        client: document.client.clone(),
        bank_account: document.bank_account.clone(),
    })?;

    conn.execute(
        "INSERT INTO estimates (id, estimate_number, estimate_date, valid_until, company_id,
                                client_id, bank_id, subtotal, tax, total, parties, items,
                                created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            estimate.id,
            document.estimate_number,
            document.estimate_date.format(DATE_FORMAT).to_string(),
            document.valid_until.format(DATE_FORMAT).to_string(),
            estimate.company_id,
            estimate.client_id,
            estimate.bank_id,
            to_sql_amount(document.totals.subtotal),
            to_sql_amount(document.totals.tax),
            to_sql_amount(document.totals.total),
            parties,
            serde_json::to_string(&document.items)?,
            estimate.created_at,
        ],
    )?;

    insert_estimate_items(conn, estimate.id, &document.items)
}

pub(crate) fn restore_daily_record(conn: &Connection, record: &DailyRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO daily_records (id, daily_date, site_name, items, total, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            record.id,
            record.sheet.date.format(DATE_FORMAT).to_string(),
            record.sheet.site_name,
            serde_json::to_string(&record.sheet.items)?,
            to_sql_amount(record.sheet.total),
            record.created_at,
        ],
    )?;
    Ok(())
}

/// Empty every table, children first
pub(crate) fn clear_all(conn: &Connection) -> Result<()> {
    for table in [
        "estimate_items",
        "estimates",
        "daily_records",
        "bank_accounts",
        "clients",
        "companies",
    ] {
        conn.execute(&format!("DELETE FROM {}", table), [])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daily::DailyRecordDraft;
    use crate::estimate::EstimateDraft;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_document(number: &str) -> EstimateDocument {
        let mut company = CompanyInfo::new("한빛인테리어");
        company.business_number = "123-45-67890".to_string();

        EstimateDraft {
            estimate_number: number.to_string(),
            estimate_date: Some(date(2024, 3, 5)),
            company,
            client: ClientInfo::individual("김철수", "010-1234-5678"),
            bank_account: Some(BankAccountInfo::new("국민은행", "123-456", "한빛인테리어")),
            items: vec![
                EstimateItem::new("도배", "실크벽지", 30.0, 15_000.0).with_spec_field("LG/롤"),
                EstimateItem::new("바닥", "강마루", 20.0, 45_000.0),
            ],
            ..Default::default()
        }
        .into_document(1)
        .unwrap()
    }

    fn sample_sheet() -> DailySheet {
        DailyRecordDraft {
            date: Some(date(2024, 3, 5)),
            site_name: "강남 아파트".to_string(),
            items: vec![
                DailyItem::new("자재비", "타일 본드", 35_000.0),
                DailyItem::new("식대", "점심", 36_000.0),
            ],
        }
        .into_sheet()
        .unwrap()
    }

    #[test]
    fn test_company_crud() {
        let conn = test_conn();

        let id = insert_company(&conn, &CompanyInfo::new("한빛")).unwrap();
        let found = get_company(&conn, id).unwrap().unwrap();
        assert_eq!(found.info.name, "한빛");
        assert!(!found.created_at.is_empty());

        assert_eq!(list_companies(&conn).unwrap().len(), 1);
        assert!(delete_company(&conn, id).unwrap());
        assert!(!delete_company(&conn, id).unwrap());
        assert!(get_company(&conn, id).unwrap().is_none());
    }

    #[test]
    fn test_find_or_insert_reuses_rows() {
        let conn = test_conn();

        let client = ClientInfo::individual("김철수", "010-1234-5678");
        let first = find_or_insert_client(&conn, &client).unwrap();
        let second = find_or_insert_client(&conn, &client).unwrap();
        assert_eq!(first, second);

        let other = ClientInfo::individual("김철수", "010-9999-8888");
        assert_ne!(find_or_insert_client(&conn, &other).unwrap(), first);
        assert_eq!(list_clients(&conn).unwrap().len(), 2);
    }

    #[test]
    fn test_save_and_get_estimate() {
        let mut conn = test_conn();

        let id = save_estimate(&mut conn, &sample_document("240305-001")).unwrap();
        let estimate = get_estimate(&conn, id).unwrap().unwrap();

        assert_eq!(estimate.document.estimate_number, "240305-001");
        assert_eq!(estimate.document.valid_until, date(2024, 4, 5));
        assert_eq!(estimate.document.items.len(), 2);
        assert_eq!(estimate.document.items[0].unit, "롤");
        assert_eq!(estimate.document.totals.total, Amount::new(1_485_000));
        assert!(estimate.company_id.is_some());
        assert!(estimate.bank_id.is_some());

        let list = list_estimates(&conn).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].company_name, "한빛인테리어");
        assert_eq!(list[0].client_name, "김철수");
        assert_eq!(list[0].total_amount, Amount::new(1_485_000));
    }

    #[test]
    fn test_blank_number_is_assigned() {
        let mut conn = test_conn();

        save_estimate(&mut conn, &sample_document("240305-001")).unwrap();
        let id = save_estimate(&mut conn, &sample_document("")).unwrap();

        let estimate = get_estimate(&conn, id).unwrap().unwrap();
        assert_eq!(estimate.document.estimate_number, "240305-002");
        assert_eq!(next_number_for(&conn, date(2024, 3, 5)).unwrap(), "240305-003");

        // Same supplier and customer both times
        assert_eq!(list_companies(&conn).unwrap().len(), 1);
        assert_eq!(list_clients(&conn).unwrap().len(), 1);
    }

    #[test]
    fn test_assigned_number_not_reused_after_delete() {
        let mut conn = test_conn();

        let first = save_estimate(&mut conn, &sample_document("")).unwrap();
        let second = save_estimate(&mut conn, &sample_document("")).unwrap();
        assert!(delete_estimate(&conn, first).unwrap());
        let third = save_estimate(&mut conn, &sample_document("")).unwrap();

        let second = get_estimate(&conn, second).unwrap().unwrap();
        let third = get_estimate(&conn, third).unwrap().unwrap();
        assert_eq!(second.document.estimate_number, "240305-002");
        assert_eq!(third.document.estimate_number, "240305-003");
        assert_ne!(second.document.estimate_number, third.document.estimate_number);
    }

    #[test]
    fn test_delete_estimate_cascades_items() {
        let mut conn = test_conn();
        let id = save_estimate(&mut conn, &sample_document("240305-001")).unwrap();

        assert!(delete_estimate(&conn, id).unwrap());

        let remaining: i64 = conn
            .query_row("SELECT COUNT(*) FROM estimate_items", [], |row| row.get(0))
            .unwrap();
        assert_eq!(remaining, 0);
        assert!(get_estimate(&conn, id).unwrap().is_none());
    }

    #[test]
    fn test_items_fall_back_to_snapshot() {
        let mut conn = test_conn();
        let id = save_estimate(&mut conn, &sample_document("240305-001")).unwrap();
        conn.execute("DELETE FROM estimate_items WHERE estimate_id = ?1", [id])
            .unwrap();

        let estimate = get_estimate(&conn, id).unwrap().unwrap();
        assert_eq!(estimate.document.items.len(), 2);
        assert_eq!(estimate.document.items[1].name, "강마루");
    }

    #[test]
    fn test_deleting_company_keeps_estimate() {
        let mut conn = test_conn();
        let id = save_estimate(&mut conn, &sample_document("240305-001")).unwrap();
        let company_id = get_estimate(&conn, id).unwrap().unwrap().company_id.unwrap();

        delete_company(&conn, company_id).unwrap();

        let estimate = get_estimate(&conn, id).unwrap().unwrap();
        assert_eq!(estimate.company_id, None);
        assert_eq!(estimate.document.company.name, "한빛인테리어");
        assert_eq!(list_estimates(&conn).unwrap()[0].company_name, "한빛인테리어");
    }

    #[test]
    fn test_daily_record_round_trip() {
        let conn = test_conn();

        let id = save_daily_record(&conn, &sample_sheet()).unwrap();
        let record = get_daily_record(&conn, id).unwrap().unwrap();
        assert_eq!(record.sheet.items.len(), 2);
        assert_eq!(record.sheet.total, Amount::new(71_000));

        let list = list_daily_records(&conn).unwrap();
        assert_eq!(list[0].item_count, 2);
        assert_eq!(list[0].date, "2024-03-05");

        assert!(delete_daily_record(&conn, id).unwrap());
        assert!(list_daily_records(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_bulk_delete() {
        let mut conn = test_conn();
        let a = save_daily_record(&conn, &sample_sheet()).unwrap();
        let b = save_daily_record(&conn, &sample_sheet()).unwrap();
        save_daily_record(&conn, &sample_sheet()).unwrap();

        let deleted = delete_records(&mut conn, RecordKind::Daily, &[a, b, 999]).unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(list_daily_records(&conn).unwrap().len(), 1);
    }
}
