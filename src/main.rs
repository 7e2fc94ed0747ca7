// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use rusqlite::Connection;
use std::env;
use std::path::{Path, PathBuf};

use interior_estimate::{
    db, export, format, logging::init_logging, preview, Settings,
};

const USAGE: &str = "\
Usage: interior-estimate [command]

Commands:
  init                          Create the database tables
  words <amount>                Amount in Korean words (금액 line)
  grouped <number>              Number rounded, with thousands separators
  next-number [YYYY-MM-DD]      Next estimate number for a date (default today)
  export-estimate <id> [out]    Estimate sheet as CSV
  export-daily <id> [out]       Daily receipt sheet as CSV
  preview-estimate <id> [out]   Printable estimate HTML
  preview-daily <id> [out]      Printable daily receipt HTML
  backup <file>                 Write a JSON backup of every record
  restore <file>                Replace all records with a backup

Without a command the terminal browser starts.";

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let settings = Settings::from_env()?;

    let Some(command) = args.first() else {
        // UI mode (default); no subscriber so log lines don't tear the screen
        return run_ui_mode(&settings);
    };

    init_logging(&settings.env);
    let rest = &args[1..];

    match command.as_str() {
        "init" => run_init(&settings),
        "words" => {
            let amount = parse_amount(rest.first())?;
            println!("{}", format::format_korean_words(amount));
            Ok(())
        }
        "grouped" => {
            let amount = parse_real(rest.first())?;
            println!("{}", format::format_grouped(amount));
            Ok(())
        }
        "next-number" => run_next_number(&settings, rest.first()),
        "export-estimate" => run_export_estimate(&settings, rest),
        "export-daily" => run_export_daily(&settings, rest),
        "preview-estimate" => run_preview_estimate(&settings, rest),
        "preview-daily" => run_preview_daily(&settings, rest),
        "backup" => run_backup(&settings, rest.first()),
        "restore" => run_restore(&settings, rest.first()),
        "help" | "--help" | "-h" => {
            println!("{}", USAGE);
            Ok(())
        }
        other => {
            eprintln!("❌ Unknown command: {}\n", other);
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }
}

// ============================================================================
// ARGUMENTS
// ============================================================================

/// Accepts `1485000`, `1,485,000` or `1,485,000원`
fn parse_amount(arg: Option<&String>) -> Result<u64> {
    let raw = arg.context("Missing amount")?;
    format::parse_grouped(raw).with_context(|| format!("Not an amount: {}", raw))
}

/// Any real number, grouped or not: `1234.5`, `-1,234.5`, `1,234원`
fn parse_real(arg: Option<&String>) -> Result<f64> {
    let raw = arg.context("Missing amount")?;
    let cleaned: String = raw
        .trim()
        .trim_end_matches(format::WON)
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    cleaned
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .with_context(|| format!("Not a number: {}", raw))
}

fn parse_id(arg: Option<&String>) -> Result<i64> {
    let raw = arg.context("Missing record id")?;
    raw.trim()
        .parse()
        .with_context(|| format!("Not a record id: {}", raw))
}

fn open_existing(settings: &Settings) -> Result<Connection> {
    if !settings.db_path.exists() {
        bail!(
            "Database not found at {}. Run `interior-estimate init` first.",
            settings.db_path.display()
        );
    }
    db::open_database(&settings.db_path)
}

/// Explicit output path, or the default file name in the current directory
fn output_path(arg: Option<&String>, default_name: String) -> PathBuf {
    arg.map(PathBuf::from).unwrap_or_else(|| PathBuf::from(default_name))
}

// ============================================================================
// COMMANDS
// ============================================================================

fn run_init(settings: &Settings) -> Result<()> {
    println!("🗄️  Initializing database");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    db::open_database(&settings.db_path)?;

    println!("✓ Database ready at {} (WAL mode)", settings.db_path.display());
    Ok(())
}

fn run_next_number(settings: &Settings, date_arg: Option<&String>) -> Result<()> {
    let date = match date_arg {
        Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .with_context(|| format!("Date must be YYYY-MM-DD, got {}", raw))?,
        None => Local::now().date_naive(),
    };

    let conn = open_existing(settings)?;
    println!("{}", db::next_number_for(&conn, date)?);
    Ok(())
}

fn run_export_estimate(settings: &Settings, args: &[String]) -> Result<()> {
    let id = parse_id(args.first())?;
    let conn = open_existing(settings)?;
    let estimate = db::get_estimate(&conn, id)?.with_context(|| format!("견적서 {}를 찾을 수 없습니다", id))?;

    let path = output_path(args.get(1), export::estimate_file_name(&estimate.document));
    export::write_sheet(&path, &export::estimate_sheet_csv(&estimate.document)?)?;

    println!("✓ Exported estimate {} → {}", estimate.document.display_number(), path.display());
    Ok(())
}

fn run_export_daily(settings: &Settings, args: &[String]) -> Result<()> {
    let id = parse_id(args.first())?;
    let conn = open_existing(settings)?;
    let record = db::get_daily_record(&conn, id)?.with_context(|| format!("영수증 {}를 찾을 수 없습니다", id))?;

    let path = output_path(args.get(1), export::daily_file_name(&record.sheet));
    export::write_sheet(&path, &export::daily_sheet_csv(&record.sheet)?)?;

    println!("✓ Exported daily record {} → {}", record.sheet.date, path.display());
    Ok(())
}

fn run_preview_estimate(settings: &Settings, args: &[String]) -> Result<()> {
    let id = parse_id(args.first())?;
    let conn = open_existing(settings)?;
    let estimate = db::get_estimate(&conn, id)?.with_context(|| format!("견적서 {}를 찾을 수 없습니다", id))?;

    let default_name = html_name(export::estimate_file_name(&estimate.document));
    let path = output_path(args.get(1), default_name);
    write_html(&path, &preview::render_estimate_html(&estimate.document))?;

    println!("✓ Preview written to {} (print to PDF from a browser)", path.display());
    Ok(())
}

fn run_preview_daily(settings: &Settings, args: &[String]) -> Result<()> {
    let id = parse_id(args.first())?;
    let conn = open_existing(settings)?;
    let record = db::get_daily_record(&conn, id)?.with_context(|| format!("영수증 {}를 찾을 수 없습니다", id))?;

    let default_name = html_name(export::daily_file_name(&record.sheet));
    let path = output_path(args.get(1), default_name);
    write_html(&path, &preview::render_daily_html(&record.sheet))?;

    println!("✓ Preview written to {} (print to PDF from a browser)", path.display());
    Ok(())
}

/// Same name as the CSV sheet, `.html` extension
fn html_name(sheet_name: String) -> String {
    Path::new(&sheet_name).with_extension("html").to_string_lossy().into_owned()
}

fn write_html(path: &Path, html: &str) -> Result<()> {
    std::fs::write(path, html).with_context(|| format!("Failed to write {}", path.display()))
}

fn run_backup(settings: &Settings, file: Option<&String>) -> Result<()> {
    let path = PathBuf::from(file.context("Missing backup file path")?);
    let conn = open_existing(settings)?;

    let backup = export::write_backup(&conn, &path)?;

    println!("✓ Backup written to {}", path.display());
    println!("  checksum: {}", backup.checksum);
    Ok(())
}

fn run_restore(settings: &Settings, file: Option<&String>) -> Result<()> {
    let path = PathBuf::from(file.context("Missing backup file path")?);
    let backup = export::read_backup(&path)?;

    let mut conn = db::open_database(&settings.db_path)?;
    let summary = export::restore_backup(&mut conn, &backup)?;

    println!("✓ Restored from {}", path.display());
    println!(
        "  {} companies, {} clients, {} accounts, {} estimates, {} daily records",
        summary.companies,
        summary.clients,
        summary.bank_accounts,
        summary.estimates,
        summary.daily_records
    );
    Ok(())
}

// ============================================================================
// TERMINAL BROWSER
// ============================================================================

#[cfg(feature = "tui")]
fn run_ui_mode(settings: &Settings) -> Result<()> {
    println!("🖥️  Loading estimates from {}...\n", settings.db_path.display());

    let conn = db::open_database(&settings.db_path)?;
    let mut app = ui::App::load(&conn)?;

    println!(
        "✓ Loaded {} estimates, {} daily records\n",
        app.estimates.len(),
        app.daily_records.len()
    );

    ui::run_ui(&mut app, &conn)?;

    println!("\n✅ UI closed successfully");
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_settings: &Settings) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or run a command: interior-estimate help");
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount_accepts_grouped_input() {
        assert_eq!(parse_amount(Some(&"1,485,000원".to_string())).unwrap(), 1_485_000);
        assert!(parse_amount(Some(&"abc".to_string())).is_err());
        assert!(parse_amount(None).is_err());
    }

    #[test]
    fn test_parse_real_accepts_fractions() {
        assert_eq!(parse_real(Some(&"1234.5".to_string())).unwrap(), 1234.5);
        assert_eq!(parse_real(Some(&"-1,234.5원".to_string())).unwrap(), -1234.5);
        assert_eq!(format::format_grouped(parse_real(Some(&"1,234,567.6".to_string())).unwrap()), "1,234,568");
        assert!(parse_real(Some(&"inf".to_string())).is_err());
        assert!(parse_real(Some(&"천원".to_string())).is_err());
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id(Some(&" 7 ".to_string())).unwrap(), 7);
        assert!(parse_id(Some(&"seven".to_string())).is_err());
    }

    #[test]
    fn test_html_name() {
        assert_eq!(html_name("견적서_240305-001.csv".to_string()), "견적서_240305-001.html");
    }

    #[test]
    fn test_output_path_default() {
        assert_eq!(output_path(None, "a.csv".to_string()), PathBuf::from("a.csv"));
        assert_eq!(
            output_path(Some(&"out/b.csv".to_string()), "a.csv".to_string()),
            PathBuf::from("out/b.csv")
        );
    }
}
