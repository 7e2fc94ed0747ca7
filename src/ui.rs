use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use interior_estimate::{
    db, format::format_grouped, DailyRecord, DailySummary, Estimate, EstimateSummary,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use rusqlite::Connection;
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Estimates,
    DailyRecords,
    Directory,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Estimates => Page::DailyRecords,
            Page::DailyRecords => Page::Directory,
            Page::Directory => Page::Estimates,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Estimates => Page::Directory,
            Page::DailyRecords => Page::Estimates,
            Page::Directory => Page::DailyRecords,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Estimates => "견적서",
            Page::DailyRecords => "일일 영수증",
            Page::Directory => "거래처",
        }
    }
}

// ============================================================================
// DIRECTORY (companies, clients, bank accounts in one list)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Company,
    Client,
    BankAccount,
}

impl EntryKind {
    fn label(&self) -> &'static str {
        match self {
            EntryKind::Company => "공급자",
            EntryKind::Client => "공급받는자",
            EntryKind::BankAccount => "입금계좌",
        }
    }

    fn color(&self) -> Color {
        match self {
            EntryKind::Company => Color::Cyan,
            EntryKind::Client => Color::Green,
            EntryKind::BankAccount => Color::Yellow,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DirectoryEntry {
    pub kind: EntryKind,
    pub id: i64,
    pub name: String,
    pub contact: String,
    pub fields: Vec<(&'static str, String)>,
}

fn load_directory(conn: &Connection) -> Result<Vec<DirectoryEntry>> {
    let mut entries = Vec::new();

    for company in db::list_companies(conn)? {
        let info = company.info;
        entries.push(DirectoryEntry {
            kind: EntryKind::Company,
            id: company.id,
            contact: info.phone.clone(),
            fields: vec![
                ("사업자등록번호", info.business_number),
                ("대표자", info.ceo),
                ("주소", info.address),
                ("업태/종목", join_nonempty(&info.business_type, &info.business_item)),
                ("전화", info.phone),
                ("팩스", info.fax),
                ("담당자", info.manager),
            ],
            name: info.name,
        });
    }

    for client in db::list_clients(conn)? {
        let info = client.info;
        entries.push(DirectoryEntry {
            kind: EntryKind::Client,
            id: client.id,
            contact: info.phone.clone(),
            fields: vec![
                ("구분", info.kind.label().to_string()),
                ("등록번호", info.registration_label().to_string()),
                ("대표자", info.display_ceo().to_string()),
                ("주소", info.address.clone()),
                ("연락처", info.phone.clone()),
                ("담당자", info.manager.clone()),
            ],
            name: info.name,
        });
    }

    for account in db::list_bank_accounts(conn)? {
        let info = account.info;
        entries.push(DirectoryEntry {
            kind: EntryKind::BankAccount,
            id: account.id,
            name: info.bank_name.clone(),
            contact: info.account_number.clone(),
            fields: vec![
                ("은행", info.bank_name),
                ("계좌번호", info.account_number),
                ("예금주", info.account_holder),
            ],
        });
    }

    Ok(entries)
}

fn join_nonempty(a: &str, b: &str) -> String {
    match (a.is_empty(), b.is_empty()) {
        (false, false) => format!("{} / {}", a, b),
        (false, true) => a.to_string(),
        (true, false) => b.to_string(),
        (true, true) => String::new(),
    }
}

// ============================================================================
// APP STATE
// ============================================================================

/// Full record behind the selected row, fetched when the detail panel is open
#[derive(Debug, Clone)]
pub enum Detail {
    Estimate(Estimate),
    Daily(DailyRecord),
}

pub struct App {
    pub estimates: Vec<EstimateSummary>,
    pub daily_records: Vec<DailySummary>,
    pub directory: Vec<DirectoryEntry>,
    pub current_page: Page,
    pub estimate_state: TableState,
    pub daily_state: TableState,
    pub directory_state: TableState,
    pub show_detail: bool,
    pub detail: Option<Detail>,
    pub status_message: Option<String>,
}

impl App {
    pub fn load(conn: &Connection) -> Result<Self> {
        let mut app = Self {
            estimates: Vec::new(),
            daily_records: Vec::new(),
            directory: Vec::new(),
            current_page: Page::Estimates,
            estimate_state: TableState::default(),
            daily_state: TableState::default(),
            directory_state: TableState::default(),
            show_detail: false,
            detail: None,
            status_message: None,
        };
        app.reload(conn)?;
        Ok(app)
    }

    /// Re-read every list, keeping selections in range
    pub fn reload(&mut self, conn: &Connection) -> Result<()> {
        self.estimates = db::list_estimates(conn)?;
        self.daily_records = db::list_daily_records(conn)?;
        self.directory = load_directory(conn)?;

        clamp_selection(&mut self.estimate_state, self.estimates.len());
        clamp_selection(&mut self.daily_state, self.daily_records.len());
        clamp_selection(&mut self.directory_state, self.directory.len());

        self.refresh_detail(conn)
    }

    fn current_len(&self) -> usize {
        match self.current_page {
            Page::Estimates => self.estimates.len(),
            Page::DailyRecords => self.daily_records.len(),
            Page::Directory => self.directory.len(),
        }
    }

    fn current_state(&mut self) -> &mut TableState {
        match self.current_page {
            Page::Estimates => &mut self.estimate_state,
            Page::DailyRecords => &mut self.daily_state,
            Page::Directory => &mut self.directory_state,
        }
    }

    pub fn selected_estimate(&self) -> Option<&EstimateSummary> {
        self.estimate_state.selected().and_then(|i| self.estimates.get(i))
    }

    pub fn selected_daily(&self) -> Option<&DailySummary> {
        self.daily_state.selected().and_then(|i| self.daily_records.get(i))
    }

    pub fn selected_entry(&self) -> Option<&DirectoryEntry> {
        self.directory_state.selected().and_then(|i| self.directory.get(i))
    }

    pub fn toggle_detail(&mut self, conn: &Connection) -> Result<()> {
        self.show_detail = !self.show_detail;
        self.refresh_detail(conn)
    }

    /// Fetch the full record for the detail panel (directory rows carry their own fields)
    pub fn refresh_detail(&mut self, conn: &Connection) -> Result<()> {
        self.detail = None;
        if !self.show_detail {
            return Ok(());
        }

        self.detail = match self.current_page {
            Page::Estimates => match self.selected_estimate() {
                Some(row) => db::get_estimate(conn, row.id)?.map(Detail::Estimate),
                None => None,
            },
            Page::DailyRecords => match self.selected_daily() {
                Some(row) => db::get_daily_record(conn, row.id)?.map(Detail::Daily),
                None => None,
            },
            Page::Directory => None,
        };
        Ok(())
    }

    /// Delete the selected row of the current page
    pub fn delete_selected(&mut self, conn: &Connection) -> Result<()> {
        let deleted = match self.current_page {
            Page::Estimates => match self.selected_estimate() {
                Some(row) => {
                    let label = format!("견적서 {}", row.estimate_number);
                    db::delete_estimate(conn, row.id)?.then_some(label)
                }
                None => None,
            },
            Page::DailyRecords => match self.selected_daily() {
                Some(row) => {
                    let label = format!("영수증 {} {}", row.date, row.site_name);
                    db::delete_daily_record(conn, row.id)?.then_some(label)
                }
                None => None,
            },
            Page::Directory => match self.selected_entry() {
                Some(entry) => {
                    let label = format!("{} {}", entry.kind.label(), entry.name);
                    let removed = match entry.kind {
                        EntryKind::Company => db::delete_company(conn, entry.id)?,
                        EntryKind::Client => db::delete_client(conn, entry.id)?,
                        EntryKind::BankAccount => db::delete_bank_account(conn, entry.id)?,
                    };
                    removed.then_some(label)
                }
                None => None,
            },
        };

        if let Some(label) = deleted {
            self.status_message = Some(format!("삭제됨: {}", label));
            self.reload(conn)?;
        }
        Ok(())
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    pub fn next(&mut self) {
        let len = self.current_len();
        if len == 0 {
            return;
        }
        let state = self.current_state();
        let i = match state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.current_len();
        if len == 0 {
            return;
        }
        let state = self.current_state();
        let i = match state.selected() {
            Some(0) => len - 1,
            Some(i) => i - 1,
            None => 0,
        };
        state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.current_len();
        if len == 0 {
            return;
        }
        let state = self.current_state();
        let i = match state.selected() {
            Some(i) => (i + 20).min(len - 1),
            None => 0,
        };
        state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        if self.current_len() == 0 {
            return;
        }
        let state = self.current_state();
        let i = state.selected().map(|i| i.saturating_sub(20)).unwrap_or(0);
        state.select(Some(i));
    }

    pub fn first(&mut self) {
        if self.current_len() > 0 {
            self.current_state().select(Some(0));
        }
    }

    pub fn last(&mut self) {
        let len = self.current_len();
        if len > 0 {
            self.current_state().select(Some(len - 1));
        }
    }

    /// Sum of estimate totals shown in the header
    pub fn estimates_total(&self) -> u64 {
        self.estimates.iter().map(|e| e.total_amount.value()).sum()
    }

    pub fn daily_total(&self) -> u64 {
        self.daily_records.iter().map(|d| d.total.value()).sum()
    }
}

fn clamp_selection(state: &mut TableState, len: usize) {
    match (state.selected(), len) {
        (_, 0) => state.select(None),
        (None, _) => state.select(Some(0)),
        (Some(i), len) if i >= len => state.select(Some(len - 1)),
        _ => {}
    }
}

// ============================================================================
// EVENT LOOP
// ============================================================================

pub fn run_ui(app: &mut App, conn: &Connection) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app, conn);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    conn: &Connection,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            app.status_message = None;
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Enter => app.toggle_detail(conn)?,
                KeyCode::Tab | KeyCode::BackTab => {
                    if key.code == KeyCode::BackTab || key.modifiers.contains(KeyModifiers::SHIFT) {
                        app.previous_page();
                    } else {
                        app.next_page();
                    }
                    app.refresh_detail(conn)?;
                }
                KeyCode::Char('d') | KeyCode::Delete => app.delete_selected(conn)?,
                KeyCode::Char('r') => app.reload(conn)?,
                KeyCode::Down | KeyCode::Char('j') => {
                    app.next();
                    app.refresh_detail(conn)?;
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    app.previous();
                    app.refresh_detail(conn)?;
                }
                KeyCode::PageDown => {
                    app.page_down();
                    app.refresh_detail(conn)?;
                }
                KeyCode::PageUp => {
                    app.page_up();
                    app.refresh_detail(conn)?;
                }
                KeyCode::Home => {
                    app.first();
                    app.refresh_detail(conn)?;
                }
                KeyCode::End => {
                    app.last();
                    app.refresh_detail(conn)?;
                }
                _ => {}
            }
        }
    }
}

// ============================================================================
// RENDERING
// ============================================================================

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    if app.show_detail {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(chunks[1]);

        render_page(f, content_chunks[0], app);
        render_detail_panel(f, content_chunks[1], app);
    } else {
        render_page(f, chunks[1], app);
    }

    render_status_bar(f, chunks[2], app);
}

fn render_page(f: &mut Frame, area: Rect, app: &mut App) {
    match app.current_page {
        Page::Estimates => render_estimates(f, area, app),
        Page::DailyRecords => render_daily_records(f, area, app),
        Page::Directory => render_directory(f, area, app),
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let pages = [Page::Estimates, Page::DailyRecords, Page::Directory];

    let mut tab_spans = vec![];
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("견적 {}건 ₩{}", app.estimates.len(), format_grouped(app.estimates_total() as f64)),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("영수증 {}건 ₩{}", app.daily_records.len(), format_grouped(app.daily_total() as f64)),
        Style::default().fg(Color::Green),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn header_row<'a>(titles: &'a [&'a str]) -> Row<'a> {
    let cells = titles.iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });

    Row::new(cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1)
}

fn list_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(title)
}

fn highlight() -> Style {
    Style::default()
        .bg(Color::DarkGray)
        .add_modifier(Modifier::BOLD)
}

fn render_estimates(f: &mut Frame, area: Rect, app: &mut App) {
    let rows = app.estimates.iter().map(|e| {
        Row::new(vec![
            Cell::from(e.estimate_number.clone()),
            Cell::from(e.estimate_date.clone()),
            Cell::from(truncate(&e.company_name, 16)),
            Cell::from(truncate(&e.client_name, 16)),
            Cell::from(format_grouped(e.total_amount.value() as f64))
                .style(Style::default().fg(Color::Green)),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(16),
            Constraint::Length(12),
            Constraint::Length(18),
            Constraint::Length(18),
            Constraint::Length(16),
        ],
    )
    .header(header_row(&["견적번호", "견적일자", "공급자", "공급받는자", "합계(원)"]))
    .block(list_block(" 견적서 목록 "))
    .highlight_style(highlight())
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.estimate_state);
}

fn render_daily_records(f: &mut Frame, area: Rect, app: &mut App) {
    let rows = app.daily_records.iter().map(|d| {
        Row::new(vec![
            Cell::from(d.date.clone()),
            Cell::from(truncate(&d.site_name, 28)),
            Cell::from(format!("{}", d.item_count)),
            Cell::from(format_grouped(d.total.value() as f64))
                .style(Style::default().fg(Color::Green)),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(30),
            Constraint::Length(6),
            Constraint::Length(16),
        ],
    )
    .header(header_row(&["날짜", "현장명", "항목", "합계(원)"]))
    .block(list_block(" 일일 영수증 목록 "))
    .highlight_style(highlight())
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.daily_state);
}

fn render_directory(f: &mut Frame, area: Rect, app: &mut App) {
    let rows = app.directory.iter().map(|entry| {
        Row::new(vec![
            Cell::from(entry.kind.label()).style(Style::default().fg(entry.kind.color())),
            Cell::from(truncate(&entry.name, 24)),
            Cell::from(entry.contact.clone()),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [Constraint::Length(12), Constraint::Length(26), Constraint::Length(20)],
    )
    .header(header_row(&["구분", "이름", "연락처/계좌"]))
    .block(list_block(" 거래처 · 계좌 "))
    .highlight_style(highlight())
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.directory_state);
}

fn label_line<'a>(label: &'a str, value: String) -> Line<'a> {
    Line::from(vec![
        Span::styled(
            format!("  {}: ", label),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(value),
    ])
}

fn section_line(title: &str) -> Line<'_> {
    Line::from(vec![Span::styled(
        format!("  {}", title),
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
    )])
}

fn amount_lines(total: u64, words: String) -> Vec<Line<'static>> {
    vec![
        Line::from(vec![
            Span::styled(
                "  합계: ",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("₩{}", format_grouped(total as f64)),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled(
                "  금액: ",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::styled(words, Style::default().fg(Color::Green)),
        ]),
    ]
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let mut content = vec![Line::from("")];

    match (app.current_page, &app.detail) {
        (Page::Estimates, Some(Detail::Estimate(estimate))) => {
            let doc = &estimate.document;
            content.push(label_line("견적번호", doc.display_number()));
            content.push(label_line("견적일자", doc.estimate_date.to_string()));
            content.push(label_line("유효기간", doc.valid_until.to_string()));
            content.push(label_line("공급자", doc.company.name.clone()));
            content.push(label_line("공급받는자", doc.client.name.clone()));
            content.push(Line::from(""));
            content.extend(amount_lines(doc.totals.total.value(), doc.total_in_words()));
            content.push(label_line("공급가액", format_grouped(doc.totals.subtotal.value() as f64)));
            content.push(label_line("부가세", format_grouped(doc.totals.tax.value() as f64)));
            content.push(Line::from(""));
            content.push(section_line("품목"));
            for item in &doc.items {
                content.push(Line::from(format!(
                    "  {} {} × {} = {}",
                    truncate(&item.name, 18),
                    item.quantity,
                    format_grouped(item.price),
                    item.line_amount().grouped(),
                )));
            }
            if let Some(account) = &doc.bank_account {
                content.push(Line::from(""));
                content.push(section_line("입금계좌"));
                content.push(Line::from(format!("  {}", account.summary())));
            }
        }
        (Page::DailyRecords, Some(Detail::Daily(record))) => {
            let sheet = &record.sheet;
            content.push(label_line("날짜", sheet.date.to_string()));
            content.push(label_line("현장명", sheet.site_name.clone()));
            content.push(Line::from(""));
            content.extend(amount_lines(sheet.total.value(), sheet.total_in_words()));
            content.push(Line::from(""));
            content.push(section_line("사용내역"));
            for item in &sheet.items {
                content.push(Line::from(format!(
                    "  [{}] {} {}",
                    item.category,
                    truncate(&item.content, 20),
                    item.amount().grouped(),
                )));
            }
        }
        (Page::Directory, _) => match app.selected_entry() {
            Some(entry) => {
                content.push(section_line(entry.kind.label()));
                content.push(label_line("이름", entry.name.clone()));
                for (label, value) in &entry.fields {
                    if !value.is_empty() {
                        content.push(label_line(label, value.clone()));
                    }
                }
            }
            None => content.push(Line::from("  선택된 항목이 없습니다")),
        },
        _ => content.push(Line::from("  선택된 항목이 없습니다")),
    }

    content.push(Line::from(""));
    content.push(Line::from(vec![Span::styled(
        "  Press Enter to close",
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    )]));

    let detail_panel = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" 상세 "),
    );

    f.render_widget(detail_panel, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = match app.current_page {
        Page::Estimates => app.estimate_state.selected(),
        Page::DailyRecords => app.daily_state.selected(),
        Page::Directory => app.directory_state.selected(),
    };
    let selected = selected.map(|i| i + 1).unwrap_or(0);

    let mut status_spans = vec![Span::styled(
        format!(" Row: {}/{} ", selected, app.current_len()),
        Style::default().fg(Color::Cyan),
    )];

    if let Some(message) = &app.status_message {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(message.clone(), Style::default().fg(Color::Green)));
    }

    let keys = [
        ("Enter", " Details | "),
        ("Tab", " Page | "),
        ("↑/↓", " Nav | "),
        ("d", " Delete | "),
        ("r", " Reload | "),
    ];
    status_spans.push(Span::raw(" | "));
    for (key, label) in keys {
        status_spans.push(Span::styled(key, Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(label));
    }
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

/// Shorten to `max_chars` characters (not bytes; names are mostly Hangul)
fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{}…", kept)
    }
}
