// 🖨️ Printable Preview - standalone HTML documents (print to PDF from the browser)

use crate::daily::DailySheet;
use crate::estimate::{estimate_conditions, EstimateDocument, EstimateItem};
use crate::format::format_date_ko;

/// Seal colour used for the stamp and its border
const SEAL_COLOR: &str = "#dc3545";
const SEAL_SIZE: u32 = 40;

const STYLE: &str = "
body { font-family: '맑은 고딕', 'Malgun Gothic', sans-serif; font-size: 10pt; color: #111; margin: 24px; }
h1 { text-align: center; letter-spacing: 8px; margin-bottom: 8px; }
table { width: 100%; border-collapse: collapse; margin-top: 12px; }
th, td { border: 1px solid #9ca3af; padding: 4px 6px; }
th { background: #f3f4f6; }
td.num { text-align: right; }
td.label { background: #f9fafb; width: 25%; }
.parties { display: flex; gap: 12px; }
.parties table { flex: 1; }
.korean-amount { text-align: center; margin-top: 12px; padding: 8px; border: 1px solid #9ca3af; background: #f9fafb; font-weight: bold; }
.signature { text-align: right; margin-top: 30px; }
@media print { body { margin: 0; } }
";

/// Escape text for HTML element and attribute content
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Whole quantities print without decimals, others with up to two
fn format_quantity(quantity: f64) -> String {
    if quantity.fract() == 0.0 {
        format!("{}", quantity as i64)
    } else {
        let text = format!("{:.2}", quantity);
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"ko\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>{}</style>\n</head>\n<body>\n{}</body>\n</html>\n",
        escape_html(title),
        STYLE,
        body
    )
}

fn label_row(label: &str, value: &str) -> String {
    format!(
        "<tr><td class=\"label\">{}</td><td>{}</td></tr>\n",
        label,
        escape_html(value)
    )
}

// ============================================================================
// DIGITAL SEAL
// ============================================================================

/// Round red company stamp (도장) with the company name and 印 below it.
///
/// Font size shrinks with longer names, clamped to 6..=8px.
pub fn digital_seal_svg(company_name: &str) -> String {
    let name = company_name.trim();
    if name.is_empty() {
        return String::new();
    }

    let center = SEAL_SIZE as f64 / 2.0;
    let outer = center - 1.0;
    let inner = outer - 5.0;
    let font_size = (120.0 / name.chars().count() as f64).clamp(6.0, 8.0);

    format!(
        "<svg width=\"{size}\" height=\"{size}\" xmlns=\"http://www.w3.org/2000/svg\" class=\"seal\">\
<circle cx=\"{c}\" cy=\"{c}\" r=\"{outer}\" fill=\"none\" stroke=\"{color}\" stroke-width=\"2\"/>\
<circle cx=\"{c}\" cy=\"{c}\" r=\"{inner}\" fill=\"none\" stroke=\"{color}\" stroke-width=\"2\"/>\
<text x=\"{c}\" y=\"{name_y}\" fill=\"{color}\" font-weight=\"bold\" text-anchor=\"middle\" dominant-baseline=\"central\" font-size=\"{font}px\">{name}</text>\
<text x=\"{c}\" y=\"{mark_y}\" fill=\"{color}\" font-weight=\"bold\" text-anchor=\"middle\" dominant-baseline=\"central\" font-size=\"{mark_font}px\">印</text>\
</svg>",
        size = SEAL_SIZE,
        c = center,
        outer = outer,
        inner = inner,
        color = SEAL_COLOR,
        name_y = center - 2.0,
        mark_y = center + font_size + 2.0,
        font = font_size,
        mark_font = font_size - 1.0,
        name = escape_html(name),
    )
}

// ============================================================================
// ESTIMATE
// ============================================================================

fn estimate_item_row(item: &EstimateItem) -> String {
    format!(
        "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td><td>{}</td></tr>\n",
        escape_html(&item.category),
        escape_html(&item.name),
        escape_html(&item.spec),
        escape_html(item.unit_or_default()),
        format_quantity(item.quantity),
        crate::format::format_grouped(item.price),
        item.line_amount().grouped(),
        escape_html(&item.note),
    )
}

/// 견적서 as a printable page
pub fn render_estimate_html(doc: &EstimateDocument) -> String {
    let company = &doc.company;
    let client = &doc.client;
    let mut body = String::new();

    body.push_str("<h1>견 적 서</h1>\n");
    body.push_str(&format!(
        "<div class=\"estimate-info\"><div>견적번호: {}</div><div>견적일자: {}</div></div>\n",
        escape_html(&doc.display_number()),
        format_date_ko(doc.estimate_date)
    ));

    // Parties: customer on the left, supplier on the right
    body.push_str("<div class=\"parties\">\n<table>\n<tr><th colspan=\"2\">공급받는자</th></tr>\n");
    body.push_str(&label_row("등록번호", client.registration_label()));
    body.push_str(&label_row("상호", &client.name));
    body.push_str(&label_row("성명", client.display_ceo()));
    body.push_str(&label_row("주소", &client.address));
    body.push_str(&label_row("전화번호", &client.phone));
    body.push_str("</table>\n<table>\n<tr><th colspan=\"2\">공급자</th></tr>\n");
    body.push_str(&label_row("등록번호", &company.business_number));
    body.push_str(&label_row("상호", &company.name));
    body.push_str(&label_row("성명", &company.ceo));
    body.push_str(&label_row("주소", &company.address));
    body.push_str(&label_row("업태", &company.business_type));
    body.push_str(&label_row("종목", &company.business_item));
    body.push_str(&label_row("전화번호", &company.phone));
    body.push_str("</table>\n</div>\n");

    body.push_str(
        "<table class=\"items\">\n<thead><tr><th>공종</th><th>품목</th><th>규격</th><th>단위</th>\
<th>수량</th><th>단가</th><th>공급가액</th><th>비고</th></tr></thead>\n<tbody>\n",
    );
    for item in doc.items.iter().filter(|i| i.is_filled()) {
        body.push_str(&estimate_item_row(item));
    }
    body.push_str("</tbody>\n</table>\n");

    body.push_str(&format!(
        "<div class=\"korean-amount\">금액: {}</div>\n",
        doc.total_in_words()
    ));
    body.push_str(&format!(
        "<table class=\"summary\"><tr><td class=\"label\">공급가액</td><td class=\"num\">{}</td>\
<td class=\"label\">세액</td><td class=\"num\">{}</td>\
<td class=\"label\">합계금액</td><td class=\"num\"><strong>{}</strong></td></tr></table>\n",
        doc.totals.subtotal.won(),
        doc.totals.tax.won(),
        doc.totals.total.won()
    ));

    if let Some(account) = doc.bank_account.as_ref().filter(|a| a.is_complete()) {
        body.push_str(&format!(
            "<div class=\"payment\"><h4>■ 입금계좌</h4><p>{}</p></div>\n",
            escape_html(&account.summary())
        ));
    }

    body.push_str("<div class=\"conditions\"><h4>■ 견적조건</h4>\n<ul>\n");
    for condition in estimate_conditions(&format_date_ko(doc.valid_until)) {
        body.push_str(&format!("<li>{}</li>\n", escape_html(&condition)));
    }
    body.push_str("</ul>\n</div>\n");

    body.push_str("<p style=\"text-align: center; margin-top: 40px;\">위와 같이 견적서를 제출합니다.</p>\n");
    body.push_str(&format!(
        "<div class=\"signature\"><p><strong>{}</strong></p><p>대표자: {} {}</p><p>담당자: {}</p></div>\n",
        escape_html(&company.name),
        escape_html(&company.ceo),
        digital_seal_svg(&company.name),
        escape_html(&company.manager)
    ));

    page(&format!("견적서 {}", doc.display_number()), &body)
}

// ============================================================================
// DAILY RECORD
// ============================================================================

/// 일일 영수증 기록 내역서 as a printable page
pub fn render_daily_html(sheet: &DailySheet) -> String {
    let date = format_date_ko(sheet.date);
    let mut body = String::new();

    body.push_str("<h1>일일 영수증 기록 내역서</h1>\n");
    body.push_str(&format!(
        "<div class=\"daily-info\"><div><strong>현장명: {}</strong></div><div><strong>기록일자: {}</strong></div></div>\n",
        escape_html(&sheet.site_name),
        date
    ));

    body.push_str(
        "<table class=\"items\">\n<thead><tr><th>카테고리</th><th>사용내역</th><th>단가</th>\
<th>금액</th><th>비고</th></tr></thead>\n<tbody>\n",
    );
    for item in sheet.items.iter().filter(|i| i.is_filled()) {
        let note = if item.note.trim().is_empty() { "-" } else { item.note.as_str() };
        body.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td><td>{}</td></tr>\n",
            escape_html(&item.category),
            escape_html(&item.content),
            crate::format::format_won(item.rate),
            item.amount().won(),
            escape_html(note),
        ));
    }
    body.push_str("</tbody>\n</table>\n");

    body.push_str(&format!(
        "<div class=\"korean-amount\">당일 총 사용비: {}</div>\n",
        sheet.total.won()
    ));
    body.push_str(&format!(
        "<div class=\"notes\"><h4>■ 사용 내역</h4><p>상기와 같이 {} 사용내역을 기록하였음을 확인합니다.</p></div>\n",
        date
    ));

    page(&format!("영수증 기록 {}", date), &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daily::{DailyItem, DailyRecordDraft};
    use crate::entities::{BankAccountInfo, ClientInfo, CompanyInfo};
    use crate::estimate::EstimateDraft;
    use chrono::NaiveDate;

    fn document() -> EstimateDocument {
        let mut company = CompanyInfo::new("한빛<인테리어>");
        company.ceo = "홍길동".to_string();

        EstimateDraft {
            estimate_date: NaiveDate::from_ymd_opt(2024, 3, 5),
            company,
            client: ClientInfo::individual("김철수", "010-1234-5678"),
            bank_account: Some(BankAccountInfo::new("국민은행", "123-456", "홍길동")),
            items: vec![
                EstimateItem::new("도배", "실크벽지 & 초배", 2.5, 10_000.0),
                EstimateItem::new("바닥", "강마루", 10.0, 45_000.0),
            ],
            ..Default::default()
        }
        .into_document(1)
        .unwrap()
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a href=\"x\">'&'</a>"), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
        assert_eq!(escape_html("견적서"), "견적서");
    }

    #[test]
    fn test_format_quantity() {
        assert_eq!(format_quantity(3.0), "3");
        assert_eq!(format_quantity(2.5), "2.5");
        assert_eq!(format_quantity(1.126), "1.13");
    }

    #[test]
    fn test_seal_font_clamped() {
        let short = digital_seal_svg("한빛");
        assert!(short.contains("font-size=\"8px\""));
        assert!(short.contains("印"));
        assert!(short.contains(SEAL_COLOR));

        // 120 / 30 = 4 → clamped to 6
        let long = digital_seal_svg(&"가".repeat(30));
        assert!(long.contains("font-size=\"6px\""));

        assert_eq!(digital_seal_svg("  "), "");
    }

    #[test]
    fn test_estimate_html() {
        let html = render_estimate_html(&document());

        assert!(html.contains("<h1>견 적 서</h1>"));
        assert!(html.contains("견적번호: EST-240305"));
        assert!(html.contains("견적일자: 2024년 3월 5일"));
        assert!(html.contains("공급받는자"));
        assert!(html.contains("<td>개인</td>"));
        // 25,000 + 450,000 = 475,000; tax 47,500; total 522,500
        assert!(html.contains("금액: 오십이만이천오백원 正"));
        assert!(html.contains("522,500원"));
        assert!(html.contains("■ 입금계좌"));
        assert!(html.contains("견적유효기간: 2024년 4월 5일 까지"));
        assert!(html.contains("위와 같이 견적서를 제출합니다."));
    }

    #[test]
    fn test_estimate_html_escapes_user_text() {
        let html = render_estimate_html(&document());

        assert!(html.contains("한빛&lt;인테리어&gt;"));
        assert!(!html.contains("한빛<인테리어>"));
        assert!(html.contains("실크벽지 &amp; 초배"));
    }

    #[test]
    fn test_daily_html() {
        let sheet = DailyRecordDraft {
            date: NaiveDate::from_ymd_opt(2024, 3, 5),
            site_name: "강남 아파트".to_string(),
            items: vec![DailyItem::new("자재비", "타일 본드", 35_000.0)],
        }
        .into_sheet()
        .unwrap();

        let html = render_daily_html(&sheet);
        assert!(html.contains("일일 영수증 기록 내역서"));
        assert!(html.contains("현장명: 강남 아파트"));
        assert!(html.contains("당일 총 사용비: 35,000원"));
        assert!(html.contains("<td>-</td>"));
        assert!(html.contains("상기와 같이 2024년 3월 5일 사용내역을 기록하였음을 확인합니다."));
    }
}
