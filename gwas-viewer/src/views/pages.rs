//! Page browser view

use gwas_common::display::truncate_chars;
use gwas_common::PageRecord;
use std::fmt::Write as _;

use super::{encode_query_value, escape_html, info_box, warning_box, View};

/// Characters of page text shown before truncation
pub const PAGE_TEXT_PREVIEW_CHARS: usize = 2000;

/// Render the page browser for `pages`, showing `requested` (or the first page)
pub fn render(document_id: &str, pages: &[PageRecord], requested: Option<i64>) -> String {
    if pages.is_empty() {
        return warning_box("No page data found for this document.");
    }

    let mut numbers: Vec<i64> = pages.iter().map(|p| p.page_number).collect();
    numbers.sort_unstable();
    numbers.dedup();

    let selected = requested
        .filter(|n| numbers.contains(n))
        .unwrap_or(numbers[0]);
    let Some(page) = pages.iter().find(|p| p.page_number == selected) else {
        return warning_box("No page data found for this document.");
    };

    let mut html = String::from(
        r#"<h2>📄 Page Browser</h2><p class="subtitle">Explore individual pages with text and images</p>"#,
    );

    let _ = write!(
        html,
        r#"<form method="get" action="{}"><input type="hidden" name="doc" value="{}"><label for="page">Select page:</label> <select id="page" name="page" onchange="this.form.submit()">"#,
        View::Pages.path(),
        escape_html(document_id)
    );
    for n in &numbers {
        let selected_attr = if *n == selected { " selected" } else { "" };
        let _ = write!(html, r#"<option value="{n}"{selected_attr}>Page {n}</option>"#);
    }
    html.push_str(r#"</select><noscript><button type="submit">Show</button></noscript></form>"#);

    html.push_str(r#"<div class="columns"><div><h3>📝 Page Text</h3>"#);
    match page.page_text.as_deref() {
        Some(text) if page.has_text && !text.is_empty() => {
            let _ = write!(
                html,
                "<pre>{}</pre>",
                escape_html(&truncate_chars(text, PAGE_TEXT_PREVIEW_CHARS))
            );
        }
        _ => html.push_str(&info_box("No text content for this page")),
    }
    html.push_str("</div><div><h3>🖼️ Page Image</h3>");
    match page.image_path.as_deref() {
        Some(path) if page.has_image && !path.is_empty() => {
            let _ = write!(
                html,
                r#"<div class="metric-card"><h4>Stage Path</h4><p><code>{}</code></p></div>"#,
                escape_html(path)
            );
        }
        _ => html.push_str(&warning_box("No image available for this page")),
    }
    html.push_str("</div></div>");

    let status = if page.is_complete() { "✓ Complete" } else { "⚠ Partial" };
    let _ = write!(
        html,
        r#"<h2>📊 Page Statistics</h2>
<section class="stats" style="grid-template-columns: repeat(3, 1fr)">
<div><p class="stat-value">{}</p><p class="stat-label">Page Number</p></div>
<div><p class="stat-value">{} chars</p><p class="stat-label">Text Length</p></div>
<div><p class="stat-value">{}</p><p class="stat-label">Status</p></div>
</section>"#,
        selected,
        group_thousands(page.text_length()),
        status
    );

    let _ = write!(
        html,
        r#"<p class="caption">Link: <code>{}?doc={}&amp;page={}</code></p>"#,
        View::Pages.path(),
        escape_html(&encode_query_value(document_id)),
        selected
    );

    html
}

/// `12345` → `12,345`
pub fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
