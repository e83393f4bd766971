//! Server-rendered HTML views
//!
//! Every view is a pure function from fetched data to an HTML string. The
//! selected document travels in the `doc` query parameter, so links and the
//! selector form always carry it explicitly.

use gwas_common::{Completeness, DocumentSummary};
use std::fmt::Write as _;

pub mod analytics;
pub mod chat;
pub mod pages;
pub mod raw;
pub mod traits;

/// Navigation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Traits,
    Pages,
    Analytics,
    Raw,
    Chat,
}

impl View {
    pub const ALL: [View; 5] = [View::Traits, View::Pages, View::Analytics, View::Raw, View::Chat];

    pub fn path(self) -> &'static str {
        match self {
            View::Traits => "/",
            View::Pages => "/pages",
            View::Analytics => "/analytics",
            View::Raw => "/raw",
            View::Chat => "/chat",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            View::Traits => "🧬 Extracted Traits",
            View::Pages => "📄 Page Browser",
            View::Analytics => "📊 Analytics",
            View::Raw => "🔍 Raw Data",
            View::Chat => "🤖 Ask Questions",
        }
    }
}

/// Sidebar quick stats for the selected document
#[derive(Debug, Clone)]
pub struct QuickStats {
    pub completeness: Completeness,
    pub source: String,
}

/// Sidebar shown on every view
pub struct Sidebar<'a> {
    pub view: View,
    pub documents: &'a [DocumentSummary],
    pub selected: &'a DocumentSummary,
    pub quick_stats: Option<QuickStats>,
}

/// Escape text for HTML element content and attribute values
pub fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Percent-encode a query parameter value
pub fn encode_query_value(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => {
                let _ = write!(encoded, "%{:02X}", byte);
            }
        }
    }
    encoded
}

/// Link to a view for a document, with optional extra query text
pub fn view_href(view: View, document_id: &str, extra: &str) -> String {
    format!("{}?doc={}{}", view.path(), encode_query_value(document_id), extra)
}

/// Inline warning box
pub fn warning_box(message: &str) -> String {
    format!(r#"<div class="notice warning">⚠️ {}</div>"#, escape_html(message))
}

/// Inline info box
pub fn info_box(message: &str) -> String {
    format!(r#"<div class="notice info">💡 {}</div>"#, escape_html(message))
}

/// Horizontal bar chart; bar widths are relative to the largest value
pub fn bar_chart(rows: &[(String, f64)], unit: &str) -> String {
    let max = rows.iter().map(|(_, v)| *v).fold(0.0_f64, f64::max);
    let mut html = String::from(r#"<div class="bar-chart">"#);

    for (label, value) in rows {
        let width = if max > 0.0 { 100.0 * value / max } else { 0.0 };
        let _ = write!(
            html,
            r#"<div class="bar-row"><span class="bar-label">{}</span><span class="bar-track"><span class="bar-fill" style="width: {:.1}%"></span></span><span class="bar-value">{}{}</span></div>"#,
            escape_html(label),
            width,
            value,
            unit
        );
    }

    html.push_str("</div>");
    html
}

fn render_sidebar(sidebar: &Sidebar<'_>) -> String {
    let selected = sidebar.selected;
    let doc_id = selected.document_id.as_str();
    let mut html = String::new();

    html.push_str(r#"<nav class="nav">"#);
    for view in View::ALL {
        let class = if view == sidebar.view { "nav-link active" } else { "nav-link" };
        let _ = write!(
            html,
            r#"<a class="{}" href="{}">{}</a>"#,
            class,
            escape_html(&view_href(view, doc_id, "")),
            view.title()
        );
    }
    html.push_str("</nav>");

    html.push_str(r#"<h3>📁 Document Selection</h3>"#);
    let _ = write!(
        html,
        r#"<form method="get" action="{}"><label for="doc">Choose a document:</label><select id="doc" name="doc" onchange="this.form.submit()">"#,
        sidebar.view.path()
    );
    for doc in sidebar.documents {
        let selected_attr = if doc.document_id == selected.document_id { " selected" } else { "" };
        let _ = write!(
            html,
            r#"<option value="{}"{}>{}</option>"#,
            escape_html(&doc.document_id),
            selected_attr,
            escape_html(&doc.selector_label())
        );
    }
    html.push_str(r#"</select><noscript><button type="submit">Open</button></noscript></form>"#);

    let _ = write!(
        html,
        r#"<hr><h3>📄 Document Info</h3>
<div class="metric-card"><h4>Filename</h4><p>{}</p></div>
<div class="metric-card"><h4>Pages</h4><p>{}</p></div>
<div class="metric-card"><h4>Extracted</h4><p>{}</p></div>"#,
        escape_html(&selected.pdf_filename),
        selected.page_count,
        selected.extraction_timestamp.format("%Y-%m-%d")
    );

    if let Some(stats) = &sidebar.quick_stats {
        let _ = write!(
            html,
            r#"<hr><h3>🔍 Quick Stats</h3>
<div class="metric"><span>Traits Extracted</span><strong>{}/{}</strong></div>
<div class="metric"><span>Accuracy</span><strong>{:.1}%</strong></div>
<div class="metric"><span>Source</span><strong>{}</strong></div>"#,
            stats.completeness.found_count,
            stats.completeness.total,
            stats.completeness.accuracy_pct,
            escape_html(&stats.source)
        );
    }

    let _ = write!(
        html,
        r#"<hr><h3>📥 Download</h3>
<details><summary>📄 PDF location</summary>
<p><code>{url}</code></p>
<p class="caption">To download, use GET from the warehouse client or download from the stage:</p>
<pre>GET {url} file:///local/path/</pre></details>"#,
        url = escape_html(&selected.file_url)
    );

    html
}

/// Full page with sidebar
pub fn render_page(title: &str, sidebar: &Sidebar<'_>, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title} · GWAS Trait Explorer</title>
<style>{STYLE}</style>
</head>
<body>
<aside class="sidebar">{sidebar}</aside>
<main class="content">
<header><h1>🧬 GWAS Trait Explorer</h1><p class="subtitle">Explore genomic data extracted from research papers</p></header>
{body}
</main>
</body>
</html>"#,
        title = escape_html(title),
        sidebar = render_sidebar(sidebar),
        body = body,
    )
}

/// Shown instead of any view when the warehouse has no documents
pub fn render_no_documents() -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<title>GWAS Trait Explorer</title>
<style>{STYLE}</style>
</head>
<body>
<main class="content">
<header><h1>🧬 GWAS Trait Explorer</h1></header>
{}
{}
</main>
</body>
</html>"#,
        warning_box("No documents found in the database."),
        info_box("Please run the GWAS extraction pipeline first.")
    )
}

const STYLE: &str = r#"
* { margin: 0; padding: 0; box-sizing: border-box; }
body { font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; background: #1a1a1a; color: #e0e0e0; line-height: 1.6; display: flex; min-height: 100vh; }
.sidebar { width: 300px; background: #232323; border-right: 1px solid #3a3a3a; padding: 20px; }
.sidebar h3 { color: #4a9eff; font-size: 16px; margin: 12px 0 8px; }
.sidebar select { width: 100%; padding: 6px; background: #2a2a2a; color: #e0e0e0; border: 1px solid #3a3a3a; border-radius: 4px; }
.sidebar hr { border: none; border-top: 1px solid #3a3a3a; margin: 14px 0; }
.nav { display: flex; flex-direction: column; gap: 4px; margin-bottom: 12px; }
.nav-link { color: #e0e0e0; text-decoration: none; padding: 6px 10px; border-radius: 4px; }
.nav-link.active, .nav-link:hover { background: #4a9eff; color: #fff; }
.content { flex: 1; padding: 24px 32px; }
header { border-bottom: 1px solid #3a3a3a; margin-bottom: 24px; padding-bottom: 12px; }
h1 { color: #4a9eff; font-size: 26px; }
h2 { color: #4a9eff; margin: 20px 0 10px; }
.subtitle, .caption { color: #888; font-size: 14px; }
.metric-card { background: #2a2a2a; border: 1px solid #3a3a3a; border-radius: 6px; padding: 10px 14px; margin-bottom: 8px; }
.metric-card h4 { color: #888; font-size: 12px; text-transform: uppercase; }
.metric { display: flex; justify-content: space-between; padding: 4px 0; }
.stats { display: grid; grid-template-columns: repeat(4, 1fr); gap: 16px; background: #2a2a2a; border-radius: 8px; padding: 16px; margin-bottom: 24px; }
.stat-value { font-size: 24px; font-weight: 700; color: #4a9eff; }
.stat-label { color: #888; font-size: 13px; }
.trait-grid { display: grid; grid-template-columns: repeat(2, 1fr); gap: 12px; }
.trait-card { background: #2a2a2a; border-radius: 6px; padding: 12px 16px; border-left: 4px solid #10b981; }
.trait-card.not-found { border-left-color: #ef4444; opacity: 0.8; }
.trait-status { float: right; font-size: 12px; font-weight: 600; }
.trait-status.found { color: #10b981; }
.trait-status.not-found { color: #ef4444; }
.trait-not-found { color: #888; font-style: italic; }
.notice { border-radius: 6px; padding: 10px 14px; margin: 10px 0; }
.notice.warning { background: #3b2f12; border: 1px solid #f59e0b; }
.notice.info { background: #122a3b; border: 1px solid #4a9eff; }
.notice.error { background: #3b1212; border: 1px solid #ef4444; }
.bar-chart { display: flex; flex-direction: column; gap: 6px; margin: 10px 0; }
.bar-row { display: grid; grid-template-columns: 180px 1fr 90px; gap: 10px; align-items: center; }
.bar-track { background: #2a2a2a; border-radius: 4px; height: 16px; }
.bar-fill { display: block; height: 16px; background: #4a9eff; border-radius: 4px; }
.columns { display: grid; grid-template-columns: 1fr 1fr; gap: 24px; }
table { border-collapse: collapse; width: 100%; font-size: 13px; margin: 8px 0; }
th, td { border: 1px solid #3a3a3a; padding: 4px 8px; text-align: left; vertical-align: top; }
th { background: #2a2a2a; }
pre, code { font-family: 'Courier New', monospace; background: #111; border-radius: 4px; }
pre { padding: 10px; overflow-x: auto; white-space: pre-wrap; }
textarea, input { background: #2a2a2a; color: #e0e0e0; border: 1px solid #3a3a3a; border-radius: 4px; padding: 6px; }
button { background: #4a9eff; color: #fff; border: none; border-radius: 4px; padding: 8px 16px; font-weight: 600; cursor: pointer; }
.chat-log { display: flex; flex-direction: column; gap: 10px; margin: 16px 0; }
.chat-message { background: #2a2a2a; border-radius: 6px; padding: 10px 14px; white-space: pre-wrap; }
.chat-message.user { border-left: 4px solid #888; }
.chat-message.assistant { border-left: 4px solid #4a9eff; }
"#;
