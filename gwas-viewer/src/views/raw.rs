//! Raw data explorer view

use gwas_common::{DocumentSummary, PageRecord, TraitRecord, TRAIT_FIELDS};
use serde_json::json;
use std::fmt::Write as _;

use super::{escape_html, info_box};

fn cell(value: Option<&str>) -> String {
    match value {
        Some(v) => escape_html(v),
        None => r#"<span class="caption">NULL</span>"#.to_string(),
    }
}

fn opt_cell<T: ToString>(value: Option<T>) -> String {
    cell(value.map(|v| v.to_string()).as_deref())
}

pub fn render(document: &DocumentSummary, record: Option<&TraitRecord>, pages: &[PageRecord]) -> String {
    let mut html = String::from(
        r#"<h2>🔍 Raw Data Explorer</h2><p class="subtitle">View raw data from database tables</p>"#,
    );

    html.push_str(r#"<details open><summary>🧬 GWAS Traits Analytics</summary>"#);
    match record {
        Some(record) => {
            html.push_str("<table><thead><tr><th>Column</th><th>Value</th></tr></thead><tbody>");
            for field in TRAIT_FIELDS {
                let _ = write!(
                    html,
                    "<tr><td>{}</td><td>{}</td></tr>",
                    field.column(),
                    cell(record.value(field))
                );
            }
            let extra = [
                ("extraction_source", cell(record.extraction_source.as_deref())),
                ("field_citations", cell(record.field_citations.as_deref())),
                ("traits_extracted", opt_cell(record.traits_extracted)),
                ("traits_not_reported", opt_cell(record.traits_not_reported)),
                ("extraction_accuracy_pct", opt_cell(record.extraction_accuracy_pct)),
            ];
            for (column, value) in extra {
                let _ = write!(html, "<tr><td>{}</td><td>{}</td></tr>", column, value);
            }
            html.push_str("</tbody></table>");
        }
        None => html.push_str(&info_box("No trait data available")),
    }
    html.push_str("</details>");

    html.push_str(r#"<details><summary>📄 Multimodal Pages</summary>"#);
    if pages.is_empty() {
        html.push_str(&info_box("No page data available"));
    } else {
        html.push_str(
            "<table><thead><tr><th>page_number</th><th>page_text</th><th>image_path</th><th>has_text</th><th>has_image</th></tr></thead><tbody>",
        );
        for page in pages {
            let _ = write!(
                html,
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                page.page_number,
                cell(page.page_text.as_deref()),
                cell(page.image_path.as_deref()),
                page.has_text,
                page.has_image
            );
        }
        html.push_str("</tbody></table>");
    }
    html.push_str("</details>");

    let metadata = json!({
        "document_id": document.document_id,
        "pdf_filename": document.pdf_filename,
        "page_count": document.page_count,
        "file_url": document.file_url,
        "extraction_timestamp": document.extraction_timestamp.to_rfc3339(),
    });
    let metadata = serde_json::to_string_pretty(&metadata).unwrap_or_else(|_| metadata.to_string());
    let _ = write!(
        html,
        r#"<details><summary>📋 Document Metadata</summary><pre>{}</pre></details>"#,
        escape_html(&metadata)
    );

    html
}
