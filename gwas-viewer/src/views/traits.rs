//! Extracted traits view

use gwas_common::FieldStatus;
use std::fmt::Write as _;

use super::{escape_html, warning_box};
use crate::report::TraitReport;

pub fn render(report: Option<&TraitReport>) -> String {
    let Some(report) = report else {
        return warning_box("No trait data found for this document.");
    };

    let completeness = &report.completeness;
    let mut html = String::new();

    let _ = write!(
        html,
        r#"<section class="stats">
<div><p class="stat-value">{}/{}</p><p class="stat-label">Traits Found</p></div>
<div><p class="stat-value">{:.1}%</p><p class="stat-label">Accuracy</p></div>
<div><p class="stat-value">{}</p><p class="stat-label">Not Reported</p></div>
<div><p class="stat-value">{}</p><p class="stat-label">Evidence Type</p></div>
</section>"#,
        completeness.found_count,
        completeness.total,
        completeness.accuracy_pct,
        completeness.not_reported(),
        escape_html(report.evidence_type())
    );

    html.push_str(r#"<h2>🧬 Extracted Genomic Data</h2><div class="trait-grid">"#);
    for entry in &report.fields {
        match &entry.status {
            FieldStatus::Found(value) => {
                let _ = write!(
                    html,
                    r#"<div class="trait-card found"><span class="trait-status found">Found</span><h4>{} {}</h4><p class="trait-value">{}</p></div>"#,
                    entry.icon,
                    entry.label,
                    escape_html(value)
                );
            }
            FieldStatus::NotFound => {
                let _ = write!(
                    html,
                    r#"<div class="trait-card not-found"><span class="trait-status not-found">Not Found</span><h4>{} {}</h4><p class="trait-not-found">Not reported in paper</p></div>"#,
                    entry.icon, entry.label
                );
            }
        }
    }
    html.push_str("</div>");

    let traits_extracted = report
        .record
        .traits_extracted
        .map_or_else(|| "N/A".to_string(), |n| n.to_string());

    let _ = write!(
        html,
        r#"<h2>📊 Extraction Metadata</h2>
<div class="columns" style="grid-template-columns: repeat(3, 1fr)">
<div class="metric-card"><h4>Extraction Source</h4><p>{}</p></div>
<div class="metric-card"><h4>Confidence Summary</h4><p>{}</p></div>
<div class="metric-card"><h4>Traits Extracted</h4><p>{}/{}</p></div>
</div>"#,
        report.pipeline_label,
        escape_html(&report.confidence_summary),
        traits_extracted,
        completeness.total
    );

    html
}
