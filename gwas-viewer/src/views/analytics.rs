//! Analytics dashboard view

use std::fmt::Write as _;

use super::{bar_chart, escape_html, warning_box};
use crate::report::AnalyticsReport;

pub fn render(report: &AnalyticsReport) -> String {
    let Some(traits) = &report.traits else {
        return warning_box("No analytics data available.");
    };

    let completeness = &traits.completeness;
    let accuracy = &traits.accuracy;
    let mut html = String::from(r#"<h2>📊 Analytics Dashboard</h2><div class="columns"><div>"#);

    html.push_str("<h3>🎯 Extraction Summary</h3>");
    html.push_str(&bar_chart(
        &[
            ("Extracted".to_string(), completeness.found_count as f64),
            ("Not Reported".to_string(), completeness.not_reported() as f64),
        ],
        "",
    ));

    match accuracy.reported_pct {
        Some(reported) => {
            let _ = write!(
                html,
                r#"<div class="metric"><span>Extraction Accuracy (reported)</span><strong>{:.1}%</strong></div>"#,
                reported
            );
        }
        None => html.push_str(
            r#"<div class="metric"><span>Extraction Accuracy (reported)</span><strong>N/A</strong></div>"#,
        ),
    }
    let _ = write!(
        html,
        r#"<div class="metric"><span>Recomputed Accuracy</span><strong>{:.1}%</strong></div>"#,
        accuracy.recomputed_pct
    );
    if accuracy.diverges {
        let _ = write!(
            html,
            r#"<div class="notice warning">⚠️ The pipeline reported {:.1}% but the recomputed accuracy is {:.1}% ({:.1} points apart).</div>"#,
            accuracy.reported_pct.unwrap_or_default(),
            accuracy.recomputed_pct,
            accuracy.divergence_pct.unwrap_or_default()
        );
    }

    html.push_str("</div><div><h3>📈 Extraction Sources</h3>");
    let sources: Vec<(String, f64)> = traits
        .sources
        .iter()
        .map(|s| (s.display_name.clone(), s.count as f64))
        .collect();
    html.push_str(&bar_chart(&sources, ""));
    html.push_str("</div></div>");

    let counts = &report.page_counts;
    let _ = write!(
        html,
        r#"<h2>📄 Document Processing Stats</h2>
<section class="stats">
<div><p class="stat-value">{}</p><p class="stat-label">Total Pages</p></div>
<div><p class="stat-value">{}</p><p class="stat-label">Text Pages</p></div>
<div><p class="stat-value">{}</p><p class="stat-label">Image Pages</p></div>
<div><p class="stat-value">{}</p><p class="stat-label">Multimodal Pages</p></div>
</section>"#,
        counts.total_pages, counts.text_pages, counts.image_pages, counts.multimodal_pages
    );

    if !report.text_lengths.is_empty() {
        html.push_str("<h3>📏 Text Length Distribution by Page</h3>");
        let lengths: Vec<(String, f64)> = report
            .text_lengths
            .iter()
            .map(|s| (format!("Page {}", s.page_number), s.text_length as f64))
            .collect();
        html.push_str(&bar_chart(&lengths, " chars"));
    }

    let _ = write!(
        html,
        r#"<p class="caption">Document <code>{}</code></p>"#,
        escape_html(&report.document_id)
    );

    html
}
