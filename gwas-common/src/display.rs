//! Presentation helpers shared by the HTML views and JSON API

/// Pipeline label for the extraction-metadata card
pub fn pipeline_label(extraction_source: Option<&str>) -> &'static str {
    match extraction_source {
        Some("multimodal_pipeline") => "Multimodal Pipeline",
        _ => "Text-Only Pipeline",
    }
}

/// Source name for the quick-stats sidebar: `text_only_pipeline` → `Text Only Pipeline`
pub fn source_title(extraction_source: Option<&str>) -> String {
    let Some(source) = extraction_source else {
        return "Unknown".to_string();
    };

    source
        .replace('_', " ")
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Truncate to at most `max_chars` characters, appending `...` when cut
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}
