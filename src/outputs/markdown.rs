//! Markdown report of the extracted records.

use crate::models::ArticleRecord;

const HEADER: &str = "| Title | Date | Description | Image Filename | Search Count | Contains Money |\n\
                      |-------|------|-------------|----------------|--------------|----------------|\n";

/// Render `records` as a Markdown document with one table row per record.
pub fn records_to_markdown(title: &str, records: &[ArticleRecord]) -> String {
    let mut md = format!("# {title}\n\n");
    if records.is_empty() {
        md.push_str("_No articles found in the requested window._\n");
        return md;
    }

    md.push_str(&format!("{} articles.\n\n", records.len()));
    md.push_str(HEADER);
    for r in records {
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} |\n",
            cell(&r.title),
            r.published_at.format("%Y-%m-%d %H:%M"),
            cell(&r.description),
            r.image_filename.as_deref().map(cell).unwrap_or_default(),
            r.search_count,
            if r.contains_money { "yes" } else { "no" },
        ));
    }
    md
}

/// Table-safe cell text: pipes escaped, line breaks flattened.
fn cell(text: &str) -> String {
    text.replace('|', "\\|")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
