use colored::Colorize;
use itertools::Itertools;

use super::Report;

pub fn render_json(report: &Report) -> String {
    serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
}

pub fn render_text(report: &Report) -> String {
    let mut out = String::new();
    kv_line(&mut out, "source", &report.source);
    kv_line(&mut out, "results", &report.results.to_string());
    kv_line(&mut out, "records", &report.total_records.to_string());
    kv_line(
        &mut out,
        "page",
        &format!("{} / {}", report.current_page, report.total_pages),
    );
    if let Some(tags) = &report.tags {
        let rendered = if tags.is_empty() {
            "(none)".to_string()
        } else {
            tags.join(", ")
        };
        kv_line(&mut out, "tags", &rendered);
    }
    out.push('\n');

    for record in &report.records {
        out.push_str(&format!(
            "{} {}\n",
            format!("[{}]", record.position).bold().cyan(),
            record.excerpt
        ));
        if !record.attributes.is_empty() {
            let attrs = record
                .attributes
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .join(" ");
            out.push_str(&format!("    {}\n", attrs.dimmed()));
        }
    }

    if let Some(data) = &report.filter_data {
        out.push('\n');
        kv_line(&mut out, "per-page", &data.per_page_items.to_string());
        for (category, values) in &data.available {
            kv_line(&mut out, &format!("avail:{category}"), &values.iter().join(", "));
        }
    }
    out
}

fn kv_line(out: &mut String, label: &str, value: &str) {
    out.push_str(&format!("{} {:<10}: {}\n", "::".bold(), label, value));
}
