//! Plain-text rendering of query results.
//!
//! Tables, dates and sparklines for terminal output. Everything here
//! returns strings; printing is left to the caller.

use chrono::{DateTime, Datelike, TimeZone, Timelike};
use std::fmt::Display;

use crate::curators::{CuratorDetail, CuratorSnapshot, CuratorSummary};
use crate::query::{Field, QueryOutput};

/// Longest description shown for a curator.
const MAX_DESCRIPTION_CHARS: usize = 1000;

/// Sparkline levels, lowest first.
const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Renders an aligned table with a header separator.
pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            let len = cell.chars().count();
            match widths.get_mut(i) {
                Some(w) => *w = (*w).max(len),
                None => widths.push(len),
            }
        }
    }

    let mut out = String::new();
    push_line(&mut out, headers, &widths);
    let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_line(&mut out, &separator, &widths);
    for row in rows {
        push_line(&mut out, row, &widths);
    }
    out
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let line = widths
        .iter()
        .enumerate()
        .map(|(i, w)| {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            let pad = w.saturating_sub(cell.chars().count());
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect::<Vec<_>>()
        .join(" | ");
    out.push_str(line.trim_end());
    out.push('\n');
}

/// Renders any query output as a table.
///
/// Nulls show as `NULL`; columns of undecoded types show their type tag.
pub fn render_output(output: &QueryOutput) -> String {
    let headers: Vec<String> = output.columns.names().map(String::from).collect();
    let rows: Vec<Vec<String>> = output
        .rows
        .iter()
        .map(|row| {
            row.fields()
                .iter()
                .map(|(_, field)| match field {
                    Field::Value(v) => v.to_string(),
                    Field::Unsupported { declared_type } => format!("<{declared_type}>"),
                })
                .collect()
        })
        .collect();

    let mut out = render_table(&headers, &rows);
    out.push_str(&format!("({} rows", output.rows.len()));
    if output.total_rows != output.rows.len() as u64 {
        out.push_str(&format!(" of {}", output.total_rows));
    }
    out.push_str(")\n");
    if let Some(warning) = output.truncation_warning() {
        out.push_str(&warning);
        out.push('\n');
    }
    out
}

/// Renders rows as a JSON array of objects.
pub fn render_json(output: &QueryOutput) -> String {
    let rows: Vec<serde_json::Value> = output.rows.iter().map(|r| r.to_json()).collect();
    serde_json::to_string_pretty(&rows).unwrap_or_else(|_| "[]".to_string())
}

/// English ordinal suffix for a day of the month.
fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

/// Formats a review timestamp like `16th Oct 2026, 3pm`.
pub fn format_review_date<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    let day = dt.day();
    format!(
        "{day}{} {}, {}",
        ordinal_suffix(day),
        dt.format("%b %Y"),
        format_hour(dt.hour())
    )
}

/// Formats a chart label like `Oct 16th`.
pub fn format_day_label<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    let day = dt.day();
    format!("{} {day}{}", dt.format("%b"), ordinal_suffix(day))
}

fn format_hour(hour: u32) -> String {
    let suffix = if hour < 12 { "am" } else { "pm" };
    let h12 = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{h12}{suffix}")
}

/// Formats a ratio as a percentage with at most two decimals.
pub fn favourable_percent(ratio: f64) -> String {
    let rounded = (ratio * 10000.0).round() / 100.0;
    format!("{rounded}%")
}

/// One-line sparkline scaled from zero to the largest value.
pub fn sparkline(values: &[i64]) -> String {
    let max = values.iter().copied().max().unwrap_or(0);
    values
        .iter()
        .map(|&v| {
            if max <= 0 || v <= 0 {
                return SPARK_LEVELS[0];
            }
            let idx = (v as f64 / max as f64 * (SPARK_LEVELS.len() - 1) as f64).round() as usize;
            SPARK_LEVELS[idx.min(SPARK_LEVELS.len() - 1)]
        })
        .collect()
}

/// Renders the curator listing with its headline.
pub fn render_curator_list<Tz: TimeZone>(
    curators: &[CuratorSummary],
    is_top_listing: bool,
    tz: &Tz,
) -> String
where
    Tz::Offset: Display,
{
    let mut out = crate::curators::search_summary(curators.len(), is_top_listing);
    out.push('\n');
    if curators.is_empty() {
        return out;
    }

    let headers = [
        "ID",
        "Name",
        "Followers",
        "Total Reviews",
        "% Favourable",
        "Last Review",
    ]
    .map(String::from);
    let rows: Vec<Vec<String>> = curators
        .iter()
        .map(|c| {
            vec![
                c.id.to_string(),
                c.name.clone(),
                c.followers.to_string(),
                c.total_reviews.to_string(),
                favourable_percent(c.percent_favourable),
                c.last_review
                    .map(|d| format_review_date(&d.with_timezone(tz)))
                    .unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();

    out.push_str(&render_table(&headers, &rows));
    out
}

fn series_line(label: &str, history: &[CuratorSnapshot], pick: fn(&CuratorSnapshot) -> i64) -> String {
    let values: Vec<i64> = history.iter().map(pick).collect();
    let last = values.last().copied().unwrap_or(0);
    format!("{label:<22} {} {last}\n", sparkline(&values))
}

/// Renders a curator's details and history.
pub fn render_curator_detail<Tz: TimeZone>(detail: &CuratorDetail, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    let info = &detail.info;
    let description: String = info.description.chars().take(MAX_DESCRIPTION_CHARS).collect();
    let last_review = info
        .last_review
        .map(|d| format_review_date(&d.with_timezone(tz)))
        .unwrap_or_else(|| "-".to_string());

    let mut out = format!("{}\n", info.name);
    if !info.url.is_empty() {
        out.push_str(&format!("{}\n", info.url));
    }
    out.push('\n');
    if !description.is_empty() {
        out.push_str(&format!("{description}\n\n"));
    }
    out.push_str(&format!("Followers:             {}\n", info.followers));
    out.push_str(&format!("Positive Reviews:      {}\n", info.positive_reviews));
    out.push_str(&format!("Negative Reviews:      {}\n", info.negative_reviews));
    out.push_str(&format!("Info Reviews:          {}\n", info.informational_reviews));
    out.push_str(&format!("Last Review Date:      {last_review}\n"));

    if let (Some(first), Some(last)) = (detail.history.first(), detail.history.last()) {
        out.push_str(&format!(
            "\nHistory ({} to {}, {} snapshots)\n",
            format_day_label(&first.date.with_timezone(tz)),
            format_day_label(&last.date.with_timezone(tz)),
            detail.history.len()
        ));
        out.push_str(&series_line("Followers", &detail.history, |s| s.followers));
        out.push_str(&series_line("Positive Reviews", &detail.history, |s| s.positive_reviews));
        out.push_str(&series_line(
            "Informational Reviews",
            &detail.history,
            |s| s.informational_reviews,
        ));
        out.push_str(&series_line("Negative Reviews", &detail.history, |s| s.negative_reviews));
    }
    out
}
