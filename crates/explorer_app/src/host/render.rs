use std::io::{self, Write};

use chrono::{DateTime, Utc};
use explorer_core::{PanelViewModel, SourceRowView, SourceStatus};
use serde::Serialize;

const BAR_WIDTH: usize = 20;

pub fn render_text(
    out: &mut impl Write,
    query: &str,
    started_at: DateTime<Utc>,
    view: &PanelViewModel,
) -> io::Result<()> {
    let session_label = if view.searching { "Searching" } else { "Idle" };
    let query_label = if query.is_empty() { "(all)" } else { query };
    writeln!(
        out,
        "Search {query_label:?} | Session {} {session_label} | started {} | {}/{} settled, {} failed",
        view.epoch,
        started_at.to_rfc3339(),
        view.settled(),
        view.rows.len(),
        view.failed,
    )?;
    for row in &view.rows {
        writeln!(out, "  {}", format_source_row(row))?;
    }
    writeln!(out)
}

#[derive(Serialize)]
struct JsonFrame<'a> {
    query: &'a str,
    started_at: String,
    panel: &'a PanelViewModel,
}

/// Writes the panel as one JSON object per line.
pub fn render_json(
    out: &mut impl Write,
    query: &str,
    started_at: DateTime<Utc>,
    view: &PanelViewModel,
) -> io::Result<()> {
    let frame = JsonFrame {
        query,
        started_at: started_at.to_rfc3339(),
        panel: view,
    };
    serde_json::to_writer(&mut *out, &frame)?;
    writeln!(out)
}

pub fn format_source_row(row: &SourceRowView) -> String {
    let status = status_label(row.status);
    let label = format!("{} ({})", row.name, row.category);
    match (row.progress, row.info.as_deref()) {
        (Some(progress), Some(info)) => format!(
            "{label:<32} {} {progress:>5.1}% {status:<9} {info}",
            progress_bar(progress)
        ),
        (Some(progress), None) => format!(
            "{label:<32} {} {progress:>5.1}% {status}",
            progress_bar(progress)
        ),
        _ => format!("{label:<32} {status}"),
    }
}

/// Fixed-width bar, e.g. `[#####...............]` for 25%.
pub fn progress_bar(progress: f64) -> String {
    let clamped = progress.clamp(0.0, 100.0);
    let filled = ((clamped / 100.0) * BAR_WIDTH as f64).floor() as usize;
    let filled = filled.min(BAR_WIDTH);
    format!("[{}{}]", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

fn status_label(status: SourceStatus) -> &'static str {
    match status {
        SourceStatus::Idle => "Idle",
        SourceStatus::Searching => "Searching",
        SourceStatus::Complete => "OK",
        SourceStatus::Error => "ERR",
    }
}
