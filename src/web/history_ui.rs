use chrono::{DateTime, Local, NaiveDateTime};

use crate::{
    api::BackupRecord,
    console::document::Document,
    web::templates::escape_html,
};

pub const HISTORY_COLUMNS: usize = 4;
pub const LOADING_TEXT: &str = "Loading backup history...";
pub const EMPTY_TEXT: &str = "No backup records found.";
const DISPLAY_DATE_FORMAT: &str = "%b %-d, %Y %H:%M";
const NAIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"];

/// Table body and status line produced for one render pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedHistory {
    pub rows_html: String,
    pub status_text: String,
    pub row_count: usize,
}

/// Projects the cached records onto table rows.
///
/// `limit` of `None` shows every record. Output depends only on the inputs.
pub fn render_history(records: &[BackupRecord], limit: Option<usize>) -> RenderedHistory {
    if records.is_empty() {
        return RenderedHistory {
            rows_html: render_message_row("history-empty-row", EMPTY_TEXT),
            status_text: String::new(),
            row_count: 0,
        };
    }

    let total = records.len();
    let shown = limit.map_or(total, |limit| limit.min(total));

    let rows_html = records[..shown]
        .iter()
        .map(render_record_row)
        .collect::<Vec<_>>()
        .join("\n");

    let status_text = match limit {
        None => format!("Showing all {total} backups"),
        Some(_) => format!("Showing {shown} of {total} backups"),
    };

    RenderedHistory {
        rows_html,
        status_text,
        row_count: shown,
    }
}

pub fn render_loading_row() -> String {
    render_message_row("history-loading-row", LOADING_TEXT)
}

/// Error row with a manual retry control.
pub fn render_error_row(message: &str) -> String {
    format!(
        r#"<tr class="history-error-row"><td colspan="{cols}">Failed to load backup history: {message} <button type="button" class="btn-retry" data-action="retry-history">Retry</button></td></tr>"#,
        cols = HISTORY_COLUMNS,
        message = escape_html(message),
    )
}

pub fn render_history_panel(document: &Document) -> String {
    format!(
        r#"        <section class="panel history-panel">
            <h2>Backup history</h2>
            <table class="history-table">
                <thead>
                    <tr>
                        <th>File</th>
                        <th>Date</th>
                        <th>Type</th>
                        <th>Actions</th>
                    </tr>
                </thead>
                <tbody data-history-body>
{rows}
                </tbody>
            </table>
            <p class="history-status" data-history-status>{status}</p>
        </section>"#,
        rows = document.history_body,
        status = escape_html(&document.status_line),
    )
}

fn render_record_row(record: &BackupRecord) -> String {
    let id = record.id;
    let file_name = escape_html(&record.file_name);

    format!(
        r#"<tr data-backup-id="{id}">
    <td class="file-name">{file_name}</td>
    <td class="backup-date">{date}</td>
    <td><span class="badge {badge}">{label}</span></td>
    <td class="actions">
        <button type="button" class="btn-restore" data-action="restore" data-backup-id="{id}" data-file-name="{file_name}">Restore</button>
        <button type="button" class="btn-delete" data-action="delete" data-backup-id="{id}" data-file-name="{file_name}">Delete</button>
    </td>
</tr>"#,
        date = escape_html(&format_record_date(&record.date)),
        badge = record.operation_type.badge_class(),
        label = escape_html(record.operation_type.label()),
    )
}

fn render_message_row(class: &str, text: &str) -> String {
    format!(
        r#"<tr class="{class}"><td colspan="{cols}">{text}</td></tr>"#,
        cols = HISTORY_COLUMNS,
        text = escape_html(text),
    )
}

/// Human-readable local time for a server timestamp. Values that do not
/// parse are returned unchanged.
pub fn format_record_date(raw: &str) -> String {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed
            .with_timezone(&Local)
            .format(DISPLAY_DATE_FORMAT)
            .to_string();
    }

    NAIVE_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.format(DISPLAY_DATE_FORMAT).to_string())
        .unwrap_or_else(|| raw.to_string())
}
