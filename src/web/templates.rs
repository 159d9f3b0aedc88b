use chrono::{Datelike, Utc};

use crate::{
    console::{
        document::{Control, Document},
        notify::Toast,
    },
    web::{history_ui, toast_ui},
};

const CONSOLE_PAGE_STYLES: &str = r#"
        :root { color-scheme: light; }
        body { font-family: "Helvetica Neue", Arial, sans-serif; margin: 0; background: #f8fafc; color: #0f172a; }
        header { background: #ffffff; padding: 2rem 1.5rem; border-bottom: 1px solid #e2e8f0; }
        main { padding: 2rem 1.5rem; max-width: 960px; margin: 0 auto; box-sizing: border-box; }
        section { margin-bottom: 2.5rem; }
        .panel { background: #ffffff; border-radius: 12px; border: 1px solid #e2e8f0; padding: 1.5rem; box-shadow: 0 18px 40px rgba(15, 23, 42, 0.08); }
        .panel h2 { margin-top: 0; }
        label { display: block; margin-bottom: 0.5rem; font-weight: 600; color: #0f172a; }
        input[type="text"] { width: 100%; padding: 0.75rem; border-radius: 8px; border: 1px solid #cbd5f5; background: #f8fafc; box-sizing: border-box; }
        button { padding: 0.6rem 1rem; border: none; border-radius: 8px; background: #2563eb; color: #ffffff; font-weight: 600; cursor: pointer; }
        button:disabled { opacity: 0.6; cursor: not-allowed; }
        button.btn-delete { background: #dc2626; }
        table { width: 100%; border-collapse: collapse; margin-top: 1.5rem; background: #ffffff; border: 1px solid #e2e8f0; }
        th, td { padding: 0.75rem 1rem; border-bottom: 1px solid #e2e8f0; text-align: left; }
        th { background: #f1f5f9; font-weight: 600; }
        .badge { display: inline-flex; padding: 0.25rem 0.75rem; border-radius: 999px; font-size: 0.85rem; font-weight: 600; }
        .badge-backup { background: #dcfce7; color: #166534; }
        .badge-restore { background: #e0f2fe; color: #1d4ed8; }
        .badge-other { background: #f1f5f9; color: #475569; }
        .history-status { margin-top: 1rem; color: #475569; font-size: 0.95rem; }
        .history-error-row td { color: #b91c1c; }
        .note { color: #475569; font-size: 0.95rem; line-height: 1.6; }
        .toast-stack { position: fixed; top: 1rem; right: 1rem; display: flex; flex-direction: column; gap: 0.5rem; }
        .toast { padding: 0.85rem 1.2rem; border-radius: 10px; color: #ffffff; box-shadow: 0 12px 30px rgba(15, 23, 42, 0.15); transition: opacity 0.3s ease; }
        .toast.fading { opacity: 0; }
        .toast-success { background: #16a34a; }
        .toast-error { background: #dc2626; }
        .toast-warning { background: #d97706; }
        .toast-info { background: #2563eb; }
        .app-footer { margin-top: 3rem; text-align: center; font-size: 0.85rem; color: #94a3b8; }
"#;

/// Full page for the current document and toast stack.
pub fn render_console_page(document: &Document, toasts: &[Toast]) -> String {
    let create_disabled = disabled_attr(document.is_busy(&Control::CreateBackup));
    let upload_disabled = disabled_attr(document.is_busy(&Control::RestoreUpload));
    let selected = document
        .selected_upload
        .as_ref()
        .map(|file| escape_html(&file.name))
        .unwrap_or_else(|| "No file selected".to_string());

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Backup &amp; Restore</title>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="robots" content="noindex,nofollow">
    <style>
{styles}
    </style>
</head>
<body>
    <header>
        <h1>Backup &amp; Restore</h1>
        <p class="note">Create backups, restore from an uploaded file or from history.</p>
    </header>
    <main>
        <section class="panel">
            <h2>Create backup</h2>
            <label for="backup-name">Backup name (optional)</label>
            <input id="backup-name" type="text" maxlength="50" value="{backup_name}">
            <button type="button" data-action="create-backup"{create_disabled}>Create backup</button>
        </section>
        <section class="panel">
            <h2>Restore from file</h2>
            <p class="note">Selected: {selected}</p>
            <button type="button" data-action="restore-upload"{upload_disabled}>Restore</button>
        </section>
{history_panel}
        {footer}
    </main>
{toasts}
</body>
</html>"#,
        styles = CONSOLE_PAGE_STYLES,
        backup_name = escape_html(&document.backup_name_input),
        create_disabled = create_disabled,
        selected = selected,
        upload_disabled = upload_disabled,
        history_panel = history_ui::render_history_panel(document),
        footer = render_footer(),
        toasts = toast_ui::render_toasts(toasts),
    )
}

pub fn render_footer() -> String {
    let current_year = Utc::now().year();
    format!(
        r#"<footer class="app-footer">© {year} Backup console, internal use only</footer>"#,
        year = current_year
    )
}

fn disabled_attr(busy: bool) -> &'static str {
    if busy { " disabled" } else { "" }
}

/// Escapes the five HTML-special characters in a single pass.
///
/// Not idempotent: an existing entity has its `&` escaped again, so callers
/// must escape raw text exactly once.
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
