use crate::{
    console::notify::{Toast, ToastPhase},
    web::templates::escape_html,
};

pub fn render_toasts(toasts: &[Toast]) -> String {
    if toasts.is_empty() {
        return String::new();
    }

    let items = toasts
        .iter()
        .map(render_toast)
        .collect::<Vec<_>>()
        .join("\n");

    format!(r#"<div class="toast-stack" role="status" aria-live="polite">
{items}
</div>"#)
}

fn render_toast(toast: &Toast) -> String {
    let fading = match toast.phase {
        ToastPhase::Visible => "",
        ToastPhase::Fading => " fading",
    };

    format!(
        r#"    <div class="toast {class}{fading}" data-toast-id="{id}"><span class="toast-icon">{icon}</span> {message}</div>"#,
        class = toast.severity.css_class(),
        id = toast.id,
        icon = toast.severity.icon(),
        message = escape_html(&toast.message),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::notify::Severity;
    use uuid::Uuid;

    #[test]
    fn toasts_render_with_severity_class_and_escaped_text() {
        let toast = Toast {
            id: Uuid::new_v4(),
            severity: Severity::Error,
            message: "Restore failed: <bad file>".to_string(),
            phase: ToastPhase::Fading,
        };
        let html = render_toasts(&[toast]);
        assert!(html.contains(r#"class="toast toast-error fading""#));
        assert!(html.contains("Restore failed: &lt;bad file&gt;"));
    }

    #[test]
    fn no_toasts_render_nothing() {
        assert_eq!(render_toasts(&[]), "");
    }
}
