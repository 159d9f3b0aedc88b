pub mod history_ui;
pub mod templates;
pub mod toast_ui;
