use std::{
    io::{self, BufRead},
    path::PathBuf,
};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::{
    api::{RestoreCategory, RestoreMode},
    console::{ActionOutcome, BackupConsole, events::UiEvent, notify::Toast},
    web::history_ui::format_record_date,
};

const HELP: &str = "\
commands:
  list                              show the current history page
  more                              show the next page
  all | recent                      switch between full and recent history
  retry                             reload history
  create [name]                     create a backup
  upload <path>                     restore from a JSON export
  restore <id>                      restore a history entry
  smart <id> <category> [mode]      restore one category (merge|replace)
  delete <id>                       delete a history entry
  clear                             dismiss notifications
  help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Event(UiEvent),
    Create(String),
    Upload(PathBuf),
    ClearToasts,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(Command::List);
        };
        let args: Vec<&str> = words.collect();

        let command = match verb.to_ascii_lowercase().as_str() {
            "list" | "ls" => Command::List,
            "more" => Command::Event(UiEvent::ScrollEnd),
            "all" => Command::Event(UiEvent::ShowAll(true)),
            "recent" => Command::Event(UiEvent::ShowAll(false)),
            "retry" => Command::Event(UiEvent::RetryHistory),
            "create" => Command::Create(args.join(" ")),
            "upload" => {
                if args.is_empty() {
                    return Err("usage: upload <path>".to_string());
                }
                Command::Upload(PathBuf::from(args.join(" ")))
            }
            "restore" => Command::Event(UiEvent::RestoreEntry {
                id: single_id(&args, "restore <id>")?,
            }),
            "delete" | "rm" => Command::Event(UiEvent::DeleteEntry {
                id: single_id(&args, "delete <id>")?,
            }),
            "smart" => parse_smart(&args)?,
            "clear" => Command::ClearToasts,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(format!("unknown command `{other}`, type `help`")),
        };
        Ok(command)
    }
}

fn single_id(args: &[&str], usage: &str) -> Result<i64, String> {
    match args {
        [raw] => parse_id(raw),
        _ => Err(format!("usage: {usage}")),
    }
}

fn parse_id(raw: &str) -> Result<i64, String> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| format!("`{raw}` is not a backup id"))
}

fn parse_smart(args: &[&str]) -> Result<Command, String> {
    const USAGE: &str = "usage: smart <id> <category> [merge|replace]";

    let (id, category, mode) = match args {
        [id, category] => (id, category, None),
        [id, category, mode] => (id, category, Some(mode)),
        _ => return Err(USAGE.to_string()),
    };

    let id = parse_id(id)?;
    let category = RestoreCategory::parse(category).ok_or_else(|| {
        let known: Vec<&str> = RestoreCategory::ALL.iter().map(|c| c.as_str()).collect();
        format!("unknown category `{category}`, expected one of: {}", known.join(", "))
    })?;
    let mode = match mode {
        Some(raw) => RestoreMode::parse(raw).ok_or_else(|| format!("unknown mode `{raw}`"))?,
        None => RestoreMode::default(),
    };

    Ok(Command::Event(UiEvent::SmartRestore { id, category, mode }))
}

/// Reads commands from stdin until `quit` or end of input.
pub async fn run(mut console: BackupConsole, snapshot: Option<PathBuf>) -> Result<()> {
    println!("{HELP}");
    console.load_history(false).await;
    report(&console, snapshot.as_ref()).await;

    loop {
        let Some(line) = read_line().await? else {
            debug!("stdin closed");
            break;
        };

        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };

        match command {
            Command::Quit => break,
            Command::Help => {
                println!("{HELP}");
                continue;
            }
            Command::List => {}
            Command::ClearToasts => {
                for toast in console.notifier().active() {
                    console.notifier().dismiss(toast.id);
                }
            }
            Command::Create(name) => {
                console.set_backup_name(name);
                console.create_backup().await;
            }
            Command::Upload(path) => {
                if console.select_upload(path).await == ActionOutcome::Completed {
                    console.restore_upload().await;
                }
            }
            Command::Event(event) => {
                let outcome = console.handle_event(event).await;
                debug!(?outcome, "command handled");
            }
        }

        report(&console, snapshot.as_ref()).await;
    }

    Ok(())
}

async fn read_line() -> Result<Option<String>> {
    tokio::task::spawn_blocking(|| {
        print!("> ");
        io::Write::flush(&mut io::stdout())?;

        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line)?;
        Ok::<_, io::Error>((read > 0).then_some(line))
    })
    .await
    .context("stdin reader panicked")?
    .context("failed to read command")
}

async fn report(console: &BackupConsole, snapshot: Option<&PathBuf>) {
    let state = console.state();
    if let Some(error) = &state.last_error {
        println!("history unavailable: {error} (type `retry`)");
    } else if state.records.is_empty() {
        println!("No backup records found.");
    } else {
        for record in state.visible_records() {
            println!(
                "{:>5}  {:<20}  {:<8}  {}",
                record.id,
                format_record_date(&record.date),
                record.operation_type.label(),
                record.file_name
            );
        }
    }

    let status = &console.document().status_line;
    if !status.is_empty() {
        println!("{status}");
    }
    for toast in console.notifier().active() {
        println!("{}", toast_line(&toast));
    }

    if let Some(path) = snapshot {
        if let Err(err) = tokio::fs::write(path, console.render_page()).await {
            warn!(?err, path = %path.display(), "failed to write page snapshot");
        }
    }
}

fn toast_line(toast: &Toast) -> String {
    format!("[{}] {}", toast.severity.as_str(), toast.message)
}
