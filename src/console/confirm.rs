use std::io::{self, BufRead, Write};

/// Asks the operator to approve a destructive action.
pub trait Confirm: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Prompts on the terminal and reads a `y`/`yes` answer from stdin.
pub struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        tokio::task::block_in_place(|| {
            let mut stdout = io::stdout();
            if write!(stdout, "{prompt} [y/N] ").and_then(|_| stdout.flush()).is_err() {
                return false;
            }

            let mut answer = String::new();
            match io::stdin().lock().read_line(&mut answer) {
                Ok(_) => is_yes(&answer),
                Err(_) => false,
            }
        })
    }
}

/// Fixed answer, for scripted runs.
pub struct AutoConfirm(pub bool);

impl Confirm for AutoConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
