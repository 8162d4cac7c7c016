//! Operator confirmation before any irreversible work.

use crate::error::FatalError;
use crate::model::User;
use std::collections::VecDeque;
use std::io::{BufRead, Write};

/// What the operator is asked to approve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub lines: Vec<String>,
    pub question: String,
}

impl Summary {
    /// Identity details of a single target user for manual verification.
    pub fn identity(user: &User) -> Self {
        Self {
            lines: vec![
                format!("Name: {}({})", user.name, user.id),
                format!("Email: {}", user.email),
            ],
            question: "Is this the correct user?".to_string(),
        }
    }

    pub fn count(action: &str, count: usize) -> Self {
        Self {
            lines: vec![format!("{action}: {count} record(s)")],
            question: "Proceed?".to_string(),
        }
    }

    pub fn listing(heading: &str, lines: Vec<String>) -> Self {
        let mut all = vec![heading.to_string()];
        all.extend(lines.into_iter().map(|l| format!("  {l}")));
        Self {
            lines: all,
            question: "Proceed?".to_string(),
        }
    }

    pub fn render(&self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }
}

pub trait Confirm {
    /// Present `summary` and return whether the operator approved.
    fn confirm(&mut self, summary: &Summary) -> Result<bool, FatalError>;
}

/// True only for `y` or `yes`, in any case.
pub fn is_affirmative(answer: &str) -> bool {
    let answer = answer.trim();
    answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
}

/// Interactive prompt over any reader/writer pair.
pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl TerminalPrompt<std::io::StdinLock<'static>, std::io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> Confirm for TerminalPrompt<R, W> {
    fn confirm(&mut self, summary: &Summary) -> Result<bool, FatalError> {
        write!(self.output, "{}", summary.render())?;
        write!(self.output, "{} [y/N]: ", summary.question)?;
        self.output.flush()?;

        let mut response = String::new();
        // EOF reads zero bytes and leaves the response empty, which declines.
        self.input.read_line(&mut response)?;
        Ok(is_affirmative(&response))
    }
}

/// Approves everything after printing the summary. Backs `--yes`.
pub struct AutoApprove<W> {
    output: W,
}

impl<W: Write> AutoApprove<W> {
    pub fn new(output: W) -> Self {
        Self { output }
    }
}

impl<W: Write> Confirm for AutoApprove<W> {
    fn confirm(&mut self, summary: &Summary) -> Result<bool, FatalError> {
        write!(self.output, "{}", summary.render())?;
        writeln!(self.output, "{} [y/N]: y (auto)", summary.question)?;
        Ok(true)
    }
}

/// Replays fixed answers and records every summary it was shown.
#[derive(Debug, Default)]
pub struct Scripted {
    answers: VecDeque<bool>,
    pub shown: Vec<Summary>,
}

impl Scripted {
    pub fn new(answers: &[bool]) -> Self {
        Self {
            answers: answers.iter().copied().collect(),
            shown: Vec::new(),
        }
    }
}

impl Confirm for Scripted {
    fn confirm(&mut self, summary: &Summary) -> Result<bool, FatalError> {
        self.shown.push(summary.clone());
        Ok(self.answers.pop_front().unwrap_or(false))
    }
}

/// Ask `gate` and turn a refusal into [`FatalError::Aborted`].
pub fn require(gate: &mut dyn Confirm, summary: &Summary) -> Result<(), FatalError> {
    if gate.confirm(summary)? {
        Ok(())
    } else {
        tracing::info!("operator declined confirmation");
        Err(FatalError::Aborted)
    }
}
