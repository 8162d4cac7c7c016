use crate::executor::{BatchResult, Outcome, RecordOutcome};
use crate::output::{OutputFormat, OutputFormatter};
use nu_ansi_term::Color as AnsiColor;
use std::io::Write;

/// Receives progress as the executor works through a batch.
pub trait Reporter {
    fn start(&mut self, _operation: &str, _total: usize) {}

    /// Called once per record, right after it completes.
    fn record(&mut self, outcome: &RecordOutcome);

    fn finish(&mut self, result: &BatchResult);
}

/// Discards everything.
pub struct NullReporter;

impl Reporter for NullReporter {
    fn record(&mut self, _outcome: &RecordOutcome) {}

    fn finish(&mut self, _result: &BatchResult) {}
}

/// Writes status lines to a terminal or pipe.
pub struct ConsoleReporter<W> {
    out: W,
    format: OutputFormat,
    use_color: bool,
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W, format: OutputFormat, use_color: bool) -> Self {
        Self {
            out,
            format,
            use_color,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{text}").and_then(|()| self.out.flush()) {
            tracing::warn!(error = %e, "failed to write report line");
        }
    }

    fn paint_record(&self, outcome: &RecordOutcome, text: String) -> String {
        if !self.use_color {
            return text;
        }
        match &outcome.outcome {
            Outcome::Success(detail) if detail.changed => AnsiColor::Green.paint(text).to_string(),
            Outcome::Success(_) => AnsiColor::DarkGray.paint(text).to_string(),
            Outcome::Failure { .. } => AnsiColor::Red.paint(text).to_string(),
        }
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn start(&mut self, operation: &str, total: usize) {
        if self.format == OutputFormat::Summary {
            self.emit(&format!("Running {operation} on {total} record(s)"));
        }
    }

    fn record(&mut self, outcome: &RecordOutcome) {
        let text = outcome.format(self.format);
        let text = match self.format {
            OutputFormat::Summary => self.paint_record(outcome, text),
            OutputFormat::Json => text,
        };
        self.emit(&text);
    }

    fn finish(&mut self, result: &BatchResult) {
        let text = result.format(self.format);
        let text = if self.use_color && self.format == OutputFormat::Summary {
            if result.all_succeeded() {
                AnsiColor::Green.bold().paint(text).to_string()
            } else {
                AnsiColor::Yellow.bold().paint(text).to_string()
            }
        } else {
            text
        };
        self.emit(&text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use crate::executor::Detail;

    fn outcome(key: &str, outcome: Outcome) -> RecordOutcome {
        RecordOutcome {
            index: 0,
            key: key.to_string(),
            outcome,
        }
    }

    #[test]
    fn test_summary_reporter_writes_progress_and_final_line() {
        let mut reporter = ConsoleReporter::new(Vec::new(), OutputFormat::Summary, false);
        reporter.start("delete", 1);
        let done = outcome("10", Outcome::Success(Detail::changed("deleted")));
        reporter.record(&done);
        let mut result = BatchResult::empty("delete");
        result.outcomes.push(done);
        reporter.finish(&result);

        let written = String::from_utf8(reporter.into_inner()).unwrap();
        insta::assert_snapshot!(written, @r"
        Running delete on 1 record(s)
        10 - deleted
        All 1 record(s) processed successfully (1 changed, 0 skipped)
        ");
    }

    #[test]
    fn test_json_reporter_writes_one_object_per_line() {
        let mut reporter = ConsoleReporter::new(Vec::new(), OutputFormat::Json, false);
        reporter.start("delete", 1);
        let failed = outcome(
            "10",
            Outcome::Failure {
                kind: FailureKind::Unauthorized,
                message: "nope".to_string(),
            },
        );
        reporter.record(&failed);
        let mut result = BatchResult::empty("delete");
        result.outcomes.push(failed);
        reporter.finish(&result);

        let written = String::from_utf8(reporter.into_inner()).unwrap();
        let lines: Vec<serde_json::Value> = written
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["kind"], "unauthorized");
        assert_eq!(lines[1]["type"], "summary");
    }

    #[test]
    fn test_colored_failure_line() {
        let mut reporter = ConsoleReporter::new(Vec::new(), OutputFormat::Summary, true);
        reporter.record(&outcome(
            "10",
            Outcome::Failure {
                kind: FailureKind::NotFound,
                message: "gone".to_string(),
            },
        ));
        let written = String::from_utf8(reporter.into_inner()).unwrap();
        assert!(written.contains('\u{1b}'));
        assert!(written.contains("10 - failed (not_found): gone"));
    }
}
