use nu_ansi_term::{Color as AnsiColor, Style};
use similar::{ChangeTag, TextDiff};
use std::fmt::Write;

/// Render a word-level diff of `before` against `after`.
///
/// Without colour, removed runs are wrapped in `[-...-]` and inserted runs in
/// `{+...+}` so the output stays readable in logs.
pub fn render_word_diff(before: &str, after: &str, use_color: bool) -> String {
    let diff = TextDiff::from_words(before, after);
    let mut output = String::new();

    for change in diff.iter_all_changes() {
        let text = change.value();
        match (change.tag(), use_color) {
            (ChangeTag::Equal, _) => output.push_str(text),
            (ChangeTag::Delete, true) => {
                write!(
                    output,
                    "{}",
                    Style::new().fg(AnsiColor::Red).strikethrough().paint(text)
                )
                .unwrap();
            },
            (ChangeTag::Insert, true) => {
                write!(output, "{}", AnsiColor::Green.paint(text)).unwrap();
            },
            (ChangeTag::Delete, false) => {
                write!(output, "[-{text}-]").unwrap();
            },
            (ChangeTag::Insert, false) => {
                write!(output, "{{+{text}+}}").unwrap();
            },
        }
    }

    output
}
