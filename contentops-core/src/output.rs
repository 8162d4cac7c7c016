use crate::executor::{BatchResult, Outcome, RecordOutcome};
use crate::model::{LegacyRoleRow, UserId};
use comfy_table::{Cell, Color, Table};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt::Write;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Summary,
    Json,
}

/// Trait for formatting output in different formats
pub trait OutputFormatter {
    fn format(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Json => self.format_json(),
            OutputFormat::Summary => self.format_summary(),
        }
    }
    fn format_json(&self) -> String;
    fn format_summary(&self) -> String;
}

impl OutputFormatter for RecordOutcome {
    fn format_json(&self) -> String {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(object) = value.as_object_mut() {
            object.insert("type".to_string(), json!("record"));
        }
        serde_json::to_string(&value).unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        let mut output = match &self.outcome {
            Outcome::Success(detail) if detail.changed => {
                format!("{} - {}", self.key, detail.message)
            },
            Outcome::Success(detail) => format!("{} - skipped: {}", self.key, detail.message),
            Outcome::Failure { kind, message } => {
                format!("{} - failed ({}): {}", self.key, kind, message)
            },
        };

        if let Outcome::Success(detail) = &self.outcome {
            if let Some(preview) = &detail.preview {
                for line in preview.lines() {
                    write!(output, "\n    {line}").unwrap();
                }
            }
        }

        output
    }
}

impl OutputFormatter for BatchResult {
    fn format_json(&self) -> String {
        let failures: Vec<_> = self
            .failures()
            .filter_map(|failure| match &failure.outcome {
                Outcome::Failure { kind, message } => Some(json!({
                    "index": failure.index,
                    "key": failure.key,
                    "kind": kind,
                    "message": message,
                })),
                Outcome::Success(_) => None,
            })
            .collect();

        serde_json::to_string(&json!({
            "type": "summary",
            "success": self.all_succeeded(),
            "operation": self.operation,
            "started_at": self.started_at.to_rfc3339(),
            "finished_at": self.finished_at.to_rfc3339(),
            "summary": {
                "total": self.len(),
                "succeeded": self.succeeded_count(),
                "failed": self.failed_count(),
                "changed": self.changed_count(),
            },
            "failures": failures,
        }))
        .unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        let mut output = String::new();

        if self.is_empty() {
            output.push_str("No records to process. Nothing changed.");
            return output;
        }

        if self.all_succeeded() {
            write!(
                output,
                "All {} record(s) processed successfully ({} changed, {} skipped)",
                self.len(),
                self.changed_count(),
                self.len() - self.changed_count()
            )
            .unwrap();
            return output;
        }

        output.push_str("The following errors were reported:\n");
        for failure in self.failures() {
            if let Outcome::Failure { message, .. } = &failure.outcome {
                writeln!(output, "  {}: {}", failure.key, message).unwrap();
            }
        }
        write!(
            output,
            "{} of {} record(s) succeeded",
            self.succeeded_count(),
            self.len()
        )
        .unwrap();

        output
    }
}

/// Fine-grained role assignments of one user.
#[derive(Debug, Serialize, Deserialize)]
pub struct RoleListing {
    pub user_id: UserId,
    pub rows: Vec<LegacyRoleRow>,
}

impl RoleListing {
    pub fn render_table(&self, use_color: bool) -> String {
        let mut table = Table::new();
        let headers = ["UserRoleID", "Name", "LimitValue", "LimitIdentifier"];
        if use_color {
            table.enforce_styling();
            table.set_header(headers.iter().map(|h| Cell::new(h).fg(Color::Cyan)));
        } else {
            table.set_header(headers);
        }

        for row in &self.rows {
            table.add_row(vec![
                row.user_role_id.to_string(),
                row.role_name.clone(),
                row.limit_value.clone(),
                row.limit_identifier.clone(),
            ]);
        }

        table.to_string()
    }
}

impl OutputFormatter for RoleListing {
    fn format_json(&self) -> String {
        serde_json::to_string(&json!({
            "success": true,
            "operation": "roles",
            "user_id": self.user_id,
            "assignments": self.rows,
        }))
        .unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        if self.rows.is_empty() {
            return format!("User {} has no role assignments", self.user_id);
        }
        self.render_table(false)
    }
}

/// Result of a version command
#[derive(Debug, Serialize, Deserialize)]
pub struct VersionResult {
    pub name: String,
    pub version: String,
}

impl OutputFormatter for VersionResult {
    fn format_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        format!("{} {}", self.name, self.version)
    }
}
