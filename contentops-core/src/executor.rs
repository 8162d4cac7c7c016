//! The batch loop: one record at a time, every failure contained.

use crate::confirm::{self, Confirm};
use crate::context::ExecutionContext;
use crate::error::{FailureKind, FatalError, RepositoryError};
use crate::input::MoveRow;
use crate::model::{AssignmentId, ContentId, LocationId};
use crate::operations::MutationOperation;
use crate::report::Reporter;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Anything a batch can iterate over.
pub trait Record {
    /// Printable key used in progress lines and the failure list.
    fn key(&self) -> String;
}

impl Record for ContentId {
    fn key(&self) -> String {
        self.to_string()
    }
}

impl Record for LocationId {
    fn key(&self) -> String {
        self.to_string()
    }
}

impl Record for AssignmentId {
    fn key(&self) -> String {
        self.to_string()
    }
}

impl Record for MoveRow {
    fn key(&self) -> String {
        format!("{} ==> {}", self.location_id, self.new_parent_location_id)
    }
}

/// What a successful record did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Detail {
    pub message: String,
    /// False for skips and no-ops.
    pub changed: bool,
    /// Rendered before/after view, set by dry runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

impl Detail {
    pub fn changed(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            changed: true,
            preview: None,
        }
    }

    pub fn no_op(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            changed: false,
            preview: None,
        }
    }

    pub fn with_preview(mut self, preview: String) -> Self {
        self.preview = Some(preview);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Success(Detail),
    Failure { kind: FailureKind, message: String },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Failure { kind, .. } => Some(*kind),
            Self::Success(_) => None,
        }
    }
}

impl From<RepositoryError> for Outcome {
    fn from(err: RepositoryError) -> Self {
        Self::Failure {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordOutcome {
    pub index: usize,
    pub key: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Ordered outcomes of one run, index-aligned with the input records.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub operation: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<RecordOutcome>,
}

impl BatchResult {
    pub fn empty(operation: &str) -> Self {
        let now = Utc::now();
        Self {
            operation: operation.to_string(),
            started_at: now,
            finished_at: now,
            outcomes: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn failures(&self) -> impl Iterator<Item = &RecordOutcome> {
        self.outcomes.iter().filter(|o| !o.outcome.is_success())
    }

    pub fn failed_count(&self) -> usize {
        self.failures().count()
    }

    pub fn succeeded_count(&self) -> usize {
        self.len() - self.failed_count()
    }

    pub fn changed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(&o.outcome, Outcome::Success(d) if d.changed))
            .count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed_count() == 0
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "operation panicked".to_string()
    }
}

/// Apply `operation` to every record in order.
///
/// Never fails: errors and panics from a record become that record's
/// outcome and the loop moves on.
pub fn run<O>(
    records: &[O::Record],
    operation: &O,
    ctx: &ExecutionContext<'_>,
    reporter: &mut dyn Reporter,
) -> BatchResult
where
    O: MutationOperation + ?Sized,
{
    let started_at = Utc::now();
    tracing::info!(operation = operation.name(), records = records.len(), "batch started");
    reporter.start(operation.name(), records.len());

    let mut outcomes = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let key = record.key();
        tracing::debug!(%key, index, "processing record");

        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| operation.apply(record, ctx))) {
            Ok(Ok(detail)) => Outcome::Success(detail),
            Ok(Err(err)) => Outcome::from(err),
            Err(payload) => Outcome::Failure {
                kind: FailureKind::Internal,
                message: panic_message(payload.as_ref()),
            },
        };

        if let Outcome::Failure { kind, message } = &outcome {
            tracing::warn!(%key, %kind, %message, "record failed");
        }

        let record_outcome = RecordOutcome {
            index,
            key,
            outcome,
        };
        reporter.record(&record_outcome);
        outcomes.push(record_outcome);
    }

    let result = BatchResult {
        operation: operation.name().to_string(),
        started_at,
        finished_at: Utc::now(),
        outcomes,
    };
    tracing::info!(
        operation = operation.name(),
        succeeded = result.succeeded_count(),
        failed = result.failed_count(),
        "batch finished"
    );
    reporter.finish(&result);
    result
}

/// Confirm with the operator, then [`run`].
///
/// An empty batch skips the prompt. A refusal returns
/// [`FatalError::Aborted`] before any record is touched.
pub fn run_confirmed<O>(
    records: &[O::Record],
    operation: &O,
    ctx: &ExecutionContext<'_>,
    gate: &mut dyn Confirm,
    reporter: &mut dyn Reporter,
) -> Result<BatchResult, FatalError>
where
    O: MutationOperation + ?Sized,
{
    if records.is_empty() {
        tracing::warn!(operation = operation.name(), "no records to process");
        let result = BatchResult::empty(operation.name());
        reporter.finish(&result);
        return Ok(result);
    }

    if operation.requires_confirmation() {
        confirm::require(gate, &operation.summary(records))?;
    }
    Ok(run(records, operation, ctx, reporter))
}
