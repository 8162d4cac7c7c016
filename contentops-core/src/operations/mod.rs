//! The per-record mutations the batch tools run.

pub mod delete;
pub mod relocate;
pub mod republish;
pub mod roles;
pub mod strip_links;

use crate::confirm::Summary;
use crate::context::ExecutionContext;
use crate::error::RepositoryError;
use crate::executor::{Detail, Record};

pub use delete::DeleteContent;
pub use relocate::RelocateSubtree;
pub use republish::Republish;
pub use roles::{list_assignments, AssignRole, RemoveAssignment};
pub use strip_links::{StripLinks, StripMode};

pub trait MutationOperation {
    type Record: Record;

    /// Short name used in logs and the JSON summary.
    fn name(&self) -> &'static str;

    fn apply(&self, record: &Self::Record, ctx: &ExecutionContext<'_>) -> Result<Detail, RepositoryError>;

    fn requires_confirmation(&self) -> bool {
        true
    }

    /// What the operator is shown before the batch starts.
    fn summary(&self, records: &[Self::Record]) -> Summary {
        Summary::count(self.name(), records.len())
    }
}
