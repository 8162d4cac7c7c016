#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod confirm;
pub mod context;
pub mod error;
pub mod executor;
pub mod input;
pub mod lock;
pub mod model;
pub mod operations;
pub mod output;
pub mod preview;
pub mod report;
pub mod repository;
pub mod richtext;

pub use config::Config;
pub use confirm::{AutoApprove, Confirm, Scripted, Summary, TerminalPrompt};
pub use context::ExecutionContext;
pub use error::{FailureKind, FatalError, RepositoryError};
pub use executor::{run, run_confirmed, BatchResult, Detail, Outcome, Record, RecordOutcome};
pub use input::{load_inline, load_move_rows, read_rows, MoveRow, Row};
pub use lock::RepositoryLock;
pub use model::{AssignmentId, ContentId, Identity, LocationId, UserId};
pub use operations::{
    list_assignments, AssignRole, DeleteContent, MutationOperation, RelocateSubtree,
    RemoveAssignment, Republish, StripLinks, StripMode,
};
pub use output::{OutputFormat, OutputFormatter, RoleListing, VersionResult};
pub use report::{ConsoleReporter, NullReporter, Reporter};
pub use repository::{InMemoryRepository, LegacyRoleGateway, Repository, Snapshot, SnapshotBuilder};
pub use richtext::RichText;
