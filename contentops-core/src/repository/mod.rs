//! Collaborator interfaces the batch tools depend on.
//!
//! Reads take no identity. Every mutating call takes the acting [`Identity`]
//! explicitly; there is no ambient "current user" anywhere in the crate.

pub mod builder;
pub mod legacy;
pub mod memory;
pub mod snapshot;

use crate::error::RepositoryError;
use crate::model::{
    AssignmentId, Content, ContentId, ContentInfo, ContentUpdate, Identity, LegacyRoleRow,
    Limitation, Location, LocationId, Role, RoleAssignment, User, UserId, VersionInfo,
};

pub use builder::SnapshotBuilder;
pub use legacy::LegacyRoleGateway;
pub use memory::InMemoryRepository;
pub use snapshot::Snapshot;

pub type RepoResult<T> = Result<T, RepositoryError>;

pub trait ContentService {
    fn load_content_info(&self, id: ContentId) -> RepoResult<ContentInfo>;

    /// Load the published version with its fields.
    fn load_content(&self, id: ContentId) -> RepoResult<Content>;

    /// Delete the content object, all its locations and the subtrees below them.
    fn delete_content(&self, who: &Identity, info: &ContentInfo) -> RepoResult<()>;

    /// Create a draft copied from the currently published version.
    fn create_content_draft(&self, who: &Identity, info: &ContentInfo) -> RepoResult<VersionInfo>;

    fn new_content_update(&self) -> ContentUpdate {
        ContentUpdate::new()
    }

    /// Apply field changes to a draft. Fails with `BadState` for non-drafts.
    fn update_content(
        &self,
        who: &Identity,
        version: &VersionInfo,
        update: &ContentUpdate,
    ) -> RepoResult<VersionInfo>;

    fn publish_version(&self, who: &Identity, version: &VersionInfo) -> RepoResult<ContentInfo>;
}

pub trait LocationService {
    fn load_location(&self, id: LocationId) -> RepoResult<Location>;

    /// Re-parent the subtree rooted at `location` under `new_parent`.
    fn move_subtree(&self, who: &Identity, location: &Location, new_parent: &Location)
        -> RepoResult<()>;
}

pub trait RoleService {
    fn load_role_by_identifier(&self, identifier: &str) -> RepoResult<Role>;

    fn assign_role_to_user(
        &self,
        who: &Identity,
        role: &Role,
        user: &User,
        limitation: Option<Limitation>,
    ) -> RepoResult<RoleAssignment>;
}

pub trait UserService {
    fn load_user(&self, id: UserId) -> RepoResult<User>;
}

/// Direct row-level access to role assignments.
///
/// This bypasses the role service entirely: no permission check, no
/// validation, no domain events. It exists because the service layer cannot
/// remove a single assignment by its row id.
pub trait AssignmentStore {
    /// Delete the row keyed by both ids. Returns the number of rows removed,
    /// zero when nothing matched.
    fn delete_assignment_row(&self, assignment: AssignmentId, user: UserId) -> RepoResult<usize>;
}

/// Read-only access to fine-grained role assignments through the legacy
/// subsystem, which keeps its own login session.
pub trait RoleAssignmentReader {
    fn login(&mut self, user: UserId) -> RepoResult<()>;

    fn fetch_by_user(&self, user: UserId) -> RepoResult<Vec<LegacyRoleRow>>;
}

/// Bundle of the service collaborators a run needs.
pub trait Repository {
    fn content(&self) -> &dyn ContentService;
    fn locations(&self) -> &dyn LocationService;
    fn roles(&self) -> &dyn RoleService;
    fn users(&self) -> &dyn UserService;
    fn assignment_store(&self) -> &dyn AssignmentStore;
}
