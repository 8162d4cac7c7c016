//! In-memory repository backed by an optional JSON snapshot file.
//!
//! Every successful mutation is written back to the snapshot before the call
//! returns, so an interrupted batch leaves earlier mutations in place.

use super::snapshot::{Snapshot, StoredContent, StoredVersion};
use super::{
    AssignmentStore, ContentService, LocationService, RepoResult, Repository, RoleService,
    UserService,
};
use crate::error::RepositoryError;
use crate::model::{
    AssignmentId, Content, ContentId, ContentInfo, ContentUpdate, FieldValue, Identity,
    Limitation, Location, LocationId, Role, RoleAssignment, User, UserId, VersionInfo,
    VersionStatus,
};
use anyhow::Result;
use std::cell::{Ref, RefCell};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub struct InMemoryRepository {
    state: RefCell<Snapshot>,
    persist_to: Option<PathBuf>,
}

impl InMemoryRepository {
    /// A repository that lives only as long as this value.
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            state: RefCell::new(snapshot),
            persist_to: None,
        }
    }

    /// Load a snapshot file and persist every mutation back to it.
    pub fn open(path: &Path) -> Result<Self> {
        let snapshot = Snapshot::load(path)?;
        Ok(Self {
            state: RefCell::new(snapshot),
            persist_to: Some(path.to_path_buf()),
        })
    }

    /// Read access to the current state.
    pub fn state(&self) -> Ref<'_, Snapshot> {
        self.state.borrow()
    }

    fn commit(&self) -> RepoResult<()> {
        if let Some(path) = &self.persist_to {
            self.state
                .borrow()
                .save(path)
                .map_err(|e| RepositoryError::Storage(format!("{e:#}")))?;
            tracing::debug!(path = %path.display(), "snapshot persisted");
        }
        Ok(())
    }
}

fn find_content(state: &Snapshot, id: ContentId) -> RepoResult<&StoredContent> {
    state
        .contents
        .iter()
        .find(|c| c.id == id)
        .ok_or_else(|| RepositoryError::not_found("content", id))
}

fn find_content_mut(state: &mut Snapshot, id: ContentId) -> RepoResult<&mut StoredContent> {
    state
        .contents
        .iter_mut()
        .find(|c| c.id == id)
        .ok_or_else(|| RepositoryError::not_found("content", id))
}

fn find_location(state: &Snapshot, id: LocationId) -> RepoResult<&Location> {
    state
        .locations
        .iter()
        .find(|l| l.id == id)
        .ok_or_else(|| RepositoryError::not_found("location", id))
}

fn content_paths(state: &Snapshot, id: ContentId) -> Vec<String> {
    state
        .locations
        .iter()
        .filter(|l| l.content_id == id)
        .map(|l| l.path_string.clone())
        .collect()
}

fn info_of(content: &StoredContent) -> ContentInfo {
    ContentInfo {
        id: content.id,
        name: content.name.clone(),
        content_type: content.content_type.clone(),
        current_version: content.current_version,
        main_location_id: content.main_location_id,
    }
}

/// Grant when any of the user's assignments carries a matching policy and
/// either has no limitation or its limitation covers one of `paths`.
fn authorize(
    state: &Snapshot,
    who: &Identity,
    module: &str,
    function: &str,
    paths: &[String],
) -> RepoResult<()> {
    let granted = state
        .role_assignments
        .iter()
        .filter(|a| a.user_id == who.user_id)
        .any(|assignment| {
            let Some(role) = state.roles.iter().find(|r| r.id == assignment.role_id) else {
                return false;
            };
            if !role.policies.iter().any(|p| p.allows(module, function)) {
                return false;
            }
            match &assignment.limitation {
                None => true,
                Some(limitation) => paths.iter().any(|p| limitation.covers(p)),
            }
        });

    if granted {
        Ok(())
    } else {
        Err(RepositoryError::Unauthorized {
            user: who.login.clone(),
            module: module.to_string(),
            function: function.to_string(),
        })
    }
}

fn draft_version<'a>(
    content: &'a mut StoredContent,
    version: &VersionInfo,
) -> RepoResult<&'a mut StoredVersion> {
    let stored = content
        .version_mut(version.number)
        .ok_or_else(|| RepositoryError::not_found("version", version.number))?;
    if stored.status != VersionStatus::Draft {
        return Err(RepositoryError::bad_state(
            "versionInfo",
            format!("version {} is {}, not a draft", version.number, stored.status),
        ));
    }
    Ok(stored)
}

fn validate_update(
    state: &Snapshot,
    content: &StoredContent,
    update: &ContentUpdate,
) -> RepoResult<()> {
    let Some(content_type) = state
        .content_types
        .iter()
        .find(|t| t.identifier == content.content_type)
    else {
        return Ok(());
    };

    for (identifier, value) in &update.fields {
        let definition = content_type.field(identifier).ok_or_else(|| {
            RepositoryError::FieldValidation(format!(
                "field '{}' is not defined on content type '{}'",
                identifier, content_type.identifier
            ))
        })?;
        if definition.kind != value.kind() {
            return Err(RepositoryError::invalid_argument(
                identifier,
                format!(
                    "a {} value is not accepted by a {} field",
                    value.kind(),
                    definition.kind
                ),
            ));
        }
        if definition.required && value.is_empty() {
            return Err(RepositoryError::ContentValidation(format!(
                "required field '{identifier}' cannot be empty"
            )));
        }
    }
    Ok(())
}

fn validate_required(state: &Snapshot, content: &StoredContent, version: &StoredVersion) -> RepoResult<()> {
    let Some(content_type) = state
        .content_types
        .iter()
        .find(|t| t.identifier == content.content_type)
    else {
        return Ok(());
    };
    for definition in content_type.fields.iter().filter(|f| f.required) {
        let missing = version
            .fields
            .get(&definition.identifier)
            .map_or(true, FieldValue::is_empty);
        if missing {
            return Err(RepositoryError::ContentValidation(format!(
                "required field '{}' is empty",
                definition.identifier
            )));
        }
    }
    Ok(())
}

impl ContentService for InMemoryRepository {
    fn load_content_info(&self, id: ContentId) -> RepoResult<ContentInfo> {
        let state = self.state.borrow();
        find_content(&state, id).map(info_of)
    }

    fn load_content(&self, id: ContentId) -> RepoResult<Content> {
        let state = self.state.borrow();
        let content = find_content(&state, id)?;
        let published = content
            .published()
            .ok_or_else(|| RepositoryError::not_found("published version of content", id))?;
        Ok(Content {
            info: info_of(content),
            version: VersionInfo {
                content_id: id,
                number: published.number,
                status: published.status,
            },
            fields: published.fields.clone(),
        })
    }

    fn delete_content(&self, who: &Identity, info: &ContentInfo) -> RepoResult<()> {
        {
            let mut state = self.state.borrow_mut();
            find_content(&state, info.id)?;
            let roots = content_paths(&state, info.id);
            authorize(&state, who, "content", "remove", &roots)?;

            let (removed, kept): (Vec<Location>, Vec<Location>) = state
                .locations
                .drain(..)
                .partition(|l| roots.iter().any(|root| l.path_string.starts_with(root.as_str())));
            state.locations = kept;

            // Content that lost its last location with the subtree goes too.
            let touched: HashSet<ContentId> = removed.iter().map(|l| l.content_id).collect();
            let still_placed: HashSet<ContentId> =
                state.locations.iter().map(|l| l.content_id).collect();
            state.contents.retain(|c| {
                c.id != info.id && !(touched.contains(&c.id) && !still_placed.contains(&c.id))
            });

            for content in &mut state.contents {
                if content
                    .main_location_id
                    .is_some_and(|main| removed.iter().any(|l| l.id == main))
                {
                    content.main_location_id = None;
                }
            }

            tracing::info!(
                content_id = %info.id,
                locations = removed.len(),
                "content deleted"
            );
        }
        self.commit()
    }

    fn create_content_draft(&self, who: &Identity, info: &ContentInfo) -> RepoResult<VersionInfo> {
        let version = {
            let mut state = self.state.borrow_mut();
            let paths = content_paths(&state, info.id);
            find_content(&state, info.id)?;
            authorize(&state, who, "content", "edit", &paths)?;

            let content = find_content_mut(&mut state, info.id)?;
            let published = content.published().cloned().ok_or_else(|| {
                RepositoryError::bad_state("contentInfo", "content has no published version")
            })?;
            let number = content.next_version_number();
            content.versions.push(StoredVersion {
                number,
                status: VersionStatus::Draft,
                fields: published.fields,
            });
            VersionInfo {
                content_id: info.id,
                number,
                status: VersionStatus::Draft,
            }
        };
        self.commit()?;
        Ok(version)
    }

    fn update_content(
        &self,
        who: &Identity,
        version: &VersionInfo,
        update: &ContentUpdate,
    ) -> RepoResult<VersionInfo> {
        {
            let mut state = self.state.borrow_mut();
            let paths = content_paths(&state, version.content_id);
            let content = find_content(&state, version.content_id)?;
            authorize(&state, who, "content", "edit", &paths)?;
            validate_update(&state, content, update)?;

            let content = find_content_mut(&mut state, version.content_id)?;
            let draft = draft_version(content, version)?;
            for (identifier, value) in &update.fields {
                draft.fields.insert(identifier.clone(), value.clone());
            }
        }
        self.commit()?;
        Ok(version.clone())
    }

    fn publish_version(&self, who: &Identity, version: &VersionInfo) -> RepoResult<ContentInfo> {
        let info = {
            let mut state = self.state.borrow_mut();
            let paths = content_paths(&state, version.content_id);
            let content = find_content(&state, version.content_id)?;
            authorize(&state, who, "content", "publish", &paths)?;

            let candidate = content
                .version(version.number)
                .ok_or_else(|| RepositoryError::not_found("version", version.number))?;
            if candidate.status != VersionStatus::Draft {
                return Err(RepositoryError::bad_state(
                    "versionInfo",
                    format!("version {} is {}, not a draft", version.number, candidate.status),
                ));
            }
            validate_required(&state, content, candidate)?;

            let content = find_content_mut(&mut state, version.content_id)?;
            for stored in &mut content.versions {
                if stored.status == VersionStatus::Published {
                    stored.status = VersionStatus::Archived;
                }
            }
            if let Some(stored) = content.version_mut(version.number) {
                stored.status = VersionStatus::Published;
            }
            content.current_version = Some(version.number);
            info_of(content)
        };
        self.commit()?;
        Ok(info)
    }
}

impl LocationService for InMemoryRepository {
    fn load_location(&self, id: LocationId) -> RepoResult<Location> {
        let state = self.state.borrow();
        find_location(&state, id).cloned()
    }

    fn move_subtree(
        &self,
        who: &Identity,
        location: &Location,
        new_parent: &Location,
    ) -> RepoResult<()> {
        {
            let mut state = self.state.borrow_mut();
            // Positions may have changed since the caller loaded them.
            let location = find_location(&state, location.id)?.clone();
            let new_parent = find_location(&state, new_parent.id)?.clone();

            if location.contains(&new_parent) {
                return Err(RepositoryError::invalid_argument(
                    "newParentLocation",
                    format!(
                        "cannot move location {} to itself or one of its own descendants",
                        location.id
                    ),
                ));
            }
            if location.parent_id == Some(new_parent.id) {
                return Err(RepositoryError::invalid_argument(
                    "newParentLocation",
                    format!(
                        "location {} is already located under location {}",
                        location.id, new_parent.id
                    ),
                ));
            }
            if location.parent_id.is_none() {
                return Err(RepositoryError::Conflict(format!(
                    "location {} is a tree root and cannot be moved",
                    location.id
                )));
            }
            if location.content_id == new_parent.content_id {
                return Err(RepositoryError::Conflict(format!(
                    "content {} cannot be placed beneath one of its own locations",
                    location.content_id
                )));
            }

            authorize(&state, who, "content", "remove", &[location.path_string.clone()])?;
            authorize(&state, who, "content", "create", &[new_parent.path_string.clone()])?;

            let old_prefix = location.path_string.clone();
            let new_prefix = format!("{}{}/", new_parent.path_string, location.id);
            for loc in &mut state.locations {
                if let Some(rest) = loc.path_string.strip_prefix(old_prefix.as_str()) {
                    loc.path_string = format!("{new_prefix}{rest}");
                }
                if loc.id == location.id {
                    loc.parent_id = Some(new_parent.id);
                }
            }

            tracing::info!(
                location_id = %location.id,
                new_parent_id = %new_parent.id,
                "subtree moved"
            );
        }
        self.commit()
    }
}

impl RoleService for InMemoryRepository {
    fn load_role_by_identifier(&self, identifier: &str) -> RepoResult<Role> {
        let state = self.state.borrow();
        state
            .roles
            .iter()
            .find(|r| r.identifier == identifier)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found("role", identifier))
    }

    fn assign_role_to_user(
        &self,
        who: &Identity,
        role: &Role,
        user: &User,
        limitation: Option<Limitation>,
    ) -> RepoResult<RoleAssignment> {
        let assignment = {
            let mut state = self.state.borrow_mut();
            if !state.roles.iter().any(|r| r.id == role.id) {
                return Err(RepositoryError::not_found("role", role.id));
            }
            if !state.users.iter().any(|u| u.id == user.id) {
                return Err(RepositoryError::not_found("user", user.id));
            }
            authorize(&state, who, "role", "assign", &[])?;

            if let Some(limitation) = &limitation {
                for path in limitation.values() {
                    if !state.locations.iter().any(|l| &l.path_string == path) {
                        return Err(RepositoryError::invalid_argument(
                            "limitation",
                            format!("no location has path {path}"),
                        ));
                    }
                }
            }

            let duplicate = state.role_assignments.iter().any(|a| {
                a.role_id == role.id && a.user_id == user.id && a.limitation == limitation
            });
            if duplicate {
                return Err(RepositoryError::invalid_argument(
                    "role",
                    format!(
                        "role '{}' is already assigned to user {} with this limitation",
                        role.identifier, user.id
                    ),
                ));
            }

            let id = AssignmentId(
                state
                    .role_assignments
                    .iter()
                    .map(|a| a.id.raw())
                    .max()
                    .unwrap_or(0)
                    + 1,
            );
            let assignment = RoleAssignment {
                id,
                role_id: role.id,
                user_id: user.id,
                limitation,
            };
            state.role_assignments.push(assignment.clone());
            assignment
        };
        self.commit()?;
        Ok(assignment)
    }
}

impl UserService for InMemoryRepository {
    fn load_user(&self, id: UserId) -> RepoResult<User> {
        let state = self.state.borrow();
        state
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found("user", id))
    }
}

impl AssignmentStore for InMemoryRepository {
    fn delete_assignment_row(&self, assignment: AssignmentId, user: UserId) -> RepoResult<usize> {
        let removed = {
            let mut state = self.state.borrow_mut();
            let before = state.role_assignments.len();
            state
                .role_assignments
                .retain(|a| !(a.id == assignment && a.user_id == user));
            before - state.role_assignments.len()
        };
        if removed > 0 {
            self.commit()?;
        }
        Ok(removed)
    }
}

impl Repository for InMemoryRepository {
    fn content(&self) -> &dyn ContentService {
        self
    }

    fn locations(&self) -> &dyn LocationService {
        self
    }

    fn roles(&self) -> &dyn RoleService {
        self
    }

    fn users(&self) -> &dyn UserService {
        self
    }

    fn assignment_store(&self) -> &dyn AssignmentStore {
        self
    }
}
