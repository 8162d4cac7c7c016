use crate::model::{
    ContentId, ContentType, FieldValue, Location, LocationId, Role, RoleAssignment, User,
    VersionStatus,
};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::Path;

/// The whole repository state as stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub role_assignments: Vec<RoleAssignment>,
    #[serde(default)]
    pub content_types: Vec<ContentType>,
    #[serde(default)]
    pub contents: Vec<StoredContent>,
    #[serde(default)]
    pub locations: Vec<Location>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredContent {
    pub id: ContentId,
    pub name: String,
    pub content_type: String,
    #[serde(default)]
    pub current_version: Option<u32>,
    #[serde(default)]
    pub main_location_id: Option<LocationId>,
    #[serde(default)]
    pub versions: Vec<StoredVersion>,
}

impl StoredContent {
    pub fn version(&self, number: u32) -> Option<&StoredVersion> {
        self.versions.iter().find(|v| v.number == number)
    }

    pub fn version_mut(&mut self, number: u32) -> Option<&mut StoredVersion> {
        self.versions.iter_mut().find(|v| v.number == number)
    }

    pub fn published(&self) -> Option<&StoredVersion> {
        self.current_version.and_then(|n| self.version(n))
    }

    pub fn next_version_number(&self) -> u32 {
        self.versions.iter().map(|v| v.number).max().unwrap_or(0) + 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredVersion {
    pub number: u32,
    pub status: VersionStatus,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl Snapshot {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open repository snapshot: {}", path.display()))?;
        let snapshot: Self = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse repository snapshot: {}", path.display()))?;
        snapshot
            .validate()
            .with_context(|| format!("Inconsistent repository snapshot: {}", path.display()))?;
        Ok(snapshot)
    }

    /// Write the snapshot through a temporary file and rename it into place.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create directory {}", parent.display())
                })?;
            }
        }

        let temp_path = path.with_extension("tmp");
        {
            let mut file = File::create(&temp_path).with_context(|| {
                format!("Failed to create temporary file {}", temp_path.display())
            })?;
            let content = serde_json::to_vec_pretty(self).context("Failed to encode snapshot")?;
            file.write_all(&content)
                .context("Failed to write snapshot content")?;
            file.sync_all().context("Failed to sync snapshot")?;
        }

        fs::rename(&temp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                temp_path.display(),
                path.display()
            )
        })?;
        Ok(())
    }

    /// Check the invariants the services rely on.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for content in &self.contents {
            if !seen.insert(content.id) {
                return Err(anyhow!("Duplicate content id {}", content.id));
            }
            if let Some(current) = content.current_version {
                match content.version(current) {
                    Some(v) if v.status == VersionStatus::Published => {},
                    _ => {
                        return Err(anyhow!(
                            "Content {} points at version {} which is not published",
                            content.id,
                            current
                        ))
                    },
                }
            }
        }

        let by_id: BTreeMap<LocationId, &Location> =
            self.locations.iter().map(|l| (l.id, l)).collect();
        if by_id.len() != self.locations.len() {
            return Err(anyhow!("Duplicate location ids"));
        }
        for location in &self.locations {
            if !seen.contains(&location.content_id) {
                return Err(anyhow!(
                    "Location {} references missing content {}",
                    location.id,
                    location.content_id
                ));
            }
            let expected = match location.parent_id {
                Some(parent_id) => {
                    let parent = by_id.get(&parent_id).ok_or_else(|| {
                        anyhow!(
                            "Location {} references missing parent {}",
                            location.id,
                            parent_id
                        )
                    })?;
                    format!("{}{}/", parent.path_string, location.id)
                },
                None => format!("/{}/", location.id),
            };
            if location.path_string != expected {
                return Err(anyhow!(
                    "Location {} has path {} but its parent chain gives {}",
                    location.id,
                    location.path_string,
                    expected
                ));
            }
        }

        let users: HashSet<_> = self.users.iter().map(|u| u.id).collect();
        let roles: HashSet<_> = self.roles.iter().map(|r| r.id).collect();
        for assignment in &self.role_assignments {
            if !users.contains(&assignment.user_id) || !roles.contains(&assignment.role_id) {
                return Err(anyhow!(
                    "Role assignment {} references a missing user or role",
                    assignment.id
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LocationId;
    use tempfile::TempDir;

    fn location(id: u64, parent: Option<u64>, path: &str) -> Location {
        Location {
            id: LocationId(id),
            parent_id: parent.map(LocationId),
            content_id: ContentId(1),
            path_string: path.to_string(),
        }
    }

    fn content() -> StoredContent {
        StoredContent {
            id: ContentId(1),
            name: "Home".to_string(),
            content_type: "folder".to_string(),
            current_version: Some(1),
            main_location_id: Some(LocationId(1)),
            versions: vec![StoredVersion {
                number: 1,
                status: VersionStatus::Published,
                fields: BTreeMap::new(),
            }],
        }
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("repository.json");

        let snapshot = Snapshot {
            contents: vec![content()],
            locations: vec![location(1, None, "/1/")],
            ..Snapshot::default()
        };
        snapshot.save(&path).unwrap();

        let loaded = Snapshot::load(&path).unwrap();
        assert_eq!(loaded.contents, snapshot.contents);
        assert_eq!(loaded.locations, snapshot.locations);
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_validate_rejects_inconsistent_path() {
        let snapshot = Snapshot {
            contents: vec![content()],
            locations: vec![location(1, None, "/1/"), location(2, Some(1), "/9/2/")],
            ..Snapshot::default()
        };
        let err = snapshot.validate().unwrap_err();
        assert!(err.to_string().contains("parent chain"));
    }

    #[test]
    fn test_validate_rejects_unpublished_current_version() {
        let mut stored = content();
        stored.versions[0].status = VersionStatus::Draft;
        let snapshot = Snapshot {
            contents: vec![stored],
            ..Snapshot::default()
        };
        assert!(snapshot.validate().is_err());
    }

    #[test]
    fn test_load_missing_file_fails_with_path() {
        let err = Snapshot::load(Path::new("/nonexistent/repository.json")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/repository.json"));
    }
}
