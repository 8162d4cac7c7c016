use super::snapshot::{Snapshot, StoredContent, StoredVersion};
use crate::model::{
    AssignmentId, ContentId, ContentType, FieldDefinition, FieldKind, FieldValue, Limitation,
    Location, LocationId, Policy, Role, RoleAssignment, RoleId, User, UserId, VersionStatus,
};
use crate::richtext::RichText;
use std::collections::BTreeMap;

/// Fluent construction of repository snapshots for fixtures and seeding.
///
/// Locations must be added after their parent; the path string is derived
/// from the parent's.
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    snapshot: Snapshot,
}

impl SnapshotBuilder {
    /// A builder preloaded with the `folder` and `article` content types.
    pub fn new() -> Self {
        let mut builder = Self::default();
        builder.snapshot.content_types = vec![
            ContentType {
                identifier: "folder".to_string(),
                fields: vec![field("name", FieldKind::Text, true)],
            },
            ContentType {
                identifier: "article".to_string(),
                fields: vec![
                    field("title", FieldKind::Text, true),
                    field("body", FieldKind::RichText, false),
                ],
            },
        ];
        builder
    }

    /// Add an administrator account with an unlimited `*/*` role.
    pub fn with_admin(self, user_id: u64) -> Self {
        self.user(user_id, "admin", "Administrator User", "admin@example.com")
            .role(1, "administrator", &[("*", "*")])
            .assignment(1, 1, user_id, None)
    }

    pub fn user(mut self, id: u64, login: &str, name: &str, email: &str) -> Self {
        self.snapshot.users.push(User {
            id: UserId(id),
            login: login.to_string(),
            name: name.to_string(),
            email: email.to_string(),
        });
        self
    }

    pub fn role(mut self, id: u64, identifier: &str, policies: &[(&str, &str)]) -> Self {
        self.snapshot.roles.push(Role {
            id: RoleId(id),
            identifier: identifier.to_string(),
            name: identifier.to_string(),
            policies: policies
                .iter()
                .map(|(module, function)| Policy::new(module, function))
                .collect(),
        });
        self
    }

    pub fn assignment(
        mut self,
        id: u64,
        role_id: u64,
        user_id: u64,
        limitation: Option<Limitation>,
    ) -> Self {
        self.snapshot.role_assignments.push(RoleAssignment {
            id: AssignmentId(id),
            role_id: RoleId(role_id),
            user_id: UserId(user_id),
            limitation,
        });
        self
    }

    /// Add a content object with a single published version.
    pub fn content(
        mut self,
        id: u64,
        name: &str,
        content_type: &str,
        fields: Vec<(&str, FieldValue)>,
    ) -> Self {
        let fields: BTreeMap<String, FieldValue> = fields
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        self.snapshot.contents.push(StoredContent {
            id: ContentId(id),
            name: name.to_string(),
            content_type: content_type.to_string(),
            current_version: Some(1),
            main_location_id: None,
            versions: vec![StoredVersion {
                number: 1,
                status: VersionStatus::Published,
                fields,
            }],
        });
        self
    }

    /// Place content `content_id` at a new location under `parent`.
    pub fn location(mut self, id: u64, content_id: u64, parent: Option<u64>) -> Self {
        let path_string = match parent {
            Some(parent_id) => {
                let parent_path = self
                    .snapshot
                    .locations
                    .iter()
                    .find(|l| l.id == LocationId(parent_id))
                    .map_or_else(|| format!("/{parent_id}/"), |l| l.path_string.clone());
                format!("{parent_path}{id}/")
            },
            None => format!("/{id}/"),
        };
        self.snapshot.locations.push(Location {
            id: LocationId(id),
            parent_id: parent.map(LocationId),
            content_id: ContentId(content_id),
            path_string,
        });
        if let Some(content) = self
            .snapshot
            .contents
            .iter_mut()
            .find(|c| c.id == ContentId(content_id))
        {
            content.main_location_id.get_or_insert(LocationId(id));
        }
        self
    }

    pub fn folder(self, content_id: u64, location_id: u64, parent: Option<u64>) -> Self {
        let name = format!("Folder {content_id}");
        self.content(
            content_id,
            &name,
            "folder",
            vec![("name", FieldValue::Text(name.clone()))],
        )
        .location(location_id, content_id, parent)
    }

    /// Add an article whose `body` is the given markup.
    ///
    /// Panics when `body` is not well-formed; fixtures are expected to be.
    pub fn article(self, content_id: u64, location_id: u64, parent: Option<u64>, body: &str) -> Self {
        let name = format!("Article {content_id}");
        let body = RichText::parse(body).unwrap_or_else(|e| panic!("invalid fixture body: {e}"));
        self.content(
            content_id,
            &name,
            "article",
            vec![
                ("title", FieldValue::Text(name.clone())),
                ("body", FieldValue::RichText(body)),
            ],
        )
        .location(location_id, content_id, parent)
    }

    pub fn build(self) -> Snapshot {
        self.snapshot
    }
}

fn field(identifier: &str, kind: FieldKind, required: bool) -> FieldDefinition {
    FieldDefinition {
        identifier: identifier.to_string(),
        kind,
        required,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_output_validates() {
        let snapshot = SnapshotBuilder::new()
            .with_admin(14)
            .folder(1, 1, None)
            .folder(2, 2, Some(1))
            .article(3, 3, Some(2), "<p>hello</p>")
            .build();

        snapshot.validate().unwrap();
        let article = snapshot.locations.iter().find(|l| l.id == LocationId(3)).unwrap();
        assert_eq!(article.path_string, "/1/2/3/");
        assert_eq!(snapshot.contents[2].main_location_id, Some(LocationId(3)));
    }
}
