//! Repository entities as seen through the service traits.
//!
//! Identifiers are opaque 64-bit values. Entities returned by a service are
//! snapshots: holding one does not pin the repository state, and callers that
//! need the current position of a node must load it again.

use crate::richtext::RichText;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            pub fn new(id: u64) -> Self {
                Self(id)
            }

            pub fn raw(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }
    };
}

id_type!(
    /// Identifier of a content object.
    ContentId
);
id_type!(
    /// Identifier of a single tree position.
    LocationId
);
id_type!(
    /// Identifier of a user account.
    UserId
);
id_type!(
    /// Numeric identifier of a role.
    RoleId
);
id_type!(
    /// Identifier of one role-assignment row.
    AssignmentId
);

/// The acting identity every mutating service call is made on behalf of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub login: String,
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.login, self.user_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub login: String,
    pub name: String,
    pub email: String,
}

impl User {
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.id,
            login: self.login.clone(),
        }
    }
}

/// A `module/function` permission. `*` matches anything in either slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub module: String,
    pub function: String,
}

impl Policy {
    pub fn new(module: &str, function: &str) -> Self {
        Self {
            module: module.to_string(),
            function: function.to_string(),
        }
    }

    pub fn allows(&self, module: &str, function: &str) -> bool {
        (self.module == "*" || self.module == module)
            && (self.function == "*" || self.function == function)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub identifier: String,
    pub name: String,
    #[serde(default)]
    pub policies: Vec<Policy>,
}

/// Restricts the effect of a role assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "identifier", content = "values", rename_all = "snake_case")]
pub enum Limitation {
    /// Only locations whose path starts with one of these path strings.
    Subtree(Vec<String>),
}

impl Limitation {
    pub fn subtree(path_string: &str) -> Self {
        Self::Subtree(vec![path_string.to_string()])
    }

    pub fn identifier(&self) -> &'static str {
        match self {
            Self::Subtree(_) => "Subtree",
        }
    }

    pub fn values(&self) -> &[String] {
        match self {
            Self::Subtree(paths) => paths,
        }
    }

    /// True when a location at `path_string` falls inside the limitation.
    pub fn covers(&self, path_string: &str) -> bool {
        match self {
            Self::Subtree(paths) => paths.iter().any(|p| path_string.starts_with(p.as_str())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub id: AssignmentId,
    pub role_id: RoleId,
    pub user_id: UserId,
    #[serde(default)]
    pub limitation: Option<Limitation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    /// `None` only for tree roots.
    pub parent_id: Option<LocationId>,
    pub content_id: ContentId,
    /// Materialized path such as `/1/2/42/`, ending with this location's id.
    pub path_string: String,
}

impl Location {
    /// True when `other` is this location or sits anywhere below it.
    pub fn contains(&self, other: &Location) -> bool {
        other.path_string.starts_with(&self.path_string)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionStatus {
    Draft,
    Published,
    Archived,
}

impl fmt::Display for VersionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Archived => "archived",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    RichText(RichText),
}

impl FieldValue {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            Self::RichText(doc) => doc.is_empty(),
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Text(_) => FieldKind::Text,
            Self::RichText(_) => FieldKind::RichText,
        }
    }

    pub fn as_rich_text(&self) -> Option<&RichText> {
        match self {
            Self::RichText(doc) => Some(doc),
            Self::Text(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    RichText,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::RichText => f.write_str("rich_text"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub identifier: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentType {
    pub identifier: String,
    pub fields: Vec<FieldDefinition>,
}

impl ContentType {
    pub fn field(&self, identifier: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.identifier == identifier)
    }
}

/// Descriptor of a content object without its field data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentInfo {
    pub id: ContentId,
    pub name: String,
    pub content_type: String,
    /// `None` until a first version has been published.
    pub current_version: Option<u32>,
    pub main_location_id: Option<LocationId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    pub content_id: ContentId,
    pub number: u32,
    pub status: VersionStatus,
}

/// A content object loaded in its published version.
#[derive(Debug, Clone, PartialEq)]
pub struct Content {
    pub info: ContentInfo,
    pub version: VersionInfo,
    pub fields: BTreeMap<String, FieldValue>,
}

impl Content {
    pub fn field(&self, identifier: &str) -> Option<&FieldValue> {
        self.fields.get(identifier)
    }
}

/// Field changes to apply to a draft. An empty struct is a valid update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentUpdate {
    pub fields: BTreeMap<String, FieldValue>,
}

impl ContentUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_field(&mut self, identifier: &str, value: FieldValue) {
        self.fields.insert(identifier.to_string(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// One row as reported by the legacy role reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyRoleRow {
    pub user_role_id: AssignmentId,
    pub role_name: String,
    pub limit_identifier: String,
    pub limit_value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(id: u64, path: &str) -> Location {
        Location {
            id: LocationId(id),
            parent_id: None,
            content_id: ContentId(id),
            path_string: path.to_string(),
        }
    }

    #[test]
    fn test_id_parses_with_whitespace() {
        assert_eq!(" 42 ".parse::<ContentId>().unwrap(), ContentId(42));
        assert!("abc".parse::<LocationId>().is_err());
        assert!("".parse::<UserId>().is_err());
    }

    #[test]
    fn test_location_contains_descendants_and_itself() {
        let parent = location(2, "/1/2/");
        let child = location(5, "/1/2/5/");
        let sibling = location(3, "/1/3/");

        assert!(parent.contains(&parent));
        assert!(parent.contains(&child));
        assert!(!parent.contains(&sibling));
        assert!(!child.contains(&parent));
    }

    #[test]
    fn test_path_prefix_does_not_match_partial_segment() {
        let two = location(2, "/1/2/");
        let twenty = location(20, "/1/20/");
        assert!(!two.contains(&twenty));
    }

    #[test]
    fn test_policy_wildcards() {
        assert!(Policy::new("*", "*").allows("content", "remove"));
        assert!(Policy::new("content", "*").allows("content", "edit"));
        assert!(!Policy::new("content", "read").allows("content", "edit"));
        assert!(!Policy::new("role", "*").allows("content", "edit"));
    }

    #[test]
    fn test_subtree_limitation_covers() {
        let limitation = Limitation::subtree("/1/2/");
        assert!(limitation.covers("/1/2/"));
        assert!(limitation.covers("/1/2/9/"));
        assert!(!limitation.covers("/1/3/"));
        assert_eq!(limitation.identifier(), "Subtree");
    }

    #[test]
    fn test_limitation_serde_shape() {
        let json = serde_json::to_string(&Limitation::subtree("/1/2/")).unwrap();
        assert_eq!(json, r#"{"identifier":"subtree","values":["/1/2/"]}"#);
    }
}
