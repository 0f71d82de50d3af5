//! Source directory types and the resolved snapshot.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// The attribute/value pair selecting which top-level groups (and
/// transitively their subgroups) participate in sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeFilter {
    /// Name of the group attribute to inspect.
    pub attribute: String,
    /// Value the attribute must carry for the group to be in scope.
    pub value: String,
}

impl ScopeFilter {
    /// Create a scope filter.
    pub fn new(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            value: value.into(),
        }
    }
}

/// How a group came to carry (or not carry) the scope attribute.
///
/// The tri-state keeps "defined with the wrong value" distinguishable from
/// "never defined" while both resolve to out-of-scope, and makes inherited
/// scope explicit instead of an implicit falsy lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeResolution {
    /// The group itself defines the attribute with this value.
    Defined(String),
    /// The nearest ancestor defining the attribute supplied this value.
    Inherited(String),
    /// Neither the group nor any ancestor defines the attribute.
    Absent,
}

impl AttributeResolution {
    /// The resolved value, if any.
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::Defined(v) | Self::Inherited(v) => Some(v),
            Self::Absent => None,
        }
    }

    /// Whether the resolution satisfies the filter's expected value.
    pub fn matches(&self, filter: &ScopeFilter) -> bool {
        self.value() == Some(filter.value.as_str())
    }
}

/// A group as the source directory reports it.
///
/// Attributes are multi-valued, matching directory server conventions: the
/// scope check passes when any of the attribute's values equals the
/// expected value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceGroup {
    /// Source-assigned identifier; the correlation key for this group.
    pub id: String,
    /// Plain group name.
    pub name: String,
    /// Attribute map; may be empty.
    #[serde(default)]
    pub attributes: HashMap<String, Vec<String>>,
    /// Identifier of the parent group, absent for top-level groups.
    pub parent_id: Option<String>,
    /// Identifiers of direct child groups.
    #[serde(default)]
    pub child_ids: Vec<String>,
    /// Identifiers of direct member users.
    #[serde(default)]
    pub member_ids: Vec<String>,
}

impl SourceGroup {
    /// The group's own resolution of `filter`'s attribute, ignoring
    /// ancestors.
    pub fn own_attribute(&self, filter: &ScopeFilter) -> Option<&[String]> {
        self.attributes.get(&filter.attribute).map(Vec::as_slice)
    }
}

/// A user as the source directory reports it.
///
/// `group_ids` is filled in by the directory reader with the in-scope
/// groups the user was reached through; the raw adapter record leaves it
/// empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceUser {
    /// Source-assigned identifier; the correlation key for this user.
    pub id: String,
    /// Login name, unique within the source realm.
    pub username: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Whether the account is enabled at the source.
    pub enabled: bool,
    /// In-scope groups this user belongs to, direct or via subgroup.
    #[serde(default)]
    pub group_ids: BTreeSet<String>,
}

impl SourceUser {
    /// Display name projection: "first last" trimmed, falling back to the
    /// username when both name parts are missing.
    pub fn display_name(&self) -> String {
        let full = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        );
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

/// A group admitted to the snapshot, with its position in the in-scope
/// hierarchy resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedGroup {
    /// Correlation key (the source group identifier).
    pub id: String,
    /// Plain group name.
    pub name: String,
    /// Display name the group is provisioned under at the target:
    /// the configured prefix plus the ancestor name chain. Also the
    /// correlation key on the target side, since some provisioning
    /// endpoints drop `externalId` on groups.
    pub provisioned_name: String,
    /// Depth within the in-scope hierarchy; an in-scope top-level group is
    /// depth 0, its subgroups depth 1, and so on.
    pub depth: usize,
    /// Parent group id when the parent is itself part of the snapshot.
    pub parent_id: Option<String>,
    /// Direct member user ids.
    pub member_ids: Vec<String>,
}

/// Output of the directory reader: the authoritative desired state for one
/// pass.
///
/// Groups and users are each deduplicated by identifier. Group order is
/// shallowest-first, so iterating the vector already respects the
/// parent-before-child creation invariant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolvedSnapshot {
    pub groups: Vec<ResolvedGroup>,
    pub users: Vec<SourceUser>,
}

impl ResolvedSnapshot {
    /// Look up a snapshot group by its correlation key.
    pub fn group(&self, id: &str) -> Option<&ResolvedGroup> {
        self.groups.iter().find(|g| g.id == id)
    }

    /// Look up a snapshot user by its correlation key.
    pub fn user(&self, id: &str) -> Option<&SourceUser> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.users.is_empty()
    }
}
