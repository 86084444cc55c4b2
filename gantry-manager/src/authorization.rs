//! Folder authorization matrix
//!
//! Roles are stored on the server as permission entries of the form
//! `<permission>:<principal>` inside the folder's authorization matrix
//! property. Each [`Role`] maps to exactly one permission set, so a
//! principal's entries can be mapped back to a role by exact set match.

use std::collections::{BTreeMap, BTreeSet};

use gantry_core::Role;
use xmltree::{Element, EmitterConfig, XMLNode};

use crate::error::{Result, ServiceError};

pub const PERMISSION_PREFIX: &str = "hudson.model.";
pub const AUTHORIZATION_MATRIX_PROPERTY: &str =
    "com.cloudbees.hudson.plugins.folder.properties.AuthorizationMatrixProperty";
pub const INHERIT_GLOBAL_STRATEGY: &str =
    "org.jenkinsci.plugins.matrixauth.inheritance.InheritGlobalStrategy";

const PROPERTIES: &str = "properties";
const PERMISSION: &str = "permission";
const INHERITANCE_STRATEGY: &str = "inheritanceStrategy";

const GUEST_PERMISSIONS: &[&str] = &["Item.Read", "View.Read"];

const CONTRIBUTOR_PERMISSIONS: &[&str] = &["Item.Read", "Item.Build", "Item.Cancel", "View.Read"];

const MANAGER_PERMISSIONS: &[&str] = &[
    "Item.Build",
    "Item.Cancel",
    "Item.Configure",
    "Item.Create",
    "Item.Delete",
    "Item.Discover",
    "Item.Move",
    "Item.Read",
    "Item.Workspace",
    "Run.Delete",
    "Run.Replay",
    "Run.Update",
    "View.Configure",
    "View.Create",
    "View.Delete",
    "View.Read",
];

// =============================================================================
// Role Mapping
// =============================================================================

/// Fully qualified permissions granted by `role`, in declared order
pub fn role_permissions(role: Role) -> Vec<String> {
    let permissions = match role {
        Role::Guest => GUEST_PERMISSIONS,
        Role::Contributor => CONTRIBUTOR_PERMISSIONS,
        Role::Manager => MANAGER_PERMISSIONS,
    };

    permissions
        .iter()
        .map(|permission| format!("{}{}", PERMISSION_PREFIX, permission))
        .collect()
}

/// Role whose permission set is exactly `permissions`
pub fn role_for_permissions(permissions: &BTreeSet<String>) -> Option<Role> {
    Role::ALL.into_iter().find(|&role| {
        let expected: BTreeSet<String> = role_permissions(role).into_iter().collect();
        &expected == permissions
    })
}

/// One `<permission>` entry of the matrix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionEntry {
    pub permission: String,
    pub principal: String,
}

impl PermissionEntry {
    pub fn new(permission: impl Into<String>, principal: impl Into<String>) -> Self {
        Self {
            permission: permission.into(),
            principal: principal.into(),
        }
    }

    /// Parse `<permission>:<principal>`
    ///
    /// A leading `GROUP:` or `USER:` qualifier, as written by newer matrix
    /// plugins, is accepted and dropped. Entries without a colon are `None`.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let text = text
            .strip_prefix("GROUP:")
            .or_else(|| text.strip_prefix("USER:"))
            .unwrap_or(text);

        let (permission, principal) = text.split_once(':')?;
        if permission.is_empty() || principal.is_empty() {
            return None;
        }
        Some(Self::new(permission, principal))
    }
}

impl std::fmt::Display for PermissionEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.permission, self.principal)
    }
}

// =============================================================================
// Configuration Document
// =============================================================================

/// Configuration document of a folder, as far as authorization goes
#[derive(Debug, Clone)]
pub struct AuthorizationDocument {
    root: Element,
}

impl AuthorizationDocument {
    pub fn parse(text: &str) -> Result<Self> {
        let root = Element::parse(text.as_bytes())
            .map_err(|e| ServiceError::Document(format!("Failed to parse configuration: {}", e)))?;
        Ok(Self { root })
    }

    fn matrix(&self) -> Option<&Element> {
        self.root
            .get_child(PROPERTIES)?
            .get_child(AUTHORIZATION_MATRIX_PROPERTY)
    }

    fn matrix_mut(&mut self) -> Result<&mut Element> {
        let properties = child_or_insert(&mut self.root, PROPERTIES)?;
        child_or_insert(properties, AUTHORIZATION_MATRIX_PROPERTY)
    }

    pub fn has_matrix(&self) -> bool {
        self.matrix().is_some()
    }

    /// Raw text of every `<permission>` entry of the matrix
    pub fn permission_entries(&self) -> Vec<String> {
        let Some(matrix) = self.matrix() else {
            return Vec::new();
        };

        matrix
            .children
            .iter()
            .filter_map(XMLNode::as_element)
            .filter(|element| element.name == PERMISSION)
            .filter_map(|element| element.get_text())
            .map(|text| text.trim().to_string())
            .collect()
    }

    /// Permissions of every principal in the matrix
    ///
    /// Malformed entries are logged and left out.
    pub fn grants(&self) -> BTreeMap<String, BTreeSet<String>> {
        let mut grants: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for text in self.permission_entries() {
            match PermissionEntry::parse(&text) {
                Some(entry) => {
                    grants
                        .entry(entry.principal)
                        .or_default()
                        .insert(entry.permission);
                }
                None => tracing::warn!("Ignoring malformed permission entry '{}'", text),
            }
        }

        grants
    }

    /// Replace every grant of `principal` with `permissions`
    ///
    /// Creates the matrix (and `properties`) when missing and resets the
    /// inheritance strategy to "inherit global" as first matrix child.
    pub fn set_grants(&mut self, principal: &str, permissions: &[String]) -> Result<()> {
        let matrix = self.matrix_mut()?;

        matrix.children.retain(|node| {
            let Some(element) = node.as_element() else {
                return true;
            };
            if element.name == INHERITANCE_STRATEGY {
                return false;
            }
            if element.name != PERMISSION {
                return true;
            }
            element
                .get_text()
                .and_then(|text| PermissionEntry::parse(&text))
                .is_none_or(|entry| entry.principal != principal)
        });

        for permission in permissions {
            let mut element = Element::new(PERMISSION);
            element.children.push(XMLNode::Text(
                PermissionEntry::new(permission.as_str(), principal).to_string(),
            ));
            matrix.children.push(XMLNode::Element(element));
        }

        let mut strategy = Element::new(INHERITANCE_STRATEGY);
        strategy
            .attributes
            .insert("class".to_string(), INHERIT_GLOBAL_STRATEGY.to_string());
        matrix.children.insert(0, XMLNode::Element(strategy));

        Ok(())
    }

    pub fn to_xml(&self) -> Result<String> {
        let mut out = Vec::new();
        self.root
            .write_with_config(&mut out, EmitterConfig::new().perform_indent(true))
            .map_err(|e| {
                ServiceError::Document(format!("Failed to serialize configuration: {}", e))
            })?;

        String::from_utf8(out).map_err(|e| ServiceError::Document(e.to_string()))
    }
}

/// Child `name` of `parent`, appended first when missing
fn child_or_insert<'a>(parent: &'a mut Element, name: &str) -> Result<&'a mut Element> {
    if parent.get_child(name).is_none() {
        parent.children.push(XMLNode::Element(Element::new(name)));
    }
    parent
        .get_mut_child(name)
        .ok_or_else(|| ServiceError::Document(format!("Missing <{}> element", name)))
}
