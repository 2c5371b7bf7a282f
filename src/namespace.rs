//! Namespace tree
//!
//! Compiled models are bound into a tree of namespaces that mirrors the
//! directory layout of the schema files plus any `schema`/`version` segments
//! declared inside them:
//!
//! ```text
//! <root>
//! └── Test                 (directory "test")
//!     └── TestSchema       (schema: TestSchema)
//!         ├── Company
//!         ├── Employee
//!         └── V_1_2        (version: "1.2")
//! ```
//!
//! Nodes are created on demand and never replaced, so a path of segment
//! names always resolves to the same node.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{ModelError, Result};

/// Separator between namespace segments in qualified names
pub const SEPARATOR: &str = "::";

/// Handle to a node in a [`NamespaceTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamespaceId(usize);

#[derive(Debug, Clone)]
pub struct Namespace {
    name: String,
    qualified_name: String,
    parent: Option<NamespaceId>,
    children: BTreeMap<String, NamespaceId>,
    /// Bound type name → Type Context key
    bindings: BTreeMap<String, String>,
}

impl Namespace {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `Test::TestSchema`; empty for the root
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    pub fn parent(&self) -> Option<NamespaceId> {
        self.parent
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, NamespaceId)> {
        self.children.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn child(&self, name: &str) -> Option<NamespaceId> {
        self.children.get(name).copied()
    }

    pub fn bindings(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn binding(&self, name: &str) -> Option<&str> {
        self.bindings.get(name).map(String::as_str)
    }
}

/// Arena of namespace nodes rooted at an unnamed root
#[derive(Debug, Clone)]
pub struct NamespaceTree {
    nodes: Vec<Namespace>,
}

impl Default for NamespaceTree {
    fn default() -> Self {
        Self::new()
    }
}

impl NamespaceTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![Namespace {
                name: String::new(),
                qualified_name: String::new(),
                parent: None,
                children: BTreeMap::new(),
                bindings: BTreeMap::new(),
            }],
        }
    }

    pub fn root(&self) -> NamespaceId {
        NamespaceId(0)
    }

    pub fn get(&self, id: NamespaceId) -> &Namespace {
        &self.nodes[id.0]
    }

    /// Child `segment` of `parent`, created if missing. Existing nodes are
    /// returned as they are, bindings included.
    pub fn find_or_create(&mut self, parent: NamespaceId, segment: &str) -> NamespaceId {
        if let Some(&existing) = self.nodes[parent.0].children.get(segment) {
            return existing;
        }
        let id = NamespaceId(self.nodes.len());
        let qualified_name = qualify(&self.nodes[parent.0].qualified_name, segment);
        debug!(namespace = %qualified_name, "creating namespace");
        self.nodes.push(Namespace {
            name: segment.to_string(),
            qualified_name,
            parent: Some(parent),
            children: BTreeMap::new(),
            bindings: BTreeMap::new(),
        });
        self.nodes[parent.0].children.insert(segment.to_string(), id);
        id
    }

    /// Descend from `root` through `segments`, normalizing each into an
    /// identifier. Blank segments are skipped.
    pub fn namespace_for<S: AsRef<str>>(&mut self, root: NamespaceId, segments: &[S]) -> Result<NamespaceId> {
        let mut current = root;
        for segment in segments {
            let segment = segment.as_ref().trim();
            if segment.is_empty() {
                continue;
            }
            let ident = to_namespace_ident(segment)?;
            current = self.find_or_create(current, &ident);
        }
        Ok(current)
    }

    /// Resolve an existing namespace by qualified name without creating nodes
    pub fn find(&self, qualified_name: &str) -> Option<NamespaceId> {
        let mut current = self.root();
        for segment in qualified_name.split(SEPARATOR).filter(|s| !s.is_empty()) {
            current = *self.nodes[current.0].children.get(segment)?;
        }
        Some(current)
    }

    /// Record that `name` in namespace `id` refers to Type Context key `key`.
    /// Rebinding a name replaces the previous binding.
    pub fn bind(&mut self, id: NamespaceId, name: &str, key: &str) -> Option<String> {
        self.nodes[id.0].bindings.insert(name.to_string(), key.to_string())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NamespaceId, &Namespace)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NamespaceId(i), n))
    }
}

/// Join a namespace's qualified name and a member name
pub fn qualify(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}{}{}", namespace, SEPARATOR, name)
    }
}

/// Turn a path segment into a namespace identifier.
///
/// The first character of every `_`, `-` or space separated word is
/// upper-cased and separators are dropped; other characters are kept as they
/// are (`test_schema` → `TestSchema`, `tc` → `Tc`, `TestSchema` unchanged).
pub fn to_namespace_ident(segment: &str) -> Result<String> {
    let mut ident = String::with_capacity(segment.len());
    let mut capitalize_next = true;

    for c in segment.chars() {
        if c == '_' || c == '-' || c == ' ' {
            capitalize_next = true;
        } else if !c.is_alphanumeric() {
            return Err(ModelError::InvalidDefinition(format!(
                "namespace segment '{}' contains '{}'",
                segment, c
            )));
        } else if capitalize_next {
            ident.extend(c.to_uppercase());
            capitalize_next = false;
        } else {
            ident.push(c);
        }
    }

    match ident.chars().next() {
        Some(first) if first.is_alphabetic() => Ok(ident),
        _ => Err(ModelError::InvalidDefinition(format!(
            "namespace segment '{}' does not start with a letter",
            segment
        ))),
    }
}

/// Namespace segment for a schema version: `V_` + version, `.` → `_`
pub fn version_segment(version: &str) -> String {
    format!("V_{}", version.trim().replace('.', "_"))
}
