//! Departments, roles, and the client-side department tree.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::error::CoreError;
use crate::types::DbId;

/// A department node. `children` is empty for flat listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Department {
    pub id: DbId,
    pub name: String,
    pub parent_id: Option<DbId>,
    pub leader: Option<String>,
    pub sort: i32,
    pub children: Vec<Department>,
}

/// A role as listed in the role picker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Role {
    pub id: DbId,
    pub name: String,
    pub code: String,
}

/// Payload for creating or updating a department.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentPayload {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<DbId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leader: Option<String>,
    pub sort: i32,
}

impl DepartmentPayload {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::Validation("Department name is required".into()));
        }
        Ok(())
    }
}

/// Build a tree from a flat department list.
///
/// Roots are nodes whose parent is absent, `0`, or not present in the list.
/// Siblings are ordered by `sort`, then `id`. Nodes that are only reachable
/// through a parent cycle are dropped.
pub fn build_tree(flat: Vec<Department>) -> Vec<Department> {
    let ids: HashSet<DbId> = flat.iter().map(|d| d.id).collect();
    let mut by_parent: HashMap<Option<DbId>, Vec<Department>> = HashMap::new();

    for dept in flat {
        let parent = dept.parent_id.filter(|p| *p != 0 && ids.contains(p));
        by_parent.entry(parent).or_default().push(dept);
    }

    let mut roots = by_parent.remove(&None).unwrap_or_default();
    sort_siblings(&mut roots);
    for root in &mut roots {
        attach_children(root, &mut by_parent);
    }
    roots
}

fn attach_children(node: &mut Department, by_parent: &mut HashMap<Option<DbId>, Vec<Department>>) {
    let mut children = by_parent.remove(&Some(node.id)).unwrap_or_default();
    sort_siblings(&mut children);
    for child in &mut children {
        attach_children(child, by_parent);
    }
    node.children = children;
}

fn sort_siblings(nodes: &mut [Department]) {
    nodes.sort_by_key(|d| (d.sort, d.id));
}

/// Flatten a tree depth-first, clearing `children` on every node.
pub fn flatten_tree(tree: Vec<Department>) -> Vec<Department> {
    let mut out = Vec::new();
    for mut node in tree {
        let children = std::mem::take(&mut node.children);
        out.push(node);
        out.extend(flatten_tree(children));
    }
    out
}

/// Find a department anywhere in a tree.
pub fn find_in_tree(tree: &[Department], id: DbId) -> Option<&Department> {
    tree.iter()
        .find_map(|d| if d.id == id { Some(d) } else { find_in_tree(&d.children, id) })
}
