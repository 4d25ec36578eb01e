//! Dependency graph analyzer.
//!
//! Pure, read-only traversal over registered descriptors and their declared
//! dependency tokens. The analyzer never touches resolver caches and never
//! constructs anything; a cycle reported here is a diagnostic, not an error,
//! since the resolver wires cycles at runtime.

use std::collections::HashSet;
use std::fmt;

use crate::registration::Registry;
use crate::token::Token;

/// Classification of one node in a dependency tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeStatus {
    /// The token has a descriptor and its subtree is expanded below it.
    Resolved,
    /// The token reappears on the current path; the payload is the full path
    /// from the tree root through the repeated token. The subtree is not
    /// expanded again.
    Circular(Vec<Token>),
    /// The token has no registered descriptor.
    NotRegistered,
}

/// One node of a dependency tree built by
/// [`ServiceCollection::dependency_tree`](crate::ServiceCollection::dependency_tree).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub token: Token,
    pub status: TreeStatus,
    pub children: Vec<TreeNode>,
}

/// One distinct cycle found by
/// [`ServiceCollection::find_circular_paths`](crate::ServiceCollection::find_circular_paths).
///
/// The path starts and ends on the same token: `A -> B -> A`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircularPath {
    pub path: Vec<Token>,
}

impl fmt::Display for CircularPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for token in &self.path {
            if !first {
                f.write_str(" -> ")?;
            }
            f.write_str(&token.display_name())?;
            first = false;
        }
        Ok(())
    }
}

/// Depth-first expansion of declared dependencies, bounded by
/// path-membership so it terminates on any graph shape.
pub(crate) fn dependency_tree(registry: &Registry, token: &Token) -> TreeNode {
    let mut path = Vec::new();
    expand(registry, token, &mut path)
}

fn expand(registry: &Registry, token: &Token, path: &mut Vec<Token>) -> TreeNode {
    if path.contains(token) {
        let mut cycle = path.clone();
        cycle.push(token.clone());
        return TreeNode {
            token: token.clone(),
            status: TreeStatus::Circular(cycle),
            children: Vec::new(),
        };
    }
    let Some((_, descriptor)) = registry.last(token) else {
        return TreeNode {
            token: token.clone(),
            status: TreeStatus::NotRegistered,
            children: Vec::new(),
        };
    };

    path.push(token.clone());
    let children = descriptor
        .dependencies()
        .iter()
        .map(|dependency| expand(registry, dependency, path))
        .collect();
    path.pop();

    TreeNode {
        token: token.clone(),
        status: TreeStatus::Resolved,
        children,
    }
}

/// Visited/visiting depth-first traversal over every registered token,
/// reporting each distinct cycle once. The path stack doubles as the
/// visiting set; fully explored tokens are never re-explored.
pub(crate) fn find_circular_paths(registry: &Registry) -> Vec<CircularPath> {
    let mut visited = HashSet::new();
    let mut cycles = Vec::new();
    for token in registry.tokens() {
        if !visited.contains(token) {
            let mut path = Vec::new();
            walk(registry, token, &mut path, &mut visited, &mut cycles);
        }
    }
    cycles
}

fn walk(
    registry: &Registry,
    token: &Token,
    path: &mut Vec<Token>,
    visited: &mut HashSet<Token>,
    cycles: &mut Vec<CircularPath>,
) {
    if let Some(start) = path.iter().position(|t| t == token) {
        let mut cycle = path[start..].to_vec();
        cycle.push(token.clone());
        cycles.push(CircularPath { path: cycle });
        return;
    }
    if visited.contains(token) {
        return;
    }
    let Some((_, descriptor)) = registry.last(token) else {
        visited.insert(token.clone());
        return;
    };

    path.push(token.clone());
    for dependency in descriptor.dependencies() {
        walk(registry, dependency, path, visited, cycles);
    }
    path.pop();
    visited.insert(token.clone());
}

/// Indented text rendering of a dependency tree. Presentation only.
pub(crate) fn render_dependency_tree(node: &TreeNode) -> String {
    let mut out = String::new();
    render_node(node, 0, &mut out);
    out
}

fn render_node(node: &TreeNode, depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str("  ");
    }
    out.push_str(&node.token.display_name());
    match &node.status {
        TreeStatus::Resolved => {}
        TreeStatus::NotRegistered => out.push_str(" (not registered)"),
        TreeStatus::Circular(cycle) => {
            out.push_str(" (circular: ");
            out.push_str(&CircularPath {
                path: cycle.clone(),
            }
            .to_string());
            out.push(')');
        }
    }
    out.push('\n');
    for child in &node.children {
        render_node(child, depth + 1, out);
    }
}

/// Text rendering of a cycle list, one path per line. Presentation only.
pub(crate) fn render_circular_paths(paths: &[CircularPath]) -> String {
    if paths.is_empty() {
        return "no circular dependencies\n".to_string();
    }
    let mut out = String::new();
    for path in paths {
        out.push_str(&path.to_string());
        out.push('\n');
    }
    out
}
