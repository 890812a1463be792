//! Static checks on a tree before it runs

use std::collections::HashSet;

use netsuite_domain::{DomainError, DomainResult};

use super::node::{Suite, TestNode};

/// Rejects trees where two siblings share a name.
///
/// # Errors
///
/// Returns `DomainError::DuplicateName` with the full name path of the
/// first repeated sibling.
pub fn validate(root: &Suite) -> DomainResult<()> {
    let mut path = vec![root.name().to_string()];
    validate_children(root.children(), &mut path)
}

fn validate_children(children: &[TestNode], path: &mut Vec<String>) -> DomainResult<()> {
    let mut seen = HashSet::new();
    for child in children {
        path.push(child.name().to_string());
        if !seen.insert(child.name()) {
            return Err(DomainError::duplicate_name(path));
        }
        if let TestNode::Suite(suite) = child {
            validate_children(suite.children(), path)?;
        }
        path.pop();
    }
    Ok(())
}
