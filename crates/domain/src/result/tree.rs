//! Result tree and report rendering

use std::collections::BTreeMap;
use std::fmt;

use super::outcome::Outcome;
use crate::error::{DomainError, DomainResult};

/// Separates the full listing from the failure details.
pub const BANNER: &str = "============================";
/// Precedes a captured request in a failure block.
pub const REQUEST_SEPARATOR: &str = ">>>>>>>>>>>>>>>>>>>>>>>>>";
/// Precedes a captured response in a failure block.
pub const RESPONSE_SEPARATOR: &str = "<<<<<<<<<<<<<<<<<<<<<<<<<";
/// Terminates a failure block.
pub const FAILURE_TERMINATOR: &str = "--------------------------";
/// Printed instead of failure details when every spec passed.
pub const ALL_PASSED: &str = "All Tests Passed";

/// One node of the result tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultNode {
    /// A suite, with children keyed and ordered by name.
    Suite(BTreeMap<String, ResultNode>),
    /// A spec leaf.
    Spec(Outcome),
}

/// Pass/fail outcomes keyed by each spec's root-to-leaf name path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTree {
    root: BTreeMap<String, ResultNode>,
}

impl ResultTree {
    /// Creates an empty tree.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            root: BTreeMap::new(),
        }
    }

    /// Records an outcome at the given name path, creating suites on the way.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::DuplicateName` if the leaf is already occupied
    /// or if the path runs through an existing spec.
    pub fn insert(&mut self, path: &[String], outcome: Outcome) -> DomainResult<()> {
        let Some((leaf, suites)) = path.split_last() else {
            return Err(DomainError::EmptyPath);
        };

        let mut level = &mut self.root;
        for name in suites {
            let node = level
                .entry(name.clone())
                .or_insert_with(|| ResultNode::Suite(BTreeMap::new()));
            level = match node {
                ResultNode::Suite(children) => children,
                ResultNode::Spec(_) => return Err(DomainError::duplicate_name(path)),
            };
        }

        if level.contains_key(leaf) {
            return Err(DomainError::duplicate_name(path));
        }
        level.insert(leaf.clone(), ResultNode::Spec(outcome));
        Ok(())
    }

    /// Returns the outcome recorded at a spec path.
    #[must_use]
    pub fn outcome(&self, path: &[&str]) -> Option<&Outcome> {
        let (leaf, suites) = path.split_last()?;
        let mut level = &self.root;
        for name in suites {
            match level.get(*name)? {
                ResultNode::Suite(children) => level = children,
                ResultNode::Spec(_) => return None,
            }
        }
        match level.get(*leaf)? {
            ResultNode::Spec(outcome) => Some(outcome),
            ResultNode::Suite(_) => None,
        }
    }

    /// Number of passing specs.
    #[must_use]
    pub fn passed_count(&self) -> usize {
        count(&self.root, Outcome::is_pass)
    }

    /// Number of failing specs.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        count(&self.root, |outcome| !outcome.is_pass())
    }

    /// Returns true if no spec failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed_count() == 0
    }

    /// Lists every suite and spec, children ordered by name, with
    /// `PASS` or `FAIL: <message>` per leaf.
    #[must_use]
    pub fn all_description(&self) -> String {
        let mut output = String::new();
        render_all(&self.root, 0, &mut output);
        output
    }

    /// Lists only failing specs and the suites above them, with captured
    /// request and response dumps. Returns `None` if nothing failed.
    #[must_use]
    pub fn fail_description(&self) -> Option<String> {
        render_failures(&self.root, 0)
    }

    /// The full report: listing, banner, then failures or `All Tests Passed`.
    #[must_use]
    pub fn report(&self) -> String {
        let mut output = self.all_description();
        output.push('\n');
        output.push_str(BANNER);
        output.push('\n');
        match self.fail_description() {
            Some(failures) => output.push_str(&failures),
            None => output.push_str(ALL_PASSED),
        }
        output.push('\n');
        output
    }
}

impl fmt::Display for ResultTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.report())
    }
}

fn count(level: &BTreeMap<String, ResultNode>, predicate: fn(&Outcome) -> bool) -> usize {
    level
        .values()
        .map(|node| match node {
            ResultNode::Suite(children) => count(children, predicate),
            ResultNode::Spec(outcome) => usize::from(predicate(outcome)),
        })
        .sum()
}

fn indent(output: &mut String, level: usize) {
    for _ in 0..level {
        output.push_str("  ");
    }
}

fn render_all(level_nodes: &BTreeMap<String, ResultNode>, level: usize, output: &mut String) {
    for (name, node) in level_nodes {
        indent(output, level);
        output.push_str(name);
        output.push('\n');
        match node {
            ResultNode::Suite(children) => render_all(children, level + 1, output),
            ResultNode::Spec(outcome) => {
                indent(output, level + 1);
                output.push_str(&outcome.line());
                output.push('\n');
            }
        }
    }
}

fn render_failures(level_nodes: &BTreeMap<String, ResultNode>, level: usize) -> Option<String> {
    let mut output = String::new();
    for (name, node) in level_nodes {
        let details = match node {
            ResultNode::Suite(children) => render_failures(children, level + 1),
            ResultNode::Spec(outcome) => render_failure(outcome, level + 1),
        };
        if let Some(details) = details {
            indent(&mut output, level);
            output.push_str(name);
            output.push('\n');
            output.push_str(&details);
        }
    }
    (!output.is_empty()).then_some(output)
}

fn render_failure(outcome: &Outcome, level: usize) -> Option<String> {
    let failure = outcome.failure()?;

    let mut output = String::new();
    indent(&mut output, level);
    output.push_str(&outcome.line());
    output.push('\n');
    if let Some(request) = &failure.request {
        output.push('\n');
        output.push_str(REQUEST_SEPARATOR);
        output.push('\n');
        output.push_str(&request.describe());
    }
    if let Some(response) = &failure.response {
        output.push('\n');
        output.push_str(RESPONSE_SEPARATOR);
        output.push('\n');
        output.push_str(&response.describe());
    }
    output.push('\n');
    output.push_str(FAILURE_TERMINATOR);
    output.push('\n');
    Some(output)
}
