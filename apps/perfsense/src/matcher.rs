//! N+1 pattern rules evaluated at every call node.
//!
//! Both rules are syntactic proxies for "one remote call per collection
//! element". Nothing is resolved: an aliased `Promise` or a renamed `map`
//! slips through, and any `.map` under an `await` is flagged even when it is
//! purely in-memory.

use crate::models::{Issue, Severity};
use crate::syntax::{walk, NodePath, SyntaxNode, SyntaxTree, Visitor};

pub const PROMISE_ALL_MAP: &str = "PROMISE_ALL_MAP";
pub const N_PLUS_ONE_QUERY: &str = "N_PLUS_ONE_QUERY";
pub const N_PLUS_ONE_TITLE: &str = "N+1 Query Pattern Detected";
pub const PROMISE_ALL_MAP_TITLE: &str = "Promise.all Over Mapped Requests";

/// Fixed impact score attached to await-guarded map findings.
pub const N_PLUS_ONE_IMPACT: u32 = 70;

/// Run every rule over `tree`, returning issues in discovery order.
pub fn find_issues(tree: &SyntaxTree, file: Option<&str>) -> Vec<Issue> {
    let mut rules = RuleVisitor {
        file,
        issues: Vec::new(),
    };
    walk(&tree.root, &mut rules);
    rules.issues
}

struct RuleVisitor<'f> {
    file: Option<&'f str>,
    issues: Vec<Issue>,
}

impl<'a> Visitor<'a> for RuleVisitor<'_> {
    fn visit_call(&mut self, path: &NodePath<'_, 'a>) {
        if is_promise_all_over_map(path.node) {
            self.issues.push(Issue {
                severity: Severity::Warning,
                code: PROMISE_ALL_MAP.into(),
                title: PROMISE_ALL_MAP_TITLE.into(),
                description: "Potential N+1 query pattern detected with Promise.all and map"
                    .into(),
                line: Some(path.node.loc.line),
                column: Some(path.node.loc.column),
                file: self.file.map(str::to_string),
                suggestion: Some(
                    "Consider using batch fetching instead of multiple parallel requests".into(),
                ),
                impact: None,
            });
        }
        if is_map_call(path.node) && path.has_ancestor(SyntaxNode::is_await) {
            self.issues.push(Issue {
                severity: Severity::Critical,
                code: N_PLUS_ONE_QUERY.into(),
                title: N_PLUS_ONE_TITLE.into(),
                description: "Multiple sequential database queries found inside a loop".into(),
                line: Some(path.node.loc.line),
                column: Some(path.node.loc.column),
                file: self.file.map(str::to_string),
                suggestion: Some("Use batch fetching to reduce database calls".into()),
                impact: Some(N_PLUS_ONE_IMPACT),
            });
        }
    }
}

/// `<anything>.map(...)`
fn is_map_call(node: &SyntaxNode) -> bool {
    node.as_call()
        .and_then(|(callee, _)| callee.as_member())
        .is_some_and(|(_, property)| property == "map")
}

/// `Promise.all(<anything>.map(...), ...)`
fn is_promise_all_over_map(node: &SyntaxNode) -> bool {
    let Some((callee, arguments)) = node.as_call() else {
        return false;
    };
    let Some((object, property)) = callee.as_member() else {
        return false;
    };
    object.identifier() == Some("Promise")
        && property == "all"
        && arguments.first().is_some_and(is_map_call)
}
