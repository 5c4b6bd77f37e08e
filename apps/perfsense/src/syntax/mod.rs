//! Typed syntax tree used by the pattern matcher.
//!
//! Source text is parsed with tree-sitter (see `lower`) and lowered into a
//! closed set of node variants. Only the shapes the rules look at get their
//! own variant; everything else is `Other` and keeps its children so the walk
//! still reaches every call underneath.

mod lower;

pub use lower::parse;

use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Grammar used to parse a source file.
pub enum SourceLanguage {
    TypeScript,
    Tsx,
    JavaScript,
}

impl SourceLanguage {
    /// Pick a grammar from a file extension. Unknown extensions get TSX,
    /// which accepts both type annotations and JSX.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "ts" | "mts" | "cts" => SourceLanguage::TypeScript,
            "js" | "jsx" | "mjs" | "cjs" => SourceLanguage::JavaScript,
            _ => SourceLanguage::Tsx,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SourceLanguage::TypeScript => "typescript",
            SourceLanguage::Tsx => "tsx",
            SourceLanguage::JavaScript => "javascript",
        }
    }

    pub(crate) fn grammar(&self) -> tree_sitter::Language {
        match self {
            SourceLanguage::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            SourceLanguage::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            SourceLanguage::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// 1-based line, 0-based column.
pub struct Location {
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxNode {
    pub loc: Location,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Call {
        callee: Box<SyntaxNode>,
        arguments: Vec<SyntaxNode>,
    },
    /// Non-computed property access (`object.property`, `object?.property`).
    Member {
        object: Box<SyntaxNode>,
        property: String,
    },
    Await {
        argument: Box<SyntaxNode>,
    },
    Identifier(String),
    Other {
        kind: String,
        children: Vec<SyntaxNode>,
    },
}

impl SyntaxNode {
    /// Direct children in source order.
    pub fn children(&self) -> Vec<&SyntaxNode> {
        match &self.kind {
            NodeKind::Call { callee, arguments } => {
                let mut out = Vec::with_capacity(arguments.len() + 1);
                out.push(callee.as_ref());
                out.extend(arguments.iter());
                out
            }
            NodeKind::Member { object, .. } => vec![object.as_ref()],
            NodeKind::Await { argument } => vec![argument.as_ref()],
            NodeKind::Identifier(_) => Vec::new(),
            NodeKind::Other { children, .. } => children.iter().collect(),
        }
    }

    pub fn identifier(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Identifier(name) => Some(name),
            _ => None,
        }
    }

    /// `(object, property)` when this node is a member access.
    pub fn as_member(&self) -> Option<(&SyntaxNode, &str)> {
        match &self.kind {
            NodeKind::Member { object, property } => Some((object.as_ref(), property.as_str())),
            _ => None,
        }
    }

    /// `(callee, arguments)` when this node is a call.
    pub fn as_call(&self) -> Option<(&SyntaxNode, &[SyntaxNode])> {
        match &self.kind {
            NodeKind::Call { callee, arguments } => Some((callee.as_ref(), arguments.as_slice())),
            _ => None,
        }
    }

    pub fn is_await(&self) -> bool {
        matches!(self.kind, NodeKind::Await { .. })
    }
}

/// A parsed file.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    pub language: SourceLanguage,
    pub root: SyntaxNode,
}

/// A node together with its chain of ancestors, root first.
pub struct NodePath<'p, 'a> {
    pub node: &'a SyntaxNode,
    pub ancestors: &'p [&'a SyntaxNode],
}

impl<'p, 'a> NodePath<'p, 'a> {
    pub fn parent(&self) -> Option<&'a SyntaxNode> {
        self.ancestors.last().copied()
    }

    /// Walk upward, nearest ancestor first, looking for a match.
    pub fn has_ancestor(&self, pred: impl Fn(&SyntaxNode) -> bool) -> bool {
        self.ancestors.iter().rev().any(|&n| pred(n))
    }
}

/// Per-variant callbacks. `walk` dispatches each node to exactly one of these.
pub trait Visitor<'a> {
    fn visit_call(&mut self, _path: &NodePath<'_, 'a>) {}
    fn visit_member(&mut self, _path: &NodePath<'_, 'a>) {}
    fn visit_await(&mut self, _path: &NodePath<'_, 'a>) {}
    fn visit_identifier(&mut self, _path: &NodePath<'_, 'a>) {}
    fn visit_other(&mut self, _path: &NodePath<'_, 'a>) {}
}

/// Pre-order walk visiting every node exactly once.
pub fn walk<'a, V: Visitor<'a>>(root: &'a SyntaxNode, visitor: &mut V) {
    let mut ancestors: Vec<&'a SyntaxNode> = Vec::new();
    walk_node(root, &mut ancestors, visitor);
}

fn walk_node<'a, V: Visitor<'a>>(
    node: &'a SyntaxNode,
    ancestors: &mut Vec<&'a SyntaxNode>,
    visitor: &mut V,
) {
    {
        let path = NodePath {
            node,
            ancestors: ancestors.as_slice(),
        };
        match &node.kind {
            NodeKind::Call { .. } => visitor.visit_call(&path),
            NodeKind::Member { .. } => visitor.visit_member(&path),
            NodeKind::Await { .. } => visitor.visit_await(&path),
            NodeKind::Identifier(_) => visitor.visit_identifier(&path),
            NodeKind::Other { .. } => visitor.visit_other(&path),
        }
    }
    ancestors.push(node);
    for child in node.children() {
        walk_node(child, ancestors, visitor);
    }
    ancestors.pop();
}
