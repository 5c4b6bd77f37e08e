//! tree-sitter parsing and lowering into `SyntaxNode`.

use super::{Location, NodeKind, SourceLanguage, SyntaxNode, SyntaxTree};
use crate::error::AnalysisError;
use tree_sitter::{Node, Parser};

/// Deepest syntax nesting that gets lowered. Lowering and the matcher walk
/// both recurse per level, so anything deeper is rejected up front.
pub const MAX_DEPTH: usize = 512;

/// Parse `source` with the grammar for `language`.
///
/// Any ERROR or MISSING node in the tree is reported as a syntax error at the
/// first offending location; partial trees are never matched against.
pub fn parse(source: &str, language: SourceLanguage) -> Result<SyntaxTree, AnalysisError> {
    let mut parser = Parser::new();
    parser
        .set_language(&language.grammar())
        .map_err(|e| AnalysisError::Grammar {
            language: language.name(),
            message: e.to_string(),
        })?;
    let tree = parser.parse(source, None).ok_or(AnalysisError::NoTree)?;
    let root = tree.root_node();
    if root.has_error() {
        let loc = first_error(root).map(location).unwrap_or_default();
        return Err(AnalysisError::Syntax {
            line: loc.line,
            column: loc.column,
        });
    }
    Ok(SyntaxTree {
        language,
        root: lower(root, source.as_bytes(), 0)?,
    })
}

fn location(node: Node) -> Location {
    let pos = node.start_position();
    Location {
        line: u32::try_from(pos.row).unwrap_or(u32::MAX).saturating_add(1),
        column: u32::try_from(pos.column).unwrap_or(u32::MAX),
    }
}

/// Pre-order search for the first ERROR or MISSING node, descending only
/// into subtrees that contain one.
fn first_error(root: Node) -> Option<Node> {
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if node.has_error() && cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return None;
            }
        }
    }
}

fn text<'s>(node: Node, source: &'s [u8]) -> &'s str {
    node.utf8_text(source).unwrap_or("")
}

/// First named child that is not a comment or other extra.
fn first_operand(node: Node) -> Option<Node> {
    let mut cursor = node.walk();
    let found = node.named_children(&mut cursor).find(|c| !c.is_extra());
    found
}

fn lower(node: Node, source: &[u8], depth: usize) -> Result<SyntaxNode, AnalysisError> {
    let loc = location(node);
    if depth > MAX_DEPTH {
        return Err(AnalysisError::TooDeep {
            limit: MAX_DEPTH,
            line: loc.line,
        });
    }
    let next = depth + 1;
    let kind = match node.kind() {
        "call_expression" => lower_call(node, source, next)?,
        "member_expression" => lower_member(node, source, next)?,
        "await_expression" => match first_operand(node) {
            Some(arg) => Some(NodeKind::Await {
                argument: Box::new(lower(arg, source, next)?),
            }),
            None => None,
        },
        "identifier" => Some(NodeKind::Identifier(text(node, source).to_string())),
        _ => None,
    };
    let kind = match kind {
        Some(kind) => kind,
        None => lower_other(node, source, next)?,
    };
    Ok(SyntaxNode { loc, kind })
}

fn lower_call(node: Node, source: &[u8], depth: usize) -> Result<Option<NodeKind>, AnalysisError> {
    let Some(callee) = node.child_by_field_name("function") else {
        return Ok(None);
    };
    let arguments = match node.child_by_field_name("arguments") {
        Some(args) if args.kind() == "arguments" => {
            let mut cursor = args.walk();
            let mut lowered = Vec::with_capacity(args.named_child_count());
            for child in args.named_children(&mut cursor) {
                if !child.is_extra() {
                    lowered.push(lower(child, source, depth)?);
                }
            }
            lowered
        }
        // Tagged template: the template literal is the only argument.
        Some(other) => vec![lower(other, source, depth)?],
        None => Vec::new(),
    };
    Ok(Some(NodeKind::Call {
        callee: Box::new(lower(callee, source, depth)?),
        arguments,
    }))
}

fn lower_member(node: Node, source: &[u8], depth: usize) -> Result<Option<NodeKind>, AnalysisError> {
    let (Some(object), Some(property)) = (
        node.child_by_field_name("object"),
        node.child_by_field_name("property"),
    ) else {
        return Ok(None);
    };
    Ok(Some(NodeKind::Member {
        object: Box::new(lower(object, source, depth)?),
        property: text(property, source).to_string(),
    }))
}

fn lower_other(node: Node, source: &[u8], depth: usize) -> Result<NodeKind, AnalysisError> {
    let mut cursor = node.walk();
    let mut children = Vec::with_capacity(node.named_child_count());
    for child in node.named_children(&mut cursor) {
        if !child.is_extra() {
            children.push(lower(child, source, depth)?);
        }
    }
    Ok(NodeKind::Other {
        kind: node.kind().to_string(),
        children,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find_call<'a>(node: &'a SyntaxNode) -> Option<&'a SyntaxNode> {
        if node.as_call().is_some() {
            return Some(node);
        }
        node.children().into_iter().find_map(find_call)
    }

    #[test]
    fn test_lowers_member_call() {
        let tree = parse("users.map(u => u.id);", SourceLanguage::TypeScript).unwrap();
        let call = find_call(&tree.root).unwrap();
        let (callee, args) = call.as_call().unwrap();
        let (object, property) = callee.as_member().unwrap();
        assert_eq!(object.identifier(), Some("users"));
        assert_eq!(property, "map");
        assert_eq!(args.len(), 1);
        assert_eq!(call.loc, Location { line: 1, column: 0 });
    }

    #[test]
    fn test_lowers_await_argument() {
        let src = "async function f() {\n  await load(1);\n}\n";
        let tree = parse(src, SourceLanguage::JavaScript).unwrap();
        let call = find_call(&tree.root).unwrap();
        assert_eq!(call.loc, Location { line: 2, column: 8 });
        fn has_await(n: &SyntaxNode) -> bool {
            n.is_await() || n.children().into_iter().any(has_await)
        }
        assert!(has_await(&tree.root));
    }

    #[test]
    fn test_computed_member_is_not_member() {
        let tree = parse("xs['map'](f);", SourceLanguage::JavaScript).unwrap();
        let call = find_call(&tree.root).unwrap();
        let (callee, _) = call.as_call().unwrap();
        assert!(callee.as_member().is_none());
    }

    #[test]
    fn test_syntax_error_reports_location() {
        let err = parse("function (", SourceLanguage::Tsx).unwrap_err();
        assert!(matches!(err, AnalysisError::Syntax { line: 1, .. }));
    }

    fn count_calls(node: &SyntaxNode) -> usize {
        usize::from(node.as_call().is_some())
            + node.children().into_iter().map(count_calls).sum::<usize>()
    }

    #[test]
    fn test_comment_after_await_keeps_operand() {
        for src in [
            "async function f() { await /* batch */ load(ids); }",
            "async function f() {\n  await // batch\n    load(ids);\n}\n",
        ] {
            let tree = parse(src, SourceLanguage::TypeScript).unwrap();
            let call = find_call(&tree.root).unwrap();
            let (callee, args) = call.as_call().unwrap();
            assert_eq!(callee.identifier(), Some("load"));
            assert_eq!(args.len(), 1);
            fn await_operand_is_call(n: &SyntaxNode) -> bool {
                match &n.kind {
                    NodeKind::Await { argument } => argument.as_call().is_some(),
                    _ => n.children().into_iter().any(await_operand_is_call),
                }
            }
            assert!(await_operand_is_call(&tree.root), "{src}");
        }
    }

    #[test]
    fn test_comments_in_arguments_and_member_chains() {
        let src = "xs /*c*/ .map(/* each */ f, /* and */ g);\nys\n  // next\n  .filter(h);\n";
        let tree = parse(src, SourceLanguage::JavaScript).unwrap();
        let call = find_call(&tree.root).unwrap();
        let (callee, args) = call.as_call().unwrap();
        let (object, property) = callee.as_member().unwrap();
        assert_eq!(object.identifier(), Some("xs"));
        assert_eq!(property, "map");
        assert_eq!(args.len(), 2);
        assert_eq!(args[0].identifier(), Some("f"));
        assert_eq!(count_calls(&tree.root), 2);
    }

    #[test]
    fn test_calls_reached_under_every_variant() {
        // call in callee, argument, member object, await operand and plain statements
        let src = "async function f() {\n  a(b())().c(d()).e;\n  await g(h());\n  if (i()) { j(); }\n}\n";
        let tree = parse(src, SourceLanguage::TypeScript).unwrap();
        assert_eq!(count_calls(&tree.root), 9);
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let depth = 20_000;
        let src = format!("const a = {}{};", "[".repeat(depth), "]".repeat(depth));
        let err = parse(&src, SourceLanguage::JavaScript).unwrap_err();
        assert!(matches!(err, AnalysisError::TooDeep { limit: MAX_DEPTH, line: 1 }));
    }

    #[test]
    fn test_moderate_nesting_is_lowered() {
        let src = format!("const a = {}f(){};", "[".repeat(200), "]".repeat(200));
        let tree = parse(&src, SourceLanguage::JavaScript).unwrap();
        assert_eq!(count_calls(&tree.root), 1);
    }

    #[test]
    fn test_tsx_accepts_jsx_and_types() {
        let src = "const C = (p: { n: number }) => <div>{p.n}</div>;";
        assert!(parse(src, SourceLanguage::Tsx).is_ok());
    }
}
