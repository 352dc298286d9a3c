//! Tree-sitter backed language adapter.
//!
//! Canonicalisation rules applied while walking the concrete syntax tree:
//!
//! - anonymous nodes (keywords, punctuation) and comments are dropped;
//! - a named node without kept children is a leaf labelled with its source text;
//! - operator tokens among a node's anonymous children are folded into that
//!   node's label, e.g. `BinaryExpr "+"`;
//! - grammar kinds are mapped into the shared taxonomy, unmapped kinds keep
//!   their grammar name;
//! - `MISSING` nodes inserted by error recovery are dropped and `ERROR`
//!   regions become [`NodeType::Error`] nodes.

use super::taxonomy::classify;
use super::{AdapterError, BuildOutcome, BuildQuality, Language, LanguageAdapter};
use crate::tree::{GenericTree, NodeId, NodeType, Position, TreeBuilder};
use compact_str::CompactString;
use tree_sitter::{Node, Parser, Tree};

/// Tokens that never carry meaning on their own.
const PUNCTUATION: &[&str] = &["(", ")", "{", "}", "[", "]", ";", ",", ".", ":", "::"];

/// Adapter for one tree-sitter grammar.
pub struct TreeSitterAdapter {
    language: Language,
    grammar: tree_sitter::Language,
}

impl std::fmt::Debug for TreeSitterAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeSitterAdapter")
            .field("language", &self.language)
            .finish_non_exhaustive()
    }
}

impl TreeSitterAdapter {
    /// Adapter for `language` using an explicit grammar.
    #[must_use]
    pub fn new(language: Language, grammar: tree_sitter::Language) -> Self {
        Self { language, grammar }
    }

    /// Adapter backed by the bundled grammar, `None` for [`Language::Unknown`].
    #[must_use]
    pub fn for_language(language: Language) -> Option<Self> {
        let grammar: tree_sitter::Language = match language {
            Language::Java => tree_sitter_java::LANGUAGE.into(),
            Language::Kotlin => tree_sitter_kotlin_ng::LANGUAGE.into(),
            Language::Rust => tree_sitter_rust::LANGUAGE.into(),
            Language::Go => tree_sitter_go::LANGUAGE.into(),
            Language::Cpp => tree_sitter_cpp::LANGUAGE.into(),
            Language::Python => tree_sitter_python::LANGUAGE.into(),
            Language::Unknown => return None,
        };
        Some(Self::new(language, grammar))
    }

    fn parse(&self, text: &str) -> Result<Tree, AdapterError> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.grammar)
            .map_err(|e| AdapterError::Grammar {
                language: self.language,
                message: e.to_string(),
            })?;
        parser
            .parse(text, None)
            .ok_or(AdapterError::NoTree(self.language))
    }

    /// Convert a parsed tree, iteratively to stay safe on deeply nested input.
    fn convert(&self, root: Node<'_>, text: &str) -> GenericTree {
        let (node_type, label) = self.describe(root, text, has_kept_children(root));
        let mut builder = TreeBuilder::new(node_type, label, Some(position(root)));

        let mut stack: Vec<(Node<'_>, NodeId)> = Vec::new();
        push_children(&mut stack, root, builder.root());

        while let Some((node, parent)) = stack.pop() {
            let (node_type, label) = self.describe(node, text, has_kept_children(node));
            let id = builder.push(parent, node_type, label, Some(position(node)));
            push_children(&mut stack, node, id);
        }
        builder.finish()
    }

    fn describe(&self, node: Node<'_>, text: &str, container: bool) -> (NodeType, CompactString) {
        let node_type = if node.is_error() {
            NodeType::Error
        } else {
            classify(self.language, node.kind())
        };

        let label = if container {
            operator_label(node)
        } else {
            text.get(node.byte_range())
                .map(|s| CompactString::from(s.trim()))
                .unwrap_or_default()
        };
        (node_type, label)
    }
}

impl LanguageAdapter for TreeSitterAdapter {
    fn language(&self) -> Language {
        self.language
    }

    fn build(&self, source: &[u8]) -> BuildOutcome {
        let text = String::from_utf8_lossy(source);
        match self.parse(&text) {
            Ok(parsed) => {
                let root = parsed.root_node();
                let quality = if root.has_error() {
                    tracing::debug!("grammar recovered from syntax errors");
                    BuildQuality::Recovered
                } else {
                    BuildQuality::Clean
                };
                BuildOutcome {
                    tree: self.convert(root, &text),
                    language: self.language,
                    quality,
                }
            }
            Err(err) => {
                tracing::error!(error = %err, "cannot parse file");
                BuildOutcome::unsupported(self.language)
            }
        }
    }
}

fn is_kept(node: Node<'_>) -> bool {
    node.is_named() && !node.is_missing() && !node.is_extra() && !node.kind().contains("comment")
}

fn has_kept_children(node: Node<'_>) -> bool {
    let mut cursor = node.walk();
    let kept = node.children(&mut cursor).any(is_kept);
    kept
}

/// Queue kept children so they are popped (and attached) in source order.
fn push_children<'t>(stack: &mut Vec<(Node<'t>, NodeId)>, node: Node<'t>, parent: NodeId) {
    let mut cursor = node.walk();
    let children: Vec<Node<'t>> = node.children(&mut cursor).filter(|c| is_kept(*c)).collect();
    stack.extend(children.into_iter().rev().map(|child| (child, parent)));
}

fn is_operator(token: &str) -> bool {
    !token.is_empty()
        && !PUNCTUATION.contains(&token)
        && token
            .chars()
            .all(|c| c.is_ascii_punctuation() && c != '_' && c != '"' && c != '\'')
}

/// Operator tokens among the anonymous children, space separated.
fn operator_label(node: Node<'_>) -> CompactString {
    let mut label = CompactString::default();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.is_named() || child.is_missing() {
            continue;
        }
        let token = child.kind();
        if is_operator(token) {
            if !label.is_empty() {
                label.push(' ');
            }
            label.push_str(token);
        }
    }
    label
}

fn position(node: Node<'_>) -> Position {
    let point = node.start_position();
    let line = u32::try_from(point.row.saturating_add(1)).unwrap_or(u32::MAX);
    let column = u32::try_from(point.column).unwrap_or(u32::MAX);
    Position::new(line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(language: Language, source: &str) -> BuildOutcome {
        TreeSitterAdapter::for_language(language)
            .unwrap()
            .build(source.as_bytes())
    }

    fn find(tree: &GenericTree, node_type: &NodeType) -> Vec<NodeId> {
        tree.pre_order()
            .filter(|&id| tree.node(id).node_type() == node_type)
            .collect()
    }

    #[test]
    fn test_java_method_is_canonicalised() {
        let outcome = build(
            Language::Java,
            "class Calc {\n  // adds\n  int add(int a, int b) { return a + b; }\n}\n",
        );
        assert_eq!(outcome.quality, BuildQuality::Clean);
        let tree = &outcome.tree;
        assert_eq!(*tree.node(tree.root()).node_type(), NodeType::Unit);

        assert_eq!(find(tree, &NodeType::TypeDecl).len(), 1);
        let methods = find(tree, &NodeType::FunctionDecl);
        assert_eq!(methods.len(), 1);
        assert_eq!(tree.node(methods[0]).position().map(|p| p.line), Some(3));

        let sums = find(tree, &NodeType::BinaryExpr);
        assert_eq!(sums.len(), 1);
        assert_eq!(tree.node(sums[0]).label(), "+");

        let names: Vec<_> = find(tree, &NodeType::Identifier)
            .into_iter()
            .map(|id| tree.node(id).label().to_owned())
            .collect();
        assert!(names.contains(&"add".to_owned()));
        assert!(names.contains(&"a".to_owned()));
        assert!(!tree.pre_order().any(|id| tree.node(id).label().contains("adds")));
    }

    #[test]
    fn test_rust_function_is_canonicalised() {
        let outcome = build(Language::Rust, "fn main() { let x = 1 + 2; println!(\"{}\", x); }");
        assert_eq!(outcome.quality, BuildQuality::Clean);
        let tree = &outcome.tree;
        assert_eq!(find(tree, &NodeType::FunctionDecl).len(), 1);
        assert_eq!(find(tree, &NodeType::VariableDecl).len(), 1);
        assert!(!find(tree, &NodeType::Literal).is_empty());
    }

    #[test]
    fn test_syntax_errors_give_partial_tree() {
        let outcome = build(Language::Java, "class Broken { void f( { }");
        assert_eq!(outcome.quality, BuildQuality::Recovered);
        assert!(outcome.tree.size() > 1);
    }

    #[test]
    fn test_building_twice_gives_equal_trees() {
        let source = "package main\n\nfunc main() {\n\tfor i := 0; i < 3; i++ {\n\t\tprintln(i)\n\t}\n}\n";
        let first = build(Language::Go, source);
        let second = build(Language::Go, source);
        assert_eq!(first.tree, second.tree);
    }

    #[test]
    fn test_invalid_utf8_is_decoded_lossily() {
        let mut source = b"x = 1\ny = ".to_vec();
        source.extend_from_slice(&[0xff, 0xfe]);
        let outcome = TreeSitterAdapter::for_language(Language::Python)
            .unwrap()
            .build(&source);
        assert!(outcome.tree.size() > 1);
    }

    #[test]
    fn test_operator_detection() {
        assert!(is_operator("+"));
        assert!(is_operator("&&"));
        assert!(is_operator("+="));
        assert!(!is_operator("("));
        assert!(!is_operator("::"));
        assert!(!is_operator("return"));
        assert!(!is_operator("\""));
    }
}
