//! Mapping from grammar node kinds to the shared [`NodeType`] taxonomy.
//!
//! Lookup order: the language's own table for irregular kinds, then naming
//! conventions shared by tree-sitter grammars (`*_declaration`,
//! `*_statement`, `*_literal`, ...). Kinds matching neither keep their
//! grammar name as [`NodeType::Other`].

use super::Language;
use crate::tree::NodeType;

/// Shared category for a grammar kind.
pub(crate) fn classify(language: Language, kind: &str) -> NodeType {
    let specific = match language {
        Language::Java => java(kind),
        Language::Kotlin => kotlin(kind),
        Language::Rust => rust(kind),
        Language::Go => go(kind),
        Language::Cpp => cpp(kind),
        Language::Python => python(kind),
        Language::Unknown => None,
    };
    specific
        .or_else(|| by_convention(kind))
        .unwrap_or_else(|| NodeType::Other(kind.into()))
}

fn java(kind: &str) -> Option<NodeType> {
    Some(match kind {
        "program" => NodeType::Unit,
        "constructor_declaration" | "compact_constructor_declaration" => NodeType::FunctionDecl,
        "local_variable_declaration" | "field_declaration" | "constant_declaration" => {
            NodeType::VariableDecl
        }
        "method_invocation" | "object_creation_expression" | "explicit_constructor_invocation" => {
            NodeType::Call
        }
        "class_body" | "interface_body" | "enum_body" | "constructor_body" | "annotation_type_body" => {
            NodeType::Block
        }
        "switch_block_statement_group" | "switch_rule" | "switch_label" => NodeType::CaseClause,
        "switch_expression" => NodeType::SwitchStmt,
        "enhanced_for_statement" => NodeType::LoopStmt,
        "ternary_expression" => NodeType::IfStmt,
        "array_access" => NodeType::IndexExpr,
        "modifiers" | "marker_annotation" | "annotation" => NodeType::Modifier,
        "this" | "super" => NodeType::Identifier,
        "true" | "false" | "null_literal" => NodeType::Literal,
        _ => return None,
    })
}

fn kotlin(kind: &str) -> Option<NodeType> {
    Some(match kind {
        "source_file" => NodeType::Unit,
        "property_declaration" => NodeType::VariableDecl,
        "class_body" | "function_body" | "control_structure_body" | "statements" | "enum_class_body" => {
            NodeType::Block
        }
        "when_expression" => NodeType::SwitchStmt,
        "when_entry" => NodeType::CaseClause,
        "navigation_expression" => NodeType::FieldAccess,
        "value_arguments" => NodeType::Arguments,
        "function_value_parameters" | "class_parameters" => NodeType::Parameters,
        "class_parameter" => NodeType::Parameter,
        "annotated_lambda" | "lambda_literal" | "anonymous_function" => NodeType::Lambda,
        "modifiers" | "annotation" => NodeType::Modifier,
        "import_header" | "import_list" => NodeType::Import,
        "package_header" => NodeType::Package,
        _ => return None,
    })
}

fn rust(kind: &str) -> Option<NodeType> {
    Some(match kind {
        "source_file" => NodeType::Unit,
        "function_item" | "function_signature_item" => NodeType::FunctionDecl,
        "let_declaration" | "const_item" | "static_item" => NodeType::VariableDecl,
        "struct_item" | "enum_item" | "union_item" | "trait_item" | "impl_item" | "type_item" => {
            NodeType::TypeDecl
        }
        "use_declaration" | "extern_crate_declaration" => NodeType::Import,
        "mod_item" => NodeType::Package,
        "declaration_list" | "field_declaration_list" | "enum_variant_list" => NodeType::Block,
        "match_expression" => NodeType::SwitchStmt,
        "match_arm" => NodeType::CaseClause,
        "macro_invocation" => NodeType::Call,
        "loop_expression" | "for_expression" | "while_expression" => NodeType::LoopStmt,
        "if_expression" | "if_let_expression" => NodeType::IfStmt,
        "return_expression" => NodeType::ReturnStmt,
        "break_expression" => NodeType::BreakStmt,
        "continue_expression" => NodeType::ContinueStmt,
        "try_expression" => NodeType::UnaryExpr,
        "attribute_item" | "inner_attribute_item" | "visibility_modifier" | "mutable_specifier" => {
            NodeType::Modifier
        }
        "self" | "crate" | "super" => NodeType::Identifier,
        _ => return None,
    })
}

fn go(kind: &str) -> Option<NodeType> {
    Some(match kind {
        "source_file" => NodeType::Unit,
        "type_declaration" | "type_spec" => NodeType::TypeDecl,
        "short_var_declaration" | "var_declaration" | "const_declaration" | "var_spec"
        | "const_spec" => NodeType::VariableDecl,
        "package_clause" => NodeType::Package,
        "expression_switch_statement" | "type_switch_statement" | "select_statement" => {
            NodeType::SwitchStmt
        }
        "expression_case" | "type_case" | "default_case" | "communication_case" => {
            NodeType::CaseClause
        }
        "parameter_declaration" | "variadic_parameter_declaration" => NodeType::Parameter,
        "func_literal" => NodeType::Lambda,
        "inc_statement" | "dec_statement" => NodeType::UnaryExpr,
        "nil" | "true" | "false" | "iota" => NodeType::Literal,
        _ => return None,
    })
}

fn cpp(kind: &str) -> Option<NodeType> {
    Some(match kind {
        "translation_unit" => NodeType::Unit,
        "function_definition" => NodeType::FunctionDecl,
        "class_specifier" | "struct_specifier" | "enum_specifier" | "union_specifier" => {
            NodeType::TypeDecl
        }
        "preproc_include" | "using_declaration" => NodeType::Import,
        "namespace_definition" => NodeType::Package,
        "declaration" | "init_declarator" => NodeType::VariableDecl,
        "compound_statement" | "field_declaration_list" | "declaration_list"
        | "enumerator_list" => NodeType::Block,
        "case_statement" => NodeType::CaseClause,
        "parameter_declaration" | "optional_parameter_declaration" => NodeType::Parameter,
        "primitive_type" | "sized_type_specifier" => NodeType::TypeRef,
        "storage_class_specifier" | "type_qualifier" | "access_specifier" => NodeType::Modifier,
        "this" | "true" | "false" | "null" | "nullptr" => NodeType::Literal,
        _ => return None,
    })
}

fn python(kind: &str) -> Option<NodeType> {
    Some(match kind {
        "module" => NodeType::Unit,
        "function_definition" => NodeType::FunctionDecl,
        "class_definition" => NodeType::TypeDecl,
        "import_statement" | "import_from_statement" | "future_import_statement" => {
            NodeType::Import
        }
        "assignment" | "augmented_assignment" => NodeType::Assignment,
        "boolean_operator" | "comparison_operator" => NodeType::BinaryExpr,
        "not_operator" => NodeType::UnaryExpr,
        "conditional_expression" => NodeType::IfStmt,
        "match_statement" => NodeType::SwitchStmt,
        "raise_statement" => NodeType::ThrowStmt,
        "except_clause" => NodeType::CatchClause,
        "call" => NodeType::Call,
        "attribute" => NodeType::FieldAccess,
        "subscript" => NodeType::IndexExpr,
        "lambda" => NodeType::Lambda,
        "decorator" => NodeType::Modifier,
        "string" | "integer" | "float" | "true" | "false" | "none" => NodeType::Literal,
        _ => return None,
    })
}

/// Naming conventions shared by most tree-sitter grammars.
fn by_convention(kind: &str) -> Option<NodeType> {
    let has = |part: &str| kind.contains(part);
    let starts = |prefix: &str| kind.starts_with(prefix);

    let node_type = if kind == "ERROR" {
        NodeType::Error
    } else if matches!(
        kind,
        "program" | "source_file" | "module" | "translation_unit" | "compilation_unit"
    ) {
        NodeType::Unit
    } else if kind == "type_identifier" || kind.ends_with("_type") || kind == "type_arguments" {
        NodeType::TypeRef
    } else if kind.ends_with("identifier") {
        NodeType::Identifier
    } else if kind.ends_with("literal") || has("string") || has("number") || has("char") {
        NodeType::Literal
    } else if has("import") || has("include") {
        NodeType::Import
    } else if has("package") || has("namespace") {
        NodeType::Package
    } else if has("call") || has("invocation") {
        NodeType::Call
    } else if has("lambda") || has("closure") {
        NodeType::Lambda
    } else if has("argument") {
        NodeType::Arguments
    } else if kind.ends_with("parameters") || kind.ends_with("parameter_list") {
        NodeType::Parameters
    } else if kind.ends_with("parameter") {
        NodeType::Parameter
    } else if has("function") || has("method") || has("constructor") {
        NodeType::FunctionDecl
    } else if ["class", "struct", "enum", "interface", "trait", "object", "record"]
        .iter()
        .any(|part| has(part))
    {
        NodeType::TypeDecl
    } else if has("variable") || has("property") || has("field_declaration") {
        NodeType::VariableDecl
    } else if has("field") || has("member") || has("selector") {
        NodeType::FieldAccess
    } else if has("assignment") {
        NodeType::Assignment
    } else if has("case") || has("arm") {
        NodeType::CaseClause
    } else if starts("switch") || starts("match") || starts("when") {
        NodeType::SwitchStmt
    } else if starts("if_") || starts("else") {
        NodeType::IfStmt
    } else if starts("for_") || starts("while_") || starts("do_") || starts("loop") {
        NodeType::LoopStmt
    } else if starts("return") {
        NodeType::ReturnStmt
    } else if starts("break") {
        NodeType::BreakStmt
    } else if starts("continue") {
        NodeType::ContinueStmt
    } else if starts("throw") || starts("raise") {
        NodeType::ThrowStmt
    } else if starts("try") {
        NodeType::TryStmt
    } else if has("catch") || has("except") || has("finally") {
        NodeType::CatchClause
    } else if kind == "expression_statement" {
        NodeType::ExpressionStmt
    } else if has("binary") {
        NodeType::BinaryExpr
    } else if has("unary") || has("prefix") || has("postfix") || has("update_expression") {
        NodeType::UnaryExpr
    } else if has("subscript") || has("index") {
        NodeType::IndexExpr
    } else if kind == "block" || kind.ends_with("_block") || kind.ends_with("body") {
        NodeType::Block
    } else if has("modifier") || has("annotation") || has("decorator") || has("attribute") {
        NodeType::Modifier
    } else {
        return None;
    };
    Some(node_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_java_kinds() {
        let cases = [
            ("program", NodeType::Unit),
            ("class_declaration", NodeType::TypeDecl),
            ("method_declaration", NodeType::FunctionDecl),
            ("formal_parameters", NodeType::Parameters),
            ("formal_parameter", NodeType::Parameter),
            ("local_variable_declaration", NodeType::VariableDecl),
            ("method_invocation", NodeType::Call),
            ("argument_list", NodeType::Arguments),
            ("binary_expression", NodeType::BinaryExpr),
            ("decimal_integer_literal", NodeType::Literal),
            ("identifier", NodeType::Identifier),
            ("type_identifier", NodeType::TypeRef),
            ("if_statement", NodeType::IfStmt),
            ("enhanced_for_statement", NodeType::LoopStmt),
            ("return_statement", NodeType::ReturnStmt),
            ("try_statement", NodeType::TryStmt),
            ("catch_clause", NodeType::CatchClause),
            ("block", NodeType::Block),
            ("field_access", NodeType::FieldAccess),
        ];
        for (kind, expected) in cases {
            assert_eq!(classify(Language::Java, kind), expected, "{kind}");
        }
    }

    #[test]
    fn test_rust_and_go_kinds() {
        assert_eq!(classify(Language::Rust, "function_item"), NodeType::FunctionDecl);
        assert_eq!(classify(Language::Rust, "struct_item"), NodeType::TypeDecl);
        assert_eq!(classify(Language::Rust, "let_declaration"), NodeType::VariableDecl);
        assert_eq!(classify(Language::Rust, "match_arm"), NodeType::CaseClause);
        assert_eq!(classify(Language::Rust, "field_expression"), NodeType::FieldAccess);
        assert_eq!(classify(Language::Go, "function_declaration"), NodeType::FunctionDecl);
        assert_eq!(classify(Language::Go, "short_var_declaration"), NodeType::VariableDecl);
        assert_eq!(classify(Language::Go, "for_statement"), NodeType::LoopStmt);
    }

    #[test]
    fn test_unmapped_kind_keeps_grammar_name() {
        assert_eq!(
            classify(Language::Java, "wildcard"),
            NodeType::Other("wildcard".into())
        );
        assert_eq!(classify(Language::Unknown, "ERROR"), NodeType::Error);
    }
}
