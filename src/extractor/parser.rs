//! Source parsing and message extraction.
//!
//! Sources are parsed with tree-sitter's TSX grammar, which covers plain
//! JavaScript, TypeScript annotations and embedded JSX in one pass. Three
//! forms mark a translatable message:
//!
//! ```ignore
//! <Trans>Hello {name}</Trans>     // JSX element
//! t`You have ${count} items`      // tagged template
//! t('checkout.title')             // explicit-key call
//! ```
//!
//! Extraction is conservative: a `<Trans>` element containing nested markup
//! or a non-identifier expression produces no message at all rather than a
//! mangled one.

use tree_sitter::Node;

use crate::error::{VerbiError, VerbiResult};
use crate::extractor::key_generator;
use crate::extractor::{ExtractedMessage, MessageLocation};

/// Parses TSX sources and extracts translatable messages.
pub struct MessageParser {
    parser: tree_sitter::Parser,
}

impl MessageParser {
    pub fn new() -> VerbiResult<Self> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_typescript::LANGUAGE_TSX.into())
            .map_err(|e| VerbiError::config(format!("Failed to load TSX grammar: {e}")))?;
        Ok(MessageParser { parser })
    }

    /// Extract every message from one file's source text.
    ///
    /// `file` is the project-relative path; it determines the key namespace
    /// and is recorded in each message's location.
    pub fn parse_source(
        &mut self,
        source: &str,
        file: &str,
    ) -> VerbiResult<Vec<ExtractedMessage>> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| VerbiError::parse(file, "parser produced no syntax tree"))?;

        let mut messages = Vec::new();
        visit(tree.root_node(), source, file, &mut messages);
        Ok(messages)
    }
}

fn visit(node: Node, source: &str, file: &str, messages: &mut Vec<ExtractedMessage>) {
    match node.kind() {
        "jsx_element" => {
            if let Some(message) = extract_trans_element(node, source, file) {
                messages.push(message);
            }
        }
        "call_expression" => {
            if let Some(message) = extract_t_call(node, source, file) {
                messages.push(message);
            }
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        visit(child, source, file, messages);
    }
}

/// `<Trans>...</Trans>`: text runs are trimmed and joined with single
/// spaces, `{identifier}` expressions become placeholders. Nested elements
/// or any other expression abort the extraction.
fn extract_trans_element(node: Node, source: &str, file: &str) -> Option<ExtractedMessage> {
    let opening = node.child_by_field_name("open_tag")?;
    let name = opening.child_by_field_name("name")?;
    if node_text(name, source) != "Trans" {
        return None;
    }

    let mut parts: Vec<String> = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "jsx_opening_element" | "jsx_closing_element" => {}
            "jsx_text" | "html_character_reference" => {
                let text = node_text(child, source).trim().to_string();
                if !text.is_empty() {
                    parts.push(text);
                }
            }
            "jsx_expression" => match jsx_expression_placeholder(child, source) {
                JsxExpression::Identifier(name) => parts.push(format!("{{{name}}}")),
                JsxExpression::Empty => {}
                JsxExpression::Unsupported => return None,
            },
            // Nested markup or anything else we cannot flatten faithfully
            _ => return None,
        }
    }

    if parts.is_empty() {
        return None;
    }

    let text = parts.join(" ");
    Some(derived_message(text, node, file))
}

enum JsxExpression {
    Identifier(String),
    Empty,
    Unsupported,
}

fn jsx_expression_placeholder(node: Node, source: &str) -> JsxExpression {
    let mut cursor = node.walk();
    let inner: Vec<Node> = node
        .named_children(&mut cursor)
        .filter(|n| n.kind() != "comment")
        .collect();

    match inner.as_slice() {
        [] => JsxExpression::Empty,
        [expr] if expr.kind() == "identifier" => {
            JsxExpression::Identifier(node_text(*expr, source).to_string())
        }
        _ => JsxExpression::Unsupported,
    }
}

/// `t(...)` in both of its shapes: a tagged template ``t`...` `` or a call
/// with a string-literal key `t('...')`.
fn extract_t_call(node: Node, source: &str, file: &str) -> Option<ExtractedMessage> {
    let function = node.child_by_field_name("function")?;
    if function.kind() != "identifier" || node_text(function, source) != "t" {
        return None;
    }

    let arguments = node.child_by_field_name("arguments")?;
    match arguments.kind() {
        "template_string" => {
            let text = cook_template(arguments, source);
            if text.is_empty() {
                return None;
            }
            Some(derived_message(text, node, file))
        }
        "arguments" => {
            let first = arguments.named_child(0)?;
            if first.kind() != "string" {
                return None;
            }
            let key = cook_string_literal(first, source);
            if key.is_empty() {
                return None;
            }
            Some(ExtractedMessage {
                text: key.clone(),
                key,
                location: location_of(node, file),
                explicit_key: true,
            })
        }
        _ => None,
    }
}

/// Build a message whose key is derived from its text and the file path.
fn derived_message(text: String, node: Node, file: &str) -> ExtractedMessage {
    let namespace = key_generator::resolve_namespace(None, Some(file));
    let key = key_generator::stable_key(&text, &namespace);
    ExtractedMessage {
        key,
        text,
        location: location_of(node, file),
        explicit_key: false,
    }
}

fn location_of(node: Node, file: &str) -> MessageLocation {
    let start = node.start_position();
    MessageLocation {
        file: file.to_string(),
        line: start.row + 1,
        column: start.column,
    }
}

fn node_text<'a>(node: Node, source: &'a str) -> &'a str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

/// Flatten a template string: literal runs stay verbatim (escapes cooked),
/// `${identifier}` becomes `{identifier}`, any other substitution becomes a
/// positional `{0}`, `{1}`, ... placeholder.
fn cook_template(node: Node, source: &str) -> String {
    let mut text = String::new();
    let mut position = node.start_byte() + 1; // skip the opening backtick
    let mut substitution_index = 0usize;

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "template_substitution" => {
                text.push_str(&source[position..child.start_byte()]);
                match child.named_child(0) {
                    Some(expr) if expr.kind() == "identifier" => {
                        text.push_str(&format!("{{{}}}", node_text(expr, source)));
                    }
                    _ => {
                        text.push_str(&format!("{{{substitution_index}}}"));
                    }
                }
                substitution_index += 1;
                position = child.end_byte();
            }
            "escape_sequence" => {
                text.push_str(&source[position..child.start_byte()]);
                text.push_str(&cook_escape(node_text(child, source)));
                position = child.end_byte();
            }
            _ => {}
        }
    }

    // Tail run up to (not including) the closing backtick
    let end = node.end_byte().saturating_sub(1);
    if position < end {
        text.push_str(&source[position..end]);
    }
    text
}

/// Cook a string literal node into its runtime value.
fn cook_string_literal(node: Node, source: &str) -> String {
    let mut text = String::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "string_fragment" => text.push_str(node_text(child, source)),
            "escape_sequence" => text.push_str(&cook_escape(node_text(child, source))),
            _ => {}
        }
    }
    text
}

/// Decode a single JavaScript escape sequence (`\n`, `é`, `\u{1f30d}`,
/// `\xe9`, ...). Unknown escapes decode to the escaped character itself.
fn cook_escape(raw: &str) -> String {
    let mut chars = raw.chars();
    if chars.next() != Some('\\') {
        return raw.to_string();
    }
    match chars.next() {
        Some('n') => "\n".to_string(),
        Some('t') => "\t".to_string(),
        Some('r') => "\r".to_string(),
        Some('b') => "\u{0008}".to_string(),
        Some('f') => "\u{000C}".to_string(),
        Some('v') => "\u{000B}".to_string(),
        Some('0') => "\0".to_string(),
        Some('u') | Some('x') => {
            let rest = chars.as_str();
            let hex = rest
                .strip_prefix('{')
                .and_then(|r| r.strip_suffix('}'))
                .unwrap_or(rest);
            u32::from_str_radix(hex, 16)
                .ok()
                .and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_else(|| raw.to_string())
        }
        Some(other) => other.to_string(),
        None => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Vec<ExtractedMessage> {
        let mut parser = MessageParser::new().unwrap();
        parser.parse_source(source, "src/App.tsx").unwrap()
    }

    // ========== Trans Element Tests ==========

    #[test]
    fn test_trans_plain_text() {
        let messages = parse("const x = <Trans>Hello world</Trans>;");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, "Hello world");
        assert!(!messages[0].explicit_key);
        assert!(messages[0].key.starts_with("src.App."));
    }

    #[test]
    fn test_trans_identifier_placeholder() {
        let messages = parse("const x = <Trans>Hello {name}!</Trans>;");
        assert_eq!(messages.len(), 1);
        // Text runs are trimmed before joining, so punctuation after an
        // expression gets a space in front of it.
        assert_eq!(messages[0].text, "Hello {name} !");
    }

    #[test]
    fn test_trans_collapses_surrounding_whitespace() {
        let messages = parse("const x = <Trans>\n    Welcome back,\n    {user}\n</Trans>;");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, "Welcome back, {user}");
    }

    #[test]
    fn test_trans_nested_element_aborts() {
        let messages = parse("const x = <Trans>Hello <b>world</b></Trans>;");
        assert!(messages.is_empty());
    }

    #[test]
    fn test_trans_complex_expression_aborts() {
        let messages = parse("const x = <Trans>Total: {count + 1}</Trans>;");
        assert!(messages.is_empty());
    }

    #[test]
    fn test_trans_member_expression_aborts() {
        let messages = parse("const x = <Trans>Hi {user.name}</Trans>;");
        assert!(messages.is_empty());
    }

    #[test]
    fn test_trans_empty_produces_nothing() {
        let messages = parse("const x = <Trans></Trans>;");
        assert!(messages.is_empty());
    }

    #[test]
    fn test_trans_comment_only_expression_is_skipped() {
        let messages = parse("const x = <Trans>Hello {/* note */} world</Trans>;");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, "Hello world");
    }

    #[test]
    fn test_other_elements_are_ignored() {
        let messages = parse("const x = <div>Hello world</div>;");
        assert!(messages.is_empty());
    }

    // ========== Tagged Template Tests ==========

    #[test]
    fn test_tagged_template_plain() {
        let messages = parse("const s = t`Save your changes`;");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, "Save your changes");
        assert!(!messages[0].explicit_key);
    }

    #[test]
    fn test_tagged_template_identifier_substitution() {
        let messages = parse("const s = t`Hello ${name}!`;");
        assert_eq!(messages.len(), 1);
        // Template quasis concatenate verbatim, unlike JSX text runs
        assert_eq!(messages[0].text, "Hello {name}!");
    }

    #[test]
    fn test_tagged_template_positional_substitution() {
        let messages = parse("const s = t`Sum: ${a + b} of ${total}`;");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, "Sum: {0} of {total}");
    }

    #[test]
    fn test_tagged_template_escape_sequences() {
        let messages = parse(r"const s = t`Line\nbreak`;");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, "Line\nbreak");
    }

    #[test]
    fn test_other_tags_are_ignored() {
        let messages = parse("const s = sql`SELECT 1`;");
        assert!(messages.is_empty());
    }

    // ========== t() Call Tests ==========

    #[test]
    fn test_call_with_string_literal() {
        let messages = parse("const s = t('checkout.title');");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].key, "checkout.title");
        assert_eq!(messages[0].text, "checkout.title");
        assert!(messages[0].explicit_key);
    }

    #[test]
    fn test_call_with_double_quotes_and_escape() {
        let messages = parse(r#"const s = t("Itém");"#);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, "Itém");
    }

    #[test]
    fn test_call_with_non_literal_is_ignored() {
        let messages = parse("const s = t(someVariable);");
        assert!(messages.is_empty());
    }

    #[test]
    fn test_other_functions_are_ignored() {
        let messages = parse("const s = translate('nope');");
        assert!(messages.is_empty());
    }

    // ========== Location Tests ==========

    #[test]
    fn test_location_is_one_based_line_zero_based_column() {
        let messages = parse("\nconst s = t('checkout.title');");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].location.file, "src/App.tsx");
        assert_eq!(messages[0].location.line, 2);
        assert_eq!(messages[0].location.column, 10);
    }

    #[test]
    fn test_multiple_messages_in_document_order() {
        let source = r#"
            export function Page() {
                const title = t('page.title');
                return <Trans>Welcome back</Trans>;
            }
        "#;
        let messages = parse(source);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].key, "page.title");
        assert_eq!(messages[1].text, "Welcome back");
    }

    #[test]
    fn test_typescript_annotations_are_tolerated() {
        let source = "function greet(name: string): string { return t`Hi ${name}`; }";
        let messages = parse(source);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, "Hi {name}");
    }
}
