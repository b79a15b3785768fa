//! ICU MessageFormat subset parser and parity checks.
//!
//! Covers the grammar the UI runtime substitutes: literal text, `{name}`
//! arguments, `{arg, plural, ...}` / `{arg, select, ...}` with nested
//! messages inside branches, and `#` passing through as plain text.
//! Formatted arguments (`{n, number}`, `{d, date, short}`) parse as plain
//! arguments with the style skipped.

#[derive(Debug, Clone, PartialEq)]
pub enum IcuNode {
    Text(String),
    Argument(String),
    Plural {
        name: String,
        branches: Vec<(String, Vec<IcuNode>)>,
    },
    Select {
        name: String,
        branches: Vec<(String, Vec<IcuNode>)>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct IcuValidation {
    pub valid: bool,
    pub errors: Vec<String>,
    /// Referenced argument names, deduplicated in first-seen order.
    pub placeholders: Vec<String>,
}

/// Parse a message into its node list, or a syntax error.
pub fn parse_icu(message: &str) -> Result<Vec<IcuNode>, String> {
    let mut parser = IcuParser::new(message);
    parser.parse_message(false)
}

pub fn validate_icu(message: &str) -> IcuValidation {
    match parse_icu(message) {
        Ok(nodes) => IcuValidation {
            valid: true,
            errors: Vec::new(),
            placeholders: collect_placeholders(&nodes),
        },
        Err(error) => IcuValidation {
            valid: false,
            errors: vec![format!("Invalid ICU syntax: {error}")],
            placeholders: Vec::new(),
        },
    }
}

/// Check that source and translation parse and reference the same
/// placeholder set. Returns human-readable problems, empty when fine.
pub fn validate_icu_parity(source: &str, translation: &str) -> Vec<String> {
    let mut errors = Vec::new();

    let source_placeholders = match parse_icu(source) {
        Ok(nodes) => Some(collect_placeholders(&nodes)),
        Err(error) => {
            errors.push(format!("Source has invalid ICU syntax: {error}"));
            None
        }
    };
    let translation_placeholders = match parse_icu(translation) {
        Ok(nodes) => Some(collect_placeholders(&nodes)),
        Err(error) => {
            errors.push(format!("Translation has invalid ICU syntax: {error}"));
            None
        }
    };

    if let (Some(source_placeholders), Some(translation_placeholders)) =
        (source_placeholders, translation_placeholders)
    {
        let missing: Vec<_> = source_placeholders
            .iter()
            .filter(|name| !translation_placeholders.contains(name))
            .cloned()
            .collect();
        let extra: Vec<_> = translation_placeholders
            .iter()
            .filter(|name| !source_placeholders.contains(name))
            .cloned()
            .collect();
        if !missing.is_empty() {
            errors.push(format!("Missing: {}", missing.join(", ")));
        }
        if !extra.is_empty() {
            errors.push(format!("Extra: {}", extra.join(", ")));
        }
    }

    errors
}

pub fn collect_placeholders(nodes: &[IcuNode]) -> Vec<String> {
    let mut seen = Vec::new();
    collect_into(nodes, &mut seen);
    seen
}

fn collect_into(nodes: &[IcuNode], seen: &mut Vec<String>) {
    for node in nodes {
        match node {
            IcuNode::Text(_) => {}
            IcuNode::Argument(name) => push_unique(seen, name),
            IcuNode::Plural { name, branches } | IcuNode::Select { name, branches } => {
                push_unique(seen, name);
                for (_, branch) in branches {
                    collect_into(branch, seen);
                }
            }
        }
    }
}

fn push_unique(seen: &mut Vec<String>, name: &str) {
    if !seen.iter().any(|existing| existing == name) {
        seen.push(name.to_string());
    }
}

struct IcuParser {
    chars: Vec<char>,
    pos: usize,
}

impl IcuParser {
    fn new(message: &str) -> Self {
        IcuParser {
            chars: message.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), String> {
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(format!(
                "expected '{expected}' at position {}, found '{c}'",
                self.pos - 1
            )),
            None => Err(format!("expected '{expected}', found end of message")),
        }
    }

    /// Collect text up to (not including) one of `stops`; EOF is an error.
    fn take_until(&mut self, stops: &[char]) -> Result<String, String> {
        let mut out = String::new();
        loop {
            match self.peek() {
                None => return Err("unclosed brace, expected '}'".to_string()),
                Some(c) if stops.contains(&c) => return Ok(out),
                Some(c) => {
                    out.push(c);
                    self.pos += 1;
                }
            }
        }
    }

    /// `nested` parsing stops before an unconsumed `}`; top-level parsing
    /// treats `}` as unmatched.
    fn parse_message(&mut self, nested: bool) -> Result<Vec<IcuNode>, String> {
        let mut nodes = Vec::new();
        let mut text = String::new();
        loop {
            match self.peek() {
                None => {
                    if nested {
                        return Err("unclosed brace, expected '}'".to_string());
                    }
                    break;
                }
                Some('{') => {
                    if !text.is_empty() {
                        nodes.push(IcuNode::Text(std::mem::take(&mut text)));
                    }
                    nodes.push(self.parse_argument()?);
                }
                Some('}') => {
                    if nested {
                        break;
                    }
                    return Err(format!("unmatched '}}' at position {}", self.pos));
                }
                Some(c) => {
                    text.push(c);
                    self.pos += 1;
                }
            }
        }
        if !text.is_empty() {
            nodes.push(IcuNode::Text(text));
        }
        Ok(nodes)
    }

    fn parse_argument(&mut self) -> Result<IcuNode, String> {
        self.expect('{')?;
        self.skip_whitespace();
        let name = self.take_until(&[',', '}', '{'])?.trim().to_string();
        if name.is_empty() {
            return Err(format!("empty argument name at position {}", self.pos));
        }

        match self.bump() {
            Some('}') => Ok(IcuNode::Argument(name)),
            Some(',') => {
                self.skip_whitespace();
                let kind = self.take_until(&[',', '}', '{'])?.trim().to_string();
                match kind.as_str() {
                    "plural" | "selectordinal" => {
                        self.expect(',')?;
                        let branches = self.parse_branches()?;
                        Ok(IcuNode::Plural { name, branches })
                    }
                    "select" => {
                        self.expect(',')?;
                        let branches = self.parse_branches()?;
                        Ok(IcuNode::Select { name, branches })
                    }
                    _ => {
                        // number/date/time, style skipped
                        match self.bump() {
                            Some('}') => Ok(IcuNode::Argument(name)),
                            Some(',') => {
                                self.take_until(&['}', '{'])?;
                                self.expect('}')?;
                                Ok(IcuNode::Argument(name))
                            }
                            Some(c) => Err(format!(
                                "unexpected '{c}' in argument at position {}",
                                self.pos - 1
                            )),
                            None => Err("unclosed brace, expected '}'".to_string()),
                        }
                    }
                }
            }
            Some(c) => Err(format!(
                "unexpected '{c}' in argument at position {}",
                self.pos - 1
            )),
            None => Err("unclosed brace, expected '}'".to_string()),
        }
    }

    fn parse_branches(&mut self) -> Result<Vec<(String, Vec<IcuNode>)>, String> {
        let mut branches = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Err("unclosed brace, expected '}'".to_string()),
                Some('}') => {
                    self.pos += 1;
                    break;
                }
                _ => {
                    let selector = self.take_until(&['{', '}'])?.trim().to_string();
                    if selector.is_empty() {
                        return Err(format!("missing branch selector at position {}", self.pos));
                    }
                    self.expect('{')?;
                    let nodes = self.parse_message(true)?;
                    self.expect('}')?;
                    branches.push((selector, nodes));
                }
            }
        }
        if branches.is_empty() {
            return Err("expected at least one branch".to_string());
        }
        Ok(branches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========== Parsing Tests ==========

    #[test]
    fn test_plain_text_has_no_placeholders() {
        let result = validate_icu("Hello world");
        assert!(result.valid);
        assert!(result.placeholders.is_empty());
    }

    #[test]
    fn test_simple_argument() {
        let result = validate_icu("Hello {name}!");
        assert!(result.valid);
        assert_eq!(result.placeholders, vec!["name"]);
    }

    #[test]
    fn test_placeholders_dedupe_in_first_seen_order() {
        let result = validate_icu("{b} then {a} then {b} again");
        assert_eq!(result.placeholders, vec!["b", "a"]);
    }

    #[test]
    fn test_plural_with_hash_sign() {
        let result = validate_icu("You have {count, plural, one {# item} other {# items}}");
        assert!(result.valid);
        assert_eq!(result.placeholders, vec!["count"]);
    }

    #[test]
    fn test_nested_argument_inside_branch() {
        let result = validate_icu("{count, plural, other {Hello {name}, # waiting}}");
        assert!(result.valid);
        assert_eq!(result.placeholders, vec!["count", "name"]);
    }

    #[test]
    fn test_select_branches() {
        let result = validate_icu("{gender, select, male {He} female {She} other {They}}");
        assert!(result.valid);
        assert_eq!(result.placeholders, vec!["gender"]);
    }

    #[test]
    fn test_selectordinal_parses_as_plural() {
        let nodes = parse_icu("{place, selectordinal, one {#st} other {#th}}").unwrap();
        assert!(matches!(&nodes[0], IcuNode::Plural { name, .. } if name == "place"));
    }

    #[test]
    fn test_formatted_arguments_skip_style() {
        assert_eq!(validate_icu("{n, number}").placeholders, vec!["n"]);
        assert_eq!(validate_icu("{d, date, short}").placeholders, vec!["d"]);
    }

    #[test]
    fn test_branch_without_space_before_brace() {
        let result = validate_icu("{count, plural, one{# item} other{# items}}");
        assert!(result.valid);
        assert_eq!(result.placeholders, vec!["count"]);
    }

    // ========== Error Tests ==========

    #[test]
    fn test_unclosed_brace() {
        let result = validate_icu("Hello {name");
        assert!(!result.valid);
        assert!(result.errors[0].starts_with("Invalid ICU syntax:"));
    }

    #[test]
    fn test_unmatched_closing_brace() {
        assert!(!validate_icu("oops } here").valid);
    }

    #[test]
    fn test_empty_argument_name() {
        assert!(!validate_icu("hello {}").valid);
    }

    #[test]
    fn test_plural_without_branches() {
        assert!(!validate_icu("{n, plural}").valid);
        assert!(!validate_icu("{n, plural, }").valid);
    }

    #[test]
    fn test_branch_selector_without_body() {
        assert!(!validate_icu("{n, plural, one}").valid);
    }

    // ========== Parity Tests ==========

    #[test]
    fn test_parity_reports_missing_placeholder() {
        let errors = validate_icu_parity(
            "Hello {name}, you have {count, plural, one{# item} other{# items}}",
            "Bonjour, vous avez {count, plural, one{# article} other{# articles}}",
        );
        assert_eq!(errors, vec!["Missing: name"]);
    }

    #[test]
    fn test_parity_reports_extra_placeholder() {
        let errors = validate_icu_parity("Hello {name}", "Bonjour {name} {foo}");
        assert_eq!(errors, vec!["Extra: foo"]);
    }

    #[test]
    fn test_parity_reports_both_directions() {
        let errors = validate_icu_parity("Hi {a} {b}", "Salut {b} {c}");
        assert_eq!(errors, vec!["Missing: a", "Extra: c"]);
    }

    #[test]
    fn test_parity_accepts_matching_sets() {
        let errors = validate_icu_parity("Hello {name}", "{name}, bonjour");
        assert!(errors.is_empty());
    }

    #[test]
    fn test_parity_flags_invalid_sides() {
        let errors = validate_icu_parity("Hello {name", "Bonjour {name}");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Source has invalid ICU syntax:"));

        let errors = validate_icu_parity("Hello {name}", "Bonjour {name");
        assert!(errors[0].starts_with("Translation has invalid ICU syntax:"));
    }
}
