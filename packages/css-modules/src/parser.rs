// CSS Parser
//
// A tolerant parser producing the typed AST. It does not validate CSS: it only
// splits the text into rules, at-rules, declarations and comments.

use crate::ast::{AtRule, Comment, Declaration, Node, Rule, Stylesheet};
use crate::parse_util::{LineIndex, SourceLocation};

/// Parse a whole stylesheet.
pub fn parse_stylesheet(source: &str) -> Stylesheet {
    let mut parser = Parser::new(source);
    Stylesheet::new(parser.parse_block(true))
}

struct Parser<'a> {
    source: &'a str,
    pos: usize,
    index: LineIndex,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Parser {
            source,
            pos: 0,
            index: LineIndex::new(source),
        }
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.source[self.pos..].chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn starts_with(&self, s: &str) -> bool {
        self.source[self.pos..].starts_with(s)
    }

    fn location(&self, offset: usize) -> SourceLocation {
        self.index.location(self.source, offset)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.bump();
        }
    }

    /// Parse nodes until the closing `}` of the current block (or EOF).
    fn parse_block(&mut self, top_level: bool) -> Vec<Node> {
        let mut nodes = Vec::new();
        loop {
            self.skip_whitespace();
            let c = match self.peek() {
                Some(c) => c,
                None => break,
            };
            match c {
                '}' => {
                    self.bump();
                    if top_level {
                        continue;
                    }
                    break;
                }
                ';' => {
                    self.bump();
                }
                '/' if self.starts_with("/*") => nodes.push(self.parse_comment()),
                '@' => nodes.push(self.parse_at_rule()),
                _ => {
                    if let Some(node) = self.parse_rule_or_declaration() {
                        nodes.push(node);
                    }
                }
            }
        }
        nodes
    }

    fn parse_comment(&mut self) -> Node {
        let start = self.pos;
        self.pos += 2;
        let text_start = self.pos;
        let text = match self.source[text_start..].find("*/") {
            Some(end) => {
                self.pos = text_start + end + 2;
                &self.source[text_start..text_start + end]
            }
            None => {
                self.pos = self.source.len();
                &self.source[text_start..]
            }
        };
        Node::Comment(Comment {
            text: text.to_string(),
            location: self.location(start),
        })
    }

    fn parse_at_rule(&mut self) -> Node {
        let start = self.pos;
        self.bump();
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                name.push(c);
                self.bump();
            } else {
                break;
            }
        }
        let (params, terminator) = self.scan_prelude();
        let nodes = match terminator {
            Some('{') => {
                self.bump();
                Some(self.parse_block(false))
            }
            Some(';') => {
                self.bump();
                None
            }
            _ => None,
        };
        Node::AtRule(AtRule {
            name,
            params: params.trim().to_string(),
            nodes,
            location: self.location(start),
        })
    }

    fn parse_rule_or_declaration(&mut self) -> Option<Node> {
        let start = self.pos;
        let (prelude, terminator) = self.scan_prelude();
        let location = self.location(start);
        match terminator {
            Some('{') => {
                self.bump();
                let nodes = self.parse_block(false);
                Some(Node::Rule(Rule {
                    selector: prelude.trim().to_string(),
                    nodes,
                    location,
                }))
            }
            other => {
                if other == Some(';') {
                    self.bump();
                }
                let text = prelude.trim();
                if text.is_empty() {
                    return None;
                }
                Some(Node::Declaration(split_declaration(text, location)))
            }
        }
    }

    /// Collect text up to a top-level `{`, `;` or `}`. Comments are dropped,
    /// strings and escapes are kept verbatim. The terminator is not consumed.
    fn scan_prelude(&mut self) -> (String, Option<char>) {
        let mut out = String::new();
        let mut depth = 0usize;
        while let Some(c) = self.peek() {
            match c {
                '{' | ';' | '}' if depth == 0 => return (out, Some(c)),
                '/' if self.peek_at(1) == Some('*') => {
                    match self.source[self.pos + 2..].find("*/") {
                        Some(end) => self.pos += 2 + end + 2,
                        None => self.pos = self.source.len(),
                    }
                }
                '\\' => {
                    out.push(c);
                    self.bump();
                    if let Some(next) = self.bump() {
                        out.push(next);
                    }
                }
                '"' | '\'' => self.scan_string(c, &mut out),
                '(' | '[' => {
                    depth += 1;
                    out.push(c);
                    self.bump();
                }
                ')' | ']' => {
                    depth = depth.saturating_sub(1);
                    out.push(c);
                    self.bump();
                }
                _ => {
                    out.push(c);
                    self.bump();
                }
            }
        }
        (out, None)
    }

    fn scan_string(&mut self, quote: char, out: &mut String) {
        out.push(quote);
        self.bump();
        while let Some(c) = self.bump() {
            out.push(c);
            if c == '\\' {
                if let Some(next) = self.bump() {
                    out.push(next);
                }
            } else if c == quote || c == '\n' {
                break;
            }
        }
    }
}

fn split_declaration(text: &str, location: SourceLocation) -> Declaration {
    match find_top_level_colon(text) {
        Some(idx) => Declaration {
            prop: text[..idx].trim().to_string(),
            value: Some(text[idx + 1..].trim().to_string()),
            location,
        },
        None => Declaration {
            prop: text.to_string(),
            value: None,
            location,
        },
    }
}

fn find_top_level_colon(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (c, quote) {
            ('\\', _) => escaped = true,
            (q, Some(open)) if q == open => quote = None,
            (_, Some(_)) => {}
            ('"' | '\'', None) => quote = Some(c),
            ('(' | '[', None) => depth += 1,
            (')' | ']', None) => depth = depth.saturating_sub(1),
            (':', None) if depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first(source: &str) -> Node {
        parse_stylesheet(source).nodes.into_iter().next().unwrap()
    }

    #[test]
    fn should_parse_rule_with_declarations() {
        match first(".a { color: red; margin: 0 }") {
            Node::Rule(rule) => {
                assert_eq!(rule.selector, ".a");
                assert_eq!(rule.nodes.len(), 2);
                match &rule.nodes[1] {
                    Node::Declaration(decl) => {
                        assert_eq!(decl.prop, "margin");
                        assert_eq!(decl.value.as_deref(), Some("0"));
                    }
                    other => panic!("unexpected node {:?}", other),
                }
            }
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn should_keep_pseudo_classes_in_selectors() {
        match first("a:hover, .b::before { x: y }") {
            Node::Rule(rule) => assert_eq!(rule.selector, "a:hover, .b::before"),
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn should_parse_nested_at_rules() {
        match first("@media (max-width: 10px) { .a { color: red } }") {
            Node::AtRule(at_rule) => {
                assert_eq!(at_rule.name, "media");
                assert_eq!(at_rule.params, "(max-width: 10px)");
                let nodes = at_rule.nodes.unwrap();
                assert!(matches!(nodes[0], Node::Rule(_)));
            }
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn should_parse_statement_at_rules() {
        match first("@value primary: #BF4040;") {
            Node::AtRule(at_rule) => {
                assert_eq!(at_rule.name, "value");
                assert_eq!(at_rule.params, "primary: #BF4040");
                assert!(at_rule.nodes.is_none());
            }
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn should_not_split_on_semicolons_in_strings() {
        match first(".a { content: \"a;b\" }") {
            Node::Rule(rule) => match &rule.nodes[0] {
                Node::Declaration(decl) => assert_eq!(decl.value.as_deref(), Some("\"a;b\"")),
                other => panic!("unexpected node {:?}", other),
            },
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn should_keep_block_comments_and_strip_inline_ones() {
        let sheet = parse_stylesheet("/* top */ .a /* x */ { color: red }");
        assert!(matches!(&sheet.nodes[0], Node::Comment(c) if c.text == " top "));
        assert!(matches!(&sheet.nodes[1], Node::Rule(r) if r.selector == ".a"));
    }

    #[test]
    fn should_close_unterminated_blocks_at_eof() {
        let sheet = parse_stylesheet(".a { color: red");
        match &sheet.nodes[0] {
            Node::Rule(rule) => assert_eq!(rule.nodes.len(), 1),
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn should_record_locations() {
        let sheet = parse_stylesheet("\n\n  .a {}");
        assert_eq!(sheet.nodes[0].location().line, 3);
        assert_eq!(sheet.nodes[0].location().col, 3);
    }
}
