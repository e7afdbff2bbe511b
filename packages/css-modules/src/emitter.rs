// CSS Emitter
//
// Writes the AST back as compact text: `sel{prop:value;prop:value}`.

use crate::ast::{Node, Stylesheet};

pub fn stringify(sheet: &Stylesheet) -> String {
    let mut out = String::new();
    write_nodes(&sheet.nodes, &mut out);
    out
}

pub fn stringify_nodes(nodes: &[Node]) -> String {
    let mut out = String::new();
    write_nodes(nodes, &mut out);
    out
}

fn write_nodes(nodes: &[Node], out: &mut String) {
    for (i, node) in nodes.iter().enumerate() {
        match node {
            Node::Rule(rule) => {
                out.push_str(&rule.selector);
                out.push('{');
                write_nodes(&rule.nodes, out);
                out.push('}');
            }
            Node::AtRule(at_rule) => {
                out.push('@');
                out.push_str(&at_rule.name);
                if !at_rule.params.is_empty() {
                    out.push(' ');
                    out.push_str(&at_rule.params);
                }
                match &at_rule.nodes {
                    Some(children) => {
                        out.push('{');
                        write_nodes(children, out);
                        out.push('}');
                    }
                    None => out.push(';'),
                }
            }
            Node::Declaration(decl) => {
                out.push_str(&decl.prop);
                if let Some(value) = &decl.value {
                    out.push(':');
                    out.push_str(value);
                }
                if i + 1 < nodes.len() {
                    out.push(';');
                }
            }
            Node::Comment(comment) => {
                out.push_str("/*");
                out.push_str(&comment.text);
                out.push_str("*/");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_stylesheet;

    fn reprint(source: &str) -> String {
        stringify(&parse_stylesheet(source))
    }

    #[test]
    fn should_print_compact_rules() {
        assert_eq!(reprint(".a { color: red; margin: 0; }"), ".a{color:red;margin:0}");
    }

    #[test]
    fn should_print_at_rules() {
        assert_eq!(
            reprint("@import \"x.css\";\n@media print { .a { color: red } }"),
            "@import \"x.css\";@media print{.a{color:red}}"
        );
    }

    #[test]
    fn should_keep_empty_rules_and_comments() {
        assert_eq!(reprint("/* c */\n.a {}"), "/* c */.a{}");
    }
}
