//! Stylesheet AST
//!
//! A typed tree of rules, at-rules, declarations and comments. Passes over the
//! tree dispatch on [`Node`] with exhaustive matches, either directly or through
//! the [`Visitor`] trait.

use crate::keyframes;
use crate::parse_util::SourceLocation;

/// A parsed stylesheet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Stylesheet {
    pub nodes: Vec<Node>,
}

impl Stylesheet {
    pub fn new(nodes: Vec<Node>) -> Self {
        Stylesheet { nodes }
    }
}

/// Node type union
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Rule(Rule),
    AtRule(AtRule),
    Declaration(Declaration),
    Comment(Comment),
}

impl Node {
    pub fn location(&self) -> SourceLocation {
        match self {
            Node::Rule(rule) => rule.location,
            Node::AtRule(at_rule) => at_rule.location,
            Node::Declaration(decl) => decl.location,
            Node::Comment(comment) => comment.location,
        }
    }
}

/// `selector { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub selector: String,
    pub nodes: Vec<Node>,
    pub location: SourceLocation,
}

impl Rule {
    pub fn new(selector: impl Into<String>, nodes: Vec<Node>) -> Self {
        Rule {
            selector: selector.into(),
            nodes,
            location: SourceLocation::default(),
        }
    }
}

/// `@name params;` or `@name params { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct AtRule {
    pub name: String,
    pub params: String,
    /// `None` for statement at-rules such as `@import "x";`
    pub nodes: Option<Vec<Node>>,
    pub location: SourceLocation,
}

/// `prop: value`. A stray statement without a colon keeps its text in `prop`.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub prop: String,
    pub value: Option<String>,
    pub location: SourceLocation,
}

impl Declaration {
    pub fn new(prop: impl Into<String>, value: impl Into<String>) -> Self {
        Declaration {
            prop: prop.into(),
            value: Some(value.into()),
            location: SourceLocation::default(),
        }
    }

    /// Lowercased property name, for keyword comparisons.
    pub fn prop_name(&self) -> String {
        self.prop.trim().to_ascii_lowercase()
    }
}

/// `/* text */`
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub text: String,
    pub location: SourceLocation,
}

/// Visitor trait for traversing the AST.
///
/// The default methods recurse into child blocks, so an implementation only
/// overrides the node kinds it cares about.
pub trait Visitor {
    type Error;

    fn visit_rule(&mut self, rule: &mut Rule) -> Result<(), Self::Error> {
        visit_all(self, &mut rule.nodes)
    }

    fn visit_at_rule(&mut self, at_rule: &mut AtRule) -> Result<(), Self::Error> {
        match at_rule.nodes.as_mut() {
            Some(nodes) => visit_all(self, nodes),
            None => Ok(()),
        }
    }

    fn visit_declaration(&mut self, _decl: &mut Declaration) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_comment(&mut self, _comment: &mut Comment) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Visit all nodes in a block
pub fn visit_all<V: Visitor + ?Sized>(visitor: &mut V, nodes: &mut [Node]) -> Result<(), V::Error> {
    for node in nodes {
        match node {
            Node::Rule(rule) => visitor.visit_rule(rule)?,
            Node::AtRule(at_rule) => visitor.visit_at_rule(at_rule)?,
            Node::Declaration(decl) => visitor.visit_declaration(decl)?,
            Node::Comment(comment) => visitor.visit_comment(comment)?,
        }
    }
    Ok(())
}

/// Drop rules left without nodes, and block at-rules emptied by that.
/// Keyframes blocks are kept as written.
pub fn remove_empty_rules(nodes: &mut Vec<Node>) {
    nodes.retain_mut(|node| match node {
        Node::Rule(rule) => {
            remove_empty_rules(&mut rule.nodes);
            !rule.nodes.is_empty()
        }
        Node::AtRule(at_rule) if !keyframes::is_keyframes_at_rule(&at_rule.name) => {
            match at_rule.nodes.as_mut() {
                Some(children) if !children.is_empty() => {
                    remove_empty_rules(children);
                    !children.is_empty()
                }
                _ => true,
            }
        }
        _ => true,
    });
}
