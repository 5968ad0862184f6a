//! Minimal CSS selector engine for the headless scene graph.
//!
//! Supports type (`Button`), id (`#ok`), class (`.primary`) and universal
//! (`*`) simple selectors, compounds of those (`Button.primary#ok`), the
//! descendant and child (`>`) combinators, and comma separated groups.

use super::element::NodeData;
use crate::errors::RobotError;
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq)]
struct Compound {
    type_name: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

impl Compound {
    fn matches(&self, node: &NodeData) -> bool {
        if let Some(type_name) = &self.type_name {
            if node.type_name() != type_name.as_str() {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if node.css_id().as_deref() != Some(id.as_str()) {
                return false;
            }
        }
        if self.classes.is_empty() {
            return true;
        }
        let classes = node.style_classes();
        self.classes.iter().all(|c| classes.contains(c))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Combinator {
    Descendant,
    Child,
}

/// One comma separated alternative, stored right to left.
#[derive(Debug, Clone, PartialEq)]
struct Complex {
    subject: Compound,
    ancestors: Vec<(Combinator, Compound)>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Selector {
    alternatives: Vec<Complex>,
}

impl Selector {
    pub(crate) fn parse(input: &str) -> Result<Self, RobotError> {
        let alternatives = input
            .split(',')
            .map(|group| parse_complex(group, input))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { alternatives })
    }

    pub(crate) fn matches(&self, node: &Arc<NodeData>) -> bool {
        self.alternatives.iter().any(|alt| matches_complex(alt, node))
    }

    /// Matching nodes in the subtree of `root`, `root` included, in pre-order.
    pub(crate) fn select_all(&self, root: &Arc<NodeData>) -> Vec<Arc<NodeData>> {
        let mut found = Vec::new();
        let mut stack = vec![root.clone()];
        while let Some(node) = stack.pop() {
            if self.matches(&node) {
                found.push(node.clone());
            }
            stack.extend(node.children().into_iter().rev());
        }
        found
    }
}

fn invalid(selector: &str, reason: &str) -> RobotError {
    RobotError::InvalidArgument(format!("Invalid selector '{selector}': {reason}"))
}

fn parse_complex(group: &str, full: &str) -> Result<Complex, RobotError> {
    // Pad '>' so "a>b" tokenizes like "a > b".
    let spaced = group.replace('>', " > ");
    let mut compounds: Vec<(Combinator, Compound)> = Vec::new();
    let mut pending = Combinator::Descendant;
    let mut expect_compound = false;
    for token in spaced.split_whitespace() {
        if token == ">" {
            if compounds.is_empty() || expect_compound {
                return Err(invalid(full, "misplaced '>'"));
            }
            pending = Combinator::Child;
            expect_compound = true;
            continue;
        }
        compounds.push((pending, parse_compound(token, full)?));
        pending = Combinator::Descendant;
        expect_compound = false;
    }
    if expect_compound {
        return Err(invalid(full, "dangling '>'"));
    }
    let Some((mut link, subject)) = compounds.pop() else {
        return Err(invalid(full, "empty selector"));
    };
    // Each entry's combinator links it to the compound on its left.
    let mut ancestors = Vec::with_capacity(compounds.len());
    for (combinator, compound) in compounds.into_iter().rev() {
        ancestors.push((link, compound));
        link = combinator;
    }
    Ok(Complex { subject, ancestors })
}

fn parse_compound(token: &str, full: &str) -> Result<Compound, RobotError> {
    let mut compound = Compound::default();
    let mut rest = token;
    let type_end = rest.find(['#', '.']).unwrap_or(rest.len());
    let type_part = &rest[..type_end];
    if !type_part.is_empty() && type_part != "*" {
        if !is_identifier(type_part) {
            return Err(invalid(full, &format!("bad type name '{type_part}'")));
        }
        compound.type_name = Some(type_part.to_string());
    }
    rest = &rest[type_end..];
    while let Some(symbol) = rest.chars().next() {
        let body = &rest[1..];
        let end = body.find(['#', '.']).unwrap_or(body.len());
        let name = &body[..end];
        if !is_identifier(name) {
            return Err(invalid(full, &format!("bad name after '{symbol}'")));
        }
        match symbol {
            '#' => compound.id = Some(name.to_string()),
            _ => compound.classes.push(name.to_string()),
        }
        rest = &body[end..];
    }
    Ok(compound)
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
}

fn matches_complex(complex: &Complex, node: &Arc<NodeData>) -> bool {
    if !complex.subject.matches(node) {
        return false;
    }
    matches_ancestors(&complex.ancestors, node)
}

fn matches_ancestors(ancestors: &[(Combinator, Compound)], node: &Arc<NodeData>) -> bool {
    let Some(((combinator, compound), rest)) = ancestors.split_first() else {
        return true;
    };
    let mut candidate = node.parent();
    while let Some(ancestor) = candidate {
        if compound.matches(&ancestor) && matches_ancestors(rest, &ancestor) {
            return true;
        }
        if *combinator == Combinator::Child {
            return false;
        }
        candidate = ancestor.parent();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platforms::headless::HeadlessNode;

    fn tree() -> (HeadlessNode, HeadlessNode, HeadlessNode, HeadlessNode) {
        let ok = HeadlessNode::button("OK").with_id("ok").with_class("primary");
        let cancel = HeadlessNode::button("Cancel").with_class("secondary");
        let buttons = HeadlessNode::pane()
            .with_class("buttons")
            .with_children(&[&ok, &cancel]);
        let root = HeadlessNode::pane().with_id("root").with_children(&[&buttons]);
        (root, buttons, ok, cancel)
    }

    fn ids(found: &[Arc<NodeData>]) -> Vec<Option<String>> {
        found.iter().map(|n| n.css_id()).collect()
    }

    #[test]
    fn test_simple_selectors() {
        let (root, _, ok, _) = tree();
        let by_id = Selector::parse("#ok").unwrap().select_all(&root.0);
        assert_eq!(by_id.len(), 1);
        assert!(Arc::ptr_eq(&by_id[0], &ok.0));

        let by_type = Selector::parse("Button").unwrap().select_all(&root.0);
        assert_eq!(by_type.len(), 2);

        let everything = Selector::parse("*").unwrap().select_all(&root.0);
        assert_eq!(everything.len(), 4);
        assert_eq!(everything[0].css_id().as_deref(), Some("root"));
    }

    #[test]
    fn test_compound_and_combinators() {
        let (root, _, _, _) = tree();
        let compound = Selector::parse("Button.primary#ok").unwrap().select_all(&root.0);
        assert_eq!(ids(&compound), vec![Some("ok".to_string())]);

        let descendant = Selector::parse("#root .secondary").unwrap().select_all(&root.0);
        assert_eq!(descendant.len(), 1);

        let not_child = Selector::parse("#root > Button").unwrap().select_all(&root.0);
        assert!(not_child.is_empty());

        let child = Selector::parse("#root>.buttons > Button").unwrap().select_all(&root.0);
        assert_eq!(child.len(), 2);
    }

    #[test]
    fn test_groups_keep_document_order() {
        let (root, _, _, _) = tree();
        let found = Selector::parse(".secondary, #ok").unwrap().select_all(&root.0);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].css_id().as_deref(), Some("ok"));
    }

    #[test]
    fn test_malformed_selectors() {
        for bad in ["", "#", "a > ", "> a", "Button..x", "a, "] {
            let err = Selector::parse(bad).unwrap_err();
            assert!(matches!(err, RobotError::InvalidArgument(_)), "{bad}");
        }
    }
}
