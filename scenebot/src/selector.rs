use crate::errors::RobotError;
use crate::node::Node;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

pub(crate) const CSS_ID_SELECTOR_SYMBOL: char = '#';
pub(crate) const CSS_CLASS_SELECTOR_SYMBOL: char = '.';

/// A string query, classified by its first character
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeQuery {
    /// Starts with `#` or `.`; handed verbatim to the toolkit's native lookup
    Css(String),
    /// Anything else; matches the displayed text of labeled and text-input nodes
    Label(String),
}

impl NodeQuery {
    pub fn as_str(&self) -> &str {
        match self {
            NodeQuery::Css(s) | NodeQuery::Label(s) => s,
        }
    }

    pub fn is_css(&self) -> bool {
        matches!(self, NodeQuery::Css(_))
    }
}

impl fmt::Display for NodeQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl From<&str> for NodeQuery {
    fn from(s: &str) -> Self {
        if s.starts_with(CSS_ID_SELECTOR_SYMBOL) || s.starts_with(CSS_CLASS_SELECTOR_SYMBOL) {
            NodeQuery::Css(s.to_string())
        } else {
            NodeQuery::Label(s.to_string())
        }
    }
}

impl From<String> for NodeQuery {
    fn from(s: String) -> Self {
        NodeQuery::from(s.as_str())
    }
}

impl From<&String> for NodeQuery {
    fn from(s: &String) -> Self {
        NodeQuery::from(s.as_str())
    }
}

type PredicateFn = dyn Fn(&Node) -> Result<bool, RobotError> + Send + Sync;

/// A test applied to nodes during a depth-first search.
///
/// Returning `Err(RobotError::TypeMismatch { .. })` means "not a node I can
/// judge" and is treated as no match; every other error aborts the search.
#[derive(Clone)]
pub struct NodePredicate {
    test: Arc<PredicateFn>,
    description: String,
}

impl NodePredicate {
    /// Infallible predicate over any node.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Node) -> bool + Send + Sync + 'static,
    {
        Self {
            test: Arc::new(move |node| Ok(f(node))),
            description: "predicate".to_string(),
        }
    }

    /// Predicate that may fail, e.g. via `Node::expect_kind`.
    pub fn fallible<F>(f: F) -> Self
    where
        F: Fn(&Node) -> Result<bool, RobotError> + Send + Sync + 'static,
    {
        Self {
            test: Arc::new(f),
            description: "predicate".to_string(),
        }
    }

    /// Predicate that only applies to nodes of `kind`; other nodes raise
    /// `TypeMismatch`, which the finder counts as no match.
    pub fn of_kind<F>(kind: crate::node::NodeKind, f: F) -> Self
    where
        F: Fn(&Node) -> bool + Send + Sync + 'static,
    {
        Self {
            test: Arc::new(move |node| node.expect_kind(kind).map(&f)),
            description: format!("{kind:?} predicate"),
        }
    }

    /// Exact match on the displayed text of labeled and text-input nodes.
    pub fn has_label(label: impl Into<String>) -> Self {
        let label = label.into();
        let description = format!("label \"{label}\"");
        Self {
            test: Arc::new(move |node| {
                if !node.kind().has_text() {
                    return Ok(false);
                }
                Ok(node.text()?.as_deref() == Some(label.as_str()))
            }),
            description,
        }
    }

    pub fn described_as(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn test(&self, node: &Node) -> Result<bool, RobotError> {
        (self.test)(node)
    }
}

impl fmt::Debug for NodePredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodePredicate")
            .field("description", &self.description)
            .finish()
    }
}

type MatcherFn = dyn Fn(&dyn std::any::Any) -> bool + Send + Sync;

/// An untyped matcher over arbitrary objects; nodes are offered as `&Node`.
#[derive(Clone)]
pub struct NodeMatcher {
    matches: Arc<MatcherFn>,
    description: String,
}

impl NodeMatcher {
    pub fn new<F>(description: impl Into<String>, f: F) -> Self
    where
        F: Fn(&dyn std::any::Any) -> bool + Send + Sync + 'static,
    {
        Self {
            matches: Arc::new(f),
            description: description.into(),
        }
    }

    pub fn matches(&self, item: &dyn std::any::Any) -> bool {
        (self.matches)(item)
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn into_predicate(self) -> NodePredicate {
        let description = format!("matcher {}", self.description);
        NodePredicate {
            test: Arc::new(move |node: &Node| Ok(self.matches(node))),
            description,
        }
    }
}

impl fmt::Debug for NodeMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeMatcher")
            .field("description", &self.description)
            .finish()
    }
}

/// Insertion-ordered set of node handles, deduplicated by node identity.
#[derive(Debug, Clone, Default)]
pub struct NodeSet {
    nodes: Vec<Node>,
    seen: HashSet<usize>,
}

impl NodeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `node` unless the same node is already present.
    pub fn insert(&mut self, node: Node) -> bool {
        if self.seen.insert(node.object_id()) {
            self.nodes.push(node);
            true
        } else {
            false
        }
    }

    pub fn extend_from(&mut self, other: NodeSet) {
        for node in other.nodes {
            self.insert(node);
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn first(&self) -> Option<&Node> {
        self.nodes.first()
    }

    pub fn contains(&self, node: &Node) -> bool {
        self.seen.contains(&node.object_id())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.nodes.iter()
    }

    /// Keeps the nodes for which `keep` holds, preserving order.
    pub fn filter<F>(self, mut keep: F) -> NodeSet
    where
        F: FnMut(&Node) -> bool,
    {
        self.nodes.into_iter().filter(|n| keep(n)).collect()
    }

    pub fn into_vec(self) -> Vec<Node> {
        self.nodes
    }
}

impl FromIterator<Node> for NodeSet {
    fn from_iter<I: IntoIterator<Item = Node>>(iter: I) -> Self {
        let mut set = NodeSet::new();
        for node in iter {
            set.insert(node);
        }
        set
    }
}

impl IntoIterator for NodeSet {
    type Item = Node;
    type IntoIter = std::vec::IntoIter<Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

impl<'a> IntoIterator for &'a NodeSet {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_and_class_strings_are_css() {
        assert_eq!(NodeQuery::from("#ok"), NodeQuery::Css("#ok".to_string()));
        assert_eq!(
            NodeQuery::from(".button"),
            NodeQuery::Css(".button".to_string())
        );
        assert!(NodeQuery::from("#").is_css());
    }

    #[test]
    fn test_other_strings_are_labels() {
        assert_eq!(NodeQuery::from("OK"), NodeQuery::Label("OK".to_string()));
        assert_eq!(
            NodeQuery::from("Save #1"),
            NodeQuery::Label("Save #1".to_string())
        );
        assert_eq!(NodeQuery::from(""), NodeQuery::Label(String::new()));
        assert_eq!(
            NodeQuery::from(" .padded"),
            NodeQuery::Label(" .padded".to_string())
        );
    }
}
