use crate::errors::RobotError;
use crate::node::{Node, Scene, Window};
use crate::platforms::Toolkit;
use crate::selector::{NodeMatcher, NodePredicate, NodeQuery, NodeSet};
use crate::window_finder::{WindowFinder, WindowQuery};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Depth of the tree dump logged when a lookup comes back empty
const DIAGNOSTIC_TREE_DEPTH: usize = 4;

/// Searches the scene graphs of open windows.
///
/// All methods read the live tree and must run on the UI thread; the
/// [`crate::Robot`] takes care of that for its own lookups.
pub struct NodeFinder {
    toolkit: Arc<dyn Toolkit>,
    window_finder: Arc<WindowFinder>,
}

impl NodeFinder {
    pub fn new(toolkit: Arc<dyn Toolkit>, window_finder: Arc<WindowFinder>) -> Self {
        Self {
            toolkit,
            window_finder,
        }
    }

    pub fn window_finder(&self) -> &Arc<WindowFinder> {
        &self.window_finder
    }

    /// First visible node matching `query` across the ordered windows.
    pub fn node(&self, query: impl Into<NodeQuery>) -> Result<Option<Node>, RobotError> {
        Ok(self.nodes(query)?.into_iter().next())
    }

    /// Visible nodes matching a CSS selector (`#id`, `.class`) or a label,
    /// searched across windows ordered by proximity to the target window.
    #[instrument(level = "debug", skip(self, query))]
    pub fn nodes(&self, query: impl Into<NodeQuery>) -> Result<NodeSet, RobotError> {
        let query = query.into();
        let windows = self.window_finder.list_ordered_windows();
        debug!("Searching {} windows for {}", windows.len(), query);
        let description = query.to_string();
        self.nodes_impl(&windows, &description, |root| self.find_in_parent(&query, root))
    }

    pub fn node_matching(&self, predicate: &NodePredicate) -> Result<Option<Node>, RobotError> {
        Ok(self.nodes_matching(predicate)?.into_iter().next())
    }

    /// Visible nodes accepted by `predicate`, searched across all windows in
    /// creation order.
    #[instrument(
        level = "debug",
        skip(self, predicate),
        fields(predicate = predicate.description())
    )]
    pub fn nodes_matching(&self, predicate: &NodePredicate) -> Result<NodeSet, RobotError> {
        let windows = self.window_finder.list_windows();
        self.nodes_impl(&windows, predicate.description(), |root| {
            self.find_matching_in_parent(predicate, root)
        })
    }

    pub fn node_by_matcher(&self, matcher: &NodeMatcher) -> Result<Option<Node>, RobotError> {
        Ok(self.nodes_by_matcher(matcher)?.into_iter().next())
    }

    pub fn nodes_by_matcher(&self, matcher: &NodeMatcher) -> Result<NodeSet, RobotError> {
        self.nodes_matching(&matcher.clone().into_predicate())
    }

    pub fn node_in(
        &self,
        query: impl Into<NodeQuery>,
        parent: &Node,
    ) -> Result<Option<Node>, RobotError> {
        Ok(self.nodes_in(query, parent)?.into_iter().next())
    }

    /// Nodes matching `query` within the subtree of `parent`.
    ///
    /// Unlike the global lookups this neither fails on an empty result nor
    /// filters by visibility. It also makes the window showing `parent` the
    /// target window.
    #[instrument(level = "debug", skip(self, query, parent))]
    pub fn nodes_in(
        &self,
        query: impl Into<NodeQuery>,
        parent: &Node,
    ) -> Result<NodeSet, RobotError> {
        let query = query.into();
        self.retarget_to(parent)?;
        self.find_in_parent(&query, parent)
    }

    /// Predicate search within the subtree of `parent`; same rules as
    /// [`NodeFinder::nodes_in`].
    pub fn nodes_matching_in(
        &self,
        predicate: &NodePredicate,
        parent: &Node,
    ) -> Result<NodeSet, RobotError> {
        self.retarget_to(parent)?;
        self.find_matching_in_parent(predicate, parent)
    }

    fn retarget_to(&self, parent: &Node) -> Result<(), RobotError> {
        if !parent.is_attached() {
            return Err(RobotError::NodeDetached(parent.describe()));
        }
        if let Some(window) = parent.window()? {
            self.window_finder.set_target(window);
        }
        Ok(())
    }

    pub fn root_of_window(&self, window: &Window) -> Result<Node, RobotError> {
        let scene = window.scene()?.ok_or_else(|| {
            RobotError::WindowNotFound(format!("window {:?} has no scene", window))
        })?;
        self.root_of_scene(&scene)
    }

    pub fn root_of_index(&self, index: usize) -> Result<Node, RobotError> {
        let window = self.window_finder.window(WindowQuery::Index(index))?;
        self.root_of_window(&window)
    }

    pub fn root_of_title(&self, title_regex: &str) -> Result<Node, RobotError> {
        let window = self.window_finder.window(title_regex)?;
        self.root_of_window(&window)
    }

    pub fn root_of_scene(&self, scene: &Scene) -> Result<Node, RobotError> {
        scene
            .root()?
            .ok_or_else(|| RobotError::NodeDetached(format!("scene {:?} has no root", scene)))
    }

    fn nodes_impl<F>(
        &self,
        windows: &[Window],
        description: &str,
        mut to_result_nodes: F,
    ) -> Result<NodeSet, RobotError>
    where
        F: FnMut(&Node) -> Result<NodeSet, RobotError>,
    {
        let mut result = NodeSet::new();
        let mut roots = Vec::new();
        for window in windows {
            let Some(root) = Self::root_node(window) else {
                continue;
            };
            result.extend_from(to_result_nodes(&root)?);
            roots.push(root);
        }

        if result.is_empty() {
            self.log_trees(&roots, description);
            return Err(RobotError::NoNodesFound(description.to_string()));
        }

        let found = result.len();
        let visible = result.filter(Self::is_node_visible);
        if visible.is_empty() {
            debug!("All {} nodes matching {} are hidden", found, description);
            return Err(RobotError::NoVisibleNodesFound(description.to_string()));
        }
        debug!(
            found,
            visible = visible.len(),
            "Lookup for {} succeeded", description
        );
        Ok(visible)
    }

    fn root_node(window: &Window) -> Option<Node> {
        window.scene().ok().flatten()?.root().ok().flatten()
    }

    fn find_in_parent(&self, query: &NodeQuery, parent: &Node) -> Result<NodeSet, RobotError> {
        match query {
            NodeQuery::Css(selector) => Ok(self
                .toolkit
                .lookup_all(selector, parent)?
                .into_iter()
                .collect()),
            NodeQuery::Label(label) => {
                self.find_matching_in_parent(&NodePredicate::has_label(label.as_str()), parent)
            }
        }
    }

    /// Depth-first pre-order walk: the node itself, then its children in order.
    fn find_matching_in_parent(
        &self,
        predicate: &NodePredicate,
        parent: &Node,
    ) -> Result<NodeSet, RobotError> {
        let mut result = NodeSet::new();
        let mut stack = vec![parent.clone()];
        while let Some(node) = stack.pop() {
            if Self::apply_predicate(predicate, &node)? {
                result.insert(node.clone());
            }
            let children = node.children()?;
            stack.extend(children.into_iter().rev());
        }
        Ok(result)
    }

    fn apply_predicate(predicate: &NodePredicate, node: &Node) -> Result<bool, RobotError> {
        match predicate.test(node) {
            Ok(matched) => Ok(matched),
            Err(RobotError::TypeMismatch { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Visible with all ancestors, and overlapping the visible area of its scene.
    pub fn is_node_visible(node: &Node) -> bool {
        let visible = node.is_visible().unwrap_or(false) && node.is_tree_visible().unwrap_or(false);
        visible && Self::is_node_within_scene_bounds(node)
    }

    fn is_node_within_scene_bounds(node: &Node) -> bool {
        let Ok(Some(scene)) = node.scene() else {
            return false;
        };
        match (node.bounds_in_scene(), scene.local_bounds()) {
            (Ok(node_bounds), Ok(scene_bounds)) => node_bounds.intersects(&scene_bounds),
            _ => false,
        }
    }

    fn log_trees(&self, roots: &[Node], description: &str) {
        if !tracing::enabled!(tracing::Level::DEBUG) {
            return;
        }
        for root in roots {
            if let Ok(json) = root.to_serializable_tree(DIAGNOSTIC_TREE_DEPTH).to_json() {
                debug!("No node matching {} under root:\n{}", description, json);
            }
        }
    }
}
