use crate::errors::RobotError;
use crate::types::Bounds;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Debug;

/// Broad node categories the finder cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// A container with children and no text of its own
    Parent,
    /// A control that displays a text label (buttons, labels, check boxes)
    Labeled,
    /// A control the user types into
    TextInput,
    /// Anything else (shapes, images, canvases)
    Leaf,
}

impl NodeKind {
    /// Whether nodes of this kind carry displayed text.
    pub fn has_text(self) -> bool {
        matches!(self, NodeKind::Labeled | NodeKind::TextInput)
    }
}

/// The common trait that toolkit-specific node handles must implement.
///
/// Implementations hold non-owning references into the live tree; every
/// accessor returns `RobotError::NodeDetached` once the node is gone.
pub trait NodeImpl: Send + Sync + Debug {
    fn object_id(&self) -> usize;
    fn kind(&self) -> NodeKind;
    fn type_name(&self) -> String;
    fn css_id(&self) -> Result<Option<String>, RobotError>;
    fn style_classes(&self) -> Result<Vec<String>, RobotError>;
    /// Displayed text for `Labeled` and `TextInput` nodes.
    fn text(&self) -> Result<Option<String>, RobotError>;
    fn children(&self) -> Result<Vec<Node>, RobotError>;
    fn parent(&self) -> Result<Option<Node>, RobotError>;
    fn scene(&self) -> Result<Option<Scene>, RobotError>;
    fn is_visible(&self) -> Result<bool, RobotError>;
    /// Visible together with every ancestor.
    fn is_tree_visible(&self) -> Result<bool, RobotError>;
    /// Layout bounds transformed into the coordinate space of the owning scene.
    fn bounds_in_scene(&self) -> Result<Bounds, RobotError>;
    fn is_attached(&self) -> bool;
    fn as_any(&self) -> &dyn std::any::Any;
    fn clone_box(&self) -> Box<dyn NodeImpl>;
}

pub trait SceneImpl: Send + Sync + Debug {
    fn object_id(&self) -> usize;
    /// Width and height of the scene's visible area.
    fn size(&self) -> Result<(f64, f64), RobotError>;
    fn bounds_on_screen(&self) -> Result<Bounds, RobotError>;
    fn root(&self) -> Result<Option<Node>, RobotError>;
    fn window(&self) -> Result<Option<Window>, RobotError>;
    /// Run any pending layout pass so geometry reads are current.
    fn layout(&self) -> Result<(), RobotError> {
        Ok(())
    }
    fn as_any(&self) -> &dyn std::any::Any;
    fn clone_box(&self) -> Box<dyn SceneImpl>;
}

pub trait WindowImpl: Send + Sync + Debug {
    fn object_id(&self) -> usize;
    fn title(&self) -> Result<String, RobotError>;
    fn bounds_on_screen(&self) -> Result<Bounds, RobotError>;
    fn scene(&self) -> Result<Option<Scene>, RobotError>;
    fn owner(&self) -> Result<Option<Window>, RobotError>;
    fn is_showing(&self) -> bool;
    fn as_any(&self) -> &dyn std::any::Any;
    fn clone_box(&self) -> Box<dyn WindowImpl>;
}

/// A non-owning handle to a node of the live scene graph
pub struct Node {
    inner: Box<dyn NodeImpl>,
}

impl Node {
    pub fn new(impl_: Box<dyn NodeImpl>) -> Self {
        Self { inner: impl_ }
    }

    /// Identity of the underlying node; equal handles share it.
    pub fn object_id(&self) -> usize {
        self.inner.object_id()
    }

    pub fn kind(&self) -> NodeKind {
        self.inner.kind()
    }

    pub fn type_name(&self) -> String {
        self.inner.type_name()
    }

    pub fn css_id(&self) -> Result<Option<String>, RobotError> {
        self.inner.css_id()
    }

    pub fn style_classes(&self) -> Result<Vec<String>, RobotError> {
        self.inner.style_classes()
    }

    pub fn text(&self) -> Result<Option<String>, RobotError> {
        self.inner.text()
    }

    pub fn children(&self) -> Result<Vec<Node>, RobotError> {
        self.inner.children()
    }

    pub fn parent(&self) -> Result<Option<Node>, RobotError> {
        self.inner.parent()
    }

    pub fn scene(&self) -> Result<Option<Scene>, RobotError> {
        self.inner.scene()
    }

    /// The window showing this node, if it is part of a shown scene.
    pub fn window(&self) -> Result<Option<Window>, RobotError> {
        match self.scene()? {
            Some(scene) => scene.window(),
            None => Ok(None),
        }
    }

    pub fn is_visible(&self) -> Result<bool, RobotError> {
        self.inner.is_visible()
    }

    pub fn is_tree_visible(&self) -> Result<bool, RobotError> {
        self.inner.is_tree_visible()
    }

    pub fn bounds_in_scene(&self) -> Result<Bounds, RobotError> {
        self.inner.bounds_in_scene()
    }

    pub fn is_attached(&self) -> bool {
        self.inner.is_attached()
    }

    /// Fails with `TypeMismatch` unless the node is of `kind`. Predicates use
    /// this to bail out on nodes they were not written for.
    pub fn expect_kind(&self, kind: NodeKind) -> Result<&Node, RobotError> {
        if self.kind() == kind {
            Ok(self)
        } else {
            Err(RobotError::TypeMismatch {
                expected: format!("{kind:?}"),
                found: format!("{:?} ({})", self.kind(), self.type_name()),
            })
        }
    }

    pub(crate) fn as_any(&self) -> &dyn std::any::Any {
        self.inner.as_any()
    }

    /// Short human readable description used in logs and error messages.
    pub fn describe(&self) -> String {
        let mut out = self.type_name();
        if let Ok(Some(id)) = self.css_id() {
            out.push_str(&format!("#{id}"));
        }
        if let Ok(Some(text)) = self.text() {
            out.push_str(&format!(" \"{text}\""));
        }
        out
    }

    pub fn to_serializable(&self) -> SerializableNode {
        SerializableNode::from(self)
    }

    /// Snapshot of this node and its descendants down to `max_depth`.
    pub fn to_serializable_tree(&self, max_depth: usize) -> SerializableNode {
        fn build(node: &Node, depth: usize, max_depth: usize) -> SerializableNode {
            let mut snapshot = SerializableNode::from(node);
            if depth < max_depth {
                if let Ok(children) = node.children() {
                    if !children.is_empty() {
                        snapshot.children = Some(
                            children
                                .iter()
                                .map(|child| build(child, depth + 1, max_depth))
                                .collect(),
                        );
                    }
                }
            }
            snapshot
        }
        build(self, 0, max_depth)
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.object_id() == other.object_id()
    }
}

impl Eq for Node {}

impl std::hash::Hash for Node {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.object_id().hash(state);
    }
}

impl Clone for Node {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone_box(),
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("object_id", &self.object_id())
            .field("type", &self.type_name())
            .field("attached", &self.is_attached())
            .finish()
    }
}

/// A non-owning handle to the root container of a node tree
pub struct Scene {
    inner: Box<dyn SceneImpl>,
}

impl Scene {
    pub fn new(impl_: Box<dyn SceneImpl>) -> Self {
        Self { inner: impl_ }
    }

    pub fn object_id(&self) -> usize {
        self.inner.object_id()
    }

    pub fn size(&self) -> Result<(f64, f64), RobotError> {
        self.inner.size()
    }

    /// The scene's visible rectangle in its own coordinate space.
    pub fn local_bounds(&self) -> Result<Bounds, RobotError> {
        let (width, height) = self.size()?;
        Ok(Bounds::new(0.0, 0.0, width, height))
    }

    pub fn bounds_on_screen(&self) -> Result<Bounds, RobotError> {
        self.inner.bounds_on_screen()
    }

    pub fn root(&self) -> Result<Option<Node>, RobotError> {
        self.inner.root()
    }

    pub fn window(&self) -> Result<Option<Window>, RobotError> {
        self.inner.window()
    }

    pub fn layout(&self) -> Result<(), RobotError> {
        self.inner.layout()
    }
}

impl PartialEq for Scene {
    fn eq(&self, other: &Self) -> bool {
        self.object_id() == other.object_id()
    }
}

impl Eq for Scene {}

impl Clone for Scene {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone_box(),
        }
    }
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("object_id", &self.object_id())
            .finish()
    }
}

/// A non-owning handle to a top-level window
pub struct Window {
    inner: Box<dyn WindowImpl>,
}

impl Window {
    pub fn new(impl_: Box<dyn WindowImpl>) -> Self {
        Self { inner: impl_ }
    }

    pub fn object_id(&self) -> usize {
        self.inner.object_id()
    }

    pub fn title(&self) -> Result<String, RobotError> {
        self.inner.title()
    }

    pub fn bounds_on_screen(&self) -> Result<Bounds, RobotError> {
        self.inner.bounds_on_screen()
    }

    pub fn scene(&self) -> Result<Option<Scene>, RobotError> {
        self.inner.scene()
    }

    pub fn owner(&self) -> Result<Option<Window>, RobotError> {
        self.inner.owner()
    }

    pub fn is_showing(&self) -> bool {
        self.inner.is_showing()
    }

    /// True when `other` appears somewhere in this window's owner chain.
    pub fn is_owned_by(&self, other: &Window) -> bool {
        let mut current = self.owner().ok().flatten();
        while let Some(owner) = current {
            if &owner == other {
                return true;
            }
            current = owner.owner().ok().flatten();
        }
        false
    }
}

impl PartialEq for Window {
    fn eq(&self, other: &Self) -> bool {
        self.object_id() == other.object_id()
    }
}

impl Eq for Window {}

impl Clone for Window {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone_box(),
        }
    }
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("object_id", &self.object_id())
            .field("title", &self.title().unwrap_or_default())
            .finish()
    }
}

/// Serializable snapshot of a node, for diagnostics.
///
/// Only carries properties; it cannot be used to drive the UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializableNode {
    pub type_name: String,
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub style_classes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
    pub visible: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub children: Option<Vec<SerializableNode>>,
}

impl From<&Node> for SerializableNode {
    fn from(node: &Node) -> Self {
        Self {
            type_name: node.type_name(),
            kind: node.kind(),
            id: node.css_id().ok().flatten(),
            style_classes: node.style_classes().unwrap_or_default(),
            text: node.text().ok().flatten(),
            bounds: node.bounds_in_scene().ok(),
            visible: node.is_visible().unwrap_or(false),
            children: None,
        }
    }
}

impl SerializableNode {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
