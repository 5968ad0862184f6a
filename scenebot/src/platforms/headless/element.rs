//! Scene graph storage for the headless toolkit
//!
//! The test application owns the tree through `HeadlessNode`,
//! `HeadlessScene` and `HeadlessWindow`; the robot only ever receives the
//! weak handles defined at the bottom of this file.

use crate::errors::RobotError;
use crate::node::{Node, NodeImpl, NodeKind, Scene, SceneImpl, Window, WindowImpl};
use crate::types::{Bounds, Point};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

static NEXT_OBJECT_ID: AtomicUsize = AtomicUsize::new(1);

fn next_object_id() -> usize {
    NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed)
}

// A poisoned lock only means a test panicked mid-update; the data is still usable.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Clone)]
struct NodeProps {
    css_id: Option<String>,
    style_classes: Vec<String>,
    text: Option<String>,
    visible: bool,
    /// Position and size relative to the parent's origin
    layout: Bounds,
    /// Relocation applied on the scene's next layout pass
    pending_layout: Option<Bounds>,
}

#[derive(Debug)]
pub(crate) struct NodeData {
    id: usize,
    kind: NodeKind,
    type_name: String,
    props: RwLock<NodeProps>,
    parent: RwLock<Weak<NodeData>>,
    children: RwLock<Vec<Arc<NodeData>>>,
    /// Set on scene roots only
    scene: RwLock<Weak<SceneData>>,
}

impl NodeData {
    pub(crate) fn css_id(&self) -> Option<String> {
        read(&self.props).css_id.clone()
    }

    pub(crate) fn style_classes(&self) -> Vec<String> {
        read(&self.props).style_classes.clone()
    }

    pub(crate) fn type_name(&self) -> &str {
        &self.type_name
    }

    pub(crate) fn children(&self) -> Vec<Arc<NodeData>> {
        read(&self.children).clone()
    }

    pub(crate) fn parent(&self) -> Option<Arc<NodeData>> {
        read(&self.parent).upgrade()
    }

    fn scene(self: &Arc<Self>) -> Option<Arc<SceneData>> {
        let mut current = self.clone();
        while let Some(parent) = current.parent() {
            current = parent;
        }
        let scene = read(&current.scene).upgrade();
        scene
    }

    fn bounds_in_scene(&self) -> Bounds {
        let mut bounds = read(&self.props).layout;
        let mut ancestor = self.parent();
        while let Some(node) = ancestor {
            let offset = read(&node.props).layout;
            bounds = bounds.translate(offset.min_x, offset.min_y);
            ancestor = node.parent();
        }
        bounds
    }

    fn is_tree_visible(&self) -> bool {
        if !read(&self.props).visible {
            return false;
        }
        let mut ancestor = self.parent();
        while let Some(node) = ancestor {
            if !read(&node.props).visible {
                return false;
            }
            ancestor = node.parent();
        }
        true
    }

    /// Apply pending relocations in this subtree; returns how many moved.
    fn apply_pending_layout(&self) -> usize {
        let mut moved = 0;
        {
            let mut props = write(&self.props);
            if let Some(bounds) = props.pending_layout.take() {
                props.layout = bounds;
                moved += 1;
            }
        }
        for child in self.children() {
            moved += child.apply_pending_layout();
        }
        moved
    }

    pub(crate) fn handle(self: &Arc<Self>) -> Node {
        Node::new(Box::new(HeadlessNodeHandle {
            id: self.id,
            kind: self.kind,
            type_name: self.type_name.clone(),
            node: Arc::downgrade(self),
        }))
    }
}

/// An owned node of the headless scene graph
#[derive(Debug, Clone)]
pub struct HeadlessNode(pub(crate) Arc<NodeData>);

impl HeadlessNode {
    pub fn new(kind: NodeKind, type_name: impl Into<String>) -> Self {
        Self(Arc::new(NodeData {
            id: next_object_id(),
            kind,
            type_name: type_name.into(),
            props: RwLock::new(NodeProps {
                css_id: None,
                style_classes: Vec::new(),
                text: None,
                visible: true,
                layout: Bounds::default(),
                pending_layout: None,
            }),
            parent: RwLock::new(Weak::new()),
            children: RwLock::new(Vec::new()),
            scene: RwLock::new(Weak::new()),
        }))
    }

    pub fn pane() -> Self {
        Self::new(NodeKind::Parent, "Pane")
    }

    pub fn button(text: &str) -> Self {
        Self::new(NodeKind::Labeled, "Button").with_text(text)
    }

    pub fn label(text: &str) -> Self {
        Self::new(NodeKind::Labeled, "Label").with_text(text)
    }

    pub fn text_field(text: &str) -> Self {
        Self::new(NodeKind::TextInput, "TextField").with_text(text)
    }

    pub fn shape(type_name: &str) -> Self {
        Self::new(NodeKind::Leaf, type_name)
    }

    pub fn with_id(self, id: &str) -> Self {
        write(&self.0.props).css_id = Some(id.to_string());
        self
    }

    pub fn with_class(self, class: &str) -> Self {
        write(&self.0.props).style_classes.push(class.to_string());
        self
    }

    pub fn with_text(self, text: &str) -> Self {
        self.set_text(text);
        self
    }

    pub fn with_layout(self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.set_layout(Bounds::new(x, y, width, height));
        self
    }

    pub fn hidden(self) -> Self {
        self.set_visible(false);
        self
    }

    pub fn with_children(self, children: &[&HeadlessNode]) -> Self {
        for child in children {
            self.add_child(child);
        }
        self
    }

    pub fn set_text(&self, text: &str) {
        write(&self.0.props).text = Some(text.to_string());
    }

    pub fn clear_text(&self) {
        write(&self.0.props).text = None;
    }

    pub fn set_visible(&self, visible: bool) {
        write(&self.0.props).visible = visible;
    }

    pub fn set_layout(&self, bounds: Bounds) {
        let mut props = write(&self.0.props);
        props.layout = bounds;
        props.pending_layout = None;
    }

    /// Move the node on the next layout pass, keeping its size.
    pub fn relocate(&self, x: f64, y: f64) {
        let mut props = write(&self.0.props);
        let current = props.pending_layout.unwrap_or(props.layout);
        props.pending_layout = Some(Bounds::new(x, y, current.width, current.height));
    }

    /// Append `child`, detaching it from any previous parent first.
    pub fn add_child(&self, child: &HeadlessNode) {
        if let Some(old_parent) = child.0.parent() {
            write(&old_parent.children).retain(|c| c.id != child.0.id);
        }
        *write(&child.0.parent) = Arc::downgrade(&self.0);
        write(&self.0.children).push(child.0.clone());
    }

    pub fn remove_child(&self, child: &HeadlessNode) {
        write(&self.0.children).retain(|c| c.id != child.0.id);
        let is_parent = child
            .0
            .parent()
            .is_some_and(|parent| Arc::ptr_eq(&parent, &self.0));
        if is_parent {
            *write(&child.0.parent) = Weak::new();
        }
    }

    /// A weak handle for the robot.
    pub fn handle(&self) -> Node {
        self.0.handle()
    }
}

#[derive(Debug)]
pub(crate) struct SceneData {
    id: usize,
    size: RwLock<(f64, f64)>,
    /// Scene origin relative to the window's top-left corner
    offset: RwLock<Point>,
    root: RwLock<Option<Arc<NodeData>>>,
    window: RwLock<Weak<WindowData>>,
    layout_passes: AtomicUsize,
}

impl SceneData {
    fn window(&self) -> Option<Arc<WindowData>> {
        read(&self.window).upgrade()
    }

    fn bounds_on_screen(&self) -> Result<Bounds, RobotError> {
        let window = self
            .window()
            .ok_or_else(|| RobotError::WindowNotFound("scene is not shown in a window".into()))?;
        let origin = *read(&window.bounds);
        let offset = *read(&self.offset);
        let (width, height) = *read(&self.size);
        Ok(Bounds::new(
            origin.min_x + offset.x,
            origin.min_y + offset.y,
            width,
            height,
        ))
    }

    pub(crate) fn handle(self: &Arc<Self>) -> Scene {
        Scene::new(Box::new(HeadlessSceneHandle {
            id: self.id,
            scene: Arc::downgrade(self),
        }))
    }
}

/// An owned scene: a root node plus the size of the visible area
#[derive(Debug, Clone)]
pub struct HeadlessScene(pub(crate) Arc<SceneData>);

impl HeadlessScene {
    pub fn new(root: &HeadlessNode, width: f64, height: f64) -> Self {
        let scene = Arc::new(SceneData {
            id: next_object_id(),
            size: RwLock::new((width, height)),
            offset: RwLock::new(Point::default()),
            root: RwLock::new(Some(root.0.clone())),
            window: RwLock::new(Weak::new()),
            layout_passes: AtomicUsize::new(0),
        });
        *write(&root.0.scene) = Arc::downgrade(&scene);
        Self(scene)
    }

    /// Place the scene inside its window, e.g. below a title bar.
    pub fn with_offset(self, x: f64, y: f64) -> Self {
        *write(&self.0.offset) = Point::new(x, y);
        self
    }

    pub fn resize(&self, width: f64, height: f64) {
        *write(&self.0.size) = (width, height);
    }

    pub fn set_root(&self, root: &HeadlessNode) {
        if let Some(old) = write(&self.0.root).replace(root.0.clone()) {
            *write(&old.scene) = Weak::new();
        }
        *write(&root.0.scene) = Arc::downgrade(&self.0);
    }

    /// Number of layout passes run so far.
    pub fn layout_passes(&self) -> usize {
        self.0.layout_passes.load(Ordering::SeqCst)
    }

    pub fn handle(&self) -> Scene {
        self.0.handle()
    }
}

#[derive(Debug)]
pub(crate) struct WindowData {
    id: usize,
    title: RwLock<String>,
    bounds: RwLock<Bounds>,
    showing: AtomicBool,
    owner: Weak<WindowData>,
    scene: RwLock<Option<Arc<SceneData>>>,
}

impl WindowData {
    pub(crate) fn new(
        title: &str,
        bounds: Bounds,
        scene: &HeadlessScene,
        owner: Option<&Arc<WindowData>>,
    ) -> Arc<WindowData> {
        let window = Arc::new(WindowData {
            id: next_object_id(),
            title: RwLock::new(title.to_string()),
            bounds: RwLock::new(bounds),
            showing: AtomicBool::new(true),
            owner: owner.map(Arc::downgrade).unwrap_or_default(),
            scene: RwLock::new(Some(scene.0.clone())),
        });
        *write(&scene.0.window) = Arc::downgrade(&window);
        window
    }

    pub(crate) fn id(&self) -> usize {
        self.id
    }

    pub(crate) fn handle(self: &Arc<Self>) -> Window {
        Window::new(Box::new(HeadlessWindowHandle {
            id: self.id,
            window: Arc::downgrade(self),
        }))
    }
}

/// An owned top-level window. Closing it goes through
/// [`super::HeadlessToolkit::close_window`].
#[derive(Debug, Clone)]
pub struct HeadlessWindow(pub(crate) Arc<WindowData>);

impl HeadlessWindow {
    pub fn set_title(&self, title: &str) {
        *write(&self.0.title) = title.to_string();
    }

    pub fn set_bounds(&self, bounds: Bounds) {
        *write(&self.0.bounds) = bounds;
    }

    pub fn set_showing(&self, showing: bool) {
        self.0.showing.store(showing, Ordering::SeqCst);
    }

    pub fn scene(&self) -> Option<HeadlessScene> {
        read(&self.0.scene).clone().map(HeadlessScene)
    }

    pub fn handle(&self) -> Window {
        self.0.handle()
    }
}

// ----------------------------------------------------------------------
// Weak handles
// ----------------------------------------------------------------------

#[derive(Debug, Clone)]
pub(crate) struct HeadlessNodeHandle {
    id: usize,
    kind: NodeKind,
    type_name: String,
    node: Weak<NodeData>,
}

impl HeadlessNodeHandle {
    pub(crate) fn data(&self) -> Result<Arc<NodeData>, RobotError> {
        self.node.upgrade().ok_or_else(|| {
            RobotError::NodeDetached(format!("{} node {} was dropped", self.type_name, self.id))
        })
    }
}

impl NodeImpl for HeadlessNodeHandle {
    fn object_id(&self) -> usize {
        self.id
    }

    fn kind(&self) -> NodeKind {
        self.kind
    }

    fn type_name(&self) -> String {
        self.type_name.clone()
    }

    fn css_id(&self) -> Result<Option<String>, RobotError> {
        Ok(self.data()?.css_id())
    }

    fn style_classes(&self) -> Result<Vec<String>, RobotError> {
        Ok(self.data()?.style_classes())
    }

    fn text(&self) -> Result<Option<String>, RobotError> {
        let data = self.data()?;
        if !data.kind.has_text() {
            return Ok(None);
        }
        let text = read(&data.props).text.clone();
        Ok(text)
    }

    fn children(&self) -> Result<Vec<Node>, RobotError> {
        Ok(self.data()?.children().iter().map(|c| c.handle()).collect())
    }

    fn parent(&self) -> Result<Option<Node>, RobotError> {
        Ok(self.data()?.parent().map(|p| p.handle()))
    }

    fn scene(&self) -> Result<Option<Scene>, RobotError> {
        Ok(self.data()?.scene().map(|s| s.handle()))
    }

    fn is_visible(&self) -> Result<bool, RobotError> {
        let data = self.data()?;
        let visible = read(&data.props).visible;
        Ok(visible)
    }

    fn is_tree_visible(&self) -> Result<bool, RobotError> {
        Ok(self.data()?.is_tree_visible())
    }

    fn bounds_in_scene(&self) -> Result<Bounds, RobotError> {
        Ok(self.data()?.bounds_in_scene())
    }

    fn is_attached(&self) -> bool {
        self.node.strong_count() > 0
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn clone_box(&self) -> Box<dyn NodeImpl> {
        Box::new(self.clone())
    }
}

#[derive(Debug, Clone)]
pub(crate) struct HeadlessSceneHandle {
    id: usize,
    scene: Weak<SceneData>,
}

impl HeadlessSceneHandle {
    fn data(&self) -> Result<Arc<SceneData>, RobotError> {
        self.scene
            .upgrade()
            .ok_or_else(|| RobotError::NodeDetached(format!("scene {} was dropped", self.id)))
    }
}

impl SceneImpl for HeadlessSceneHandle {
    fn object_id(&self) -> usize {
        self.id
    }

    fn size(&self) -> Result<(f64, f64), RobotError> {
        let data = self.data()?;
        let size = *read(&data.size);
        Ok(size)
    }

    fn bounds_on_screen(&self) -> Result<Bounds, RobotError> {
        self.data()?.bounds_on_screen()
    }

    fn root(&self) -> Result<Option<Node>, RobotError> {
        let data = self.data()?;
        let root = read(&data.root).as_ref().map(|r| r.handle());
        Ok(root)
    }

    fn window(&self) -> Result<Option<Window>, RobotError> {
        Ok(self.data()?.window().map(|w| w.handle()))
    }

    fn layout(&self) -> Result<(), RobotError> {
        let data = self.data()?;
        data.layout_passes.fetch_add(1, Ordering::SeqCst);
        let root = read(&data.root).clone();
        if let Some(root) = root {
            let moved = root.apply_pending_layout();
            if moved > 0 {
                tracing::debug!("Layout pass moved {} nodes", moved);
            }
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn clone_box(&self) -> Box<dyn SceneImpl> {
        Box::new(self.clone())
    }
}

#[derive(Debug, Clone)]
pub(crate) struct HeadlessWindowHandle {
    id: usize,
    window: Weak<WindowData>,
}

impl HeadlessWindowHandle {
    fn data(&self) -> Result<Arc<WindowData>, RobotError> {
        self.window
            .upgrade()
            .ok_or_else(|| RobotError::WindowNotFound(format!("window {} was closed", self.id)))
    }
}

impl WindowImpl for HeadlessWindowHandle {
    fn object_id(&self) -> usize {
        self.id
    }

    fn title(&self) -> Result<String, RobotError> {
        let data = self.data()?;
        let title = read(&data.title).clone();
        Ok(title)
    }

    fn bounds_on_screen(&self) -> Result<Bounds, RobotError> {
        let data = self.data()?;
        let bounds = *read(&data.bounds);
        Ok(bounds)
    }

    fn scene(&self) -> Result<Option<Scene>, RobotError> {
        let data = self.data()?;
        let scene = read(&data.scene).as_ref().map(|s| s.handle());
        Ok(scene)
    }

    fn owner(&self) -> Result<Option<Window>, RobotError> {
        Ok(self.data()?.owner.upgrade().map(|o| o.handle()))
    }

    fn is_showing(&self) -> bool {
        self.window
            .upgrade()
            .is_some_and(|w| w.showing.load(Ordering::SeqCst))
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn clone_box(&self) -> Box<dyn WindowImpl> {
        Box::new(self.clone())
    }
}
