use crate::errors::RobotError;
use crate::node::{Node, Scene, Window};
use crate::node_finder::NodeFinder;
use crate::selector::{NodeMatcher, NodePredicate};
use crate::types::{Bounds, Point, Pos};
use std::sync::Arc;
use tracing::debug;

/// Symbolic description of a screen location, resolved only when queried
#[derive(Debug, Clone)]
pub enum Target {
    /// Absolute screen point; ignores the anchor
    Point(Point),
    /// The base target moved by a fixed delta
    Offset {
        base: Box<Target>,
        dx: f64,
        dy: f64,
    },
    /// Rectangle in screen coordinates
    Bounds(Bounds),
    Node(Node),
    Scene(Scene),
    Window(Window),
    /// CSS selector or label; first visible match wins
    Query(String),
    Predicate(NodePredicate),
    Matcher(NodeMatcher),
    /// A target carrying its own anchor, e.g. a converted [`PointQuery`]
    Anchored { target: Box<Target>, pos: Pos },
}

impl Target {
    pub fn offset(self, dx: f64, dy: f64) -> Target {
        Target::Offset {
            base: Box::new(self),
            dx,
            dy,
        }
    }

    fn describe(&self) -> String {
        match self {
            Target::Query(query) => format!("query \"{query}\""),
            Target::Predicate(predicate) => predicate.description().to_string(),
            Target::Matcher(matcher) => format!("matcher {}", matcher.description()),
            other => format!("{other:?}"),
        }
    }
}

impl From<Point> for Target {
    fn from(point: Point) -> Self {
        Target::Point(point)
    }
}

impl From<(f64, f64)> for Target {
    fn from(xy: (f64, f64)) -> Self {
        Target::Point(xy.into())
    }
}

impl From<Bounds> for Target {
    fn from(bounds: Bounds) -> Self {
        Target::Bounds(bounds)
    }
}

impl From<Node> for Target {
    fn from(node: Node) -> Self {
        Target::Node(node)
    }
}

impl From<&Node> for Target {
    fn from(node: &Node) -> Self {
        Target::Node(node.clone())
    }
}

impl From<Scene> for Target {
    fn from(scene: Scene) -> Self {
        Target::Scene(scene)
    }
}

impl From<&Scene> for Target {
    fn from(scene: &Scene) -> Self {
        Target::Scene(scene.clone())
    }
}

impl From<Window> for Target {
    fn from(window: Window) -> Self {
        Target::Window(window)
    }
}

impl From<&Window> for Target {
    fn from(window: &Window) -> Self {
        Target::Window(window.clone())
    }
}

impl From<&str> for Target {
    fn from(query: &str) -> Self {
        Target::Query(query.to_string())
    }
}

impl From<String> for Target {
    fn from(query: String) -> Self {
        Target::Query(query)
    }
}

impl From<NodePredicate> for Target {
    fn from(predicate: NodePredicate) -> Self {
        Target::Predicate(predicate)
    }
}

impl From<NodeMatcher> for Target {
    fn from(matcher: NodeMatcher) -> Self {
        Target::Matcher(matcher)
    }
}

impl From<PointQuery> for Target {
    fn from(query: PointQuery) -> Self {
        Target::Anchored {
            target: Box::new(query.target),
            pos: query.pos,
        }
    }
}

/// A target plus the anchor used when it resolves to a region
#[derive(Debug, Clone)]
pub struct PointQuery {
    target: Target,
    pos: Pos,
}

impl PointQuery {
    pub fn new(target: impl Into<Target>, pos: Pos) -> Self {
        Self {
            target: target.into(),
            pos,
        }
    }

    pub fn at_position(mut self, pos: Pos) -> Self {
        self.pos = pos;
        self
    }

    pub fn at_offset(mut self, dx: f64, dy: f64) -> Self {
        self.target = self.target.offset(dx, dy);
        self
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn pos(&self) -> Pos {
        self.pos
    }

    /// Resolve against the live UI. Must run on the UI thread.
    pub fn query(&self, locator: &PointLocator) -> Result<Point, RobotError> {
        locator.point(&self.target, self.pos)
    }
}

/// Turns targets into screen points using the current layout.
#[derive(Clone)]
pub struct PointLocator {
    finder: Arc<NodeFinder>,
}

impl PointLocator {
    pub fn new(finder: Arc<NodeFinder>) -> Self {
        Self { finder }
    }

    pub fn point(&self, target: &Target, pos: Pos) -> Result<Point, RobotError> {
        let point = match target {
            Target::Point(point) => *point,
            Target::Offset { base, dx, dy } => self.point(base, pos)?.translate(*dx, *dy),
            Target::Bounds(bounds) => bounds.point_at(pos),
            Target::Node(node) => self.node_bounds(node)?.point_at(pos),
            Target::Scene(scene) => scene.bounds_on_screen()?.point_at(pos),
            Target::Window(window) => Self::window_bounds(window)?.point_at(pos),
            Target::Query(query) => {
                let node = self.found(target, self.finder.node(query.as_str()))?;
                self.node_bounds(&node)?.point_at(pos)
            }
            Target::Predicate(predicate) => {
                let node = self.found(target, self.finder.node_matching(predicate))?;
                self.node_bounds(&node)?.point_at(pos)
            }
            Target::Matcher(matcher) => {
                let node = self.found(target, self.finder.node_by_matcher(matcher))?;
                self.node_bounds(&node)?.point_at(pos)
            }
            Target::Anchored { target, pos } => self.point(target, *pos)?,
        };
        Ok(point)
    }

    /// Screen bounds of `node`, after letting its scene finish layout.
    pub fn node_bounds(&self, node: &Node) -> Result<Bounds, RobotError> {
        if !node.is_attached() {
            return Err(RobotError::NodeDetached(format!("{node:?}")));
        }
        let scene = node
            .scene()?
            .ok_or_else(|| RobotError::NodeDetached(format!("{} has no scene", node.describe())))?;
        scene.layout()?;
        let in_scene = node.bounds_in_scene()?;
        let origin = scene.bounds_on_screen()?;
        let bounds = in_scene.translate(origin.min_x, origin.min_y);
        debug!("Bounds of {} on screen: {:?}", node.describe(), bounds);
        Ok(bounds)
    }

    fn window_bounds(window: &Window) -> Result<Bounds, RobotError> {
        if !window.is_showing() {
            return Err(RobotError::WindowNotFound(format!(
                "window {:?} is not showing",
                window
            )));
        }
        window.bounds_on_screen()
    }

    fn found(
        &self,
        target: &Target,
        lookup: Result<Option<Node>, RobotError>,
    ) -> Result<Node, RobotError> {
        let description = target.describe();
        match lookup {
            Ok(Some(node)) => Ok(node),
            Ok(None) => Err(RobotError::TargetNotFound {
                target: description.clone(),
                source: Box::new(RobotError::NoNodesFound(description)),
            }),
            Err(e) if e.is_lookup_failure() => Err(RobotError::TargetNotFound {
                target: description,
                source: Box::new(e),
            }),
            Err(e) => Err(e),
        }
    }
}
