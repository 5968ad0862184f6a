//! The fluent robot
//!
//! Every method that touches the UI is scheduled on the UI thread through the
//! robot's [`ToolkitService`] and waited for before it returns, so a chain of
//! calls reaches the toolkit in exactly the order it was written:
//!
//! ```no_run
//! use scenebot::{KeyCode, Robot};
//!
//! # fn main() -> Result<(), scenebot::RobotError> {
//! let (mut robot, _toolkit) = Robot::headless()?;
//! robot
//!     .click_on("#name", &[])?
//!     .write("Alice")?
//!     .push(&[KeyCode::Control, KeyCode::A])?
//!     .click_on("OK", &[])?;
//! # Ok(())
//! # }
//! ```

use crate::config::RobotConfig;
use crate::errors::RobotError;
use crate::node::{Node, Window};
use crate::node_finder::NodeFinder;
use crate::platforms::{self, headless::HeadlessToolkit, Toolkit};
use crate::point::{PointLocator, PointQuery, Target};
use crate::selector::{NodeMatcher, NodePredicate, NodeQuery, NodeSet};
use crate::service::{self, ToolkitService, UiThread};
use crate::types::{KeyCode, KeyCombination, MouseButton, Point, Pos, VerticalDirection};
use crate::window_finder::{WindowFinder, WindowQuery};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// What the robot currently holds down. Sets, not counts; kept in press order.
#[derive(Debug, Clone, Default)]
pub struct RobotState {
    buttons: Vec<MouseButton>,
    keys: Vec<KeyCode>,
}

impl RobotState {
    fn add_buttons(&mut self, buttons: &[MouseButton]) {
        for button in buttons {
            if !self.buttons.contains(button) {
                self.buttons.push(*button);
            }
        }
    }

    fn remove_buttons(&mut self, buttons: &[MouseButton]) {
        self.buttons.retain(|b| !buttons.contains(b));
    }

    fn add_keys(&mut self, keys: &[KeyCode]) {
        for key in keys {
            if !self.keys.contains(key) {
                self.keys.push(*key);
            }
        }
    }

    fn remove_keys(&mut self, keys: &[KeyCode]) {
        self.keys.retain(|k| !keys.contains(k));
    }

    pub fn buttons(&self) -> &[MouseButton] {
        &self.buttons
    }

    pub fn keys(&self) -> &[KeyCode] {
        &self.keys
    }
}

/// Everything a scheduled action needs on the UI thread
#[derive(Clone)]
struct UiContext {
    toolkit: Arc<dyn Toolkit>,
    finder: Arc<NodeFinder>,
    locator: PointLocator,
}

impl UiContext {
    fn point(&self, query: &PointQuery) -> Result<Point, RobotError> {
        query.query(&self.locator)
    }

    fn move_to(&self, query: &PointQuery) -> Result<Point, RobotError> {
        let point = self.point(query)?;
        self.toolkit.move_pointer(point)?;
        Ok(point)
    }

    fn press_buttons(&self, buttons: &[MouseButton]) -> Result<(), RobotError> {
        for button in buttons {
            self.toolkit.press_button(*button)?;
        }
        Ok(())
    }

    fn release_buttons(&self, buttons: &[MouseButton]) -> Result<(), RobotError> {
        for button in buttons {
            self.toolkit.release_button(*button)?;
        }
        Ok(())
    }

    fn click(&self, buttons: &[MouseButton]) -> Result<(), RobotError> {
        self.press_buttons(buttons)?;
        self.release_buttons(buttons)
    }

    /// Press `keys` in order, release them in reverse order.
    fn push(&self, keys: &[KeyCode]) -> Result<(), RobotError> {
        for key in keys {
            self.toolkit.press_key(*key)?;
        }
        for key in keys.iter().rev() {
            self.toolkit.release_key(*key)?;
        }
        Ok(())
    }
}

fn buttons_or_primary(buttons: &[MouseButton]) -> Vec<MouseButton> {
    if buttons.is_empty() {
        vec![MouseButton::Primary]
    } else {
        buttons.to_vec()
    }
}

/// Drives the UI like a user would
pub struct Robot {
    service: Arc<dyn ToolkitService>,
    ctx: UiContext,
    config: RobotConfig,
    pos: Pos,
    state: RobotState,
}

impl Robot {
    pub fn new(toolkit: Arc<dyn Toolkit>, service: Arc<dyn ToolkitService>) -> Self {
        Self::with_config(toolkit, service, RobotConfig::default())
    }

    pub fn with_config(
        toolkit: Arc<dyn Toolkit>,
        service: Arc<dyn ToolkitService>,
        config: RobotConfig,
    ) -> Self {
        let window_finder = Arc::new(WindowFinder::new(toolkit.clone()));
        let finder = Arc::new(NodeFinder::new(toolkit.clone(), window_finder));
        let locator = PointLocator::new(finder.clone());
        Self {
            service,
            ctx: UiContext {
                toolkit,
                finder,
                locator,
            },
            pos: config.pos,
            config,
            state: RobotState::default(),
        }
    }

    /// A robot over a fresh in-memory toolkit with its own UI thread.
    pub fn headless() -> Result<(Robot, Arc<HeadlessToolkit>), RobotError> {
        Self::headless_with_config(RobotConfig::default())
    }

    pub fn headless_with_config(
        config: RobotConfig,
    ) -> Result<(Robot, Arc<HeadlessToolkit>), RobotError> {
        let toolkit = platforms::create_headless_toolkit();
        let service = Arc::new(UiThread::spawn()?);
        let robot = Robot::with_config(toolkit.clone(), service, config);
        Ok((robot, toolkit))
    }

    pub fn config(&self) -> &RobotConfig {
        &self.config
    }

    pub fn state(&self) -> &RobotState {
        &self.state
    }

    pub fn pressed_buttons(&self) -> Vec<MouseButton> {
        self.state.buttons.clone()
    }

    pub fn pressed_keys(&self) -> Vec<KeyCode> {
        self.state.keys.clone()
    }

    /// Schedule `f` on the UI thread and wait for it.
    fn run<T, F>(&self, label: &str, f: F) -> Result<T, RobotError>
    where
        T: Send + 'static,
        F: FnOnce(&UiContext) -> Result<T, RobotError> + Send + 'static,
    {
        let ctx = self.ctx.clone();
        debug!("Scheduling '{}'", label);
        service::run_and_wait(
            self.service.as_ref(),
            label,
            self.config.action_timeout(),
            move || f(&ctx),
        )
    }

    fn anchored(&self, target: impl Into<Target>) -> PointQuery {
        PointQuery::new(target, self.pos)
    }

    // ------------------------------------------------------------------
    // Points and windows
    // ------------------------------------------------------------------

    /// Anchor used for targets that resolve to a region.
    pub fn pos(&mut self, pos: Pos) -> &mut Self {
        self.pos = pos;
        self
    }

    pub fn point_for(&self, target: impl Into<Target>) -> PointQuery {
        self.anchored(target)
    }

    pub fn offset(&self, target: impl Into<Target>, dx: f64, dy: f64) -> PointQuery {
        self.anchored(target).at_offset(dx, dy)
    }

    /// Resolve `query` against the current layout.
    pub fn query_point(&self, query: &PointQuery) -> Result<Point, RobotError> {
        let query = query.clone();
        self.run("query point", move |ctx| ctx.point(&query))
    }

    pub fn pointer(&self) -> Result<Point, RobotError> {
        self.run("pointer position", |ctx| Ok(ctx.toolkit.pointer_position()))
    }

    #[instrument(level = "debug", skip(self, query))]
    pub fn target(&mut self, query: impl Into<WindowQuery>) -> Result<&mut Self, RobotError> {
        let query = query.into();
        self.run("target window", move |ctx| {
            ctx.finder.window_finder().target(query).map(|_| ())
        })?;
        Ok(self)
    }

    pub fn target_window(&self) -> Result<Option<Window>, RobotError> {
        self.run("target window", |ctx| {
            Ok(ctx.finder.window_finder().target_window())
        })
    }

    pub fn list_windows(&self) -> Result<Vec<Window>, RobotError> {
        self.run("list windows", |ctx| Ok(ctx.finder.window_finder().list_windows()))
    }

    /// Root node of the window selected by `query`.
    pub fn root_of(&self, query: impl Into<WindowQuery>) -> Result<Node, RobotError> {
        let query = query.into();
        self.run("root node", move |ctx| {
            let window = ctx.finder.window_finder().window(query)?;
            ctx.finder.root_of_window(&window)
        })
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    #[instrument(level = "debug", skip(self, query))]
    pub fn lookup(&self, query: impl Into<NodeQuery>) -> Result<NodeSet, RobotError> {
        let query = query.into();
        self.run("lookup", move |ctx| ctx.finder.nodes(query))
    }

    pub fn lookup_node(&self, query: impl Into<NodeQuery>) -> Result<Option<Node>, RobotError> {
        let query = query.into();
        self.run("lookup node", move |ctx| ctx.finder.node(query))
    }

    pub fn lookup_matching(&self, predicate: NodePredicate) -> Result<NodeSet, RobotError> {
        self.run("lookup matching", move |ctx| {
            ctx.finder.nodes_matching(&predicate)
        })
    }

    pub fn lookup_by_matcher(&self, matcher: NodeMatcher) -> Result<NodeSet, RobotError> {
        self.run("lookup by matcher", move |ctx| {
            ctx.finder.nodes_by_matcher(&matcher)
        })
    }

    /// Search below `parent` only. Retargets the window finder to the window
    /// showing `parent`.
    pub fn lookup_in(
        &self,
        query: impl Into<NodeQuery>,
        parent: &Node,
    ) -> Result<NodeSet, RobotError> {
        let query = query.into();
        let parent = parent.clone();
        self.run("lookup in parent", move |ctx| ctx.finder.nodes_in(query, &parent))
    }

    /// Predicate search below `parent`, with the same rules as
    /// [`Robot::lookup_in`].
    pub fn lookup_matching_in(
        &self,
        predicate: NodePredicate,
        parent: &Node,
    ) -> Result<NodeSet, RobotError> {
        let parent = parent.clone();
        self.run("lookup matching in parent", move |ctx| {
            ctx.finder.nodes_matching_in(&predicate, &parent)
        })
    }

    // ------------------------------------------------------------------
    // Pointer movement
    // ------------------------------------------------------------------

    #[instrument(level = "debug", skip(self, target))]
    pub fn move_to(&mut self, target: impl Into<Target>) -> Result<&mut Self, RobotError> {
        let query = self.anchored(target);
        self.run("move to", move |ctx| ctx.move_to(&query).map(|_| ()))?;
        Ok(self)
    }

    pub fn move_by(&mut self, dx: f64, dy: f64) -> Result<&mut Self, RobotError> {
        self.run("move by", move |ctx| {
            let to = ctx.toolkit.pointer_position().translate(dx, dy);
            ctx.toolkit.move_pointer(to)
        })?;
        Ok(self)
    }

    // ------------------------------------------------------------------
    // Mouse buttons
    // ------------------------------------------------------------------

    /// Press `buttons` (primary when empty) and keep them held.
    ///
    /// Buttons count as held from the moment the press is scheduled, even if
    /// the wait times out.
    pub fn press_mouse(&mut self, buttons: &[MouseButton]) -> Result<&mut Self, RobotError> {
        let buttons = buttons_or_primary(buttons);
        self.state.add_buttons(&buttons);
        self.run("press mouse", move |ctx| ctx.press_buttons(&buttons))?;
        Ok(self)
    }

    /// Release `buttons`, or every held button when `buttons` is empty.
    /// Releasing with nothing held does nothing.
    pub fn release_mouse(&mut self, buttons: &[MouseButton]) -> Result<&mut Self, RobotError> {
        let buttons = if buttons.is_empty() {
            self.state.buttons.iter().rev().copied().collect::<Vec<_>>()
        } else {
            buttons.to_vec()
        };
        if buttons.is_empty() {
            return Ok(self);
        }
        let released = buttons.clone();
        self.run("release mouse", move |ctx| ctx.release_buttons(&released))?;
        self.state.remove_buttons(&buttons);
        Ok(self)
    }

    pub fn click(&mut self, buttons: &[MouseButton]) -> Result<&mut Self, RobotError> {
        let buttons = buttons_or_primary(buttons);
        self.run("click", move |ctx| ctx.click(&buttons))?;
        Ok(self)
    }

    /// Move onto `target`, then press and release `buttons` (primary when
    /// empty), as one action on the UI thread.
    #[instrument(level = "debug", skip(self, target))]
    pub fn click_on(
        &mut self,
        target: impl Into<Target>,
        buttons: &[MouseButton],
    ) -> Result<&mut Self, RobotError> {
        let query = self.anchored(target);
        let buttons = buttons_or_primary(buttons);
        self.run("click on", move |ctx| {
            let point = ctx.move_to(&query)?;
            debug!("Clicking {:?} at {}", buttons, point);
            ctx.click(&buttons)
        })?;
        Ok(self)
    }

    pub fn double_click(&mut self, buttons: &[MouseButton]) -> Result<&mut Self, RobotError> {
        let buttons = buttons_or_primary(buttons);
        self.run("double click", move |ctx| {
            ctx.click(&buttons)?;
            ctx.click(&buttons)
        })?;
        Ok(self)
    }

    #[instrument(level = "debug", skip(self, target))]
    pub fn double_click_on(
        &mut self,
        target: impl Into<Target>,
        buttons: &[MouseButton],
    ) -> Result<&mut Self, RobotError> {
        let query = self.anchored(target);
        let buttons = buttons_or_primary(buttons);
        self.run("double click on", move |ctx| {
            ctx.move_to(&query)?;
            ctx.click(&buttons)?;
            ctx.click(&buttons)
        })?;
        Ok(self)
    }

    pub fn right_click(&mut self) -> Result<&mut Self, RobotError> {
        self.click(&[MouseButton::Secondary])
    }

    pub fn right_click_on(&mut self, target: impl Into<Target>) -> Result<&mut Self, RobotError> {
        self.click_on(target, &[MouseButton::Secondary])
    }

    // ------------------------------------------------------------------
    // Drag and drop
    // ------------------------------------------------------------------

    /// Move onto `target` and press `buttons` (primary when empty).
    #[instrument(level = "debug", skip(self, target))]
    pub fn drag(
        &mut self,
        target: impl Into<Target>,
        buttons: &[MouseButton],
    ) -> Result<&mut Self, RobotError> {
        self.move_to(target)?.press_mouse(buttons)
    }

    /// Start a drag at the current pointer position.
    pub fn drag_here(&mut self, buttons: &[MouseButton]) -> Result<&mut Self, RobotError> {
        self.press_mouse(buttons)
    }

    /// Release every held button where the pointer is.
    pub fn drop(&mut self) -> Result<&mut Self, RobotError> {
        self.release_mouse(&[])
    }

    /// Move onto `target` and release every held button. The target is
    /// resolved only now, so a drop zone that moved during the drag is hit
    /// where it currently is.
    #[instrument(level = "debug", skip(self, target))]
    pub fn drop_to(&mut self, target: impl Into<Target>) -> Result<&mut Self, RobotError> {
        let query = self.anchored(target);
        let held: Vec<MouseButton> = self.state.buttons.iter().rev().copied().collect();
        let released = held.clone();
        self.run("drop to", move |ctx| {
            ctx.move_to(&query)?;
            ctx.release_buttons(&released)
        })?;
        self.state.remove_buttons(&held);
        Ok(self)
    }

    pub fn drop_by(&mut self, dx: f64, dy: f64) -> Result<&mut Self, RobotError> {
        let held: Vec<MouseButton> = self.state.buttons.iter().rev().copied().collect();
        let released = held.clone();
        self.run("drop by", move |ctx| {
            let to = ctx.toolkit.pointer_position().translate(dx, dy);
            ctx.toolkit.move_pointer(to)?;
            ctx.release_buttons(&released)
        })?;
        self.state.remove_buttons(&held);
        Ok(self)
    }

    // ------------------------------------------------------------------
    // Keyboard
    // ------------------------------------------------------------------

    pub fn press_keys(&mut self, keys: &[KeyCode]) -> Result<&mut Self, RobotError> {
        if keys.is_empty() {
            return Ok(self);
        }
        self.state.add_keys(keys);
        let pressed = keys.to_vec();
        self.run("press keys", move |ctx| {
            for key in &pressed {
                ctx.toolkit.press_key(*key)?;
            }
            Ok(())
        })?;
        Ok(self)
    }

    /// Release `keys`, or every held key (most recent first) when `keys` is
    /// empty.
    pub fn release_keys(&mut self, keys: &[KeyCode]) -> Result<&mut Self, RobotError> {
        let keys = if keys.is_empty() {
            self.state.keys.iter().rev().copied().collect::<Vec<_>>()
        } else {
            keys.to_vec()
        };
        if keys.is_empty() {
            return Ok(self);
        }
        let released = keys.clone();
        self.run("release keys", move |ctx| {
            for key in &released {
                ctx.toolkit.release_key(*key)?;
            }
            Ok(())
        })?;
        self.state.remove_keys(&keys);
        Ok(self)
    }

    /// Press `keys` in order, then release them in reverse order, as one
    /// action. `push(&[KeyCode::Control, KeyCode::C])` copies.
    #[instrument(level = "debug", skip(self))]
    pub fn push(&mut self, keys: &[KeyCode]) -> Result<&mut Self, RobotError> {
        if keys.is_empty() {
            return Ok(self);
        }
        let keys = keys.to_vec();
        self.run("push", move |ctx| ctx.push(&keys))?;
        Ok(self)
    }

    pub fn push_combination(
        &mut self,
        combination: &KeyCombination,
    ) -> Result<&mut Self, RobotError> {
        self.push(&combination.keys())
    }

    /// Type each key in turn: press, release, next key.
    pub fn type_keys(&mut self, keys: &[KeyCode]) -> Result<&mut Self, RobotError> {
        for key in keys {
            let key = *key;
            self.run("type key", move |ctx| ctx.push(&[key]))?;
        }
        Ok(self)
    }

    pub fn type_times(&mut self, key: KeyCode, times: usize) -> Result<&mut Self, RobotError> {
        for _ in 0..times {
            self.type_keys(&[key])?;
        }
        Ok(self)
    }

    pub fn erase_text(&mut self, characters: usize) -> Result<&mut Self, RobotError> {
        self.type_times(KeyCode::BackSpace, characters)
    }

    /// Type `text` one character at a time using the toolkit's key mapping.
    #[instrument(level = "debug", skip(self, text), fields(len = text.chars().count()))]
    pub fn write(&mut self, text: &str) -> Result<&mut Self, RobotError> {
        for character in text.chars() {
            self.write_char(character)?;
        }
        Ok(self)
    }

    pub fn write_char(&mut self, character: char) -> Result<&mut Self, RobotError> {
        self.run("write char", move |ctx| {
            match ctx.toolkit.key_strokes_for(character) {
                Some(combination) => ctx.push(&combination.keys()),
                None => {
                    debug!("No key mapping for {:?}, sending it directly", character);
                    ctx.toolkit.input_char(character)
                }
            }
        })?;
        Ok(self)
    }

    // ------------------------------------------------------------------
    // Scrolling and waiting
    // ------------------------------------------------------------------

    pub fn scroll(
        &mut self,
        amount: u32,
        direction: VerticalDirection,
    ) -> Result<&mut Self, RobotError> {
        self.run("scroll", move |ctx| {
            for _ in 0..amount {
                ctx.toolkit.scroll(direction)?;
            }
            Ok(())
        })?;
        Ok(self)
    }

    pub fn scroll_once(&mut self, direction: VerticalDirection) -> Result<&mut Self, RobotError> {
        self.scroll(1, direction)
    }

    /// Block the calling thread; the UI thread keeps running.
    pub fn sleep(&mut self, duration: Duration) -> &mut Self {
        debug!("Sleeping for {:?}", duration);
        std::thread::sleep(duration);
        self
    }

    pub fn sleep_ms(&mut self, milliseconds: u64) -> &mut Self {
        self.sleep(Duration::from_millis(milliseconds))
    }
}
