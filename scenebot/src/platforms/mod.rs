use crate::errors::RobotError;
use crate::keymap;
use crate::node::{Node, Window};
use crate::types::{KeyCode, KeyCombination, MouseButton, Point, VerticalDirection};
use std::sync::Arc;

pub mod headless;

/// The common trait that every host toolkit binding must implement.
///
/// All methods are called on the toolkit's UI thread (see
/// [`crate::service::ToolkitService`]); implementations do not need to be
/// reentrant with respect to the rendering thread.
pub trait Toolkit: Send + Sync {
    /// Currently open windows, in the toolkit's creation order
    fn windows(&self) -> Vec<Window>;

    /// Native CSS-like selector evaluation over the subtree rooted at `root`,
    /// including `root` itself, in document order
    fn lookup_all(&self, selector: &str, root: &Node) -> Result<Vec<Node>, RobotError>;

    /// Current pointer location in screen coordinates
    fn pointer_position(&self) -> Point;

    fn move_pointer(&self, to: Point) -> Result<(), RobotError>;

    fn press_button(&self, button: MouseButton) -> Result<(), RobotError>;

    fn release_button(&self, button: MouseButton) -> Result<(), RobotError>;

    fn press_key(&self, key: KeyCode) -> Result<(), RobotError>;

    fn release_key(&self, key: KeyCode) -> Result<(), RobotError>;

    /// One scroll unit (a wheel notch) in `direction`
    fn scroll(&self, direction: VerticalDirection) -> Result<(), RobotError>;

    /// Deliver a character the key mapping cannot produce
    fn input_char(&self, character: char) -> Result<(), RobotError>;

    /// Keys needed to produce `character` on this platform's layout
    fn key_strokes_for(&self, character: char) -> Option<KeyCombination> {
        keymap::key_strokes_for(character)
    }
}

/// Create the in-memory toolkit. Real toolkit bindings construct their own
/// `Toolkit` and hand it to [`crate::Robot::new`].
pub fn create_headless_toolkit() -> Arc<headless::HeadlessToolkit> {
    Arc::new(headless::HeadlessToolkit::new())
}
