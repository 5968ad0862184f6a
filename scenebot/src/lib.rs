//! Test robot for scene-graph desktop UIs
//!
//! This crate drives a GUI toolkit from test code the way a user would:
//! it finds nodes by CSS selector, label or predicate, turns them into
//! screen points, and synthesizes mouse and keyboard input on the toolkit's
//! UI thread. Toolkits plug in through [`platforms::Toolkit`]; an in-memory
//! implementation lives in [`platforms::headless`].

pub mod config;
pub mod errors;
pub mod keymap;
pub mod node;
pub mod node_finder;
pub mod platforms;
pub mod point;
pub mod robot;
pub mod selector;
pub mod service;
#[cfg(test)]
mod tests;
pub mod types;
pub mod window_finder;

pub use config::RobotConfig;
pub use errors::RobotError;
pub use node::{Node, NodeKind, Scene, SerializableNode, Window};
pub use node_finder::NodeFinder;
pub use platforms::headless::{
    HeadlessNode, HeadlessScene, HeadlessToolkit, HeadlessWindow, InputEvent,
};
pub use platforms::Toolkit;
pub use point::{PointLocator, PointQuery, Target};
pub use robot::{Robot, RobotState};
pub use selector::{NodeMatcher, NodePredicate, NodeQuery, NodeSet};
pub use service::{ToolkitService, UiHandle, UiThread};
pub use types::{Bounds, KeyCode, KeyCombination, MouseButton, Point, Pos, VerticalDirection};
pub use window_finder::{WindowFinder, WindowQuery};
