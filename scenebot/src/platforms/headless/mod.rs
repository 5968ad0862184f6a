//! In-memory toolkit used for tests and for driving scene graphs without a
//! display server.
//!
//! Tests build a tree out of [`HeadlessNode`]s, wrap it in a
//! [`HeadlessScene`], and show it with [`HeadlessToolkit::open_window`].
//! Synthesized input is not dispatched to nodes; it is recorded as
//! [`InputEvent`]s that tests can inspect afterwards.

mod css;
mod element;

pub use element::{HeadlessNode, HeadlessScene, HeadlessWindow};

use crate::errors::RobotError;
use crate::node::{Node, Window};
use crate::platforms::Toolkit;
use crate::types::{Bounds, KeyCode, MouseButton, Point, VerticalDirection};
use element::{HeadlessNodeHandle, WindowData};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use tracing::{debug, trace};

/// A low-level input event as seen by the toolkit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    MouseMove(Point),
    MousePress(MouseButton),
    MouseRelease(MouseButton),
    KeyPress(KeyCode),
    KeyRelease(KeyCode),
    Scroll(VerticalDirection),
    Char(char),
}

#[derive(Debug, Default)]
struct InputState {
    pointer: Point,
    buttons: Vec<MouseButton>,
    keys: Vec<KeyCode>,
    events: Vec<InputEvent>,
    /// Name of the thread that delivered the latest event
    last_thread: Option<String>,
}

#[derive(Debug, Default)]
pub struct HeadlessToolkit {
    windows: RwLock<Vec<Arc<WindowData>>>,
    input: Mutex<InputState>,
}

impl HeadlessToolkit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `scene` in a new top-level window.
    pub fn open_window(
        &self,
        title: &str,
        bounds: Bounds,
        scene: &HeadlessScene,
    ) -> HeadlessWindow {
        self.register(WindowData::new(title, bounds, scene, None))
    }

    /// Show `scene` in a new window owned by `owner`, like a dialog.
    pub fn open_owned_window(
        &self,
        title: &str,
        bounds: Bounds,
        scene: &HeadlessScene,
        owner: &HeadlessWindow,
    ) -> HeadlessWindow {
        self.register(WindowData::new(title, bounds, scene, Some(&owner.0)))
    }

    fn register(&self, window: Arc<WindowData>) -> HeadlessWindow {
        debug!("Opening headless window {}", window.id());
        self.windows_mut().push(window.clone());
        HeadlessWindow(window)
    }

    /// Remove `window` from the open windows. Handles to it stop resolving
    /// once the caller drops its `HeadlessWindow`.
    pub fn close_window(&self, window: &HeadlessWindow) {
        window.set_showing(false);
        let mut windows = self.windows_mut();
        let before = windows.len();
        windows.retain(|w| !Arc::ptr_eq(w, &window.0));
        if windows.len() < before {
            debug!("Closed headless window {}", window.0.id());
        }
    }

    /// Every event delivered so far, oldest first.
    pub fn events(&self) -> Vec<InputEvent> {
        self.input().events.clone()
    }

    pub fn clear_events(&self) {
        self.input().events.clear();
    }

    pub fn pressed_buttons(&self) -> Vec<MouseButton> {
        self.input().buttons.clone()
    }

    pub fn pressed_keys(&self) -> Vec<KeyCode> {
        self.input().keys.clone()
    }

    /// Thread that delivered the most recent event.
    pub fn last_input_thread(&self) -> Option<String> {
        self.input().last_thread.clone()
    }

    fn windows_mut(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Arc<WindowData>>> {
        self.windows
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn input(&self) -> MutexGuard<'_, InputState> {
        self.input
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, event: InputEvent) {
        trace!("Headless input: {:?}", event);
        let mut input = self.input();
        input.last_thread = std::thread::current().name().map(str::to_string);
        input.events.push(event);
    }
}

impl Toolkit for HeadlessToolkit {
    fn windows(&self) -> Vec<Window> {
        let windows = self
            .windows
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        windows.iter().map(|w| w.handle()).collect()
    }

    fn lookup_all(&self, selector: &str, root: &Node) -> Result<Vec<Node>, RobotError> {
        let selector = css::Selector::parse(selector)?;
        let handle = root
            .as_any()
            .downcast_ref::<HeadlessNodeHandle>()
            .ok_or_else(|| {
                RobotError::PlatformError(format!(
                    "{} does not belong to the headless toolkit",
                    root.describe()
                ))
            })?;
        let root = handle.data()?;
        Ok(selector
            .select_all(&root)
            .iter()
            .map(|node| node.handle())
            .collect())
    }

    fn pointer_position(&self) -> Point {
        self.input().pointer
    }

    fn move_pointer(&self, to: Point) -> Result<(), RobotError> {
        self.input().pointer = to;
        self.record(InputEvent::MouseMove(to));
        Ok(())
    }

    fn press_button(&self, button: MouseButton) -> Result<(), RobotError> {
        {
            let mut input = self.input();
            if !input.buttons.contains(&button) {
                input.buttons.push(button);
            }
        }
        self.record(InputEvent::MousePress(button));
        Ok(())
    }

    fn release_button(&self, button: MouseButton) -> Result<(), RobotError> {
        self.input().buttons.retain(|b| *b != button);
        self.record(InputEvent::MouseRelease(button));
        Ok(())
    }

    fn press_key(&self, key: KeyCode) -> Result<(), RobotError> {
        {
            let mut input = self.input();
            if !input.keys.contains(&key) {
                input.keys.push(key);
            }
        }
        self.record(InputEvent::KeyPress(key));
        Ok(())
    }

    fn release_key(&self, key: KeyCode) -> Result<(), RobotError> {
        self.input().keys.retain(|k| *k != key);
        self.record(InputEvent::KeyRelease(key));
        Ok(())
    }

    fn scroll(&self, direction: VerticalDirection) -> Result<(), RobotError> {
        self.record(InputEvent::Scroll(direction));
        Ok(())
    }

    fn input_char(&self, character: char) -> Result<(), RobotError> {
        self.record(InputEvent::Char(character));
        Ok(())
    }
}
