use crate::errors::RobotError;
use crate::node::{Scene, Window};
use crate::platforms::Toolkit;
use regex::Regex;
use std::sync::{Arc, Mutex};
use tracing::{debug, instrument};

/// Ways to pick a window
#[derive(Debug, Clone)]
pub enum WindowQuery {
    Window(Window),
    /// Position in [`WindowFinder::list_windows`]
    Index(usize),
    /// Regular expression matched against the window title
    TitleRegex(String),
    /// The window showing this scene
    Scene(Scene),
}

impl From<Window> for WindowQuery {
    fn from(window: Window) -> Self {
        WindowQuery::Window(window)
    }
}

impl From<&Window> for WindowQuery {
    fn from(window: &Window) -> Self {
        WindowQuery::Window(window.clone())
    }
}

impl From<usize> for WindowQuery {
    fn from(index: usize) -> Self {
        WindowQuery::Index(index)
    }
}

impl From<&str> for WindowQuery {
    fn from(title_regex: &str) -> Self {
        WindowQuery::TitleRegex(title_regex.to_string())
    }
}

impl From<String> for WindowQuery {
    fn from(title_regex: String) -> Self {
        WindowQuery::TitleRegex(title_regex)
    }
}

impl From<Scene> for WindowQuery {
    fn from(scene: Scene) -> Self {
        WindowQuery::Scene(scene)
    }
}

impl From<&Scene> for WindowQuery {
    fn from(scene: &Scene) -> Self {
        WindowQuery::Scene(scene.clone())
    }
}

/// Enumerates open windows and keeps track of the target window.
///
/// Like everything that touches the live UI, call it on the UI thread.
pub struct WindowFinder {
    toolkit: Arc<dyn Toolkit>,
    target: Mutex<Option<Window>>,
}

impl WindowFinder {
    pub fn new(toolkit: Arc<dyn Toolkit>) -> Self {
        Self {
            toolkit,
            target: Mutex::new(None),
        }
    }

    /// Open, showing windows in creation order.
    pub fn list_windows(&self) -> Vec<Window> {
        self.toolkit
            .windows()
            .into_iter()
            .filter(|w| w.is_showing())
            .collect()
    }

    /// Open windows ordered by proximity to the target window: the target
    /// itself, then windows related to it by ownership, then the rest.
    /// Creation order is kept inside each group.
    pub fn list_ordered_windows(&self) -> Vec<Window> {
        let windows = self.list_windows();
        let target = match self.current_target(&windows) {
            Some(target) => target,
            None => return windows,
        };
        let mut ordered = windows;
        ordered.sort_by_key(|window| Self::proximity(window, &target));
        ordered
    }

    fn proximity(window: &Window, target: &Window) -> u8 {
        if window == target {
            0
        } else if window.is_owned_by(target) || target.is_owned_by(window) {
            1
        } else {
            2
        }
    }

    /// The current target window, if it is still open.
    pub fn target_window(&self) -> Option<Window> {
        let windows = self.list_windows();
        self.current_target(&windows)
    }

    fn current_target(&self, open: &[Window]) -> Option<Window> {
        let mut guard = match self.target.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let stale = guard.as_ref().is_some_and(|target| !open.contains(target));
        if stale {
            debug!("Target window {:?} is no longer open, resetting", *guard);
            *guard = None;
        }
        guard.as_ref().cloned()
    }

    /// Make the window selected by `query` the target for later lookups.
    #[instrument(level = "debug", skip(self, query))]
    pub fn target(&self, query: impl Into<WindowQuery>) -> Result<Window, RobotError> {
        let window = self.window(query)?;
        self.set_target(window.clone());
        Ok(window)
    }

    pub(crate) fn set_target(&self, window: Window) {
        debug!("Targeting window {:?}", window);
        let mut guard = match self.target.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Some(window);
    }

    /// Resolve `query` to an open window without changing the target.
    pub fn window(&self, query: impl Into<WindowQuery>) -> Result<Window, RobotError> {
        let windows = self.list_windows();
        match query.into() {
            WindowQuery::Window(window) => {
                if windows.contains(&window) {
                    Ok(window)
                } else {
                    Err(RobotError::WindowNotFound(format!(
                        "window {:?} is not open",
                        window
                    )))
                }
            }
            WindowQuery::Index(index) => windows.get(index).cloned().ok_or_else(|| {
                RobotError::WindowNotFound(format!(
                    "no window at index {index} ({} open)",
                    windows.len()
                ))
            }),
            WindowQuery::TitleRegex(pattern) => {
                let regex = Regex::new(&pattern).map_err(|e| {
                    RobotError::InvalidArgument(format!("Invalid title regex '{pattern}': {e}"))
                })?;
                windows
                    .into_iter()
                    .find(|w| w.title().map(|t| regex.is_match(&t)).unwrap_or(false))
                    .ok_or_else(|| {
                        RobotError::WindowNotFound(format!("no window title matches '{pattern}'"))
                    })
            }
            WindowQuery::Scene(scene) => {
                let window = scene.window()?.ok_or_else(|| {
                    RobotError::WindowNotFound(format!(
                        "scene {:?} is not shown in a window",
                        scene
                    ))
                })?;
                if windows.contains(&window) {
                    Ok(window)
                } else {
                    Err(RobotError::WindowNotFound(format!(
                        "window {:?} of scene {:?} is not open",
                        window, scene
                    )))
                }
            }
        }
    }
}
