mod node_finder_tests;
mod service_tests;

use crate::platforms::headless::{HeadlessNode, HeadlessScene, HeadlessToolkit, HeadlessWindow};
use crate::types::Bounds;
use crate::{NodeFinder, Robot, WindowFinder};
use std::sync::Arc;

// Initialize tracing for tests
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()))
        .with_target(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_test_writer()
        .try_init();
}

/// A small application: a main window with a form, and an owned dialog.
///
/// Main window at screen (0, 0), 400x300:
/// - `#ok.primary` "OK" button at (10, 10) 100x50
/// - "Cancel" button at (120, 10) 80x30, hidden
/// - `#name` text field at (10, 80) 200x25
/// - `.footer` pane at (0, 250) holding a "Status" label at (5, 5) 100x20
/// - "Offscreen" label at (1000, 1000) 50x20
///
/// Dialog at screen (500, 100), 200x150, scene offset by a 20px title bar:
/// - `#dialog-ok` "OK" button at (20, 20) 60x30
pub(crate) struct Fixture {
    pub toolkit: Arc<HeadlessToolkit>,
    pub main: HeadlessWindow,
    pub dialog: HeadlessWindow,
    pub root: HeadlessNode,
    pub ok: HeadlessNode,
    pub cancel: HeadlessNode,
    pub name: HeadlessNode,
    pub footer: HeadlessNode,
    pub status: HeadlessNode,
    pub offscreen: HeadlessNode,
    pub dialog_ok: HeadlessNode,
}

impl Fixture {
    pub fn new() -> Self {
        init_tracing();
        let toolkit = Arc::new(HeadlessToolkit::new());

        let ok = HeadlessNode::button("OK")
            .with_id("ok")
            .with_class("primary")
            .with_layout(10.0, 10.0, 100.0, 50.0);
        let cancel = HeadlessNode::button("Cancel")
            .with_layout(120.0, 10.0, 80.0, 30.0)
            .hidden();
        let name = HeadlessNode::text_field("")
            .with_id("name")
            .with_layout(10.0, 80.0, 200.0, 25.0);
        let status = HeadlessNode::label("Status").with_layout(5.0, 5.0, 100.0, 20.0);
        let footer = HeadlessNode::pane()
            .with_class("footer")
            .with_layout(0.0, 250.0, 400.0, 50.0)
            .with_children(&[&status]);
        let offscreen = HeadlessNode::label("Offscreen").with_layout(1000.0, 1000.0, 50.0, 20.0);
        let root = HeadlessNode::pane()
            .with_id("main-root")
            .with_layout(0.0, 0.0, 400.0, 300.0)
            .with_children(&[&ok, &cancel, &name, &footer, &offscreen]);
        let main = toolkit.open_window(
            "Main",
            Bounds::new(0.0, 0.0, 400.0, 300.0),
            &HeadlessScene::new(&root, 400.0, 300.0),
        );

        let dialog_ok = HeadlessNode::button("OK")
            .with_id("dialog-ok")
            .with_layout(20.0, 20.0, 60.0, 30.0);
        let dialog_root = HeadlessNode::pane()
            .with_layout(0.0, 0.0, 200.0, 130.0)
            .with_children(&[&dialog_ok]);
        let dialog = toolkit.open_owned_window(
            "Confirm",
            Bounds::new(500.0, 100.0, 200.0, 150.0),
            &HeadlessScene::new(&dialog_root, 200.0, 130.0).with_offset(0.0, 20.0),
            &main,
        );

        Self {
            toolkit,
            main,
            dialog,
            root,
            ok,
            cancel,
            name,
            footer,
            status,
            offscreen,
            dialog_ok,
        }
    }

    /// Finder that runs directly on the calling thread.
    pub fn finder(&self) -> NodeFinder {
        let window_finder = Arc::new(WindowFinder::new(self.toolkit.clone()));
        NodeFinder::new(self.toolkit.clone(), window_finder)
    }

    /// Robot over this fixture's toolkit with its own UI thread.
    pub fn robot(&self) -> Robot {
        let service = Arc::new(crate::UiThread::spawn().expect("Failed to spawn UI thread"));
        Robot::new(self.toolkit.clone(), service)
    }
}
