use super::Fixture;
use crate::platforms::headless::{HeadlessNode, HeadlessToolkit};
use crate::{Node, NodeFinder, NodeKind, NodeMatcher, NodePredicate, RobotError};
use std::sync::Arc;

#[test]
fn test_lookup_by_css_and_label() {
    let fx = Fixture::new();
    let finder = fx.finder();

    let ok = finder.node("#ok").unwrap();
    assert_eq!(ok, Some(fx.ok.handle()));

    let primary = finder.nodes(".primary").unwrap();
    assert_eq!(primary.into_vec(), vec![fx.ok.handle()]);

    // Label queries search every window, main window first.
    let labeled = finder.nodes("OK").unwrap();
    assert_eq!(labeled.into_vec(), vec![fx.ok.handle(), fx.dialog_ok.handle()]);
}

#[test]
fn test_css_groups_are_deduplicated() {
    let fx = Fixture::new();
    let nodes = fx.finder().nodes("#ok, .primary, Button#ok").unwrap();
    assert_eq!(nodes.len(), 1);
    assert!(nodes.contains(&fx.ok.handle()));
}

#[test]
fn test_missing_node() {
    let fx = Fixture::new();
    let err = fx.finder().nodes("Missing").unwrap_err();
    assert!(matches!(err, RobotError::NoNodesFound(_)));
    assert!(err.to_string().contains("No matching nodes were found"));
}

#[test]
fn test_hidden_and_offscreen_nodes_are_not_visible() {
    let fx = Fixture::new();
    let finder = fx.finder();

    let err = finder.nodes("Cancel").unwrap_err();
    assert!(matches!(err, RobotError::NoVisibleNodesFound(_)));
    assert!(err
        .to_string()
        .contains("Matching nodes were found, but none of them are visible"));

    assert!(matches!(
        finder.nodes("Offscreen"),
        Err(RobotError::NoVisibleNodesFound(_))
    ));
    assert!(!NodeFinder::is_node_visible(&fx.offscreen.handle()));
}

#[test]
fn test_visibility_follows_ancestors() {
    let fx = Fixture::new();
    let finder = fx.finder();
    assert_eq!(finder.node("Status").unwrap(), Some(fx.status.handle()));

    fx.footer.set_visible(false);
    assert!(matches!(
        finder.nodes("Status"),
        Err(RobotError::NoVisibleNodesFound(_))
    ));
}

#[test]
fn test_no_windows() {
    let toolkit = Arc::new(HeadlessToolkit::new());
    let finder = NodeFinder::new(
        toolkit.clone(),
        Arc::new(crate::WindowFinder::new(toolkit.clone())),
    );
    assert!(matches!(finder.nodes("#ok"), Err(RobotError::NoNodesFound(_))));
}

#[test]
fn test_invalid_selector() {
    let fx = Fixture::new();
    assert!(matches!(
        fx.finder().nodes("#"),
        Err(RobotError::InvalidArgument(_))
    ));
}

#[test]
fn test_predicate_lookup_skips_other_kinds() {
    let fx = Fixture::new();
    let finder = fx.finder();
    let empty_text_input = NodePredicate::of_kind(NodeKind::TextInput, |node| {
        node.text().ok().flatten().unwrap_or_default().is_empty()
    });
    let found = finder.nodes_matching(&empty_text_input).unwrap();
    assert_eq!(found.into_vec(), vec![fx.name.handle()]);

    fx.name.set_text("Alice");
    assert!(matches!(
        finder.nodes_matching(&empty_text_input),
        Err(RobotError::NoNodesFound(_))
    ));
}

#[test]
fn test_predicate_errors_abort_lookup() {
    let fx = Fixture::new();
    let failing = NodePredicate::fallible(|_| Err(RobotError::Internal("boom".to_string())));
    assert!(matches!(
        fx.finder().nodes_matching(&failing),
        Err(RobotError::Internal(_))
    ));
}

#[test]
fn test_matcher_lookup() {
    let fx = Fixture::new();
    let footer = NodeMatcher::new("node with class footer", |item| {
        item.downcast_ref::<Node>().is_some_and(|node| {
            node.style_classes()
                .map(|classes| classes.iter().any(|c| c == "footer"))
                .unwrap_or(false)
        })
    });
    assert_eq!(
        fx.finder().node_by_matcher(&footer).unwrap(),
        Some(fx.footer.handle())
    );
}

#[test]
fn test_lookup_in_parent() {
    let fx = Fixture::new();
    let finder = fx.finder();
    let root = fx.root.handle();

    // No visibility filter and no failure on empty results.
    let hidden = finder.nodes_in("Cancel", &root).unwrap();
    assert_eq!(hidden.into_vec(), vec![fx.cancel.handle()]);
    assert!(finder.nodes_in("Missing", &root).unwrap().is_empty());

    // The parent itself takes part in the search.
    let footer = fx.footer.handle();
    let found = finder.nodes_in(".footer", &footer).unwrap();
    assert_eq!(found.into_vec(), vec![footer]);
}

#[test]
fn test_lookup_in_parent_retargets() {
    let fx = Fixture::new();
    let finder = fx.finder();
    let dialog_root = fx.dialog_ok.handle().parent().unwrap().unwrap();

    finder.nodes_in("OK", &dialog_root).unwrap();
    assert_eq!(
        finder.window_finder().target_window(),
        Some(fx.dialog.handle())
    );

    // The label lookup now starts in the dialog.
    let labeled = finder.nodes("OK").unwrap();
    assert_eq!(labeled.first(), Some(&fx.dialog_ok.handle()));
}

#[test]
fn test_predicate_lookup_in_parent() {
    let fx = Fixture::new();
    let finder = fx.finder();
    let root = fx.root.handle();
    let buttons = NodePredicate::of_kind(NodeKind::Labeled, |node| node.type_name() == "Button");

    // The hidden Cancel button is kept.
    let found = finder.nodes_matching_in(&buttons, &root).unwrap();
    assert_eq!(found.into_vec(), vec![fx.ok.handle(), fx.cancel.handle()]);

    let nothing = NodePredicate::has_label("Missing");
    assert!(finder.nodes_matching_in(&nothing, &root).unwrap().is_empty());
}

#[test]
fn test_predicate_lookup_in_parent_retargets() {
    let fx = Fixture::new();
    let finder = fx.finder();
    let dialog_root = fx.dialog_ok.handle().parent().unwrap().unwrap();

    let found = finder
        .nodes_matching_in(&NodePredicate::has_label("OK"), &dialog_root)
        .unwrap();
    assert_eq!(found.into_vec(), vec![fx.dialog_ok.handle()]);
    assert_eq!(
        finder.window_finder().target_window(),
        Some(fx.dialog.handle())
    );
}

#[test]
fn test_lookup_in_detached_parent() {
    let fx = Fixture::new();
    let gone = HeadlessNode::pane().handle();
    assert!(!gone.is_attached());
    assert!(matches!(
        fx.finder().nodes_in("OK", &gone),
        Err(RobotError::NodeDetached(_))
    ));
}

#[test]
fn test_root_lookup() {
    let fx = Fixture::new();
    let finder = fx.finder();
    assert_eq!(finder.root_of_title("^Main$").unwrap(), fx.root.handle());
    let dialog_root = finder.root_of_index(1).unwrap();
    assert_eq!(dialog_root.children().unwrap(), vec![fx.dialog_ok.handle()]);
    assert!(matches!(
        finder.root_of_index(7),
        Err(RobotError::WindowNotFound(_))
    ));
}

#[test]
fn test_tree_snapshot() {
    let fx = Fixture::new();
    let snapshot = fx.root.handle().to_serializable_tree(1);
    let json = snapshot.to_json().unwrap();
    assert!(json.contains("\"ok\""));
    assert!(json.contains("Cancel"));
    // Depth 1 stops before the footer's label.
    assert!(!json.contains("Status"));
}

#[test]
fn test_css_and_label_paths_stay_separate() {
    let fx = Fixture::new();
    let impostor = HeadlessNode::button("#ok").with_layout(10.0, 200.0, 50.0, 20.0);
    fx.root.add_child(&impostor);
    let finder = fx.finder();

    assert_eq!(finder.nodes("#ok").unwrap().into_vec(), vec![fx.ok.handle()]);
    // "Button" is a label here, not a type selector.
    assert!(matches!(
        finder.nodes("Button"),
        Err(RobotError::NoNodesFound(_))
    ));
}

#[test]
fn test_predicate_results_are_unique_across_roots() {
    let fx = Fixture::new();
    let main_scene = fx.main.scene().unwrap();
    let _mirror = fx.toolkit.open_window(
        "Mirror",
        crate::types::Bounds::new(0.0, 400.0, 400.0, 300.0),
        &main_scene,
    );
    let buttons = NodePredicate::of_kind(NodeKind::Labeled, |node| node.type_name() == "Button");
    let found = fx.finder().nodes_matching(&buttons).unwrap();
    assert_eq!(
        found.into_vec(),
        vec![fx.ok.handle(), fx.dialog_ok.handle()]
    );
}
