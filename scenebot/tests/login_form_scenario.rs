//! Drives a small login form end to end through the public API.

use scenebot::{
    Bounds, HeadlessNode, HeadlessScene, InputEvent, KeyCode, MouseButton, NodeKind,
    NodePredicate, Point, Pos, Robot, RobotError,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn test_login_flow() -> anyhow::Result<()> {
    init_tracing();
    let (mut robot, toolkit) = Robot::headless()?;

    let user = HeadlessNode::text_field("")
        .with_id("user")
        .with_layout(20.0, 20.0, 160.0, 24.0);
    let login = HeadlessNode::button("Log in")
        .with_id("login")
        .with_class("default")
        .with_layout(20.0, 60.0, 80.0, 30.0);
    let busy = HeadlessNode::label("Working...")
        .with_layout(20.0, 100.0, 80.0, 20.0)
        .hidden();
    let root = HeadlessNode::pane()
        .with_layout(0.0, 0.0, 300.0, 200.0)
        .with_children(&[&user, &login, &busy]);
    let window = toolkit.open_window(
        "Login",
        Bounds::new(100.0, 50.0, 300.0, 200.0),
        &HeadlessScene::new(&root, 300.0, 200.0),
    );

    robot
        .click_on("#user", &[])?
        .write("ab")?
        .push(&[KeyCode::Control, KeyCode::A])?
        .click_on("Log in", &[])?;

    let events = toolkit.events();
    assert_eq!(events[0], InputEvent::MouseMove(Point::new(200.0, 82.0)));
    assert_eq!(
        events.last(),
        Some(&InputEvent::MouseRelease(MouseButton::Primary))
    );
    assert!(events.contains(&InputEvent::MouseMove(Point::new(160.0, 125.0))));

    // The busy label exists but is hidden.
    let err = robot.lookup("Working...").unwrap_err();
    assert!(matches!(err, RobotError::NoVisibleNodesFound(_)));
    busy.set_visible(true);
    assert_eq!(robot.lookup("Working...")?.len(), 1);

    let text_inputs =
        robot.lookup_matching(NodePredicate::of_kind(NodeKind::TextInput, |_| true))?;
    assert_eq!(text_inputs.into_vec(), vec![user.handle()]);

    let corner =
        robot.query_point(&robot.point_for(window.handle()).at_position(Pos::BottomRight))?;
    assert_eq!(corner, Point::new(400.0, 250.0));

    toolkit.close_window(&window);
    assert!(matches!(
        robot.click_on("#login", &[]).err(),
        Some(RobotError::TargetNotFound { .. })
    ));
    Ok(())
}
