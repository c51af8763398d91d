//! End-to-end behaviour of the backdrop and the page effects

use neuroscape_scene::config::{LayerSpec, NetworkConfig};
use neuroscape_scene::dom::form::SUCCESS_MESSAGE;
use neuroscape_scene::dom::{
    DomCommand, DomEffectsController, FormFields, Observed, PageEvent, PageLayout, Target,
};
use neuroscape_scene::graph::build_edges;
use neuroscape_scene::layout::generate_layers;
use neuroscape_scene::math::Point3;
use neuroscape_scene::{FrameUpdater, HeadlessRenderer, SceneConfig, Viewport};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn submit(name: &str, email: &str, message: &str) -> PageEvent {
    PageEvent::Submit(FormFields {
        name: name.into(),
        email: email.into(),
        message: message.into(),
    })
}

fn status_text(commands: &[DomCommand]) -> Option<&str> {
    commands.iter().find_map(|c| match c {
        DomCommand::SetText {
            target: Target::FormStatus,
            text,
        } => Some(text.as_str()),
        _ => None,
    })
}

#[test]
fn five_layers_make_eighty_nodes() {
    let network = NetworkConfig::default();
    let layers = [
        LayerSpec::new(12, -20.0, 18.0),
        LayerSpec::new(16, -8.0, 20.0),
        LayerSpec::new(20, 4.0, 22.0),
        LayerSpec::new(16, 16.0, 20.0),
        LayerSpec::new(16, 28.0, 18.0),
    ];
    let mut rng = StdRng::seed_from_u64(2024);
    let points = generate_layers(&layers, &network, &mut rng);
    assert_eq!(points.len(), 80);

    let mut start = 0;
    for layer in &layers {
        for p in &points[start..start + layer.count] {
            assert!(p.x >= layer.center_x - 3.0 && p.x <= layer.center_x + 3.0);
            assert!(p.y.abs() <= layer.spread / 2.0);
            assert!(p.z >= -25.0 && p.z <= 5.0);
        }
        start += layer.count;
    }
}

#[test]
fn edge_threshold_is_strict() {
    let at = [Point3::ORIGIN, Point3::new(12.0, 0.0, 0.0)];
    assert!(build_edges(&at, 12.0).is_empty());

    let eps = 0.01;
    let inside = [Point3::ORIGIN, Point3::new(12.0 - eps, 0.0, 0.0)];
    let edges = build_edges(&inside, 12.0);
    assert_eq!(edges.len(), 1);
    assert_eq!((edges[0].from, edges[0].to), (0, 1));
    assert!((edges[0].strength - eps / 12.0).abs() < 1e-4);
}

#[test]
fn empty_name_is_refused_without_submitting() {
    let mut page = DomEffectsController::new(PageLayout::default());
    let commands = page.dispatch(0.0, &submit("", "a@b.com", "Hello"));

    assert_eq!(status_text(&commands), Some("Please fill in all fields."));
    assert!(commands.contains(&DomCommand::SetClassName {
        target: Target::FormStatus,
        class_name: "form-status error",
    }));
    assert!(!page.state().is_sending());
    assert_eq!(page.pending_timers(), 0);
}

#[test]
fn email_is_checked_then_message_is_sent() {
    let mut page = DomEffectsController::new(PageLayout::default());

    let bad = page.dispatch(0.0, &submit("Ann", "a@b", "Hello"));
    assert_eq!(status_text(&bad), Some("Please enter a valid email address."));
    assert!(!page.state().is_sending());

    let sending = page.dispatch(100.0, &submit("Ann", "a@b.com", "Hello"));
    assert_eq!(
        sending,
        vec![
            DomCommand::SetClass {
                target: Target::SubmitButton,
                class: "loading",
                enabled: true
            },
            DomCommand::SetDisabled {
                target: Target::SubmitButton,
                disabled: true
            },
        ]
    );
    assert!(page.state().is_sending());

    // a second submit while sending is dropped
    assert!(page.dispatch(200.0, &submit("Ann", "a@b.com", "Again")).is_empty());
    assert!(page.advance(1599.0).is_empty());

    let done = page.advance(1600.0);
    assert_eq!(status_text(&done), Some(SUCCESS_MESSAGE));
    assert!(done.contains(&DomCommand::ResetForm));
    assert!(done.contains(&DomCommand::SetDisabled {
        target: Target::SubmitButton,
        disabled: false
    }));
    assert!(!page.state().is_sending());

    assert!(page.advance(6599.0).is_empty());
    assert_eq!(
        page.advance(6600.0),
        vec![DomCommand::SetClassName {
            target: Target::FormStatus,
            class_name: "form-status",
        }]
    );
}

#[test]
fn typing_loop_sequence() {
    let mut page = DomEffectsController::new(PageLayout {
        phrases: vec!["AI".into(), "".into(), "ML".into()],
        ..PageLayout::default()
    });

    let mut log = Vec::new();
    let mut record = |at: f64, commands: Vec<DomCommand>| {
        for command in commands {
            if let DomCommand::SetText {
                target: Target::TypingText,
                text,
            } = command
            {
                log.push(format!("{at}ms |{text}|"));
            }
        }
    };

    record(0.0, page.dispatch(0.0, &PageEvent::Ready));
    // a second ready must not start a second loop
    record(0.0, page.dispatch(0.0, &PageEvent::Ready));
    loop {
        let Some(due) = page.next_due() else { break };
        if due > 5040.0 {
            break;
        }
        record(due, page.advance(due));
    }

    insta::assert_snapshot!(log.join("\n"), @r"
    0ms |A|
    80ms |AI|
    2080ms |A|
    2120ms ||
    2520ms |M|
    2600ms |ML|
    4600ms |M|
    4640ms ||
    5040ms |A|
    ");
}

#[test]
fn page_visibility_effects_together() {
    let mut page = DomEffectsController::new(PageLayout::default());
    let reveal = page.observe(Observed::reveal(150.0));
    let counter = page.observe(Observed::counter(40.0));

    page.dispatch(0.0, &PageEvent::Visible(reveal));
    page.dispatch(0.0, &PageEvent::Visible(counter));

    let first = page.advance(40.0);
    assert_eq!(
        first,
        vec![DomCommand::SetText {
            target: Target::Element(counter),
            text: "1".into()
        }]
    );
    let later = page.advance(160.0);
    assert!(later.contains(&DomCommand::SetClass {
        target: Target::Element(reveal),
        class: "visible",
        enabled: true
    }));
    page.advance(2000.0);
    assert_eq!(page.state().counter(counter).map(|c| c.current), Some(40.0));
}

#[test]
fn headless_run_keeps_invariants() {
    let config = SceneConfig {
        seed: Some(11),
        ..SceneConfig::default()
    };
    let mut updater = FrameUpdater::new(&config, 0.0, Viewport::default());
    let mut renderer = HeadlessRenderer::default();

    for frame in 1..=300 {
        updater.set_pointer((frame * 4) as f32, 360.0);
        updater.tick(frame as f64 / 60.0, &mut renderer);
    }

    assert_eq!(renderer.frames_rendered, 300);
    let scene = updater.scene();
    let n = scene.network.nodes.len();
    assert_eq!(n, 80);
    for edge in &scene.network.graph.edges {
        assert!(edge.from < edge.to && edge.to < n);
    }
    for signal in &updater.signals().signals {
        assert!((0.0..=1.0).contains(&signal.progress));
        assert!(signal.from < n && signal.to < n);
    }
    let summary = renderer.last.unwrap();
    assert!((summary.elapsed - 5.0).abs() < 1e-4);
    assert!(summary.camera_x > 0.0 && summary.camera_x < 3.0);
}
