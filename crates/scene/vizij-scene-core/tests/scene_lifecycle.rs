use std::rc::Rc;

use vizij_scene::{
    config::{Asset, NameSelection, SceneHooks, SceneOptions},
    driver::ManualScheduler,
    error::{SceneError, SceneResult},
    scene::SceneView,
    scripted::{Journal, JournalEntry, ObjectKind, RenderOp, ScriptedEngine},
};
use vizij_test_fixtures::scenes;

fn fixture_loader(name: &str) -> SceneResult<Vec<u8>> {
    scenes::bytes(name).map_err(|e| SceneError::asset_load(name, e))
}

fn open(options: SceneOptions) -> (SceneView, Journal, ManualScheduler) {
    let engine = ScriptedEngine::new();
    let journal = engine.journal().clone();
    let sched = ManualScheduler::new();
    let mut loader = fixture_loader;
    let view = SceneView::new(
        Rc::new(engine),
        options,
        SceneHooks::default(),
        &mut loader,
        Box::new(sched.clone()),
    )
    .unwrap();
    (view, journal, sched)
}

fn released(kind: ObjectKind, name: &str) -> impl Fn(&JournalEntry) -> bool + '_ {
    move |e: &JournalEntry| matches!(e, JournalEntry::Released(k, n) if *k == kind && n == name)
}

fn created(kind: ObjectKind, name: &str) -> impl Fn(&JournalEntry) -> bool + '_ {
    move |e: &JournalEntry| matches!(e, JournalEntry::Created(k, n) if *k == kind && n == name)
}

#[test]
fn construction_loads_default_artboard_and_first_state_machine() {
    let (view, journal, sched) = open(SceneOptions::new("basic"));
    assert_eq!(view.instances().artboard_name(), Some("Main"));
    assert_eq!(view.instances().active_state_machines(), vec!["Idle"]);
    // A state machine is driving the artboard, so no default animation.
    assert!(view.instances().active_animations().is_empty());
    assert_eq!(journal.live(ObjectKind::StateMachine), 1);
    assert_eq!(view.available_artboards(), vec!["Main"]);
    assert_eq!(view.available_animations(), vec!["idle-loop", "wave"]);
    assert_eq!(view.available_state_machines(), vec!["Idle"]);
    assert!(!view.is_running());
    assert_eq!(sched.requested(), 0);
}

#[test]
fn construction_without_state_machines_plays_first_animation() {
    let (view, _journal, _sched) = open(SceneOptions::new("timeline"));
    assert_eq!(view.instances().active_animations(), vec!["spin"]);
    assert!(view.instances().active_state_machines().is_empty());
}

#[test]
fn explicit_selections_are_honoured() {
    let mut opts = SceneOptions::new("multi");
    opts.artboard = Some("Badge".into());
    opts.animation = Some(NameSelection::Many(vec!["pulse".into(), "ghost".into()]));
    let (view, _journal, _sched) = open(opts);
    assert_eq!(view.instances().artboard_name(), Some("Badge"));
    assert_eq!(view.instances().active_animations(), vec!["pulse"]);
}

#[test]
fn not_autoplaying_draws_one_frame() {
    let (mut view, journal, sched) = open(SceneOptions::new("basic"));
    let ops = journal.render_ops();
    assert!(ops.contains(&RenderOp::DrawArtboard("Main".into())));
    assert_eq!(ops.last(), Some(&RenderOp::Flush));
    assert!(view.take_dirty());
    assert_eq!(sched.pending(), 0);
    assert_eq!(journal.advances(ObjectKind::Artboard), 0);
}

#[test]
fn loading_a_state_machine_twice_keeps_one_instance() {
    let (mut view, journal, _sched) = open(SceneOptions::new("basic"));
    view.load_state_machine(&["Idle"]);
    view.load_state_machine(&["Idle"]);
    assert_eq!(journal.live(ObjectKind::StateMachine), 1);
    assert_eq!(view.instances().active_state_machines(), vec!["Idle"]);

    view.play_animation(&["wave"]);
    view.play_animation(&["wave"]);
    assert_eq!(journal.live(ObjectKind::Animation), 1);
}

#[test]
fn replace_releases_before_creating() {
    let (mut view, journal, _sched) = open(SceneOptions::new("basic"));
    journal.clear();
    view.load_state_machine(&["Idle"]);
    let entries = journal.entries();
    assert_eq!(
        entries,
        vec![
            JournalEntry::Released(ObjectKind::StateMachine, "Idle".into()),
            JournalEntry::Created(ObjectKind::StateMachine, "Idle".into()),
        ]
    );
}

#[test]
fn load_artboard_releases_everything_bound_to_the_old_one_first() {
    let (mut view, journal, _sched) = open(SceneOptions::new("multi"));
    view.play_animation(&["intro"]);
    assert_eq!(view.instances().active_state_machines(), vec!["Left"]);

    view.load_artboard(Some("Badge"));
    assert!(view.instances().active_state_machines().is_empty());
    assert!(view.instances().active_animations().is_empty());
    assert_eq!(view.instances().artboard_name(), Some("Badge"));
    assert!(view.input_names().is_empty());

    let sm = journal.position(released(ObjectKind::StateMachine, "Left")).unwrap();
    let anim = journal.position(released(ObjectKind::Animation, "intro")).unwrap();
    let old = journal.position(released(ObjectKind::Artboard, "Stage")).unwrap();
    let new = journal.position(created(ObjectKind::Artboard, "Badge")).unwrap();
    assert!(sm < old && anim < old && old < new);
    assert_eq!(journal.live(ObjectKind::Artboard), 1);
}

#[test]
fn unknown_artboard_leaves_none_loaded() {
    let (mut view, journal, _sched) = open(SceneOptions::new("multi"));
    view.load_artboard(Some("Nope"));
    assert!(!view.instances().has_artboard());
    assert_eq!(journal.live(ObjectKind::Artboard), 0);
    // Everything that needs an artboard quietly does nothing.
    assert!(view.load_state_machine(&[]).is_empty());
    assert!(view.play_animation(&["intro"]).is_empty());
    assert!(view.available_animations().is_empty());
    assert_eq!(view.available_artboards(), vec!["Badge", "Stage"]);
}

#[test]
fn unload_and_stop_report_whether_something_was_active() {
    let (mut view, journal, _sched) = open(SceneOptions::new("basic"));
    assert!(view.unload_state_machine("Idle"));
    assert!(!view.unload_state_machine("Idle"));
    assert!(view.input_value("Active").is_none());

    view.play_animation(&[]);
    assert_eq!(view.instances().active_animations(), vec!["idle-loop"]);
    assert!(view.stop_animation("idle-loop"));
    assert!(!view.stop_animation("idle-loop"));
    assert_eq!(journal.live(ObjectKind::Animation), 0);
}

#[test]
fn construction_draws_once_after_instances_are_loaded() {
    let (_view, journal, _sched) = open(SceneOptions::new("basic"));
    let draws = journal
        .render_ops()
        .into_iter()
        .filter(|op| matches!(op, RenderOp::DrawArtboard(_)))
        .count();
    assert_eq!(draws, 1);
    let machine = journal.position(created(ObjectKind::StateMachine, "Idle")).unwrap();
    let draw = journal
        .position(|e: &JournalEntry| matches!(e, JournalEntry::Render(RenderOp::DrawArtboard(_))))
        .unwrap();
    assert!(machine < draw);

    let (_view, journal, _sched) = open(SceneOptions {
        auto_play: true,
        ..SceneOptions::new("basic")
    });
    assert!(!journal
        .render_ops()
        .iter()
        .any(|op| matches!(op, RenderOp::DrawArtboard(_))));
}

#[test]
fn offset_content_gets_a_frame_of_its_own_size() {
    let (view, _journal, _sched) = open(SceneOptions::new("timeline"));
    assert_eq!((view.surface().width(), view.surface().height()), (100, 100));
    let aligned = view.layout().aligned;
    assert_eq!((aligned.scale_x, aligned.scale_y), (1.0, 1.0));
    assert_eq!(aligned.apply(-50.0, -50.0), (0.0, 0.0));
}

#[test]
fn update_size_resizes_surface_and_redraws_when_stopped() {
    let (mut view, journal, _sched) = open(SceneOptions::new("basic"));
    assert_eq!((view.surface().width(), view.surface().height()), (100, 50));

    journal.clear();
    view.set_max_width(200.0);
    assert_eq!((view.surface().width(), view.surface().height()), (200, 50));
    let ops = journal.render_ops();
    assert_eq!(ops[0], RenderOp::Resize(200, 50));
    assert!(ops.contains(&RenderOp::Flush));

    view.set_fit(vizij_scene::Fit::Fill);
    let aligned = view.layout().aligned;
    assert_eq!((aligned.scale_x, aligned.scale_y), (2.0, 1.0));
    assert_eq!(view.fit(), vizij_scene::Fit::Fill);
    assert_eq!(view.max_width(), 200.0);
}

#[test]
fn destroy_releases_in_dependency_order_once() {
    let (mut view, journal, sched) = open(SceneOptions {
        auto_play: true,
        ..SceneOptions::new("basic")
    });
    view.play_animation(&["wave"]);
    assert_eq!(sched.pending(), 1);

    view.destroy();
    assert_eq!(sched.pending(), 0);
    assert!(view.is_destroyed());
    assert!(!view.is_running());

    let sm = journal.position(released(ObjectKind::StateMachine, "Idle")).unwrap();
    let anim = journal.position(released(ObjectKind::Animation, "wave")).unwrap();
    let artboard = journal.position(released(ObjectKind::Artboard, "Main")).unwrap();
    let renderer = journal.position(released(ObjectKind::Renderer, "renderer")).unwrap();
    let scene = journal.position(released(ObjectKind::Scene, "scene")).unwrap();
    assert!(sm < anim && anim < artboard && artboard < renderer && renderer < scene);

    let len = journal.len();
    view.destroy();
    view.enable();
    view.tick(100.0);
    assert_eq!(journal.len(), len);
    assert_eq!(sched.pending(), 0);
    drop(view);
    assert_eq!(journal.len(), len);
}

#[test]
fn dropping_the_view_tears_everything_down() {
    let (view, journal, _sched) = open(SceneOptions::new("multi"));
    drop(view);
    for kind in [
        ObjectKind::Scene,
        ObjectKind::Artboard,
        ObjectKind::Animation,
        ObjectKind::StateMachine,
        ObjectKind::Renderer,
    ] {
        assert_eq!(journal.live(kind), 0, "{kind:?} still live");
    }
}

#[test]
fn asset_failures_propagate() {
    let mut failing = |name: &str| -> SceneResult<Vec<u8>> { Err(SceneError::asset_load(name, "404")) };
    let err = SceneView::new(
        Rc::new(ScriptedEngine::new()),
        SceneOptions::new("hero.riv"),
        SceneHooks::default(),
        &mut failing,
        Box::new(ManualScheduler::new()),
    )
    .err()
    .unwrap();
    assert!(matches!(err, SceneError::AssetLoad { .. }));

    let mut unused = fixture_loader;
    let err = SceneView::new(
        Rc::new(ScriptedEngine::new()),
        SceneOptions::new(Asset::Bytes(b"{ not json".to_vec())),
        SceneHooks::default(),
        &mut unused,
        Box::new(ManualScheduler::new()),
    )
    .err()
    .unwrap();
    assert!(matches!(err, SceneError::SceneParse(_)));
}

#[test]
fn on_ready_runs_once_after_initial_load() {
    let seen = Rc::new(std::cell::Cell::new(0));
    let seen_in_hook = Rc::clone(&seen);
    let hooks = SceneHooks::default().on_ready(move |_engine| seen_in_hook.set(seen_in_hook.get() + 1));
    let mut loader = fixture_loader;
    let _view = SceneView::new(
        Rc::new(ScriptedEngine::new()),
        SceneOptions::new("basic"),
        hooks,
        &mut loader,
        Box::new(ManualScheduler::new()),
    )
    .unwrap();
    assert_eq!(seen.get(), 1);
}
