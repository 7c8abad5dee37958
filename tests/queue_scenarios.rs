//! Batch sequencing scenarios against the in-memory host

use scene_render_queue::{
    BatchOutcome, CollectingReporter, HostEvent, InMemoryHost, OperatorStatus, QueueConfig, QueueState,
    RenderBatchRequest, RenderHost, RenderQueueController, RenderScenesToSlots, SceneId, SceneSelection,
};
use std::sync::Arc;

fn id(name: &str) -> SceneId {
    SceneId::from(name)
}

fn controller() -> (RenderQueueController, Arc<CollectingReporter>) {
    let reporter = Arc::new(CollectingReporter::new());
    (RenderQueueController::new(QueueConfig::default(), reporter.clone()), reporter)
}

/// Let the host finish renders one at a time until nothing is pending
fn run_to_end(host: &mut InMemoryHost, ctl: &mut RenderQueueController) {
    while host.complete_next().is_some() {
        ctl.process_events(host).expect("completion handling failed");
    }
}

#[test]
fn two_scenes_then_back_to_original() {
    let mut host = InMemoryHost::new(["A", "B", "C"]).with_active("C");
    let (mut ctl, _) = controller();

    ctl.start(&mut host, RenderBatchRequest::new(["A", "B"], "C")).unwrap();
    run_to_end(&mut host, &mut ctl);

    let subscribed = host
        .journal()
        .iter()
        .find_map(|e| match e {
            HostEvent::Subscribed(sub) => Some(*sub),
            _ => None,
        })
        .expect("controller never subscribed");

    assert_eq!(
        host.journal(),
        &[
            HostEvent::RenderResultCreated,
            HostEvent::Subscribed(subscribed),
            HostEvent::ActiveSceneChanged(id("A")),
            HostEvent::RenderRequested(id("A")),
            HostEvent::RenderFinished(id("A")),
            HostEvent::ActiveSceneChanged(id("B")),
            HostEvent::RenderRequested(id("B")),
            HostEvent::RenderFinished(id("B")),
            HostEvent::Unsubscribed(subscribed),
            HostEvent::ActiveSceneChanged(id("C")),
        ]
    );

    let rr = host.render_result().unwrap();
    assert_eq!(rr.slot("A").unwrap().image.as_ref().unwrap().scene, id("A"));
    assert_eq!(rr.slot("B").unwrap().image.as_ref().unwrap().scene, id("B"));
    assert!(rr.slot("C").is_none());
}

#[test]
fn n_scenes_give_n_renders_in_order_one_at_a_time() {
    let names = ["s0", "s1", "s2", "s3", "s4"];
    let mut host = InMemoryHost::new(names).with_active("s2");
    let (mut ctl, _) = controller();

    ctl.start(&mut host, RenderBatchRequest::new(names, "s2")).unwrap();
    while host.pending_renders() > 0 {
        // never more than one render in flight
        assert_eq!(host.pending_renders(), 1);
        host.complete_next();
        ctl.process_events(&mut host).unwrap();
    }

    let expected: Vec<SceneId> = names.iter().map(|n| id(n)).collect();
    assert_eq!(host.requested_renders(), expected);
    assert_eq!(ctl.last_outcome(), Some(&BatchOutcome::Completed { rendered: 5 }));
}

#[test]
fn original_scene_is_restored_for_any_batch_size() {
    for n in 1..=4 {
        let names: Vec<String> = (0..n).map(|i| format!("scene{}", i)).collect();
        let mut all = names.clone();
        all.push("Main".to_string());

        let mut host = InMemoryHost::new(all).with_active("Main");
        let (mut ctl, _) = controller();
        ctl.start(&mut host, RenderBatchRequest::new(names, "Main")).unwrap();
        run_to_end(&mut host, &mut ctl);

        assert_eq!(host.active_scene(), Some(id("Main")), "batch of {}", n);
        assert_eq!(host.listener_count(), 0);
        assert_eq!(ctl.state(), &QueueState::Idle);
    }
}

#[test]
fn second_batch_overwrites_the_same_slot() {
    let mut host = InMemoryHost::new(["A", "Main"]).with_active("Main");
    let (mut ctl, _) = controller();

    ctl.start(&mut host, RenderBatchRequest::new(["A"], "Main")).unwrap();
    run_to_end(&mut host, &mut ctl);
    let first = host.render_result().unwrap().slot("A").unwrap().image.clone().unwrap();
    let slots_after_first = host.render_result().unwrap().len();

    ctl.start(&mut host, RenderBatchRequest::new(["A"], "Main")).unwrap();
    run_to_end(&mut host, &mut ctl);

    let rr = host.render_result().unwrap();
    assert_eq!(rr.len(), slots_after_first);
    assert_eq!(rr.slots().iter().filter(|s| s.name.starts_with('A')).count(), 1);
    let second = rr.slot("A").unwrap().image.clone().unwrap();
    assert!(second.serial > first.serial);
    assert_ne!(second.digest(), first.digest());
}

#[test]
fn empty_selection_touches_nothing() {
    let reporter = Arc::new(CollectingReporter::new());
    let mut host = InMemoryHost::new(["A", "B"]).with_active("B");
    let mut ctl = RenderQueueController::new(QueueConfig::default(), reporter.clone());

    let mut selection = SceneSelection::new();
    selection.set("A", false);
    let status = RenderScenesToSlots::new(reporter.clone())
        .execute(&mut host, &selection, &mut ctl)
        .unwrap();

    assert_eq!(status, OperatorStatus::Cancelled);
    assert_eq!(host.scene_switches(), 0);
    assert!(host.requested_renders().is_empty());
    assert_eq!(host.active_scene(), Some(id("B")));
    assert_eq!(reporter.warnings(), vec!["No scenes selected."]);
}

#[test]
fn operator_runs_selected_scenes_in_host_order() {
    let reporter = Arc::new(CollectingReporter::new());
    let mut host = InMemoryHost::new(["Intro", "Middle", "Outro"]).with_active("Middle");
    let mut ctl = RenderQueueController::new(QueueConfig::default(), reporter.clone());

    let mut selection = SceneSelection::new();
    selection.set("Outro", true);
    selection.set("Intro", true);
    let status = RenderScenesToSlots::new(reporter.clone())
        .execute(&mut host, &selection, &mut ctl)
        .unwrap();
    assert_eq!(status, OperatorStatus::Finished);
    run_to_end(&mut host, &mut ctl);

    assert_eq!(host.requested_renders(), vec![id("Intro"), id("Outro")]);
    assert_eq!(host.active_scene(), Some(id("Middle")));
    assert_eq!(
        reporter.messages(),
        vec![
            "Starting scene render queue...",
            "Rendering scene 'Intro' (1/2)...",
            "Rendering scene 'Outro' (2/2)...",
            "Finished rendering all selected scenes",
        ]
    );
}

#[test]
fn missing_completion_leaves_queue_waiting() {
    let mut host = InMemoryHost::new(["A", "B", "C"]).with_active("C");
    let (mut ctl, _) = controller();
    host.drop_completions(true);

    ctl.start(&mut host, RenderBatchRequest::new(["A", "B"], "C")).unwrap();
    host.complete_next();
    for _ in 0..10 {
        ctl.poll(&mut host, std::time::Instant::now()).unwrap();
        host.dispatch_events();
    }

    assert_eq!(ctl.state(), &QueueState::Rendering { index: 0, total: 2 });
    assert!(ctl.subscription().is_some());
    assert_eq!(host.listener_count(), 1);
    assert_eq!(host.requested_renders(), vec![id("A")]);
    // no slot for B was ever created
    assert!(host.render_result().unwrap().slot("B").is_none());
    assert_eq!(host.active_scene(), Some(id("A")));
}

#[test]
fn existing_render_result_is_not_recreated() {
    let mut host = InMemoryHost::new(["A", "B"]).with_render_result();
    let (mut ctl, _) = controller();
    ctl.start(&mut host, RenderBatchRequest::new(["A"], "B")).unwrap();
    run_to_end(&mut host, &mut ctl);

    assert!(!host.journal().contains(&HostEvent::RenderResultCreated));
    assert_eq!(host.render_count(), 1);
}
