use emote_ngin::{
    Duration, Instant,
    pipeline::{Admission, EmotePipeline},
    settings::Settings,
};

use crate::common::test_utils::{RecordingDisposer, RecordingScene, TestEmote, at};

mod common;

fn pipeline(t0: Instant) -> EmotePipeline<TestEmote> {
    EmotePipeline::new(Settings::default(), t0).unwrap()
}

fn with_capacity(capacity: usize, t0: Instant) -> EmotePipeline<TestEmote> {
    let settings = Settings {
        capacity,
        ..Default::default()
    };
    EmotePipeline::new(settings, t0).unwrap()
}

#[test]
fn should_expire_exactly_at_lifespan() {
    let t0 = Instant::now();
    let mut pipeline = pipeline(t0);
    let mut scene = RecordingScene::default();
    let mut disposer = RecordingDisposer::default();

    pipeline.spawn(TestEmote::new("pog", 7), t0);
    assert!(pipeline.timer_tick(t0, &mut scene).is_some());

    for ms in [500, 1000, 1500] {
        pipeline.frame_tick(at(t0, ms), &mut scene, &mut disposer);
    }
    assert_eq!(pipeline.active().len(), 1);
    assert_eq!(pipeline.active()[0].emote().updates, 3);
    assert!(scene.removed.is_empty());

    pipeline.frame_tick(at(t0, 2500), &mut scene, &mut disposer);
    assert!(pipeline.active().is_empty());
    assert_eq!(scene.removed, vec!["pog"]);
    assert_eq!(disposer.disposed, vec![7]);
    assert_eq!(pipeline.references(&7), 0);
}

#[test]
fn should_expire_on_the_boundary_frame() {
    let t0 = Instant::now();
    let mut pipeline = pipeline(t0);
    let mut scene = RecordingScene::default();
    let mut disposer = RecordingDisposer::default();

    pipeline.spawn(TestEmote::new("kappa", 1), t0);
    pipeline.timer_tick(t0, &mut scene);

    pipeline.frame_tick(at(t0, 1999), &mut scene, &mut disposer);
    assert_eq!(pipeline.active().len(), 1);
    pipeline.frame_tick(at(t0, 2000), &mut scene, &mut disposer);
    assert!(pipeline.active().is_empty());
}

#[test]
fn should_drop_spawns_while_stalled() {
    let t0 = Instant::now();
    let mut pipeline = pipeline(t0);
    let mut scene = RecordingScene::default();

    assert_eq!(
        pipeline.spawn(TestEmote::new("late", 1), at(t0, 1500)),
        Admission::DroppedStale
    );
    assert_eq!(pipeline.queued_len(), 0);
    assert!(pipeline.active().is_empty());
    assert!(pipeline.timer_tick(at(t0, 1500), &mut scene).is_none());
    assert_eq!(pipeline.stats().dropped_stale, 1);
}

#[test]
fn stall_threshold_is_strict() {
    let t0 = Instant::now();
    let mut pipeline = pipeline(t0);
    assert!(!pipeline.is_stale(at(t0, 1000)));
    assert!(pipeline.is_stale(at(t0, 1001)));
    assert_eq!(
        pipeline.spawn(TestEmote::new("ok", 1), at(t0, 1000)),
        Admission::Queued
    );
}

#[test]
fn frames_should_clear_the_stall() {
    let t0 = Instant::now();
    let mut pipeline = pipeline(t0);
    let mut scene = RecordingScene::default();
    let mut disposer = RecordingDisposer::default();

    pipeline.frame_tick(at(t0, 5000), &mut scene, &mut disposer);
    assert_eq!(
        pipeline.spawn(TestEmote::new("back", 1), at(t0, 5100)),
        Admission::Queued
    );
}

#[test]
fn should_admit_one_emote_per_tick_in_arrival_order() {
    let t0 = Instant::now();
    let mut pipeline = pipeline(t0);
    let mut scene = RecordingScene::default();

    for (name, key) in [("a", 1), ("b", 2), ("c", 3)] {
        pipeline.spawn(TestEmote::new(name, key), t0);
    }
    assert_eq!(pipeline.timer_tick(at(t0, 500), &mut scene).map(|e| e.name), Some("a"));
    assert_eq!(pipeline.active().len(), 1);
    assert_eq!(pipeline.queued_len(), 2);

    assert_eq!(pipeline.timer_tick(at(t0, 1000), &mut scene).map(|e| e.name), Some("b"));
    assert_eq!(pipeline.timer_tick(at(t0, 1500), &mut scene).map(|e| e.name), Some("c"));
    assert!(pipeline.timer_tick(at(t0, 2000), &mut scene).is_none());

    assert_eq!(scene.added, vec!["a", "b", "c"]);
    assert_eq!(pipeline.active()[1].admitted_at(), at(t0, 1000));
    assert_eq!(pipeline.stats().admitted, 3);
}

#[test]
fn shared_texture_is_disposed_once_by_the_last_user() {
    let t0 = Instant::now();
    let mut pipeline = pipeline(t0);
    let mut scene = RecordingScene::default();
    let mut disposer = RecordingDisposer::default();

    pipeline.spawn(TestEmote::with_lifespan("first", 9, Duration::from_millis(600)), t0);
    pipeline.spawn(TestEmote::with_lifespan("second", 9, Duration::from_millis(600)), t0);
    pipeline.spawn(TestEmote::with_lifespan("other", 4, Duration::from_millis(600)), t0);
    pipeline.timer_tick(t0, &mut scene);
    pipeline.frame_tick(at(t0, 200), &mut scene, &mut disposer);
    pipeline.timer_tick(at(t0, 500), &mut scene);
    pipeline.timer_tick(at(t0, 500), &mut scene);
    assert_eq!(pipeline.references(&9), 2);
    assert_eq!(pipeline.live_textures(), 2);

    // "first" expires, "second" still holds texture 9
    pipeline.frame_tick(at(t0, 700), &mut scene, &mut disposer);
    assert_eq!(scene.removed, vec!["first"]);
    assert_eq!(pipeline.references(&9), 1);
    assert!(disposer.disposed.is_empty());

    pipeline.frame_tick(at(t0, 1100), &mut scene, &mut disposer);
    assert_eq!(disposer.times(9), 1);
    assert_eq!(disposer.times(4), 1);

    for ms in [1200, 1400, 5000] {
        pipeline.frame_tick(at(t0, ms), &mut scene, &mut disposer);
    }
    assert_eq!(disposer.disposed.len(), 2);
    assert_eq!(pipeline.stats().disposed, 2);
    assert_eq!(pipeline.live_textures(), 0);
}

#[test]
fn should_remove_several_emotes_in_one_frame_without_skipping() {
    let t0 = Instant::now();
    let mut pipeline = pipeline(t0);
    let mut scene = RecordingScene::default();
    let mut disposer = RecordingDisposer::default();

    let lifespans = [("a", 100), ("b", 5000), ("c", 100), ("d", 100), ("e", 5000)];
    for (key, (name, lifespan)) in lifespans.into_iter().enumerate() {
        pipeline.spawn(
            TestEmote::with_lifespan(name, key as u32, Duration::from_millis(lifespan)),
            t0,
        );
        pipeline.timer_tick(t0, &mut scene);
    }

    pipeline.frame_tick(at(t0, 200), &mut scene, &mut disposer);
    let survivors: Vec<&str> = pipeline.active().iter().map(|a| a.emote().name).collect();
    assert_eq!(survivors, vec!["b", "e"]);
    // reverse scan
    assert_eq!(scene.removed, vec!["d", "c", "a"]);
    assert!(pipeline.active().iter().all(|a| a.emote().updates == 1));
    assert_eq!(pipeline.stats().expired, 3);
}

#[test]
fn should_clamp_frame_delta() {
    let t0 = Instant::now();
    let mut pipeline = pipeline(t0);
    let mut scene = RecordingScene::default();
    let mut disposer = RecordingDisposer::default();

    pipeline.spawn(TestEmote::with_lifespan("slow", 1, Duration::from_secs(60)), t0);
    pipeline.timer_tick(t0, &mut scene);

    let dt = pipeline.frame_tick(at(t0, 16), &mut scene, &mut disposer);
    assert_eq!(dt, Duration::from_millis(16));
    // tab was in the background for a while
    let dt = pipeline.frame_tick(at(t0, 30_000), &mut scene, &mut disposer);
    assert_eq!(dt, Duration::from_secs(1));
    // clock went backwards
    let dt = pipeline.frame_tick(at(t0, 29_000), &mut scene, &mut disposer);
    assert_eq!(dt, Duration::ZERO);

    let deltas = &pipeline.active()[0].emote().deltas;
    assert_eq!(
        deltas,
        &vec![Duration::from_millis(16), Duration::from_secs(1), Duration::ZERO]
    );
}

#[test]
fn animation_bound_emotes_expire_when_their_clip_ends() {
    let t0 = Instant::now();
    let mut pipeline = pipeline(t0);
    let mut scene = RecordingScene::default();
    let mut disposer = RecordingDisposer::default();

    pipeline.spawn(TestEmote::animated("walk", 3, Duration::from_millis(1200)), t0);
    pipeline.timer_tick(t0, &mut scene);

    // each frame advances the clip by the (clamped) delta
    for ms in [400, 800, 1200] {
        pipeline.frame_tick(at(t0, ms), &mut scene, &mut disposer);
        assert_eq!(pipeline.active().len(), 1);
    }
    assert_eq!(pipeline.active()[0].emote().animation_time, Duration::from_millis(1200));

    pipeline.frame_tick(at(t0, 1210), &mut scene, &mut disposer);
    assert!(pipeline.active().is_empty());
    assert_eq!(disposer.disposed, vec![3]);
}

#[test]
fn bursts_are_cut_to_the_per_message_limit() {
    let t0 = Instant::now();
    let mut pipeline = pipeline(t0);

    let burst = (0..20).map(|key| TestEmote::new("spam", key));
    assert_eq!(pipeline.spawn_burst(burst, t0), 12);
    assert_eq!(pipeline.queued_len(), 12);
    assert_eq!(
        pipeline.queued().map(|e| e.key).collect::<Vec<_>>(),
        (0..12).collect::<Vec<u32>>()
    );
    assert_eq!(pipeline.stats().truncated, 8);
}

#[test]
fn stalled_bursts_are_dropped_whole() {
    let t0 = Instant::now();
    let mut pipeline = pipeline(t0);

    let burst = (0..5).map(|key| TestEmote::new("late", key));
    assert_eq!(pipeline.spawn_burst(burst, at(t0, 2000)), 0);
    assert_eq!(pipeline.queued_len(), 0);
    assert_eq!(pipeline.stats().dropped_stale, 5);
}

#[test]
fn overflow_discards_the_oldest_queued_emote() {
    let t0 = Instant::now();
    let mut pipeline = with_capacity(2, t0);
    let mut scene = RecordingScene::default();

    assert_eq!(pipeline.spawn(TestEmote::new("a", 1), t0), Admission::Queued);
    assert_eq!(pipeline.spawn(TestEmote::new("b", 2), t0), Admission::Queued);
    assert_eq!(pipeline.spawn(TestEmote::new("c", 3), t0), Admission::Evicted);

    assert_eq!(pipeline.timer_tick(t0, &mut scene).map(|e| e.name), Some("b"));
    assert_eq!(pipeline.timer_tick(t0, &mut scene).map(|e| e.name), Some("c"));
    // the evicted emote never took a texture reference
    assert_eq!(pipeline.references(&1), 0);
    assert_eq!(pipeline.stats().evicted, 1);
}

#[test]
fn zero_capacity_is_rejected() {
    let settings = Settings {
        capacity: 0,
        ..Default::default()
    };
    assert!(EmotePipeline::<TestEmote>::new(settings, Instant::now()).is_err());
}

#[test]
fn stats_report_current_sizes() {
    let t0 = Instant::now();
    let mut pipeline = pipeline(t0);
    let mut scene = RecordingScene::default();

    for key in 0..3 {
        pipeline.spawn(TestEmote::new("x", key), t0);
    }
    pipeline.timer_tick(t0, &mut scene);
    let stats = pipeline.stats();
    assert_eq!((stats.active, stats.queued), (1, 2));
    assert_eq!(scene.visible(), 1);
}
