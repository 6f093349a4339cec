#![forbid(unsafe_code)]

//! End-to-end scheduling scenarios on the headless surface.

use std::collections::BTreeSet;
use std::time::Duration;

use danmaku_core::Rgba;
use danmaku_runtime::simulator::{GlyphMetrics, HeadlessSurface, ScheduleSimulator};
use danmaku_runtime::{
    RenderHandle, RetryPolicy, Scheduler, SchedulerConfig, SchedulerError, SchedulerState, Surface,
};

const TICK: Duration = Duration::from_millis(10);

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

/// 10 px glyphs so "abcde" measures exactly 50 px.
fn ten_px_surface() -> HeadlessSurface {
    HeadlessSurface::new(1280.0, 720.0).with_metrics(GlyphMetrics {
        glyph_width: 10.0,
        line_height: 16.0,
    })
}

fn single_lane(retry: RetryPolicy) -> SchedulerConfig {
    SchedulerConfig::default()
        .with_lane_count(1)
        .with_speed(100.0)
        .with_min_gap(10.0)
        .with_spawn_interval(Duration::ZERO)
        .with_retry(retry)
}

// ============================================================================
// Clearance delay on a single lane
// ============================================================================

#[test]
fn single_lane_second_message_waits_for_clearance() {
    let mut sim = ScheduleSimulator::headless(
        ten_px_surface(),
        single_lane(RetryPolicy::FixedPoll(ms(100))),
        TICK,
    );
    sim.submit_text("abcde", Rgba::WHITE);
    sim.submit_text("fghij", Rgba::WHITE);
    assert!(sim.run_until_drained(Duration::from_secs(5)).unwrap());

    let placements = sim.placements();
    assert_eq!(placements.len(), 2);
    assert_eq!(placements[0].extent.width, 50.0);
    assert_eq!((placements[0].lane, placements[1].lane), (0, 0));

    let gap = placements[1].spawn_time - placements[0].spawn_time;
    // (50 + 10) / 100 s, discovered by a 100 ms poll on a 10 ms frame.
    assert!(gap >= ms(600), "gap {gap:?}");
    assert!(gap < ms(600) + ms(100) + TICK, "gap {gap:?}");
    assert!(sim.denials() > 0);
}

#[test]
fn exact_wake_places_at_clearance_instant() {
    let mut sim =
        ScheduleSimulator::headless(ten_px_surface(), single_lane(RetryPolicy::ExactWake), TICK);
    sim.submit_text("abcde", Rgba::WHITE);
    sim.submit_text("fghij", Rgba::WHITE);
    assert!(sim.run_until_drained(Duration::from_secs(5)).unwrap());

    let placements = sim.placements();
    assert_eq!(placements[0].spawn_time, ms(10));
    assert_eq!(placements[1].spawn_time, ms(610));
    // One denial, then a single wake at the exact instant.
    assert_eq!(sim.denials(), 1);
}

fn assert_lane_extents_disjoint(sim: &ScheduleSimulator<HeadlessSurface>) {
    let mut messages: Vec<_> = sim.scheduler().active_messages().iter().collect();
    messages.sort_by_key(|m| (m.lane(), m.spawn_time()));
    for pair in messages.windows(2) {
        let (ahead, behind) = (pair[0], pair[1]);
        if ahead.lane() != behind.lane() {
            continue;
        }
        let ahead_right = ahead.x() + ahead.extent().width;
        assert!(
            behind.x() + 1e-3 >= ahead_right,
            "lane {} overlap at {:?}: {} < {}",
            behind.lane(),
            sim.scheduler().now(),
            behind.x(),
            ahead_right
        );
    }
}

/// Place "abcde" at 100 px/s, switch to `speed`, queue "fghij" and run until
/// both have left, checking the lane after every frame.
fn run_speed_change(speed: f32) -> ScheduleSimulator<HeadlessSurface> {
    let config = single_lane(RetryPolicy::ExactWake);
    let mut sim = ScheduleSimulator::headless(ten_px_surface(), config.clone(), TICK);
    sim.submit_text("abcde", Rgba::WHITE);
    sim.step().unwrap();
    sim.scheduler_mut().apply_settings(config.with_speed(speed));
    sim.submit_text("fghij", Rgba::WHITE);
    let until = Duration::from_secs(30);
    while sim.placements().len() < 2 || !sim.scheduler().active_messages().is_empty() {
        assert!(sim.scheduler().now() < until, "messages never left");
        sim.step().unwrap();
        assert_lane_extents_disjoint(&sim);
    }
    sim
}

#[test]
fn raised_speed_never_catches_the_occupant() {
    let sim = run_speed_change(1000.0);
    let placements = sim.placements();
    assert_eq!(placements[0].speed, 100.0);
    assert_eq!(placements[1].speed, 1000.0);
    assert_eq!(placements[1].lane, 0);
    // Runway 1280 + 2 * 8: (1296 + 50) / 100 - (1296 - 10) / 1000 = 12.174 s.
    let earliest = placements[0].spawn_time + ms(12_174);
    assert!(placements[1].spawn_time >= earliest, "{:?}", placements[1].spawn_time);
    assert!(placements[1].spawn_time < earliest + TICK, "{:?}", placements[1].spawn_time);
}

#[test]
fn lowered_speed_waits_on_the_occupant_pace() {
    let sim = run_speed_change(50.0);
    let placements = sim.placements();
    assert_eq!(placements[1].speed, 50.0);
    // The occupant still moves at 100 px/s: (50 + 10) / 100 s.
    assert_eq!(placements[1].spawn_time, ms(610));
}

// ============================================================================
// Lanes fill from the top
// ============================================================================

#[test]
fn burst_fills_lanes_in_order() {
    let interval = ms(50);
    let config = SchedulerConfig::default()
        .with_lane_count(5)
        .with_speed(1000.0)
        .with_min_gap(0.0)
        .with_spawn_interval(interval);
    let mut sim = ScheduleSimulator::headless(HeadlessSurface::new(1280.0, 720.0), config, TICK);
    // 256 px at 1000 px/s keeps each lane busy for 256 ms, longer than the burst.
    let text = "x".repeat(32);
    for _ in 0..5 {
        sim.submit_text(text.as_str(), Rgba::WHITE);
    }
    assert!(sim.run_until_drained(Duration::from_secs(2)).unwrap());

    let placements = sim.placements();
    let lanes: Vec<usize> = placements.iter().map(|p| p.lane).collect();
    assert_eq!(lanes, vec![0, 1, 2, 3, 4]);
    for pair in placements.windows(2) {
        assert_eq!(pair[1].spawn_time - pair[0].spawn_time, interval);
    }
    assert_eq!(sim.denials(), 0);
}

#[test]
fn lanes_stack_downward_inside_band() {
    let config = SchedulerConfig::default()
        .with_lane_count(3)
        .with_band(10.0, 50.0)
        .with_lane_spacing(4.0)
        .with_spawn_interval(Duration::ZERO)
        .with_speed(10.0);
    let mut sim = ScheduleSimulator::headless(HeadlessSurface::new(800.0, 400.0), config, TICK);
    for _ in 0..3 {
        sim.submit_text("hello", Rgba::WHITE);
    }
    assert!(sim.run_until_drained(Duration::from_secs(1)).unwrap());
    let ys: Vec<f32> = sim.placements().iter().map(|p| p.trajectory.y).collect();
    assert_eq!(ys, vec![40.0, 60.0, 80.0]);
}

// ============================================================================
// Surface loss
// ============================================================================

#[test]
fn surface_loss_returns_every_handle_inactive() {
    let config = SchedulerConfig::default()
        .with_spawn_interval(Duration::ZERO)
        .with_speed(10.0);
    let mut sim = ScheduleSimulator::headless(HeadlessSurface::new(800.0, 600.0), config, TICK);
    for text in ["one", "two", "three"] {
        sim.submit_text(text, Rgba::WHITE);
    }
    for _ in 0..3 {
        sim.step().unwrap();
    }

    let scheduler = sim.scheduler_mut();
    assert_eq!(scheduler.active_messages().len(), 3);
    let before: BTreeSet<u64> = scheduler
        .active_messages()
        .iter()
        .map(|m| m.handle().serial())
        .chain(scheduler.pool().idle().map(|h| h.serial()))
        .collect();

    scheduler.surface_mut().destroy();
    assert_eq!(
        scheduler.tick(TICK).unwrap_err(),
        SchedulerError::SurfaceUnavailable
    );

    assert_eq!(scheduler.state(), SchedulerState::Halted);
    assert!(scheduler.active_messages().is_empty());
    let after: BTreeSet<u64> = scheduler.pool().idle().map(|h| h.serial()).collect();
    assert_eq!(after, before);
    assert!(scheduler.pool().idle().all(|h| !h.is_active()));
    assert!(scheduler.pool().idle().all(|h| h.text().is_empty()));
    assert_eq!(scheduler.stats().total_force_terminated, 3);
}

#[test]
fn reinitialize_places_backlog_without_loss() {
    let config = SchedulerConfig::default().with_spawn_interval(Duration::ZERO);
    let mut scheduler = Scheduler::new(HeadlessSurface::new(800.0, 600.0), config);
    let first = scheduler.submit_text("first", Rgba::WHITE);
    scheduler.tick(TICK).unwrap();
    scheduler.surface_mut().destroy();
    assert!(scheduler.tick(TICK).is_err());

    let queued: Vec<_> = (0..4)
        .map(|i| scheduler.submit_text(format!("queued {i}"), Rgba::WHITE))
        .collect();
    assert!(scheduler.tick(TICK).is_err());
    assert_eq!(scheduler.queue_len(), 4);

    scheduler.reinitialize(HeadlessSurface::new(800.0, 600.0));
    let mut placed = Vec::new();
    for _ in 0..10 {
        if let Some(p) = scheduler.tick(TICK).unwrap().placement {
            placed.push(p.id);
        }
    }
    assert_eq!(placed, queued);
    assert!(first < queued[0]);
}

// ============================================================================
// Degenerate settings
// ============================================================================

#[test]
fn zero_lanes_clamp_to_one_and_keep_draining() {
    let mut sim = ScheduleSimulator::headless(
        HeadlessSurface::new(800.0, 600.0),
        SchedulerConfig::default().with_spawn_interval(Duration::ZERO),
        TICK,
    );
    sim.scheduler_mut().apply_settings(
        SchedulerConfig::default()
            .with_lane_count(0)
            .with_speed(0.0)
            .with_min_gap(-3.0)
            .with_spawn_interval(Duration::ZERO),
    );
    let config = sim.scheduler().config();
    assert_eq!(config.lane_count, 1);
    assert!(config.speed_px_per_sec > 0.0);
    assert_eq!(config.min_gap_px, 0.0);

    sim.submit_text("a", Rgba::WHITE);
    sim.submit_text("b", Rgba::WHITE);
    sim.run_for(Duration::from_secs(1)).unwrap();
    assert!(sim.placements().iter().all(|p| p.lane == 0));
    // 8 px at 1 px/s: the second waits the full 8 s window, finite.
    assert!(sim.run_until_drained(Duration::from_secs(10)).unwrap());
    assert_eq!(sim.placements().len(), 2);
}

#[test]
fn band_too_small_still_has_one_lane() {
    let config = SchedulerConfig::default()
        .with_band(0.0, 1.0)
        .with_spawn_interval(Duration::ZERO);
    let mut sim = ScheduleSimulator::headless(HeadlessSurface::new(800.0, 100.0), config, TICK);
    sim.submit_text("tiny band", Rgba::WHITE);
    sim.step().unwrap();
    let placement = sim.placements()[0];
    assert_eq!(placement.active_lanes, 1);
    assert_eq!(placement.lane, 0);
}

#[test]
fn line_height_change_shrinks_active_lanes() {
    let surface = HeadlessSurface::new(800.0, 400.0);
    let config = SchedulerConfig::default()
        .with_band(0.0, 40.0)
        .with_spawn_interval(Duration::ZERO);
    let mut sim = ScheduleSimulator::headless(surface, config, TICK);
    sim.submit_text("a", Rgba::WHITE);
    sim.step().unwrap();
    // 160 px band / 16 px lines.
    assert_eq!(sim.placements()[0].active_lanes, 8);

    sim.scheduler().surface().set_metrics(GlyphMetrics {
        glyph_width: 8.0,
        line_height: 64.0,
    });
    sim.submit_text("b", Rgba::WHITE);
    sim.step().unwrap();
    assert_eq!(sim.placements()[1].active_lanes, 2);
}

#[test]
fn handles_are_recycled_under_sustained_load() {
    let config = SchedulerConfig::default()
        .with_speed(4000.0)
        .with_spawn_interval(ms(20));
    let mut sim = ScheduleSimulator::headless(HeadlessSurface::new(400.0, 300.0), config, TICK);
    for i in 0..200 {
        sim.submit_text(format!("message {i}"), Rgba::WHITE);
    }
    assert!(sim.run_until_drained(Duration::from_secs(30)).unwrap());
    sim.run_for(Duration::from_secs(1)).unwrap();

    let scheduler = sim.scheduler();
    assert!(scheduler.active_messages().is_empty());
    // Each message lives about 110 ms, so only a handful are ever in flight.
    assert!(scheduler.pool().allocated() < 20);
    assert_eq!(scheduler.surface().created() as usize, scheduler.pool().allocated());
    assert_eq!(scheduler.stats().total_despawned, 200);
}

#[test]
fn surface_size_unaffected_by_placement_attempts() {
    let mut scheduler = Scheduler::new(
        HeadlessSurface::new(320.0, 240.0),
        SchedulerConfig::default(),
    );
    scheduler.submit_text("x", Rgba::WHITE);
    scheduler.tick(TICK).unwrap();
    assert!(scheduler.surface().size().is_some());
}
