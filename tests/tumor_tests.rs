use biosim_common::{Bounds, Hue, TumorParams, Vec2};
use biosim_engine::tumor::migrate_towards;
use biosim_engine::{EngineError, FrameEngine, TumorEngine};

const DT: f32 = 0.016;

fn engine_with(params: TumorParams, seed: u64) -> TumorEngine {
    let mut engine = TumorEngine::new(params, seed);
    engine.initialize(Bounds::new(390.0, 844.0)).unwrap();
    engine
}

#[test]
fn use_before_initialize_is_an_error() {
    let mut engine = TumorEngine::new(TumorParams::default(), 1);
    assert!(!engine.is_initialized());
    assert_eq!(
        engine.step(DT),
        Err(EngineError::NotInitialized { engine: "tumor" })
    );
    assert!(engine.snapshot().is_err());
    assert!(engine.immune_positions().is_err());
}

#[test]
fn populations_match_configured_counts_and_ranges() {
    let engine = engine_with(TumorParams::default(), 7);
    let snap = engine.snapshot().unwrap();
    let center = Vec2::new(195.0, 422.0);

    assert_eq!(snap.cells.len(), 80);
    assert_eq!(snap.vessels.len(), 15);
    assert_eq!(snap.immune_cells.len(), 25);

    for cell in &snap.cells {
        assert!(cell.position.distance(center) <= 120.0 + 1e-3);
        assert!(cell.size >= 20.0 && cell.size <= 35.0);
        assert!(cell.health >= 0.7 && cell.health <= 1.0);
        assert!(matches!(cell.hue, Hue::Red | Hue::Pink | Hue::Orange));
    }
    for vessel in &snap.vessels {
        assert_eq!(vessel.points.len(), 21);
        let start = vessel.points[0].distance(center);
        assert!(start >= 150.0 - 1e-3 && start <= 200.0 + 1e-3);
        for pair in vessel.points.windows(2) {
            let step = pair[0].distance(pair[1]);
            assert!(step >= 10.0 - 1e-3 && step <= 25.0 + 1e-3);
        }
        assert!(vessel.width >= 2.0 && vessel.width <= 4.0);
        assert!(vessel.opacity >= 0.6 && vessel.opacity <= 1.0);
    }
    for immune in &snap.immune_cells {
        let r = immune.position.distance(center);
        assert!(r >= 180.0 - 1e-3 && r <= 250.0 + 1e-3);
        assert!(immune.trail.is_empty());
    }
}

#[test]
fn immune_cells_converge_then_hold_position() {
    let params = TumorParams {
        immune_radius: [200.0, 200.0],
        ..TumorParams::default()
    };
    let mut engine = engine_with(params, 3);
    let center = Vec2::new(195.0, 422.0);

    let mut last: Vec<f32> = engine
        .immune_positions()
        .unwrap()
        .iter()
        .map(|p| p.distance(center))
        .collect();
    for _ in 0..300 {
        engine.step(DT).unwrap();
        let now: Vec<f32> = engine
            .immune_positions()
            .unwrap()
            .iter()
            .map(|p| p.distance(center))
            .collect();
        for (before, after) in last.iter().zip(&now) {
            assert!(after <= &(before + 1e-3), "immune cell moved away from the tumor");
        }
        last = now;
    }
    assert!(last.iter().all(|&d| d <= 50.0 + 1e-3));

    let parked = engine.immune_positions().unwrap();
    for _ in 0..50 {
        engine.step(DT).unwrap();
    }
    assert_eq!(engine.immune_positions().unwrap(), parked);
}

#[test]
fn trails_keep_the_latest_fifteen_positions() {
    let mut engine = engine_with(TumorParams::default(), 5);
    let mut history: Vec<Vec<Vec2>> = Vec::new();
    for _ in 0..40 {
        engine.step(DT).unwrap();
        history.push(engine.immune_positions().unwrap());
    }

    let snap = engine.snapshot().unwrap();
    for (i, immune) in snap.immune_cells.iter().enumerate() {
        assert_eq!(immune.trail.len(), 15);
        assert_eq!(immune.trail.latest(), Some(immune.position));
        let expected: Vec<Vec2> = history[25..].iter().map(|frame| frame[i]).collect();
        let actual: Vec<Vec2> = immune.trail.iter().copied().collect();
        assert_eq!(actual, expected);
    }
}

#[test]
fn metrics_follow_the_simulated_clock() {
    let mut a = engine_with(TumorParams::default(), 1);
    let mut b = engine_with(TumorParams::default(), 999);

    let initial = a.snapshot().unwrap().metrics;
    assert_eq!(initial.growth_rate.value, 2.3);
    assert_eq!(initial.vascularization.value, 68.5);
    assert_eq!(initial.immune_infiltration.value, 42.0);
    assert_eq!(initial.oxygen_level.value, 73.0);

    for _ in 0..123 {
        a.step(DT).unwrap();
        b.step(DT).unwrap();
    }
    let t = 123.0_f32 * 0.02;
    let metrics = a.snapshot().unwrap().metrics;
    assert!((metrics.growth_rate.value - (2.0 + (t * 0.5).sin() * 0.5)).abs() < 1e-4);
    assert!((metrics.vascularization.value - (65.0 + (t * 0.3).sin() * 8.0)).abs() < 1e-4);
    assert!((metrics.immune_infiltration.value - (40.0 + (t * 0.4).cos() * 6.0)).abs() < 1e-4);
    assert!((metrics.oxygen_level.value - (70.0 + (t * 0.6).sin() * 8.0)).abs() < 1e-4);
    assert!((a.elapsed() - t).abs() < 1e-5);

    // Readouts do not depend on where the cells happen to be.
    let other = b.snapshot().unwrap().metrics;
    assert_eq!(metrics.growth_rate.value, other.growth_rate.value);
    assert_eq!(metrics.oxygen_level.value, other.oxygen_level.value);
}

#[test]
fn same_seed_builds_the_same_microenvironment() {
    let mut a = engine_with(TumorParams::default(), 42);
    let mut b = engine_with(TumorParams::default(), 42);
    for _ in 0..10 {
        a.step(DT).unwrap();
        b.step(DT).unwrap();
    }
    let (sa, sb) = (a.snapshot().unwrap(), b.snapshot().unwrap());
    assert_eq!(sa.cells, sb.cells);
    assert_eq!(sa.vessels, sb.vessels);
    assert_eq!(sa.immune_cells, sb.immune_cells);
}

#[test]
fn reinitialize_resets_the_clock() {
    let mut engine = engine_with(TumorParams::default(), 2);
    for _ in 0..20 {
        engine.step(DT).unwrap();
    }
    engine.initialize(Bounds::new(390.0, 844.0)).unwrap();
    assert_eq!(engine.tick(), 0);
    assert_eq!(engine.elapsed(), 0.0);
    assert!(engine.snapshot().unwrap().immune_cells.iter().all(|c| c.trail.is_empty()));
}

#[test]
fn migration_step_is_exact() {
    let target = Vec2::new(0.0, 0.0);
    let moved = migrate_towards(Vec2::new(100.0, 0.0), target, 0.8, 50.0);
    assert!((moved.x - 99.2).abs() < 1e-5);
    assert_eq!(moved.y, 0.0);

    let inside = Vec2::new(30.0, 40.0);
    assert_eq!(migrate_towards(inside, target, 0.8, 50.0), inside);
}
