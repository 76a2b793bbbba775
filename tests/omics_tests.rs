use biosim_common::{Bounds, Hue, OmicsKind, OmicsParams};
use biosim_engine::omics::point_activity;
use biosim_engine::{EngineError, FrameEngine, OmicsEngine};
use std::f32::consts::TAU;

const DT: f32 = 0.016;

fn engine(seed: u64) -> OmicsEngine {
    let mut engine = OmicsEngine::new(OmicsParams::default(), seed);
    engine.initialize(Bounds::new(390.0, 844.0)).unwrap();
    engine
}

#[test]
fn snapshot_before_initialize_is_an_error() {
    let engine = OmicsEngine::new(OmicsParams::default(), 1);
    assert!(matches!(
        engine.snapshot(),
        Err(EngineError::NotInitialized { engine: "omics" })
    ));
}

#[test]
fn four_concentric_layers() {
    let snap = engine(4).snapshot().unwrap();
    let kinds: Vec<OmicsKind> = snap.layers.iter().map(|l| l.kind).collect();
    assert_eq!(kinds, OmicsKind::ALL.to_vec());

    let radii: Vec<f32> = snap.layers.iter().map(|l| l.radius).collect();
    assert_eq!(radii, vec![80.0, 130.0, 180.0, 230.0]);
    let counts: Vec<usize> = snap.layers.iter().map(|l| l.point_count).collect();
    assert_eq!(counts, vec![24, 32, 40, 48]);
    let hues: Vec<Hue> = snap.layers.iter().map(|l| l.hue).collect();
    assert_eq!(hues, vec![Hue::Blue, Hue::Cyan, Hue::Mint, Hue::Green]);

    for layer in &snap.layers {
        assert_eq!(layer.point_sizes.len(), layer.point_count);
        assert_eq!(layer.activities.len(), layer.point_count);
        assert!(layer.point_sizes.iter().all(|&s| (4.0..=10.0).contains(&s)));
        assert!(layer.activities.iter().all(|&a| (0.3..=1.0).contains(&a)));
    }
}

#[test]
fn connections_link_adjacent_layers_only() {
    let snap = engine(9).snapshot().unwrap();
    assert_eq!(snap.connections.len(), 60);
    for conn in &snap.connections {
        assert!(conn.from_layer < 3);
        assert_eq!(conn.to_layer, conn.from_layer + 1);
        assert!((0.0..=TAU).contains(&conn.from_angle));
        assert!((0.0..=TAU).contains(&conn.to_angle));
        assert!((0.3..=1.0).contains(&conn.strength));
        assert!(matches!(conn.hue, Hue::Purple | Hue::Pink | Hue::Indigo));
        assert!(snap.connection_endpoints(conn).is_some());
    }
}

#[test]
fn activity_stays_within_the_wave_band() {
    let params = OmicsParams::default();
    let mut engine = engine(12);
    for tick in 1..=1000u32 {
        engine.step(DT).unwrap();
        if tick % 97 != 0 && tick != 1000 {
            continue;
        }
        let snap = engine.snapshot().unwrap();
        let flow = tick as f32 * 0.02;
        for (l, layer) in snap.layers.iter().enumerate() {
            for (p, &activity) in layer.activities.iter().enumerate() {
                assert!(activity >= 0.4 - 1e-5 && activity <= 0.8 + 1e-5);
                assert!((activity - point_activity(&params, flow, l, p)).abs() < 1e-5);
            }
        }
    }
}

#[test]
fn rotation_leaves_stored_angles_alone() {
    let mut engine = engine(21);
    let before = engine.snapshot().unwrap();
    for _ in 0..500 {
        engine.step(DT).unwrap();
    }
    let after = engine.snapshot().unwrap();

    assert_eq!(before.connections, after.connections);
    for (a, b) in before.layers.iter().zip(&after.layers) {
        assert_eq!(a.point_sizes, b.point_sizes);
    }
    assert!((after.rotation - 500.0 * 0.003).abs() < 1e-5);
    assert!((engine.rotation() - after.rotation).abs() < f32::EPSILON);
    assert!((after.data_flow - 500.0 * 0.02).abs() < 1e-4);

    // First point of the innermost ring sits at the rotation angle.
    let p = after.point_position(0, 0).unwrap();
    let center = after.bounds.center();
    assert!((p.x - (center.x + 80.0 * after.rotation.cos())).abs() < 1e-3);
    assert!((p.y - (center.y + 80.0 * after.rotation.sin())).abs() < 1e-3);
    assert!(after.point_position(0, 24).is_none());
    assert!(after.point_position(4, 0).is_none());
}

#[test]
fn metrics_track_the_flow_clock() {
    let mut engine = engine(2);
    let initial = engine.snapshot().unwrap().metrics;
    assert_eq!(initial.integration_score.value, 87.5);
    assert_eq!(initial.active_pathway_count(), 142);
    assert_eq!(initial.correlations, 1847);

    for ticks in [1u32, 37, 250, 611] {
        while engine.tick() < ticks as u64 {
            engine.step(DT).unwrap();
        }
        let flow = ticks as f32 * 0.02;
        let metrics = engine.snapshot().unwrap().metrics;
        assert!((metrics.integration_score.value - (85.0 + (flow * 0.5).sin() * 5.0)).abs() < 1e-4);
        let expected = 135 + ((flow * 0.3).sin() * 15.0) as i32;
        assert_eq!(metrics.active_pathway_count(), expected);
        assert!((120..=150).contains(&metrics.active_pathway_count()));
        assert_eq!(metrics.correlations, 1847);
    }
}

#[test]
fn same_seed_same_network() {
    let a = engine(31).snapshot().unwrap();
    let b = engine(31).snapshot().unwrap();
    assert_eq!(a.layers, b.layers);
    assert_eq!(a.connections, b.connections);
}
