//! Multi-omics integration network: four concentric rings of data points
//! joined by links between adjacent rings, slowly rotating while a data-flow
//! wave modulates point activity.

use crate::engine::{check_bounds, uniform, FrameEngine};
use crate::error::EngineError;
use biosim_common::{
    Bounds, Hue, OmicsConnection, OmicsKind, OmicsLayer, OmicsMetrics, OmicsParams,
    OmicsSnapshot, SmoothedMetric,
};
use log::{debug, trace};
use rand::distr::Uniform;
use rand::prelude::*;

const CONNECTION_HUES: [Hue; 3] = [Hue::Purple, Hue::Pink, Hue::Indigo];

const INITIAL_INTEGRATION_SCORE: f32 = 87.5;
const INITIAL_ACTIVE_PATHWAYS: f32 = 142.0;

#[derive(Debug, Clone)]
struct OmicsState {
    bounds: Bounds,
    layers: Vec<OmicsLayer>,
    connections: Vec<OmicsConnection>,
    tick: u64,
    integration_score: SmoothedMetric,
    active_pathways: SmoothedMetric,
}

pub struct OmicsEngine {
    params: OmicsParams,
    rng: StdRng,
    state: Option<OmicsState>,
}

impl OmicsEngine {
    pub const NAME: &'static str = "omics";

    pub fn new(params: OmicsParams, seed: u64) -> Self {
        OmicsEngine {
            params,
            rng: StdRng::seed_from_u64(seed),
            state: None,
        }
    }

    pub fn params(&self) -> &OmicsParams {
        &self.params
    }

    /// Ring rotation in radians, `tick * rotation_increment`.
    pub fn rotation(&self) -> f32 {
        self.tick() as f32 * self.params.rotation_increment
    }

    /// Data-flow clock, `tick * flow_increment`.
    pub fn data_flow(&self) -> f32 {
        self.tick() as f32 * self.params.flow_increment
    }

    fn state(&self) -> Result<&OmicsState, EngineError> {
        self.state.as_ref().ok_or(EngineError::NotInitialized { engine: Self::NAME })
    }
}

/// Activity of point `point` on layer `layer` at flow time `flow`.
///
/// A pure function of indices and time, so stepping re-evaluates it from
/// scratch rather than integrating.
pub fn point_activity(params: &OmicsParams, flow: f32, layer: usize, point: usize) -> f32 {
    let phase = flow + layer as f32 * params.layer_phase + point as f32 * params.point_phase;
    params.activity_base + phase.sin() * params.activity_amplitude
}

impl FrameEngine for OmicsEngine {
    type Snapshot = OmicsSnapshot;

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn initialize(&mut self, bounds: Bounds) -> Result<(), EngineError> {
        check_bounds(bounds)?;
        self.params.validate()?;

        let layers = build_layers(&self.params, &mut self.rng)?;
        let connections = link_layers(&self.params, layers.len(), &mut self.rng)?;
        debug!(
            "Omics initialized: {} layers ({} points), {} connections.",
            layers.len(),
            layers.iter().map(|l| l.point_count).sum::<usize>(),
            connections.len()
        );

        let time_constant = self.params.metric_time_constant;
        self.state = Some(OmicsState {
            bounds,
            layers,
            connections,
            tick: 0,
            integration_score: SmoothedMetric::new(INITIAL_INTEGRATION_SCORE, time_constant),
            active_pathways: SmoothedMetric::new(INITIAL_ACTIVE_PATHWAYS, time_constant),
        });
        Ok(())
    }

    fn step(&mut self, dt: f32) -> Result<(), EngineError> {
        let params = &self.params;
        let state = self
            .state
            .as_mut()
            .ok_or(EngineError::NotInitialized { engine: Self::NAME })?;

        state.tick += 1;
        let flow = state.tick as f32 * params.flow_increment;

        for (layer_idx, layer) in state.layers.iter_mut().enumerate() {
            for (point_idx, activity) in layer.activities.iter_mut().enumerate() {
                *activity = point_activity(params, flow, layer_idx, point_idx);
            }
        }

        state.integration_score.update(85.0 + (flow * 0.5).sin() * 5.0, dt);
        // Whole pathways only; `as` truncates toward zero.
        let pathway_swing = ((flow * 0.3).sin() * 15.0) as i32;
        state.active_pathways.update((135 + pathway_swing) as f32, dt);

        trace!("Omics tick {} (flow = {:.2}).", state.tick, flow);
        Ok(())
    }

    fn snapshot(&self) -> Result<OmicsSnapshot, EngineError> {
        let state = self.state()?;
        Ok(OmicsSnapshot {
            tick: state.tick,
            bounds: state.bounds,
            rotation: self.rotation(),
            data_flow: self.data_flow(),
            layers: state.layers.clone(),
            connections: state.connections.clone(),
            metrics: OmicsMetrics {
                integration_score: state.integration_score.reading(),
                active_pathways: state.active_pathways.reading(),
                correlations: self.params.correlations,
            },
        })
    }

    fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    fn tick(&self) -> u64 {
        self.state.as_ref().map_or(0, |s| s.tick)
    }
}

fn build_layers(params: &OmicsParams, rng: &mut StdRng) -> Result<Vec<OmicsLayer>, EngineError> {
    let size_dist = uniform(params.point_size)?;
    let activity_dist = uniform(params.initial_activity)?;

    let layers = OmicsKind::ALL
        .iter()
        .enumerate()
        .map(|(i, &kind)| {
            let count = params.layer_point_counts[i];
            let mut point_sizes = Vec::with_capacity(count);
            let mut activities = Vec::with_capacity(count);
            for _ in 0..count {
                point_sizes.push(rng.sample(&size_dist));
                activities.push(rng.sample(&activity_dist));
            }
            OmicsLayer {
                kind,
                radius: params.layer_radii[i],
                hue: kind.hue(),
                point_count: count,
                point_sizes,
                activities,
            }
        })
        .collect();
    Ok(layers)
}

/// Connections always run from a ring to the next one outwards.
fn link_layers(
    params: &OmicsParams,
    layer_count: usize,
    rng: &mut StdRng,
) -> Result<Vec<OmicsConnection>, EngineError> {
    let source_dist = Uniform::new(0, layer_count - 1)?;
    let angle_dist = uniform([0.0, std::f32::consts::TAU])?;
    let strength_dist = uniform(params.connection_strength)?;
    let hue_dist = Uniform::new(0, CONNECTION_HUES.len())?;

    let connections = (0..params.connection_count)
        .map(|i| {
            let from_layer = rng.sample(&source_dist);
            OmicsConnection {
                id: i as u32,
                from_layer,
                to_layer: from_layer + 1,
                from_angle: rng.sample(&angle_dist),
                to_angle: rng.sample(&angle_dist),
                strength: rng.sample(&strength_dist),
                hue: CONNECTION_HUES[rng.sample(&hue_dist)],
            }
        })
        .collect();
    Ok(connections)
}
