//! Tumor microenvironment: a static tumor mass fed by random-walk vessels,
//! with immune cells migrating in from the periphery.

use crate::engine::{check_bounds, uniform, FrameEngine};
use crate::error::EngineError;
use biosim_common::{
    polar, BloodVessel, Bounds, Hue, ImmuneCell, SmoothedMetric, TrailBuffer, TumorCell,
    TumorMetrics, TumorParams, TumorSnapshot, Vec2,
};
use log::{debug, trace};
use rand::distr::Uniform;
use rand::prelude::*;

const TUMOR_HUES: [Hue; 3] = [Hue::Red, Hue::Pink, Hue::Orange];

// Values shown before the first tick.
const INITIAL_GROWTH_RATE: f32 = 2.3;
const INITIAL_VASCULARIZATION: f32 = 68.5;
const INITIAL_IMMUNE_INFILTRATION: f32 = 42.0;
const INITIAL_OXYGEN_LEVEL: f32 = 73.0;

/// Aggregate readouts. These are sinusoids of the simulated clock only and
/// take no input from the cell populations.
#[derive(Debug, Clone)]
struct TumorMetricSet {
    growth_rate: SmoothedMetric,
    vascularization: SmoothedMetric,
    immune_infiltration: SmoothedMetric,
    oxygen_level: SmoothedMetric,
}

impl TumorMetricSet {
    fn new(time_constant: f32) -> Self {
        TumorMetricSet {
            growth_rate: SmoothedMetric::new(INITIAL_GROWTH_RATE, time_constant),
            vascularization: SmoothedMetric::new(INITIAL_VASCULARIZATION, time_constant),
            immune_infiltration: SmoothedMetric::new(INITIAL_IMMUNE_INFILTRATION, time_constant),
            oxygen_level: SmoothedMetric::new(INITIAL_OXYGEN_LEVEL, time_constant),
        }
    }

    fn update(&mut self, t: f32, dt: f32) {
        self.growth_rate.update(2.0 + (t * 0.5).sin() * 0.5, dt);
        self.vascularization.update(65.0 + (t * 0.3).sin() * 8.0, dt);
        self.immune_infiltration.update(40.0 + (t * 0.4).cos() * 6.0, dt);
        self.oxygen_level.update(70.0 + (t * 0.6).sin() * 8.0, dt);
    }

    fn readings(&self) -> TumorMetrics {
        TumorMetrics {
            growth_rate: self.growth_rate.reading(),
            vascularization: self.vascularization.reading(),
            immune_infiltration: self.immune_infiltration.reading(),
            oxygen_level: self.oxygen_level.reading(),
        }
    }
}

#[derive(Debug, Clone)]
struct TumorState {
    bounds: Bounds,
    center: Vec2,
    cells: Vec<TumorCell>,
    vessels: Vec<BloodVessel>,
    immune_cells: Vec<ImmuneCell>,
    tick: u64,
    metrics: TumorMetricSet,
}

pub struct TumorEngine {
    params: TumorParams,
    rng: StdRng,
    state: Option<TumorState>,
}

impl TumorEngine {
    pub const NAME: &'static str = "tumor";

    pub fn new(params: TumorParams, seed: u64) -> Self {
        TumorEngine {
            params,
            rng: StdRng::seed_from_u64(seed),
            state: None,
        }
    }

    pub fn params(&self) -> &TumorParams {
        &self.params
    }

    /// Simulated clock: `tick * clock_increment`.
    pub fn elapsed(&self) -> f32 {
        self.state
            .as_ref()
            .map_or(0.0, |s| s.tick as f32 * self.params.clock_increment)
    }

    /// Current immune cell positions, in creation order.
    pub fn immune_positions(&self) -> Result<Vec<Vec2>, EngineError> {
        let state = self.state()?;
        Ok(state.immune_cells.iter().map(|c| c.position).collect())
    }

    fn state(&self) -> Result<&TumorState, EngineError> {
        self.state.as_ref().ok_or(EngineError::NotInitialized { engine: Self::NAME })
    }
}

impl FrameEngine for TumorEngine {
    type Snapshot = TumorSnapshot;

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn initialize(&mut self, bounds: Bounds) -> Result<(), EngineError> {
        check_bounds(bounds)?;
        self.params.validate()?;
        let center = bounds.center();

        let cells = place_tumor_cells(&self.params, center, &mut self.rng)?;
        let vessels = grow_vessels(&self.params, center, &mut self.rng)?;
        let immune_cells = place_immune_cells(&self.params, center, &mut self.rng)?;
        debug!(
            "Tumor initialized in {}x{}: {} cells, {} vessels, {} immune cells.",
            bounds.width,
            bounds.height,
            cells.len(),
            vessels.len(),
            immune_cells.len()
        );

        self.state = Some(TumorState {
            bounds,
            center,
            cells,
            vessels,
            immune_cells,
            tick: 0,
            metrics: TumorMetricSet::new(self.params.metric_time_constant),
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
        let t = state.tick as f32 * params.clock_increment;

        for immune in state.immune_cells.iter_mut() {
            immune.position = migrate_towards(
                immune.position,
                state.center,
                params.immune_speed,
                params.patrol_radius,
            );
            immune.trail.push(immune.position);
        }

        state.metrics.update(t, dt);
        trace!("Tumor tick {} (t = {:.2}).", state.tick, t);
        Ok(())
    }

    fn snapshot(&self) -> Result<TumorSnapshot, EngineError> {
        let state = self.state()?;
        Ok(TumorSnapshot {
            tick: state.tick,
            elapsed: self.elapsed(),
            bounds: state.bounds,
            cells: state.cells.clone(),
            vessels: state.vessels.clone(),
            immune_cells: state.immune_cells.clone(),
            metrics: state.metrics.readings(),
        })
    }

    fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    fn tick(&self) -> u64 {
        self.state.as_ref().map_or(0, |s| s.tick)
    }
}

/// One migration step: move `speed` towards `target` unless already within
/// `patrol_radius` of it.
pub fn migrate_towards(position: Vec2, target: Vec2, speed: f32, patrol_radius: f32) -> Vec2 {
    let offset = target - position;
    if offset.length() > patrol_radius {
        position + offset.normalize_or_zero() * speed
    } else {
        position
    }
}

fn full_turn() -> Result<Uniform<f32>, EngineError> {
    uniform([0.0, std::f32::consts::TAU])
}

fn place_tumor_cells(
    params: &TumorParams,
    center: Vec2,
    rng: &mut StdRng,
) -> Result<Vec<TumorCell>, EngineError> {
    let angle_dist = full_turn()?;
    let radius_dist = uniform(params.cell_radius)?;
    let size_dist = uniform(params.cell_size)?;
    let health_dist = uniform(params.cell_health)?;
    let hue_dist = Uniform::new(0, TUMOR_HUES.len())?;

    let cells = (0..params.cell_count)
        .map(|i| TumorCell {
            id: i as u32,
            position: polar(center, rng.sample(&angle_dist), rng.sample(&radius_dist)),
            size: rng.sample(&size_dist),
            hue: TUMOR_HUES[rng.sample(&hue_dist)],
            health: rng.sample(&health_dist),
        })
        .collect();
    Ok(cells)
}

/// Each vessel starts on a ring around the tumor and random-walks inwards:
/// every segment heads at the bearing to the center, jittered.
fn grow_vessels(
    params: &TumorParams,
    center: Vec2,
    rng: &mut StdRng,
) -> Result<Vec<BloodVessel>, EngineError> {
    let angle_dist = full_turn()?;
    let start_dist = uniform(params.vessel_start_radius)?;
    let jitter_dist = uniform([-params.vessel_heading_jitter, params.vessel_heading_jitter])?;
    let step_dist = uniform(params.vessel_step)?;
    let width_dist = uniform(params.vessel_width)?;
    let opacity_dist = uniform(params.vessel_opacity)?;

    let mut vessels = Vec::with_capacity(params.vessel_count);
    for i in 0..params.vessel_count {
        let mut current = polar(center, rng.sample(&angle_dist), rng.sample(&start_dist));
        let mut points = Vec::with_capacity(params.vessel_segments + 1);
        points.push(current);

        for _ in 0..params.vessel_segments {
            let heading = current.bearing_to(center) + rng.sample(&jitter_dist);
            current = polar(current, heading, rng.sample(&step_dist));
            points.push(current);
        }

        vessels.push(BloodVessel {
            id: i as u32,
            points,
            width: rng.sample(&width_dist),
            opacity: rng.sample(&opacity_dist),
        });
    }
    Ok(vessels)
}

fn place_immune_cells(
    params: &TumorParams,
    center: Vec2,
    rng: &mut StdRng,
) -> Result<Vec<ImmuneCell>, EngineError> {
    let angle_dist = full_turn()?;
    let radius_dist = uniform(params.immune_radius)?;
    let size_dist = uniform(params.immune_size)?;
    let activity_dist = uniform(params.immune_activity)?;

    let immune_cells = (0..params.immune_count)
        .map(|i| ImmuneCell {
            id: i as u32,
            position: polar(center, rng.sample(&angle_dist), rng.sample(&radius_dist)),
            size: rng.sample(&size_dist),
            activity: rng.sample(&activity_dist),
            trail: TrailBuffer::with_capacity(params.trail_capacity),
        })
        .collect();
    Ok(immune_cells)
}
