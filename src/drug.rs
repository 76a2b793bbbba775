//! Drug response assay: a fixed plate of cells under a rain of drug
//! molecules. Contacts accumulate exposure, which walks each cell through
//! `healthy -> affected -> apoptotic -> dead`.
//!
//! Molecule spawning is driven separately from [`FrameEngine::step`] through
//! [`DrugResponseEngine::spawn_tick`]; callers must serialize the two (see
//! `scheduler`).

use crate::engine::{check_bounds, uniform, FrameEngine};
use crate::error::EngineError;
use biosim_common::{
    Bounds, CellCensus, CellState, DrugCell, DrugMetrics, DrugMolecule, DrugParams, DrugSnapshot,
    Point2D, SmoothedMetric, TrailBuffer, Vec2,
};
use log::{debug, info, trace, warn};
use rand::prelude::*;
use rayon::prelude::*;

#[derive(Debug, Clone)]
struct DrugMetricSet {
    survival_rate: SmoothedMetric,
    apoptosis_rate: SmoothedMetric,
    ic50: SmoothedMetric,
    efficacy: SmoothedMetric,
}

impl DrugMetricSet {
    fn new(time_constant: f32) -> Self {
        DrugMetricSet {
            survival_rate: SmoothedMetric::new(100.0, time_constant),
            apoptosis_rate: SmoothedMetric::new(0.0, time_constant),
            ic50: SmoothedMetric::new(0.0, time_constant),
            efficacy: SmoothedMetric::new(0.0, time_constant),
        }
    }
}

#[derive(Debug, Clone)]
struct DrugState {
    bounds: Bounds,
    cells: Vec<DrugCell>,
    molecules: Vec<DrugMolecule>,
    next_molecule_id: u32,
    tick: u64,
    census: CellCensus,
    metrics: DrugMetricSet,
}

pub struct DrugResponseEngine {
    params: DrugParams,
    rng: StdRng,
    state: Option<DrugState>,
    /// Set once by [`DrugResponseEngine::activate`]; survives re-initialization.
    active: bool,
    capacity_warned: bool,
}

impl DrugResponseEngine {
    pub const NAME: &'static str = "drug";

    pub fn new(params: DrugParams, seed: u64) -> Self {
        DrugResponseEngine {
            params,
            rng: StdRng::seed_from_u64(seed),
            state: None,
            active: false,
            capacity_warned: false,
        }
    }

    pub fn params(&self) -> &DrugParams {
        &self.params
    }

    /// Adds the drug. Returns `true` on the first call only; later calls are no-ops.
    pub fn activate(&mut self) -> bool {
        if self.active {
            return false;
        }
        self.active = true;
        info!("Drug added; molecule spawning enabled (cap {}).", self.params.max_molecules);
        true
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn molecule_count(&self) -> usize {
        self.state.as_ref().map_or(0, |s| s.molecules.len())
    }

    /// One firing of the periodic spawn task: releases a molecule at a random
    /// x along the top edge if the drug is active and the population is below
    /// capacity. Returns the new molecule's id, if any.
    pub fn spawn_tick(&mut self) -> Result<Option<u32>, EngineError> {
        let bounds = self.state()?.bounds;
        if !self.active {
            return Ok(None);
        }
        if self.molecule_count() >= self.params.max_molecules {
            if !self.capacity_warned {
                warn!(
                    "Molecule population at capacity ({}); spawning paused until molecules exit.",
                    self.params.max_molecules
                );
                self.capacity_warned = true;
            }
            return Ok(None);
        }

        let x_dist = uniform([0.0, bounds.width])?;
        let size_dist = uniform(self.params.molecule_size)?;
        let vx_dist = uniform(self.params.velocity_x)?;
        let vy_dist = uniform(self.params.velocity_y)?;

        let position = Point2D::new(self.rng.sample(&x_dist), self.params.spawn_y);
        let size = self.rng.sample(&size_dist);
        let velocity = Vec2::new(self.rng.sample(&vx_dist), self.rng.sample(&vy_dist));
        self.insert_molecule(position, velocity, size).map(Some)
    }

    /// Places a molecule directly. Fails with `MoleculeCapacity` when full.
    pub fn insert_molecule(
        &mut self,
        position: Point2D,
        velocity: Vec2,
        size: f32,
    ) -> Result<u32, EngineError> {
        let capacity = self.params.max_molecules;
        let trail_capacity = self.params.trail_capacity;
        let state = self.state_mut()?;
        if state.molecules.len() >= capacity {
            return Err(EngineError::MoleculeCapacity { capacity });
        }

        let id = state.next_molecule_id;
        state.next_molecule_id = state.next_molecule_id.wrapping_add(1);
        state.molecules.push(DrugMolecule {
            id,
            position,
            size,
            velocity,
            trail: TrailBuffer::with_capacity(trail_capacity),
        });
        trace!("Spawned molecule {} at ({:.1}, {:.1}).", id, position.x, position.y);
        Ok(id)
    }

    fn state(&self) -> Result<&DrugState, EngineError> {
        self.state.as_ref().ok_or(EngineError::NotInitialized { engine: Self::NAME })
    }

    fn state_mut(&mut self) -> Result<&mut DrugState, EngineError> {
        self.state.as_mut().ok_or(EngineError::NotInitialized { engine: Self::NAME })
    }
}

impl FrameEngine for DrugResponseEngine {
    type Snapshot = DrugSnapshot;

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn initialize(&mut self, bounds: Bounds) -> Result<(), EngineError> {
        check_bounds(bounds)?;
        self.params.validate()?;

        let cells = lay_out_plate(&self.params, bounds, &mut self.rng)?;
        debug!(
            "Drug assay initialized: {}x{} plate ({} cells) in {}x{}.",
            self.params.grid_cols,
            self.params.grid_rows,
            cells.len(),
            bounds.width,
            bounds.height
        );

        let census = CellCensus::from_cells(&cells);
        self.state = Some(DrugState {
            bounds,
            cells,
            molecules: Vec::new(),
            next_molecule_id: 0,
            tick: 0,
            census,
            metrics: DrugMetricSet::new(self.params.metric_time_constant),
        });
        self.capacity_warned = false;
        Ok(())
    }

    fn step(&mut self, dt: f32) -> Result<(), EngineError> {
        let params = &self.params;
        let active = self.active;
        let state = self
            .state
            .as_mut()
            .ok_or(EngineError::NotInitialized { engine: Self::NAME })?;
        state.tick += 1;

        // Fixed per-tick motion, not scaled by dt.
        for molecule in state.molecules.iter_mut() {
            molecule.position = molecule.position + molecule.velocity;
            molecule.trail.push(molecule.position);
        }

        // A contact only mutates the touched cell, so scanning cell-major in
        // molecule order matches a molecule-major scan exactly.
        let molecules = &state.molecules;
        state
            .cells
            .par_iter_mut()
            .for_each(|cell| expose_cell(cell, molecules, params));

        let exit_y = state.bounds.height + params.exit_margin;
        let before = state.molecules.len();
        state.molecules.retain(|m| m.position.y <= exit_y);
        let exited = before - state.molecules.len();
        if exited > 0 {
            trace!("{} molecules left the plate.", exited);
        }
        if state.molecules.len() < params.max_molecules {
            self.capacity_warned = false;
        }

        state.census = CellCensus::from_cells(&state.cells);
        let (survival, apoptosis) = population_rates(&state.census);
        let metrics = &mut state.metrics;
        metrics.survival_rate.update(survival, dt);
        metrics.apoptosis_rate.update(apoptosis, dt);
        if active {
            let ic50 = (metrics.ic50.value() + params.ic50_increment).min(params.ic50_max);
            metrics.ic50.update(ic50, dt);
            metrics.efficacy.update((apoptosis * params.efficacy_gain).min(params.efficacy_max), dt);
        } else {
            let (ic50, efficacy) = (metrics.ic50.value(), metrics.efficacy.value());
            metrics.ic50.update(ic50, dt);
            metrics.efficacy.update(efficacy, dt);
        }
        Ok(())
    }

    fn snapshot(&self) -> Result<DrugSnapshot, EngineError> {
        let state = self.state()?;
        Ok(DrugSnapshot {
            tick: state.tick,
            bounds: state.bounds,
            active: self.active,
            cells: state.cells.clone(),
            molecules: state.molecules.clone(),
            metrics: DrugMetrics {
                survival_rate: state.metrics.survival_rate.reading(),
                apoptosis_rate: state.metrics.apoptosis_rate.reading(),
                ic50: state.metrics.ic50.reading(),
                efficacy: state.metrics.efficacy.reading(),
                census: state.census,
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

/// Percent of cells healthy, and percent apoptotic or dead. Both 0 for an
/// empty plate.
pub fn population_rates(census: &CellCensus) -> (f32, f32) {
    let total = census.total();
    if total == 0 {
        return (0.0, 0.0);
    }
    let total = total as f32;
    (
        census.healthy as f32 / total * 100.0,
        (census.apoptotic + census.dead) as f32 / total * 100.0,
    )
}

/// Applies every qualifying contact from `molecules` to `cell`, in order.
fn expose_cell(cell: &mut DrugCell, molecules: &[DrugMolecule], params: &DrugParams) {
    let reach = cell.size / 2.0 + params.contact_margin;
    for molecule in molecules {
        if cell.state == CellState::Dead {
            break;
        }
        if cell.position.distance(molecule.position) < reach {
            register_contact(cell, params);
        }
    }
}

/// One qualifying contact: add exposure, advance at most one stage, then
/// erode health if the cell is no longer healthy.
pub fn register_contact(cell: &mut DrugCell, params: &DrugParams) {
    cell.drug_exposure += params.exposure_per_contact;

    match cell.state {
        CellState::Healthy if cell.drug_exposure > params.affected_threshold => {
            cell.state = CellState::Affected;
        }
        CellState::Affected if cell.drug_exposure > params.apoptotic_threshold => {
            cell.state = CellState::Apoptotic;
        }
        CellState::Apoptotic if cell.drug_exposure > params.dead_threshold => {
            cell.state = CellState::Dead;
            cell.health = params.health_floor;
        }
        _ => {}
    }

    if cell.state != CellState::Healthy {
        cell.health = (cell.health - params.health_loss_per_contact).max(params.health_floor);
    }
}

/// Row-major grid of cells centered in `bounds`.
fn lay_out_plate(
    params: &DrugParams,
    bounds: Bounds,
    rng: &mut StdRng,
) -> Result<Vec<DrugCell>, EngineError> {
    let size_dist = uniform(params.cell_size)?;
    let spacing = params.grid_spacing;
    let offset_x = (bounds.width - params.grid_cols as f32 * spacing) / 2.0;
    let offset_y = (bounds.height - params.grid_rows as f32 * spacing) / 2.0;

    let mut cells = Vec::with_capacity(params.cell_count());
    for row in 0..params.grid_rows {
        for col in 0..params.grid_cols {
            let x = offset_x + col as f32 * spacing + spacing / 2.0;
            let y = offset_y + row as f32 * spacing + spacing / 2.0;
            cells.push(DrugCell {
                id: cells.len() as u32,
                position: Point2D::new(x, y),
                size: rng.sample(&size_dist),
                health: 1.0,
                state: CellState::Healthy,
                drug_exposure: 0.0,
            });
        }
    }
    Ok(cells)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell() -> DrugCell {
        DrugCell {
            id: 0,
            position: Point2D::new(0.0, 0.0),
            size: 26.0,
            health: 1.0,
            state: CellState::Healthy,
            drug_exposure: 0.0,
        }
    }

    #[test]
    fn contact_advances_at_most_one_stage() {
        let params = DrugParams::default();
        let mut c = cell();
        // Far past every threshold in one go: only the first stage may fire.
        c.drug_exposure = 9.0;
        register_contact(&mut c, &params);
        assert_eq!(c.state, CellState::Affected);
        register_contact(&mut c, &params);
        assert_eq!(c.state, CellState::Apoptotic);
        register_contact(&mut c, &params);
        assert_eq!(c.state, CellState::Dead);
        assert_eq!(c.health, params.health_floor);
    }

    #[test]
    fn healthy_cells_keep_full_health() {
        let params = DrugParams::default();
        let mut c = cell();
        register_contact(&mut c, &params);
        assert_eq!(c.state, CellState::Healthy);
        assert_eq!(c.health, 1.0);
        assert!((c.drug_exposure - 0.1).abs() < 1e-6);
    }

    #[test]
    fn dead_cells_ignore_further_molecules() {
        let params = DrugParams::default();
        let mut c = cell();
        c.state = CellState::Dead;
        c.drug_exposure = 8.5;
        let molecule = DrugMolecule {
            id: 0,
            position: c.position,
            size: 8.0,
            velocity: Vec2::zero(),
            trail: TrailBuffer::with_capacity(12),
        };
        expose_cell(&mut c, &[molecule], &params);
        assert_eq!(c.drug_exposure, 8.5);
    }

    #[test]
    fn rates_guard_empty_plate() {
        assert_eq!(population_rates(&CellCensus::default()), (0.0, 0.0));
        let census = CellCensus { healthy: 2, affected: 1, apoptotic: 0, dead: 1 };
        assert_eq!(population_rates(&census), (50.0, 25.0));
    }
}
