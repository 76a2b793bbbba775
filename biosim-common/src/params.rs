//! Per-engine tunables. Defaults are the stock panel values;
//! any field may be overridden from the `[tumor]`, `[omics]` and `[drug]`
//! sections of `config.toml`.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Inclusive `[min, max]` range for uniform draws.
pub type SampleRange = [f32; 2];

fn check_range(name: &str, range: SampleRange) -> Result<()> {
    if !range[0].is_finite() || !range[1].is_finite() || range[0] > range[1] {
        bail!("{} must be a finite [min, max] range with min <= max, got {:?}", name, range);
    }
    Ok(())
}

fn check_positive(name: &str, value: f32) -> Result<()> {
    if !(value.is_finite() && value > 0.0) {
        bail!("{} must be positive, got {}", name, value);
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TumorParams {
    // Tumor mass
    pub cell_count: usize,
    pub cell_radius: SampleRange,
    pub cell_size: SampleRange,
    pub cell_health: SampleRange,
    // Vasculature
    pub vessel_count: usize,
    /// Segments per vessel; each vessel has `vessel_segments + 1` points.
    pub vessel_segments: usize,
    pub vessel_start_radius: SampleRange,
    pub vessel_heading_jitter: f32,
    pub vessel_step: SampleRange,
    pub vessel_width: SampleRange,
    pub vessel_opacity: SampleRange,
    // Immune cells
    pub immune_count: usize,
    pub immune_radius: SampleRange,
    pub immune_size: SampleRange,
    pub immune_activity: SampleRange,
    pub immune_speed: f32,
    /// Immune cells stop migrating once this close to the center.
    pub patrol_radius: f32,
    pub trail_capacity: usize,
    // Clock and metrics
    pub clock_increment: f32,
    pub metric_time_constant: f32,
}

impl Default for TumorParams {
    fn default() -> Self {
        TumorParams {
            cell_count: 80,
            cell_radius: [0.0, 120.0],
            cell_size: [20.0, 35.0],
            cell_health: [0.7, 1.0],
            vessel_count: 15,
            vessel_segments: 20,
            vessel_start_radius: [150.0, 200.0],
            vessel_heading_jitter: 0.3,
            vessel_step: [10.0, 25.0],
            vessel_width: [2.0, 4.0],
            vessel_opacity: [0.6, 1.0],
            immune_count: 25,
            immune_radius: [180.0, 250.0],
            immune_size: [12.0, 18.0],
            immune_activity: [0.6, 1.0],
            immune_speed: 0.8,
            patrol_radius: 50.0,
            trail_capacity: 15,
            clock_increment: 0.02,
            metric_time_constant: 2.0,
        }
    }
}

impl TumorParams {
    pub fn validate(&self) -> Result<()> {
        check_range("tumor.cell_radius", self.cell_radius)?;
        check_range("tumor.cell_size", self.cell_size)?;
        check_range("tumor.cell_health", self.cell_health)?;
        check_range("tumor.vessel_start_radius", self.vessel_start_radius)?;
        check_range("tumor.vessel_step", self.vessel_step)?;
        check_range("tumor.vessel_width", self.vessel_width)?;
        check_range("tumor.vessel_opacity", self.vessel_opacity)?;
        check_range("tumor.immune_radius", self.immune_radius)?;
        check_range("tumor.immune_size", self.immune_size)?;
        check_range("tumor.immune_activity", self.immune_activity)?;
        if !(self.vessel_heading_jitter.is_finite() && self.vessel_heading_jitter >= 0.0) {
            bail!("tumor.vessel_heading_jitter must be non-negative.");
        }
        if self.vessel_segments == 0 {
            bail!("tumor.vessel_segments must be at least 1 so vessels have two points.");
        }
        if self.trail_capacity == 0 {
            bail!("tumor.trail_capacity must be greater than 0.");
        }
        check_positive("tumor.immune_speed", self.immune_speed)?;
        check_positive("tumor.clock_increment", self.clock_increment)?;
        if !(self.patrol_radius.is_finite() && self.patrol_radius >= 0.0) {
            bail!("tumor.patrol_radius must be non-negative.");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OmicsParams {
    /// Ring radii, innermost (genomics) first.
    pub layer_radii: [f32; 4],
    pub layer_point_counts: [usize; 4],
    pub point_size: SampleRange,
    pub initial_activity: SampleRange,
    pub connection_count: usize,
    pub connection_strength: SampleRange,
    pub rotation_increment: f32,
    pub flow_increment: f32,
    pub activity_base: f32,
    pub activity_amplitude: f32,
    /// Phase offset per layer index in the activity wave.
    pub layer_phase: f32,
    /// Phase offset per point index in the activity wave.
    pub point_phase: f32,
    pub correlations: u32,
    pub metric_time_constant: f32,
}

impl Default for OmicsParams {
    fn default() -> Self {
        OmicsParams {
            layer_radii: [80.0, 130.0, 180.0, 230.0],
            layer_point_counts: [24, 32, 40, 48],
            point_size: [4.0, 10.0],
            initial_activity: [0.3, 1.0],
            connection_count: 60,
            connection_strength: [0.3, 1.0],
            rotation_increment: 0.003,
            flow_increment: 0.02,
            activity_base: 0.6,
            activity_amplitude: 0.2,
            layer_phase: 0.5,
            point_phase: 0.1,
            correlations: 1847,
            metric_time_constant: 2.0,
        }
    }
}

impl OmicsParams {
    pub fn validate(&self) -> Result<()> {
        check_range("omics.point_size", self.point_size)?;
        check_range("omics.initial_activity", self.initial_activity)?;
        check_range("omics.connection_strength", self.connection_strength)?;
        for (i, radius) in self.layer_radii.iter().enumerate() {
            check_positive(&format!("omics.layer_radii[{}]", i), *radius)?;
        }
        if self.layer_radii.windows(2).any(|w| w[0] >= w[1]) {
            bail!("omics.layer_radii must be strictly increasing, got {:?}", self.layer_radii);
        }
        if self.layer_point_counts.iter().any(|&c| c == 0) {
            bail!("omics.layer_point_counts must all be greater than 0.");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrugParams {
    // Plate layout
    pub grid_cols: usize,
    pub grid_rows: usize,
    pub grid_spacing: f32,
    pub cell_size: SampleRange,
    // Molecules
    pub max_molecules: usize,
    pub spawn_y: f32,
    pub molecule_size: SampleRange,
    pub velocity_x: SampleRange,
    pub velocity_y: SampleRange,
    pub trail_capacity: usize,
    /// Molecules below `bounds.height + exit_margin` are removed.
    pub exit_margin: f32,
    // Contact and fate
    pub contact_margin: f32,
    pub exposure_per_contact: f32,
    pub affected_threshold: f32,
    pub apoptotic_threshold: f32,
    pub dead_threshold: f32,
    pub health_loss_per_contact: f32,
    pub health_floor: f32,
    // Treatment metrics
    pub ic50_increment: f32,
    pub ic50_max: f32,
    pub efficacy_gain: f32,
    pub efficacy_max: f32,
    pub metric_time_constant: f32,
}

impl Default for DrugParams {
    fn default() -> Self {
        DrugParams {
            grid_cols: 10,
            grid_rows: 14,
            grid_spacing: 45.0,
            cell_size: [22.0, 30.0],
            max_molecules: 200,
            spawn_y: -20.0,
            molecule_size: [6.0, 10.0],
            velocity_x: [-0.5, 0.5],
            velocity_y: [1.5, 3.0],
            trail_capacity: 12,
            exit_margin: 20.0,
            contact_margin: 5.0,
            exposure_per_contact: 0.1,
            affected_threshold: 2.0,
            apoptotic_threshold: 5.0,
            dead_threshold: 8.0,
            health_loss_per_contact: 0.01,
            health_floor: 0.1,
            ic50_increment: 0.02,
            ic50_max: 8.5,
            efficacy_gain: 1.2,
            efficacy_max: 95.0,
            metric_time_constant: 0.5,
        }
    }
}

impl DrugParams {
    pub fn validate(&self) -> Result<()> {
        check_range("drug.cell_size", self.cell_size)?;
        check_range("drug.molecule_size", self.molecule_size)?;
        check_range("drug.velocity_x", self.velocity_x)?;
        check_range("drug.velocity_y", self.velocity_y)?;
        check_positive("drug.grid_spacing", self.grid_spacing)?;
        check_positive("drug.exposure_per_contact", self.exposure_per_contact)?;
        if self.grid_cols == 0 || self.grid_rows == 0 {
            bail!("drug grid must have at least one row and one column.");
        }
        if self.trail_capacity == 0 {
            bail!("drug.trail_capacity must be greater than 0.");
        }
        if !(self.affected_threshold < self.apoptotic_threshold
            && self.apoptotic_threshold < self.dead_threshold)
        {
            bail!(
                "drug thresholds must increase: affected {} < apoptotic {} < dead {}",
                self.affected_threshold,
                self.apoptotic_threshold,
                self.dead_threshold
            );
        }
        Ok(())
    }

    pub fn cell_count(&self) -> usize {
        self.grid_cols * self.grid_rows
    }
}
