use crate::entities::{
    BloodVessel, CellState, DrugCell, DrugMolecule, ImmuneCell, OmicsConnection, OmicsLayer,
    TumorCell,
};
use crate::metric::MetricReading;
use crate::vecmath::{polar, Bounds, Point2D};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TumorMetrics {
    pub growth_rate: MetricReading,
    pub vascularization: MetricReading,
    pub immune_infiltration: MetricReading,
    pub oxygen_level: MetricReading,
}

/// State of the tumor microenvironment after a tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TumorSnapshot {
    pub tick: u64,
    /// Simulated clock (0.02 per tick).
    pub elapsed: f32,
    pub bounds: Bounds,
    pub cells: Vec<TumorCell>,
    pub vessels: Vec<BloodVessel>,
    pub immune_cells: Vec<ImmuneCell>,
    pub metrics: TumorMetrics,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OmicsMetrics {
    pub integration_score: MetricReading,
    /// Whole-numbered; see [`OmicsMetrics::active_pathway_count`].
    pub active_pathways: MetricReading,
    pub correlations: u32,
}

impl OmicsMetrics {
    pub fn active_pathway_count(&self) -> i32 {
        self.active_pathways.value.round() as i32
    }
}

/// State of the multi-omics network after a tick.
///
/// Stored angles are unrotated; use [`OmicsSnapshot::point_position`] and
/// [`OmicsSnapshot::connection_endpoints`] to place things on screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OmicsSnapshot {
    pub tick: u64,
    pub bounds: Bounds,
    pub rotation: f32,
    pub data_flow: f32,
    pub layers: Vec<OmicsLayer>,
    pub connections: Vec<OmicsConnection>,
    pub metrics: OmicsMetrics,
}

impl OmicsSnapshot {
    /// Screen position of point `index` on layer `layer`, rotated by the
    /// current rotation. `None` if either index is out of range.
    pub fn point_position(&self, layer: usize, index: usize) -> Option<Point2D> {
        let layer = self.layers.get(layer)?;
        if index >= layer.point_count {
            return None;
        }
        let angle = (index as f32 / layer.point_count as f32) * std::f32::consts::TAU + self.rotation;
        Some(polar(self.bounds.center(), angle, layer.radius))
    }

    /// Rotated (from, to) endpoints of a connection.
    pub fn connection_endpoints(&self, connection: &OmicsConnection) -> Option<(Point2D, Point2D)> {
        let from = self.layers.get(connection.from_layer)?;
        let to = self.layers.get(connection.to_layer)?;
        let center = self.bounds.center();
        Some((
            polar(center, connection.from_angle + self.rotation, from.radius),
            polar(center, connection.to_angle + self.rotation, to.radius),
        ))
    }
}

/// Number of cells in each state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellCensus {
    pub healthy: u32,
    pub affected: u32,
    pub apoptotic: u32,
    pub dead: u32,
}

impl CellCensus {
    pub fn from_cells<'a>(cells: impl IntoIterator<Item = &'a DrugCell>) -> Self {
        let mut census = CellCensus::default();
        for cell in cells {
            match cell.state {
                CellState::Healthy => census.healthy += 1,
                CellState::Affected => census.affected += 1,
                CellState::Apoptotic => census.apoptotic += 1,
                CellState::Dead => census.dead += 1,
            }
        }
        census
    }

    pub fn total(&self) -> u32 {
        self.healthy + self.affected + self.apoptotic + self.dead
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrugMetrics {
    pub survival_rate: MetricReading,
    pub apoptosis_rate: MetricReading,
    pub ic50: MetricReading,
    pub efficacy: MetricReading,
    pub census: CellCensus,
}

/// State of the drug response assay after a tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrugSnapshot {
    pub tick: u64,
    pub bounds: Bounds,
    pub active: bool,
    pub cells: Vec<DrugCell>,
    pub molecules: Vec<DrugMolecule>,
    pub metrics: DrugMetrics,
}

/// Entity populations of all engines at a recorded frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Populations {
    pub tumor: TumorSnapshot,
    pub omics: OmicsSnapshot,
    pub drug: DrugSnapshot,
}

/// One recorded frame of a headless run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameRecord {
    /// Frame number (number of `step` calls so far).
    pub frame: u64,
    /// Scheduler time in seconds.
    pub time_s: f64,
    pub tumor: TumorMetrics,
    pub omics: OmicsMetrics,
    pub drug: DrugMetrics,
    pub live_molecules: u32,
    /// Included only if `output.include_populations` is set.
    pub populations: Option<Populations>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Hue, OmicsKind};
    use crate::metric::SmoothedMetric;

    fn layer(radius: f32, count: usize) -> OmicsLayer {
        OmicsLayer {
            kind: OmicsKind::Genomics,
            radius,
            hue: Hue::Blue,
            point_count: count,
            point_sizes: vec![5.0; count],
            activities: vec![0.6; count],
        }
    }

    fn omics_snapshot(rotation: f32) -> OmicsSnapshot {
        let reading = SmoothedMetric::new(0.0, 1.0).reading();
        OmicsSnapshot {
            tick: 0,
            bounds: Bounds::new(200.0, 200.0),
            rotation,
            data_flow: 0.0,
            layers: vec![layer(80.0, 4), layer(130.0, 8)],
            connections: Vec::new(),
            metrics: OmicsMetrics {
                integration_score: reading,
                active_pathways: reading,
                correlations: 1847,
            },
        }
    }

    #[test]
    fn point_position_applies_rotation() {
        let snap = omics_snapshot(std::f32::consts::FRAC_PI_2);
        let p = snap.point_position(0, 0).unwrap();
        assert!((p.x - 100.0).abs() < 1e-3);
        assert!((p.y - 180.0).abs() < 1e-3);
        assert!(snap.point_position(0, 4).is_none());
        assert!(snap.point_position(5, 0).is_none());
    }

    #[test]
    fn connection_endpoints_sit_on_their_rings() {
        let snap = omics_snapshot(0.3);
        let conn = OmicsConnection {
            id: 0,
            from_layer: 0,
            to_layer: 1,
            from_angle: 1.0,
            to_angle: 2.0,
            strength: 0.5,
            hue: Hue::Purple,
        };
        let (a, b) = snap.connection_endpoints(&conn).unwrap();
        let c = snap.bounds.center();
        assert!((a.distance(c) - 80.0).abs() < 1e-3);
        assert!((b.distance(c) - 130.0).abs() < 1e-3);
    }

    #[test]
    fn census_counts_each_state() {
        let cell = |state| DrugCell {
            id: 0,
            position: Point2D::zero(),
            size: 25.0,
            health: 1.0,
            state,
            drug_exposure: 0.0,
        };
        let cells = vec![
            cell(CellState::Healthy),
            cell(CellState::Healthy),
            cell(CellState::Affected),
            cell(CellState::Dead),
        ];
        let census = CellCensus::from_cells(&cells);
        assert_eq!(census.healthy, 2);
        assert_eq!(census.affected, 1);
        assert_eq!(census.apoptotic, 0);
        assert_eq!(census.dead, 1);
        assert_eq!(census.total(), 4);
    }
}
