//! Entity types owned by the three engines.
//!
//! Identity fields are plain sequence numbers local to the owning engine; they
//! only need to be stable for the lifetime of that engine's population.

use crate::trail::TrailBuffer;
use crate::vecmath::{Point2D, Vec2};
use serde::{Deserialize, Serialize};

/// Color categories the renderer maps to concrete colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hue {
    Red,
    Pink,
    Orange,
    Blue,
    Cyan,
    Mint,
    Green,
    Purple,
    Indigo,
}

// --- Tumor microenvironment ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TumorCell {
    pub id: u32,
    pub position: Point2D,
    pub size: f32,
    pub hue: Hue,
    /// In [0, 1]. Set at creation and never changed afterwards.
    pub health: f32,
}

/// A vessel is drawn as a polyline through `points` (always at least two).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BloodVessel {
    pub id: u32,
    pub points: Vec<Point2D>,
    pub width: f32,
    pub opacity: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImmuneCell {
    pub id: u32,
    pub position: Point2D,
    pub size: f32,
    pub activity: f32,
    pub trail: TrailBuffer,
}

// --- Multi-omics network ---

/// The data type a concentric ring represents, innermost first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OmicsKind {
    Genomics,
    Transcriptomics,
    Proteomics,
    Metabolomics,
}

impl OmicsKind {
    pub const ALL: [OmicsKind; 4] = [
        OmicsKind::Genomics,
        OmicsKind::Transcriptomics,
        OmicsKind::Proteomics,
        OmicsKind::Metabolomics,
    ];

    pub fn hue(self) -> Hue {
        match self {
            OmicsKind::Genomics => Hue::Blue,
            OmicsKind::Transcriptomics => Hue::Cyan,
            OmicsKind::Proteomics => Hue::Mint,
            OmicsKind::Metabolomics => Hue::Green,
        }
    }
}

/// One ring of data points. `point_sizes` and `activities` are parallel
/// arrays of length `point_count`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OmicsLayer {
    pub kind: OmicsKind,
    pub radius: f32,
    pub hue: Hue,
    pub point_count: usize,
    pub point_sizes: Vec<f32>,
    pub activities: Vec<f32>,
}

/// Link between two adjacent rings. Holds layer indices, never the layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OmicsConnection {
    pub id: u32,
    pub from_layer: usize,
    pub to_layer: usize,
    /// Unrotated anchor angles; the renderer adds the current rotation.
    pub from_angle: f32,
    pub to_angle: f32,
    pub strength: f32,
    pub hue: Hue,
}

// --- Drug response assay ---

/// Terminal, one-directional cell fate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellState {
    Healthy,
    Affected,
    Apoptotic,
    Dead,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrugCell {
    pub id: u32,
    pub position: Point2D,
    pub size: f32,
    pub health: f32,
    pub state: CellState,
    pub drug_exposure: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrugMolecule {
    pub id: u32,
    pub position: Point2D,
    pub size: f32,
    pub velocity: Vec2,
    pub trail: TrailBuffer,
}
