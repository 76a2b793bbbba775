pub mod config;
pub mod entities;
pub mod metric;
pub mod params;
pub mod snapshot;
pub mod trail;
pub mod vecmath;

// Re-export key types for easier use by dependent crates
pub use config::{DrugTriggerConfig, InitialConditions, OutputConfig, OutputFormat, SimulationConfig, TimingConfig, UniverseConfig};
pub use entities::{BloodVessel, CellState, DrugCell, DrugMolecule, Hue, ImmuneCell, OmicsConnection, OmicsKind, OmicsLayer, TumorCell};
pub use metric::{MetricReading, SmoothedMetric, Trend};
pub use params::{DrugParams, OmicsParams, SampleRange, TumorParams};
pub use snapshot::{CellCensus, DrugMetrics, DrugSnapshot, FrameRecord, OmicsMetrics, OmicsSnapshot, Populations, TumorMetrics, TumorSnapshot};
pub use trail::TrailBuffer;
pub use vecmath::{angle_to_vec, polar, vec_to_angle, Bounds, Point2D, Vec2};
