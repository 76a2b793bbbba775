//! Per-frame simulation engines for three animated biology panels: a tumor
//! microenvironment, a multi-omics network and a drug response assay.
//!
//! Each engine is driven through [`FrameEngine`]: `initialize` once with the
//! display bounds, then `step` once per tick and read a snapshot to render.

pub mod drug;
pub mod engine;
pub mod error;
pub mod omics;
pub mod output;
pub mod scheduler;
pub mod session;
pub mod tumor;

pub use drug::DrugResponseEngine;
pub use engine::FrameEngine;
pub use error::EngineError;
pub use omics::OmicsEngine;
pub use scheduler::{TaskKind, TickScheduler};
pub use session::{RunSummary, Session};
pub use tumor::TumorEngine;
